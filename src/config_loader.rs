// Configuration loader for Whisper Relay
//
// This module seeds environment variables from the TOML conf file so the rest
// of the relay can read its settings uniformly from the environment.
// Precedence (highest to lowest): environment variables, conf file values,
// application defaults.

use std::env;
use std::fs;
use std::path::Path;

use log::{debug, info, warn};
use toml::Value;

const CONF_FILE_PATH: &str = "relay.conf";

/// Load the default conf file if it exists
///
/// Returns true if the conf file was found and applied, false otherwise.
pub fn load_conf_file() -> bool {
    load_conf_file_from(Path::new(CONF_FILE_PATH))
}

/// Load a flat TOML conf file and export its keys as environment variables
///
/// Keys already present in the environment are left untouched, so environment
/// variables always win over the conf file.
pub fn load_conf_file_from(path: &Path) -> bool {
    if !path.exists() {
        debug!("Conf file not found at: {}", path.display());
        return false;
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Failed to read conf file {}: {}", path.display(), e);
            return false;
        }
    };

    let parsed: Value = match content.parse() {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to parse conf file {}: {}", path.display(), e);
            return false;
        }
    };

    let Value::Table(table) = parsed else {
        warn!("Conf file {} is not a TOML table", path.display());
        return false;
    };

    // The conf file is expected to be flat; nested tables and arrays are skipped
    for (key, value) in table {
        let rendered = match value {
            Value::String(s) => s,
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Boolean(b) => b.to_string(),
            _ => {
                warn!("Skipping unsupported conf value type for key: {}", key);
                continue;
            }
        };

        if env::var(&key).is_err() {
            debug!("Setting env var from conf file: {}", key);
            env::set_var(key, rendered);
        } else {
            debug!("Env var already set, skipping: {}", key);
        }
    }

    info!("Configuration loaded from {}", path.display());
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_conf_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!load_conf_file_from(&dir.path().join("absent.conf")));
    }

    #[test]
    fn conf_values_are_exported_unless_env_wins() {
        let dir = tempfile::tempdir().unwrap();
        let conf = dir.path().join("relay.conf");
        fs::write(
            &conf,
            "TEST_LOADER_FRESH = \"from-conf\"\nTEST_LOADER_TAKEN = \"from-conf\"\nTEST_LOADER_NUM = 7\n",
        )
        .unwrap();

        env::set_var("TEST_LOADER_TAKEN", "from-env");
        assert!(load_conf_file_from(&conf));

        assert_eq!(env::var("TEST_LOADER_FRESH").unwrap(), "from-conf");
        assert_eq!(env::var("TEST_LOADER_TAKEN").unwrap(), "from-env");
        assert_eq!(env::var("TEST_LOADER_NUM").unwrap(), "7");

        env::remove_var("TEST_LOADER_FRESH");
        env::remove_var("TEST_LOADER_TAKEN");
        env::remove_var("TEST_LOADER_NUM");
    }

    #[test]
    fn invalid_toml_is_reported_as_failure() {
        let dir = tempfile::tempdir().unwrap();
        let conf = dir.path().join("relay.conf");
        fs::write(&conf, "this is [not toml").unwrap();
        assert!(!load_conf_file_from(&conf));
    }
}
