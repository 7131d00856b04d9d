// Whisper Relay configuration
//
// This module contains configuration structures and constants for the relay.
// The core Configuration record is loaded from JSON documents on disk; ambient
// settings (bind address, remote endpoints, poll cadence) come from environment
// variables with compile-time defaults.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::warn;
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Default values for configuration
pub mod defaults {
    // Path to the JSON server configuration file
    pub const CONFIG_FILE: &str = "config.json";

    // Path to the JSON credentials file
    pub const CREDENTIALS_FILE: &str = "credentials.json";

    // Bind address for the static file server
    pub const HTTP_HOST: &str = "127.0.0.1";

    // Bind port for the static file server
    pub const HTTP_PORT: u16 = 8000;

    // Remote queue submission endpoint
    pub const RUN_URL: &str = "https://api.runpod.ai/v2/whisper/run";

    // Remote queue status endpoint (job id is appended per request)
    pub const STATUS_URL: &str = "https://api.runpod.ai/v2/whisper/status";

    // Delay between two status polls, in milliseconds
    pub const POLL_INTERVAL_MS: u64 = 1000;

    // File publisher backend
    pub const PUBLISHER_BACKEND: &str = "served-dir";
}

// Environment variable names
const ENV_CONFIG_FILE: &str = "RELAY_CONFIG_FILE";
const ENV_CREDENTIALS_FILE: &str = "RELAY_CREDENTIALS_FILE";
const ENV_HTTP_HOST: &str = "RELAY_HTTP_HOST";
const ENV_HTTP_PORT: &str = "RELAY_HTTP_PORT";
const ENV_RUN_URL: &str = "RELAY_RUN_URL";
const ENV_STATUS_URL: &str = "RELAY_STATUS_URL";
const ENV_POLL_INTERVAL_MS: &str = "RELAY_POLL_INTERVAL_MS";
const ENV_REQUEST_TIMEOUT_SECS: &str = "RELAY_REQUEST_TIMEOUT_SECS";
const ENV_MAX_POLLS: &str = "RELAY_MAX_POLLS";
const ENV_PUBLISHER: &str = "RELAY_PUBLISHER";
const ENV_UPLOAD_URL: &str = "RELAY_UPLOAD_URL";

// JSON keys in the server configuration file
const KEY_SERVED_DIR: &str = "simple_http_server_dir";
const KEY_PUBLIC_DOMAIN: &str = "cloudflare_zero_trust_domain";

// JSON key in the credentials file
const KEY_API_KEY: &str = "api_key";

/// Errors raised while loading configuration files
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file is missing or cannot be read
    #[error("Cannot read configuration file {0}: {1}")]
    Unreadable(PathBuf, #[source] io::Error),

    /// Configuration file does not contain valid JSON
    #[error("Configuration file {0} is not valid JSON: {1}")]
    InvalidJson(PathBuf, #[source] serde_json::Error),

    /// A required key is absent or not a string
    #[error("Configuration file {1} is missing required key '{0}'")]
    MissingKey(&'static str, PathBuf),

    /// The public base URL does not parse as an absolute URL
    #[error("Invalid public base URL '{0}': {1}")]
    InvalidBaseUrl(String, #[source] url::ParseError),

    /// The object-store publisher was selected without an upload endpoint
    #[error("RELAY_UPLOAD_URL must be set when the object-store publisher is selected")]
    MissingUploadUrl,

    /// The upload endpoint does not parse as an absolute URL
    #[error("Invalid upload URL '{0}': {1}")]
    InvalidUploadUrl(String, #[source] url::ParseError),
}

/// Core configuration record for one relay run
///
/// Loaded fresh on every call to [`Configuration::load`]; nothing is cached.
#[derive(Clone, Debug)]
pub struct Configuration {
    /// Directory the static file server exposes
    pub served_dir: PathBuf,
    /// Public base URL under which the served directory is reachable
    pub public_base_url: Url,
    /// API key sent verbatim in the authorization header
    pub api_key: String,
}

impl Configuration {
    /// Load the configuration from the server config and credentials JSON files
    pub fn load(config_path: &Path, credentials_path: &Path) -> Result<Self, ConfigError> {
        let config = read_json(config_path)?;
        let credentials = read_json(credentials_path)?;

        let served_dir = require_str(&config, KEY_SERVED_DIR, config_path)?;
        let domain = require_str(&config, KEY_PUBLIC_DOMAIN, config_path)?;
        let api_key = require_str(&credentials, KEY_API_KEY, credentials_path)?;

        let public_base_url = Url::parse(&domain)
            .map_err(|e| ConfigError::InvalidBaseUrl(domain.clone(), e))?;

        Ok(Self {
            served_dir: PathBuf::from(served_dir),
            public_base_url,
            api_key,
        })
    }

    /// Resolve the config file path from the environment or the default
    pub fn config_path() -> PathBuf {
        PathBuf::from(env::var(ENV_CONFIG_FILE).unwrap_or_else(|_| defaults::CONFIG_FILE.into()))
    }

    /// Resolve the credentials file path from the environment or the default
    pub fn credentials_path() -> PathBuf {
        PathBuf::from(
            env::var(ENV_CREDENTIALS_FILE).unwrap_or_else(|_| defaults::CREDENTIALS_FILE.into()),
        )
    }
}

/// Read a file and parse it as a JSON object
fn read_json(path: &Path) -> Result<Value, ConfigError> {
    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::Unreadable(path.to_path_buf(), e))?;
    serde_json::from_str(&content).map_err(|e| ConfigError::InvalidJson(path.to_path_buf(), e))
}

/// Extract a required string field from a parsed JSON document
fn require_str(doc: &Value, key: &'static str, path: &Path) -> Result<String, ConfigError> {
    doc.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ConfigError::MissingKey(key, path.to_path_buf()))
}

/// Settings for the static file server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Host to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: env::var(ENV_HTTP_HOST).unwrap_or_else(|_| defaults::HTTP_HOST.to_string()),
            port: env::var(ENV_HTTP_PORT)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::HTTP_PORT),
        }
    }
}

/// Settings for the remote transcription queue client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Job submission endpoint
    pub run_url: String,
    /// Job status endpoint base; the job id is appended per poll
    pub status_url: String,
    /// Delay between two status polls
    pub poll_interval: Duration,
    /// Per-request timeout; None leaves individual calls unbounded
    pub request_timeout: Option<Duration>,
    /// Maximum number of status polls; None polls until the job completes
    pub max_polls: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let poll_interval_ms = env::var(ENV_POLL_INTERVAL_MS)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults::POLL_INTERVAL_MS);

        Self {
            run_url: env::var(ENV_RUN_URL).unwrap_or_else(|_| defaults::RUN_URL.to_string()),
            status_url: env::var(ENV_STATUS_URL)
                .unwrap_or_else(|_| defaults::STATUS_URL.to_string()),
            poll_interval: Duration::from_millis(poll_interval_ms),
            request_timeout: env::var(ENV_REQUEST_TIMEOUT_SECS)
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
            max_polls: env::var(ENV_MAX_POLLS).ok().and_then(|s| s.parse().ok()),
        }
    }
}

/// Available file publisher backends
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PublisherBackend {
    /// Move files into the locally served directory
    ServedDir,
    /// Upload files to an object store over HTTP
    ObjectStore,
}

/// Settings for the file publisher seam
#[derive(Clone, Debug)]
pub struct PublisherConfig {
    /// Selected backend
    pub backend: PublisherBackend,
    /// Upload endpoint base for the object-store backend
    pub upload_url: Option<String>,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        let raw = env::var(ENV_PUBLISHER)
            .unwrap_or_else(|_| defaults::PUBLISHER_BACKEND.to_string());

        let backend = match raw.as_str() {
            "served-dir" => PublisherBackend::ServedDir,
            "object-store" => PublisherBackend::ObjectStore,
            other => {
                warn!(
                    "Unknown publisher backend '{}'. Using default: {}",
                    other,
                    defaults::PUBLISHER_BACKEND
                );
                PublisherBackend::ServedDir
            }
        };

        Self {
            backend,
            upload_url: env::var(ENV_UPLOAD_URL).ok(),
        }
    }
}
