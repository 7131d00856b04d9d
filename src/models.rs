// Whisper Relay data models
//
// This module contains the data models shared by the publisher and the job
// client: the published-file record, the wire-level request and response
// shapes of the remote queue, and the job status vocabulary.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Result of publishing a local file
#[derive(Debug, Clone)]
pub struct PublishedFile {
    /// Original path of the file; stale once a destructive backend ran
    pub local_path: PathBuf,
    /// Path the file lives at after publication
    pub served_path: PathBuf,
    /// Absolute URL the file is reachable at
    pub public_url: Url,
}

/// Whisper model variants accepted by the remote queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WhisperModel {
    Tiny,
    Base,
    Small,
    Medium,
    Large,
    #[serde(rename = "large-v2")]
    LargeV2,
}

/// Error for an unrecognized model name
#[derive(Error, Debug)]
#[error("Unknown model '{0}' (expected tiny, base, small, medium, large or large-v2)")]
pub struct UnknownModel(String);

impl WhisperModel {
    /// Wire name of the model
    pub fn as_str(&self) -> &'static str {
        match self {
            WhisperModel::Tiny => "tiny",
            WhisperModel::Base => "base",
            WhisperModel::Small => "small",
            WhisperModel::Medium => "medium",
            WhisperModel::Large => "large",
            WhisperModel::LargeV2 => "large-v2",
        }
    }
}

impl fmt::Display for WhisperModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WhisperModel {
    type Err = UnknownModel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tiny" => Ok(WhisperModel::Tiny),
            "base" => Ok(WhisperModel::Base),
            "small" => Ok(WhisperModel::Small),
            "medium" => Ok(WhisperModel::Medium),
            "large" => Ok(WhisperModel::Large),
            "large-v2" => Ok(WhisperModel::LargeV2),
            other => Err(UnknownModel(other.to_string())),
        }
    }
}

/// Fixed decoding options sent verbatim with every submission
///
/// The remote endpoint expects this exact bundle; only the model varies per
/// request, so the defaults below are the only values ever sent.
#[derive(Debug, Clone, Serialize)]
pub struct DecodingOptions {
    pub transcription: String,
    pub translate: bool,
    pub temperature: i64,
    pub best_of: u32,
    pub beam_size: u32,
    pub suppress_tokens: String,
    pub condition_on_previous_text: bool,
    pub temperature_increment_on_fallback: f64,
    pub compression_ratio_threshold: f64,
    pub logprob_threshold: i64,
    pub no_speech_threshold: f64,
}

impl Default for DecodingOptions {
    fn default() -> Self {
        Self {
            transcription: "plain text".to_string(),
            translate: false,
            temperature: 0,
            best_of: 5,
            beam_size: 5,
            suppress_tokens: "-1".to_string(),
            condition_on_previous_text: false,
            temperature_increment_on_fallback: 0.2,
            compression_ratio_threshold: 2.4,
            logprob_threshold: -1,
            no_speech_threshold: 0.6,
        }
    }
}

/// Inner payload of a submission request
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptionInput {
    /// Public URL of the audio file
    pub audio: Url,
    /// Model to transcribe with
    pub model: WhisperModel,
    #[serde(flatten)]
    pub options: DecodingOptions,
}

/// Submission request body for the remote queue
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptionRequest {
    pub input: TranscriptionInput,
}

impl TranscriptionRequest {
    /// Build a request for one audio URL with the fixed decoding options
    pub fn new(audio_url: Url, model: WhisperModel) -> Self {
        Self {
            input: TranscriptionInput {
                audio: audio_url,
                model,
                options: DecodingOptions::default(),
            },
        }
    }
}

/// Opaque job identifier returned by the remote queue on submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle(String);

impl JobHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobHandle {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for JobHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Response body of a successful submission
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// Job identifier assigned by the queue
    pub id: String,
}

/// Job status as reported by the remote queue
///
/// The vocabulary is owned by the remote service, so unknown strings are
/// carried as [`JobStatus::Other`] instead of failing deserialization. Only
/// `COMPLETED` is a success terminal; every other value, `FAILED` included,
/// keeps the poll loop running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Job is waiting in the remote queue
    Queued,
    /// Job is currently being processed
    InProgress,
    /// Job finished and its output is available
    Completed,
    /// Job failed on the remote side
    Failed,
    /// Any status string this relay does not know about
    Other(String),
}

impl JobStatus {
    /// Whether this status terminates the poll loop successfully
    pub fn is_completed(&self) -> bool {
        matches!(self, JobStatus::Completed)
    }
}

impl From<&str> for JobStatus {
    fn from(s: &str) -> Self {
        match s {
            "QUEUED" | "IN_QUEUE" => JobStatus::Queued,
            "IN_PROGRESS" => JobStatus::InProgress,
            "COMPLETED" => JobStatus::Completed,
            "FAILED" => JobStatus::Failed,
            other => JobStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Queued => f.write_str("QUEUED"),
            JobStatus::InProgress => f.write_str("IN_PROGRESS"),
            JobStatus::Completed => f.write_str("COMPLETED"),
            JobStatus::Failed => f.write_str("FAILED"),
            JobStatus::Other(s) => f.write_str(s),
        }
    }
}

impl<'de> Deserialize<'de> for JobStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(JobStatus::from(raw.as_str()))
    }
}

/// Response body of a status poll
#[derive(Debug, Deserialize)]
pub struct StatusResponse {
    /// Current job status
    pub status: JobStatus,
    /// Output payload, present once the job completed
    #[serde(default)]
    pub output: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decoding_options_match_the_wire_bundle() {
        let value = serde_json::to_value(DecodingOptions::default()).unwrap();
        assert_eq!(
            value,
            json!({
                "transcription": "plain text",
                "translate": false,
                "temperature": 0,
                "best_of": 5,
                "beam_size": 5,
                "suppress_tokens": "-1",
                "condition_on_previous_text": false,
                "temperature_increment_on_fallback": 0.2,
                "compression_ratio_threshold": 2.4,
                "logprob_threshold": -1,
                "no_speech_threshold": 0.6
            })
        );
    }

    #[test]
    fn request_serializes_to_the_submission_shape() {
        let url = Url::parse("https://files.example.com/clip.mp3").unwrap();
        let request = TranscriptionRequest::new(url, WhisperModel::Medium);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["input"]["audio"], "https://files.example.com/clip.mp3");
        assert_eq!(value["input"]["model"], "medium");
        assert_eq!(value["input"]["beam_size"], 5);
        assert_eq!(value["input"]["suppress_tokens"], "-1");
        // The options are flattened into "input", not nested under their own key
        assert!(value["input"].get("options").is_none());
    }

    #[test]
    fn model_names_round_trip() {
        for name in ["tiny", "base", "small", "medium", "large", "large-v2"] {
            let model: WhisperModel = name.parse().unwrap();
            assert_eq!(model.as_str(), name);
        }
    }

    #[test]
    fn large_v2_serializes_with_hyphen() {
        assert_eq!(
            serde_json::to_value(WhisperModel::LargeV2).unwrap(),
            json!("large-v2")
        );
    }

    #[test]
    fn unknown_model_is_an_error() {
        assert!("huge".parse::<WhisperModel>().is_err());
    }

    #[test]
    fn status_strings_map_to_variants() {
        assert_eq!(JobStatus::from("IN_QUEUE"), JobStatus::Queued);
        assert_eq!(JobStatus::from("QUEUED"), JobStatus::Queued);
        assert_eq!(JobStatus::from("IN_PROGRESS"), JobStatus::InProgress);
        assert_eq!(JobStatus::from("COMPLETED"), JobStatus::Completed);
        assert_eq!(JobStatus::from("FAILED"), JobStatus::Failed);
        assert_eq!(
            JobStatus::from("TIMED_OUT"),
            JobStatus::Other("TIMED_OUT".to_string())
        );
    }

    #[test]
    fn only_completed_is_terminal() {
        assert!(JobStatus::Completed.is_completed());
        assert!(!JobStatus::Failed.is_completed());
        assert!(!JobStatus::Other("CANCELLED".to_string()).is_completed());
    }

    #[test]
    fn status_response_carries_the_output() {
        let parsed: StatusResponse = serde_json::from_str(
            r#"{"status": "COMPLETED", "output": {"text": "hi"}}"#,
        )
        .unwrap();
        assert!(parsed.status.is_completed());
        assert_eq!(parsed.output.unwrap(), json!({"text": "hi"}));
    }

    #[test]
    fn status_response_without_output_parses() {
        let parsed: StatusResponse = serde_json::from_str(r#"{"status": "IN_PROGRESS"}"#).unwrap();
        assert_eq!(parsed.status, JobStatus::InProgress);
        assert!(parsed.output.is_none());
    }
}
