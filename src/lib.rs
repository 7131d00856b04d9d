// Whisper Relay Library
//
// This crate bridges local audio files to a remote queue-based transcription
// API. It serves a local directory over plain HTTP so files become reachable
// by URL, then submits transcription jobs to the remote queue and polls the
// status endpoint until completion.

pub mod config;
pub mod config_loader;
pub mod error;
pub mod job_client;
pub mod models;
pub mod publisher;
pub mod relay;
pub mod server;

// Re-export common types for easier access
pub use config::{ClientConfig, ConfigError, Configuration, PublisherConfig, ServerConfig};
pub use error::{RelayError, RemoteError};
pub use job_client::TranscriptionJobClient;
pub use models::{JobHandle, JobStatus, PublishedFile, TranscriptionRequest, WhisperModel};
pub use publisher::{
    create_publisher, FilePublisher, ObjectStorePublisher, PublishError, ServedDirPublisher,
};
pub use relay::transcribe_file;
pub use server::bind_file_server;
