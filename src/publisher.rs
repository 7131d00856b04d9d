// File publishers for Whisper Relay
//
// This module turns a local file into a publicly fetchable URL. The served-dir
// backend moves the file into the directory exposed by the static file server;
// the object-store backend uploads it over HTTP instead. Both satisfy the same
// contract: whatever is published must be fetchable at the returned URL by the
// remote transcription service.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::info;
use reqwest::header;
use thiserror::Error;
use url::Url;

use crate::config::{ConfigError, Configuration, PublisherBackend, PublisherConfig};
use crate::error::RemoteError;
use crate::models::PublishedFile;

/// Errors raised while publishing a local file
#[derive(Error, Debug)]
pub enum PublishError {
    /// The source file does not exist
    #[error("File not found: {0}")]
    NotFound(PathBuf),

    /// Filesystem operation failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The source path has no usable base name
    #[error("Cannot publish {0}: path has no base name")]
    NoBaseName(PathBuf),

    /// The base name does not join onto the base URL
    #[error("Cannot join '{name}' onto the base URL: {source}")]
    UrlJoin {
        name: String,
        source: url::ParseError,
    },

    /// The upload endpoint rejected or failed the request
    #[error("Upload failed: {0}")]
    Upload(#[from] RemoteError),
}

/// Capability seam: publish a local file and hand back its public URL
#[async_trait]
pub trait FilePublisher: Send + Sync {
    /// Publish one file and return where it is now reachable
    async fn publish(&self, local: &Path) -> Result<PublishedFile, PublishError>;

    /// Short name of the backend, for logs
    fn name(&self) -> &'static str;
}

/// Create the publisher selected by configuration
pub fn create_publisher(
    publisher_config: &PublisherConfig,
    config: &Configuration,
) -> Result<Box<dyn FilePublisher>, ConfigError> {
    match publisher_config.backend {
        PublisherBackend::ServedDir => Ok(Box::new(ServedDirPublisher::new(
            config.served_dir.clone(),
            config.public_base_url.clone(),
        ))),
        PublisherBackend::ObjectStore => {
            let raw = publisher_config
                .upload_url
                .as_deref()
                .ok_or(ConfigError::MissingUploadUrl)?;
            let upload_url = Url::parse(raw)
                .map_err(|e| ConfigError::InvalidUploadUrl(raw.to_string(), e))?;
            Ok(Box::new(ObjectStorePublisher::new(
                upload_url,
                config.public_base_url.clone(),
                config.api_key.clone(),
            )))
        }
    }
}

/// Join a served file's base name onto the public base URL
///
/// Pure function; uses standard URL-resolution rules. A base URL without a
/// trailing slash has its last path segment replaced, not appended to.
pub fn to_public_url(served_path: &Path, base_url: &Url) -> Result<Url, PublishError> {
    let name = served_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PublishError::NoBaseName(served_path.to_path_buf()))?;

    base_url.join(name).map_err(|e| PublishError::UrlJoin {
        name: name.to_string(),
        source: e,
    })
}

/// Move a file, falling back to copy + remove when rename crosses filesystems
fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(_) => {
            fs::copy(from, to)?;
            fs::remove_file(from)
        }
    }
}

/// Publisher backed by the locally served directory
///
/// Publishing is a destructive relocation: the file is moved, keeping only its
/// base name, and the original path stops being valid. An existing file with
/// the same name in the served directory is silently overwritten.
pub struct ServedDirPublisher {
    served_dir: PathBuf,
    base_url: Url,
}

impl ServedDirPublisher {
    pub fn new(served_dir: PathBuf, base_url: Url) -> Self {
        Self {
            served_dir,
            base_url,
        }
    }
}

#[async_trait]
impl FilePublisher for ServedDirPublisher {
    async fn publish(&self, local: &Path) -> Result<PublishedFile, PublishError> {
        if !local.is_file() {
            return Err(PublishError::NotFound(local.to_path_buf()));
        }

        let name = local
            .file_name()
            .ok_or_else(|| PublishError::NoBaseName(local.to_path_buf()))?;

        fs::create_dir_all(&self.served_dir)?;
        let served_path = self.served_dir.join(name);
        move_file(local, &served_path)?;

        let public_url = to_public_url(&served_path, &self.base_url)?;
        info!(
            "Moved {} into served directory, reachable at {}",
            local.display(),
            public_url
        );

        Ok(PublishedFile {
            local_path: local.to_path_buf(),
            served_path,
            public_url,
        })
    }

    fn name(&self) -> &'static str {
        "served-dir"
    }
}

/// Publisher backed by an HTTP object store
///
/// Uploads the file body with a PUT to `{upload_url}/{basename}` and returns
/// the matching public URL. Unlike the served-dir backend this is not a move;
/// the local file stays where it is.
pub struct ObjectStorePublisher {
    client: reqwest::Client,
    upload_url: Url,
    public_base_url: Url,
    api_key: String,
}

impl ObjectStorePublisher {
    pub fn new(upload_url: Url, public_base_url: Url, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            upload_url,
            public_base_url,
            api_key,
        }
    }
}

#[async_trait]
impl FilePublisher for ObjectStorePublisher {
    async fn publish(&self, local: &Path) -> Result<PublishedFile, PublishError> {
        if !local.is_file() {
            return Err(PublishError::NotFound(local.to_path_buf()));
        }

        let name = local
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| PublishError::NoBaseName(local.to_path_buf()))?;

        let target = self.upload_url.join(name).map_err(|e| PublishError::UrlJoin {
            name: name.to_string(),
            source: e,
        })?;

        let bytes = fs::read(local)?;
        let response = self
            .client
            .put(target.clone())
            .header(header::AUTHORIZATION, self.api_key.as_str())
            .body(bytes)
            .send()
            .await
            .map_err(RemoteError::from)?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status { status, body }.into());
        }

        let public_url = to_public_url(local, &self.public_base_url)?;
        info!("Uploaded {} to {}, reachable at {}", local.display(), target, public_url);

        Ok(PublishedFile {
            local_path: local.to_path_buf(),
            served_path: local.to_path_buf(),
            public_url,
        })
    }

    fn name(&self) -> &'static str {
        "object-store"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[tokio::test]
    async fn publish_moves_the_file_and_builds_its_url() {
        let source_dir = tempfile::tempdir().unwrap();
        let served_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("clip.mp3");
        fs::write(&source, b"audio-bytes").unwrap();

        let publisher = ServedDirPublisher::new(
            served_dir.path().to_path_buf(),
            base("https://files.example.com/"),
        );
        let published = publisher.publish(&source).await.unwrap();

        // Destructive relocation: gone from the source, present in the served dir
        assert!(!source.exists());
        assert_eq!(published.served_path, served_dir.path().join("clip.mp3"));
        assert_eq!(fs::read(&published.served_path).unwrap(), b"audio-bytes");
        assert_eq!(
            published.public_url.as_str(),
            "https://files.example.com/clip.mp3"
        );
    }

    #[tokio::test]
    async fn publish_creates_the_served_directory() {
        let source_dir = tempfile::tempdir().unwrap();
        let root = tempfile::tempdir().unwrap();
        let served_dir = root.path().join("nested").join("files");
        let source = source_dir.path().join("clip.mp3");
        fs::write(&source, b"x").unwrap();

        let publisher =
            ServedDirPublisher::new(served_dir.clone(), base("https://files.example.com/"));
        publisher.publish(&source).await.unwrap();

        assert!(served_dir.join("clip.mp3").is_file());
    }

    #[tokio::test]
    async fn publish_overwrites_a_name_collision() {
        let source_dir = tempfile::tempdir().unwrap();
        let served_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("clip.mp3");
        fs::write(&source, b"new").unwrap();
        fs::write(served_dir.path().join("clip.mp3"), b"old").unwrap();

        let publisher = ServedDirPublisher::new(
            served_dir.path().to_path_buf(),
            base("https://files.example.com/"),
        );
        publisher.publish(&source).await.unwrap();

        assert_eq!(fs::read(served_dir.path().join("clip.mp3")).unwrap(), b"new");
    }

    #[tokio::test]
    async fn publish_missing_file_fails_without_side_effects() {
        let root = tempfile::tempdir().unwrap();
        let served_dir = root.path().join("files");

        let publisher =
            ServedDirPublisher::new(served_dir.clone(), base("https://files.example.com/"));
        let err = publisher
            .publish(&root.path().join("absent.mp3"))
            .await
            .unwrap_err();

        assert!(matches!(err, PublishError::NotFound(_)));
        // The served directory must not be created for a failed publish
        assert!(!served_dir.exists());
    }

    #[test]
    fn url_join_appends_under_a_trailing_slash() {
        let url = to_public_url(Path::new("/tmp/photo.mp3"), &base("https://host/")).unwrap();
        assert_eq!(url.as_str(), "https://host/photo.mp3");
    }

    #[test]
    fn url_join_on_a_bare_host_matches_the_resolver() {
        // "https://host" normalizes to path "/", so the join lands at the root
        let url = to_public_url(Path::new("/tmp/photo.mp3"), &base("https://host")).unwrap();
        assert_eq!(url.as_str(), "https://host/photo.mp3");
    }

    #[test]
    fn url_join_replaces_a_non_directory_segment() {
        // Standard resolution: without a trailing slash the last segment is replaced
        let url = to_public_url(Path::new("/tmp/photo.mp3"), &base("https://host/files")).unwrap();
        assert_eq!(url.as_str(), "https://host/photo.mp3");

        let url = to_public_url(Path::new("/tmp/photo.mp3"), &base("https://host/files/")).unwrap();
        assert_eq!(url.as_str(), "https://host/files/photo.mp3");
    }

    #[test]
    fn url_suffix_always_equals_the_base_name() {
        for (path, name) in [
            ("/a/b/c/recording.wav", "recording.wav"),
            ("relative/clip.mp3", "clip.mp3"),
            ("/x/noext", "noext"),
        ] {
            let url = to_public_url(Path::new(path), &base("https://host/media/")).unwrap();
            assert!(url.path().ends_with(name), "{url} should end with {name}");
        }
    }

    #[tokio::test]
    async fn object_store_uploads_without_moving() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", "/bucket/clip.mp3")
            .match_header("authorization", "k-123")
            .match_body("audio-bytes")
            .with_status(200)
            .create_async()
            .await;

        let source_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("clip.mp3");
        fs::write(&source, b"audio-bytes").unwrap();

        let publisher = ObjectStorePublisher::new(
            base(&format!("{}/bucket/", server.url())),
            base("https://cdn.example.com/"),
            "k-123".to_string(),
        );
        let published = publisher.publish(&source).await.unwrap();

        mock.assert_async().await;
        // An upload is not a move
        assert!(source.exists());
        assert_eq!(
            published.public_url.as_str(),
            "https://cdn.example.com/clip.mp3"
        );
    }

    #[tokio::test]
    async fn object_store_surfaces_rejected_uploads() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PUT", "/bucket/clip.mp3")
            .with_status(502)
            .with_body("bad gateway")
            .create_async()
            .await;

        let source_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("clip.mp3");
        fs::write(&source, b"x").unwrap();

        let publisher = ObjectStorePublisher::new(
            base(&format!("{}/bucket/", server.url())),
            base("https://cdn.example.com/"),
            "k-123".to_string(),
        );
        let err = publisher.publish(&source).await.unwrap_err();

        match err {
            PublishError::Upload(RemoteError::Status { status, body }) => {
                assert_eq!(status, 502);
                assert_eq!(body, "bad gateway");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
