// Orchestration for Whisper Relay
//
// One transcription flow: publish the local file, build the request, submit
// it to the remote queue and poll until completion. Everything comes in as
// arguments; there is no global state.

use std::path::Path;

use log::info;
use serde_json::Value;
use uuid::Uuid;

use crate::error::RelayError;
use crate::job_client::TranscriptionJobClient;
use crate::models::{TranscriptionRequest, WhisperModel};
use crate::publisher::FilePublisher;

/// Publish a local audio file and transcribe it via the remote queue
///
/// The file must be published before submission so the remote service can
/// fetch it at the returned URL. Any error along the way aborts the flow;
/// an already-published file is not rolled back.
pub async fn transcribe_file(
    publisher: &dyn FilePublisher,
    client: &TranscriptionJobClient,
    audio_path: &Path,
    model: WhisperModel,
) -> Result<Value, RelayError> {
    let flow_id = Uuid::new_v4();

    info!(
        "[{}] Publishing {} via the {} backend",
        flow_id,
        audio_path.display(),
        publisher.name()
    );
    let published = publisher.publish(audio_path).await?;
    info!("[{}] Audio reachable at {}", flow_id, published.public_url);

    let request = TranscriptionRequest::new(published.public_url.clone(), model);
    let handle = client.submit(&request).await?;
    info!("[{}] Submitted job {} (model: {})", flow_id, handle, model);

    let output = client.await_completion(&handle).await?;
    info!("[{}] Job {} finished", flow_id, handle);

    Ok(output)
}
