//! Background worker for draft generation
//!
//! The UI event loop never blocks on the model: it sends a command here and
//! polls the event channel. One command produces exactly one event.

use tokio::sync::mpsc;

use super::DraftRequest;
use super::client::{GenerationError, OllamaClient};
use super::prompt::{ATTRIBUTION, build_instruction};

/// Commands accepted by the generation worker.
#[derive(Debug)]
pub enum GenerateCommand {
    /// Generate a draft body for the given request.
    Draft { request: DraftRequest },
    /// Stop the worker.
    Shutdown,
}

/// Completion events emitted by the generation worker.
#[derive(Debug)]
pub enum GenerateEvent {
    /// Draft body ready, attribution suffix already appended.
    Completed { body: String },
    /// The request failed; no draft was produced.
    Failed(GenerationError),
}

/// Handle for communicating with the generation worker.
pub struct GeneratorHandle {
    pub cmd_tx: mpsc::Sender<GenerateCommand>,
    pub event_rx: mpsc::Receiver<GenerateEvent>,
}

/// Spawn the generation worker task.
pub fn spawn_generator(client: OllamaClient) -> GeneratorHandle {
    let (cmd_tx, cmd_rx) = mpsc::channel(4);
    let (event_tx, event_rx) = mpsc::channel(4);

    tokio::spawn(worker_loop(client, cmd_rx, event_tx));

    GeneratorHandle { cmd_tx, event_rx }
}

async fn worker_loop(
    client: OllamaClient,
    mut cmd_rx: mpsc::Receiver<GenerateCommand>,
    event_tx: mpsc::Sender<GenerateEvent>,
) {
    while let Some(cmd) = cmd_rx.recv().await {
        match cmd {
            GenerateCommand::Draft { request } => {
                let instruction = build_instruction(&request);
                tracing::debug!("Requesting draft for {}", request.recipient);

                // One event per command, success or failure. A failed request
                // surfaces to the user as-is; there is no retry.
                let event = match client.chat(&instruction).await {
                    Ok(body) => GenerateEvent::Completed {
                        body: format!("{}{}", body, ATTRIBUTION),
                    },
                    Err(e) => {
                        tracing::warn!("Draft generation failed: {}", e);
                        GenerateEvent::Failed(e)
                    }
                };
                if event_tx.send(event).await.is_err() {
                    tracing::warn!("generation worker: event receiver dropped");
                    break;
                }
            }
            GenerateCommand::Shutdown => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::client::testing::serve_once;
    use super::*;

    fn request() -> DraftRequest {
        DraftRequest {
            recipient: "a@b.com".to_string(),
            subject: "Hi".to_string(),
            purpose: "test".to_string(),
        }
    }

    /// Drive one command through the worker and assert that exactly one
    /// event comes back before the channel closes.
    async fn run_single(host: String) -> GenerateEvent {
        let client = OllamaClient::new(host, "llama3.1".to_string());
        let mut handle = spawn_generator(client);

        handle
            .cmd_tx
            .send(GenerateCommand::Draft { request: request() })
            .await
            .unwrap();
        let event = handle.event_rx.recv().await.expect("one event expected");

        // No second event: after shutdown the channel must close without
        // yielding anything further.
        handle.cmd_tx.send(GenerateCommand::Shutdown).await.unwrap();
        assert!(handle.event_rx.recv().await.is_none());

        event
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_success_appends_attribution() {
        let host = serve_once("200 OK", r#"{"message":{"content":"Hello"}}"#.to_string()).await;

        match run_single(host).await {
            GenerateEvent::Completed { body } => {
                assert_eq!(
                    body,
                    "Hello\n\n---\nThis email was generated using Meta's Llama 3.1 model."
                );
            }
            GenerateEvent::Failed(e) => panic!("unexpected failure: {}", e),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_failure_produces_exactly_one_event() {
        let host = serve_once("503 Service Unavailable", "{}".to_string()).await;

        match run_single(host).await {
            GenerateEvent::Failed(GenerationError::ServiceUnavailable(_)) => {}
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_malformed_response_fails() {
        let host = serve_once("200 OK", r#"{"unexpected":"shape"}"#.to_string()).await;

        match run_single(host).await {
            GenerateEvent::Failed(GenerationError::MalformedResponse) => {}
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
