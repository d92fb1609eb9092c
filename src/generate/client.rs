//! Ollama API client

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure modes of a generation request.
///
/// A dead server and a broken response stay distinguishable even though
/// neither is retried.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("generation service returned an unexpected response")]
    MalformedResponse,
}

/// Client for the chat endpoint of a local Ollama server.
#[derive(Clone)]
pub struct OllamaClient {
    client: Client,
    host: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OllamaClient {
    /// Create a new client for the given server and model.
    pub fn new(host: String, model: String) -> Self {
        Self {
            client: Client::new(),
            host: host.trim_end_matches('/').to_string(),
            model,
        }
    }

    /// Send a single chat request with a user-role instruction.
    ///
    /// Exactly one request per call; no streaming, no timeout, no retry.
    pub async fn chat(&self, instruction: &str) -> Result<String, GenerationError> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: instruction.to_string(),
            }],
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.host))
            .json(&request)
            .send()
            .await
            .map_err(|e| GenerationError::ServiceUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::ServiceUnavailable(format!(
                "{}: {}",
                status, body
            )));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|_| GenerationError::MalformedResponse)?;

        chat.message
            .and_then(|m| m.content)
            .ok_or(GenerationError::MalformedResponse)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::serve_once;
    use super::*;

    #[tokio::test]
    async fn test_chat_returns_message_content() {
        let host = serve_once("200 OK", r#"{"message":{"content":"Hello"}}"#.to_string()).await;
        let client = OllamaClient::new(host, "llama3.1".to_string());

        let body = client.chat("write something").await.unwrap();
        assert_eq!(body, "Hello");
    }

    #[tokio::test]
    async fn test_missing_message_field_is_malformed() {
        let host = serve_once("200 OK", r#"{"done":true}"#.to_string()).await;
        let client = OllamaClient::new(host, "llama3.1".to_string());

        let err = client.chat("write something").await.unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse));
    }

    #[tokio::test]
    async fn test_missing_content_field_is_malformed() {
        let host = serve_once("200 OK", r#"{"message":{"role":"assistant"}}"#.to_string()).await;
        let client = OllamaClient::new(host, "llama3.1".to_string());

        let err = client.chat("write something").await.unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse));
    }

    #[tokio::test]
    async fn test_http_error_is_service_unavailable() {
        let host = serve_once(
            "500 Internal Server Error",
            r#"{"error":"model not loaded"}"#.to_string(),
        )
        .await;
        let client = OllamaClient::new(host, "llama3.1".to_string());

        let err = client.chat("write something").await.unwrap_err();
        assert!(matches!(err, GenerationError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_connection_failure_is_service_unavailable() {
        // Bind to learn a free port, then close it before the request.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let host = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = OllamaClient::new(host, "llama3.1".to_string());
        let err = client.chat("write something").await.unwrap_err();
        assert!(matches!(err, GenerationError::ServiceUnavailable(_)));
    }
}
