//! Sending mail through the Gmail REST API
//!
//! The envelope is a minimal plain-text RFC 2822 message; the Gmail API
//! takes it base64url-encoded in a JSON wrapper.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use lettre::Message;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use serde::Deserialize;
use thiserror::Error;

const GMAIL_SEND_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";

/// Failure sending a message. Envelope building, transport and server
/// rejections all land here; none of them is retried.
#[derive(Debug, Error)]
pub enum SendError {
    #[error("failed to send email: {0}")]
    Transport(String),
}

#[derive(Deserialize)]
struct SendResponse {
    id: String,
}

/// Client for the Gmail send endpoint.
pub struct GmailClient {
    client: reqwest::Client,
    send_url: String,
}

impl GmailClient {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            send_url: GMAIL_SEND_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_send_url(send_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            send_url,
        }
    }

    /// Send a plain-text message as the authenticated user. Returns the
    /// Gmail message id.
    pub async fn send(
        &self,
        access_token: &str,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<String, SendError> {
        let raw = encode_message(from, to, subject, body)?;

        let response = self
            .client
            .post(&self.send_url)
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "raw": raw }))
            .send()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(SendError::Transport(format!("{}: {}", status, text)));
        }

        let sent: SendResponse = response
            .json()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;

        tracing::info!("Email sent to {} (id {})", to, sent.id);
        Ok(sent.id)
    }
}

/// Build the RFC 2822 message and encode it the way the Gmail API expects
/// (base64url over the formatted bytes).
fn encode_message(from: &str, to: &str, subject: &str, body: &str) -> Result<String, SendError> {
    let from_mailbox = from
        .parse::<Mailbox>()
        .map_err(|e| SendError::Transport(format!("invalid sender address: {}", e)))?;
    let to_mailbox = to
        .parse::<Mailbox>()
        .map_err(|e| SendError::Transport(format!("invalid recipient address: {}", e)))?;

    let message = Message::builder()
        .from(from_mailbox)
        .to(to_mailbox)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| SendError::Transport(format!("failed to build message: {}", e)))?;

    Ok(URL_SAFE_NO_PAD.encode(message.formatted()))
}
