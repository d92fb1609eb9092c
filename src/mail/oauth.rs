//! OAuth2 support for Gmail using the installed app flow
//!
//! Opens a browser for authorization and receives the redirect on a loopback
//! listener. Client credentials come from a Google `client_secret.json`
//! file; tokens are exchanged with PKCE.

use anyhow::{Context, Result, bail};
use base64::Engine;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;
use std::{fs, thread};

use crate::constants::{OAUTH_CALLBACK_TIMEOUT_SECS, OAUTH_HTTP_TIMEOUT_SECS};

/// Gmail scope for sending mail. Send-only: the app never reads a mailbox.
const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";

fn default_auth_uri() -> String {
    "https://accounts.google.com/o/oauth2/v2/auth".to_string()
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// Credentials from a Google `client_secret.json` file (OAuth client type
/// "Desktop app"; the fields live under an `installed` key).
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecret {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl ClientSecret {
    /// Load a client secret file as downloaded from the Google Cloud console.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read client secret file: {}", path.display()))?;
        let value: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Invalid JSON in client secret file: {}", path.display()))?;
        let installed = value
            .get("installed")
            .cloned()
            .context("client secret file has no \"installed\" section")?;
        serde_json::from_value(installed).context("client secret file is missing required fields")
    }
}

/// Tokens returned by Google's token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuth2Tokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Error response from the token endpoint.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
    error_description: Option<String>,
}

/// State for an in-progress authorization flow.
pub struct AuthFlowState {
    pub auth_url: String,
    pub redirect_uri: String,
    pub pkce_verifier: String,
    state: String,
    listener: TcpListener,
}

/// Gmail OAuth2 client for the installed app flow.
pub struct GmailOAuth2 {
    secret: ClientSecret,
    http_client: reqwest::Client,
}

impl GmailOAuth2 {
    pub fn new(secret: ClientSecret) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(OAUTH_HTTP_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            secret,
            http_client,
        })
    }

    /// Bind the loopback listener and build the authorization URL.
    pub fn start_auth_flow(&self) -> Result<AuthFlowState> {
        let listener = TcpListener::bind("127.0.0.1:0").context("Failed to bind to local port")?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://127.0.0.1:{}", port);

        // PKCE verifier and S256 challenge
        let mut verifier_bytes = [0u8; 32];
        getrandom::fill(&mut verifier_bytes)
            .map_err(|e| anyhow::anyhow!("Failed to generate PKCE verifier: {}", e))?;
        let pkce_verifier =
            base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(verifier_bytes);
        let challenge = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .encode(Sha256::digest(pkce_verifier.as_bytes()));

        // Random state parameter for CSRF protection
        let mut state_bytes = [0u8; 16];
        getrandom::fill(&mut state_bytes)
            .map_err(|e| anyhow::anyhow!("Failed to generate state parameter: {}", e))?;
        let state = base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(state_bytes);

        let auth_url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}\
             &code_challenge={}&code_challenge_method=S256\
             &access_type=offline&prompt=consent&state={}",
            self.secret.auth_uri,
            percent_encode(&self.secret.client_id),
            percent_encode(&redirect_uri),
            percent_encode(GMAIL_SEND_SCOPE),
            percent_encode(&challenge),
            percent_encode(&state),
        );

        tracing::debug!("OAuth2 redirect URI: {}", redirect_uri);

        Ok(AuthFlowState {
            auth_url,
            redirect_uri,
            pkce_verifier,
            state,
            listener,
        })
    }

    /// Block until the browser redirects back, then extract the
    /// authorization code. Intended to run on a blocking task.
    pub fn wait_for_callback(flow: &AuthFlowState) -> Result<String> {
        use std::io::ErrorKind;

        flow.listener.set_nonblocking(true)?;

        let timeout = Duration::from_secs(OAUTH_CALLBACK_TIMEOUT_SECS);
        let start = std::time::Instant::now();

        let mut stream = loop {
            match flow.listener.accept() {
                Ok((stream, _)) => break stream,
                Err(e) if e.kind() == ErrorKind::WouldBlock => {
                    if start.elapsed() > timeout {
                        bail!("Authorization timed out. Please try again.");
                    }
                    thread::sleep(Duration::from_millis(100));
                }
                Err(e) => return Err(e).context("Failed to accept authorization callback"),
            }
        };

        let mut reader = BufReader::new(&stream);
        let mut request_line = String::new();
        reader.read_line(&mut request_line)?;

        let query = request_line
            .split_whitespace()
            .nth(1)
            .and_then(|path| path.split('?').nth(1))
            .unwrap_or("");

        if let Some(error) = query_param(query, "error") {
            let description = query_param(query, "error_description")
                .map(|s| percent_decode(&s))
                .unwrap_or_default();
            respond(
                &mut stream,
                &format!(
                    "<h1>Authorization failed</h1><p>{}</p><p>{}</p>\
                     <p>Close this window and try again.</p>",
                    escape_html(&error),
                    escape_html(&description)
                ),
            );
            bail!("Authorization denied: {} {}", error, description);
        }

        let returned_state =
            query_param(query, "state").context("No state parameter in callback")?;
        if returned_state != flow.state {
            bail!("State parameter mismatch - possible CSRF attack");
        }

        let code = query_param(query, "code").context("No authorization code in callback")?;

        respond(
            &mut stream,
            "<h1>Authorization successful</h1>\
             <p>You can close this window and return to quill.</p>",
        );

        Ok(code)
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(
        &self,
        code: &str,
        redirect_uri: &str,
        pkce_verifier: &str,
    ) -> Result<OAuth2Tokens> {
        self.token_request(&[
            ("client_id", &self.secret.client_id),
            ("client_secret", &self.secret.client_secret),
            ("code", code),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
            ("code_verifier", pkce_verifier),
        ])
        .await
        .context("Token exchange failed")
    }

    /// Obtain a fresh access token from a refresh token.
    pub async fn refresh_access_token(&self, refresh_token: &str) -> Result<OAuth2Tokens> {
        self.token_request(&[
            ("client_id", &self.secret.client_id),
            ("client_secret", &self.secret.client_secret),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .await
        .context("Token refresh failed")
    }

    async fn token_request(&self, params: &[(&str, &str)]) -> Result<OAuth2Tokens> {
        let response = self
            .http_client
            .post(&self.secret.token_uri)
            .form(params)
            .send()
            .await
            .context("Failed to reach token endpoint")?;

        if !response.status().is_success() {
            let error: ErrorResponse = response.json().await.unwrap_or(ErrorResponse {
                error: "unknown_error".to_string(),
                error_description: None,
            });
            bail!(
                "{}: {}",
                error.error,
                error.error_description.unwrap_or_default()
            );
        }

        response
            .json()
            .await
            .context("Failed to parse token response")
    }
}

/// Find a query parameter value by name.
fn query_param(query: &str, name: &str) -> Option<String> {
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=')?;
        (key == name).then(|| value.to_string())
    })
}

/// Write a minimal HTML page back to the browser.
fn respond(stream: &mut std::net::TcpStream, body: &str) {
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n<html><body>{}</body></html>",
        body
    );
    stream.write_all(response.as_bytes()).ok();
}

/// Escape HTML special characters to prevent XSS in the callback page.
fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Percent-encode a string for use in a URL query.
fn percent_encode(s: &str) -> String {
    let mut result = String::new();
    for c in s.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '-' | '_' | '.' | '~' => result.push(c),
            _ => {
                for b in c.to_string().as_bytes() {
                    result.push_str(&format!("%{:02X}", b));
                }
            }
        }
    }
    result
}

/// Percent-decode a query parameter value.
fn percent_decode(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '%' {
            let hex: String = chars.by_ref().take(2).collect();
            if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                result.push(byte as char);
            }
        } else if c == '+' {
            result.push(' ');
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::testing::serve_once;

    fn write_secret_file(token_uri: Option<&str>) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "quill_secret_{}_{:?}.json",
            std::process::id(),
            std::thread::current().id()
        ));
        let token_uri = token_uri.unwrap_or("https://oauth2.googleapis.com/token");
        let content = format!(
            r#"{{"installed":{{"client_id":"id-123","client_secret":"s3cret",
                "auth_uri":"https://accounts.google.com/o/oauth2/v2/auth",
                "token_uri":"{}"}}}}"#,
            token_uri
        );
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_client_secret_file() {
        let path = write_secret_file(None);
        let secret = ClientSecret::load(&path).unwrap();
        assert_eq!(secret.client_id, "id-123");
        assert_eq!(secret.client_secret, "s3cret");
        assert_eq!(secret.token_uri, "https://oauth2.googleapis.com/token");
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_rejects_missing_installed_section() {
        let path = std::env::temp_dir().join(format!("quill_secret_bad_{}.json", std::process::id()));
        fs::write(&path, r#"{"web":{"client_id":"x"}}"#).unwrap();
        assert!(ClientSecret::load(&path).is_err());
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_rejects_missing_file() {
        assert!(ClientSecret::load(Path::new("/nonexistent/secret.json")).is_err());
    }

    #[test]
    fn test_auth_url_carries_send_scope_and_pkce() {
        let path = write_secret_file(None);
        let oauth = GmailOAuth2::new(ClientSecret::load(&path).unwrap()).unwrap();
        let flow = oauth.start_auth_flow().unwrap();

        assert!(flow.auth_url.contains("gmail.send"));
        assert!(flow.auth_url.contains("code_challenge_method=S256"));
        assert!(flow.auth_url.contains("access_type=offline"));
        assert!(flow.auth_url.contains(&percent_encode(&flow.redirect_uri)));
        fs::remove_file(&path).ok();
    }

    #[tokio::test]
    async fn test_refresh_access_token_round_trip() {
        let token_uri = format!(
            "{}/token",
            serve_once(
                "200 OK",
                r#"{"access_token":"new-token","expires_in":3600,"token_type":"Bearer"}"#
                    .to_string(),
            )
            .await
        );
        let secret = ClientSecret {
            client_id: "id-123".to_string(),
            client_secret: "s3cret".to_string(),
            auth_uri: default_auth_uri(),
            token_uri,
        };
        let oauth = GmailOAuth2::new(secret).unwrap();

        let tokens = oauth.refresh_access_token("refresh-1").await.unwrap();
        assert_eq!(tokens.access_token, "new-token");
        assert_eq!(tokens.expires_in, Some(3600));
        assert!(tokens.refresh_token.is_none());
    }

    #[tokio::test]
    async fn test_token_endpoint_error_is_reported() {
        let token_uri = format!(
            "{}/token",
            serve_once(
                "400 Bad Request",
                r#"{"error":"invalid_grant","error_description":"Token revoked"}"#.to_string(),
            )
            .await
        );
        let secret = ClientSecret {
            client_id: "id-123".to_string(),
            client_secret: "s3cret".to_string(),
            auth_uri: default_auth_uri(),
            token_uri,
        };
        let oauth = GmailOAuth2::new(secret).unwrap();

        let err = oauth.refresh_access_token("refresh-1").await.unwrap_err();
        assert!(format!("{:#}", err).contains("invalid_grant"));
    }

    #[test]
    fn test_percent_encode() {
        assert_eq!(percent_encode("hello"), "hello");
        assert_eq!(percent_encode("hello world"), "hello%20world");
        assert_eq!(percent_encode("a=b&c=d"), "a%3Db%26c%3Dd");
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("hello%20world"), "hello world");
        assert_eq!(percent_decode("a+b"), "a b");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a&b\"c'"), "a&amp;b&quot;c&#x27;");
    }

    #[test]
    fn test_query_param() {
        assert_eq!(
            query_param("code=abc&state=xyz", "code"),
            Some("abc".to_string())
        );
        assert_eq!(query_param("code=abc", "state"), None);
    }
}
