//! Session state machine for the Gmail account
//!
//! Owns the persisted token and the transitions between unauthenticated,
//! refreshing and authenticated states. All calls happen on the event-loop
//! thread; there is no concurrent access.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use thiserror::Error;

use super::oauth::{ClientSecret, GmailOAuth2, OAuth2Tokens};
use super::token::{StoredTokens, TokenStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticating,
    Refreshing,
    Authenticated,
    LoggedOut,
}

#[derive(Debug, Error)]
pub enum AuthenticationError {
    /// The client secret file is absent or unreadable; first-time
    /// authentication cannot start without it.
    #[error("client secret unavailable: {0:#}")]
    MissingClientSecret(anyhow::Error),
    /// The interactive authorization flow was denied, timed out or failed.
    #[error("authorization failed: {0:#}")]
    FlowAborted(anyhow::Error),
    /// The stored refresh token was rejected.
    #[error("token refresh failed: {0:#}")]
    RefreshFailed(anyhow::Error),
}

/// Result of a logout request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutOutcome {
    LoggedOut,
    NotLoggedIn,
}

pub struct MailSession {
    store: TokenStore,
    client_secret_path: PathBuf,
    state: SessionState,
    tokens: Option<StoredTokens>,
}

impl MailSession {
    pub fn new(client_secret_path: PathBuf, token_path: PathBuf) -> Self {
        Self {
            store: TokenStore::new(token_path),
            client_secret_path,
            state: SessionState::Unauthenticated,
            tokens: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// Establish an authenticated session: reuse a valid persisted token,
    /// refresh an expired one, or fall back to the interactive browser flow.
    pub async fn authenticate(&mut self) -> Result<(), AuthenticationError> {
        if let Ok(stored) = self.store.load() {
            if stored.is_valid() {
                tracing::info!("Using persisted token from {}", self.store.path().display());
                self.tokens = Some(stored);
                self.state = SessionState::Authenticated;
                return Ok(());
            }
            if let Some(refresh_token) = stored.refresh_token.clone() {
                tracing::info!("Persisted token expired, refreshing");
                self.state = SessionState::Refreshing;
                let result = self.refresh(refresh_token).await;
                if result.is_err() {
                    self.state = SessionState::Unauthenticated;
                }
                return result;
            }
            // Expired and not refreshable: run the interactive flow again.
        }

        self.state = SessionState::Authenticating;
        let result = self.authorize_interactive().await;
        if result.is_err() {
            self.state = SessionState::Unauthenticated;
        }
        result
    }

    /// Current access token, refreshing transparently when it has expired.
    pub async fn access_token(&mut self) -> Result<String, AuthenticationError> {
        let usable = self.is_authenticated()
            && self.tokens.as_ref().is_some_and(|tokens| tokens.is_valid());
        if !usable {
            self.authenticate().await?;
        }

        match &self.tokens {
            Some(tokens) => Ok(tokens.access_token.clone()),
            None => Err(AuthenticationError::FlowAborted(anyhow::anyhow!(
                "no token present after authentication"
            ))),
        }
    }

    /// Invalidate the persisted token and reset the in-memory session. The
    /// next authentication starts from scratch.
    pub fn logout(&mut self) -> anyhow::Result<LogoutOutcome> {
        let removed = self.store.invalidate()?;
        self.tokens = None;

        if removed {
            tracing::info!("Deleted token file {}", self.store.path().display());
            self.state = SessionState::LoggedOut;
            Ok(LogoutOutcome::LoggedOut)
        } else {
            self.state = SessionState::Unauthenticated;
            Ok(LogoutOutcome::NotLoggedIn)
        }
    }

    fn oauth_client(&self) -> Result<GmailOAuth2, AuthenticationError> {
        let secret = ClientSecret::load(&self.client_secret_path)
            .map_err(AuthenticationError::MissingClientSecret)?;
        GmailOAuth2::new(secret).map_err(AuthenticationError::FlowAborted)
    }

    async fn refresh(&mut self, refresh_token: String) -> Result<(), AuthenticationError> {
        let oauth = self.oauth_client()?;
        let fresh = oauth
            .refresh_access_token(&refresh_token)
            .await
            .map_err(AuthenticationError::RefreshFailed)?;

        // Google omits the refresh token on refresh responses; keep ours.
        self.install(fresh, Some(refresh_token))
            .map_err(AuthenticationError::RefreshFailed)?;
        self.state = SessionState::Authenticated;
        Ok(())
    }

    /// Run the browser-based authorization flow. Blocks the caller until the
    /// redirect arrives or the flow times out.
    async fn authorize_interactive(&mut self) -> Result<(), AuthenticationError> {
        let oauth = self.oauth_client()?;
        let flow = oauth
            .start_auth_flow()
            .map_err(AuthenticationError::FlowAborted)?;

        tracing::info!("Opening browser for Gmail authorization");
        if let Err(e) = open::that(&flow.auth_url) {
            tracing::warn!("Failed to open browser: {}", e);
            eprintln!("Open this URL to authorize: {}", flow.auth_url);
        }

        // The loopback listener is blocking; park it on a blocking task.
        let (code, flow) = tokio::task::spawn_blocking(move || {
            let code = GmailOAuth2::wait_for_callback(&flow)?;
            Ok::<_, anyhow::Error>((code, flow))
        })
        .await
        .map_err(|e| AuthenticationError::FlowAborted(anyhow::anyhow!(e)))?
        .map_err(AuthenticationError::FlowAborted)?;

        let tokens = oauth
            .exchange_code(&code, &flow.redirect_uri, &flow.pkce_verifier)
            .await
            .map_err(AuthenticationError::FlowAborted)?;

        self.install(tokens, None)
            .map_err(AuthenticationError::FlowAborted)?;
        self.state = SessionState::Authenticated;
        tracing::info!("Gmail authorization successful");
        Ok(())
    }

    /// Convert endpoint tokens into stored form, persist and cache them.
    fn install(
        &mut self,
        fresh: OAuth2Tokens,
        previous_refresh_token: Option<String>,
    ) -> anyhow::Result<()> {
        let expires_at = fresh
            .expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs as i64));
        let stored = StoredTokens {
            access_token: fresh.access_token,
            refresh_token: fresh.refresh_token.or(previous_refresh_token),
            expires_at,
        };
        self.store.persist(&stored)?;
        self.tokens = Some(stored);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::testing::serve_once;
    use std::fs;
    use std::path::Path;

    fn temp_path(tag: &str, name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("quill_session_{}_{}", tag, std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    fn persist(path: &Path, tokens: &StoredTokens) {
        TokenStore::new(path.to_path_buf()).persist(tokens).unwrap();
    }

    fn valid_tokens() -> StoredTokens {
        StoredTokens {
            access_token: "access-1".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            expires_at: Some(Utc::now() + Duration::hours(1)),
        }
    }

    fn expired_tokens(refresh: Option<&str>) -> StoredTokens {
        StoredTokens {
            access_token: "stale".to_string(),
            refresh_token: refresh.map(|s| s.to_string()),
            expires_at: Some(Utc::now() - Duration::hours(1)),
        }
    }

    fn write_secret(path: &Path, token_uri: &str) {
        let content = format!(
            r#"{{"installed":{{"client_id":"id","client_secret":"s","token_uri":"{}"}}}}"#,
            token_uri
        );
        fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_valid_persisted_token_is_reused() {
        let token_path = temp_path("reuse", "token.json");
        fs::remove_file(&token_path).ok();
        persist(&token_path, &valid_tokens());

        // No client secret needed: the stored token is simply loaded.
        let mut session =
            MailSession::new(temp_path("reuse", "missing_secret.json"), token_path.clone());
        session.authenticate().await.unwrap();

        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(session.access_token().await.unwrap(), "access-1");
        fs::remove_file(&token_path).ok();
    }

    #[tokio::test]
    async fn test_expired_token_is_refreshed_and_persisted() {
        let token_path = temp_path("refresh", "token.json");
        fs::remove_file(&token_path).ok();
        persist(&token_path, &expired_tokens(Some("refresh-1")));

        let token_uri = format!(
            "{}/token",
            serve_once(
                "200 OK",
                r#"{"access_token":"fresh","expires_in":3600,"token_type":"Bearer"}"#.to_string(),
            )
            .await
        );
        let secret_path = temp_path("refresh", "client_secret.json");
        write_secret(&secret_path, &token_uri);

        let mut session = MailSession::new(secret_path.clone(), token_path.clone());
        session.authenticate().await.unwrap();

        assert_eq!(session.state(), SessionState::Authenticated);
        assert_eq!(session.access_token().await.unwrap(), "fresh");

        // The refreshed token was persisted and kept the old refresh token.
        let stored = TokenStore::new(token_path.clone()).load().unwrap();
        assert_eq!(stored.access_token, "fresh");
        assert_eq!(stored.refresh_token, Some("refresh-1".to_string()));

        fs::remove_file(&token_path).ok();
        fs::remove_file(&secret_path).ok();
    }

    #[tokio::test]
    async fn test_rejected_refresh_fails_and_resets_state() {
        let token_path = temp_path("rejected", "token.json");
        fs::remove_file(&token_path).ok();
        persist(&token_path, &expired_tokens(Some("refresh-1")));

        let token_uri = format!(
            "{}/token",
            serve_once(
                "400 Bad Request",
                r#"{"error":"invalid_grant"}"#.to_string(),
            )
            .await
        );
        let secret_path = temp_path("rejected", "client_secret.json");
        write_secret(&secret_path, &token_uri);

        let mut session = MailSession::new(secret_path.clone(), token_path.clone());
        let err = session.authenticate().await.unwrap_err();

        assert!(matches!(err, AuthenticationError::RefreshFailed(_)));
        assert_eq!(session.state(), SessionState::Unauthenticated);

        fs::remove_file(&token_path).ok();
        fs::remove_file(&secret_path).ok();
    }

    #[tokio::test]
    async fn test_logout_deletes_token_and_forces_reauthorization() {
        let token_path = temp_path("logout", "token.json");
        fs::remove_file(&token_path).ok();
        persist(&token_path, &valid_tokens());

        let secret_path = temp_path("logout", "missing_secret.json");
        fs::remove_file(&secret_path).ok();

        let mut session = MailSession::new(secret_path, token_path.clone());
        session.authenticate().await.unwrap();
        assert!(session.is_authenticated());

        assert_eq!(session.logout().unwrap(), LogoutOutcome::LoggedOut);
        assert_eq!(session.state(), SessionState::LoggedOut);
        assert!(!token_path.exists());

        // The deleted token must not be reused: with no client secret file
        // the interactive flow is the only remaining path, and it fails
        // before any token is touched.
        let err = session.authenticate().await.unwrap_err();
        assert!(matches!(err, AuthenticationError::MissingClientSecret(_)));
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }

    #[tokio::test]
    async fn test_logout_without_token_reports_not_logged_in() {
        let token_path = temp_path("no_token", "token.json");
        fs::remove_file(&token_path).ok();

        let mut session =
            MailSession::new(temp_path("no_token", "secret.json"), token_path);
        assert_eq!(session.logout().unwrap(), LogoutOutcome::NotLoggedIn);
        assert_eq!(session.state(), SessionState::Unauthenticated);
    }
}
