//! Gmail session lifecycle and message delivery

mod oauth;
mod send;
mod session;
mod token;

pub use oauth::{ClientSecret, GmailOAuth2, OAuth2Tokens};
pub use send::{GmailClient, SendError};
pub use session::{AuthenticationError, LogoutOutcome, MailSession, SessionState};
pub use token::{StoredTokens, TokenStore};
