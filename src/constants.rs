//! Application-wide constants for tuning and configuration
//!
//! Centralizes magic numbers to make them discoverable and configurable.

/// Error message display duration in seconds before auto-dismiss.
pub const ERROR_TTL_SECS: u64 = 5;

/// Input poll timeout in milliseconds while the app is idle.
pub const POLL_TIMEOUT_MS: u64 = 150;

/// Input poll timeout in milliseconds while a draft is generating.
/// Shorter so the completion event is picked up promptly.
pub const POLL_TIMEOUT_BUSY_MS: u64 = 50;

/// Timeout in seconds for the OAuth2 loopback callback.
pub const OAUTH_CALLBACK_TIMEOUT_SECS: u64 = 120;

/// HTTP timeout in seconds for OAuth2 token endpoint requests.
pub const OAUTH_HTTP_TIMEOUT_SECS: u64 = 30;

/// Leeway in seconds subtracted from the token expiry when deciding whether
/// a refresh is needed, so a token does not expire mid-request.
pub const TOKEN_EXPIRY_LEEWAY_SECS: i64 = 60;
