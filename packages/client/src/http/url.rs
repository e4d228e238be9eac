//! Userinfo handling: credential extraction and redaction

use url::Url;

use super::escape::url_decode;

/// Placeholder written over a credential component before logging.
pub const REDACTED: &str = "REDACTED";

/// Password literal marking an OAuth token passed as the user.
pub const OAUTH_BASIC: &str = "x-oauth-basic";

/// Decoded userinfo of a URL.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: Option<String>,
}

impl Credentials {
    /// Percent-decoded userinfo, or `None` when the URL carries no user.
    pub fn from_url(url: &Url) -> Option<Self> {
        if url.username().is_empty() && url.password().is_none() {
            return None;
        }
        Some(Self {
            user: url_decode(url.username()),
            password: url.password().map(url_decode),
        })
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &REDACTED)
            .field("password", &self.password.as_ref().map(|_| REDACTED))
            .finish()
    }
}

/// Render `url` with its credential replaced by `REDACTED`.
///
/// A token (user without password, or `token:x-oauth-basic`) hides the user;
/// a `user:password` pair hides the password.
pub fn redact(url: &Url) -> String {
    let user = url.username();
    let password = url.password();

    let mut redacted = url.clone();
    if !user.is_empty() && (password.is_none() || password == Some(OAUTH_BASIC)) {
        let _ = redacted.set_username(REDACTED);
    } else if password.is_some() {
        let _ = redacted.set_password(Some(REDACTED));
    }
    redacted.to_string()
}
