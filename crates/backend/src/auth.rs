use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Bearer token issued by the sign-in endpoint.
///
/// `Debug` output is redacted so tokens never reach the logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthToken(String);

impl AuthToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthToken(***)")
    }
}

type TokenFn = dyn Fn() -> Option<AuthToken> + Send + Sync;

/// Where a view reads the session token from.
///
/// Views call [`TokenSource::current`] on every request, so a source that
/// follows the session sees logins and logouts made after the view was
/// created.
#[derive(Clone)]
pub struct TokenSource(Source);

#[derive(Clone)]
enum Source {
    Fixed(Option<AuthToken>),
    Live(Arc<TokenFn>),
}

impl TokenSource {
    /// A token that never changes.
    pub fn fixed(token: Option<AuthToken>) -> Self {
        Self(Source::Fixed(token))
    }

    /// Follows a watched value, projecting the token out of it.
    pub fn watch<T>(rx: watch::Receiver<T>, token: fn(&T) -> Option<AuthToken>) -> Self
    where
        T: Send + Sync + 'static,
    {
        Self(Source::Live(Arc::new(move || token(&rx.borrow()))))
    }

    /// The token as of now.
    pub fn current(&self) -> Option<AuthToken> {
        match &self.0 {
            Source::Fixed(token) => token.clone(),
            Source::Live(read) => read(),
        }
    }

    pub fn is_present(&self) -> bool {
        self.current().is_some()
    }
}

impl Default for TokenSource {
    fn default() -> Self {
        Self::fixed(None)
    }
}

impl From<Option<AuthToken>> for TokenSource {
    fn from(token: Option<AuthToken>) -> Self {
        Self::fixed(token)
    }
}

impl From<AuthToken> for TokenSource {
    fn from(token: AuthToken) -> Self {
        Self::fixed(Some(token))
    }
}

impl std::fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.0 {
            Source::Fixed(_) => "fixed",
            Source::Live(_) => "live",
        };
        f.debug_struct("TokenSource")
            .field("kind", &kind)
            .field("token", &self.current())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_is_redacted() {
        let token = AuthToken::new("secret-jwt");
        assert_eq!(format!("{token:?}"), "AuthToken(***)");
        assert_eq!(token.bearer(), "Bearer secret-jwt");
    }

    #[test]
    fn test_watched_source_follows_changes() {
        let (tx, rx) = watch::channel(Some(AuthToken::new("first")));
        let source = TokenSource::watch(rx, |token| token.clone());
        assert_eq!(source.current(), Some(AuthToken::new("first")));

        tx.send_replace(None);
        assert!(!source.is_present());

        tx.send_replace(Some(AuthToken::new("second")));
        assert_eq!(source.current(), Some(AuthToken::new("second")));
    }

    #[test]
    fn test_fixed_source() {
        let source = TokenSource::from(AuthToken::new("jwt"));
        assert_eq!(source.clone().current(), Some(AuthToken::new("jwt")));
        assert!(!TokenSource::default().is_present());
    }
}
