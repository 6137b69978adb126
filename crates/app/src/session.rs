//! Signed-in session shared by every view.

use backend::{AuthApi, AuthToken, BackendError, SignupRequest, TokenSource};
use chrono::{DateTime, Utc};
use domain::User;
use tokio::sync::watch;

use crate::error::{AppError, Result, request_message};
use crate::storage::TokenStore;

/// Highest role level that opens the admin consoles.
pub const ADMIN_CONSOLE_LEVEL: i32 = 500;

/// Highest role level that opens the super-admin consoles.
pub const SUPER_ADMIN_CONSOLE_LEVEL: i32 = 100;

/// Snapshot of the current session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub token: Option<AuthToken>,
    /// Profile of the signed-in user, once fetched.
    pub user: Option<User>,
    pub signed_in_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Any role at or below level 500 (lower is more privileged).
    pub fn can_view_admin_consoles(&self) -> bool {
        self.has_role_level(ADMIN_CONSOLE_LEVEL)
    }

    pub fn can_view_super_admin_consoles(&self) -> bool {
        self.has_role_level(SUPER_ADMIN_CONSOLE_LEVEL)
    }

    fn has_role_level(&self, max_level: i32) -> bool {
        self.user
            .as_ref()
            .is_some_and(|u| u.roles.iter().any(|r| r.role.level <= max_level))
    }
}

/// Owns the session token and user profile and notifies subscribers of
/// every change.
pub struct SessionService<B, S>
where
    B: AuthApi,
    S: TokenStore,
{
    backend: B,
    store: S,
    tx: watch::Sender<Session>,
}

impl<B, S> SessionService<B, S>
where
    B: AuthApi,
    S: TokenStore,
{
    pub fn new(backend: B, store: S) -> Self {
        let (tx, _) = watch::channel(Session::default());
        Self { backend, store, tx }
    }

    /// Current snapshot.
    pub fn current(&self) -> Session {
        self.tx.borrow().clone()
    }

    pub fn token(&self) -> Option<AuthToken> {
        self.tx.borrow().token.clone()
    }

    /// Receiver that observes every session change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    /// Token source that follows this session through logins and logouts.
    pub fn token_source(&self) -> TokenSource {
        TokenSource::watch(self.subscribe(), |session| session.token.clone())
    }

    /// Restores a persisted token at startup.
    ///
    /// A token whose profile cannot be fetched is discarded.
    #[tracing::instrument(skip(self))]
    pub async fn restore(&self) -> Result<bool> {
        let Some(token) = self.store.load().await? else {
            return Ok(false);
        };
        match self.backend.profile(&token).await {
            Ok(user) => {
                tracing::info!(user_id = %user.id, "session restored");
                self.publish(Session {
                    token: Some(token),
                    user: Some(user),
                    signed_in_at: None,
                });
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "no valid token yet");
                self.store.clear().await?;
                self.publish(Session::default());
                Ok(false)
            }
        }
    }

    /// Signs in, persists the token and loads the profile.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let token = match self.backend.signin(email, password).await {
            Ok(token) => token,
            Err(e) => {
                tracing::error!(error = %e, "login failed");
                metrics::counter!("session_logins_total", "outcome" => "error").increment(1);
                return Err(match e {
                    BackendError::Network(_) => AppError::Backend(e),
                    _ => AppError::LoginFailed,
                });
            }
        };
        self.store.save(&token).await?;
        metrics::counter!("session_logins_total", "outcome" => "ok").increment(1);

        let user = match self.backend.profile(&token).await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch user");
                None
            }
        };
        let session = Session {
            token: Some(token),
            user,
            signed_in_at: Some(Utc::now()),
        };
        self.publish(session.clone());
        Ok(session)
    }

    /// Creates an account. Does not sign in.
    #[tracing::instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: &SignupRequest) -> Result<()> {
        self.backend.signup(request).await.map_err(|e| {
            tracing::error!(error = %e, "signup failed");
            AppError::Request(request_message(&e, "Signup failed"))
        })
    }

    /// Forgets the token and the profile.
    pub async fn logout(&self) -> Result<()> {
        self.store.clear().await?;
        self.publish(Session::default());
        tracing::info!("signed out");
        Ok(())
    }

    /// Refetches the profile of the signed-in user.
    ///
    /// Without a token this only logs a warning.
    #[tracing::instrument(skip(self))]
    pub async fn reload(&self) -> Result<()> {
        let Some(token) = self.token() else {
            tracing::warn!("attempted to reload user data without a token");
            return Ok(());
        };
        match self.backend.profile(&token).await {
            Ok(user) => {
                tracing::debug!(user_id = %user.id, "user profile reloaded");
                self.tx.send_modify(|session| session.user = Some(user));
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch user");
                Err(e.into())
            }
        }
    }

    fn publish(&self, session: Session) {
        self.tx.send_replace(session);
    }
}
