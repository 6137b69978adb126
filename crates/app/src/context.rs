//! Application context shared by every view.

use authoring::AuthoringWorkflow;
use backend::{AuthApi, AuthToken, ContactRequest, FullBackend};
use checkout::{CheckoutCoordinator, PaymentGateway};
use common::CourseId;

use crate::admin::AdminConsole;
use crate::cart::CartView;
use crate::catalog::{CatalogBrowser, CourseStatus, course_status};
use crate::config::Config;
use crate::error::{AppError, Result, request_message};
use crate::session::SessionService;
use crate::storage::TokenStore;

const LOGIN_REQUIRED: &str = "Authentication required. Please log in.";

/// The backend, the session and the configuration, handed to each view.
///
/// The cart, checkout and authoring views read the session token on every
/// request, so a logout is seen by views that are already open. The admin
/// consoles hold the token they were opened with.
pub struct AppContext<B, S>
where
    B: FullBackend + Clone,
    S: TokenStore,
{
    config: Config,
    backend: B,
    session: SessionService<B, S>,
}

impl<B, S> AppContext<B, S>
where
    B: FullBackend + Clone,
    S: TokenStore,
{
    pub fn new(config: Config, backend: B, store: S) -> Self {
        let session = SessionService::new(backend.clone(), store);
        Self {
            config,
            backend,
            session,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn session(&self) -> &SessionService<B, S> {
        &self.session
    }

    /// Refetches the signed-in user's profile.
    pub async fn reload(&self) -> Result<()> {
        self.session.reload().await
    }

    fn require_token(&self) -> Result<AuthToken> {
        self.session
            .token()
            .ok_or(AppError::NotAuthenticated(LOGIN_REQUIRED))
    }

    pub fn catalog(&self) -> CatalogBrowser<B> {
        CatalogBrowser::new(self.backend.clone())
    }

    pub fn admin_catalog(&self) -> Result<CatalogBrowser<B>> {
        Ok(CatalogBrowser::admin(self.backend.clone(), self.require_token()?))
    }

    pub fn cart(&self) -> CartView<B> {
        CartView::new(self.backend.clone(), self.session.token_source())
    }

    pub fn checkout<G: PaymentGateway>(&self, gateway: G) -> CheckoutCoordinator<B, G> {
        CheckoutCoordinator::new(
            self.backend.clone(),
            gateway,
            self.config.checkout_settings(),
            self.session.token_source(),
        )
    }

    pub fn authoring(&self, course_id: CourseId) -> AuthoringWorkflow<B> {
        AuthoringWorkflow::new(self.backend.clone(), self.session.token_source(), course_id)
    }

    /// Opens the admin consoles. A known profile must carry a role at
    /// admin level; the backend still enforces its own checks.
    pub fn admin(&self) -> Result<AdminConsole<B>> {
        let token = self.require_token()?;
        let session = self.session.current();
        if session.user.is_some() && !session.can_view_admin_consoles() {
            return Err(AppError::NotAdmin);
        }
        Ok(AdminConsole::new(self.backend.clone(), token))
    }

    /// Enrollment and cart membership of the signed-in user for a course.
    pub async fn course_status(&self, course_id: CourseId) -> CourseStatus {
        course_status(&self.backend, self.session.token().as_ref(), course_id).await
    }

    /// Sends a support ticket. Works signed in or not.
    #[tracing::instrument(skip(self, request), fields(email = %request.email))]
    pub async fn contact(&self, request: &ContactRequest) -> Result<()> {
        request.validate()?;
        self.backend.contact(request).await.map_err(|e| {
            tracing::error!(error = %e, "contact request failed");
            AppError::Request(request_message(&e, "Failed to submit ticket"))
        })?;
        tracing::info!("support ticket submitted");
        Ok(())
    }
}
