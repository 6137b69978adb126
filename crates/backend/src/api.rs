//! The backend REST API as async traits.
//!
//! Split by concern so each coordinator depends only on what it calls.

use async_trait::async_trait;
use common::{CartItemId, CourseId, RoleId, SectionId, TopicId, UserId};
use domain::{
    Cart, CartLookup, CatalogQuery, Category, CheckoutSummary, Course, CourseDraft, DomainError,
    Enrollments, Page, Role, RoleDraft, SectionDraft, User, UserSummary, forms::TopicUpload,
};
use serde::Serialize;

use crate::auth::AuthToken;
use crate::error::Result;
use crate::payment::{GatewayResponse, PaymentOrder};

/// Body of the sign-up request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Body of a support ticket sent from the contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

impl ContactRequest {
    /// Checks that no field is blank.
    pub fn validate(&self) -> std::result::Result<(), DomainError> {
        for (field, value) in [("Name", &self.name), ("Email", &self.email), ("Message", &self.message)] {
            if value.trim().is_empty() {
                return Err(DomainError::Required { field });
            }
        }
        Ok(())
    }
}

/// Cart and checkout-summary endpoints.
#[async_trait]
pub trait CartApi: Send + Sync {
    /// `GET /cart/user`. A 404 without a message is an empty cart.
    async fn get_cart(&self, token: &AuthToken) -> Result<CartLookup<Cart>>;

    /// `POST /cart/addtocart?courseId=`.
    async fn add_to_cart(&self, token: &AuthToken, course_id: CourseId) -> Result<()>;

    /// `DELETE /cart/removeitem/{id}`.
    async fn remove_cart_item(&self, token: &AuthToken, item_id: CartItemId) -> Result<()>;

    /// `POST /cart/user/checkout[?couponCode=]`.
    ///
    /// Loads the coupon-aware summary, applying `coupon_code` when given.
    async fn checkout_summary(
        &self,
        token: &AuthToken,
        coupon_code: Option<&str>,
    ) -> Result<CartLookup<CheckoutSummary>>;

    /// `POST /cart/user/checkout` with `{couponCode}`: validates a coupon.
    async fn apply_coupon(&self, token: &AuthToken, coupon_code: &str) -> Result<()>;
}

/// Payment order and verification endpoints.
#[async_trait]
pub trait PaymentApi: Send + Sync {
    /// `POST /api/payments/createorder` with `{couponCode}`.
    async fn create_order(
        &self,
        token: &AuthToken,
        coupon_code: Option<&str>,
    ) -> Result<PaymentOrder>;

    /// `POST /api/payments/verify` with the raw gateway response.
    ///
    /// Returns the backend's confirmation text.
    async fn verify_payment(&self, token: &AuthToken, response: &GatewayResponse)
    -> Result<String>;
}

/// Course catalog, category and course administration endpoints.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// `GET /courses/getcourses`.
    async fn courses(&self, query: &CatalogQuery) -> Result<Page<Course>>;

    /// `GET /courses/admin/getcourses`, which also lists unpublished courses.
    async fn admin_courses(&self, token: &AuthToken, query: &CatalogQuery) -> Result<Page<Course>>;

    /// `GET /courses/getcategories`.
    async fn categories(&self) -> Result<Vec<Category>>;

    /// `POST /courses/addcategory`.
    async fn add_category(&self, token: &AuthToken, name: &str) -> Result<Category>;

    /// `POST /courses/addcourse` (multipart). Returns the backend's message.
    async fn add_course(&self, token: &AuthToken, draft: &CourseDraft) -> Result<String>;

    /// `PUT /courses/editcourse/{id}` (multipart). Returns the backend's message.
    async fn edit_course(
        &self,
        token: &AuthToken,
        course_id: CourseId,
        draft: &CourseDraft,
    ) -> Result<String>;

    /// `DELETE /courses/deletecourse/{id}`.
    async fn delete_course(&self, token: &AuthToken, course_id: CourseId) -> Result<()>;
}

/// Course content tree endpoints.
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// `GET /courses/course/{id}`: the course with its full content tree.
    async fn course_detail(&self, course_id: CourseId) -> Result<Course>;

    /// `POST /courses/addsection/{courseId}`.
    async fn add_section(
        &self,
        token: &AuthToken,
        course_id: CourseId,
        draft: &SectionDraft,
    ) -> Result<()>;

    /// `POST /courses/addtopic/course/{courseId}/section/{sectionId}` (multipart).
    ///
    /// Returns the backend's message.
    async fn add_topic(
        &self,
        token: &AuthToken,
        course_id: CourseId,
        section_id: SectionId,
        upload: &TopicUpload,
    ) -> Result<String>;

    /// `DELETE /courses/deletesection/{courseId}/{sectionId}`.
    async fn delete_section(
        &self,
        token: &AuthToken,
        course_id: CourseId,
        section_id: SectionId,
    ) -> Result<()>;

    /// `DELETE /courses/deletetopic/course/{courseId}/section/{sectionId}/topic/{topicId}`.
    async fn delete_topic(
        &self,
        token: &AuthToken,
        course_id: CourseId,
        section_id: SectionId,
        topic_id: TopicId,
    ) -> Result<()>;

    /// `GET /courses/secure/video/{topicId}`: a short-lived playable URL.
    ///
    /// Fails with `Forbidden` when the requester has no active enrollment.
    async fn secure_video_url(&self, token: &AuthToken, topic_id: TopicId) -> Result<String>;
}

/// Account endpoints.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/signup`.
    async fn signup(&self, request: &SignupRequest) -> Result<()>;

    /// `POST /auth/signin`: exchanges credentials for a token.
    async fn signin(&self, email: &str, password: &str) -> Result<AuthToken>;

    /// `GET /api/user/profile`.
    async fn profile(&self, token: &AuthToken) -> Result<User>;

    /// `GET /api/user/enrollments`.
    async fn enrollments(&self, token: &AuthToken) -> Result<Enrollments>;

    /// `POST /public/contact`. Needs no token.
    async fn contact(&self, request: &ContactRequest) -> Result<()>;
}

/// Role and user administration endpoints.
#[async_trait]
pub trait AdminApi: Send + Sync {
    /// `POST /auth/role/add`.
    async fn add_role(&self, token: &AuthToken, draft: &RoleDraft) -> Result<Role>;

    /// `GET /auth/roles/getallroles`.
    async fn roles(&self, token: &AuthToken) -> Result<Vec<Role>>;

    /// `GET /auth/users/getallusers?page&size` with a zero-based page index.
    async fn users(&self, token: &AuthToken, page: u32, size: u32) -> Result<Page<UserSummary>>;

    /// `POST /auth/users/assignrole` with `{userId, roleId}`. Returns the backend's message.
    async fn assign_role(&self, token: &AuthToken, user_id: UserId, role_id: RoleId)
    -> Result<String>;
}

/// Convenience bound for a backend that serves every endpoint.
pub trait FullBackend:
    CartApi + PaymentApi + CatalogApi + ContentApi + AuthApi + AdminApi
{
}

impl<T> FullBackend for T where
    T: CartApi + PaymentApi + CatalogApi + ContentApi + AuthApi + AdminApi
{
}
