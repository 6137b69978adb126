//! `reqwest` implementation of the backend traits.

use async_trait::async_trait;
use common::{CartItemId, CourseId, RoleId, SectionId, TopicId, UserId};
use domain::forms::{FileUpload, TopicUpload};
use domain::{
    Cart, CartLookup, CatalogQuery, Category, CheckoutSummary, Course, CourseDraft, Enrollments,
    Page, Role, RoleDraft, SectionDraft, User, UserSummary,
};
use reqwest::header::AUTHORIZATION;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::api::{
    AdminApi, AuthApi, CartApi, CatalogApi, ContactRequest, ContentApi, PaymentApi, SignupRequest,
};
use crate::auth::AuthToken;
use crate::error::{BackendError, Result};
use crate::payment::{GatewayResponse, PaymentOrder};

/// HTTP client for the e-learning backend.
///
/// Cheap to clone; clones share one connection pool. No timeouts are set
/// beyond the transport's own defaults.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct SigninResponse {
    #[serde(default)]
    jwt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrderResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    amount: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
}

/// Extracts a human-readable message from an error body.
///
/// A JSON body contributes its `message` field (and nothing if absent);
/// any other non-blank body is taken as the message itself.
pub(crate) fn message_from_body(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(map)) => map
            .get("message")
            .and_then(|m| m.as_str())
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string),
        Ok(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
        Ok(_) => None,
        Err(_) => Some(trimmed.to_string()),
    }
}

fn file_part(file: &FileUpload) -> Result<Part> {
    Ok(Part::bytes(file.bytes.clone())
        .file_name(file.file_name.clone())
        .mime_str(&file.content_type)?)
}

fn course_form(draft: &CourseDraft) -> Result<Form> {
    let mut form = Form::new()
        .text("title", draft.title.clone())
        .text("description", draft.description.clone())
        .text("instructorName", draft.instructor_name.clone())
        .text("price", draft.price.value().to_string())
        .text("duration", draft.duration.to_string());
    if let Some(discounted) = draft.discounted_price {
        form = form.text("discountedPrice", discounted.value().to_string());
    }
    if let Some(category_id) = draft.category_id {
        form = form.text("categoryId", category_id.to_string());
    }
    if let Some(image) = &draft.image {
        form = form.part("image", file_part(image)?);
    }
    Ok(form)
}

impl HttpBackend {
    /// Creates a client for the backend at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Creates a client reusing an existing `reqwest::Client`.
    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    /// The configured base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authed(&self, request: RequestBuilder, token: &AuthToken) -> RequestBuilder {
        request.header(AUTHORIZATION, token.bearer())
    }

    /// Sends a request and records it.
    async fn send(&self, request: RequestBuilder, endpoint: &'static str) -> Result<Response> {
        metrics::counter!("backend_requests_total", "endpoint" => endpoint).increment(1);
        let response = request.send().await.map_err(|e| {
            tracing::warn!(endpoint, error = %e, "backend unreachable");
            metrics::counter!("backend_errors_total", "endpoint" => endpoint).increment(1);
            BackendError::Network(e)
        })?;
        tracing::debug!(
            endpoint,
            status = response.status().as_u16(),
            "backend responded"
        );
        Ok(response)
    }

    /// Sends a request and turns any non-success status into an error.
    async fn send_ok(&self, request: RequestBuilder, endpoint: &'static str) -> Result<Response> {
        let response = self.send(request, endpoint).await?;
        if response.status().is_success() {
            return Ok(response);
        }
        Err(Self::error_from(response, endpoint).await)
    }

    async fn error_from(response: Response, endpoint: &'static str) -> BackendError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = message_from_body(&body);
        tracing::warn!(endpoint, status, message = ?message, "backend rejected request");
        metrics::counter!("backend_errors_total", "endpoint" => endpoint).increment(1);
        BackendError::from_status(status, message)
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Reads a cart-like body, mapping a message-less 404 to `Empty`.
    async fn cart_lookup<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &'static str,
    ) -> Result<CartLookup<T>> {
        let response = self.send(request, endpoint).await?;
        let status = response.status();
        if status.is_success() {
            return Ok(CartLookup::Found(Self::json(response).await?));
        }

        let code = status.as_u16();
        let body = response.text().await.unwrap_or_default();
        let message = message_from_body(&body);
        if code == 404 && message.is_none() {
            tracing::debug!(endpoint, "no cart for user");
            return Ok(CartLookup::Empty);
        }
        tracing::warn!(endpoint, status = code, message = ?message, "cart request failed");
        Err(BackendError::from_status(code, message))
    }

    async fn page<T: DeserializeOwned>(response: Response) -> Result<Page<T>> {
        if response.status().as_u16() == 204 {
            return Ok(Page::empty());
        }
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(Page::empty());
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl CartApi for HttpBackend {
    async fn get_cart(&self, token: &AuthToken) -> Result<CartLookup<Cart>> {
        let request = self.authed(self.http.get(self.url("/cart/user")), token);
        self.cart_lookup(request, "cart").await
    }

    async fn add_to_cart(&self, token: &AuthToken, course_id: CourseId) -> Result<()> {
        let request = self
            .authed(self.http.post(self.url("/cart/addtocart")), token)
            .query(&[("courseId", course_id.get())]);
        self.send_ok(request, "cart_add").await?;
        Ok(())
    }

    async fn remove_cart_item(&self, token: &AuthToken, item_id: CartItemId) -> Result<()> {
        let url = self.url(&format!("/cart/removeitem/{item_id}"));
        let request = self.authed(self.http.delete(url), token);
        self.send_ok(request, "cart_remove").await?;
        Ok(())
    }

    async fn checkout_summary(
        &self,
        token: &AuthToken,
        coupon_code: Option<&str>,
    ) -> Result<CartLookup<CheckoutSummary>> {
        let mut request = self.authed(self.http.post(self.url("/cart/user/checkout")), token);
        if let Some(code) = coupon_code {
            request = request.query(&[("couponCode", code)]);
        }
        self.cart_lookup(request, "checkout_summary").await
    }

    async fn apply_coupon(&self, token: &AuthToken, coupon_code: &str) -> Result<()> {
        let request = self
            .authed(self.http.post(self.url("/cart/user/checkout")), token)
            .json(&serde_json::json!({ "couponCode": coupon_code }));
        self.send_ok(request, "apply_coupon").await?;
        Ok(())
    }
}

#[async_trait]
impl PaymentApi for HttpBackend {
    async fn create_order(
        &self,
        token: &AuthToken,
        coupon_code: Option<&str>,
    ) -> Result<PaymentOrder> {
        let request = self
            .authed(self.http.post(self.url("/api/payments/createorder")), token)
            .json(&serde_json::json!({ "couponCode": coupon_code }));
        let response = self.send_ok(request, "create_order").await?;
        let order: OrderResponse = Self::json(response).await?;
        let id = order
            .id
            .filter(|id| !id.is_empty())
            .ok_or(BackendError::MissingField("order id"))?;
        Ok(PaymentOrder {
            id,
            amount: order.amount,
            currency: order.currency,
        })
    }

    async fn verify_payment(
        &self,
        token: &AuthToken,
        response: &GatewayResponse,
    ) -> Result<String> {
        let request = self
            .authed(self.http.post(self.url("/api/payments/verify")), token)
            .json(response);
        let response = self.send_ok(request, "verify_payment").await?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl CatalogApi for HttpBackend {
    async fn courses(&self, query: &CatalogQuery) -> Result<Page<Course>> {
        let request = self
            .http
            .get(self.url("/courses/getcourses"))
            .query(&query.query_pairs());
        let response = self.send_ok(request, "courses").await?;
        Self::page(response).await
    }

    async fn admin_courses(&self, token: &AuthToken, query: &CatalogQuery) -> Result<Page<Course>> {
        let request = self
            .authed(self.http.get(self.url("/courses/admin/getcourses")), token)
            .query(&query.query_pairs());
        let response = self.send_ok(request, "admin_courses").await?;
        Self::page(response).await
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        let request = self.http.get(self.url("/courses/getcategories"));
        let response = self.send_ok(request, "categories").await?;
        Self::json(response).await
    }

    async fn add_category(&self, token: &AuthToken, name: &str) -> Result<Category> {
        let request = self
            .authed(self.http.post(self.url("/courses/addcategory")), token)
            .json(&serde_json::json!({ "name": name }));
        let response = self.send_ok(request, "add_category").await?;
        Self::json(response).await
    }

    async fn add_course(&self, token: &AuthToken, draft: &CourseDraft) -> Result<String> {
        let request = self
            .authed(self.http.post(self.url("/courses/addcourse")), token)
            .multipart(course_form(draft)?);
        let response = self.send_ok(request, "add_course").await?;
        Ok(response.text().await?)
    }

    async fn edit_course(
        &self,
        token: &AuthToken,
        course_id: CourseId,
        draft: &CourseDraft,
    ) -> Result<String> {
        let url = self.url(&format!("/courses/editcourse/{course_id}"));
        let request = self
            .authed(self.http.put(url), token)
            .multipart(course_form(draft)?);
        let response = self.send_ok(request, "edit_course").await?;
        Ok(response.text().await?)
    }

    async fn delete_course(&self, token: &AuthToken, course_id: CourseId) -> Result<()> {
        let url = self.url(&format!("/courses/deletecourse/{course_id}"));
        let request = self.authed(self.http.delete(url), token);
        self.send_ok(request, "delete_course").await?;
        Ok(())
    }
}

#[async_trait]
impl ContentApi for HttpBackend {
    async fn course_detail(&self, course_id: CourseId) -> Result<Course> {
        let url = self.url(&format!("/courses/course/{course_id}"));
        let response = self.send_ok(self.http.get(url), "course_detail").await?;
        Self::json(response).await
    }

    async fn add_section(
        &self,
        token: &AuthToken,
        course_id: CourseId,
        draft: &SectionDraft,
    ) -> Result<()> {
        let url = self.url(&format!("/courses/addsection/{course_id}"));
        let request = self.authed(self.http.post(url), token).json(draft);
        self.send_ok(request, "add_section").await?;
        Ok(())
    }

    async fn add_topic(
        &self,
        token: &AuthToken,
        course_id: CourseId,
        section_id: SectionId,
        upload: &TopicUpload,
    ) -> Result<String> {
        let url = self.url(&format!(
            "/courses/addtopic/course/{course_id}/section/{section_id}"
        ));
        let form = Form::new()
            .text("title", upload.title.clone())
            .text("description", upload.description.clone())
            .text("topicOrder", upload.topic_order.to_string())
            .text("durationMinutes", upload.duration_minutes.to_string())
            .part("video", file_part(&upload.video)?);
        tracing::info!(
            %course_id,
            %section_id,
            bytes = upload.video.len(),
            "uploading topic video"
        );
        let request = self.authed(self.http.post(url), token).multipart(form);
        let response = self.send_ok(request, "add_topic").await?;
        Ok(response.text().await?)
    }

    async fn delete_section(
        &self,
        token: &AuthToken,
        course_id: CourseId,
        section_id: SectionId,
    ) -> Result<()> {
        let url = self.url(&format!("/courses/deletesection/{course_id}/{section_id}"));
        let request = self.authed(self.http.delete(url), token);
        self.send_ok(request, "delete_section").await?;
        Ok(())
    }

    async fn delete_topic(
        &self,
        token: &AuthToken,
        course_id: CourseId,
        section_id: SectionId,
        topic_id: TopicId,
    ) -> Result<()> {
        let url = self.url(&format!(
            "/courses/deletetopic/course/{course_id}/section/{section_id}/topic/{topic_id}"
        ));
        let request = self.authed(self.http.delete(url), token);
        self.send_ok(request, "delete_topic").await?;
        Ok(())
    }

    async fn secure_video_url(&self, token: &AuthToken, topic_id: TopicId) -> Result<String> {
        let url = self.url(&format!("/courses/secure/video/{topic_id}"));
        let request = self.authed(self.http.get(url), token);
        let response = self.send_ok(request, "secure_video").await?;
        let url = response.text().await?;
        let url = url.trim();
        if url.is_empty() {
            return Err(BackendError::MissingField("video url"));
        }
        Ok(url.to_string())
    }
}

#[async_trait]
impl AuthApi for HttpBackend {
    async fn signup(&self, request: &SignupRequest) -> Result<()> {
        let request = self.http.post(self.url("/auth/signup")).json(request);
        self.send_ok(request, "signup").await?;
        Ok(())
    }

    async fn signin(&self, email: &str, password: &str) -> Result<AuthToken> {
        let request = self
            .http
            .post(self.url("/auth/signin"))
            .json(&serde_json::json!({ "email": email, "password": password }));
        let response = self.send_ok(request, "signin").await?;
        let body: SigninResponse = Self::json(response).await?;
        body.jwt
            .filter(|jwt| !jwt.is_empty())
            .map(AuthToken::new)
            .ok_or(BackendError::MissingField("jwt"))
    }

    async fn profile(&self, token: &AuthToken) -> Result<User> {
        let request = self.authed(self.http.get(self.url("/api/user/profile")), token);
        let response = self.send_ok(request, "profile").await?;
        Self::json(response).await
    }

    async fn enrollments(&self, token: &AuthToken) -> Result<Enrollments> {
        let request = self.authed(self.http.get(self.url("/api/user/enrollments")), token);
        let response = self.send_ok(request, "enrollments").await?;
        Self::json(response).await
    }

    async fn contact(&self, request: &ContactRequest) -> Result<()> {
        let request = self.http.post(self.url("/public/contact")).json(request);
        self.send_ok(request, "contact").await?;
        Ok(())
    }
}

#[async_trait]
impl AdminApi for HttpBackend {
    async fn add_role(&self, token: &AuthToken, draft: &RoleDraft) -> Result<Role> {
        let request = self
            .authed(self.http.post(self.url("/auth/role/add")), token)
            .json(draft);
        let response = self.send_ok(request, "add_role").await?;
        Self::json(response).await
    }

    async fn roles(&self, token: &AuthToken) -> Result<Vec<Role>> {
        let request = self.authed(self.http.get(self.url("/auth/roles/getallroles")), token);
        let response = self.send_ok(request, "roles").await?;
        Self::json(response).await
    }

    async fn users(&self, token: &AuthToken, page: u32, size: u32) -> Result<Page<UserSummary>> {
        let request = self
            .authed(self.http.get(self.url("/auth/users/getallusers")), token)
            .query(&[("page", page), ("size", size)]);
        let response = self.send_ok(request, "users").await?;
        Self::page(response).await
    }

    async fn assign_role(
        &self,
        token: &AuthToken,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<String> {
        let request = self
            .authed(self.http.post(self.url("/auth/users/assignrole")), token)
            .json(&serde_json::json!({ "userId": user_id, "roleId": role_id }));
        let response = self.send_ok(request, "assign_role").await?;
        Ok(response.text().await?)
    }
}
