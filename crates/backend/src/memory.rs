//! In-memory backend for tests and offline runs.
//!
//! Mirrors the REST backend's observable behavior closely enough for the
//! coordinators to be exercised end to end: carts, coupons, orders,
//! enrollments, the course content tree and role administration. Every call
//! is recorded, and any operation can be made to fail with a given status.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use common::{CartItemId, CategoryId, CourseId, RoleId, SectionId, TopicId, UserId};
use domain::forms::TopicUpload;
use domain::{
    Amount, Cart, CartItem, CartLookup, CartUser, CatalogQuery, Category, CheckoutSummary, Course,
    CourseDraft, DurationFilter, Enrollment, Enrollments, Page, Role, RoleDraft, Section,
    SectionDraft, Topic, User, UserRole, UserSummary,
};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::api::{
    AdminApi, AuthApi, CartApi, CatalogApi, ContactRequest, ContentApi, PaymentApi, SignupRequest,
};
use crate::auth::AuthToken;
use crate::error::{BackendError, Result};
use crate::payment::{GatewayResponse, PaymentOrder};

const ADMIN_ROLE: &str = "ADMIN";

/// One backend endpoint, for call counting and failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetCart,
    AddToCart,
    RemoveCartItem,
    CheckoutSummary,
    ApplyCoupon,
    CreateOrder,
    VerifyPayment,
    Courses,
    AdminCourses,
    Categories,
    AddCategory,
    AddCourse,
    EditCourse,
    DeleteCourse,
    CourseDetail,
    AddSection,
    AddTopic,
    DeleteSection,
    DeleteTopic,
    SecureVideo,
    Signup,
    Signin,
    Profile,
    Enrollments,
    Contact,
    AddRole,
    Roles,
    Users,
    AssignRole,
}

#[derive(Debug, Clone)]
struct Failure {
    status: u16,
    message: Option<String>,
}

#[derive(Debug)]
struct Account {
    user: User,
    password: String,
}

#[derive(Debug)]
struct PendingOrder {
    user_id: UserId,
    settled: bool,
}

#[derive(Debug, Default)]
struct State {
    next_id: i64,
    accounts: BTreeMap<UserId, Account>,
    tokens: HashMap<String, UserId>,
    roles: Vec<Role>,
    categories: Vec<Category>,
    courses: BTreeMap<CourseId, Course>,
    coupons: HashMap<String, Amount>,
    carts: HashMap<UserId, Vec<CartItem>>,
    enrollments: HashMap<UserId, Vec<CourseId>>,
    orders: HashMap<String, PendingOrder>,
    failures: HashMap<Operation, Failure>,
    calls: Vec<Operation>,
    omit_order_id: bool,
    tickets: Vec<ContactRequest>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    /// Records the call and returns the injected failure, if any.
    fn begin(&mut self, op: Operation) -> Result<()> {
        self.calls.push(op);
        match self.failures.get(&op) {
            Some(failure) => Err(BackendError::from_status(
                failure.status,
                failure.message.clone(),
            )),
            None => Ok(()),
        }
    }

    fn user_id(&self, token: &AuthToken) -> Result<UserId> {
        self.tokens
            .get(token.as_str())
            .copied()
            .ok_or(BackendError::Unauthorized)
    }

    fn account(&self, token: &AuthToken) -> Result<&Account> {
        let user_id = self.user_id(token)?;
        self.accounts
            .get(&user_id)
            .ok_or(BackendError::Unauthorized)
    }

    fn is_admin(&self, user_id: UserId) -> bool {
        self.accounts
            .get(&user_id)
            .is_some_and(|account| account.user.has_role(ADMIN_ROLE))
    }

    fn require_admin(&self, token: &AuthToken) -> Result<UserId> {
        let user_id = self.user_id(token)?;
        if !self.is_admin(user_id) {
            return Err(BackendError::Forbidden {
                message: Some("Admin role required".to_string()),
            });
        }
        Ok(user_id)
    }

    fn course_mut(&mut self, course_id: CourseId) -> Result<&mut Course> {
        self.courses.get_mut(&course_id).ok_or(BackendError::NotFound {
            message: Some("Course not found".to_string()),
        })
    }

    fn cart_user(&self, user_id: UserId) -> Option<CartUser> {
        self.accounts.get(&user_id).map(|account| CartUser {
            id: Some(user_id),
            name: Some(account.user.full_name()),
            email: Some(account.user.email.clone()),
        })
    }

    fn coupon(&self, code: &str) -> Result<Amount> {
        self.coupons.get(code).copied().ok_or(BackendError::Status {
            status: 400,
            message: Some("Invalid or expired coupon.".to_string()),
        })
    }

    /// Sum of effective prices, then the coupon discount clamped at zero.
    fn summary(&self, user_id: UserId, coupon_code: Option<&str>) -> Result<CheckoutSummary> {
        let items = self.carts.get(&user_id).map(Vec::as_slice).unwrap_or(&[]);
        let cart_total: Decimal = items
            .iter()
            .map(|item| item.course.effective_price().value())
            .sum();
        let coupon_amount = match coupon_code {
            Some(code) => self.coupon(code)?.value().min(cart_total),
            None => Decimal::ZERO,
        };

        Ok(CheckoutSummary {
            user: self.cart_user(user_id),
            cart_total: Amount::new(cart_total),
            checkout_price: Amount::new((cart_total - coupon_amount).max(Decimal::ZERO)),
            tax_gst: Amount::zero(),
            coupon_amount: Amount::new(coupon_amount),
            coupon_code_applied: coupon_code.map(str::to_string),
        })
    }

    fn topic_location(&self, topic_id: TopicId) -> Option<(CourseId, &Topic)> {
        self.courses.values().find_map(|course| {
            course
                .topic(topic_id)
                .map(|(_, topic)| (course.id, topic))
        })
    }
}

fn paginate<T: Clone>(items: &[T], index: u32, size: u32) -> Page<T> {
    let size = size.max(1);
    let total = items.len() as u64;
    let total_pages = total.div_ceil(u64::from(size)) as u32;
    let content = items
        .iter()
        .skip((index as usize).saturating_mul(size as usize))
        .take(size as usize)
        .cloned()
        .collect();
    Page {
        content,
        total_pages,
        total_elements: total,
        number: index,
        size,
    }
}

fn matches_duration(filter: DurationFilter, hours: u32) -> bool {
    match filter {
        DurationFilter::UpToFive => hours <= 5,
        DurationFilter::FiveToTen => hours > 5 && hours <= 10,
        DurationFilter::TenPlus => hours > 10,
    }
}

fn filter_courses(courses: &BTreeMap<CourseId, Course>, query: &CatalogQuery) -> Page<Course> {
    let keyword = query.keyword().map(str::to_lowercase);
    let matching: Vec<Course> = courses
        .values()
        .filter(|c| {
            query
                .category_id()
                .is_none_or(|id| c.category.as_ref().is_some_and(|cat| cat.id == id))
        })
        .filter(|c| {
            keyword
                .as_deref()
                .is_none_or(|k| c.title.to_lowercase().contains(k))
        })
        .filter(|c| query.duration().is_none_or(|d| matches_duration(d, c.duration)))
        .cloned()
        .collect();

    if matching.is_empty() {
        return Page::empty();
    }
    paginate(&matching, query.page().saturating_sub(1), query.size())
}

fn not_found(what: &str) -> BackendError {
    BackendError::NotFound {
        message: Some(format!("{what} not found")),
    }
}

fn bad_request(message: &str) -> BackendError {
    BackendError::Status {
        status: 400,
        message: Some(message.to_string()),
    }
}

/// In-memory stand-in for the REST backend.
#[derive(Debug, Clone, Default)]
pub struct InMemoryBackend {
    state: Arc<Mutex<State>>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent call to `op` fail with `status`.
    pub async fn set_failure(&self, op: Operation, status: u16, message: Option<&str>) {
        self.state.lock().await.failures.insert(
            op,
            Failure {
                status,
                message: message.map(str::to_string),
            },
        );
    }

    /// Removes an injected failure.
    pub async fn clear_failure(&self, op: Operation) {
        self.state.lock().await.failures.remove(&op);
    }

    /// Makes order creation succeed without an order id.
    pub async fn set_omit_order_id(&self, omit: bool) {
        self.state.lock().await.omit_order_id = omit;
    }

    /// Number of calls made to `op`, failed ones included.
    pub async fn call_count(&self, op: Operation) -> usize {
        self.state
            .lock()
            .await
            .calls
            .iter()
            .filter(|call| **call == op)
            .count()
    }

    /// Every call made so far, in order.
    pub async fn calls(&self) -> Vec<Operation> {
        self.state.lock().await.calls.clone()
    }

    /// Registers a user and returns a signed-in token.
    pub async fn seed_user(&self, first_name: &str, last_name: &str, email: &str) -> AuthToken {
        let mut state = self.state.lock().await;
        let id = UserId::new(state.next_id());
        let user = User {
            id,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            profile_pic: None,
            mobile: None,
            roles: Vec::new(),
        };
        state.accounts.insert(
            id,
            Account {
                user,
                password: String::new(),
            },
        );
        let token = format!("token-{}", state.next_id());
        state.tokens.insert(token.clone(), id);
        AuthToken::new(token)
    }

    /// Registers a user holding the admin role and returns a signed-in token.
    pub async fn seed_admin(&self, first_name: &str, last_name: &str, email: &str) -> AuthToken {
        let token = self.seed_user(first_name, last_name, email).await;
        let mut state = self.state.lock().await;
        let existing = state.roles.iter().find(|r| r.name == ADMIN_ROLE).cloned();
        let role = match existing {
            Some(role) => role,
            None => {
                let role = Role {
                    id: RoleId::new(state.next_id()),
                    name: ADMIN_ROLE.to_string(),
                    description: Some("Platform administrator".to_string()),
                    level: 100,
                };
                state.roles.push(role.clone());
                role
            }
        };
        if let Some(user_id) = state.tokens.get(token.as_str()).copied()
            && let Some(account) = state.accounts.get_mut(&user_id)
        {
            account.user.roles.push(UserRole { role });
        }
        token
    }

    /// Adds a category.
    pub async fn seed_category(&self, name: &str) -> Category {
        let mut state = self.state.lock().await;
        let category = Category {
            id: CategoryId::new(state.next_id()),
            name: name.to_string(),
        };
        state.categories.push(category.clone());
        category
    }

    /// Adds a course with no content and a four hour duration.
    pub async fn seed_course(&self, title: &str, price: Amount) -> CourseId {
        let mut state = self.state.lock().await;
        let id = CourseId::new(state.next_id());
        state.courses.insert(
            id,
            Course {
                id,
                title: title.to_string(),
                description: format!("About {title}"),
                instructor_name: "Staff".to_string(),
                price,
                discounted_price: None,
                duration: 4,
                image_url: None,
                category: None,
                sections: Vec::new(),
            },
        );
        id
    }

    /// Edits a stored course in place. Returns false if it does not exist.
    pub async fn update_course<F>(&self, course_id: CourseId, update: F) -> bool
    where
        F: FnOnce(&mut Course),
    {
        match self.state.lock().await.courses.get_mut(&course_id) {
            Some(course) => {
                update(course);
                true
            }
            None => false,
        }
    }

    /// Returns a stored course.
    pub async fn course(&self, course_id: CourseId) -> Option<Course> {
        self.state.lock().await.courses.get(&course_id).cloned()
    }

    /// Adds a coupon worth a flat `amount`.
    pub async fn seed_coupon(&self, code: &str, amount: Amount) {
        self.state
            .lock()
            .await
            .coupons
            .insert(code.to_string(), amount);
    }

    /// Enrolls the token's user in a course directly.
    pub async fn enroll(&self, token: &AuthToken, course_id: CourseId) -> Result<()> {
        let mut state = self.state.lock().await;
        let user_id = state.user_id(token)?;
        state.enrollments.entry(user_id).or_default().push(course_id);
        Ok(())
    }

    /// Returns true if the token's user is enrolled in the course.
    pub async fn is_enrolled(&self, token: &AuthToken, course_id: CourseId) -> bool {
        let state = self.state.lock().await;
        state.user_id(token).is_ok_and(|user_id| {
            state
                .enrollments
                .get(&user_id)
                .is_some_and(|courses| courses.contains(&course_id))
        })
    }

    /// Number of items in the token's cart.
    pub async fn cart_len(&self, token: &AuthToken) -> usize {
        let state = self.state.lock().await;
        state
            .user_id(token)
            .ok()
            .and_then(|user_id| state.carts.get(&user_id))
            .map_or(0, Vec::len)
    }

    /// Number of orders created so far.
    pub async fn order_count(&self) -> usize {
        self.state.lock().await.orders.len()
    }

    /// Support tickets received through the contact form.
    pub async fn tickets(&self) -> Vec<ContactRequest> {
        self.state.lock().await.tickets.clone()
    }
}

#[async_trait]
impl CartApi for InMemoryBackend {
    async fn get_cart(&self, token: &AuthToken) -> Result<CartLookup<Cart>> {
        let mut state = self.state.lock().await;
        state.begin(Operation::GetCart)?;
        let user_id = state.user_id(token)?;
        let Some(items) = state.carts.get(&user_id) else {
            return Ok(CartLookup::Empty);
        };

        let subtotal: Decimal = items.iter().map(|i| i.course.price.value()).sum();
        let total: Decimal = items
            .iter()
            .map(|i| i.course.effective_price().value())
            .sum();
        Ok(CartLookup::Found(Cart {
            id: user_id.get(),
            user: state.cart_user(user_id),
            cart_items: items.clone(),
            subtotal: Amount::new(subtotal),
            discount_amount: Amount::new(subtotal - total),
            total_price: Amount::new(total),
        }))
    }

    async fn add_to_cart(&self, token: &AuthToken, course_id: CourseId) -> Result<()> {
        let mut state = self.state.lock().await;
        state.begin(Operation::AddToCart)?;
        let user_id = state.user_id(token)?;
        let course = state
            .courses
            .get(&course_id)
            .cloned()
            .ok_or_else(|| not_found("Course"))?;
        if state
            .enrollments
            .get(&user_id)
            .is_some_and(|courses| courses.contains(&course_id))
        {
            return Err(bad_request("Already enrolled in this course"));
        }
        if state
            .carts
            .get(&user_id)
            .is_some_and(|items| items.iter().any(|i| i.course.id == course_id))
        {
            return Err(bad_request("Course already in cart"));
        }

        let id = CartItemId::new(state.next_id());
        state.carts.entry(user_id).or_default().push(CartItem {
            id,
            course,
            quantity: 1,
        });
        Ok(())
    }

    async fn remove_cart_item(&self, token: &AuthToken, item_id: CartItemId) -> Result<()> {
        let mut state = self.state.lock().await;
        state.begin(Operation::RemoveCartItem)?;
        let user_id = state.user_id(token)?;
        let items = state
            .carts
            .get_mut(&user_id)
            .ok_or_else(|| not_found("Cart"))?;
        let before = items.len();
        items.retain(|item| item.id != item_id);
        if items.len() == before {
            return Err(not_found("Cart item"));
        }
        Ok(())
    }

    async fn checkout_summary(
        &self,
        token: &AuthToken,
        coupon_code: Option<&str>,
    ) -> Result<CartLookup<CheckoutSummary>> {
        let mut state = self.state.lock().await;
        state.begin(Operation::CheckoutSummary)?;
        let user_id = state.user_id(token)?;
        if !state.carts.contains_key(&user_id) {
            return Ok(CartLookup::Empty);
        }
        Ok(CartLookup::Found(state.summary(user_id, coupon_code)?))
    }

    async fn apply_coupon(&self, token: &AuthToken, coupon_code: &str) -> Result<()> {
        let mut state = self.state.lock().await;
        state.begin(Operation::ApplyCoupon)?;
        state.user_id(token)?;
        state.coupon(coupon_code)?;
        Ok(())
    }
}

#[async_trait]
impl PaymentApi for InMemoryBackend {
    async fn create_order(
        &self,
        token: &AuthToken,
        coupon_code: Option<&str>,
    ) -> Result<PaymentOrder> {
        let mut state = self.state.lock().await;
        state.begin(Operation::CreateOrder)?;
        let user_id = state.user_id(token)?;
        if state.carts.get(&user_id).is_none_or(Vec::is_empty) {
            return Err(bad_request("Cart is empty"));
        }

        let summary = state.summary(user_id, coupon_code)?;
        let amount = summary
            .checkout_price
            .to_minor_units()
            .map_err(|e| bad_request(&e.to_string()))?;
        let sequence = state.next_id();
        let id = format!("order_{sequence:04}");
        state.orders.insert(
            id.clone(),
            PendingOrder {
                user_id,
                settled: false,
            },
        );

        Ok(PaymentOrder {
            id: if state.omit_order_id { String::new() } else { id },
            amount: Some(amount),
            currency: Some("INR".to_string()),
        })
    }

    async fn verify_payment(
        &self,
        token: &AuthToken,
        response: &GatewayResponse,
    ) -> Result<String> {
        let mut state = self.state.lock().await;
        state.begin(Operation::VerifyPayment)?;
        let user_id = state.user_id(token)?;
        if response.payment_id().is_none() {
            return Err(bad_request("Missing payment id"));
        }
        let order_id = response
            .order_id()
            .ok_or_else(|| bad_request("Missing order id"))?;
        let order = state
            .orders
            .get_mut(order_id)
            .filter(|order| order.user_id == user_id && !order.settled)
            .ok_or_else(|| bad_request("Unknown or settled order"))?;
        order.settled = true;

        let purchased: Vec<CourseId> = state
            .carts
            .get_mut(&user_id)
            .map(|items| items.drain(..).map(|item| item.course.id).collect())
            .unwrap_or_default();
        let enrolled = state.enrollments.entry(user_id).or_default();
        for course_id in purchased {
            if !enrolled.contains(&course_id) {
                enrolled.push(course_id);
            }
        }
        Ok("Payment verified and enrollment completed".to_string())
    }
}

#[async_trait]
impl CatalogApi for InMemoryBackend {
    async fn courses(&self, query: &CatalogQuery) -> Result<Page<Course>> {
        let mut state = self.state.lock().await;
        state.begin(Operation::Courses)?;
        Ok(filter_courses(&state.courses, query))
    }

    async fn admin_courses(&self, token: &AuthToken, query: &CatalogQuery) -> Result<Page<Course>> {
        let mut state = self.state.lock().await;
        state.begin(Operation::AdminCourses)?;
        state.require_admin(token)?;
        Ok(filter_courses(&state.courses, query))
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        let mut state = self.state.lock().await;
        state.begin(Operation::Categories)?;
        Ok(state.categories.clone())
    }

    async fn add_category(&self, token: &AuthToken, name: &str) -> Result<Category> {
        let mut state = self.state.lock().await;
        state.begin(Operation::AddCategory)?;
        state.require_admin(token)?;
        if name.trim().is_empty() {
            return Err(bad_request("Category name is required"));
        }
        let category = Category {
            id: CategoryId::new(state.next_id()),
            name: name.trim().to_string(),
        };
        state.categories.push(category.clone());
        Ok(category)
    }

    async fn add_course(&self, token: &AuthToken, draft: &CourseDraft) -> Result<String> {
        let mut state = self.state.lock().await;
        state.begin(Operation::AddCourse)?;
        state.require_admin(token)?;
        let category = draft
            .category_id
            .and_then(|id| state.categories.iter().find(|c| c.id == id).cloned())
            .ok_or_else(|| not_found("Category"))?;

        let id = CourseId::new(state.next_id());
        state.courses.insert(
            id,
            Course {
                id,
                title: draft.title.clone(),
                description: draft.description.clone(),
                instructor_name: draft.instructor_name.clone(),
                price: draft.price,
                discounted_price: draft.discounted_price,
                duration: draft.duration,
                image_url: draft
                    .image
                    .as_ref()
                    .map(|image| format!("/images/{}", image.file_name)),
                category: Some(category),
                sections: Vec::new(),
            },
        );
        Ok("Course added successfully".to_string())
    }

    async fn edit_course(
        &self,
        token: &AuthToken,
        course_id: CourseId,
        draft: &CourseDraft,
    ) -> Result<String> {
        let mut state = self.state.lock().await;
        state.begin(Operation::EditCourse)?;
        state.require_admin(token)?;
        let category = match draft.category_id {
            Some(id) => Some(
                state
                    .categories
                    .iter()
                    .find(|c| c.id == id)
                    .cloned()
                    .ok_or_else(|| not_found("Category"))?,
            ),
            None => None,
        };

        let course = state.course_mut(course_id)?;
        course.title = draft.title.clone();
        course.description = draft.description.clone();
        course.instructor_name = draft.instructor_name.clone();
        course.price = draft.price;
        course.discounted_price = draft.discounted_price;
        course.duration = draft.duration;
        if category.is_some() {
            course.category = category;
        }
        if let Some(image) = &draft.image {
            course.image_url = Some(format!("/images/{}", image.file_name));
        }
        Ok("Course updated successfully".to_string())
    }

    async fn delete_course(&self, token: &AuthToken, course_id: CourseId) -> Result<()> {
        let mut state = self.state.lock().await;
        state.begin(Operation::DeleteCourse)?;
        state.require_admin(token)?;
        state
            .courses
            .remove(&course_id)
            .ok_or_else(|| not_found("Course"))?;
        for items in state.carts.values_mut() {
            items.retain(|item| item.course.id != course_id);
        }
        Ok(())
    }
}

#[async_trait]
impl ContentApi for InMemoryBackend {
    async fn course_detail(&self, course_id: CourseId) -> Result<Course> {
        let mut state = self.state.lock().await;
        state.begin(Operation::CourseDetail)?;
        state
            .courses
            .get(&course_id)
            .cloned()
            .ok_or_else(|| not_found("Course"))
    }

    async fn add_section(
        &self,
        token: &AuthToken,
        course_id: CourseId,
        draft: &SectionDraft,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        state.begin(Operation::AddSection)?;
        state.require_admin(token)?;
        let id = SectionId::new(state.next_id());
        let course = state.course_mut(course_id)?;
        course.sections.push(Section {
            id,
            section_order: draft.section_order,
            title: draft.title.clone(),
            description: Some(draft.description.clone()).filter(|d| !d.is_empty()),
            topics: Vec::new(),
        });
        Ok(())
    }

    async fn add_topic(
        &self,
        token: &AuthToken,
        course_id: CourseId,
        section_id: SectionId,
        upload: &TopicUpload,
    ) -> Result<String> {
        let mut state = self.state.lock().await;
        state.begin(Operation::AddTopic)?;
        state.require_admin(token)?;
        let id = TopicId::new(state.next_id());
        let section = state
            .course_mut(course_id)?
            .sections
            .iter_mut()
            .find(|s| s.id == section_id)
            .ok_or_else(|| not_found("Section"))?;
        section.topics.push(Topic {
            id,
            topic_order: upload.topic_order,
            title: upload.title.clone(),
            description: Some(upload.description.clone()).filter(|d| !d.is_empty()),
            duration_minutes: Some(upload.duration_minutes),
            video_url: Some(format!("videos/{id}/{}", upload.video.file_name)),
            section_id: Some(section_id),
        });
        Ok("Topic added successfully".to_string())
    }

    async fn delete_section(
        &self,
        token: &AuthToken,
        course_id: CourseId,
        section_id: SectionId,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        state.begin(Operation::DeleteSection)?;
        state.require_admin(token)?;
        let course = state.course_mut(course_id)?;
        let before = course.sections.len();
        course.sections.retain(|s| s.id != section_id);
        if course.sections.len() == before {
            return Err(not_found("Section"));
        }
        Ok(())
    }

    async fn delete_topic(
        &self,
        token: &AuthToken,
        course_id: CourseId,
        section_id: SectionId,
        topic_id: TopicId,
    ) -> Result<()> {
        let mut state = self.state.lock().await;
        state.begin(Operation::DeleteTopic)?;
        state.require_admin(token)?;
        let section = state
            .course_mut(course_id)?
            .sections
            .iter_mut()
            .find(|s| s.id == section_id)
            .ok_or_else(|| not_found("Section"))?;
        let before = section.topics.len();
        section.topics.retain(|t| t.id != topic_id);
        if section.topics.len() == before {
            return Err(not_found("Topic"));
        }
        Ok(())
    }

    async fn secure_video_url(&self, token: &AuthToken, topic_id: TopicId) -> Result<String> {
        let mut state = self.state.lock().await;
        state.begin(Operation::SecureVideo)?;
        let user_id = state.user_id(token)?;
        let (course_id, topic) = state
            .topic_location(topic_id)
            .ok_or_else(|| not_found("Topic"))?;
        let enrolled = state
            .enrollments
            .get(&user_id)
            .is_some_and(|courses| courses.contains(&course_id));
        if !enrolled && !state.is_admin(user_id) {
            return Err(BackendError::Forbidden {
                message: Some("Enrollment required".to_string()),
            });
        }
        let path = topic
            .video_url
            .clone()
            .ok_or(BackendError::MissingField("video url"))?;
        Ok(format!("https://cdn.nebula.test/{path}?expires=300"))
    }
}

#[async_trait]
impl AuthApi for InMemoryBackend {
    async fn signup(&self, request: &SignupRequest) -> Result<()> {
        let mut state = self.state.lock().await;
        state.begin(Operation::Signup)?;
        if state
            .accounts
            .values()
            .any(|a| a.user.email.eq_ignore_ascii_case(&request.email))
        {
            return Err(bad_request("Email is already registered"));
        }
        let id = UserId::new(state.next_id());
        state.accounts.insert(
            id,
            Account {
                user: User {
                    id,
                    first_name: request.first_name.clone(),
                    last_name: request.last_name.clone(),
                    email: request.email.clone(),
                    profile_pic: None,
                    mobile: None,
                    roles: Vec::new(),
                },
                password: request.password.clone(),
            },
        );
        Ok(())
    }

    async fn signin(&self, email: &str, password: &str) -> Result<AuthToken> {
        let mut state = self.state.lock().await;
        state.begin(Operation::Signin)?;
        let user_id = state
            .accounts
            .values()
            .find(|a| a.user.email.eq_ignore_ascii_case(email) && a.password == password)
            .map(|a| a.user.id)
            .ok_or(BackendError::Unauthorized)?;
        let token = format!("token-{}", state.next_id());
        state.tokens.insert(token.clone(), user_id);
        Ok(AuthToken::new(token))
    }

    async fn profile(&self, token: &AuthToken) -> Result<User> {
        let mut state = self.state.lock().await;
        state.begin(Operation::Profile)?;
        Ok(state.account(token)?.user.clone())
    }

    async fn enrollments(&self, token: &AuthToken) -> Result<Enrollments> {
        let mut state = self.state.lock().await;
        state.begin(Operation::Enrollments)?;
        let user_id = state.user_id(token)?;
        let enrollments = state
            .enrollments
            .get(&user_id)
            .into_iter()
            .flatten()
            .filter_map(|id| state.courses.get(id))
            .map(|course| Enrollment {
                course: course.clone(),
            })
            .collect();
        Ok(Enrollments { enrollments })
    }

    async fn contact(&self, request: &ContactRequest) -> Result<()> {
        let mut state = self.state.lock().await;
        state.begin(Operation::Contact)?;
        state.tickets.push(request.clone());
        Ok(())
    }
}

#[async_trait]
impl AdminApi for InMemoryBackend {
    async fn add_role(&self, token: &AuthToken, draft: &RoleDraft) -> Result<Role> {
        let mut state = self.state.lock().await;
        state.begin(Operation::AddRole)?;
        state.require_admin(token)?;
        if state
            .roles
            .iter()
            .any(|r| r.name.eq_ignore_ascii_case(&draft.name))
        {
            return Err(bad_request("Role already exists"));
        }
        let role = Role {
            id: RoleId::new(state.next_id()),
            name: draft.name.clone(),
            description: Some(draft.description.clone()).filter(|d| !d.is_empty()),
            level: draft.level,
        };
        state.roles.push(role.clone());
        Ok(role)
    }

    async fn roles(&self, token: &AuthToken) -> Result<Vec<Role>> {
        let mut state = self.state.lock().await;
        state.begin(Operation::Roles)?;
        state.require_admin(token)?;
        Ok(state.roles.clone())
    }

    async fn users(&self, token: &AuthToken, page: u32, size: u32) -> Result<Page<UserSummary>> {
        let mut state = self.state.lock().await;
        state.begin(Operation::Users)?;
        state.require_admin(token)?;
        let users: Vec<UserSummary> = state
            .accounts
            .values()
            .map(|a| UserSummary {
                id: a.user.id,
                display_name: None,
                first_name: a.user.first_name.clone(),
                last_name: a.user.last_name.clone(),
                email: a.user.email.clone(),
            })
            .collect();
        Ok(paginate(&users, page, size))
    }

    async fn assign_role(
        &self,
        token: &AuthToken,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<String> {
        let mut state = self.state.lock().await;
        state.begin(Operation::AssignRole)?;
        state.require_admin(token)?;
        let role = state
            .roles
            .iter()
            .find(|r| r.id == role_id)
            .cloned()
            .ok_or_else(|| not_found("Role"))?;
        let account = state
            .accounts
            .get_mut(&user_id)
            .ok_or_else(|| not_found("User"))?;
        if !account.user.roles.iter().any(|r| r.role.id == role_id) {
            account.user.roles.push(UserRole { role });
        }
        Ok("Role assigned successfully".to_string())
    }
}
