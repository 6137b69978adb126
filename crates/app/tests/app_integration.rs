//! End-to-end tests of the application context over the in-memory backend.

use app::{AppContext, AppError, Config, MemoryTokenStore, TokenStore};
use backend::{AuthToken, ContactRequest, InMemoryBackend, Operation, SignupRequest};
use checkout::{CheckoutError, PaymentMethod, PaymentOutcome, ScriptedGateway};
use common::CourseId;
use domain::{Amount, CourseDraft, ImageFile, RoleDraft};

type TestContext = AppContext<InMemoryBackend, MemoryTokenStore>;

struct TestHarness {
    ctx: TestContext,
    backend: InMemoryBackend,
    store: MemoryTokenStore,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_store(InMemoryBackend::new(), MemoryTokenStore::new())
    }

    fn with_store(backend: InMemoryBackend, store: MemoryTokenStore) -> Self {
        let ctx = AppContext::new(Config::default(), backend.clone(), store.clone());
        Self {
            ctx,
            backend,
            store,
        }
    }

    /// A context whose stored token belongs to a freshly seeded admin.
    async fn admin() -> Self {
        let backend = InMemoryBackend::new();
        let token = backend
            .seed_admin("Meera", "Nair", "meera@example.com")
            .await;
        let h = Self::with_store(backend, MemoryTokenStore::with_token(token));
        assert!(h.ctx.session().restore().await.unwrap());
        h
    }
}

fn signup() -> SignupRequest {
    SignupRequest {
        first_name: "Asha".into(),
        last_name: "Rao".into(),
        email: "asha@example.com".into(),
        password: "correct horse".into(),
    }
}

#[tokio::test]
async fn test_signup_login_buy_course() {
    let h = TestHarness::new();
    let course = h
        .backend
        .seed_course("Rust in Production", Amount::from_parts(1000, 0))
        .await;

    h.ctx.session().register(&signup()).await.unwrap();
    assert!(!h.ctx.session().current().is_authenticated());

    let session = h
        .ctx
        .session()
        .login("asha@example.com", "correct horse")
        .await
        .unwrap();
    assert!(session.is_authenticated());
    assert!(!session.can_view_admin_consoles());
    assert!(h.store.load().await.unwrap().is_some());

    let mut cart = h.ctx.cart();
    cart.add(course, "Rust in Production").await.unwrap();
    cart.load().await.unwrap();
    assert!(!cart.is_empty());
    cart.ensure_can_checkout().unwrap();
    assert!(h.ctx.course_status(course).await.in_cart);

    let gateway = ScriptedGateway::new();
    let mut checkout = h.ctx.checkout(gateway.clone());
    checkout.load().await.unwrap();
    checkout.select_payment_method(Some(PaymentMethod::Gateway));
    let outcome = checkout.initiate_payment().await.unwrap();
    assert!(matches!(outcome, PaymentOutcome::Enrolled(_)));
    assert_eq!(gateway.open_count().await, 1);

    let status = h.ctx.course_status(course).await;
    assert!(status.enrolled);
    assert!(!status.in_cart);
}

#[tokio::test]
async fn test_wrong_password_keeps_signed_out() {
    let h = TestHarness::new();
    h.ctx.session().register(&signup()).await.unwrap();

    let err = h
        .ctx
        .session()
        .login("asha@example.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::LoginFailed));
    assert_eq!(h.store.load().await.unwrap(), None);
    assert!(h.ctx.session().token().is_none());
}

#[tokio::test]
async fn test_signed_out_views_make_no_requests() {
    let h = TestHarness::new();

    let err = h.ctx.admin().err().unwrap();
    assert_eq!(err.to_string(), "Authentication required. Please log in.");

    let mut cart = h.ctx.cart();
    let err = cart.load().await.unwrap_err();
    assert_eq!(err.to_string(), "Please log in to view your cart.");
    assert_eq!(h.backend.call_count(Operation::GetCart).await, 0);

    let status = h.ctx.course_status(CourseId::new(1)).await;
    assert!(!status.enrolled);
    assert!(!status.in_cart);
}

#[tokio::test]
async fn test_admin_publishes_and_authors_course() {
    let h = TestHarness::admin().await;
    assert!(h.ctx.session().current().can_view_super_admin_consoles());

    let mut admin = h.ctx.admin().unwrap();
    let category = admin.add_category("Systems").await.unwrap();
    admin
        .add_course(&CourseDraft {
            title: "Embedded Rust".into(),
            description: "No std, no problem".into(),
            instructor_name: "Meera Nair".into(),
            price: Amount::from_parts(2499, 0),
            discounted_price: None,
            duration: 12,
            category_id: Some(category.id),
            image: Some(ImageFile::new("cover.png", "image/png", vec![0x89, 0x50])),
        })
        .await
        .unwrap();

    let mut catalog = h.ctx.catalog();
    catalog.load().await.unwrap();
    let course_id = catalog
        .courses()
        .iter()
        .find(|c| c.title == "Embedded Rust")
        .map(|c| c.id)
        .unwrap();

    let mut workflow = h.ctx.authoring(course_id);
    workflow.load().await.unwrap();
    workflow.section_form_mut().title = "Getting started".into();
    workflow.create_section().await.unwrap();
    let sections = workflow.view().sections();
    assert_eq!(sections.len(), 1);
    assert_eq!(sections[0].title, "Getting started");
    assert_eq!(workflow.section_form().section_order, 2);
}

#[tokio::test]
async fn test_admin_grants_role_to_learner() {
    let h = TestHarness::admin().await;
    h.backend.seed_user("Ravi", "Iyer", "ravi@example.com").await;

    let mut admin = h.ctx.admin().unwrap();
    let role = admin
        .add_role(&RoleDraft {
            name: "INSTRUCTOR".into(),
            description: "Teaches courses".into(),
            level: 300,
        })
        .await
        .unwrap();
    let users = admin.users(1).await.unwrap().users.content;
    let ravi = users.iter().find(|u| u.email == "ravi@example.com").unwrap();

    let message = admin
        .assign_role(
            domain::RoleAssignment {
                user_id: Some(ravi.id),
                role_id: Some(role.id),
            },
            std::slice::from_ref(&role),
            &users,
        )
        .await
        .unwrap();
    assert_eq!(
        message,
        "Success: Assigned role 'INSTRUCTOR' to user 'Ravi Iyer'!"
    );
}

#[tokio::test]
async fn test_learner_cannot_open_admin_console() {
    let h = TestHarness::new();
    h.ctx.session().register(&signup()).await.unwrap();
    h.ctx
        .session()
        .login("asha@example.com", "correct horse")
        .await
        .unwrap();

    let err = h.ctx.admin().err().unwrap();
    assert!(matches!(err, AppError::NotAdmin));
}

#[tokio::test]
async fn test_logout_forgets_token() {
    let h = TestHarness::admin().await;
    h.ctx.session().logout().await.unwrap();

    assert_eq!(h.store.load().await.unwrap(), None);
    assert!(!h.ctx.session().current().is_authenticated());
    assert!(h.ctx.admin().is_err());
}

#[tokio::test]
async fn test_open_checkout_sees_logout() {
    let h = TestHarness::new();
    let course = h
        .backend
        .seed_course("Rust in Production", Amount::from_parts(1000, 0))
        .await;
    h.ctx.session().register(&signup()).await.unwrap();
    h.ctx
        .session()
        .login("asha@example.com", "correct horse")
        .await
        .unwrap();
    let mut cart = h.ctx.cart();
    cart.add(course, "Rust in Production").await.unwrap();

    let gateway = ScriptedGateway::new();
    let mut checkout = h.ctx.checkout(gateway.clone());
    checkout.load().await.unwrap();
    assert!(checkout.can_pay());

    h.ctx.session().logout().await.unwrap();

    assert!(!checkout.is_authenticated());
    assert!(!checkout.can_pay());
    let err = checkout.initiate_payment().await.unwrap_err();
    assert!(matches!(err, CheckoutError::PaymentBlocked(_)));
    assert_eq!(h.backend.call_count(Operation::CreateOrder).await, 0);
    assert_eq!(gateway.open_count().await, 0);

    let err = cart.load().await.unwrap_err();
    assert_eq!(err.to_string(), "Please log in to view your cart.");
}

#[tokio::test]
async fn test_open_views_see_login() {
    let h = TestHarness::new();
    let course = h
        .backend
        .seed_course("Rust in Production", Amount::from_parts(1000, 0))
        .await;
    let mut cart = h.ctx.cart();
    assert!(cart.ensure_can_checkout().is_err());

    h.ctx.session().register(&signup()).await.unwrap();
    h.ctx
        .session()
        .login("asha@example.com", "correct horse")
        .await
        .unwrap();

    cart.add(course, "Rust in Production").await.unwrap();
    cart.ensure_can_checkout().unwrap();
}

#[tokio::test]
async fn test_contact_ticket_reaches_support() {
    let h = TestHarness::new();
    let request = ContactRequest {
        name: "Asha Rao".into(),
        email: "asha@example.com".into(),
        message: "The checkout page keeps spinning".into(),
    };

    h.ctx.contact(&request).await.unwrap();
    assert_eq!(h.backend.tickets().await, vec![request]);
}

#[tokio::test]
async fn test_blank_contact_ticket_is_not_sent() {
    let h = TestHarness::new();
    let request = ContactRequest {
        name: "Asha Rao".into(),
        email: "asha@example.com".into(),
        message: "   ".into(),
    };

    let err = h.ctx.contact(&request).await.unwrap_err();
    assert_eq!(err.to_string(), "Message is required");
    assert_eq!(h.backend.call_count(Operation::Contact).await, 0);

    h.backend.set_failure(Operation::Contact, 500, None).await;
    let request = ContactRequest {
        message: "Hello".into(),
        ..request
    };
    let err = h.ctx.contact(&request).await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to submit ticket: 500");
}

#[tokio::test]
async fn test_stale_token_is_discarded_on_restore() {
    let store = MemoryTokenStore::with_token(AuthToken::new("expired"));
    let h = TestHarness::with_store(InMemoryBackend::new(), store);

    assert!(!h.ctx.session().restore().await.unwrap());
    assert_eq!(h.store.load().await.unwrap(), None);
}
