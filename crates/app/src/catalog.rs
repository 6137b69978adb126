//! Course catalog browsing and per-course status.

use backend::{AuthApi, AuthToken, CartApi, CatalogApi};
use common::{CategoryId, CourseId};
use domain::{CartLookup, CatalogQuery, Category, Course, DurationFilter, Page, Pagination};

use crate::error::{AppError, Result, request_message};

/// Page numbers shown at once in the catalog pagination bar.
pub const PAGINATION_WINDOW: u32 = 5;

/// Page size of the admin course listing.
pub const ADMIN_PAGE_SIZE: u32 = 3;

/// A filtered, paginated view of the course catalog.
///
/// Changing a filter returns to the first page and refetches.
pub struct CatalogBrowser<B: CatalogApi> {
    backend: B,
    /// Set for the admin listing, which needs authentication.
    admin_token: Option<AuthToken>,
    query: CatalogQuery,
    page: Page<Course>,
    categories: Vec<Category>,
}

impl<B: CatalogApi> CatalogBrowser<B> {
    /// Public catalog with the default page size.
    pub fn new(backend: B) -> Self {
        Self::with_query(backend, None, CatalogQuery::new())
    }

    /// Admin catalog listing, including unpublished courses.
    pub fn admin(backend: B, token: AuthToken) -> Self {
        Self::with_query(
            backend,
            Some(token),
            CatalogQuery::new().with_size(ADMIN_PAGE_SIZE),
        )
    }

    pub fn with_query(backend: B, admin_token: Option<AuthToken>, query: CatalogQuery) -> Self {
        Self {
            backend,
            admin_token,
            query,
            page: Page::empty(),
            categories: Vec::new(),
        }
    }

    pub fn query(&self) -> &CatalogQuery {
        &self.query
    }

    pub fn courses(&self) -> &[Course] {
        &self.page.content
    }

    pub fn page(&self) -> &Page<Course> {
        &self.page
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Pagination bar for the current page.
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.query.page(), self.page.page_count())
    }

    /// Fetches the current page. A failure leaves an empty single page.
    #[tracing::instrument(skip(self), fields(page = self.query.page()))]
    pub async fn load(&mut self) -> Result<()> {
        let result = match &self.admin_token {
            Some(token) => self.backend.admin_courses(token, &self.query).await,
            None => self.backend.courses(&self.query).await,
        };
        match result {
            Ok(page) => {
                tracing::debug!(count = page.content.len(), total_pages = page.total_pages, "courses loaded");
                self.page = page;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to fetch courses");
                self.page = Page::empty();
                Err(AppError::Request(request_message(&e, "Failed to fetch courses")))
            }
        }
    }

    /// Fetches the category list used by the category filter.
    pub async fn load_categories(&mut self) -> Result<()> {
        match self.backend.categories().await {
            Ok(categories) => {
                self.categories = categories;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "error fetching categories");
                Err(AppError::Request(request_message(&e, "Failed to fetch categories")))
            }
        }
    }

    pub async fn set_category(&mut self, category_id: Option<CategoryId>) -> Result<()> {
        self.query.set_category(category_id);
        self.load().await
    }

    pub async fn set_keyword(&mut self, keyword: &str) -> Result<()> {
        self.query.set_keyword(keyword);
        self.load().await
    }

    pub async fn set_duration(&mut self, duration: Option<DurationFilter>) -> Result<()> {
        self.query.set_duration(duration);
        self.load().await
    }

    pub async fn clear_filters(&mut self) -> Result<()> {
        self.query.clear_filters();
        self.load().await
    }

    /// Moves to another page. Out-of-range pages are ignored and return false.
    pub async fn go_to_page(&mut self, page: u32) -> Result<bool> {
        if !self.query.go_to_page(page, self.page.page_count()) {
            return Ok(false);
        }
        self.load().await?;
        Ok(true)
    }
}

/// Whether the signed-in user already owns or holds a course.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CourseStatus {
    pub enrolled: bool,
    pub in_cart: bool,
}

/// Checks enrollment and cart membership for one course.
///
/// Both lookups run concurrently; a failed lookup counts as "no".
pub async fn course_status<B>(
    backend: &B,
    token: Option<&AuthToken>,
    course_id: CourseId,
) -> CourseStatus
where
    B: AuthApi + CartApi + ?Sized,
{
    let Some(token) = token else {
        return CourseStatus::default();
    };
    let (enrollments, cart) = tokio::join!(backend.enrollments(token), backend.get_cart(token));

    let enrolled = match enrollments {
        Ok(enrollments) => enrollments.includes(course_id),
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch enrollment status");
            false
        }
    };
    let in_cart = match cart {
        Ok(CartLookup::Found(cart)) => cart.contains_course(course_id),
        Ok(CartLookup::Empty) => false,
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch cart status");
            false
        }
    };
    CourseStatus { enrolled, in_cart }
}

#[cfg(test)]
mod tests {
    use backend::{InMemoryBackend, Operation};
    use domain::Amount;

    use super::*;

    async fn catalog(courses: usize) -> (CatalogBrowser<InMemoryBackend>, InMemoryBackend) {
        let backend = InMemoryBackend::new();
        for i in 0..courses {
            backend
                .seed_course(&format!("Course {i}"), Amount::from_parts(50000, 2))
                .await;
        }
        (CatalogBrowser::new(backend.clone()), backend)
    }

    #[tokio::test]
    async fn test_out_of_range_page_is_ignored() {
        let (mut browser, backend) = catalog(12).await;
        browser.load().await.unwrap();
        assert_eq!(browser.page().page_count(), 2);

        assert!(!browser.go_to_page(3).await.unwrap());
        assert!(!browser.go_to_page(0).await.unwrap());
        assert_eq!(backend.call_count(Operation::Courses).await, 1);

        assert!(browser.go_to_page(2).await.unwrap());
        assert_eq!(browser.courses().len(), 3);
        assert_eq!(browser.pagination().window(PAGINATION_WINDOW), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_filter_change_resets_page() {
        let (mut browser, _) = catalog(12).await;
        browser.load().await.unwrap();
        browser.go_to_page(2).await.unwrap();

        browser.set_keyword("Course 1").await.unwrap();
        assert_eq!(browser.query().page(), 1);
        assert_eq!(browser.query().keyword(), Some("Course 1"));
    }

    #[tokio::test]
    async fn test_failure_yields_empty_single_page() {
        let (mut browser, backend) = catalog(4).await;
        browser.load().await.unwrap();
        backend.set_failure(Operation::Courses, 500, None).await;

        let err = browser.load().await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch courses: 500");
        assert!(browser.courses().is_empty());
        assert_eq!(browser.page().page_count(), 1);
    }

    #[tokio::test]
    async fn test_course_status() {
        let backend = InMemoryBackend::new();
        let token = backend.seed_user("Asha", "Rao", "asha@example.com").await;
        let owned = backend.seed_course("Owned", Amount::from_parts(100, 0)).await;
        let wanted = backend.seed_course("Wanted", Amount::from_parts(100, 0)).await;
        backend.enroll(&token, owned).await.unwrap();
        backend.add_to_cart(&token, wanted).await.unwrap();

        let status = course_status(&backend, Some(&token), owned).await;
        assert_eq!(status, CourseStatus { enrolled: true, in_cart: false });
        let status = course_status(&backend, Some(&token), wanted).await;
        assert_eq!(status, CourseStatus { enrolled: false, in_cart: true });
        assert_eq!(course_status(&backend, None, wanted).await, CourseStatus::default());
    }
}
