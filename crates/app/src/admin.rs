//! Course, category and role administration.

use authoring::Confirm;
use backend::{AdminApi, AuthToken, CatalogApi, ContentApi};
use common::CourseId;
use domain::{
    Category, Course, CourseDraft, DomainError, Notice, Page, Pagination, Role, RoleAssignment, RoleDraft,
    UserSummary,
};

use crate::error::{AppError, Result, request_message};

/// Page size of the user directory.
pub const USERS_PAGE_SIZE: u32 = 10;

/// Page numbers shown at once in the user directory.
pub const USERS_PAGINATION_WINDOW: u32 = 5;

/// Administrative actions of a signed-in operator.
///
/// Every form is validated locally first; an invalid form never reaches the
/// backend.
pub struct AdminConsole<B>
where
    B: CatalogApi + ContentApi + AdminApi,
{
    backend: B,
    token: AuthToken,
    notices: Vec<Notice>,
}

impl<B> AdminConsole<B>
where
    B: CatalogApi + ContentApi + AdminApi,
{
    pub fn new(backend: B, token: AuthToken) -> Self {
        Self {
            backend,
            token,
            notices: Vec::new(),
        }
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    #[tracing::instrument(skip(self))]
    pub async fn add_category(&mut self, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::Required { field: "name" }.into());
        }
        match self.backend.add_category(&self.token, name).await {
            Ok(category) => {
                tracing::info!(category_id = %category.id, "category added");
                self.notices.push(Notice::success(format!(
                    "Category \"{name}\" added successfully!"
                )));
                Ok(category)
            }
            Err(e) => {
                tracing::error!(error = %e, "error adding category");
                Err(self.fail(format!(
                    "Failed to add category. {}",
                    request_message(&e, "Please try again")
                )))
            }
        }
    }

    /// Creates a course. An image and a category are required.
    #[tracing::instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn add_course(&mut self, draft: &CourseDraft) -> Result<String> {
        draft.validate_for_create()?;
        match self.backend.add_course(&self.token, draft).await {
            Ok(message) => {
                tracing::info!("course added");
                self.notices.push(Notice::success("Course added successfully!"));
                Ok(message)
            }
            Err(e) => {
                tracing::error!(error = %e, "error adding course");
                Err(self.fail(format!(
                    "Error: {}",
                    request_message(&e, "Failed to add course")
                )))
            }
        }
    }

    /// Updates a course, then refetches it. Without an image the current one
    /// is kept. Returns `None` when the update went through but the refetch
    /// did not.
    #[tracing::instrument(skip(self, draft), fields(title = %draft.title))]
    pub async fn edit_course(
        &mut self,
        course_id: CourseId,
        draft: &CourseDraft,
    ) -> Result<Option<Course>> {
        draft.validate_for_edit()?;
        match self.backend.edit_course(&self.token, course_id, draft).await {
            Ok(_) => {
                tracing::info!(%course_id, "course updated");
                self.notices.push(Notice::success("Course updated successfully!"));
                match self.backend.course_detail(course_id).await {
                    Ok(course) => Ok(Some(course)),
                    Err(e) => {
                        tracing::warn!(%course_id, error = %e, "refetch after update failed");
                        Ok(None)
                    }
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "error updating course");
                Err(self.fail(format!(
                    "Error: {}",
                    request_message(&e, "Failed to update course")
                )))
            }
        }
    }

    /// Deletes a course after confirmation. Returns false when declined.
    #[tracing::instrument(skip(self, confirm))]
    pub async fn delete_course<C>(&mut self, course_id: CourseId, confirm: &C) -> Result<bool>
    where
        C: Confirm + ?Sized,
    {
        if !confirm.confirm(&format!(
            "Are you sure you want to DELETE Course ID: {course_id}?"
        )) {
            return Ok(false);
        }
        match self.backend.delete_course(&self.token, course_id).await {
            Ok(()) => {
                tracing::info!(%course_id, "course deleted");
                self.notices.push(Notice::success("Course deleted successfully!"));
                Ok(true)
            }
            Err(e) => {
                tracing::error!(error = %e, "error deleting course");
                Err(self.fail("Failed to delete course.".to_string()))
            }
        }
    }

    #[tracing::instrument(skip(self, draft), fields(name = %draft.name))]
    pub async fn add_role(&mut self, draft: &RoleDraft) -> Result<Role> {
        draft.validate()?;
        match self.backend.add_role(&self.token, draft).await {
            Ok(role) => {
                self.notices.push(Notice::success(format!(
                    "Role '{}' added successfully!",
                    role.name
                )));
                Ok(role)
            }
            Err(e) => {
                tracing::error!(error = %e, "error adding role");
                Err(self.fail(format!(
                    "Error: {}",
                    request_message(&e, "Failed to add role")
                )))
            }
        }
    }

    pub async fn roles(&self) -> Result<Vec<Role>> {
        self.backend.roles(&self.token).await.map_err(|e| {
            tracing::error!(error = %e, "error fetching roles");
            AppError::Request(request_message(&e, "Failed to fetch roles"))
        })
    }

    /// One page of the user directory. `page` starts at 1.
    pub async fn users(&self, page: u32) -> Result<UserDirectory> {
        let page = page.max(1);
        match self
            .backend
            .users(&self.token, page - 1, USERS_PAGE_SIZE)
            .await
        {
            Ok(users) => Ok(UserDirectory { page, users }),
            Err(e) => {
                tracing::error!(error = %e, "error fetching users");
                Err(AppError::Request(request_message(&e, "Failed to fetch users")))
            }
        }
    }

    /// Grants a role. `roles` and `users` are only used to name them in the
    /// confirmation message.
    #[tracing::instrument(skip(self, roles, users))]
    pub async fn assign_role(
        &mut self,
        assignment: RoleAssignment,
        roles: &[Role],
        users: &[UserSummary],
    ) -> Result<String> {
        let (user_id, role_id) = assignment.validate()?;
        match self.backend.assign_role(&self.token, user_id, role_id).await {
            Ok(_) => {
                let role = roles
                    .iter()
                    .find(|r| r.id == role_id)
                    .map_or_else(|| role_id.to_string(), |r| r.name.clone());
                let user = users
                    .iter()
                    .find(|u| u.id == user_id)
                    .map_or_else(|| user_id.to_string(), UserSummary::label);
                let message = format!("Success: Assigned role '{role}' to user '{user}'!");
                tracing::info!(%user_id, %role_id, "role assigned");
                self.notices.push(Notice::success(message.clone()));
                Ok(message)
            }
            Err(e) => {
                tracing::error!(error = %e, "error assigning role");
                Err(self.fail(format!(
                    "Error: {}",
                    request_message(&e, "Failed to assign role")
                )))
            }
        }
    }

    fn fail(&mut self, message: String) -> AppError {
        self.notices.push(Notice::error(message.clone()));
        AppError::Request(message)
    }
}

/// A page of the user directory.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDirectory {
    /// Page number, starting at 1.
    pub page: u32,
    pub users: Page<UserSummary>,
}

impl UserDirectory {
    pub fn pagination(&self) -> Pagination {
        Pagination::new(self.page, self.users.page_count())
    }

    /// Page numbers to show around the current page.
    pub fn window(&self) -> Vec<u32> {
        self.pagination().window(USERS_PAGINATION_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use backend::{InMemoryBackend, Operation};
    use domain::{Amount, ImageFile};

    use super::*;

    async fn console() -> (AdminConsole<InMemoryBackend>, InMemoryBackend) {
        let backend = InMemoryBackend::new();
        let token = backend.seed_admin("Meera", "Nair", "meera@example.com").await;
        (AdminConsole::new(backend.clone(), token), backend)
    }

    fn draft(category: Option<Category>) -> CourseDraft {
        CourseDraft {
            title: "Async Rust".into(),
            description: "Futures and executors".into(),
            instructor_name: "Meera Nair".into(),
            price: Amount::from_parts(1999, 0),
            discounted_price: Some(Amount::from_parts(1499, 0)),
            duration: 8,
            category_id: category.map(|c| c.id),
            image: Some(ImageFile::new("cover.png", "image/png", vec![1, 2, 3])),
        }
    }

    #[tokio::test]
    async fn test_course_without_category_makes_no_request() {
        let (mut console, backend) = console().await;
        let err = console.add_course(&draft(None)).await.unwrap_err();
        assert_eq!(err.to_string(), "Please select a category.");
        assert_eq!(backend.call_count(Operation::AddCourse).await, 0);
    }

    #[tokio::test]
    async fn test_add_course_in_new_category() {
        let (mut console, backend) = console().await;
        let category = console.add_category(" Systems ").await.unwrap();
        assert_eq!(category.name, "Systems");

        console.add_course(&draft(Some(category))).await.unwrap();
        let messages: Vec<_> = console
            .take_notices()
            .into_iter()
            .map(|n| n.message)
            .collect();
        assert_eq!(
            messages,
            vec![
                "Category \"Systems\" added successfully!".to_string(),
                "Course added successfully!".to_string()
            ]
        );
        assert_eq!(backend.call_count(Operation::AddCourse).await, 1);
    }

    #[tokio::test]
    async fn test_edit_course_returns_refetched_course() {
        let (mut console, backend) = console().await;
        let category = console.add_category("Systems").await.unwrap();
        let course = backend.seed_course("Rust", Amount::from_parts(100, 0)).await;

        let mut edit = draft(Some(category));
        edit.image = None;
        let updated = console.edit_course(course, &edit).await.unwrap().unwrap();
        assert_eq!(updated.id, course);
        assert_eq!(updated.title, "Async Rust");
        assert_eq!(backend.call_count(Operation::CourseDetail).await, 1);
    }

    #[tokio::test]
    async fn test_declined_course_delete() {
        let (mut console, backend) = console().await;
        let course = backend.seed_course("Rust", Amount::from_parts(100, 0)).await;

        assert!(!console.delete_course(course, &|_: &str| false).await.unwrap());
        assert!(backend.course(course).await.is_some());
        assert!(console.delete_course(course, &|_: &str| true).await.unwrap());
        assert!(backend.course(course).await.is_none());
    }

    #[tokio::test]
    async fn test_users_page_is_zero_based_on_the_wire() {
        let (console, backend) = console().await;
        for i in 0..11 {
            backend
                .seed_user("User", &i.to_string(), &format!("user{i}@example.com"))
                .await;
        }

        let directory = console.users(2).await.unwrap();
        assert_eq!(directory.users.number, 1);
        assert_eq!(directory.users.content.len(), 2);
        assert_eq!(directory.window(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_assignment_needs_user_and_role() {
        let (mut console, backend) = console().await;
        let err = console
            .assign_role(RoleAssignment::default(), &[], &[])
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Please select both a User and a Role.");
        assert_eq!(backend.call_count(Operation::AssignRole).await, 0);
    }

    #[tokio::test]
    async fn test_assign_role_names_both_sides() {
        let (mut console, backend) = console().await;
        let role = console
            .add_role(&RoleDraft {
                name: "INSTRUCTOR".into(),
                description: "Teaches".into(),
                level: 300,
            })
            .await
            .unwrap();
        backend.seed_user("Ravi", "Iyer", "ravi@example.com").await;
        let users = console.users(1).await.unwrap().users.content;
        let ravi = users.iter().find(|u| u.email == "ravi@example.com").unwrap();

        let message = console
            .assign_role(
                RoleAssignment {
                    user_id: Some(ravi.id),
                    role_id: Some(role.id),
                },
                &[role.clone()],
                &users,
            )
            .await
            .unwrap();
        assert_eq!(message, "Success: Assigned role 'INSTRUCTOR' to user 'Ravi Iyer'!");
    }
}
