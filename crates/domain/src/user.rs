//! Accounts, roles and enrollments.

use common::{CourseId, RoleId, UserId};
use serde::{Deserialize, Serialize};

use crate::course::Course;

/// A named permission level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub level: i32,
}

/// Wrapper the profile endpoint uses for each granted role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRole {
    pub role: Role,
}

/// The signed-in user's profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default, rename = "profile_pic")]
    pub profile_pic: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub roles: Vec<UserRole>,
}

impl User {
    /// First and last name joined by a space.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Returns true if the user holds a role with the given name.
    pub fn has_role(&self, name: &str) -> bool {
        self.roles
            .iter()
            .any(|r| r.role.name.eq_ignore_ascii_case(name))
    }
}

/// A row of the admin user listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

impl UserSummary {
    /// Display name, falling back to first and last name.
    pub fn label(&self) -> String {
        match &self.display_name {
            Some(name) if !name.is_empty() => name.clone(),
            _ => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

/// A durable grant of access to a course, created after verified payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enrollment {
    pub course: Course,
}

/// Response of the enrollments endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Enrollments {
    #[serde(default)]
    pub enrollments: Vec<Enrollment>,
}

impl Enrollments {
    /// Returns true if the user is enrolled in the course.
    pub fn includes(&self, course_id: CourseId) -> bool {
        self.enrollments.iter().any(|e| e.course.id == course_id)
    }
}
