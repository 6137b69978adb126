use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for one coordinator instance (a checkout session or a
/// content-tree view).
///
/// Never sent to the backend; it only ties log lines of one flow together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowId(Uuid);

impl FlowId {
    /// Creates a new random flow ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for FlowId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for FlowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Declares a server-assigned numeric identifier.
macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Wraps a raw identifier.
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw identifier.
            pub const fn get(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

numeric_id!(
    /// Identifier of a course.
    CourseId
);
numeric_id!(
    /// Identifier of a section within a course.
    SectionId
);
numeric_id!(
    /// Identifier of a topic within a section.
    TopicId
);
numeric_id!(
    /// Identifier of a course category.
    CategoryId
);
numeric_id!(
    /// Identifier of a cart line.
    CartItemId
);
numeric_id!(
    /// Identifier of a user account.
    UserId
);
numeric_id!(
    /// Identifier of a role.
    RoleId
);
