//! User-visible messages produced by the coordinators.

use serde::Serialize;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A message a front-end shows to the user, inline or as an alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// Returns true for error notices.
    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tag = match self.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        };
        write!(f, "[{tag}] {}", self.message)
    }
}
