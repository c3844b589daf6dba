//! Operator notices.
//!
//! A [`Notice`] is the result message of an editor action ("Variants
//! created", "No variants selected"). Emitting one only logs it; delivery to
//! the operator happens by returning it in the API response.

use serde::Serialize;

/// Severity of a [`Notice`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A short message for the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub level: NoticeLevel,
}

impl Notice {
    #[must_use]
    pub fn success(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Success, title, description)
    }

    #[must_use]
    pub fn warning(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Warning, title, description)
    }

    #[must_use]
    pub fn error(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(NoticeLevel::Error, title, description)
    }

    fn new(level: NoticeLevel, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            level,
        }
    }

    /// Log the notice at a level matching its severity.
    pub fn emit(&self) {
        match self.level {
            NoticeLevel::Success => {
                tracing::info!(title = %self.title, description = %self.description, "notice");
            }
            NoticeLevel::Warning => {
                tracing::warn!(title = %self.title, description = %self.description, "notice");
            }
            NoticeLevel::Error => {
                tracing::error!(title = %self.title, description = %self.description, "notice");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_serialization() {
        let notice = Notice::warning(
            "No variants selected",
            "Please select at least one variant to apply bulk edits",
        );
        let json = serde_json::to_value(&notice).unwrap();
        assert_eq!(json["level"], "warning");
        assert_eq!(json["title"], "No variants selected");
    }
}
