//! # Structured error report.
//!
//! [`ErrorRecord`] is what reaches [`Sink::write_error`](crate::Sink::write_error)
//! when a work body fails. It carries:
//! - the original error as `cause` (not wrapped, downcastable)
//! - a stable identifier string (`error_id`)
//! - an optional target object
//! - an [`ErrorCategory`]

use std::any::Any;
use std::borrow::Cow;
use std::error::Error;
use std::fmt;

use crate::error::BoxError;

/// Coarse classification of a reported error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorCategory {
    /// No better category applies.
    #[default]
    NotSpecified,
    /// The operation stopped because its background work failed.
    OperationStopped,
    /// The operation was not valid in the current state.
    InvalidOperation,
    /// Input data was invalid.
    InvalidData,
    /// A required resource was unavailable.
    ResourceUnavailable,
    /// The operation ran out of time.
    OperationTimeout,
}

impl ErrorCategory {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ErrorCategory::NotSpecified => "not_specified",
            ErrorCategory::OperationStopped => "operation_stopped",
            ErrorCategory::InvalidOperation => "invalid_operation",
            ErrorCategory::InvalidData => "invalid_data",
            ErrorCategory::ResourceUnavailable => "resource_unavailable",
            ErrorCategory::OperationTimeout => "operation_timeout",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Structured error report delivered to a [`Sink`](crate::Sink).
///
/// # Example
/// ```
/// use affinity_dispatch::{ErrorCategory, ErrorRecord};
///
/// let record = ErrorRecord::new(
///     std::io::Error::other("fail"),
///     "background-work-failed",
///     ErrorCategory::OperationStopped,
/// );
/// assert_eq!(record.message(), "fail");
/// assert!(record.cause().downcast_ref::<std::io::Error>().is_some());
/// ```
pub struct ErrorRecord {
    cause: BoxError,
    error_id: Cow<'static, str>,
    target: Option<Box<dyn Any + Send + Sync>>,
    category: ErrorCategory,
}

impl ErrorRecord {
    /// Creates a report without a target object.
    pub fn new(
        cause: impl Into<BoxError>,
        error_id: impl Into<Cow<'static, str>>,
        category: ErrorCategory,
    ) -> Self {
        Self {
            cause: cause.into(),
            error_id: error_id.into(),
            target: None,
            category,
        }
    }

    /// Attaches the object the error relates to.
    pub fn with_target<T: Any + Send + Sync>(mut self, target: T) -> Self {
        self.target = Some(Box::new(target));
        self
    }

    /// The original error.
    pub fn cause(&self) -> &(dyn Error + Send + Sync + 'static) {
        self.cause.as_ref()
    }

    /// Consumes the report, returning the original error.
    pub fn into_cause(self) -> BoxError {
        self.cause
    }

    /// Stable identifier string.
    pub fn error_id(&self) -> &str {
        &self.error_id
    }

    /// Target object, if any.
    pub fn target(&self) -> Option<&(dyn Any + Send + Sync)> {
        self.target.as_deref()
    }

    /// Error category.
    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    /// The cause's message.
    pub fn message(&self) -> String {
        self.cause.to_string()
    }
}

impl fmt::Debug for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorRecord")
            .field("cause", &self.cause)
            .field("error_id", &self.error_id)
            .field("target", &self.target.is_some())
            .field("category", &self.category)
            .finish()
    }
}

impl fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.error_id, self.category, self.cause)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_roundtrip() {
        let record = ErrorRecord::new("boom", "id", ErrorCategory::InvalidData).with_target(42u32);
        let target = record.target().and_then(|t| t.downcast_ref::<u32>());
        assert_eq!(target, Some(&42));
        assert_eq!(record.category().as_label(), "invalid_data");
    }

    #[test]
    fn test_display() {
        let record = ErrorRecord::new("boom", "work-failed", ErrorCategory::OperationStopped);
        assert_eq!(record.to_string(), "work-failed (operation_stopped): boom");
        assert_eq!(record.error_id(), "work-failed");
        assert!(record.target().is_none());
    }
}
