//! Error types for docsift.
//!
//! Validation errors surface before any record is evaluated; once an
//! expression has been validated the matcher is total and never errors.

use thiserror::Error;

/// Filter engine error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Maximum nesting depth {max} exceeded")]
    MaxDepthExceeded { max: u8 },
}

/// Result type for filter operations
pub type FilterResult<T> = Result<T, FilterError>;

impl serde::Serialize for FilterError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = FilterError::InvalidExpression("unknown operator: $frobnicate".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid expression: unknown operator: $frobnicate"
        );

        let err = FilterError::InvalidOptions("max_depth must be between 1 and 10".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid options: max_depth must be between 1 and 10"
        );

        let err = FilterError::MaxDepthExceeded { max: 3 };
        assert_eq!(err.to_string(), "Maximum nesting depth 3 exceeded");
    }

    #[test]
    fn test_result_type() {
        let ok_result: FilterResult<i32> = Ok(42);
        assert_eq!(ok_result.unwrap(), 42);

        let err_result: FilterResult<i32> =
            Err(FilterError::InvalidExpression("test".to_string()));
        assert!(err_result.is_err());
    }
}
