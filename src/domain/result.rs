//! Result type alias for revstats

use super::errors::RevstatsError;

/// Result type alias for revstats operations
///
/// # Examples
///
/// ```
/// use revstats::domain::result::Result;
/// use revstats::domain::errors::RevstatsError;
///
/// fn failing_function() -> Result<()> {
///     Err(RevstatsError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, RevstatsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::RevstatsError;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }

    #[test]
    fn test_result_err() {
        let result: Result<i32> = Err(RevstatsError::Validation("test error".to_string()));
        assert!(result.is_err());
    }
}
