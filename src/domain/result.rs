//! Result type alias for Sheetguard

use super::errors::SheetguardError;

/// Result type alias for Sheetguard operations
///
/// # Examples
///
/// ```
/// use sheetguard::domain::result::Result;
/// use sheetguard::domain::errors::SheetguardError;
///
/// fn failing_function() -> Result<()> {
///     Err(SheetguardError::Validation("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, SheetguardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
