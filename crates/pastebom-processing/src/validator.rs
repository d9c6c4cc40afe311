const MAX_FILENAME_LENGTH: usize = 255;

/// Upload validation errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,
}

/// Checks applied to an uploaded board file before any work is done on it.
///
/// Format support is not checked here; it depends on the registered decoders.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_file_size: usize,
}

impl UploadValidator {
    pub fn new(max_file_size: usize) -> Self {
        Self { max_file_size }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Validate file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    pub fn validate_not_empty(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }
        Ok(())
    }

    pub fn validate_filename(&self, filename: &str) -> Result<(), ValidationError> {
        if filename.trim().is_empty() {
            return Err(ValidationError::InvalidFilename(
                "filename is empty".to_string(),
            ));
        }
        if filename.len() > MAX_FILENAME_LENGTH {
            return Err(ValidationError::InvalidFilename(format!(
                "filename exceeds {} bytes",
                MAX_FILENAME_LENGTH
            )));
        }
        if filename.chars().any(char::is_control) {
            return Err(ValidationError::InvalidFilename(
                "filename contains control characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_validator() -> UploadValidator {
        UploadValidator::new(1024 * 1024)
    }

    #[test]
    fn test_validate_file_size_success() {
        let validator = test_validator();
        assert!(validator.validate_file_size(1024 * 1024).is_ok());
    }

    #[test]
    fn test_validate_file_size_too_large() {
        let validator = test_validator();
        assert_eq!(
            validator.validate_file_size(1024 * 1024 + 1),
            Err(ValidationError::FileTooLarge {
                size: 1024 * 1024 + 1,
                max: 1024 * 1024
            })
        );
    }

    #[test]
    fn test_validate_empty_file() {
        let validator = test_validator();
        assert_eq!(validator.validate_not_empty(0), Err(ValidationError::EmptyFile));
    }

    #[test]
    fn test_validate_filename() {
        let validator = test_validator();
        assert!(validator.validate_filename("board.json").is_ok());
        assert!(validator.validate_filename("  ").is_err());
        assert!(validator.validate_filename(&"a".repeat(300)).is_err());
        assert!(validator.validate_filename("bo\nard.json").is_err());
    }
}
