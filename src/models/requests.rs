//! Request DTOs for the inspection API
//!
//! Document bodies are taken raw; only the path needs a model.

use serde::Deserialize;

/// Maximum accepted document key length in bytes
pub const MAX_KEY_LENGTH: usize = 1024;

/// Path parameters for `/cache/documents/*key`
///
/// Keys are file paths and may contain slashes.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentPath {
    pub key: String,
}

impl DocumentPath {
    /// Validates the key
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LENGTH {
            return Some(format!(
                "Key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            ));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_empty_key() {
        let path = DocumentPath { key: "".to_string() };
        assert!(path.validate().is_some());
    }

    #[test]
    fn test_validate_long_key() {
        let path = DocumentPath {
            key: "x".repeat(MAX_KEY_LENGTH + 1),
        };
        assert!(path.validate().is_some());
    }

    #[test]
    fn test_validate_nested_path() {
        let path = DocumentPath {
            key: "collections/manuals/guide.pdf".to_string(),
        };
        assert!(path.validate().is_none());
    }
}
