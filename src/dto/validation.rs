//! Validation helpers for DTOs.

use validator::ValidationError;

/// Maximum accepted length for player identifiers and categories.
const MAX_IDENTIFIER_LEN: usize = 64;

/// Validates that a player identifier is non-empty, at most 64 characters,
/// and free of control characters.
pub fn validate_player_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > MAX_IDENTIFIER_LEN {
        let mut err = ValidationError::new("player_id_length");
        err.message = Some(
            format!(
                "Player ID must be between 1 and {MAX_IDENTIFIER_LEN} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if id.chars().any(|c| c.is_control()) {
        let mut err = ValidationError::new("player_id_format");
        err.message = Some("Player ID must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a question category is non-empty and at most 64 characters.
pub fn validate_category(category: &str) -> Result<(), ValidationError> {
    if category.trim().is_empty() || category.len() > MAX_IDENTIFIER_LEN {
        let mut err = ValidationError::new("category_length");
        err.message = Some(
            format!("Category must be between 1 and {MAX_IDENTIFIER_LEN} characters").into(),
        );
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_player_id_valid() {
        assert!(validate_player_id("player-1").is_ok());
        assert!(validate_player_id("a").is_ok());
        assert!(validate_player_id(&"x".repeat(64)).is_ok());
    }

    #[test]
    fn test_validate_player_id_invalid() {
        assert!(validate_player_id("").is_err());
        assert!(validate_player_id(&"x".repeat(65)).is_err());
        assert!(validate_player_id("player\n1").is_err());
    }

    #[test]
    fn test_validate_category() {
        assert!(validate_category("science").is_ok());
        assert!(validate_category("   ").is_err());
        assert!(validate_category(&"x".repeat(65)).is_err());
    }
}
