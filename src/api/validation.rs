use super::ApiError;
use crate::domain::AssetId;

pub const MAX_ASSET_NAME_LEN: usize = 200;
pub const MAX_CATEGORY_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 2000;
pub const DEFAULT_TRANSACTION_LIMIT: usize = 100;

pub fn validate_asset_id(id: i32) -> Result<AssetId, ApiError> {
    if id <= 0 {
        return Err(ApiError::validation(format!(
            "Invalid asset ID: {}. ID must be a positive integer",
            id
        )));
    }
    Ok(AssetId::new(id))
}

pub fn validate_limit(limit: usize) -> Result<usize, ApiError> {
    const MAX_LIMIT: usize = 1000;
    const MIN_LIMIT: usize = 1;

    if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::validation(format!(
            "Invalid limit: {}. Limit must be between {} and {}",
            limit, MIN_LIMIT, MAX_LIMIT
        )));
    }
    Ok(limit)
}

pub fn validate_asset_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Asset name cannot be empty"));
    }

    if trimmed.chars().count() > MAX_ASSET_NAME_LEN {
        return Err(ApiError::validation(format!(
            "Asset name must be {} characters or less",
            MAX_ASSET_NAME_LEN
        )));
    }

    Ok(trimmed)
}

/// Length check for free-text fields; absent values pass.
pub fn validate_optional_text(
    field: &str,
    value: Option<&str>,
    max_len: usize,
) -> Result<(), ApiError> {
    if let Some(v) = value
        && v.chars().count() > max_len
    {
        return Err(ApiError::validation(format!(
            "{} must be {} characters or less",
            field, max_len
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_asset_id() {
        assert_eq!(validate_asset_id(1).unwrap(), AssetId::new(1));
        assert!(validate_asset_id(12345).is_ok());
        assert!(validate_asset_id(0).is_err());
        assert!(validate_asset_id(-1).is_err());
    }

    #[test]
    fn test_validate_limit() {
        assert!(validate_limit(1).is_ok());
        assert!(validate_limit(DEFAULT_TRANSACTION_LIMIT).is_ok());
        assert!(validate_limit(1000).is_ok());
        assert!(validate_limit(0).is_err());
        assert!(validate_limit(1001).is_err());
    }

    #[test]
    fn test_validate_asset_name() {
        assert_eq!(validate_asset_name("  Oscilloscope ").unwrap(), "Oscilloscope");
        assert!(validate_asset_name("").is_err());
        assert!(validate_asset_name("   ").is_err());
        assert!(validate_asset_name(&"a".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_optional_text() {
        assert!(validate_optional_text("Category", None, 5).is_ok());
        assert!(validate_optional_text("Category", Some("Optic"), 5).is_ok());
        assert!(validate_optional_text("Category", Some("Optics"), 5).is_err());
    }
}
