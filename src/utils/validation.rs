// Validation utilities for request fields

use serde::{Deserialize, Deserializer};

/// Trim and validate a string field
///
/// # Arguments
/// * `field` - The string field to validate
/// * `required` - Whether the field is required (cannot be empty)
pub fn trim_and_validate_field(field: &str, required: bool) -> Result<String, String> {
    let trimmed = field.trim().to_string();
    if trimmed.is_empty() && required {
        return Err("Field cannot be empty".to_string());
    }
    Ok(trimmed)
}

/// `None` if the field is absent or blank after trimming
pub fn trim_optional_field(field: Option<&str>) -> Option<String> {
    field.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Deserialize a present field (including `null`) as `Some`.
///
/// Paired with `#[serde(default)]` this gives `Option<Option<T>>` three states:
/// absent (`None`), explicit null (`Some(None)`) and a value (`Some(Some(v))`).
pub fn deserialize_some<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_and_validate_field() {
        assert_eq!(trim_and_validate_field("  Menu ", true), Ok("Menu".to_string()));
        assert!(trim_and_validate_field("   ", true).is_err());
        assert_eq!(trim_and_validate_field("   ", false), Ok(String::new()));
    }

    #[test]
    fn test_trim_optional_field() {
        assert_eq!(trim_optional_field(None), None);
        assert_eq!(trim_optional_field(Some("  ")), None);
        assert_eq!(trim_optional_field(Some(" menu ")), Some("menu".to_string()));
    }
}
