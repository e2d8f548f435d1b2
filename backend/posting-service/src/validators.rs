//! Input validation helpers shared by the request types

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use validator::{ValidationError, ValidationErrors};

// These patterns are hardcoded and always valid.
static USER_ID_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9_]+$").expect("hardcoded user_id regex is invalid - fix source code")
});

static PASSWORD_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z\d]{8,}$").expect("hardcoded password regex is invalid - fix source code")
});

pub const MAX_USER_ID_CHARS: usize = 30;
pub const MAX_USER_NAME_CHARS: usize = 30;
pub const MAX_COMMENT_CHARS: usize = 255;

/// ASCII letters, digits and underscore only
pub fn validate_user_id_format(user_id: &str) -> bool {
    USER_ID_REGEX.is_match(user_id)
}

/// At least 8 ASCII letters or digits, nothing else
pub fn validate_password_format(password: &str) -> bool {
    PASSWORD_REGEX.is_match(password)
}

/// Trimmed value, with empty strings treated as absent.
pub fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Like `present` but keeps surrounding whitespace (passwords).
pub fn present_raw(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// A body field kept as raw JSON so that a value of the wrong type can be
/// reported against the field instead of rejecting the whole body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonText<'a> {
    /// Missing, `null` or an empty string
    Absent,
    Text(&'a str),
    /// Any JSON type other than a string
    NotText,
}

impl<'a> JsonText<'a> {
    /// Keeps surrounding whitespace (passwords).
    pub fn raw(value: &'a Option<Value>) -> Self {
        match value {
            None | Some(Value::Null) => JsonText::Absent,
            Some(Value::String(s)) if s.is_empty() => JsonText::Absent,
            Some(Value::String(s)) => JsonText::Text(s),
            Some(_) => JsonText::NotText,
        }
    }

    pub fn trimmed(value: &'a Option<Value>) -> Self {
        match Self::raw(value) {
            JsonText::Text(s) if s.trim().is_empty() => JsonText::Absent,
            JsonText::Text(s) => JsonText::Text(s.trim()),
            other => other,
        }
    }

    pub fn text(self) -> Option<&'a str> {
        match self {
            JsonText::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_given(self) -> bool {
        self != JsonText::Absent
    }
}

fn error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Owned(message));
    err
}

pub fn required(field: &str) -> ValidationError {
    error("required", format!("The {} field is required.", field))
}

pub fn not_a_string(field: &str) -> ValidationError {
    error("string", format!("The {} must be a string.", field))
}

pub fn too_long(field: &str, max: usize) -> ValidationError {
    let mut err = error(
        "max",
        format!("The {} may not be greater than {} characters.", field, max),
    );
    err.add_param(Cow::Borrowed("max"), &max);
    err
}

pub fn user_id_format() -> ValidationError {
    error(
        "regex",
        "The user_id may only contain letters, numbers and underscores.".to_string(),
    )
}

pub fn user_id_taken() -> ValidationError {
    error(
        "unique",
        "The user_id has already been taken. Please choose a different user_id.".to_string(),
    )
}

pub fn password_format(field: &str) -> ValidationError {
    error(
        "regex",
        format!(
            "The {} must be at least 8 characters and contain only letters and digits.",
            field
        ),
    )
}

pub fn current_password_mismatch() -> ValidationError {
    error(
        "current_password",
        "The current_password is incorrect.".to_string(),
    )
}

pub fn image_too_large(max_bytes: usize) -> ValidationError {
    let mut err = error(
        "max_size",
        format!(
            "The image may not be larger than {}.",
            human_size(max_bytes)
        ),
    );
    err.add_param(Cow::Borrowed("max"), &max_bytes);
    err
}

pub fn image_not_jpeg() -> ValidationError {
    error("mimetypes", "The image must be a jpeg image.".to_string())
}

/// Checks a required free-text field and its character limit.
pub fn check_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: Option<&str>,
    max_chars: Option<usize>,
) {
    match value {
        None => errors.add(field, required(field)),
        Some(v) => {
            if let Some(max) = max_chars {
                if v.chars().count() > max {
                    errors.add(field, too_long(field, max));
                }
            }
        }
    }
}

/// `check_text` for a field read as raw JSON.
pub fn check_json_text(
    errors: &mut ValidationErrors,
    field: &'static str,
    value: JsonText<'_>,
    max_chars: Option<usize>,
) {
    match value {
        JsonText::NotText => errors.add(field, not_a_string(field)),
        other => check_text(errors, field, other.text(), max_chars),
    }
}

pub fn into_result(errors: ValidationErrors) -> Result<(), ValidationErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn human_size(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    if bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id_format() {
        assert!(validate_user_id_format("alice_01"));
        assert!(validate_user_id_format("_"));
        assert!(!validate_user_id_format("alice-01"));
        assert!(!validate_user_id_format("alice 01"));
        assert!(!validate_user_id_format("ありす"));
        assert!(!validate_user_id_format(""));
    }

    #[test]
    fn test_password_format() {
        assert!(validate_password_format("abcd1234"));
        assert!(validate_password_format("ABCDEFGH"));
        assert!(!validate_password_format("abc1234"));
        assert!(!validate_password_format("abcd_1234"));
        assert!(!validate_password_format("abcd 1234"));
    }

    #[test]
    fn test_present_treats_blank_as_absent() {
        assert_eq!(present(&None), None);
        assert_eq!(present(&Some("".into())), None);
        assert_eq!(present(&Some("   ".into())), None);
        assert_eq!(present(&Some("  hi ".into())), Some("hi"));
        assert_eq!(present_raw(&Some(" pw ".into())), Some(" pw "));
        assert_eq!(present_raw(&Some("".into())), None);
    }

    #[test]
    fn test_json_text_kinds() {
        use serde_json::json;

        assert_eq!(JsonText::trimmed(&None), JsonText::Absent);
        assert_eq!(JsonText::trimmed(&Some(Value::Null)), JsonText::Absent);
        assert_eq!(JsonText::trimmed(&Some(json!("  "))), JsonText::Absent);
        assert_eq!(JsonText::trimmed(&Some(json!(" hi "))), JsonText::Text("hi"));
        assert_eq!(JsonText::raw(&Some(json!(" pw "))), JsonText::Text(" pw "));
        assert_eq!(JsonText::raw(&Some(json!(99))), JsonText::NotText);
        assert_eq!(JsonText::raw(&Some(json!(["a"]))), JsonText::NotText);
        assert!(JsonText::raw(&Some(json!(false))).is_given());

        let mut errors = ValidationErrors::new();
        check_json_text(&mut errors, "comment", JsonText::NotText, Some(255));
        assert_eq!(errors.field_errors()["comment"][0].code, "string");
    }

    #[test]
    fn test_check_text_counts_characters_not_bytes() {
        let mut errors = ValidationErrors::new();
        let thirty_kana = "あ".repeat(30);
        check_text(&mut errors, "user_name", Some(thirty_kana.as_str()), Some(30));
        assert!(errors.is_empty());

        let thirty_one = "あ".repeat(31);
        check_text(&mut errors, "user_name", Some(thirty_one.as_str()), Some(30));
        assert!(errors.field_errors().contains_key("user_name"));
    }

    #[test]
    fn test_check_text_required() {
        let mut errors = ValidationErrors::new();
        check_text(&mut errors, "comment", None, Some(255));
        let field_errors = errors.field_errors();
        assert_eq!(field_errors["comment"][0].code, "required");
    }

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(5 * 1024 * 1024), "5MB");
        assert_eq!(human_size(1000), "1000 bytes");
    }
}
