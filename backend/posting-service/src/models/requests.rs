//! Request bodies
//!
//! Fields are optional so that a missing or `null` field turns into a
//! field-level validation error. Registration, login and post bodies take
//! strings, so a value of the wrong JSON type fails deserialization (400).
//! Profile and comment bodies keep raw JSON values and report a wrong type
//! against the field (422).

use crate::storage::images::{decode_base64, is_jpeg};
use crate::validators::{
    check_json_text, check_text, into_result, image_not_jpeg, image_too_large, not_a_string,
    password_format, present, present_raw, required, user_id_format, validate_password_format,
    validate_user_id_format, JsonText, MAX_COMMENT_CHARS, MAX_USER_ID_CHARS, MAX_USER_NAME_CHARS,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationErrors};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub user_id: Option<String>,
    pub user_name: Option<String>,
    pub password: Option<String>,
}

impl RegisterRequest {
    pub fn user_id(&self) -> &str {
        present(&self.user_id).unwrap_or_default()
    }

    pub fn user_name(&self) -> &str {
        present(&self.user_name).unwrap_or_default()
    }

    pub fn password(&self) -> &str {
        present_raw(&self.password).unwrap_or_default()
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let user_id = present(&self.user_id);
        check_text(&mut errors, "user_id", user_id, Some(MAX_USER_ID_CHARS));
        if let Some(id) = user_id {
            if !validate_user_id_format(id) {
                errors.add("user_id", user_id_format());
            }
        }

        check_text(
            &mut errors,
            "user_name",
            present(&self.user_name),
            Some(MAX_USER_NAME_CHARS),
        );

        match present_raw(&self.password) {
            None => errors.add("password", required("password")),
            Some(pw) if !validate_password_format(pw) => {
                errors.add("password", password_format("password"))
            }
            Some(_) => {}
        }

        into_result(errors)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    pub user_id: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    pub fn user_id(&self) -> &str {
        present(&self.user_id).unwrap_or_default()
    }

    pub fn password(&self) -> &str {
        present_raw(&self.password).unwrap_or_default()
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_text(&mut errors, "user_id", present(&self.user_id), None);
        if present_raw(&self.password).is_none() {
            errors.add("password", required("password"));
        }
        into_result(errors)
    }
}

/// `current_password` and `new_password` travel together: either both or
/// neither.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProfileRequest {
    pub user_name: Option<Value>,
    pub current_password: Option<Value>,
    pub new_password: Option<Value>,
}

impl UpdateProfileRequest {
    pub fn user_name(&self) -> &str {
        JsonText::trimmed(&self.user_name).text().unwrap_or_default()
    }

    pub fn current_password(&self) -> Option<&str> {
        JsonText::raw(&self.current_password).text()
    }

    pub fn new_password(&self) -> Option<&str> {
        JsonText::raw(&self.new_password).text()
    }
}

impl Validate for UpdateProfileRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        check_json_text(
            &mut errors,
            "user_name",
            JsonText::trimmed(&self.user_name),
            Some(MAX_USER_NAME_CHARS),
        );

        let current = JsonText::raw(&self.current_password);
        let new = JsonText::raw(&self.new_password);

        match (current.is_given(), new.is_given()) {
            (false, true) => errors.add("current_password", required("current_password")),
            (true, false) => errors.add("new_password", required("new_password")),
            _ => {}
        }

        if current == JsonText::NotText {
            errors.add("current_password", not_a_string("current_password"));
        }

        match new {
            JsonText::NotText => errors.add("new_password", not_a_string("new_password")),
            JsonText::Text(pw) if !validate_password_format(pw) => {
                errors.add("new_password", password_format("new_password"))
            }
            _ => {}
        }

        into_result(errors)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreatePostRequest {
    /// Base64 JPEG, optionally as a `data:image/...;base64,` URL
    pub image: Option<String>,
    pub message: Option<String>,
}

/// A post request that passed validation, with the image already decoded.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub message: String,
    pub image: Vec<u8>,
}

impl CreatePostRequest {
    /// Validate and decode in one pass; `max_image_bytes` bounds the decoded size.
    pub fn into_new_post(self, max_image_bytes: usize) -> Result<NewPost, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let image = match present(&self.image) {
            None => {
                errors.add("image", required("image"));
                None
            }
            Some(encoded) => match decode_base64(encoded) {
                Err(_) => {
                    errors.add("image", image_not_jpeg());
                    None
                }
                Ok(bytes) => {
                    let mut ok = true;
                    if bytes.is_empty() {
                        errors.add("image", required("image"));
                        ok = false;
                    } else {
                        if bytes.len() > max_image_bytes {
                            errors.add("image", image_too_large(max_image_bytes));
                            ok = false;
                        }
                        if !is_jpeg(&bytes) {
                            errors.add("image", image_not_jpeg());
                            ok = false;
                        }
                    }
                    ok.then_some(bytes)
                }
            },
        };

        let message = present(&self.message).map(str::to_string);
        check_text(&mut errors, "message", message.as_deref(), None);

        into_result(errors)?;
        match (image, message) {
            (Some(image), Some(message)) => Ok(NewPost { message, image }),
            // into_result already rejected the other combinations
            _ => Err(ValidationErrors::new()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCommentRequest {
    pub comment: Option<Value>,
}

impl CreateCommentRequest {
    pub fn comment(&self) -> &str {
        JsonText::trimmed(&self.comment).text().unwrap_or_default()
    }
}

impl Validate for CreateCommentRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        check_json_text(
            &mut errors,
            "comment",
            JsonText::trimmed(&self.comment),
            Some(MAX_COMMENT_CHARS),
        );
        into_result(errors)
    }
}
