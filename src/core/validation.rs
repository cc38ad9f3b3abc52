// Input validation for user-supplied text
// Lengths are counted in Unicode scalar values, so one kanji counts as one character

use crate::error::{AppError, AppResult};

pub const TANKA_CONTENT_MAX_CHARS: usize = 150;
pub const DISPLAY_NAME_MAX_CHARS: usize = 30;

fn check_length(value: &str, max: usize, message: &str) -> AppResult<()> {
    let len = value.chars().count();
    if len == 0 || len > max {
        return Err(AppError::Validation(message.to_string()));
    }
    Ok(())
}

pub fn validate_tanka_content(content: &str) -> AppResult<()> {
    check_length(
        content,
        TANKA_CONTENT_MAX_CHARS,
        "Content must be between 1 and 150 characters",
    )
}

pub fn validate_display_name(display_name: &str) -> AppResult<()> {
    check_length(
        display_name,
        DISPLAY_NAME_MAX_CHARS,
        "Display name must be between 1 and 30 characters",
    )
}

/// Clamp an identity-provider supplied name into the display name bounds
pub fn truncate_display_name(name: &str) -> String {
    name.chars().take(DISPLAY_NAME_MAX_CHARS).collect()
}
