use crate::errors::AppError;
use crate::models::interaction::InteractionType;

/// Upper bound on stored note length, in characters.
pub const MAX_NOTES_CHARS: usize = 2000;

/// Parses a raw interaction type against the closed set.
pub fn parse_interaction_type(raw: &str) -> Result<InteractionType, AppError> {
    raw.trim()
        .parse::<InteractionType>()
        .map_err(|_| AppError::InvalidInteractionType(raw.to_string()))
}

/// Trims notes; blank notes become `None`.
pub fn normalize_notes(notes: Option<String>) -> Result<Option<String>, AppError> {
    let Some(notes) = notes else {
        return Ok(None);
    };
    let trimmed = notes.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > MAX_NOTES_CHARS {
        return Err(AppError::InvalidInput(format!(
            "notes must be at most {MAX_NOTES_CHARS} characters"
        )));
    }
    Ok(Some(trimmed.to_string()))
}
