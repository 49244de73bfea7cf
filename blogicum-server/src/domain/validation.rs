use super::DomainError;

pub const MAX_CHAR_LENGTH: usize = 256;
pub const MAX_USERNAME_LENGTH: usize = 150;
pub const MAX_PERSON_NAME_LENGTH: usize = 150;
pub const MAX_EMAIL_LENGTH: usize = 254;

pub fn require_non_empty(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::ValidationError(format!(
            "{} cannot be empty",
            field
        )));
    }
    Ok(())
}

pub fn require_max_length(field: &str, value: &str, max: usize) -> Result<(), DomainError> {
    if value.chars().count() > max {
        return Err(DomainError::ValidationError(format!(
            "{} must be at most {} characters",
            field, max
        )));
    }
    Ok(())
}

pub fn require_short_text(field: &str, value: &str) -> Result<(), DomainError> {
    require_non_empty(field, value)?;
    require_max_length(field, value, MAX_CHAR_LENGTH)
}

pub fn validate_username(username: &str) -> Result<(), DomainError> {
    require_non_empty("Username", username)?;
    require_max_length("Username", username, MAX_USERNAME_LENGTH)
}

pub fn validate_email(email: &str) -> Result<(), DomainError> {
    require_non_empty("Email", email)?;
    require_max_length("Email", email, MAX_EMAIL_LENGTH)
}

/// First and last names may be empty.
pub fn validate_person_name(field: &str, name: &str) -> Result<(), DomainError> {
    require_max_length(field, name, MAX_PERSON_NAME_LENGTH)
}
