use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("User not found")]
    UserNotFound,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Post not found")]
    PostNotFound,

    #[error("Category not found")]
    CategoryNotFound,

    #[error("Location not found")]
    LocationNotFound,

    #[error("Comment not found")]
    CommentNotFound,

    #[error("Page not found")]
    PageNotFound,

    #[error("Category slug already taken: {0}")]
    SlugTaken(String),

    #[error("Forbidden: you don't have permission to perform this action")]
    Forbidden,

    #[error("Authentication required")]
    AuthenticationRequired,

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),
}

impl DomainError {
    pub fn to_status_code(&self) -> u16 {
        match self {
            Self::UserNotFound
            | Self::PostNotFound
            | Self::CategoryNotFound
            | Self::LocationNotFound
            | Self::CommentNotFound
            | Self::PageNotFound => 404,
            Self::UserAlreadyExists | Self::SlugTaken(_) => 409,
            Self::InvalidCredentials | Self::AuthenticationRequired => 401,
            Self::Forbidden => 403,
            Self::ValidationError(_) => 400,
            Self::DatabaseError(_) | Self::StorageError(_) | Self::InternalError(_) => 500,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.to_status_code() == 404
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        Self::DatabaseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_kinds_share_status() {
        for err in [
            DomainError::PostNotFound,
            DomainError::CategoryNotFound,
            DomainError::CommentNotFound,
            DomainError::UserNotFound,
            DomainError::PageNotFound,
        ] {
            assert_eq!(err.to_status_code(), 404);
            assert!(err.is_not_found());
        }
    }

    #[test]
    fn forbidden_and_auth_are_distinct() {
        assert_eq!(DomainError::Forbidden.to_status_code(), 403);
        assert_eq!(DomainError::AuthenticationRequired.to_status_code(), 401);
        assert!(!DomainError::Forbidden.is_not_found());
    }
}
