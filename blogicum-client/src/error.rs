use thiserror::Error;

#[derive(Debug, Error)]
pub enum BlogicumClientError {
    // HTTP ошибки
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    // Сервер отправил на страницу входа
    #[error("Login required (continue at {next})")]
    LoginRequired { next: String },

    // Прочие перенаправления, например на страницу поста при чужом посте
    #[error("Redirected to {0}")]
    Redirected(String),

    // Бизнес-логика ошибки
    #[error("Resource not found")]
    NotFound,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // Транспортные ошибки
    #[error("Transport error: {0}")]
    TransportError(String),
}

impl BlogicumClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlogicumClientError::NotFound)
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            BlogicumClientError::Unauthorized(_) | BlogicumClientError::LoginRequired { .. }
        )
    }

    /// Ownership failures come back either as 403 or as a redirect to the
    /// post they concern.
    pub fn is_denied(&self) -> bool {
        matches!(
            self,
            BlogicumClientError::Forbidden(_) | BlogicumClientError::Redirected(_)
        )
    }
}
