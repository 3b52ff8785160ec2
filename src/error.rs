use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotekeeperError {
    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Validation failed for field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl NotekeeperError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        NotekeeperError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl From<rusqlite::Error> for NotekeeperError {
    fn from(e: rusqlite::Error) -> Self {
        NotekeeperError::Storage(format!("SQLite error: {}", e))
    }
}

impl From<figment::Error> for NotekeeperError {
    fn from(e: figment::Error) -> Self {
        NotekeeperError::Config(e.to_string())
    }
}

impl From<argon2::password_hash::Error> for NotekeeperError {
    fn from(e: argon2::password_hash::Error) -> Self {
        NotekeeperError::PasswordHash(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NotekeeperError>;
