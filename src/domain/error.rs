use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("unsupported collection `{name}`")]
    UnknownCollection { name: String },
    #[error("invalid language code `{code}`")]
    InvalidLanguage { code: String },
    #[error("domain validation failed: {message}")]
    Validation { message: String },
}

impl DomainError {
    pub fn unknown_collection(name: impl Into<String>) -> Self {
        Self::UnknownCollection { name: name.into() }
    }

    pub fn invalid_language(code: impl Into<String>) -> Self {
        Self::InvalidLanguage { code: code.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}
