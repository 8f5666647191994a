//! Typed authentication failures.

use thiserror::Error;

/// Machine-checkable classification of an [`AuthError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorKind {
    NotAuthorized,
    UserNotFound,
    UserNotConfirmed,
    InvalidParameter,
    Network,
    Unknown,
}

/// Normalized authentication error across all provider failure paths.
///
/// Credential failures carry fixed generic messages so callers never learn
/// which field was wrong. `InvalidParameter` passes the provider (or field
/// validation) text through verbatim; it is the only developer-facing kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Incorrect email or password.")]
    NotAuthorized,
    #[error("No account found with this email.")]
    UserNotFound,
    #[error("Please confirm your email before signing in.")]
    UserNotConfirmed,
    #[error("{0}")]
    InvalidParameter(String),
    #[error("Network error. Please try again.")]
    Network,
    #[error("{0}")]
    Unknown(String),
}

const FALLBACK_MESSAGE: &str = "Something went wrong. Please try again.";

impl AuthError {
    /// Build an `Unknown` error, falling back to a generic message when the
    /// provider supplied none.
    pub fn unknown(message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| FALLBACK_MESSAGE.to_string());
        Self::Unknown(message)
    }

    /// Translate a provider failure category plus raw message into the
    /// matching error. Unrecognized categories map to [`AuthError::Unknown`].
    pub fn from_category(category: &str, message: Option<String>) -> Self {
        match category {
            "NotAuthorizedException" => Self::NotAuthorized,
            "UserNotFoundException" => Self::UserNotFound,
            "UserNotConfirmedException" => Self::UserNotConfirmed,
            "InvalidParameterException" => {
                Self::InvalidParameter(message.unwrap_or_else(|| FALLBACK_MESSAGE.to_string()))
            }
            "NetworkError" => Self::Network,
            _ => Self::unknown(message),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> AuthErrorKind {
        match self {
            Self::NotAuthorized => AuthErrorKind::NotAuthorized,
            Self::UserNotFound => AuthErrorKind::UserNotFound,
            Self::UserNotConfirmed => AuthErrorKind::UserNotConfirmed,
            Self::InvalidParameter(_) => AuthErrorKind::InvalidParameter,
            Self::Network => AuthErrorKind::Network,
            Self::Unknown(_) => AuthErrorKind::Unknown,
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(_: reqwest::Error) -> Self {
        Self::Network
    }
}
