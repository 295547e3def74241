use std::{fmt, io};

use http::status::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc::error::SendError as TokioSendError;

use serde_json::Error as JsonError;

use crate::event::PlanEvent;

/// How the data-fetching layer should respond to a failure.
///
/// `Auth`, `Forbidden`, and `NotFound` are terminal: retrying cannot heal an
/// expired session, a missing entitlement, or a vanished record, and looping
/// on them turns one hiccup into an infinite refetch. `Transient` covers
/// network and 5xx failures that are worth a bounded number of retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
pub enum ErrorClass {
    Auth,
    Forbidden,
    NotFound,
    Transient,
}

/// UI-facing failure kinds for mutating operations (deletes in particular),
/// parsed from the same message text the retry classification reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, uniffi::Enum)]
pub enum UiErrorKind {
    Permission,
    NotFound,
    /// The request was well-formed but rejected by a business rule, e.g.
    /// "lesson used in 3 other plans". The message is surfaced verbatim so
    /// the UI can show the count.
    Validation,
    Other,
}

/// Classify an error's message text for the retry layer.
///
/// The remote API exposes no structured status field; HTTP-like markers are
/// embedded in the message text, so classification is substring matching.
/// This is a compatibility constraint of the remote API.
pub fn classify_message(message: &str) -> ErrorClass {
    if message.contains("401") || message.contains("Authentication") {
        ErrorClass::Auth
    } else if message.contains("403") || message.contains("Forbidden") {
        ErrorClass::Forbidden
    } else if message.contains("404") || message.contains("not found") {
        ErrorClass::NotFound
    } else {
        ErrorClass::Transient
    }
}

/// Classify an error's message text for UI surfacing.
pub fn classify_ui_message(message: &str) -> UiErrorKind {
    if message.contains("403") || message.contains("Forbidden") {
        UiErrorKind::Permission
    } else if message.contains("404") || message.contains("not found") {
        UiErrorKind::NotFound
    } else if message.contains("400") || message.contains("validation") {
        UiErrorKind::Validation
    } else {
        UiErrorKind::Other
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum StudiaError {
    #[error("401 Authentication required")]
    Auth,
    #[error("403 Forbidden: not entitled to modify this resource")]
    Forbidden,
    #[error("404 not found: {0}")]
    NotFound(String),
    #[error("400 validation rejected: {0}")]
    Validation(String),
    #[error("Remote call failed: {0}")]
    Remote(String),
    #[error("Invalid command: {0}")]
    Command(String),
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
    #[error("File System error: {0}")]
    Io(String),
}

impl StudiaError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            StudiaError::Auth => StatusCode::UNAUTHORIZED,
            StudiaError::Forbidden => StatusCode::FORBIDDEN,
            StudiaError::NotFound(_) => StatusCode::NOT_FOUND,
            StudiaError::Validation(_) => StatusCode::BAD_REQUEST,
            StudiaError::Remote(_) => StatusCode::BAD_GATEWAY,
            StudiaError::Command(_) => StatusCode::BAD_REQUEST,
            StudiaError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            StudiaError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Retry-layer classification of this error.
    ///
    /// Deliberately routed through the rendered message rather than the
    /// variant: the remote API contract is message text with embedded status
    /// markers, and both sides of the boundary must agree on its reading.
    pub fn classification(&self) -> ErrorClass {
        classify_message(&self.to_string())
    }

    /// UI-facing classification of this error.
    pub fn ui_kind(&self) -> UiErrorKind {
        classify_ui_message(&self.to_string())
    }
}

impl From<toml::de::Error> for StudiaError {
    fn from(src: toml::de::Error) -> StudiaError {
        StudiaError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for StudiaError {
    fn from(src: toml::ser::Error) -> StudiaError {
        StudiaError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for StudiaError {
    fn from(src: JsonError) -> StudiaError {
        StudiaError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<uuid::Error> for StudiaError {
    fn from(src: uuid::Error) -> StudiaError {
        StudiaError::Serialization(format!("UUID conversion failed: {src}"))
    }
}

impl From<io::Error> for StudiaError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => StudiaError::NotFound(format!("{x}")),
            io::ErrorKind::PermissionDenied => StudiaError::Forbidden,
            _ => StudiaError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<fmt::Error> for StudiaError {
    fn from(x: fmt::Error) -> Self {
        StudiaError::Serialization(format!("{x}"))
    }
}

impl From<TokioSendError<PlanEvent>> for StudiaError {
    fn from(x: TokioSendError<PlanEvent>) -> Self {
        StudiaError::Io(format!(
            "Channel update send Error, could not transmit state update event {:?}",
            x.0
        ))
    }
}
