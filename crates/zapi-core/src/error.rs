//! Error types for ZAPI operations.
//!
//! This module provides the error taxonomy shared by every ZAPI call and the
//! classifier that turns a failed response body into an inspectable error.
//!
//! The classifier only ever sees the response body. Deciding whether an error
//! really means "the entity does not exist" is left to resource-specific code,
//! which matches on the message text (see [`Error::message_contains`]).

use crate::mapping::MappingError;
use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Main error type for ZAPI operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// The appliance could not be reached
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The call exceeded the configured timeout
    #[error("Timeout waiting for ZAPI: {0}")]
    Timeout(String),

    /// HTTP request failed below the protocol level
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    /// Non-success status with a plain-text body
    #[error("HTTP {status} :: {body}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Raw response text
        body: String,
    },

    /// Non-success status with a structured error payload
    #[error("{0}")]
    Api(ApiError),

    /// Non-success status with a JSON body that is not an error payload
    #[error("{reason}\n{body}")]
    MalformedErrorBody {
        /// Why decoding failed
        reason: String,
        /// Raw response text
        body: String,
    },

    /// Failed to encode a request or decode a response
    #[error("Failed to parse ZAPI payload: {0}")]
    ParseError(String),

    /// Conversion between transfer and domain objects failed
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Invalid endpoint
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Specialized result type for ZAPI operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Structured error payload returned by the appliance.
///
/// Both fields are optional on the wire; a missing or empty `description`
/// means the message is reported on its own.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ApiError {
    /// Primary error message
    #[serde(default)]
    pub message: String,
    /// Descriptive prefix naming the failed operation
    #[serde(default)]
    pub description: Option<String>,
}

impl ApiError {
    /// Create a payload carrying only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            description: None,
        }
    }

    /// Attach the descriptive prefix.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.description.as_deref() {
            Some(description) if !description.is_empty() => {
                write!(f, "{description} failed: {}", self.message)
            }
            _ => f.write_str(&self.message),
        }
    }
}

impl Error {
    /// Returns the error code for this error type.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Timeout(_) => "TIMEOUT",
            Self::HttpError(_) => "HTTP_ERROR",
            Self::Http { .. } => "HTTP_STATUS",
            Self::Api(_) => "API_ERROR",
            Self::MalformedErrorBody { .. } => "MALFORMED_ERROR_BODY",
            Self::ParseError(_) => "PARSE_ERROR",
            Self::Mapping(_) => "MAPPING_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::InvalidEndpoint(_) => "INVALID_ENDPOINT",
        }
    }

    /// Returns the structured payload when the appliance sent one.
    #[must_use]
    pub const fn api_error(&self) -> Option<&ApiError> {
        match self {
            Self::Api(payload) => Some(payload),
            _ => None,
        }
    }

    /// Returns true if the rendered message contains `phrase` (case-sensitive).
    ///
    /// The appliance reports missing entities through the same channel as real
    /// failures, so callers recognise them by the literal server text.
    #[must_use]
    pub fn message_contains(&self, phrase: &str) -> bool {
        self.to_string().contains(phrase)
    }

    /// Returns true for failures that never reached the appliance's API layer.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnavailable(_) | Self::Timeout(_) | Self::HttpError(_)
        )
    }
}

/// Classify the body of a failed response.
///
/// An empty body is not an error. A body that does not decode as an
/// [`ApiError`] yields [`Error::MalformedErrorBody`] carrying the raw text.
#[must_use]
pub fn classify(body: &[u8]) -> Option<Error> {
    if body.is_empty() {
        return None;
    }

    match serde_json::from_slice::<ApiError>(body) {
        Ok(payload) => Some(Error::Api(payload)),
        Err(err) => Some(Error::MalformedErrorBody {
            reason: err.to_string(),
            body: String::from_utf8_lossy(body).into_owned(),
        }),
    }
}

// Conversions from external error types
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::ServiceUnavailable(err.to_string())
        } else {
            Self::HttpError(err.to_string())
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidEndpoint(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::ParseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ConfigError(format!("Invalid configuration: {err}"))
    }
}
