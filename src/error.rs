// src/error.rs
//! Application error types with structured error handling.
//!
//! Error types form the vocabulary for failure modes in the relay.
//! Each variant tells what went wrong and where: a missing credential,
//! a rejected input, or an upstream failure whose status and body are
//! kept verbatim for the caller.

use crate::properties::PropertyError;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Notion API error codes as a typed vocabulary.
///
/// Instead of matching against magic strings like `"rate_limited"`,
/// the domain vocabulary is encoded in the type system. Each variant
/// tells you exactly what the Notion API reported and enables
/// pattern-based recovery without stringly-typed dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotionErrorCode {
    /// API rate limit exceeded; back off and retry
    RateLimited,
    /// The requested object does not exist or is inaccessible
    ObjectNotFound,
    /// API key is invalid or expired
    Unauthorized,
    /// API key lacks permission for this resource
    RestrictedResource,
    /// Request body contains invalid JSON
    InvalidJson,
    /// Request parameters failed Notion's validation
    ValidationFailed,
    /// Conflict with current state of the resource
    Conflict,
    /// Notion internal server error
    InternalError,
    /// Notion is temporarily unavailable
    ServiceUnavailable,
    /// HTTP status code fallback when the error body is unparseable
    HttpStatus(u16),
    /// An error code this client doesn't recognize yet
    Unknown(String),
}

impl NotionErrorCode {
    /// Parse a Notion API error code string into the typed vocabulary.
    pub fn from_api_response(code: &str) -> Self {
        match code {
            "rate_limited" => Self::RateLimited,
            "object_not_found" => Self::ObjectNotFound,
            "unauthorized" => Self::Unauthorized,
            "restricted_resource" => Self::RestrictedResource,
            "invalid_json" => Self::InvalidJson,
            "validation_error" => Self::ValidationFailed,
            "conflict_error" => Self::Conflict,
            "internal_server_error" => Self::InternalError,
            "service_unavailable" => Self::ServiceUnavailable,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Create from an HTTP status code when the error body is unparseable.
    pub fn from_http_status(status: u16) -> Self {
        Self::HttpStatus(status)
    }

    /// Whether this error means the resource simply doesn't exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ObjectNotFound | Self::HttpStatus(404))
    }

    /// Whether the integration is not allowed to see the resource.
    pub fn is_access_denied(&self) -> bool {
        matches!(
            self,
            Self::Unauthorized | Self::RestrictedResource | Self::HttpStatus(401 | 403)
        )
    }
}

impl fmt::Display for NotionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RateLimited => write!(f, "rate_limited"),
            Self::ObjectNotFound => write!(f, "object_not_found"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::RestrictedResource => write!(f, "restricted_resource"),
            Self::InvalidJson => write!(f, "invalid_json"),
            Self::ValidationFailed => write!(f, "validation_error"),
            Self::Conflict => write!(f, "conflict_error"),
            Self::InternalError => write!(f, "internal_server_error"),
            Self::ServiceUnavailable => write!(f, "service_unavailable"),
            Self::HttpStatus(code) => write!(f, "http_{}", code),
            Self::Unknown(code) => write!(f, "{}", code),
        }
    }
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing Notion token in environment (checked {checked})")]
    MissingCredential { checked: String },

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Notion API error ({status}): {body}")]
    NotionService {
        status: u16,
        code: NotionErrorCode,
        message: String,
        body: String,
        retry_after: Option<Duration>,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid properties payload: {}", describe_property_errors(errors))]
    PropertyMapping { errors: Vec<PropertyError> },

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error(transparent)]
    ValidationError(#[from] crate::types::ValidationError),
}

impl AppError {
    /// Whether the failure is transient upstream pressure worth retrying.
    ///
    /// Only rate limiting and the gateway-style 5xx statuses qualify; every
    /// other upstream answer is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NotionService { status, code, .. } => {
                matches!(status, 429 | 500 | 502 | 503 | 504)
                    || matches!(
                        code,
                        NotionErrorCode::RateLimited | NotionErrorCode::ServiceUnavailable
                    )
            }
            _ => false,
        }
    }

    /// Whether Notion turned the request away before acting on it.
    ///
    /// A 429 is the only answer that proves nothing was applied, so it is the
    /// only one a non-idempotent write may be resent after.
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            AppError::NotionService { status: 429, .. }
                | AppError::NotionService {
                    code: NotionErrorCode::RateLimited,
                    ..
                }
        )
    }

    /// Server-requested wait before the next attempt, when one was sent.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AppError::NotionService { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Projects the error into the structured rejection shown to callers.
    pub fn to_report(&self) -> ErrorReport {
        let mut report = ErrorReport {
            status: "error",
            reason: self.reason(),
            message: self.to_string(),
            status_code: None,
            errors: Vec::new(),
            body: None,
        };
        match self {
            AppError::NotionService { status, body, .. } => {
                report.status_code = Some(*status);
                report.body = Some(body.clone());
            }
            AppError::PropertyMapping { errors } => {
                report.status_code = Some(400);
                report.errors = errors.clone();
            }
            AppError::Validation(_) | AppError::ValidationError(_) => {
                report.status_code = Some(400);
            }
            _ => {}
        }
        report
    }

    fn reason(&self) -> &'static str {
        match self {
            AppError::MissingCredential { .. } => "missing_credential",
            AppError::NetworkFailure(_) => "network_failure",
            AppError::NotionService { .. } => "notion_api_error",
            AppError::MalformedResponse(_) => "malformed_response",
            AppError::Io(_) => "io_error",
            AppError::Validation(_) | AppError::ValidationError(_) => "validation_error",
            AppError::PropertyMapping { .. } => "invalid_properties",
            AppError::InternalError { .. } => "internal_error",
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

fn describe_property_errors(errors: &[PropertyError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.property, e.reason))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Client-facing rejection: a reason string plus whatever makes it actionable.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub status: &'static str,
    pub reason: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<PropertyError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Domain vocabulary for why a database could not be read during a scan.
///
/// Not an error type but a classification of the failure reason,
/// deciding whether the scanner skips the database or gives up.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum DatabaseFetchFailure {
    /// The database is a linked database (Notion API limitation).
    LinkedDatabase,
    /// The integration lacks permission to access this database.
    PermissionDenied { detail: String },
    /// The database was not found.
    NotFound,
    /// Some other failure occurred.
    Other { cause: String },
}

impl DatabaseFetchFailure {
    /// Whether the scan can carry on without this database.
    pub fn is_contained(&self) -> bool {
        !matches!(self, Self::Other { .. })
    }
}

impl std::fmt::Display for DatabaseFetchFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LinkedDatabase => write!(
                f,
                "linked database (Notion API does not support querying linked databases)"
            ),
            Self::PermissionDenied { detail } => write!(f, "permission denied: {}", detail),
            Self::NotFound => write!(f, "database not found"),
            Self::Other { cause } => write!(f, "{}", cause),
        }
    }
}

/// Classifies a database query error into a domain-specific failure reason.
pub fn classify_database_fetch_failure(error: &AppError) -> DatabaseFetchFailure {
    match error {
        AppError::NotionService { code, message, .. } => {
            if message.contains("linked database") {
                DatabaseFetchFailure::LinkedDatabase
            } else if code.is_not_found() {
                DatabaseFetchFailure::NotFound
            } else if code.is_access_denied() {
                DatabaseFetchFailure::PermissionDenied {
                    detail: message.clone(),
                }
            } else {
                DatabaseFetchFailure::Other {
                    cause: error.to_string(),
                }
            }
        }
        _ => DatabaseFetchFailure::Other {
            cause: error.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::properties::MappingReason;

    fn service_error(status: u16, code: &str, message: &str) -> AppError {
        AppError::NotionService {
            status,
            code: NotionErrorCode::from_api_response(code),
            message: message.to_string(),
            body: format!(r#"{{"code":"{}","message":"{}"}}"#, code, message),
            retry_after: None,
        }
    }

    #[test]
    fn test_service_error_keeps_status_and_body() {
        let err = service_error(404, "object_not_found", "Could not find database");
        assert_eq!(
            err.to_string(),
            r#"Notion API error (404): {"code":"object_not_found","message":"Could not find database"}"#
        );
        let report = err.to_report();
        assert_eq!(report.reason, "notion_api_error");
        assert_eq!(report.status_code, Some(404));
        assert!(report.body.unwrap().contains("object_not_found"));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(service_error(429, "rate_limited", "slow down").is_retryable());
        assert!(service_error(502, "bad_gateway", "").is_retryable());
        assert!(!service_error(400, "validation_error", "bad").is_retryable());
        assert!(!service_error(404, "object_not_found", "gone").is_retryable());
        assert!(!AppError::Validation("x".into()).is_retryable());
    }

    #[test]
    fn test_only_rate_limits_count_as_rate_limited() {
        assert!(service_error(429, "rate_limited", "slow down").is_rate_limited());
        assert!(!service_error(502, "bad_gateway", "").is_rate_limited());
        assert!(!service_error(503, "service_unavailable", "").is_rate_limited());
        assert!(!AppError::Validation("x".into()).is_rate_limited());
    }

    #[test]
    fn test_classification() {
        assert_eq!(
            classify_database_fetch_failure(&service_error(404, "object_not_found", "nope")),
            DatabaseFetchFailure::NotFound
        );
        assert_eq!(
            classify_database_fetch_failure(&service_error(403, "restricted_resource", "denied")),
            DatabaseFetchFailure::PermissionDenied {
                detail: "denied".to_string()
            }
        );
        assert_eq!(
            classify_database_fetch_failure(&service_error(
                400,
                "validation_error",
                "is a linked database"
            )),
            DatabaseFetchFailure::LinkedDatabase
        );
        let other = classify_database_fetch_failure(&service_error(500, "internal_server_error", "boom"));
        assert!(!other.is_contained());
    }

    #[test]
    fn test_property_mapping_report_carries_options() {
        let err = AppError::PropertyMapping {
            errors: vec![PropertyError {
                property: "Status".to_string(),
                reason: MappingReason::InvalidOption,
                options: Some(vec!["Todo".to_string(), "Done".to_string()]),
            }],
        };
        assert_eq!(
            err.to_string(),
            "Invalid properties payload: Status: invalid_option"
        );
        let report = serde_json::to_value(err.to_report()).unwrap();
        assert_eq!(report["reason"], "invalid_properties");
        assert_eq!(report["errors"][0]["options"][1], "Done");
    }
}
