//! Typed API errors and the status/code classification table.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;
use ts_rs::TS;
use utils::response::{ErrorPayload, ResponseMeta};

pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Key used for issues that do not point at a specific field.
pub const FORM_FIELD: &str = "form";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApiErrorKind {
    Validation,
    Unauthenticated,
    NotFound,
    Conflict,
    RateLimited,
    Timeout,
    ProviderError,
    Network,
    Parse,
    Http,
    Unknown,
}

/// Map a server error code to a kind. Codes are matched case-insensitively.
fn kind_for_code(code: &str) -> Option<ApiErrorKind> {
    let kind = match code.to_ascii_uppercase().as_str() {
        "VALIDATION_ERROR" => ApiErrorKind::Validation,
        "UNAUTHENTICATED" | "UNAUTHORIZED" => ApiErrorKind::Unauthenticated,
        "NOT_FOUND" | "PLANT_NOT_FOUND" | "WATERING_PLAN_NOT_FOUND" => ApiErrorKind::NotFound,
        "CONFLICT" | "DUPLICATE_PLANT" | "PLAN_CONFLICT" => ApiErrorKind::Conflict,
        "AI_RATE_LIMITED" | "RATE_LIMITED" => ApiErrorKind::RateLimited,
        "AI_TIMEOUT" | "TIMEOUT" => ApiErrorKind::Timeout,
        "AI_PROVIDER_ERROR" | "PROVIDER_ERROR" => ApiErrorKind::ProviderError,
        _ => return None,
    };
    Some(kind)
}

fn kind_for_status(status: u16) -> ApiErrorKind {
    match status {
        400 | 422 => ApiErrorKind::Validation,
        401 | 403 => ApiErrorKind::Unauthenticated,
        404 => ApiErrorKind::NotFound,
        409 => ApiErrorKind::Conflict,
        429 => ApiErrorKind::RateLimited,
        408 | 504 => ApiErrorKind::Timeout,
        400..=599 => ApiErrorKind::Http,
        _ => ApiErrorKind::Unknown,
    }
}

/// Explicit code mapping first, then the status range, then `Unknown`.
pub fn classify(status: Option<u16>, code: Option<&str>) -> ApiErrorKind {
    if let Some(kind) = code.and_then(kind_for_code) {
        return kind;
    }
    status.map(kind_for_status).unwrap_or(ApiErrorKind::Unknown)
}

/// A single issue from a schema validator (`details.issues[]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub path: String,
    pub message: String,
}

/// The shapes `error.details` is known to take, parsed once at the boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorDetails {
    FieldErrors(FieldErrors),
    Issues(Vec<Issue>),
    RateLimit { unlock_at: DateTime<Utc> },
    Other(serde_json::Value),
}

#[derive(Deserialize)]
struct FieldErrorsShape {
    #[serde(rename = "fieldErrors", alias = "field_errors")]
    field_errors: FieldErrors,
}

#[derive(Deserialize)]
struct IssuesShape {
    issues: Vec<IssueShape>,
}

#[derive(Deserialize)]
struct IssueShape {
    #[serde(default)]
    path: Option<IssuePath>,
    message: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IssuePath {
    Joined(String),
    Segments(Vec<PathSegment>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PathSegment {
    Key(String),
    Index(u64),
}

#[derive(Deserialize)]
struct RateLimitShape {
    #[serde(alias = "unlockAt")]
    unlock_at: DateTime<Utc>,
}

impl IssuePath {
    fn join(self) -> String {
        match self {
            IssuePath::Joined(path) => path,
            IssuePath::Segments(segments) => segments
                .into_iter()
                .map(|segment| match segment {
                    PathSegment::Key(key) => key,
                    PathSegment::Index(index) => index.to_string(),
                })
                .collect::<Vec<_>>()
                .join("."),
        }
    }
}

impl ErrorDetails {
    pub fn parse(value: serde_json::Value) -> Self {
        if let Ok(shape) = serde_json::from_value::<FieldErrorsShape>(value.clone()) {
            return ErrorDetails::FieldErrors(shape.field_errors);
        }
        if let Ok(shape) = serde_json::from_value::<IssuesShape>(value.clone()) {
            let issues = shape
                .issues
                .into_iter()
                .map(|issue| Issue {
                    path: issue.path.map(IssuePath::join).unwrap_or_default(),
                    message: issue.message,
                })
                .collect();
            return ErrorDetails::Issues(issues);
        }
        if let Ok(shape) = serde_json::from_value::<RateLimitShape>(value.clone()) {
            return ErrorDetails::RateLimit {
                unlock_at: shape.unlock_at,
            };
        }
        ErrorDetails::Other(value)
    }

    /// Field errors keyed by field name; issues without a path land under [`FORM_FIELD`].
    pub fn field_errors(&self) -> Option<FieldErrors> {
        match self {
            ErrorDetails::FieldErrors(errors) => Some(errors.clone()),
            ErrorDetails::Issues(issues) => {
                let mut errors = FieldErrors::new();
                for issue in issues {
                    let field = if issue.path.is_empty() {
                        FORM_FIELD.to_string()
                    } else {
                        issue.path.clone()
                    };
                    errors.entry(field).or_default().push(issue.message.clone());
                }
                Some(errors)
            }
            _ => None,
        }
    }
}

/// A failed API call, classified once and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} error ({code}): {message}")]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub kind: ApiErrorKind,
    pub status: Option<u16>,
    pub request_id: Option<String>,
    pub field_errors: Option<FieldErrors>,
    pub details: Option<ErrorDetails>,
    /// When a rate limit lifts, from `meta.unlock_at` or the error details.
    pub unlock_at: Option<DateTime<Utc>>,
}

impl ApiError {
    fn bare(kind: ApiErrorKind, code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            kind,
            status: None,
            request_id: None,
            field_errors: None,
            details: None,
            unlock_at: None,
        }
    }

    /// Build the error for an envelope whose `error` member is set.
    pub fn from_payload(
        status: u16,
        payload: ErrorPayload,
        meta: Option<&ResponseMeta>,
        request_id: Option<String>,
    ) -> Self {
        let kind = classify(Some(status), Some(&payload.code));
        let details = payload.details.map(ErrorDetails::parse);
        let field_errors = details.as_ref().and_then(ErrorDetails::field_errors);
        let unlock_at = meta.and_then(|m| m.unlock_at).or(match &details {
            Some(ErrorDetails::RateLimit { unlock_at }) => Some(*unlock_at),
            _ => None,
        });

        Self {
            code: payload.code,
            message: payload.message,
            kind,
            status: Some(status),
            request_id,
            field_errors,
            details,
            unlock_at,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::bare(ApiErrorKind::Network, "NETWORK_ERROR", message)
    }

    pub fn timeout() -> Self {
        Self::bare(ApiErrorKind::Timeout, "TIMEOUT", "the request timed out")
    }

    pub fn parse(message: impl Into<String>, status: Option<u16>, request_id: Option<String>) -> Self {
        Self {
            status,
            request_id,
            ..Self::bare(ApiErrorKind::Parse, "PARSE_ERROR", message)
        }
    }

    /// Local validation failure, raised before any request is sent.
    pub fn validation(message: impl Into<String>, field_errors: FieldErrors) -> Self {
        Self {
            field_errors: Some(field_errors),
            ..Self::bare(ApiErrorKind::Validation, "VALIDATION_ERROR", message)
        }
    }

    /// Whether repeating the same action could succeed. Nothing retries on its
    /// own; this only decides whether a retry affordance is shown.
    pub fn is_retryable(&self) -> bool {
        match self.kind {
            ApiErrorKind::Network
            | ApiErrorKind::Timeout
            | ApiErrorKind::ProviderError
            | ApiErrorKind::Parse
            | ApiErrorKind::RateLimited => true,
            ApiErrorKind::Http => self.status.is_some_and(|s| s >= 500),
            _ => false,
        }
    }
}
