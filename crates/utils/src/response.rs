//! Uniform `{ data, error, meta }` envelope returned by every Plant Planner API route.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use ts_rs::TS;

/// Error object carried inside an envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub details: Option<serde_json::Value>,
}

/// Response metadata. Every field is optional; routes fill in what they know.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
pub struct ResponseMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub request_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub response_time_budget_ms: Option<u64>,
    /// When a rate-limited caller may try again.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub unlock_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub total: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct ApiEnvelope<T> {
    pub data: Option<T>,
    pub error: Option<ErrorPayload>,
    pub meta: Option<ResponseMeta>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EnvelopeContractError {
    #[error("envelope carries neither data nor error")]
    Empty,
    #[error("envelope carries both data and error")]
    Ambiguous,
}

/// The terminal outcome of an envelope once the data/error invariant is checked.
#[derive(Debug, Clone, PartialEq)]
pub enum EnvelopeBody<T> {
    Data(T),
    Error(ErrorPayload),
}

impl<T> ApiEnvelope<T> {
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            meta: None,
        }
    }

    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            data: None,
            error: Some(ErrorPayload {
                code: code.into(),
                message: message.into(),
                details: None,
            }),
            meta: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        if let Some(error) = self.error.as_mut() {
            error.details = Some(details);
        }
        self
    }

    pub fn with_meta(mut self, meta: ResponseMeta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Split the envelope into its body and metadata, enforcing that exactly
    /// one of `data`/`error` is present.
    pub fn into_body(self) -> Result<(EnvelopeBody<T>, Option<ResponseMeta>), EnvelopeContractError> {
        match (self.data, self.error) {
            (Some(data), None) => Ok((EnvelopeBody::Data(data), self.meta)),
            (None, Some(error)) => Ok((EnvelopeBody::Error(error), self.meta)),
            (None, None) => Err(EnvelopeContractError::Empty),
            (Some(_), Some(_)) => Err(EnvelopeContractError::Ambiguous),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_body_rejects_empty_envelope() {
        let envelope: ApiEnvelope<serde_json::Value> =
            serde_json::from_str(r#"{"data": null, "error": null}"#).unwrap();
        assert_eq!(envelope.into_body().unwrap_err(), EnvelopeContractError::Empty);
    }

    #[test]
    fn test_into_body_rejects_missing_fields() {
        let envelope: ApiEnvelope<serde_json::Value> = serde_json::from_str("{}").unwrap();
        assert_eq!(envelope.into_body().unwrap_err(), EnvelopeContractError::Empty);
    }

    #[test]
    fn test_into_body_rejects_both_present() {
        let envelope: ApiEnvelope<u32> = serde_json::from_str(
            r#"{"data": 1, "error": {"code": "X", "message": "boom"}}"#,
        )
        .unwrap();
        assert_eq!(
            envelope.into_body().unwrap_err(),
            EnvelopeContractError::Ambiguous
        );
    }

    #[test]
    fn test_error_envelope_keeps_meta() {
        let envelope: ApiEnvelope<u32> = serde_json::from_str(
            r#"{
                "data": null,
                "error": {"code": "AI_RATE_LIMITED", "message": "slow down"},
                "meta": {"request_id": "req-1", "unlock_at": "2026-01-01T10:00:00Z"}
            }"#,
        )
        .unwrap();
        let (body, meta) = envelope.into_body().unwrap();
        let meta = meta.unwrap();
        assert_eq!(meta.request_id.as_deref(), Some("req-1"));
        assert!(meta.unlock_at.is_some());
        match body {
            EnvelopeBody::Error(error) => assert_eq!(error.code, "AI_RATE_LIMITED"),
            EnvelopeBody::Data(_) => panic!("expected error body"),
        }
    }
}
