//! UI-state unions and the pure mappers that build them from DTOs and errors.
//!
//! Nothing in here performs I/O. Every mapper is total over [`ApiErrorKind`]:
//! kinds without a dedicated variant fall back to a generic error that keeps
//! the original message and request id.

use chrono::{DateTime, NaiveDate, Utc};
use models::models::{
    ai::{AiQuota, CreationSuggestion, WateringPlanSuggestion},
    plant::{PlantListItem, PlantPage, display_name},
    watering_plan::{TasksRegenerated, WateringPlan, WateringPlanConfig},
};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::api_error::{ApiError, ApiErrorKind, FieldErrors};

/// Generic presentation of an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ErrorVm {
    pub kind: ApiErrorKind,
    pub title: String,
    pub message: String,
    pub request_id: Option<String>,
    pub can_retry: bool,
}

impl From<&ApiError> for ErrorVm {
    fn from(error: &ApiError) -> Self {
        Self {
            kind: error.kind,
            title: error_title(error.kind).to_string(),
            message: error.message.clone(),
            request_id: error.request_id.clone(),
            can_retry: error.is_retryable(),
        }
    }
}

fn error_title(kind: ApiErrorKind) -> &'static str {
    match kind {
        ApiErrorKind::Validation => "Some fields need attention",
        ApiErrorKind::Unauthenticated => "Please sign in again",
        ApiErrorKind::NotFound => "Not found",
        ApiErrorKind::Conflict => "Conflicting change",
        ApiErrorKind::RateLimited => "Too many requests",
        ApiErrorKind::Timeout => "The request timed out",
        ApiErrorKind::ProviderError => "Suggestion service unavailable",
        ApiErrorKind::Network => "Connection problem",
        ApiErrorKind::Parse => "Unexpected server response",
        ApiErrorKind::Http | ApiErrorKind::Unknown => "Something went wrong",
    }
}

impl std::fmt::Display for ErrorVm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.message)?;
        if let Some(request_id) = &self.request_id {
            write!(f, " (request id: {request_id})")?;
        }
        Ok(())
    }
}

/// State of an AI watering-plan suggestion. Exactly one variant at a time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AiSuggestionState {
    #[default]
    Idle,
    Loading,
    Available {
        plan: WateringPlanConfig,
        explanation: Option<String>,
        ai_request_id: Uuid,
    },
    RateLimited {
        unlock_at: Option<DateTime<Utc>>,
        message: String,
        request_id: Option<String>,
    },
    Timeout {
        message: String,
        request_id: Option<String>,
    },
    ProviderError {
        message: String,
        request_id: Option<String>,
    },
    Unauthenticated {
        message: String,
        request_id: Option<String>,
    },
    NotFound {
        message: String,
        request_id: Option<String>,
    },
    UnknownError {
        message: String,
        request_id: Option<String>,
    },
    Skipped {
        reason: String,
    },
}

impl AiSuggestionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AiSuggestionState::Idle | AiSuggestionState::Loading)
    }
}

pub fn suggestion_to_state(dto: &WateringPlanSuggestion) -> AiSuggestionState {
    AiSuggestionState::Available {
        plan: dto.suggestion,
        explanation: dto.explanation.clone(),
        ai_request_id: dto.ai_request_id,
    }
}

pub fn suggestion_error_to_state(error: &ApiError) -> AiSuggestionState {
    let message = error.message.clone();
    let request_id = error.request_id.clone();
    match error.kind {
        ApiErrorKind::RateLimited => AiSuggestionState::RateLimited {
            unlock_at: error.unlock_at,
            message,
            request_id,
        },
        ApiErrorKind::Timeout => AiSuggestionState::Timeout { message, request_id },
        ApiErrorKind::ProviderError => AiSuggestionState::ProviderError { message, request_id },
        ApiErrorKind::Unauthenticated => AiSuggestionState::Unauthenticated { message, request_id },
        ApiErrorKind::NotFound => AiSuggestionState::NotFound { message, request_id },
        ApiErrorKind::Validation
        | ApiErrorKind::Conflict
        | ApiErrorKind::Network
        | ApiErrorKind::Parse
        | ApiErrorKind::Http
        | ApiErrorKind::Unknown => AiSuggestionState::UnknownError { message, request_id },
    }
}

/// Map the suggestion the server attempted while creating a plant.
pub fn creation_suggestion_to_state(
    dto: &CreationSuggestion,
    request_id: Option<String>,
) -> AiSuggestionState {
    match dto {
        CreationSuggestion::Available {
            ai_request_id,
            suggestion,
            explanation,
        } => AiSuggestionState::Available {
            plan: *suggestion,
            explanation: explanation.clone(),
            ai_request_id: *ai_request_id,
        },
        CreationSuggestion::RateLimited { unlock_at } => AiSuggestionState::RateLimited {
            unlock_at: *unlock_at,
            message: "AI suggestion limit reached".to_string(),
            request_id,
        },
        CreationSuggestion::Timeout => AiSuggestionState::Timeout {
            message: "The suggestion took too long".to_string(),
            request_id,
        },
        CreationSuggestion::ProviderError => AiSuggestionState::ProviderError {
            message: "The suggestion service failed".to_string(),
            request_id,
        },
        CreationSuggestion::Skipped { reason } => AiSuggestionState::Skipped {
            reason: reason.clone(),
        },
        CreationSuggestion::Error { message } => AiSuggestionState::UnknownError {
            message: message.clone(),
            request_id,
        },
    }
}

/// One row of the plant list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct PlantCardVm {
    pub id: Uuid,
    pub display_name: String,
    pub species_name: String,
    pub next_due_on: Option<NaiveDate>,
    pub has_watering_plan: bool,
    pub href: String,
}

impl From<&PlantListItem> for PlantCardVm {
    fn from(item: &PlantListItem) -> Self {
        Self {
            id: item.id,
            display_name: display_name(
                &item.species_name,
                item.duplicate_index,
                item.nickname.as_deref(),
            ),
            species_name: item.species_name.clone(),
            next_due_on: item.next_due_on,
            has_watering_plan: item.has_watering_plan,
            href: format!("/plants/{}", item.id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlantListState {
    #[default]
    Idle,
    Loading {
        query: String,
    },
    Loaded {
        query: String,
        items: Vec<PlantCardVm>,
        total: Option<u32>,
    },
    Empty {
        query: String,
    },
    Error(ErrorVm),
}

pub fn plant_page_to_state(query: &str, page: &PlantPage) -> PlantListState {
    if page.items.is_empty() {
        return PlantListState::Empty {
            query: query.to_string(),
        };
    }
    PlantListState::Loaded {
        query: query.to_string(),
        items: page.items.iter().map(PlantCardVm::from).collect(),
        total: page.total,
    }
}

pub fn plant_list_error_to_state(error: &ApiError) -> PlantListState {
    PlantListState::Error(error.into())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlanSaveState {
    #[default]
    Idle,
    Saving,
    Saved {
        plan: WateringPlan,
        tasks_regenerated: Option<TasksRegenerated>,
    },
    Invalid {
        message: String,
        field_errors: FieldErrors,
    },
    Error(ErrorVm),
}

pub fn plan_save_error_to_state(error: &ApiError) -> PlanSaveState {
    match error.kind {
        ApiErrorKind::Validation => PlanSaveState::Invalid {
            message: error.message.clone(),
            field_errors: error.field_errors.clone().unwrap_or_default(),
        },
        _ => PlanSaveState::Error(error.into()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlantDeleteState {
    #[default]
    Idle,
    Deleting {
        plant_id: Uuid,
    },
    Deleted {
        plant_id: Uuid,
    },
    Error(ErrorVm),
}

pub fn plant_delete_error_to_state(error: &ApiError) -> PlantDeleteState {
    PlantDeleteState::Error(error.into())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, Default)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CreatePlantState {
    #[default]
    Idle,
    Submitting,
    Created {
        plant_id: Uuid,
        redirect_to: String,
        suggestion: AiSuggestionState,
    },
    Invalid {
        message: String,
        field_errors: FieldErrors,
    },
    Error(ErrorVm),
}

pub fn create_plant_error_to_state(error: &ApiError) -> CreatePlantState {
    match error.kind {
        ApiErrorKind::Validation => CreatePlantState::Invalid {
            message: error.message.clone(),
            field_errors: error.field_errors.clone().unwrap_or_default(),
        },
        _ => CreatePlantState::Error(error.into()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct QuotaVm {
    pub remaining: u32,
    pub limit: u32,
    pub is_rate_limited: bool,
    pub unlock_at: Option<DateTime<Utc>>,
    pub label: String,
}

impl From<&AiQuota> for QuotaVm {
    fn from(quota: &AiQuota) -> Self {
        let is_rate_limited = quota.is_rate_limited || quota.remaining == 0;
        let label = match (is_rate_limited, quota.unlock_at) {
            (true, Some(unlock_at)) => {
                format!("No suggestions left until {}", unlock_at.format("%H:%M UTC"))
            }
            (true, None) => "No suggestions left".to_string(),
            (false, _) => format!("{} of {} suggestions left", quota.remaining, quota.limit),
        };
        Self {
            remaining: quota.remaining,
            limit: quota.limit,
            is_rate_limited,
            unlock_at: quota.unlock_at,
            label,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::services::test_support::{sample_config, sample_list_item};

    fn error(kind: ApiErrorKind) -> ApiError {
        ApiError {
            code: "X".to_string(),
            message: format!("{kind} happened"),
            kind,
            status: Some(500),
            request_id: Some("req-1".to_string()),
            field_errors: None,
            details: None,
            unlock_at: None,
        }
    }

    #[test]
    fn test_suggestion_error_mapping_is_total() {
        use ApiErrorKind::*;
        for kind in [
            Validation, Unauthenticated, NotFound, Conflict, RateLimited, Timeout, ProviderError,
            Network, Parse, Http, Unknown,
        ] {
            let state = suggestion_error_to_state(&error(kind));
            assert!(state.is_terminal(), "{kind}");
            assert!(!matches!(state, AiSuggestionState::Available { .. }));
        }
    }

    #[test]
    fn test_unmapped_kind_keeps_message_and_request_id() {
        let state = suggestion_error_to_state(&error(ApiErrorKind::Conflict));
        assert_eq!(
            state,
            AiSuggestionState::UnknownError {
                message: "conflict happened".to_string(),
                request_id: Some("req-1".to_string()),
            }
        );
    }

    #[test]
    fn test_rate_limited_uses_unlock_at() {
        let unlock_at = Utc.with_ymd_and_hms(2026, 5, 1, 10, 0, 0).unwrap();
        let mut err = error(ApiErrorKind::RateLimited);
        err.unlock_at = Some(unlock_at);
        match suggestion_error_to_state(&err) {
            AiSuggestionState::RateLimited { unlock_at: got, .. } => assert_eq!(got, Some(unlock_at)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_creation_suggestion_available() {
        let id = Uuid::new_v4();
        let state = creation_suggestion_to_state(
            &CreationSuggestion::Available {
                ai_request_id: id,
                suggestion: sample_config(),
                explanation: Some("likes it moist".to_string()),
            },
            None,
        );
        assert_eq!(
            state,
            AiSuggestionState::Available {
                plan: sample_config(),
                explanation: Some("likes it moist".to_string()),
                ai_request_id: id,
            }
        );
    }

    #[test]
    fn test_suggestion_state_serializes_with_status_tag() {
        let json = serde_json::to_value(AiSuggestionState::Skipped {
            reason: "ai_disabled".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], "ai_disabled");
    }

    #[test]
    fn test_empty_page_is_empty_state() {
        let page = PlantPage {
            items: vec![],
            page: 1,
            limit: 20,
            total: Some(0),
        };
        assert_eq!(
            plant_page_to_state("fern", &page),
            PlantListState::Empty {
                query: "fern".to_string()
            }
        );
    }

    #[test]
    fn test_plant_card_href_and_name() {
        let mut item = sample_list_item("Ficus");
        item.duplicate_index = 2;
        let card = PlantCardVm::from(&item);
        assert_eq!(card.display_name, "Ficus #3");
        assert_eq!(card.href, format!("/plants/{}", item.id));
    }

    #[test]
    fn test_plan_save_validation_becomes_invalid() {
        let mut err = error(ApiErrorKind::Validation);
        err.field_errors = Some([("interval_days".to_string(), vec!["too big".to_string()])].into());
        match plan_save_error_to_state(&err) {
            PlanSaveState::Invalid { field_errors, .. } => {
                assert_eq!(field_errors["interval_days"], vec!["too big".to_string()])
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            plan_save_error_to_state(&error(ApiErrorKind::Network)),
            PlanSaveState::Error(ErrorVm { can_retry: true, .. })
        ));
    }

    #[test]
    fn test_quota_vm_reports_rate_limit() {
        let quota = AiQuota {
            limit: 5,
            used: 5,
            remaining: 0,
            window_seconds: 3600,
            unlock_at: Some(Utc.with_ymd_and_hms(2026, 5, 1, 10, 30, 0).unwrap()),
            is_rate_limited: false,
        };
        let vm = QuotaVm::from(&quota);
        assert!(vm.is_rate_limited);
        assert_eq!(vm.label, "No suggestions left until 10:30 UTC");
    }

    #[test]
    fn test_error_vm_display_includes_request_id() {
        let vm = ErrorVm::from(&error(ApiErrorKind::Timeout));
        assert_eq!(
            vm.to_string(),
            "The request timed out: timeout happened (request id: req-1)"
        );
    }
}
