use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use super::watering_plan::WateringPlanConfig;

/// Context sent to the suggestion provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct SuggestionContext {
    pub species_name: String,
}

/// Request body for `POST /api/plants/:id/watering-plan/suggest`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct SuggestWateringPlanCommand {
    pub context: SuggestionContext,
}

impl SuggestWateringPlanCommand {
    pub fn for_species(species_name: impl Into<String>) -> Self {
        Self {
            context: SuggestionContext {
                species_name: species_name.into(),
            },
        }
    }
}

/// Response body for `POST /api/plants/:id/watering-plan/suggest`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct WateringPlanSuggestion {
    pub ai_request_id: Uuid,
    pub suggestion: WateringPlanConfig,
    pub explanation: Option<String>,
}

/// Outcome of the suggestion the server attempted while creating a plant
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CreationSuggestion {
    Available {
        ai_request_id: Uuid,
        suggestion: WateringPlanConfig,
        explanation: Option<String>,
    },
    RateLimited {
        unlock_at: Option<DateTime<Utc>>,
    },
    Timeout,
    ProviderError,
    Skipped {
        reason: String,
    },
    Error {
        message: String,
    },
}

/// Response body for `GET /api/ai/quota`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct AiQuota {
    pub limit: u32,
    pub used: u32,
    pub remaining: u32,
    pub window_seconds: u32,
    pub unlock_at: Option<DateTime<Utc>>,
    pub is_rate_limited: bool,
}
