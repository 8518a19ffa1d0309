//! Editable watering-plan draft and its conversion into a set command.

use chrono::NaiveDate;
use models::models::watering_plan::{
    OverduePolicy, ScheduleBasis, SetWateringPlanCommand, StartFrom, WateringPlan,
    WateringPlanConfig, WateringPlanSource,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use ts_rs::TS;
use uuid::Uuid;

use super::{api_error::FieldErrors, view_models::AiSuggestionState};

pub const MIN_INTERVAL_DAYS: i32 = 1;
pub const MAX_INTERVAL_DAYS: i32 = 365;
pub const MIN_HORIZON_DAYS: i32 = 1;
pub const MAX_HORIZON_DAYS: i32 = 365;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct WateringPlanFormValues {
    pub interval_days: i32,
    pub horizon_days: i32,
    pub schedule_basis: ScheduleBasis,
    pub start_from: StartFrom,
    pub custom_start_on: Option<NaiveDate>,
    pub overdue_policy: OverduePolicy,
}

/// Defaults for a plan entered by hand.
impl Default for WateringPlanFormValues {
    fn default() -> Self {
        Self {
            interval_days: 7,
            horizon_days: 90,
            schedule_basis: ScheduleBasis::DueOn,
            start_from: StartFrom::Today,
            custom_start_on: None,
            overdue_policy: OverduePolicy::CarryForward,
        }
    }
}

impl From<&WateringPlanConfig> for WateringPlanFormValues {
    fn from(config: &WateringPlanConfig) -> Self {
        Self {
            interval_days: config.interval_days,
            horizon_days: config.horizon_days,
            schedule_basis: config.schedule_basis,
            start_from: config.start_from,
            custom_start_on: config.custom_start_on,
            overdue_policy: config.overdue_policy,
        }
    }
}

/// The AI suggestion a draft was seeded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionOrigin {
    pub ai_request_id: Uuid,
    pub suggested: WateringPlanConfig,
}

impl SuggestionOrigin {
    pub fn from_state(state: &AiSuggestionState) -> Option<Self> {
        match state {
            AiSuggestionState::Available {
                plan,
                ai_request_id,
                ..
            } => Some(Self {
                ai_request_id: *ai_request_id,
                suggested: *plan,
            }),
            _ => None,
        }
    }
}

impl WateringPlanFormValues {
    pub fn from_plan(plan: &WateringPlan) -> Self {
        Self::from(&plan.config)
    }

    /// Form values for a suggestion, or the manual defaults when none is available.
    pub fn from_suggestion_state(state: &AiSuggestionState) -> Self {
        match state {
            AiSuggestionState::Available { plan, .. } => Self::from(plan),
            _ => Self::default(),
        }
    }

    /// Check the draft and normalise it into a plan config.
    pub fn validate(&self) -> Result<WateringPlanConfig, FieldErrors> {
        let mut errors = FieldErrors::new();

        if !(MIN_INTERVAL_DAYS..=MAX_INTERVAL_DAYS).contains(&self.interval_days) {
            errors.entry("interval_days".to_string()).or_default().push(format!(
                "must be between {MIN_INTERVAL_DAYS} and {MAX_INTERVAL_DAYS} days"
            ));
        }
        if !(MIN_HORIZON_DAYS..=MAX_HORIZON_DAYS).contains(&self.horizon_days) {
            errors.entry("horizon_days".to_string()).or_default().push(format!(
                "must be between {MIN_HORIZON_DAYS} and {MAX_HORIZON_DAYS} days"
            ));
        }
        let custom_start_on = match self.start_from {
            StartFrom::CustomDate => {
                if self.custom_start_on.is_none() {
                    errors
                        .entry("custom_start_on".to_string())
                        .or_default()
                        .push("required when starting from a custom date".to_string());
                }
                self.custom_start_on
            }
            // a leftover date from a previous choice is dropped
            StartFrom::Today | StartFrom::PurchaseDate => None,
        };

        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(WateringPlanConfig {
            interval_days: self.interval_days,
            horizon_days: self.horizon_days,
            schedule_basis: self.schedule_basis,
            start_from: self.start_from,
            custom_start_on,
            overdue_policy: self.overdue_policy,
        })
    }

    /// Source to record for this draft: `ai` when seeded from a suggestion,
    /// noting whether the user kept every suggested value.
    pub fn source(&self, origin: Option<&SuggestionOrigin>) -> WateringPlanSource {
        match origin {
            Some(origin) => WateringPlanSource::Ai {
                ai_request_id: origin.ai_request_id,
                accepted_without_changes: self.validate().is_ok_and(|c| c == origin.suggested),
            },
            None => WateringPlanSource::Manual,
        }
    }

    pub fn to_command(
        &self,
        source: Option<WateringPlanSource>,
    ) -> Result<SetWateringPlanCommand, FieldErrors> {
        Ok(SetWateringPlanCommand {
            config: self.validate()?,
            source: resolve_source(source),
        })
    }
}

/// A command without a source is recorded as manual rather than rejected.
pub fn resolve_source(source: Option<WateringPlanSource>) -> WateringPlanSource {
    source.unwrap_or_else(|| {
        warn!("watering plan saved without a source, recording it as manual");
        WateringPlanSource::Manual
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> SuggestionOrigin {
        SuggestionOrigin {
            ai_request_id: Uuid::new_v4(),
            suggested: WateringPlanFormValues::default().validate().unwrap(),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(WateringPlanFormValues::default().validate().is_ok());
    }

    #[test]
    fn test_custom_start_requires_date() {
        let values = WateringPlanFormValues {
            start_from: StartFrom::CustomDate,
            ..Default::default()
        };
        let errors = values.validate().unwrap_err();
        assert!(errors.contains_key("custom_start_on"));
    }

    #[test]
    fn test_leftover_custom_date_is_dropped() {
        let values = WateringPlanFormValues {
            start_from: StartFrom::Today,
            custom_start_on: NaiveDate::from_ymd_opt(2026, 6, 1),
            ..Default::default()
        };
        assert_eq!(values.validate().unwrap().custom_start_on, None);
    }

    #[test]
    fn test_out_of_range_values_report_each_field() {
        let values = WateringPlanFormValues {
            interval_days: 0,
            horizon_days: 400,
            ..Default::default()
        };
        let errors = values.validate().unwrap_err();
        assert!(errors.contains_key("interval_days"));
        assert!(errors.contains_key("horizon_days"));
    }

    #[test]
    fn test_source_tracks_unchanged_suggestion() {
        let origin = origin();
        let unchanged = WateringPlanFormValues::from(&origin.suggested);
        assert_eq!(
            unchanged.source(Some(&origin)),
            WateringPlanSource::Ai {
                ai_request_id: origin.ai_request_id,
                accepted_without_changes: true,
            }
        );

        let edited = WateringPlanFormValues {
            interval_days: 10,
            ..unchanged
        };
        assert_eq!(
            edited.source(Some(&origin)),
            WateringPlanSource::Ai {
                ai_request_id: origin.ai_request_id,
                accepted_without_changes: false,
            }
        );
        assert_eq!(edited.source(None), WateringPlanSource::Manual);
    }

    #[test]
    fn test_missing_source_defaults_to_manual() {
        let command = WateringPlanFormValues::default().to_command(None).unwrap();
        assert_eq!(command.source, WateringPlanSource::Manual);
    }
}
