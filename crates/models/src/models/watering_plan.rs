use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Which date the next watering is computed from
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ScheduleBasis {
    /// Next task is due `interval_days` after the previous due date
    #[default]
    DueOn,
    /// Next task is due `interval_days` after the previous completion
    CompletedOn,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StartFrom {
    #[default]
    Today,
    PurchaseDate,
    CustomDate,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OverduePolicy {
    /// Overdue tasks stay in place until completed
    #[default]
    CarryForward,
    /// Overdue tasks are moved to today
    Reschedule,
}

/// The schedule fields shared by plans, suggestions and set commands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
pub struct WateringPlanConfig {
    pub interval_days: i32,
    pub horizon_days: i32,
    pub schedule_basis: ScheduleBasis,
    pub start_from: StartFrom,
    pub custom_start_on: Option<NaiveDate>,
    pub overdue_policy: OverduePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct WateringPlan {
    pub id: Uuid,
    pub plant_id: Uuid,
    #[serde(flatten)]
    #[ts(flatten)]
    pub config: WateringPlanConfig,
    pub is_active: bool,
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
    pub was_ai_suggested: bool,
    pub was_ai_accepted_without_changes: Option<bool>,
    pub ai_request_id: Option<Uuid>,
}

/// Where the values of a plan being saved came from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WateringPlanSource {
    Ai {
        ai_request_id: Uuid,
        accepted_without_changes: bool,
    },
    Manual,
}

/// Request body for `PUT /api/plants/:id/watering-plan`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct SetWateringPlanCommand {
    #[serde(flatten)]
    #[ts(flatten)]
    pub config: WateringPlanConfig,
    pub source: WateringPlanSource,
}

/// Summary of the watering tasks the server rebuilt after a plan change
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct TasksRegenerated {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub count: u32,
}

/// Response body for `PUT /api/plants/:id/watering-plan`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct SetWateringPlanResult {
    pub plan: WateringPlan,
    #[serde(default)]
    pub tasks_regenerated: Option<TasksRegenerated>,
}
