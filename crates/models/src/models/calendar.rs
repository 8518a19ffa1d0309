use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WateringTaskStatus {
    #[default]
    Pending,
    Completed,
}

/// Filter accepted by the calendar routes
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CalendarStatusFilter {
    #[default]
    Pending,
    Completed,
    All,
}

/// Response body for `GET /api/calendar/month`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct CalendarMonth {
    pub month: String, // YYYY-MM
    pub days: Vec<CalendarMonthDay>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct CalendarMonthDay {
    pub date: NaiveDate,
    pub count: u32,
}

/// Response body for `GET /api/calendar/day`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub items: Vec<CalendarDayItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct CalendarDayItem {
    pub task: WateringTaskSummary,
    pub plant: CalendarPlant,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct WateringTaskSummary {
    pub id: Uuid,
    pub due_on: NaiveDate,
    pub status: WateringTaskStatus,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct CalendarPlant {
    pub id: Uuid,
    pub display_name: String,
    pub nickname: Option<String>,
}
