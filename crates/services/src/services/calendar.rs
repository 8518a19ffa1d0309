//! Client for the watering calendar routes.

use chrono::NaiveDate;
use models::models::calendar::{CalendarDay, CalendarMonth, CalendarStatusFilter};
use serde::Serialize;

use super::{
    api_client::{ApiClient, ApiResponse},
    api_error::ApiError,
};

#[derive(Debug, Serialize)]
struct MonthQuery<'a> {
    month: &'a str,
    status: CalendarStatusFilter,
}

#[derive(Debug, Serialize)]
struct DayQuery {
    date: NaiveDate,
    status: CalendarStatusFilter,
}

#[derive(Debug, Clone)]
pub struct CalendarClient {
    api: ApiClient,
}

impl CalendarClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// `month` is `YYYY-MM`.
    pub async fn month(
        &self,
        month: &str,
        status: CalendarStatusFilter,
    ) -> Result<ApiResponse<CalendarMonth>, ApiError> {
        if !is_year_month(month) {
            return Err(ApiError::validation(
                format!("invalid month {month:?}, expected YYYY-MM"),
                [("month".to_string(), vec!["expected YYYY-MM".to_string()])].into(),
            ));
        }
        self.api
            .get_with_query("/api/calendar/month", &MonthQuery { month, status })
            .await
    }

    pub async fn day(
        &self,
        date: NaiveDate,
        status: CalendarStatusFilter,
    ) -> Result<ApiResponse<CalendarDay>, ApiError> {
        self.api
            .get_with_query("/api/calendar/day", &DayQuery { date, status })
            .await
    }
}

fn is_year_month(value: &str) -> bool {
    NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d").is_ok() && value.len() == 7
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{Json, Router, extract::Query, routing::get};
    use serde_json::json;

    use super::*;
    use crate::services::{
        api_error::ApiErrorKind, config::ClientConfig, test_support::spawn_server,
    };

    async fn client() -> CalendarClient {
        let router = Router::new()
            .route(
                "/api/calendar/month",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    Json(json!({ "data": {
                        "month": q["month"],
                        "days": [{ "date": format!("{}-03", q["month"]), "count": 2 }]
                    } }))
                }),
            )
            .route(
                "/api/calendar/day",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    Json(json!({ "data": { "date": q["date"], "items": [] },
                                 "meta": { "request_id": q["status"] } }))
                }),
            );
        let base_url = spawn_server(router).await;
        CalendarClient::new(
            ApiClient::new(&ClientConfig {
                base_url,
                ..Default::default()
            })
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_month_and_day() {
        let client = client().await;

        let month = client.month("2026-05", CalendarStatusFilter::Pending).await.unwrap();
        assert_eq!(month.data.days[0].count, 2);

        let date = NaiveDate::from_ymd_opt(2026, 5, 3).unwrap();
        let day = client.day(date, CalendarStatusFilter::All).await.unwrap();
        assert_eq!(day.data.date, date);
        assert_eq!(day.request_id.as_deref(), Some("all"));
    }

    #[tokio::test]
    async fn test_bad_month_is_rejected_locally() {
        let client = client().await;
        let err = client.month("May 2026", CalendarStatusFilter::All).await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::Validation);
        assert!(err.field_errors.unwrap().contains_key("month"));
    }
}
