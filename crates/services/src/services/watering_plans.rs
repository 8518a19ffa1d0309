//! Client for `/api/plants/:id/watering-plan` and its AI suggestion route.

use std::time::Duration;

use async_trait::async_trait;
use models::models::{
    ai::{SuggestWateringPlanCommand, WateringPlanSuggestion},
    watering_plan::{SetWateringPlanCommand, SetWateringPlanResult, WateringPlan},
};
use reqwest::Method;
use tracing::info;
use uuid::Uuid;

use super::{
    api_client::{ApiClient, ApiResponse},
    api_error::{ApiError, ApiErrorKind},
};

/// Code the API uses when a plant exists but has no active plan yet.
const PLAN_NOT_FOUND_CODE: &str = "WATERING_PLAN_NOT_FOUND";

#[async_trait]
pub trait WateringPlansApi: Send + Sync {
    /// The active plan, or `None` when the plant has none yet.
    async fn get_plan(&self, plant_id: Uuid) -> Result<ApiResponse<Option<WateringPlan>>, ApiError>;

    async fn set_plan(
        &self,
        plant_id: Uuid,
        command: &SetWateringPlanCommand,
    ) -> Result<ApiResponse<SetWateringPlanResult>, ApiError>;

    async fn suggest(
        &self,
        plant_id: Uuid,
        command: &SuggestWateringPlanCommand,
    ) -> Result<ApiResponse<WateringPlanSuggestion>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct WateringPlansClient {
    api: ApiClient,
    suggestion_timeout: Duration,
}

impl WateringPlansClient {
    pub fn new(api: ApiClient, suggestion_timeout: Duration) -> Self {
        Self {
            api,
            suggestion_timeout,
        }
    }

    fn path(plant_id: Uuid) -> String {
        format!("/api/plants/{plant_id}/watering-plan")
    }
}

#[async_trait]
impl WateringPlansApi for WateringPlansClient {
    async fn get_plan(&self, plant_id: Uuid) -> Result<ApiResponse<Option<WateringPlan>>, ApiError> {
        match self.api.get::<WateringPlan>(&Self::path(plant_id)).await {
            Ok(response) => Ok(response.map(Some)),
            Err(e) if e.kind == ApiErrorKind::NotFound && e.code == PLAN_NOT_FOUND_CODE => {
                Ok(ApiResponse {
                    data: None,
                    request_id: e.request_id,
                    meta: None,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn set_plan(
        &self,
        plant_id: Uuid,
        command: &SetWateringPlanCommand,
    ) -> Result<ApiResponse<SetWateringPlanResult>, ApiError> {
        self.api
            .send_json(Method::PUT, &Self::path(plant_id), command)
            .await
    }

    async fn suggest(
        &self,
        plant_id: Uuid,
        command: &SuggestWateringPlanCommand,
    ) -> Result<ApiResponse<WateringPlanSuggestion>, ApiError> {
        let request = self
            .api
            .request(Method::POST, &format!("{}/suggest", Self::path(plant_id)))?
            .timeout(self.suggestion_timeout)
            .json(command);
        let response = self.api.execute::<WateringPlanSuggestion>(request).await?;
        info!(
            plant_id = %plant_id,
            ai_request_id = %response.data.ai_request_id,
            "watering plan suggestion received"
        );
        Ok(response)
    }
}
