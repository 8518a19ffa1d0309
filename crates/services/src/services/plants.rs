//! Client for `/api/plants`.

use async_trait::async_trait;
use models::models::plant::{
    CreatePlantCommand, CreatePlantResult, ListPlantsQuery, Plant, PlantListItem, PlantPage,
};
use reqwest::Method;
use uuid::Uuid;

use super::{
    api_client::{ApiClient, ApiResponse},
    api_error::ApiError,
};

/// The plant calls the async operations depend on.
#[async_trait]
pub trait PlantsApi: Send + Sync {
    async fn list_plants(&self, query: &ListPlantsQuery) -> Result<ApiResponse<PlantPage>, ApiError>;

    async fn create_plant(
        &self,
        command: &CreatePlantCommand,
    ) -> Result<ApiResponse<CreatePlantResult>, ApiError>;

    async fn delete_plant(&self, plant_id: Uuid) -> Result<ApiResponse<()>, ApiError>;
}

#[derive(Debug, Clone)]
pub struct PlantsClient {
    api: ApiClient,
}

impl PlantsClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn get(&self, plant_id: Uuid) -> Result<ApiResponse<Plant>, ApiError> {
        self.api.get(&format!("/api/plants/{plant_id}")).await
    }
}

#[async_trait]
impl PlantsApi for PlantsClient {
    async fn list_plants(&self, query: &ListPlantsQuery) -> Result<ApiResponse<PlantPage>, ApiError> {
        let response = self
            .api
            .get_with_query::<Vec<PlantListItem>, _>("/api/plants", query)
            .await?;
        let meta = response.meta.clone().unwrap_or_default();
        Ok(response.map(|items| PlantPage {
            items,
            page: meta.page.unwrap_or(query.page),
            limit: meta.limit.unwrap_or(query.limit),
            total: meta.total,
        }))
    }

    async fn create_plant(
        &self,
        command: &CreatePlantCommand,
    ) -> Result<ApiResponse<CreatePlantResult>, ApiError> {
        self.api.send_json(Method::POST, "/api/plants", command).await
    }

    async fn delete_plant(&self, plant_id: Uuid) -> Result<ApiResponse<()>, ApiError> {
        let request = self
            .api
            .request(Method::DELETE, &format!("/api/plants/{plant_id}"))?;
        self.api.execute_empty(request).await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        Json, Router,
        extract::{Path, Query},
        http::StatusCode,
        response::IntoResponse,
        routing::{delete, get},
    };
    use serde_json::json;

    use super::*;
    use crate::services::{
        api_error::ApiErrorKind, config::ClientConfig, test_support::spawn_server,
    };

    async fn client_for(router: Router) -> PlantsClient {
        let base_url = spawn_server(router).await;
        PlantsClient::new(
            ApiClient::new(&ClientConfig {
                base_url,
                ..Default::default()
            })
            .unwrap(),
        )
    }

    #[tokio::test]
    async fn test_list_sends_query_and_reads_pagination_meta() {
        let router = Router::new().route(
            "/api/plants",
            get(|Query(params): Query<HashMap<String, String>>| async move {
                Json(json!({
                    "data": [{
                        "id": "5f0c7a8e-8a8d-4c3e-9a3b-2f9c1a6d7e10",
                        "species_name": params.get("q").cloned().unwrap_or_default(),
                        "duplicate_index": 0,
                        "nickname": null,
                        "photo_path": null,
                        "next_due_on": "2026-05-03",
                        "has_watering_plan": true,
                        "created_at": "2026-05-01T09:00:00Z"
                    }],
                    "error": null,
                    "meta": {
                        "request_id": format!("sort={}", params.get("sort").cloned().unwrap_or_default()),
                        "page": 1,
                        "limit": 20,
                        "total": 41
                    }
                }))
            }),
        );
        let client = client_for(router).await;

        let page = client
            .list_plants(&ListPlantsQuery::search("mon"))
            .await
            .unwrap();
        assert_eq!(page.request_id.as_deref(), Some("sort=species_name"));
        assert_eq!(page.data.items[0].species_name, "mon");
        assert_eq!(page.data.total, Some(41));
    }

    #[tokio::test]
    async fn test_delete_accepts_no_content_and_envelope() {
        let router = Router::new().route(
            "/api/plants/{id}",
            delete(|Path(id): Path<String>| async move {
                if id.starts_with('0') {
                    StatusCode::NO_CONTENT.into_response()
                } else {
                    Json(json!({ "data": { "id": id } })).into_response()
                }
            }),
        );
        let client = client_for(router).await;

        client.delete_plant(Uuid::nil()).await.unwrap();
        client
            .delete_plant(Uuid::parse_str("5f0c7a8e-8a8d-4c3e-9a3b-2f9c1a6d7e10").unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_plant_is_not_found() {
        let router = Router::new().route(
            "/api/plants/{id}",
            get(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "data": null, "error": { "code": "PLANT_NOT_FOUND", "message": "Plant not found" } })),
                )
            }),
        );
        let client = client_for(router).await;
        let err = client.get(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.kind, ApiErrorKind::NotFound);
        assert_eq!(err.message, "Plant not found");
    }
}
