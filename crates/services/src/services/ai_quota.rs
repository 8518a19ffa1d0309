//! Client for `GET /api/ai/quota`.

use models::models::ai::AiQuota;

use super::{
    api_client::{ApiClient, ApiResponse},
    api_error::ApiError,
};

#[derive(Debug, Clone)]
pub struct AiQuotaClient {
    api: ApiClient,
}

impl AiQuotaClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn get(&self) -> Result<ApiResponse<AiQuota>, ApiError> {
        self.api.get("/api/ai/quota").await
    }
}

#[cfg(test)]
mod tests {
    use axum::{Json, Router, routing::get};
    use serde_json::json;

    use super::*;
    use crate::services::{config::ClientConfig, test_support::spawn_server};

    #[tokio::test]
    async fn test_get_quota() {
        let router = Router::new().route(
            "/api/ai/quota",
            get(|| async {
                Json(json!({
                    "data": {
                        "limit": 5, "used": 5, "remaining": 0, "window_seconds": 3600,
                        "unlock_at": "2026-05-01T10:00:00Z", "is_rate_limited": true
                    },
                    "meta": { "request_id": "q-1", "response_time_budget_ms": 200 }
                }))
            }),
        );
        let base_url = spawn_server(router).await;
        let client = AiQuotaClient::new(
            ApiClient::new(&ClientConfig {
                base_url,
                ..Default::default()
            })
            .unwrap(),
        );
        let quota = client.get().await.unwrap();
        assert!(quota.data.is_rate_limited);
        assert_eq!(quota.request_id.as_deref(), Some("q-1"));
        assert_eq!(quota.meta.unwrap().response_time_budget_ms, Some(200));
    }
}
