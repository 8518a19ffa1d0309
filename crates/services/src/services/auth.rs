//! Client for `/api/auth`. Session cookies set by the server land in the
//! shared cookie jar of [`ApiClient`].

use models::models::auth::{SignInCommand, SignInResult, SignUpCommand, SignUpResult};
use reqwest::Method;
use tracing::info;

use super::{
    api_client::{ApiClient, ApiResponse},
    api_error::ApiError,
};

#[derive(Debug, Clone)]
pub struct AuthClient {
    api: ApiClient,
}

impl AuthClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub async fn sign_in(&self, command: &SignInCommand) -> Result<ApiResponse<SignInResult>, ApiError> {
        let response: ApiResponse<SignInResult> = self
            .api
            .send_json(Method::POST, "/api/auth/sign-in", command)
            .await?;
        info!(user_id = %response.data.user.id, "signed in");
        Ok(response)
    }

    pub async fn sign_up(&self, command: &SignUpCommand) -> Result<ApiResponse<SignUpResult>, ApiError> {
        self.api
            .send_json(Method::POST, "/api/auth/sign-up", command)
            .await
    }

    pub async fn sign_out(&self) -> Result<ApiResponse<()>, ApiError> {
        let request = self.api.request(Method::POST, "/api/auth/sign-out")?;
        self.api.execute_empty(request).await
    }
}
