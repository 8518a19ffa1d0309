use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct SignInCommand {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct SignUpCommand {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct SignInResult {
    pub user: AuthUser,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct SignUpResult {
    pub user: Option<AuthUser>,
    #[serde(default)]
    pub requires_email_confirmation: bool,
}
