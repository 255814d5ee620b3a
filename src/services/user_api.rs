//! Trait and types for the backend's `User` resource.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorInfo;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields a client supplies when creating a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFormData {
    pub name: String,
    pub email: String,
}

/// Partial update; unset fields are left out of the request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none()
    }
}

/// CRUD over `/users`.
#[async_trait]
pub trait UserApi: Send + Sync {
    async fn list_users(&self) -> Result<Vec<User>, ErrorInfo>;
    async fn get_user(&self, id: &str) -> Result<User, ErrorInfo>;
    async fn create_user(&self, data: &UserFormData) -> Result<User, ErrorInfo>;
    async fn update_user(&self, id: &str, patch: &UserPatch) -> Result<User, ErrorInfo>;
    async fn delete_user(&self, id: &str) -> Result<(), ErrorInfo>;
}
