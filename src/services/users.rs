use std::sync::Arc;

use async_trait::async_trait;

use super::user_api::{User, UserApi, UserFormData, UserPatch};
use crate::constants::API_ENDPOINTS;
use crate::error::ErrorInfo;
use crate::fetch::{ApiClient, BasicClient, HttpClient, RequestDescriptor};

/// [`UserApi`] over an [`ApiClient`].
pub struct UserService<C = BasicClient> {
    client: Arc<ApiClient<C>>,
}

impl<C> Clone for UserService<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl<C: HttpClient> UserService<C> {
    pub fn new(client: Arc<ApiClient<C>>) -> Self {
        Self { client }
    }

    fn user_path(id: &str) -> Result<String, ErrorInfo> {
        if id.trim().is_empty() {
            return Err(ErrorInfo::new("User id must not be empty"));
        }
        Ok(format!("{}/{}", API_ENDPOINTS.users, id))
    }

    fn body<T: serde::Serialize>(req: RequestDescriptor, body: &T) -> Result<RequestDescriptor, ErrorInfo> {
        req.json(body).map_err(ErrorInfo::from)
    }
}

#[async_trait]
impl<C: HttpClient> UserApi for UserService<C> {
    async fn list_users(&self) -> Result<Vec<User>, ErrorInfo> {
        self.client
            .request_json(RequestDescriptor::get(API_ENDPOINTS.users))
            .await
    }

    async fn get_user(&self, id: &str) -> Result<User, ErrorInfo> {
        let path = Self::user_path(id)?;
        self.client.request_json(RequestDescriptor::get(path)).await
    }

    async fn create_user(&self, data: &UserFormData) -> Result<User, ErrorInfo> {
        let req = Self::body(RequestDescriptor::post(API_ENDPOINTS.users), data)?;
        self.client.request_json(req).await
    }

    async fn update_user(&self, id: &str, patch: &UserPatch) -> Result<User, ErrorInfo> {
        let req = Self::body(RequestDescriptor::put(Self::user_path(id)?), patch)?;
        self.client.request_json(req).await
    }

    async fn delete_user(&self, id: &str) -> Result<(), ErrorInfo> {
        let path = Self::user_path(id)?;
        self.client.request(RequestDescriptor::delete(path)).await?;
        Ok(())
    }
}
