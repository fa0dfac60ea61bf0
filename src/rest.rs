use crate::api::{ApiError, ApiResult, CredentialProvider, ThoughtApi};
use crate::models::{NewThought, PageResponse, Room, Thought, UserRef, ViewQuery};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// REST-backed persistence collaborator. Every request carries the bearer
/// credential from the injected provider; a missing credential is rejected
/// locally as an authentication failure without touching the network.
pub struct RestThoughtApi {
    client: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl RestThoughtApi {
    pub fn new(base_url: impl Into<String>, credentials: Arc<dyn CredentialProvider>) -> ApiResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build http client: {}", e)))?;
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Ok(Self {
            client,
            base_url,
            credentials,
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> ApiResult<reqwest::RequestBuilder> {
        let token = self.credentials.bearer_token().ok_or(ApiError::Status {
            status: 401,
            message: Some("no bearer credential available".to_string()),
        })?;
        Ok(request.bearer_auth(token))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> ApiResult<reqwest::Response> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Status {
            status: status.as_u16(),
            message: extract_message(&body),
        })
    }

    fn thoughts_url(&self) -> String {
        format!("{}/api/thoughts", self.base_url)
    }
}

/// Pulls the server's structured `message` field out of an error body. A
/// body that is not JSON (proxy HTML, empty) yields no message, which the
/// core classifies as a connectivity failure rather than a validation one.
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string)
}

#[async_trait]
impl ThoughtApi for RestThoughtApi {
    async fn fetch_page(&self, query: &ViewQuery, size: u32) -> ApiResult<PageResponse> {
        let mut params: Vec<(&str, String)> = vec![
            ("page", query.page.to_string()),
            ("size", size.to_string()),
        ];
        if let Some(tag) = query.filter.tag() {
            params.push(("tag", tag.to_string()));
        }
        if let Some(room_id) = query.scope.room_id() {
            params.push(("roomId", room_id.to_string()));
        }

        let request = self.authorize(self.client.get(self.thoughts_url()).query(&params))?;
        self.send(request)
            .await?
            .json::<PageResponse>()
            .await
            .map_err(|e| ApiError::Network(format!("invalid page response: {}", e)))
    }

    async fn create_thought(&self, payload: &NewThought) -> ApiResult<Thought> {
        let request = self.authorize(self.client.post(self.thoughts_url()).json(payload))?;
        self.send(request)
            .await?
            .json::<Thought>()
            .await
            .map_err(|e| ApiError::Network(format!("invalid create response: {}", e)))
    }

    async fn update_thought(&self, thought: &Thought) -> ApiResult<Thought> {
        let url = format!("{}/{}", self.thoughts_url(), thought.id);
        let request = self.authorize(self.client.put(url).json(thought))?;
        self.send(request)
            .await?
            .json::<Thought>()
            .await
            .map_err(|e| ApiError::Network(format!("invalid update response: {}", e)))
    }

    async fn delete_thought(&self, id: i64) -> ApiResult<()> {
        let url = format!("{}/{}", self.thoughts_url(), id);
        let request = self.authorize(self.client.delete(url))?;
        self.send(request).await?;
        Ok(())
    }

    async fn migrate_tag(&self, old_tag: &str, new_tag: &str) -> ApiResult<()> {
        let url = format!("{}/tags/migrate", self.thoughts_url());
        let request = self.authorize(
            self.client
                .put(url)
                .query(&[("oldTag", old_tag), ("newTag", new_tag)]),
        )?;
        self.send(request).await?;
        Ok(())
    }

    async fn room_members(&self, room_id: i64) -> ApiResult<Vec<UserRef>> {
        let url = format!("{}/api/rooms/{}/members", self.base_url, room_id);
        let request = self.authorize(self.client.get(url))?;
        self.send(request)
            .await?
            .json::<Vec<UserRef>>()
            .await
            .map_err(|e| ApiError::Network(format!("invalid members response: {}", e)))
    }

    async fn list_rooms(&self) -> ApiResult<Vec<Room>> {
        let url = format!("{}/api/rooms", self.base_url);
        let request = self.authorize(self.client.get(url))?;
        self.send(request)
            .await?
            .json::<Vec<Room>>()
            .await
            .map_err(|e| ApiError::Network(format!("invalid rooms response: {}", e)))
    }
}
