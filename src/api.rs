use crate::models::{NewThought, PageResponse, Room, Thought, UserRef, ViewQuery};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Failure of a single remote call, before it is classified into the core's
/// error taxonomy.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("network failure: {0}")]
    Network(String),
    #[error("status {status}: {message:?}")]
    Status { status: u16, message: Option<String> },
}

pub type ApiResult<T> = Result<T, ApiError>;

/// The persistence collaborator. The core issues calls and reconciles
/// results; it never interprets transport details.
#[async_trait]
pub trait ThoughtApi: Send + Sync {
    async fn fetch_page(&self, query: &ViewQuery, size: u32) -> ApiResult<PageResponse>;
    async fn create_thought(&self, payload: &NewThought) -> ApiResult<Thought>;
    /// Full-record replace; the server is authoritative for every field of
    /// the returned record.
    async fn update_thought(&self, thought: &Thought) -> ApiResult<Thought>;
    async fn delete_thought(&self, id: i64) -> ApiResult<()>;
    /// Bulk reassignment of every record carrying `old_tag`, system-wide.
    async fn migrate_tag(&self, old_tag: &str, new_tag: &str) -> ApiResult<()>;
    async fn room_members(&self, room_id: i64) -> ApiResult<Vec<UserRef>>;
    /// The rooms the authenticated user has joined.
    async fn list_rooms(&self) -> ApiResult<Vec<Room>>;
}

/// Supplies the bearer credential attached to every persistence request.
/// Injected rather than read from ambient storage so the core stays testable.
pub trait CredentialProvider: Send + Sync {
    fn bearer_token(&self) -> Option<String>;
}

impl CredentialProvider for String {
    fn bearer_token(&self) -> Option<String> {
        Some(self.clone())
    }
}

pub type PushHandler = Arc<dyn Fn(&str) + Send + Sync>;

/// The push-transport collaborator. Reconnection is its responsibility; the
/// core only re-subscribes when the active scope changes.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn subscribe(&self, topic: &str, handler: PushHandler) -> ApiResult<Box<dyn Subscription>>;
}

/// Handle for one live subscription. Dropping without `unsubscribe` leaks the
/// remote registration until the transport disconnects.
#[async_trait]
pub trait Subscription: Send + Sync {
    async fn unsubscribe(&self);
}
