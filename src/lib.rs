//! Client-side synchronization core for a shared, tag-and-room-scoped board
//! of thoughts.
//!
//! The hard problem here is not CRUD but keeping a paginated, filtered local
//! view consistent with a remote source of truth: optimistic mutations are
//! applied before the server confirms them, rolled back by reload when it
//! rejects them, and out-of-band push signals invalidate the current page
//! without racing user-triggered loads. Consistency is last-write-wins,
//! reconciled by full re-fetch; nothing is persisted beyond the process.
//!
//! [`SyncCore`] is the entry point. The persistence backend and the push
//! broker are collaborators injected behind [`ThoughtApi`] and
//! [`PushTransport`]; [`RestThoughtApi`] is the stock REST implementation.

pub mod api;
pub mod core;
pub mod errors;
pub mod fetch;
pub mod models;
pub mod mutations;
pub mod realtime;
pub mod rest;
pub mod store;
pub mod tags;
pub mod view;

pub use crate::api::{ApiError, ApiResult, CredentialProvider, PushHandler, PushTransport, Subscription, ThoughtApi};
pub use crate::core::SyncCore;
pub use crate::errors::{SyncError, SyncResult};
pub use crate::fetch::FetchController;
pub use crate::models::{
    NewThought, PageResponse, PushStatus, Room, Scope, SyncConfig, Thought, ThoughtFilter, UserRef, ViewQuery,
};
pub use crate::mutations::MutationCoordinator;
pub use crate::realtime::InvalidationListener;
pub use crate::rest::RestThoughtApi;
pub use crate::store::{PageSnapshot, PageStore};
pub use crate::tags::{default_tags, TagVocabulary};
pub use crate::view::{filter_by_search, ViewController};
