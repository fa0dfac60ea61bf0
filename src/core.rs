use crate::api::{PushTransport, ThoughtApi};
use crate::errors::SyncResult;
use crate::fetch::FetchController;
use crate::models::{PushStatus, Room, Scope, SyncConfig, Thought, ThoughtFilter, UserRef};
use crate::mutations::MutationCoordinator;
use crate::realtime::InvalidationListener;
use crate::store::PageStore;
use crate::tags::TagVocabulary;
use crate::view::{filter_by_search, ViewController};
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

/// The assembled sync core: one store, one view, one fetch controller, one
/// mutation coordinator and one invalidation listener, wired so that every
/// logical view change issues exactly one load and every push signal reloads
/// the query that is current at delivery time.
#[derive(Clone)]
pub struct SyncCore {
    api: Arc<dyn ThoughtApi>,
    store: PageStore,
    view: ViewController,
    fetch: FetchController,
    mutations: MutationCoordinator,
    listener: InvalidationListener,
    tags: TagVocabulary,
    members: Arc<Mutex<Vec<UserRef>>>,
}

impl SyncCore {
    pub fn new(
        api: Arc<dyn ThoughtApi>,
        transport: Arc<dyn PushTransport>,
        config: SyncConfig,
    ) -> Self {
        let store = PageStore::new();
        let view = ViewController::new();
        let tags = TagVocabulary::new();
        let fetch = FetchController::new(api.clone(), store.clone(), config.page_size);
        let mutations = MutationCoordinator::new(
            api.clone(),
            store.clone(),
            fetch.clone(),
            view.clone(),
            tags.clone(),
            config.default_tag,
        );
        Self {
            api,
            store,
            view,
            fetch,
            mutations,
            listener: InvalidationListener::new(transport),
            tags,
            members: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Initial load of the personal scope.
    pub async fn start(&self) -> SyncResult<()> {
        self.fetch.load(self.view.query()).await
    }

    /// Releases the push subscription. Results of loads still in flight for
    /// the old scope are discarded by the fetch controller's ticket check.
    pub async fn shutdown(&self) {
        self.listener.shutdown().await;
    }

    // ── view parameters ─────────────────────────────────────────────────

    pub async fn set_filter(&self, filter: ThoughtFilter) -> SyncResult<()> {
        if !self.view.set_filter(filter) {
            return Ok(());
        }
        self.fetch.load(self.view.query()).await
    }

    pub async fn set_scope(&self, scope: Scope) -> SyncResult<()> {
        if !self.view.set_scope(scope) {
            return Ok(());
        }
        self.listener.rescope(scope, self.invalidate_callback()).await;
        self.refresh_members(scope).await;
        self.fetch.load(self.view.query()).await
    }

    /// Clamped navigation; an out-of-range request is a no-op.
    pub async fn set_page(&self, page: u32) -> SyncResult<()> {
        if !self.view.try_set_page(page, self.store.total_pages()) {
            return Ok(());
        }
        self.fetch.load(self.view.query()).await
    }

    /// Client-side narrowing only. Never issues a network call.
    pub fn set_search(&self, text: impl Into<String>) {
        self.view.set_search(text);
    }

    /// Manual reload of the current query. This is the only retry mechanism
    /// for connectivity failures; the core never retries on its own.
    pub async fn refresh(&self) -> SyncResult<()> {
        self.fetch.load(self.view.query()).await
    }

    // ── mutations ───────────────────────────────────────────────────────

    pub async fn add_thought(
        &self,
        content: impl Into<String>,
        tag: Option<String>,
        due_date: Option<DateTime<Utc>>,
    ) -> SyncResult<Thought> {
        self.mutations.create(content, tag, due_date).await
    }

    pub async fn edit_thought(
        &self,
        id: i64,
        content: impl Into<String>,
        tag: impl Into<String>,
    ) -> SyncResult<()> {
        self.mutations.edit(id, content, tag).await
    }

    pub async fn toggle_pinned(&self, id: i64) -> SyncResult<()> {
        self.mutations.toggle_pinned(id).await
    }

    pub async fn toggle_completed(&self, id: i64) -> SyncResult<()> {
        self.mutations.toggle_completed(id).await
    }

    pub async fn assign_thought(&self, id: i64, assignee: Option<UserRef>) -> SyncResult<()> {
        self.mutations.assign(id, assignee).await
    }

    pub async fn remove_thought(&self, id: i64) -> SyncResult<()> {
        self.mutations.delete(id).await
    }

    pub async fn delete_tag(&self, tag: &str) -> SyncResult<()> {
        self.mutations.delete_tag(tag).await
    }

    // ── reads ───────────────────────────────────────────────────────────

    /// The fetched page narrowed by the search text. The visible count may
    /// be smaller than the page size; pagination metadata is unaffected.
    pub fn visible_thoughts(&self) -> Vec<Thought> {
        let snapshot = self.store.snapshot();
        filter_by_search(&snapshot.thoughts, &self.view.search())
    }

    pub fn page_info(&self) -> (u32, u32) {
        (self.view.page(), self.store.total_pages())
    }

    pub fn available_tags(&self) -> Vec<String> {
        self.tags.all()
    }

    pub fn room_members(&self) -> Vec<UserRef> {
        self.members.lock().expect("member cache lock").clone()
    }

    /// The rooms available as scopes, fetched on demand. Room membership is
    /// managed elsewhere; the core only reads it.
    pub async fn joined_rooms(&self) -> SyncResult<Vec<Room>> {
        Ok(self.api.list_rooms().await?)
    }

    pub fn push_status(&self) -> PushStatus {
        self.listener.status()
    }

    pub fn is_loading(&self) -> bool {
        self.fetch.is_loading()
    }

    pub fn last_error(&self) -> Option<String> {
        self.fetch.last_error()
    }

    // ── internals ───────────────────────────────────────────────────────

    fn invalidate_callback(&self) -> Arc<dyn Fn() + Send + Sync> {
        let view = self.view.clone();
        let fetch = self.fetch.clone();
        Arc::new(move || {
            // Read the query at fire time; a closure capturing the query at
            // subscribe time would reload stale parameters.
            let query = view.query();
            let fetch = fetch.clone();
            tokio::spawn(async move {
                // Failures land in the controller's error state; a push
                // reload has no caller to report to.
                let _ = fetch.load(query).await;
            });
        })
    }

    async fn refresh_members(&self, scope: Scope) {
        let members = match scope.room_id() {
            Some(room_id) => match self.api.room_members(room_id).await {
                Ok(members) => members,
                Err(err) => {
                    tracing::warn!(room_id, error = %err, "member lookup failed");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };
        *self.members.lock().expect("member cache lock") = members;
    }
}
