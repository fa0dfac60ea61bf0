use crate::api::ThoughtApi;
use crate::errors::{SyncError, SyncResult};
use crate::fetch::FetchController;
use crate::models::{NewThought, Thought, ThoughtFilter, UserRef};
use crate::store::PageStore;
use crate::tags::TagVocabulary;
use crate::view::ViewController;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Applies speculative local edits before the server confirms them, so the
/// surface feels synchronous despite network latency.
///
/// Rollback policy per mutation class:
/// - field updates and deletions reconcile a remote failure with a full
///   reload of the current view query;
/// - creations never touch the store until the server has assigned identity
///   and ordering, then force the view back to page 0.
///
/// Callers use the returned result for user feedback only; store state is
/// always corrected by the coordinator itself.
#[derive(Clone)]
pub struct MutationCoordinator {
    api: Arc<dyn ThoughtApi>,
    store: PageStore,
    fetch: FetchController,
    view: ViewController,
    tags: TagVocabulary,
    default_tag: String,
}

impl MutationCoordinator {
    pub fn new(
        api: Arc<dyn ThoughtApi>,
        store: PageStore,
        fetch: FetchController,
        view: ViewController,
        tags: TagVocabulary,
        default_tag: String,
    ) -> Self {
        Self {
            api,
            store,
            fetch,
            view,
            tags,
            default_tag,
        }
    }

    /// Full reload of the current view query, reverting any optimistic state
    /// that the server did not accept.
    async fn reconcile(&self) {
        let query = self.view.query();
        if let Err(err) = self.fetch.load(query).await {
            tracing::warn!(error = %err, "reconciliation reload failed");
        }
    }

    /// Creation carries no optimistic insert: ordering is server-determined
    /// (pinned-first, recency), so guessing a position would be wrong more
    /// often than right. On success the view jumps to page 0 and reloads.
    pub async fn create(
        &self,
        content: impl Into<String>,
        tag: Option<String>,
        due_date: Option<DateTime<Utc>>,
    ) -> SyncResult<Thought> {
        let payload = NewThought {
            content: content.into(),
            tag,
            room_id: self.view.scope().room_id(),
            due_date,
        };

        match self.api.create_thought(&payload).await {
            Ok(created) => {
                self.tags.observe(&created.tag);
                self.view.force_first_page();
                self.reconcile().await;
                Ok(created)
            }
            Err(err) => Err(SyncError::from(err)),
        }
    }

    /// Field update: optimistic patch, then remote replace of the whole
    /// record. The server's response is authoritative and is re-applied via
    /// patch, never via a page replace, so a concurrent page change is not
    /// clobbered.
    pub async fn update(&self, updated: Thought) -> SyncResult<()> {
        self.store.patch(updated.id, |t| apply_mutable_fields(t, &updated));

        match self.api.update_thought(&updated).await {
            Ok(server) => {
                // The vocabulary tracks accepted tags only; a rejected edit
                // must not leave its tag behind.
                self.tags.observe(&server.tag);
                self.store.patch(server.id, |t| apply_mutable_fields(t, &server));
                Ok(())
            }
            Err(err) => {
                let err = SyncError::from(err);
                tracing::warn!(id = updated.id, error = %err, "update rejected, reloading");
                self.reconcile().await;
                Err(err)
            }
        }
    }

    pub async fn edit(&self, id: i64, content: impl Into<String>, tag: impl Into<String>) -> SyncResult<()> {
        let Some(mut current) = self.store.get(id) else {
            tracing::debug!(id, "edit target not on current page");
            return Ok(());
        };
        current.content = content.into();
        current.tag = tag.into();
        self.update(current).await
    }

    pub async fn toggle_pinned(&self, id: i64) -> SyncResult<()> {
        let Some(mut current) = self.store.get(id) else {
            return Ok(());
        };
        current.pinned = !current.pinned;
        self.update(current).await
    }

    pub async fn toggle_completed(&self, id: i64) -> SyncResult<()> {
        let Some(mut current) = self.store.get(id) else {
            return Ok(());
        };
        current.completed = !current.completed;
        self.update(current).await
    }

    pub async fn assign(&self, id: i64, assignee: Option<UserRef>) -> SyncResult<()> {
        let Some(mut current) = self.store.get(id) else {
            return Ok(());
        };
        current.assigned_to = assignee;
        self.update(current).await
    }

    /// Optimistic removal. A failed remote delete reconciles by reload rather
    /// than re-inserting a remembered copy, since other users may have edited
    /// the record in the meantime.
    pub async fn delete(&self, id: i64) -> SyncResult<()> {
        self.store.remove(id);

        match self.api.delete_thought(id).await {
            Ok(()) => Ok(()),
            Err(err) => {
                let err = SyncError::from(err);
                tracing::warn!(id, error = %err, "delete rejected, reloading");
                self.reconcile().await;
                Err(err)
            }
        }
    }

    /// Deleting a custom tag: drop it locally, reset the filter if it was
    /// active, migrate every record system-wide to the default tag, then
    /// reload unconditionally: even a partially applied migration changes
    /// visible data.
    pub async fn delete_tag(&self, tag: &str) -> SyncResult<()> {
        if self.tags.is_default(tag) {
            return Err(SyncError::Validation(format!(
                "default tag '{}' cannot be deleted",
                tag
            )));
        }
        self.tags.remove(tag);

        if self.view.filter().matches_tag(tag) {
            self.view.set_filter(ThoughtFilter::All);
        }

        let migration = self
            .api
            .migrate_tag(tag, &self.default_tag)
            .await
            .map_err(SyncError::from);
        if let Err(err) = &migration {
            tracing::warn!(tag, error = %err, "tag migration failed");
        }

        self.reconcile().await;
        migration
    }
}

fn apply_mutable_fields(target: &mut Thought, source: &Thought) {
    target.content = source.content.clone();
    target.tag = source.tag.clone();
    target.pinned = source.pinned;
    target.completed = source.completed;
    target.due_date = source.due_date;
    target.assigned_to = source.assigned_to.clone();
}
