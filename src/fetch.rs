use crate::api::ThoughtApi;
use crate::errors::{SyncError, SyncResult};
use crate::models::ViewQuery;
use crate::store::PageStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct FetchState {
    loading: bool,
    last_error: Option<String>,
}

/// Loads one page per view query and commits it atomically to the store.
/// The sole writer of confirmed state.
///
/// Overlapping loads are allowed; each takes a ticket from a monotonically
/// increasing counter and a completing load commits only if its ticket is
/// still the most recently issued. Superseded results are discarded on
/// arrival, which stands in for cancellation.
#[derive(Clone)]
pub struct FetchController {
    api: Arc<dyn ThoughtApi>,
    store: PageStore,
    page_size: u32,
    issued: Arc<AtomicU64>,
    state: Arc<Mutex<FetchState>>,
}

impl FetchController {
    pub fn new(api: Arc<dyn ThoughtApi>, store: PageStore, page_size: u32) -> Self {
        Self {
            api,
            store,
            page_size,
            issued: Arc::new(AtomicU64::new(0)),
            state: Arc::new(Mutex::new(FetchState::default())),
        }
    }

    pub async fn load(&self, query: ViewQuery) -> SyncResult<()> {
        let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.lock().expect("fetch state lock");
            state.loading = true;
        }

        let result = self.api.fetch_page(&query, self.page_size).await;

        // Ticket check and commit form one critical section: a result that is
        // current when checked must land before any newer result can.
        let mut state = self.state.lock().expect("fetch state lock");
        if self.issued.load(Ordering::SeqCst) != ticket {
            // A newer load was issued while this one was in flight. Whatever
            // happened here, the newer one owns the store and the error state.
            tracing::debug!(ticket, "discarding superseded page load");
            return Ok(());
        }

        state.loading = false;
        match result {
            Ok(page) => {
                self.store
                    .replace_page(page.content, page.total_pages, page.total_elements);
                state.last_error = None;
                Ok(())
            }
            Err(err) => {
                let err = SyncError::from(err);
                tracing::warn!(error = %err, page = query.page, "page load failed");
                // Previous contents stay in place; failure never clears.
                state.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().expect("fetch state lock").loading
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.lock().expect("fetch state lock").last_error.clone()
    }
}
