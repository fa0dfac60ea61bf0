use crate::models::{Scope, Thought, ThoughtFilter, ViewQuery};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct ViewParams {
    scope: Scope,
    filter: ThoughtFilter,
    page: u32,
    search: String,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            scope: Scope::Personal,
            filter: ThoughtFilter::All,
            page: 0,
            search: String::new(),
        }
    }
}

/// The only writer of (scope, filter, page, search). Filter and scope changes
/// reset the page index synchronously, before any load is issued, so one
/// logical change produces exactly one load and never an old-page/new-filter
/// combination.
#[derive(Clone, Default)]
pub struct ViewController {
    inner: Arc<Mutex<ViewParams>>,
}

impl ViewController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> ViewQuery {
        let inner = self.inner.lock().expect("view params lock");
        ViewQuery {
            scope: inner.scope,
            filter: inner.filter.clone(),
            page: inner.page,
        }
    }

    pub fn scope(&self) -> Scope {
        self.inner.lock().expect("view params lock").scope
    }

    pub fn filter(&self) -> ThoughtFilter {
        self.inner.lock().expect("view params lock").filter.clone()
    }

    pub fn page(&self) -> u32 {
        self.inner.lock().expect("view params lock").page
    }

    pub fn search(&self) -> String {
        self.inner.lock().expect("view params lock").search.clone()
    }

    /// Returns whether anything changed; a change resets the page to 0.
    pub fn set_filter(&self, filter: ThoughtFilter) -> bool {
        let mut inner = self.inner.lock().expect("view params lock");
        if inner.filter == filter {
            return false;
        }
        inner.filter = filter;
        inner.page = 0;
        true
    }

    /// Switching scope also resets the filter to All and the page to 0.
    pub fn set_scope(&self, scope: Scope) -> bool {
        let mut inner = self.inner.lock().expect("view params lock");
        if inner.scope == scope {
            return false;
        }
        inner.scope = scope;
        inner.filter = ThoughtFilter::All;
        inner.page = 0;
        true
    }

    /// Clamped page navigation: requests at or above `max(total_pages, 1)`
    /// are rejected, as are no-op requests for the current page.
    pub fn try_set_page(&self, page: u32, total_pages: u32) -> bool {
        let mut inner = self.inner.lock().expect("view params lock");
        if page >= total_pages.max(1) || page == inner.page {
            return false;
        }
        inner.page = page;
        true
    }

    /// Unconditional jump back to the first page, used after a create (the
    /// server decides ordering, so the new record's position is unknowable).
    pub fn force_first_page(&self) {
        self.inner.lock().expect("view params lock").page = 0;
    }

    /// Search never triggers a reload; it narrows the already-fetched page.
    pub fn set_search(&self, text: impl Into<String>) {
        self.inner.lock().expect("view params lock").search = text.into();
    }
}

/// Case-insensitive substring match over content. Applied client-side only;
/// the visible count may drop below the page size and `total_pages` is
/// untouched, which is accepted behavior.
pub fn filter_by_search(thoughts: &[Thought], search: &str) -> Vec<Thought> {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return thoughts.to_vec();
    }
    thoughts
        .iter()
        .filter(|t| t.content.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{filter_by_search, ViewController};
    use crate::models::{Scope, Thought, ThoughtFilter};
    use chrono::Utc;

    fn thought(id: i64, content: &str) -> Thought {
        Thought {
            id,
            content: content.to_string(),
            tag: "General".to_string(),
            pinned: false,
            completed: false,
            created_at: Utc::now(),
            due_date: None,
            assigned_to: None,
            room_id: None,
        }
    }

    #[test]
    fn filter_change_resets_page() {
        let view = ViewController::new();
        view.set_filter(ThoughtFilter::Tag("Idea".to_string()));
        assert!(view.try_set_page(3, 6));
        assert_eq!(view.page(), 3);

        assert!(view.set_filter(ThoughtFilter::Tag("To-Do".to_string())));
        let query = view.query();
        assert_eq!(query.page, 0);
        assert_eq!(query.filter, ThoughtFilter::Tag("To-Do".to_string()));

        // Re-selecting the active filter is not a logical change.
        assert!(!view.set_filter(ThoughtFilter::Tag("To-Do".to_string())));
    }

    #[test]
    fn scope_change_resets_filter_and_page() {
        let view = ViewController::new();
        view.set_filter(ThoughtFilter::Tag("Idea".to_string()));
        view.try_set_page(2, 4);

        assert!(view.set_scope(Scope::Room(7)));
        assert_eq!(view.page(), 0);
        assert_eq!(view.filter(), ThoughtFilter::All);
        assert!(!view.set_scope(Scope::Room(7)));
    }

    #[test]
    fn page_requests_are_clamped() {
        let view = ViewController::new();
        assert!(!view.try_set_page(0, 5), "current page is a no-op");
        assert!(!view.try_set_page(5, 5), "at total is rejected");
        assert!(!view.try_set_page(9, 5), "beyond total is rejected");
        assert!(view.try_set_page(4, 5));
        assert_eq!(view.page(), 4);

        // Empty result set still pins the view to page 0.
        assert!(!view.try_set_page(1, 0));
    }

    #[test]
    fn search_is_case_insensitive_substring_over_content() {
        let page = vec![
            thought(1, "Launch checklist"),
            thought(2, "groceries"),
            thought(3, "pre-LAUNCH review"),
        ];

        let hits = filter_by_search(&page, "launch");
        assert_eq!(hits.iter().map(|t| t.id).collect::<Vec<_>>(), vec![1, 3]);

        assert_eq!(filter_by_search(&page, "  ").len(), 3);
        assert!(filter_by_search(&page, "nothing matches this").is_empty());
    }
}
