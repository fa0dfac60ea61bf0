use crate::models::Thought;
use std::sync::{Arc, Mutex};

/// Everything the store holds: exactly one page of records plus the
/// pagination summary for the current query.
#[derive(Debug, Clone, Default)]
pub struct PageSnapshot {
    pub thoughts: Vec<Thought>,
    pub total_pages: u32,
    pub total_elements: u64,
}

/// In-memory record store. Mutated by exactly two callers: the fetch
/// controller via `replace_page` and the mutation coordinator via
/// `patch`/`remove`. Every operation runs under the lock with no suspension
/// point, so no partial-record state is ever observable.
#[derive(Clone, Default)]
pub struct PageStore {
    inner: Arc<Mutex<PageSnapshot>>,
}

impl PageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> PageSnapshot {
        self.inner.lock().expect("page store lock").clone()
    }

    pub fn get(&self, id: i64) -> Option<Thought> {
        let inner = self.inner.lock().expect("page store lock");
        inner.thoughts.iter().find(|t| t.id == id).cloned()
    }

    /// Unconditional overwrite of the whole page.
    pub fn replace_page(&self, thoughts: Vec<Thought>, total_pages: u32, total_elements: u64) {
        let mut inner = self.inner.lock().expect("page store lock");
        inner.thoughts = thoughts;
        inner.total_pages = total_pages;
        inner.total_elements = total_elements;
    }

    /// Applies `mutate` to the record with matching id. No-op when the record
    /// is not on the current page (already navigated away).
    pub fn patch<F>(&self, id: i64, mutate: F) -> bool
    where
        F: FnOnce(&mut Thought),
    {
        let mut inner = self.inner.lock().expect("page store lock");
        match inner.thoughts.iter_mut().find(|t| t.id == id) {
            Some(thought) => {
                mutate(thought);
                true
            }
            None => false,
        }
    }

    /// Removes by id. Idempotent; removing an absent id is a no-op.
    pub fn remove(&self, id: i64) -> bool {
        let mut inner = self.inner.lock().expect("page store lock");
        let before = inner.thoughts.len();
        inner.thoughts.retain(|t| t.id != id);
        inner.thoughts.len() != before
    }

    pub fn total_pages(&self) -> u32 {
        self.inner.lock().expect("page store lock").total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::PageStore;
    use crate::models::Thought;
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
    fn replace_page_overwrites_everything() {
        let store = PageStore::new();
        store.replace_page(vec![thought(1, "a"), thought(2, "b")], 3, 41);
        store.replace_page(vec![thought(9, "c")], 1, 1);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.thoughts.len(), 1);
        assert_eq!(snapshot.thoughts[0].id, 9);
        assert_eq!(snapshot.total_pages, 1);
        assert_eq!(snapshot.total_elements, 1);
    }

    #[test]
    fn patch_applies_only_to_present_records() {
        let store = PageStore::new();
        store.replace_page(vec![thought(1, "a")], 1, 1);

        assert!(store.patch(1, |t| t.completed = true));
        assert!(store.get(1).expect("record present").completed);

        // Absent id: no error, no state change.
        assert!(!store.patch(42, |t| t.completed = true));
        assert_eq!(store.snapshot().thoughts.len(), 1);
    }

    #[test]
    fn remove_is_idempotent() {
        let store = PageStore::new();
        store.replace_page(vec![thought(1, "a"), thought(2, "b")], 1, 2);

        assert!(store.remove(1));
        assert!(!store.remove(1));
        assert!(!store.remove(77));
        assert_eq!(store.snapshot().thoughts.len(), 1);
    }
}
