use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single shared record. `id`, `created_at` and `room_id` are immutable
/// after creation; everything else is replaced wholesale on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thought {
    pub id: i64,
    pub content: String,
    pub tag: String,
    pub pinned: bool,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<UserRef>,
    pub room_id: Option<i64>,
}

/// Weak reference to a user, used for assignee lookup only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: i64,
    pub username: String,
    pub email: String,
}

/// A shared space a user has joined. Read-only here; membership changes are
/// not this crate's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub join_code: String,
    pub owner_id: i64,
}

/// One server page, as returned by the paged listing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    pub content: Vec<Thought>,
    pub total_pages: u32,
    pub total_elements: u64,
    pub page: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewThought {
    pub content: String,
    pub tag: Option<String>,
    pub room_id: Option<i64>,
    pub due_date: Option<DateTime<Utc>>,
}

/// The partition a record belongs to: the personal space or one room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Personal,
    Room(i64),
}

impl Scope {
    pub fn room_id(self) -> Option<i64> {
        match self {
            Self::Personal => None,
            Self::Room(id) => Some(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ThoughtFilter {
    All,
    Tag(String),
}

impl ThoughtFilter {
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::Tag(tag) => Some(tag.as_str()),
        }
    }

    pub fn matches_tag(&self, tag: &str) -> bool {
        matches!(self, Self::Tag(active) if active == tag)
    }
}

/// The tuple that determines which page is fetched. The store only ever
/// reflects the most recently issued query's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewQuery {
    pub scope: Scope,
    pub filter: ThoughtFilter,
    pub page: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PushStatus {
    Unsubscribed,
    Subscribing,
    Subscribed,
    Failed,
}

impl PushStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unsubscribed => "unsubscribed",
            Self::Subscribing => "subscribing",
            Self::Subscribed => "subscribed",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Server page size. One constant for the whole core; never inferred
    /// from responses.
    pub page_size: u32,
    /// Tag applied when none is given and the target of bulk migration when
    /// a custom tag is deleted.
    pub default_tag: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            default_tag: "General".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Scope, Thought, ThoughtFilter};
    use chrono::Utc;

    #[test]
    fn thought_round_trips_with_camel_case_keys() {
        let thought = Thought {
            id: 7,
            content: "ship it".to_string(),
            tag: "To-Do".to_string(),
            pinned: true,
            completed: false,
            created_at: Utc::now(),
            due_date: None,
            assigned_to: None,
            room_id: Some(3),
        };

        let json = serde_json::to_value(&thought).expect("serialize thought");
        assert!(json.get("roomId").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("dueDate").is_some());

        let back: Thought = serde_json::from_value(json).expect("deserialize thought");
        assert_eq!(back, thought);
    }

    #[test]
    fn filter_matches_only_its_own_tag() {
        let filter = ThoughtFilter::Tag("Focus".to_string());
        assert!(filter.matches_tag("Focus"));
        assert!(!filter.matches_tag("General"));
        assert!(!ThoughtFilter::All.matches_tag("Focus"));
    }

    #[test]
    fn scope_exposes_room_id() {
        assert_eq!(Scope::Personal.room_id(), None);
        assert_eq!(Scope::Room(9).room_id(), Some(9));
    }
}
