use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex};

static DEFAULT_TAGS: Lazy<Vec<String>> = Lazy::new(|| {
    ["General", "Idea", "To-Do", "Journal", "Dream"]
        .into_iter()
        .map(ToString::to_string)
        .collect()
});

pub fn default_tags() -> &'static [String] {
    &DEFAULT_TAGS
}

/// Union of the fixed default vocabulary and custom tags observed from
/// create/edit operations. Custom tags leave the set only through explicit
/// deletion (which also drives the remote bulk migration).
#[derive(Clone, Default)]
pub struct TagVocabulary {
    custom: Arc<Mutex<Vec<String>>>,
}

impl TagVocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<String> {
        let custom = self.custom.lock().expect("tag vocabulary lock");
        DEFAULT_TAGS.iter().cloned().chain(custom.iter().cloned()).collect()
    }

    pub fn is_default(&self, tag: &str) -> bool {
        DEFAULT_TAGS.iter().any(|t| t == tag)
    }

    /// Records a tag seen on a created or edited record. Duplicates and
    /// defaults are ignored.
    pub fn observe(&self, tag: &str) {
        if tag.is_empty() || self.is_default(tag) {
            return;
        }
        let mut custom = self.custom.lock().expect("tag vocabulary lock");
        if !custom.iter().any(|t| t == tag) {
            custom.push(tag.to_string());
        }
    }

    /// Drops a custom tag. Returns whether it was present; defaults are
    /// never removable.
    pub fn remove(&self, tag: &str) -> bool {
        if self.is_default(tag) {
            return false;
        }
        let mut custom = self.custom.lock().expect("tag vocabulary lock");
        let before = custom.len();
        custom.retain(|t| t != tag);
        custom.len() != before
    }
}

#[cfg(test)]
mod tests {
    use super::TagVocabulary;

    #[test]
    fn observed_custom_tags_extend_the_defaults() {
        let tags = TagVocabulary::new();
        tags.observe("Focus");
        tags.observe("Focus");
        tags.observe("General");

        let all = tags.all();
        assert_eq!(all.iter().filter(|t| *t == "Focus").count(), 1);
        assert_eq!(all.iter().filter(|t| *t == "General").count(), 1);
        assert_eq!(all.len(), 6);
    }

    #[test]
    fn defaults_cannot_be_removed() {
        let tags = TagVocabulary::new();
        tags.observe("Focus");

        assert!(!tags.remove("General"));
        assert!(tags.remove("Focus"));
        assert!(!tags.remove("Focus"));
        assert_eq!(tags.all().len(), 5);
    }
}
