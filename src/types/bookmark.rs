use serde::{Deserialize, Serialize};

/// A saved link, as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub title: String,
    pub url: String,
    /// ID of the user who created the bookmark.
    pub owner: String,
    /// Milliseconds since the UNIX epoch, assigned by the store.
    pub created_at: i64,
}

/// A bookmark that has not been stored yet. The store assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    pub owner: String,
}

/// Row filter for queries and change subscriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookmarkFilter {
    pub owner: Option<String>,
}

impl BookmarkFilter {
    /// Matches only rows owned by `owner`.
    pub fn owned_by(owner: &str) -> Self {
        Self {
            owner: Some(owner.to_string()),
        }
    }

    pub fn matches_owner(&self, owner: &str) -> bool {
        self.owner.as_deref().map_or(true, |o| o == owner)
    }
}

/// Ordering of query results by `created_at`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}
