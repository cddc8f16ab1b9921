//! Domain records
//!
//! Field names follow the backend's column names so records serialize the
//! same way the rest of the app reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A comment on a post. `parent_comment_id == None` means top-level.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub content: String,
    pub parent_comment_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_top_level(&self) -> bool {
        self.parent_comment_id.is_none()
    }
}

/// Like count for a comment, plus whether the viewer liked it.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LikeSummary {
    pub count: u32,
    pub is_liked: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct WishlistItem {
    pub id: String,
    pub user_id: String,
    pub item: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Shared calendar entry. Dates are `YYYY-MM-DD`, times `HH:MM:SS`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CalendarEvent {
    pub id: String,
    pub user_id: String,
    pub event_name: String,
    pub event_date: String,
    pub event_time: Option<String>,
    pub end_time: Option<String>,
}
