//! Comment threading
//!
//! Comments come back from the store as a flat list ordered by creation time.
//! A post shows its top-level comments in that order, each followed by its
//! direct replies. Threads are one level deep: a comment whose parent is
//! itself a reply, or whose parent is missing, is not rendered.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::model::Comment;

#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    pub top_level: Vec<Comment>,
    pub replies_by_parent_id: HashMap<String, Vec<Comment>>,
    #[serde(skip)]
    dropped: usize,
}

impl CommentThread {
    /// Group `comments` into top-level comments and their replies.
    pub fn build(comments: &[Comment]) -> Self {
        let top_ids: HashSet<&str> = comments
            .iter()
            .filter(|c| c.is_top_level())
            .map(|c| c.id.as_str())
            .collect();

        let mut thread = CommentThread::default();
        for comment in comments {
            match comment.parent_comment_id.as_deref() {
                None => thread.top_level.push(comment.clone()),
                Some(parent) if top_ids.contains(parent) => thread
                    .replies_by_parent_id
                    .entry(parent.to_string())
                    .or_default()
                    .push(comment.clone()),
                Some(_) => thread.dropped += 1,
            }
        }

        if thread.dropped > 0 {
            tracing::debug!(dropped = thread.dropped, "comments without a top-level parent");
        }
        thread
    }

    /// Replies to `comment_id`, oldest first. Empty when there are none.
    pub fn replies_to(&self, comment_id: &str) -> &[Comment] {
        self.replies_by_parent_id
            .get(comment_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of comments that will be rendered.
    pub fn rendered_len(&self) -> usize {
        self.top_level.len() + self.replies_by_parent_id.values().map(Vec::len).sum::<usize>()
    }

    /// Number of comments left out because their parent is missing or is a reply.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Top-level comments paired with their replies, in display order.
    pub fn iter(&self) -> impl Iterator<Item = (&Comment, &[Comment])> {
        self.top_level.iter().map(|c| (c, self.replies_to(&c.id)))
    }
}
