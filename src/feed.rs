//! Family feed service
//!
//! The operations behind the app's pages: posting, commenting and replying,
//! liking, tagging, profile edits, wishlists and the shared calendar. Every
//! call names the acting user; edits and deletes are only allowed on the
//! actor's own records.

use std::collections::HashMap;

use chrono::Utc;

use crate::calendar::{self, EventSelection};
use crate::error::{Error, Result};
use crate::ids::new_id;
use crate::mentions::{extract_usernames, pending_tag_query};
use crate::model::{CalendarEvent, Comment, LikeSummary, Post, Profile, WishlistItem};
use crate::storage::FamilyStore;
use crate::tags::{directory_from_profiles, resolve_tags, unique_ids};
use crate::thread::CommentThread;

/// How many usernames the live tag search suggests.
pub const TAG_SEARCH_LIMIT: u32 = 5;

pub struct FamilyFeed<S> {
    store: S,
}

impl<S: FamilyStore> FamilyFeed<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    // Profiles

    pub fn register_profile(&self, profile: &Profile) -> Result<()> {
        self.store.upsert_profile(profile)
    }

    pub fn profile(&self, user_id: &str) -> Result<Profile> {
        self.store
            .get_profile(user_id)?
            .ok_or_else(|| Error::not_found("profile", user_id))
    }

    /// Set the actor's bio. Blank text clears it.
    pub fn update_bio(&self, actor: &str, bio: &str) -> Result<()> {
        let bio = non_blank(bio);
        if !self.store.update_bio(actor, bio.as_deref())? {
            return Err(Error::not_found("profile", actor));
        }
        Ok(())
    }

    /// Point the actor's avatar at an already uploaded image.
    pub fn update_avatar(&self, actor: &str, avatar_url: &str) -> Result<()> {
        let url = non_blank(avatar_url);
        if !self.store.update_avatar(actor, url.as_deref())? {
            return Err(Error::not_found("profile", actor));
        }
        Ok(())
    }

    /// Username to user id lookup for everyone with a username.
    pub fn directory(&self) -> Result<HashMap<String, String>> {
        Ok(directory_from_profiles(&self.store.list_profiles()?))
    }

    /// Suggestions for the `@prefix` being typed at the end of `text`.
    pub fn search_taggable(&self, text: &str) -> Result<Vec<String>> {
        match pending_tag_query(text) {
            Some(query) => self.store.search_usernames(query, TAG_SEARCH_LIMIT),
            None => Ok(Vec::new()),
        }
    }

    // Posts

    /// Publish a post. It needs text, an image, or both.
    pub fn create_post(&self, actor: &str, content: &str, image_url: Option<&str>) -> Result<Post> {
        let content = non_blank(content);
        let image_url = image_url.and_then(non_blank);
        if content.is_none() && image_url.is_none() {
            return Err(Error::Validation(
                "a post needs some content or an image".to_string(),
            ));
        }

        let post = Post {
            id: new_id(),
            author_id: actor.to_string(),
            content,
            image_url,
            created_at: Utc::now(),
        };
        self.store.insert_post(&post)?;
        tracing::info!(post_id = %post.id, author_id = %actor, "created post");

        // Tags are best-effort: the post is already stored.
        if let Some(text) = &post.content {
            match self.tagged_users(text) {
                Ok(tagged) if tagged.is_empty() => {}
                Ok(tagged) => {
                    if let Err(e) = self.store.insert_post_tags(&post.id, &tagged) {
                        tracing::warn!(post_id = %post.id, "failed to insert post tags: {}", e);
                    }
                }
                Err(e) => {
                    tracing::warn!(post_id = %post.id, "failed to resolve post tags: {}", e);
                }
            }
        }
        Ok(post)
    }

    /// Newest posts first, from everyone or from one author.
    pub fn posts(&self, author_id: Option<&str>) -> Result<Vec<Post>> {
        self.store.list_posts(author_id)
    }

    pub fn delete_post(&self, actor: &str, post_id: &str) -> Result<()> {
        let post = self
            .store
            .get_post(post_id)?
            .ok_or_else(|| Error::not_found("post", post_id))?;
        if post.author_id != actor {
            return Err(Error::PermissionDenied);
        }
        self.store.delete_post(post_id)?;
        tracing::info!(post_id = %post_id, "deleted post");
        Ok(())
    }

    // Comments

    /// Add a top-level comment to a post.
    pub fn add_comment(&self, actor: &str, post_id: &str, content: &str) -> Result<Comment> {
        if self.store.get_post(post_id)?.is_none() {
            return Err(Error::not_found("post", post_id));
        }
        self.insert_comment(actor, post_id, content, None)
    }

    /// Reply to a top-level comment. Replies to replies are rejected.
    pub fn add_reply(&self, actor: &str, parent_id: &str, content: &str) -> Result<Comment> {
        let parent = self
            .store
            .get_comment(parent_id)?
            .ok_or_else(|| Error::InvalidParent(format!("comment {} does not exist", parent_id)))?;
        if !parent.is_top_level() {
            return Err(Error::InvalidParent(format!(
                "comment {} is itself a reply",
                parent_id
            )));
        }
        self.insert_comment(actor, &parent.post_id, content, Some(parent.id))
    }

    fn insert_comment(
        &self,
        actor: &str,
        post_id: &str,
        content: &str,
        parent_comment_id: Option<String>,
    ) -> Result<Comment> {
        let content = non_blank(content)
            .ok_or_else(|| Error::Validation("comment is empty".to_string()))?;

        let comment = Comment {
            id: new_id(),
            post_id: post_id.to_string(),
            author_id: actor.to_string(),
            content,
            parent_comment_id,
            created_at: Utc::now(),
        };
        self.store.insert_comment(&comment)?;
        tracing::info!(
            comment_id = %comment.id,
            post_id = %post_id,
            reply = !comment.is_top_level(),
            "added comment"
        );

        // Tags are best-effort: the comment is already stored.
        match self.tagged_users(&comment.content) {
            Ok(tagged) if tagged.is_empty() => {}
            Ok(tagged) => {
                if let Err(e) = self.store.insert_comment_tags(&comment.id, &tagged) {
                    tracing::warn!(comment_id = %comment.id, "failed to insert comment tags: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!(comment_id = %comment.id, "failed to resolve comment tags: {}", e);
            }
        }
        Ok(comment)
    }

    /// A post's comments grouped for display.
    pub fn comment_thread(&self, post_id: &str) -> Result<CommentThread> {
        let comments = self.store.list_comments(post_id)?;
        Ok(CommentThread::build(&comments))
    }

    pub fn delete_comment(&self, actor: &str, comment_id: &str) -> Result<()> {
        let comment = self
            .store
            .get_comment(comment_id)?
            .ok_or_else(|| Error::not_found("comment", comment_id))?;
        if comment.author_id != actor {
            return Err(Error::PermissionDenied);
        }
        self.store.delete_comment(comment_id)?;
        tracing::info!(comment_id = %comment_id, "deleted comment");
        Ok(())
    }

    /// Like the comment, or remove the actor's like if already there.
    pub fn toggle_comment_like(&self, actor: &str, comment_id: &str) -> Result<LikeSummary> {
        if self.store.get_comment(comment_id)?.is_none() {
            return Err(Error::not_found("comment", comment_id));
        }
        if !self.store.delete_comment_like(comment_id, actor)? {
            self.store.insert_comment_like(comment_id, actor)?;
        }
        self.store.like_summary(comment_id, actor)
    }

    /// Like counts for every comment in `thread`, from `viewer`'s side.
    pub fn like_summaries(
        &self,
        viewer: &str,
        thread: &CommentThread,
    ) -> Result<HashMap<String, LikeSummary>> {
        let mut out = HashMap::new();
        for (comment, replies) in thread.iter() {
            for c in std::iter::once(comment).chain(replies) {
                out.insert(c.id.clone(), self.store.like_summary(&c.id, viewer)?);
            }
        }
        Ok(out)
    }

    fn tagged_users(&self, content: &str) -> Result<Vec<String>> {
        let usernames = extract_usernames(content);
        if usernames.is_empty() {
            return Ok(Vec::new());
        }
        let directory = self.directory()?;
        Ok(unique_ids(resolve_tags(&usernames, &directory)))
    }

    // Wishlist

    pub fn add_wishlist_item(
        &self,
        actor: &str,
        item: &str,
        description: Option<&str>,
        link: Option<&str>,
    ) -> Result<WishlistItem> {
        let item = non_blank(item)
            .ok_or_else(|| Error::Validation("please enter an item name".to_string()))?;
        let entry = WishlistItem {
            id: new_id(),
            user_id: actor.to_string(),
            item,
            description: description.and_then(non_blank),
            link: link.and_then(non_blank),
            created_at: Utc::now(),
        };
        self.store.insert_wishlist_item(&entry)?;
        tracing::info!(item_id = %entry.id, user_id = %actor, "added wishlist item");
        Ok(entry)
    }

    pub fn wishlist(&self, user_id: &str) -> Result<Vec<WishlistItem>> {
        self.store.list_wishlist(user_id)
    }

    pub fn delete_wishlist_item(&self, actor: &str, item_id: &str) -> Result<()> {
        let item = self
            .store
            .get_wishlist_item(item_id)?
            .ok_or_else(|| Error::not_found("wishlist item", item_id))?;
        if item.user_id != actor {
            return Err(Error::PermissionDenied);
        }
        self.store.delete_wishlist_item(item_id)?;
        Ok(())
    }

    // Calendar

    pub fn add_event(&self, actor: &str, name: &str, selection: &EventSelection) -> Result<CalendarEvent> {
        let mut event = build_event(actor, name, selection)?;
        event.id = new_id();
        self.store.insert_event(&event)?;
        tracing::info!(event_id = %event.id, date = %event.event_date, "added calendar event");
        Ok(event)
    }

    /// Replace name, date and times of one of the actor's events.
    pub fn update_event(
        &self,
        actor: &str,
        event_id: &str,
        name: &str,
        selection: &EventSelection,
    ) -> Result<CalendarEvent> {
        let existing = self
            .store
            .get_event(event_id)?
            .ok_or_else(|| Error::not_found("event", event_id))?;
        if existing.user_id != actor {
            return Err(Error::PermissionDenied);
        }
        let mut event = build_event(actor, name, selection)?;
        event.id = existing.id;
        self.store.update_event(&event)?;
        tracing::info!(event_id = %event.id, "updated calendar event");
        Ok(event)
    }

    pub fn delete_event(&self, actor: &str, event_id: &str) -> Result<()> {
        let event = self
            .store
            .get_event(event_id)?
            .ok_or_else(|| Error::not_found("event", event_id))?;
        if event.user_id != actor {
            return Err(Error::PermissionDenied);
        }
        self.store.delete_event(event_id)?;
        Ok(())
    }

    /// Everyone's events in a month (1-12), by date.
    pub fn events_in_month(&self, month: u32, year: i32) -> Result<Vec<CalendarEvent>> {
        let (first, last) = calendar::month_bounds(month, year)
            .ok_or_else(|| Error::Validation(format!("invalid month {}-{}", year, month)))?;
        self.store.list_events_between(first, last)
    }
}

fn build_event(actor: &str, name: &str, selection: &EventSelection) -> Result<CalendarEvent> {
    let name = non_blank(name)
        .ok_or_else(|| Error::Validation("event name is required".to_string()))?;
    let when = calendar::assemble_event(selection)
        .ok_or_else(|| Error::Validation("a valid month, day and year are required".to_string()))?;

    let end_time = match when.time {
        Some(_) => when.end_time,
        None => {
            if when.end_time.is_some() {
                tracing::debug!("dropping end time of an event without a start time");
            }
            None
        }
    };

    Ok(CalendarEvent {
        id: String::new(),
        user_id: actor.to_string(),
        event_name: name,
        event_date: when.date,
        event_time: when.time,
        end_time,
    })
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
