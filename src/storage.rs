//! Storage module
//!
//! SQLite-backed local store for the family feed, mirroring the backend's
//! tables:
//! - profiles(id TEXT PRIMARY KEY, name TEXT, username TEXT UNIQUE, bio TEXT, avatar_url TEXT)
//! - posts(id TEXT PRIMARY KEY, author_id TEXT, content TEXT, image_url TEXT, created_at INTEGER)
//! - post_tags(post_id TEXT, tagged_user_id TEXT)
//! - comments(id TEXT PRIMARY KEY, post_id TEXT, author_id TEXT, content TEXT, parent_comment_id TEXT, created_at INTEGER)
//! - comment_tags(comment_id TEXT, tagged_user_id TEXT)
//! - comment_likes(comment_id TEXT, user_id TEXT)
//! - wishlist_items(id TEXT PRIMARY KEY, user_id TEXT, item TEXT, description TEXT, link TEXT, created_at INTEGER)
//! - calendar_events(id TEXT PRIMARY KEY, user_id TEXT, event_name TEXT, event_date TEXT, event_time TEXT, end_time TEXT)
//!
//! Timestamps are unix milliseconds. Deleting a post removes its comments,
//! tags and likes; deleting a comment removes its replies.

use std::path::Path;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::config::Config;
use crate::error::Result;
use crate::model::{CalendarEvent, Comment, LikeSummary, Post, Profile, WishlistItem};

/// Persistence handle the feed service is built on.
pub trait FamilyStore {
    fn upsert_profile(&self, profile: &Profile) -> Result<()>;
    fn get_profile(&self, id: &str) -> Result<Option<Profile>>;
    fn list_profiles(&self) -> Result<Vec<Profile>>;
    fn update_bio(&self, id: &str, bio: Option<&str>) -> Result<bool>;
    fn update_avatar(&self, id: &str, avatar_url: Option<&str>) -> Result<bool>;
    /// Usernames starting with `prefix`, case-insensitive, alphabetical.
    fn search_usernames(&self, prefix: &str, limit: u32) -> Result<Vec<String>>;

    fn insert_post(&self, post: &Post) -> Result<()>;
    fn get_post(&self, id: &str) -> Result<Option<Post>>;
    /// Newest first, optionally limited to one author.
    fn list_posts(&self, author_id: Option<&str>) -> Result<Vec<Post>>;
    fn delete_post(&self, id: &str) -> Result<bool>;
    fn insert_post_tags(&self, post_id: &str, user_ids: &[String]) -> Result<()>;
    fn post_tags(&self, post_id: &str) -> Result<Vec<String>>;

    fn insert_comment(&self, comment: &Comment) -> Result<()>;
    fn get_comment(&self, id: &str) -> Result<Option<Comment>>;
    /// Oldest first.
    fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>>;
    fn delete_comment(&self, id: &str) -> Result<bool>;
    fn insert_comment_tags(&self, comment_id: &str, user_ids: &[String]) -> Result<()>;
    fn comment_tags(&self, comment_id: &str) -> Result<Vec<String>>;
    /// Returns false if the like already existed.
    fn insert_comment_like(&self, comment_id: &str, user_id: &str) -> Result<bool>;
    /// Returns false if there was no like to remove.
    fn delete_comment_like(&self, comment_id: &str, user_id: &str) -> Result<bool>;
    fn like_summary(&self, comment_id: &str, viewer_id: &str) -> Result<LikeSummary>;

    fn insert_wishlist_item(&self, item: &WishlistItem) -> Result<()>;
    fn get_wishlist_item(&self, id: &str) -> Result<Option<WishlistItem>>;
    /// Newest first.
    fn list_wishlist(&self, user_id: &str) -> Result<Vec<WishlistItem>>;
    fn delete_wishlist_item(&self, id: &str) -> Result<bool>;

    fn insert_event(&self, event: &CalendarEvent) -> Result<()>;
    fn get_event(&self, id: &str) -> Result<Option<CalendarEvent>>;
    fn update_event(&self, event: &CalendarEvent) -> Result<bool>;
    fn delete_event(&self, id: &str) -> Result<bool>;
    /// Events dated `from..=to`, by date then start time.
    fn list_events_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<CalendarEvent>>;
}

pub struct SqliteStore {
    conn: Connection,
}

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS profiles (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        username TEXT UNIQUE,
        bio TEXT,
        avatar_url TEXT
    );
    CREATE TABLE IF NOT EXISTS posts (
        id TEXT PRIMARY KEY,
        author_id TEXT NOT NULL,
        content TEXT,
        image_url TEXT,
        created_at INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS post_tags (
        post_id TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        tagged_user_id TEXT NOT NULL,
        PRIMARY KEY (post_id, tagged_user_id)
    );
    CREATE TABLE IF NOT EXISTS comments (
        id TEXT PRIMARY KEY,
        post_id TEXT NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
        author_id TEXT NOT NULL,
        content TEXT NOT NULL,
        parent_comment_id TEXT REFERENCES comments(id) ON DELETE CASCADE,
        created_at INTEGER NOT NULL
    );
    CREATE INDEX IF NOT EXISTS comments_post ON comments(post_id, created_at);
    CREATE TABLE IF NOT EXISTS comment_tags (
        comment_id TEXT NOT NULL REFERENCES comments(id) ON DELETE CASCADE,
        tagged_user_id TEXT NOT NULL,
        PRIMARY KEY (comment_id, tagged_user_id)
    );
    CREATE TABLE IF NOT EXISTS comment_likes (
        comment_id TEXT NOT NULL REFERENCES comments(id) ON DELETE CASCADE,
        user_id TEXT NOT NULL,
        PRIMARY KEY (comment_id, user_id)
    );
    CREATE TABLE IF NOT EXISTS wishlist_items (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        item TEXT NOT NULL,
        description TEXT,
        link TEXT,
        created_at INTEGER NOT NULL
    );
    CREATE TABLE IF NOT EXISTS calendar_events (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL,
        event_name TEXT NOT NULL,
        event_date TEXT NOT NULL,
        event_time TEXT,
        end_time TEXT
    );
    CREATE INDEX IF NOT EXISTS calendar_events_date ON calendar_events(event_date);
";

impl SqliteStore {
    /// Open the store described by `config`, creating tables if needed.
    pub fn open(config: &Config) -> Result<Self> {
        match &config.db_path {
            Some(path) => Self::open_path(path),
            None => Self::open_in_memory(),
        }
    }

    pub fn open_path(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                crate::error::Error::Config(format!("Failed to create storage directory: {}", e))
            })?;
        }
        let conn = Connection::open(db_path)?;
        // WAL only applies to file-backed databases.
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(journal_mode = %mode, "journal mode set");
        tracing::debug!(path = %db_path.display(), "opened sqlite store");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    fn insert_tags(&self, table: &str, key: &str, id: &str, user_ids: &[String]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let sql = format!(
                "INSERT OR IGNORE INTO {} ({}, tagged_user_id) VALUES (?1, ?2)",
                table, key
            );
            let mut stmt = tx.prepare(&sql)?;
            for user_id in user_ids {
                stmt.execute(params![id, user_id])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn tags(&self, table: &str, key: &str, id: &str) -> Result<Vec<String>> {
        let sql = format!(
            "SELECT tagged_user_id FROM {} WHERE {} = ?1 ORDER BY rowid ASC",
            table, key
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![id], |row| row.get(0))?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }
}

fn to_millis(ts: &DateTime<Utc>) -> i64 {
    ts.timestamp_millis()
}

fn from_millis(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(idx)?;
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, ms))
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        id: row.get(0)?,
        name: row.get(1)?,
        username: row.get(2)?,
        bio: row.get(3)?,
        avatar_url: row.get(4)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        author_id: row.get(1)?,
        content: row.get(2)?,
        image_url: row.get(3)?,
        created_at: from_millis(row, 4)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        post_id: row.get(1)?,
        author_id: row.get(2)?,
        content: row.get(3)?,
        parent_comment_id: row.get(4)?,
        created_at: from_millis(row, 5)?,
    })
}

fn wishlist_from_row(row: &Row<'_>) -> rusqlite::Result<WishlistItem> {
    Ok(WishlistItem {
        id: row.get(0)?,
        user_id: row.get(1)?,
        item: row.get(2)?,
        description: row.get(3)?,
        link: row.get(4)?,
        created_at: from_millis(row, 5)?,
    })
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<CalendarEvent> {
    Ok(CalendarEvent {
        id: row.get(0)?,
        user_id: row.get(1)?,
        event_name: row.get(2)?,
        event_date: row.get(3)?,
        event_time: row.get(4)?,
        end_time: row.get(5)?,
    })
}

const PROFILE_COLS: &str = "id, name, username, bio, avatar_url";
const POST_COLS: &str = "id, author_id, content, image_url, created_at";
const COMMENT_COLS: &str = "id, post_id, author_id, content, parent_comment_id, created_at";
const WISHLIST_COLS: &str = "id, user_id, item, description, link, created_at";
const EVENT_COLS: &str = "id, user_id, event_name, event_date, event_time, end_time";

impl FamilyStore for SqliteStore {
    fn upsert_profile(&self, profile: &Profile) -> Result<()> {
        self.conn.execute(
            "INSERT INTO profiles (id, name, username, bio, avatar_url)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                username = excluded.username,
                bio = excluded.bio,
                avatar_url = excluded.avatar_url",
            params![
                &profile.id,
                &profile.name,
                &profile.username,
                &profile.bio,
                &profile.avatar_url
            ],
        )?;
        Ok(())
    }

    fn get_profile(&self, id: &str) -> Result<Option<Profile>> {
        let sql = format!("SELECT {} FROM profiles WHERE id = ?1", PROFILE_COLS);
        Ok(self
            .conn
            .query_row(&sql, params![id], profile_from_row)
            .optional()?)
    }

    fn list_profiles(&self) -> Result<Vec<Profile>> {
        let sql = format!("SELECT {} FROM profiles ORDER BY name ASC", PROFILE_COLS);
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], profile_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn update_bio(&self, id: &str, bio: Option<&str>) -> Result<bool> {
        let n = self
            .conn
            .execute("UPDATE profiles SET bio = ?2 WHERE id = ?1", params![id, bio])?;
        Ok(n > 0)
    }

    fn update_avatar(&self, id: &str, avatar_url: Option<&str>) -> Result<bool> {
        let n = self.conn.execute(
            "UPDATE profiles SET avatar_url = ?2 WHERE id = ?1",
            params![id, avatar_url],
        )?;
        Ok(n > 0)
    }

    fn search_usernames(&self, prefix: &str, limit: u32) -> Result<Vec<String>> {
        let escaped = prefix
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        let mut stmt = self.conn.prepare(
            "SELECT username FROM profiles
             WHERE username LIKE ?1 ESCAPE '\\'
             ORDER BY username ASC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![format!("{}%", escaped), limit as i64], |row| {
            row.get(0)
        })?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn insert_post(&self, post: &Post) -> Result<()> {
        self.conn.execute(
            "INSERT INTO posts (id, author_id, content, image_url, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &post.id,
                &post.author_id,
                &post.content,
                &post.image_url,
                to_millis(&post.created_at)
            ],
        )?;
        Ok(())
    }

    fn get_post(&self, id: &str) -> Result<Option<Post>> {
        let sql = format!("SELECT {} FROM posts WHERE id = ?1", POST_COLS);
        Ok(self
            .conn
            .query_row(&sql, params![id], post_from_row)
            .optional()?)
    }

    fn list_posts(&self, author_id: Option<&str>) -> Result<Vec<Post>> {
        let sql = format!(
            "SELECT {} FROM posts
             WHERE ?1 IS NULL OR author_id = ?1
             ORDER BY created_at DESC, rowid DESC",
            POST_COLS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![author_id], post_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn delete_post(&self, id: &str) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM posts WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    fn insert_post_tags(&self, post_id: &str, user_ids: &[String]) -> Result<()> {
        self.insert_tags("post_tags", "post_id", post_id, user_ids)
    }

    fn post_tags(&self, post_id: &str) -> Result<Vec<String>> {
        self.tags("post_tags", "post_id", post_id)
    }

    fn insert_comment(&self, comment: &Comment) -> Result<()> {
        self.conn.execute(
            "INSERT INTO comments (id, post_id, author_id, content, parent_comment_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &comment.id,
                &comment.post_id,
                &comment.author_id,
                &comment.content,
                &comment.parent_comment_id,
                to_millis(&comment.created_at)
            ],
        )?;
        Ok(())
    }

    fn get_comment(&self, id: &str) -> Result<Option<Comment>> {
        let sql = format!("SELECT {} FROM comments WHERE id = ?1", COMMENT_COLS);
        Ok(self
            .conn
            .query_row(&sql, params![id], comment_from_row)
            .optional()?)
    }

    fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>> {
        let sql = format!(
            "SELECT {} FROM comments
             WHERE post_id = ?1
             ORDER BY created_at ASC, rowid ASC",
            COMMENT_COLS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![post_id], comment_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn delete_comment(&self, id: &str) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    fn insert_comment_tags(&self, comment_id: &str, user_ids: &[String]) -> Result<()> {
        self.insert_tags("comment_tags", "comment_id", comment_id, user_ids)
    }

    fn comment_tags(&self, comment_id: &str) -> Result<Vec<String>> {
        self.tags("comment_tags", "comment_id", comment_id)
    }

    fn insert_comment_like(&self, comment_id: &str, user_id: &str) -> Result<bool> {
        let n = self.conn.execute(
            "INSERT OR IGNORE INTO comment_likes (comment_id, user_id) VALUES (?1, ?2)",
            params![comment_id, user_id],
        )?;
        Ok(n > 0)
    }

    fn delete_comment_like(&self, comment_id: &str, user_id: &str) -> Result<bool> {
        let n = self.conn.execute(
            "DELETE FROM comment_likes WHERE comment_id = ?1 AND user_id = ?2",
            params![comment_id, user_id],
        )?;
        Ok(n > 0)
    }

    fn like_summary(&self, comment_id: &str, viewer_id: &str) -> Result<LikeSummary> {
        let (count, liked): (i64, i64) = self.conn.query_row(
            "SELECT COUNT(*), COALESCE(SUM(user_id = ?2), 0)
             FROM comment_likes WHERE comment_id = ?1",
            params![comment_id, viewer_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(LikeSummary {
            count: count as u32,
            is_liked: liked > 0,
        })
    }

    fn insert_wishlist_item(&self, item: &WishlistItem) -> Result<()> {
        self.conn.execute(
            "INSERT INTO wishlist_items (id, user_id, item, description, link, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &item.id,
                &item.user_id,
                &item.item,
                &item.description,
                &item.link,
                to_millis(&item.created_at)
            ],
        )?;
        Ok(())
    }

    fn get_wishlist_item(&self, id: &str) -> Result<Option<WishlistItem>> {
        let sql = format!("SELECT {} FROM wishlist_items WHERE id = ?1", WISHLIST_COLS);
        Ok(self
            .conn
            .query_row(&sql, params![id], wishlist_from_row)
            .optional()?)
    }

    fn list_wishlist(&self, user_id: &str) -> Result<Vec<WishlistItem>> {
        let sql = format!(
            "SELECT {} FROM wishlist_items
             WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC",
            WISHLIST_COLS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![user_id], wishlist_from_row)?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }

    fn delete_wishlist_item(&self, id: &str) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM wishlist_items WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    fn insert_event(&self, event: &CalendarEvent) -> Result<()> {
        self.conn.execute(
            "INSERT INTO calendar_events (id, user_id, event_name, event_date, event_time, end_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &event.id,
                &event.user_id,
                &event.event_name,
                &event.event_date,
                &event.event_time,
                &event.end_time
            ],
        )?;
        Ok(())
    }

    fn get_event(&self, id: &str) -> Result<Option<CalendarEvent>> {
        let sql = format!("SELECT {} FROM calendar_events WHERE id = ?1", EVENT_COLS);
        Ok(self
            .conn
            .query_row(&sql, params![id], event_from_row)
            .optional()?)
    }

    fn update_event(&self, event: &CalendarEvent) -> Result<bool> {
        let n = self.conn.execute(
            "UPDATE calendar_events
             SET event_name = ?2, event_date = ?3, event_time = ?4, end_time = ?5
             WHERE id = ?1",
            params![
                &event.id,
                &event.event_name,
                &event.event_date,
                &event.event_time,
                &event.end_time
            ],
        )?;
        Ok(n > 0)
    }

    fn delete_event(&self, id: &str) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM calendar_events WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    fn list_events_between(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<CalendarEvent>> {
        let sql = format!(
            "SELECT {} FROM calendar_events
             WHERE event_date >= ?1 AND event_date <= ?2
             ORDER BY event_date ASC, event_time IS NULL, event_time ASC, rowid ASC",
            EVENT_COLS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(
            params![
                from.format("%Y-%m-%d").to_string(),
                to.format("%Y-%m-%d").to_string()
            ],
            event_from_row,
        )?;
        Ok(rows.collect::<rusqlite::Result<_>>()?)
    }
}
