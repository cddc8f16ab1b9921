//! Tag resolution
//!
//! Maps `@username` mentions to user ids through a [`UserDirectory`]. The
//! same lookup decides which users get a tag record and which inline
//! mentions render as profile links.

use std::collections::{BTreeMap, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::mentions::MENTION_RE;
use crate::model::Profile;

/// Username to user id lookup. A miss is `None`, never an error.
pub trait UserDirectory {
    fn user_id(&self, username: &str) -> Option<&str>;
}

impl UserDirectory for HashMap<String, String> {
    fn user_id(&self, username: &str) -> Option<&str> {
        self.get(username).map(String::as_str)
    }
}

impl UserDirectory for BTreeMap<String, String> {
    fn user_id(&self, username: &str) -> Option<&str> {
        self.get(username).map(String::as_str)
    }
}

/// Build a directory from profiles. Profiles without a username are skipped.
pub fn directory_from_profiles<'a>(
    profiles: impl IntoIterator<Item = &'a Profile>,
) -> HashMap<String, String> {
    profiles
        .into_iter()
        .filter_map(|p| p.username.clone().map(|u| (u, p.id.clone())))
        .collect()
}

/// Resolve usernames to user ids, dropping unknown names. Order and
/// duplicates follow the input.
pub fn resolve_tags<D: UserDirectory + ?Sized>(usernames: &[String], directory: &D) -> Vec<String> {
    usernames
        .iter()
        .filter_map(|name| directory.user_id(name))
        .map(str::to_string)
        .collect()
}

/// First occurrence of each id, in order. The tag tables key on
/// (target, user), so this is what gets inserted.
pub fn unique_ids(ids: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    ids.into_iter().filter(|id| seen.insert(id.clone())).collect()
}

/// A piece of rendered content.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    Text { text: String },
    /// `username` excludes the `@`. `user_id` is set when it resolved and
    /// the renderer should link to that profile.
    Mention {
        username: String,
        user_id: Option<String>,
    },
}

impl Segment {
    /// The original source text of this segment.
    pub fn source(&self) -> String {
        match self {
            Segment::Text { text } => text.clone(),
            Segment::Mention { username, .. } => format!("@{}", username),
        }
    }
}

/// Split content around each `@username` token.
pub fn segment_mentions<D: UserDirectory + ?Sized>(content: &str, directory: &D) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in MENTION_RE.captures_iter(content) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if whole.start() > last {
            segments.push(Segment::Text {
                text: content[last..whole.start()].to_string(),
            });
        }
        let username = name.as_str().to_string();
        let user_id = directory.user_id(&username).map(str::to_string);
        segments.push(Segment::Mention { username, user_id });
        last = whole.end();
    }

    if last < content.len() {
        segments.push(Segment::Text {
            text: content[last..].to_string(),
        });
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> HashMap<String, String> {
        let mut d = HashMap::new();
        d.insert("mom".to_string(), "id-mom".to_string());
        d.insert("dad".to_string(), "id-dad".to_string());
        d
    }

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolves_known_and_filters_unknown() {
        let ids = resolve_tags(&names(&["mom", "stranger", "dad", "mom"]), &directory());
        assert_eq!(ids, vec!["id-mom", "id-dad", "id-mom"]);
    }

    #[test]
    fn only_returns_directory_values() {
        let dir = directory();
        let values: HashSet<&String> = dir.values().collect();
        for id in resolve_tags(&names(&["mom", "x", "dad", "y"]), &dir) {
            assert!(values.contains(&id));
        }
    }

    #[test]
    fn lookup_is_case_sensitive() {
        assert!(resolve_tags(&names(&["Mom"]), &directory()).is_empty());
    }

    #[test]
    fn unique_keeps_first_occurrence() {
        let ids = unique_ids(names(&["b", "a", "b", "c", "a"]));
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn directory_skips_profiles_without_username() {
        let profiles = vec![
            Profile {
                id: "1".into(),
                name: "Grandma".into(),
                username: Some("grandma".into()),
                bio: None,
                avatar_url: None,
            },
            Profile {
                id: "2".into(),
                name: "Baby".into(),
                username: None,
                bio: None,
                avatar_url: None,
            },
        ];
        let dir = directory_from_profiles(&profiles);
        assert_eq!(dir.len(), 1);
        assert_eq!(dir.user_id("grandma"), Some("1"));
    }

    #[test]
    fn segments_link_only_resolved_mentions() {
        let segments = segment_mentions("hi @mom and @nobody!", &directory());
        assert_eq!(
            segments,
            vec![
                Segment::Text { text: "hi ".into() },
                Segment::Mention {
                    username: "mom".into(),
                    user_id: Some("id-mom".into())
                },
                Segment::Text { text: " and ".into() },
                Segment::Mention {
                    username: "nobody".into(),
                    user_id: None
                },
                Segment::Text { text: "!".into() },
            ]
        );
    }

    #[test]
    fn segments_reassemble_source() {
        let text = "@dad@mom trailing @ end";
        let joined: String = segment_mentions(text, &directory())
            .iter()
            .map(Segment::source)
            .collect();
        assert_eq!(joined, text);
    }

    #[test]
    fn segments_of_plain_text() {
        assert_eq!(
            segment_mentions("plain", &directory()),
            vec![Segment::Text { text: "plain".into() }]
        );
        assert!(segment_mentions("", &directory()).is_empty());
    }
}
