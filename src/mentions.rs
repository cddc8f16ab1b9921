//! Mentions parsing
//!
//! - Extracts `@username` tokens from post and comment text.
//! - Detects the trailing `@prefix` a user is still typing, for live tag search.
//!
//! A username is one or more ASCII word characters (`[A-Za-z0-9_]`). There is
//! no escaping and no boundary check, so `mail@home` yields `home`.

use once_cell::sync::Lazy;
use regex::Regex;

pub(crate) static MENTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z0-9_]+)").expect("mention pattern is valid"));

static PENDING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@([A-Za-z0-9_]*)$").expect("pending tag pattern is valid"));

/// Extract tagged usernames from text, without the leading `@`.
///
/// Order and duplicates are preserved. A bare `@` produces nothing.
pub fn extract_usernames(text: &str) -> Vec<String> {
    MENTION_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// The username prefix being typed at the end of `text`, if any.
///
/// Returns `None` when the text does not end in an `@` token or when only the
/// `@` itself has been typed so far.
pub fn pending_tag_query(text: &str) -> Option<&str> {
    let caps = PENDING_RE.captures(text)?;
    let query = caps.get(1)?.as_str();
    if query.is_empty() {
        None
    } else {
        Some(query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_in_order_with_duplicates() {
        let names = extract_usernames("hi @andrew and @devgirl, also @andrew!");
        assert_eq!(names, vec!["andrew", "devgirl", "andrew"]);
    }

    #[test]
    fn trailing_at_yields_nothing() {
        assert!(extract_usernames("look @").is_empty());
        assert_eq!(extract_usernames("@mom @"), vec!["mom"]);
    }

    #[test]
    fn no_boundary_check() {
        assert_eq!(extract_usernames("mail@home"), vec!["home"]);
        assert_eq!(extract_usernames("@@dad"), vec!["dad"]);
    }

    #[test]
    fn stops_at_punctuation() {
        assert_eq!(extract_usernames("@bob's cake"), vec!["bob"]);
        assert_eq!(extract_usernames("(@aunt_jo)"), vec!["aunt_jo"]);
    }

    #[test]
    fn token_count_matches_mentions() {
        let text = "@a1 x @b2 y @c_3 z";
        let names = extract_usernames(text);
        assert_eq!(names.len(), 3);
        for name in &names {
            assert!(text.contains(&format!("@{}", name)));
        }
    }

    #[test]
    fn pending_query() {
        assert_eq!(pending_tag_query("thanks @gra"), Some("gra"));
        assert_eq!(pending_tag_query("thanks @"), None);
        assert_eq!(pending_tag_query("thanks @grandma "), None);
        assert_eq!(pending_tag_query("no tags"), None);
    }
}
