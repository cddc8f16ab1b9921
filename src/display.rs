//! Display helpers for profile avatars and timestamps.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

const ANIMALS: [&str; 10] = ["🦁", "🐼", "🦊", "🐨", "🐸", "🦉", "🐷", "🐮", "🐵", "🐶"];

/// Fallback avatar for users without a photo, stable per user id.
///
/// The leading hex digits of the first 8 characters pick the animal. Ids
/// that do not start with a hex digit are hashed instead.
pub fn animal_avatar(user_id: &str) -> &'static str {
    let prefix: String = user_id
        .chars()
        .take(8)
        .take_while(|c| c.is_ascii_hexdigit())
        .collect();

    let value = match u64::from_str_radix(&prefix, 16) {
        Ok(v) => v,
        Err(_) => {
            let digest = Sha256::digest(user_id.as_bytes());
            u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]) as u64
        }
    };
    ANIMALS[(value % ANIMALS.len() as u64) as usize]
}

/// Short relative label for a post timestamp.
///
/// "just now" under a minute, then minutes, hours and days, then the
/// calendar date (`Jan 5, 2024`) from a week on. Timestamps in the future
/// count as "just now".
pub fn relative_time(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - created_at).num_seconds();
    match secs {
        s if s < 60 => "just now".to_string(),
        s if s < 3_600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3_600),
        s if s < 604_800 => format!("{}d ago", s / 86_400),
        _ => created_at.format("%b %-d, %Y").to_string(),
    }
}

/// Relative label for a comment timestamp.
///
/// Like [`relative_time`] up to a day, then the month and day only
/// (`Jan 5`). Comments have no "days ago" step.
pub fn comment_time(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - created_at).num_seconds();
    match secs {
        s if s < 60 => "just now".to_string(),
        s if s < 3_600 => format!("{}m ago", s / 60),
        s if s < 86_400 => format!("{}h ago", s / 3_600),
        _ => created_at.format("%b %-d").to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn avatar_from_hex_prefix() {
        // 0x0000000a = 10 -> index 0
        assert_eq!(animal_avatar("0000000a-ffff"), ANIMALS[0]);
        // 0x00000003 = 3 -> index 3
        assert_eq!(animal_avatar("00000003"), ANIMALS[3]);
        // only "1f" is hex before the dash -> 31 -> index 1
        assert_eq!(animal_avatar("1f-zzzzz"), ANIMALS[1]);
    }

    #[test]
    fn avatar_is_stable_for_non_hex_ids() {
        let a = animal_avatar("grandma");
        assert_eq!(a, animal_avatar("grandma"));
        assert!(ANIMALS.contains(&a));
    }

    #[test]
    fn relative_labels() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(relative_time(now - Duration::seconds(30), now), "just now");
        assert_eq!(relative_time(now + Duration::seconds(30), now), "just now");
        assert_eq!(relative_time(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(relative_time(now - Duration::hours(3), now), "3h ago");
        assert_eq!(relative_time(now - Duration::days(2), now), "2d ago");
        assert_eq!(relative_time(now - Duration::days(30), now), "Feb 9, 2024");
    }

    #[test]
    fn comment_labels_skip_days() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(comment_time(now - Duration::seconds(10), now), "just now");
        assert_eq!(comment_time(now - Duration::minutes(59), now), "59m ago");
        assert_eq!(comment_time(now - Duration::hours(23), now), "23h ago");
        assert_eq!(comment_time(now - Duration::days(2), now), "Mar 8");
        assert_eq!(comment_time(now - Duration::days(30), now), "Feb 9");
    }
}
