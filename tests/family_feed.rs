use famfeed_core::calendar::{self, EventSelection, Meridiem};
use famfeed_core::display::animal_avatar;
use famfeed_core::model::Profile;
use famfeed_core::tags::{segment_mentions, Segment};
use famfeed_core::{Config, FamilyFeed, FamilyStore, SqliteStore};

fn profile(id: &str, name: &str, username: &str) -> Profile {
    Profile {
        id: id.to_string(),
        name: name.to_string(),
        username: Some(username.to_string()),
        bio: None,
        avatar_url: None,
    }
}

#[test]
fn post_comment_and_render_flow() {
    let store = SqliteStore::open(&Config::in_memory()).unwrap();
    let feed = FamilyFeed::new(store);
    feed.register_profile(&profile("0a1b2c3d", "Andrew", "andrew")).unwrap();
    feed.register_profile(&profile("ffee0011", "Dev", "devgirl")).unwrap();

    let post = feed
        .create_post("0a1b2c3d", "Beach day with @devgirl!", Some("https://blob/beach.jpg"))
        .unwrap();
    assert_eq!(feed.store().post_tags(&post.id).unwrap(), vec!["ffee0011"]);

    let c1 = feed.add_comment("ffee0011", &post.id, "so fun @andrew @unknown").unwrap();
    let reply = feed.add_reply("0a1b2c3d", &c1.id, "next year too").unwrap();
    let c2 = feed.add_comment("0a1b2c3d", &post.id, "more pics soon").unwrap();
    feed.toggle_comment_like("0a1b2c3d", &c1.id).unwrap();

    let thread = feed.comment_thread(&post.id).unwrap();
    let order: Vec<_> = thread.top_level.iter().map(|c| c.id.clone()).collect();
    assert_eq!(order, vec![c1.id.clone(), c2.id.clone()]);
    assert_eq!(thread.replies_to(&c1.id)[0].id, reply.id);
    assert_eq!(thread.rendered_len(), 3);

    let likes = feed.like_summaries("0a1b2c3d", &thread).unwrap();
    assert!(likes[&c1.id].is_liked);
    assert_eq!(likes[&c2.id].count, 0);

    let directory = feed.directory().unwrap();
    let segments = segment_mentions(&c1.content, &directory);
    let linked: Vec<_> = segments
        .iter()
        .filter_map(|s| match s {
            Segment::Mention { user_id: Some(id), .. } => Some(id.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(linked, vec!["0a1b2c3d"]);

    assert_eq!(animal_avatar("0a1b2c3d"), animal_avatar("0a1b2c3d"));

    feed.delete_post("0a1b2c3d", &post.id).unwrap();
    assert_eq!(feed.comment_thread(&post.id).unwrap().rendered_len(), 0);
}

#[test]
fn calendar_month_view() {
    let feed = FamilyFeed::new(SqliteStore::open_in_memory().unwrap());
    let mut selection = EventSelection {
        month: Some("March".into()),
        day: Some(14),
        year: Some(2025),
        hour: Some(6),
        minute: Some("30".into()),
        meridiem: Some(Meridiem::Pm),
        end_hour: Some(9),
        end_minute: Some("00".into()),
        end_meridiem: Some(Meridiem::Pm),
    };
    let dinner = feed.add_event("u1", "Pi dinner", &selection).unwrap();
    selection.day = Some(1);
    selection.hour = None;
    feed.add_event("u2", "Spring cleaning", &selection).unwrap();

    let (year, month) = calendar::next_month(2, 2025);
    let events = feed.events_in_month(month, year).unwrap();
    let names: Vec<_> = events.iter().map(|e| e.event_name.as_str()).collect();
    assert_eq!(names, vec!["Spring cleaning", "Pi dinner"]);
    assert_eq!(events[0].end_time, None);

    assert_eq!(
        calendar::format_time_range(dinner.event_time.as_deref(), dinner.end_time.as_deref())
            .as_deref(),
        Some("6:30 PM - 9:00 PM")
    );
    assert_eq!(
        calendar::format_date(&dinner.event_date).as_deref(),
        Some("March 14, 2025")
    );

    let day = chrono::NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    assert_eq!(calendar::events_on(&events, day).len(), 1);
}
