use super::*;
use serde_json::json;

#[test]
fn poll_decodes_stored_keys() {
    let poll: Poll = serde_json::from_value(json!({
        "nume": "Ion Popescu",
        "pozitie": "Primar",
        "detalii": "<p>Detalii</p>",
        "sursa": "https://example.ro",
        "poza": "https://img/1.png",
        "tipSondaj": "persoana",
        "timestamp": 1_700_000_000_000_i64,
        "createdAt": 1_700_000_000_000_i64
    }))
    .unwrap();
    assert_eq!(poll.name, "Ion Popescu");
    assert_eq!(poll.category, Category::Person);
    assert_eq!(poll.title(), "Ion Popescu - Primar");
    assert_eq!(poll.source(), Some("https://example.ro"));
    assert!(poll.votes.is_none());
}

#[test]
fn unknown_category_decodes_as_other() {
    let poll: Poll = serde_json::from_value(json!({"nume": "X", "tipSondaj": "sport"})).unwrap();
    assert_eq!(poll.category, Category::Other);
}

#[test]
fn poll_serialization_omits_id_and_live_fields() {
    let poll = Poll {
        id: "p1".into(),
        name: "Lege".into(),
        category: Category::Law,
        votes: Some(vec![Vote::default()]),
        ..Poll::default()
    };
    let value = serde_json::to_value(&poll).unwrap();
    assert!(value.get("id").is_none());
    assert!(value.get("votes").is_none());
    assert!(value.get("sursa").is_none());
    assert_eq!(value["tipSondaj"], "lege");
}

#[test]
fn blank_source_is_none() {
    let poll = Poll { source: Some("  ".into()), ..Poll::default() };
    assert_eq!(poll.source(), None);
}

#[test]
fn title_without_position_is_name() {
    let poll = Poll { name: "Partidul X".into(), ..Poll::default() };
    assert_eq!(poll.title(), "Partidul X");
}

#[test]
fn category_parse_is_strict() {
    assert_eq!(Category::parse("partid"), Some(Category::Party));
    assert_eq!(Category::parse("Partid"), None);
    assert_eq!(Category::parse(""), None);
}

#[test]
fn comment_decodes_inline_reactions() {
    let comment: Comment = serde_json::from_value(json!({
        "uid": "u1",
        "displayName": null,
        "comentariu": "Bun",
        "timestamp": 5,
        "votes": {"u2": {"vot": true, "timestamp": 6}},
        "upvotesCount": 1
    }))
    .unwrap();
    assert_eq!(comment.author(), "Anonim");
    assert!(comment.votes["u2"].like);
    assert_eq!(comment.upvotes_count, 1);
}

#[test]
fn vote_uses_vot_key() {
    let vote = Vote { uid: "u1".into(), choice: true, timestamp: 1 };
    assert_eq!(serde_json::to_value(&vote).unwrap(), json!({"vot": true, "timestamp": 1}));
}

#[test]
fn last_modified_prefers_updated_at() {
    let poll = Poll { timestamp: 1, created_at: Some(2), updated_at: Some(3), ..Poll::default() };
    assert_eq!(poll.last_modified(), 3);
    let poll = Poll { timestamp: 1, ..Poll::default() };
    assert_eq!(poll.last_modified(), 1);
}
