use super::*;
use crate::backend::memory::MemoryStore;
use crate::types::SortDirection;

fn ana() -> User {
    User { uid: "u-ana".into(), display_name: Some("Ana".into()), ..User::default() }
}

#[tokio::test]
async fn add_comment_stores_author_and_zero_upvotes() {
    let store = MemoryStore::new();
    let id = add_comment(&store, "p1", "Sunt de acord", &ana()).await.unwrap();
    let doc = store.peek(&paths::comment("p1", &id)).unwrap();
    assert_eq!(doc["comentariu"], "Sunt de acord");
    assert_eq!(doc["displayName"], "Ana");
    assert_eq!(doc["upvotesCount"], 0);
    assert!(doc.get("id").is_none());
}

#[tokio::test]
async fn react_records_vote_and_recomputes_count() {
    let store = MemoryStore::new();
    let id = add_comment(&store, "p1", "Text", &ana()).await.unwrap();

    let update = react(&store, "p1", &id, "u1", true).await.unwrap();
    assert_eq!(update.upvotes_count, 1);
    let update = react(&store, "p1", &id, "u2", false).await.unwrap();
    assert_eq!(update.upvotes_count, 1);
    assert_eq!(update.votes.len(), 2);

    // Changing a reaction overwrites it.
    let update = react(&store, "p1", &id, "u1", false).await.unwrap();
    assert_eq!(update.upvotes_count, 0);
    assert!(!update.votes["u1"].like);
    assert_eq!(store.peek(&paths::comment("p1", &id)).unwrap()["upvotesCount"], 0);
}

#[tokio::test]
async fn react_on_missing_comment_fails() {
    let store = MemoryStore::new();
    let err = react(&store, "p1", "nope", "u1", true).await.unwrap_err();
    assert!(matches!(err, AppError::CommentNotFound(id) if id == "nope"));
    assert!(store.peek(&paths::comment("p1", "nope")).is_none());
}

#[test]
fn query_orders_and_limits() {
    let query = comments_query("p1", CommentOrder::TOP, 10);
    assert_eq!(query.collection, "sondaje/p1/comentarii");
    let order = query.order_by.unwrap();
    assert_eq!(order.field, "upvotesCount");
    assert_eq!(order.direction, SortDirection::Desc);
    assert_eq!(query.limit, Some(10));
}

#[tokio::test]
async fn snapshot_keeps_query_order() {
    let store = MemoryStore::new();
    for (id, ts) in [("c1", 1), ("c2", 3), ("c3", 2)] {
        store
            .seed(
                &paths::comment("p1", id),
                json!({"uid": "u", "comentariu": "abc", "timestamp": ts, "upvotesCount": 0}),
            )
            .unwrap();
    }
    let sub = store.subscribe(comments_query("p1", CommentOrder::NEWEST, 2)).await.unwrap();
    let comments = comments_from_snapshot(&sub.snapshots.borrow());
    let ids: Vec<&str> = comments.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["c2", "c3"]);
}
