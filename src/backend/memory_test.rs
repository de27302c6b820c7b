use super::*;
use serde_json::json;

fn data(value: Value) -> Data {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

#[tokio::test]
async fn add_then_get() {
    let store = MemoryStore::new();
    let id = store.add("sondaje", data(json!({"nume": "A"}))).await.unwrap();
    let doc = store.get(&format!("sondaje/{id}")).await.unwrap().unwrap();
    assert_eq!(doc["nume"], "A");
}

#[tokio::test]
async fn add_rejects_document_path() {
    let store = MemoryStore::new();
    let result = store.add("sondaje/p1", Data::new()).await;
    assert!(matches!(result, Err(StoreError::InvalidPath(_))));
}

#[tokio::test]
async fn set_merge_is_deep() {
    let store = MemoryStore::new();
    store.seed("c/x", json!({"votes": {"a": {"vot": true}}, "n": 1})).unwrap();
    store
        .set("c/x", data(json!({"votes": {"b": {"vot": false}}})), true)
        .await
        .unwrap();
    let doc = store.peek("c/x").unwrap();
    assert_eq!(doc["votes"]["a"]["vot"], true);
    assert_eq!(doc["votes"]["b"]["vot"], false);
    assert_eq!(doc["n"], 1);
}

#[tokio::test]
async fn set_without_merge_replaces() {
    let store = MemoryStore::new();
    store.seed("c/x", json!({"a": 1})).unwrap();
    store.set("c/x", data(json!({"b": 2})), false).await.unwrap();
    assert_eq!(store.peek("c/x").unwrap(), json!({"b": 2}));
}

#[tokio::test]
async fn delete_and_count() {
    let store = MemoryStore::new();
    store.seed("c/x", json!({})).unwrap();
    store.seed("c/y", json!({})).unwrap();
    assert_eq!(store.count("c").await.unwrap(), 2);
    store.delete("c/x").await.unwrap();
    assert_eq!(store.count("c").await.unwrap(), 1);
    assert_eq!(store.count("missing").await.unwrap(), 0);
}

#[tokio::test]
async fn subscription_receives_initial_and_updates() {
    let store = MemoryStore::new();
    store.seed("c/x", json!({"t": 1})).unwrap();
    let mut sub = store.subscribe(Query::collection("c")).await.unwrap();
    assert_eq!(sub.snapshots.borrow_and_update().docs.len(), 1);

    store.seed("c/y", json!({"t": 2})).unwrap();
    sub.snapshots.changed().await.unwrap();
    assert_eq!(sub.snapshots.borrow_and_update().docs.len(), 2);
}

#[tokio::test]
async fn subscription_ignores_other_collections() {
    let store = MemoryStore::new();
    let mut sub = store.subscribe(Query::collection("c")).await.unwrap();
    sub.snapshots.borrow_and_update();
    store.seed("d/x", json!({})).unwrap();
    assert!(!sub.snapshots.has_changed().unwrap());
}

#[tokio::test]
async fn ordered_limited_query() {
    let store = MemoryStore::new();
    for (id, ts) in [("a", 3), ("b", 1), ("c", 2), ("d", 5)] {
        store.seed(&format!("c/{id}"), json!({"timestamp": ts})).unwrap();
    }
    store.seed("c/no-ts", json!({})).unwrap();
    let query = Query::collection("c").order_by("timestamp", SortDirection::Desc).limit(3);
    let sub = store.subscribe(query).await.unwrap();
    let ids: Vec<String> = sub.snapshots.borrow().docs.iter().map(|d| d.id.clone()).collect();
    assert_eq!(ids, ["d", "a", "c"]);
}

#[tokio::test]
async fn unsubscribe_stops_publishing() {
    let store = MemoryStore::new();
    let mut sub = store.subscribe(Query::collection("c")).await.unwrap();
    sub.snapshots.borrow_and_update();
    store.unsubscribe(sub.id);
    store.seed("c/x", json!({})).unwrap();
    // Sender dropped: no new value, channel closed.
    assert!(sub.snapshots.changed().await.is_err());
    assert_eq!(store.active_subscriptions(), 0);
}

#[tokio::test]
async fn dropped_receivers_are_pruned() {
    let store = MemoryStore::new();
    let sub = store.subscribe(Query::collection("c")).await.unwrap();
    assert_eq!(store.active_subscriptions(), 1);
    drop(sub);
    assert_eq!(store.active_subscriptions(), 0);
}

#[tokio::test]
async fn transact_writes_and_returns_document() {
    let store = MemoryStore::new();
    store.seed("c/x", json!({"n": 1})).unwrap();
    let body = |current: Option<&Value>| {
        let n = current.and_then(|d| d["n"].as_i64()).unwrap_or(0);
        TxDecision::Write(data(json!({"n": n + 1})))
    };
    let after = store.transact("c/x", &body).await.unwrap().unwrap();
    assert_eq!(after["n"], 2);
}

#[tokio::test]
async fn transact_abort_leaves_document() {
    let store = MemoryStore::new();
    let body = |current: Option<&Value>| match current {
        Some(_) => TxDecision::Write(Data::new()),
        None => TxDecision::Abort,
    };
    assert!(store.transact("c/missing", &body).await.unwrap().is_none());
    assert!(store.peek("c/missing").is_none());
}

#[tokio::test]
async fn offline_fails_every_call() {
    let store = MemoryStore::new();
    store.set_offline(true);
    assert!(matches!(store.get("c/x").await, Err(StoreError::Unavailable(_))));
    assert!(matches!(store.add("c", Data::new()).await, Err(StoreError::Unavailable(_))));
    assert!(store.subscribe(Query::collection("c")).await.is_err());
    store.set_offline(false);
    assert!(store.get("c/x").await.unwrap().is_none());
}

#[test]
fn data_file_round_trips_through_json_and_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryStore::new();
    store.seed("sondaje/p1", json!({"nume": "Ion", "tipSondaj": "persoana"})).unwrap();
    let dump = store.export();

    for name in ["data.json", "data.yaml"] {
        let path = dir.path().join(name);
        dump.save(&path).unwrap();
        let restored = MemoryStore::from_data_file(DataFile::load(&path).unwrap());
        assert_eq!(restored.peek("sondaje/p1").unwrap()["nume"], "Ion");
    }
}

#[test]
fn missing_data_file_is_empty() {
    let dir = tempfile::tempdir().unwrap();
    let file = DataFile::load(&dir.path().join("nope.json")).unwrap();
    assert!(file.collections.is_empty());
}
