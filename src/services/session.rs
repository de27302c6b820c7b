//! User profiles: merged into `users/{uid}` on sign-in.

use tracing::info;

use crate::backend::{DocumentStore, StoreError, paths, to_data};
use crate::types::{User, UserProfile};
use crate::util::now_ms;

/// Upsert the signed-in user's profile record.
///
/// # Errors
///
/// Returns the store error when the write fails.
pub async fn record_profile(store: &dyn DocumentStore, user: &User) -> Result<(), StoreError> {
    let profile = UserProfile::from_user(user, now_ms());
    store.set(&paths::user(&user.uid), to_data(&profile)?, true).await?;
    info!(uid = %user.uid, "profile recorded");
    Ok(())
}

/// Stored profile for `uid`, if any.
///
/// # Errors
///
/// Returns the store error when the read or decode fails.
pub async fn load_profile(store: &dyn DocumentStore, uid: &str) -> Result<Option<User>, StoreError> {
    let path = paths::user(uid);
    let Some(data) = store.get(&path).await? else {
        return Ok(None);
    };
    let profile: UserProfile =
        serde_json::from_value(data).map_err(|source| StoreError::Decode { path, source })?;
    Ok(Some(profile.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::memory::MemoryStore;
    use serde_json::json;

    fn ana() -> User {
        User {
            uid: "u-ana".into(),
            display_name: Some("Ana".into()),
            email: Some("ana@x.ro".into()),
            photo_url: None,
            email_verified: true,
        }
    }

    #[tokio::test]
    async fn profile_is_merged_not_replaced() {
        let store = MemoryStore::new();
        store.seed("users/u-ana", json!({"role": "reader"})).unwrap();
        record_profile(&store, &ana()).await.unwrap();
        let doc = store.peek("users/u-ana").unwrap();
        assert_eq!(doc["role"], "reader");
        assert_eq!(doc["email"], "ana@x.ro");
        assert!(doc["lastSignInTime"].is_i64());
    }

    #[tokio::test]
    async fn load_round_trips() {
        let store = MemoryStore::new();
        record_profile(&store, &ana()).await.unwrap();
        assert_eq!(load_profile(&store, "u-ana").await.unwrap(), Some(ana()));
        assert_eq!(load_profile(&store, "nobody").await.unwrap(), None);
    }
}
