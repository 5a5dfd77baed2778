// Profile provisioning and maintenance.

use chrono::Utc;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{PortfolioListing, Profile, ProfileUpdate};
use crate::store::{self, DataStore, Filter, SelectQuery, StoreError};

const TABLE: &str = "profiles";

/// How many featured profiles the public listing highlights.
const FEATURED_LIMIT: usize = 5;

/// Fetch the caller's profile, creating an empty one on first access.
///
/// The fetch-then-insert sequence is not atomic: two concurrent first
/// requests can both attempt the insert. The store's unique constraint on
/// `user_id` turns the loser's insert into a conflict, which is handled by
/// re-fetching the winner's row instead of failing the request.
pub async fn get_or_create_profile(
    store: &dyn DataStore,
    user_id: Uuid,
) -> Result<Profile, ApiError> {
    if let Some(existing) = find_by_user(store, user_id).await? {
        return Ok(existing);
    }

    let fresh = Profile {
        id: Uuid::new_v4(),
        user_id,
        first_name: String::new(),
        last_name: String::new(),
        bio: String::new(),
        avatar_url: None,
        is_featured: false,
        updated_at: Utc::now(),
    };

    match store.insert(TABLE, vec![serde_json::to_value(&fresh).map_err(decode_err)?]).await {
        Ok(rows) => {
            let row = rows
                .into_iter()
                .next()
                .ok_or_else(|| ApiError::internal_server_error("Profile insert returned no row"))?;
            Ok(store::decode_row(row)?)
        }
        Err(StoreError::Conflict(_)) => {
            // Lost the provisioning race; the other request's row wins.
            tracing::debug!(%user_id, "profile insert conflicted, re-fetching");
            find_by_user(store, user_id)
                .await?
                .ok_or_else(|| ApiError::conflict("Profile creation conflicted and no row found"))
        }
        Err(other) => Err(other.into()),
    }
}

async fn find_by_user(store: &dyn DataStore, user_id: Uuid) -> Result<Option<Profile>, ApiError> {
    let rows = store
        .select(TABLE, SelectQuery::new().eq("user_id", json!(user_id)).limit(1))
        .await?;
    Ok(store::decode_rows(rows)?.into_iter().next())
}

/// Fetch a profile by its public identifier.
pub async fn find_by_id(store: &dyn DataStore, id: Uuid) -> Result<Option<Profile>, ApiError> {
    let rows = store.select(TABLE, SelectQuery::new().eq("id", json!(id)).limit(1)).await?;
    Ok(store::decode_rows(rows)?.into_iter().next())
}

/// Apply a partial update to the caller's profile. Omitted fields are left
/// unmodified; `updated_at` is refreshed so the public listing stays sorted
/// by recency.
pub async fn update_profile(
    store: &dyn DataStore,
    user_id: Uuid,
    update: ProfileUpdate,
) -> Result<Profile, ApiError> {
    let mut patch = Map::new();
    if let Some(first_name) = update.first_name {
        patch.insert("first_name".to_string(), json!(first_name));
    }
    if let Some(last_name) = update.last_name {
        patch.insert("last_name".to_string(), json!(last_name));
    }
    if let Some(bio) = update.bio {
        patch.insert("bio".to_string(), json!(bio));
    }
    if let Some(avatar_url) = update.avatar_url {
        patch.insert("avatar_url".to_string(), json!(avatar_url));
    }
    patch.insert("updated_at".to_string(), json!(Utc::now()));

    let rows = store
        .update(TABLE, vec![Filter::eq("user_id", json!(user_id))], Value::Object(patch))
        .await?;

    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;
    Ok(store::decode_row(row)?)
}

/// Public listing: the five most-recently-updated featured profiles plus
/// the full roster, both by recency.
pub async fn public_listing(store: &dyn DataStore) -> Result<PortfolioListing, ApiError> {
    let featured_rows = store
        .select(
            TABLE,
            SelectQuery::new()
                .eq("is_featured", json!(true))
                .order_desc("updated_at")
                .limit(FEATURED_LIMIT),
        )
        .await?;

    let list_rows = store.select(TABLE, SelectQuery::new().order_desc("updated_at")).await?;

    Ok(PortfolioListing {
        featured: store::decode_rows(featured_rows)?,
        list: store::decode_rows(list_rows)?,
    })
}

fn decode_err(e: serde_json::Error) -> ApiError {
    ApiError::internal_server_error(format!("Failed to encode profile: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();

        let first = get_or_create_profile(&store, user_id).await.unwrap();
        let second = get_or_create_profile(&store, user_id).await.unwrap();

        assert_eq!(first.id, second.id);
        let rows = store
            .select(TABLE, SelectQuery::new().eq("user_id", json!(user_id)))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn insert_conflict_falls_back_to_the_winning_row() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();

        let winner = get_or_create_profile(&store, user_id).await.unwrap();

        // Simulate losing the provisioning race: the lookup misses even
        // though the winner's row is already in place, so the insert runs
        // and trips the user_id unique constraint.
        store.miss_next_select(TABLE);
        let loser = get_or_create_profile(&store, user_id).await.unwrap();

        assert_eq!(winner.id, loser.id);
    }

    #[tokio::test]
    async fn partial_update_keeps_omitted_fields() {
        let store = MemoryStore::new();
        let user_id = Uuid::new_v4();
        get_or_create_profile(&store, user_id).await.unwrap();

        update_profile(
            &store,
            user_id,
            ProfileUpdate { first_name: Some("Ada".to_string()), ..Default::default() },
        )
        .await
        .unwrap();

        let updated = update_profile(
            &store,
            user_id,
            ProfileUpdate { bio: Some("systems tinkerer".to_string()), ..Default::default() },
        )
        .await
        .unwrap();

        assert_eq!(updated.first_name, "Ada");
        assert_eq!(updated.bio, "systems tinkerer");
    }
}
