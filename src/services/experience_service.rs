// Experience CRUD. Every mutation is scoped by both the experience id and
// the owning profile id, so guessed identifiers cannot reach another
// user's rows.

use std::collections::HashMap;

use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{Experience, ExperienceCreate, ExperienceUpdate};
use crate::store::{self, DataStore, Filter, SelectQuery};

use super::next_order_index;

const TABLE: &str = "experiences";

pub async fn list_experiences(
    store: &dyn DataStore,
    profile_id: Uuid,
) -> Result<Vec<Experience>, ApiError> {
    let rows = store
        .select(
            TABLE,
            SelectQuery::new().eq("profile_id", json!(profile_id)).order_asc("order_index"),
        )
        .await?;
    Ok(store::decode_rows(rows)?)
}

pub async fn create_experience(
    store: &dyn DataStore,
    profile_id: Uuid,
    input: ExperienceCreate,
) -> Result<Experience, ApiError> {
    let mut field_errors = HashMap::new();
    if input.company.as_deref().unwrap_or("").trim().is_empty() {
        field_errors.insert("company".to_string(), "This field is required".to_string());
    }
    if input.title.as_deref().unwrap_or("").trim().is_empty() {
        field_errors.insert("title".to_string(), "This field is required".to_string());
    }
    if !field_errors.is_empty() {
        return Err(ApiError::validation_error("Missing required fields", Some(field_errors)));
    }

    let order_index = match input.order_index {
        Some(explicit) => explicit,
        None => next_order_index(store, TABLE, "profile_id", profile_id).await?,
    };

    let experience = Experience {
        id: Uuid::new_v4(),
        profile_id,
        company: input.company.unwrap_or_default(),
        title: input.title.unwrap_or_default(),
        start_date: input.start_date,
        end_date: input.end_date,
        description: input.description,
        order_index,
    };

    let rows = store
        .insert(TABLE, vec![serde_json::to_value(&experience).map_err(encode_err)?])
        .await?;
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::internal_server_error("Experience insert returned no row"))?;
    Ok(store::decode_row(row)?)
}

pub async fn update_experience(
    store: &dyn DataStore,
    profile_id: Uuid,
    id: Uuid,
    update: ExperienceUpdate,
) -> Result<Experience, ApiError> {
    let mut patch = Map::new();
    if let Some(company) = update.company {
        patch.insert("company".to_string(), json!(company));
    }
    if let Some(title) = update.title {
        patch.insert("title".to_string(), json!(title));
    }
    if let Some(start_date) = update.start_date {
        patch.insert("start_date".to_string(), json!(start_date));
    }
    if let Some(end_date) = update.end_date {
        patch.insert("end_date".to_string(), json!(end_date));
    }
    if let Some(description) = update.description {
        patch.insert("description".to_string(), json!(description));
    }
    if let Some(order_index) = update.order_index {
        patch.insert("order_index".to_string(), json!(order_index));
    }

    if patch.is_empty() {
        // Nothing to change; still verify the scoped row exists.
        return fetch_scoped(store, profile_id, id).await;
    }

    let rows = store
        .update(TABLE, scoped_filters(profile_id, id), Value::Object(patch))
        .await?;
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("Experience not found"))?;
    Ok(store::decode_row(row)?)
}

pub async fn delete_experience(
    store: &dyn DataStore,
    profile_id: Uuid,
    id: Uuid,
) -> Result<(), ApiError> {
    let deleted = store.delete(TABLE, scoped_filters(profile_id, id)).await?;
    if deleted == 0 {
        return Err(ApiError::not_found("Experience not found"));
    }
    Ok(())
}

async fn fetch_scoped(
    store: &dyn DataStore,
    profile_id: Uuid,
    id: Uuid,
) -> Result<Experience, ApiError> {
    let rows = store
        .select(
            TABLE,
            SelectQuery::new().eq("id", json!(id)).eq("profile_id", json!(profile_id)).limit(1),
        )
        .await?;
    store::decode_rows(rows)?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("Experience not found"))
}

fn scoped_filters(profile_id: Uuid, id: Uuid) -> Vec<Filter> {
    vec![Filter::eq("id", json!(id)), Filter::eq("profile_id", json!(profile_id))]
}

fn encode_err(e: serde_json::Error) -> ApiError {
    ApiError::internal_server_error(format!("Failed to encode experience: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    fn minimal(company: &str, title: &str) -> ExperienceCreate {
        ExperienceCreate {
            company: Some(company.to_string()),
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_without_company_is_a_validation_error() {
        let store = MemoryStore::new();
        let result = create_experience(
            &store,
            Uuid::new_v4(),
            ExperienceCreate { title: Some("Engineer".to_string()), ..Default::default() },
        )
        .await;

        match result {
            Err(ApiError::ValidationError { field_errors: Some(errors), .. }) => {
                assert!(errors.contains_key("company"));
            }
            other => panic!("expected validation error, got {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn auto_order_assigns_one_then_two() {
        let store = MemoryStore::new();
        let profile_id = Uuid::new_v4();

        let first = create_experience(&store, profile_id, minimal("Acme", "Engineer"))
            .await
            .unwrap();
        let second = create_experience(&store, profile_id, minimal("Initech", "Lead"))
            .await
            .unwrap();

        assert_eq!(first.order_index, 1);
        assert_eq!(second.order_index, 2);
    }

    #[tokio::test]
    async fn update_scoped_to_another_profile_is_not_found() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let created = create_experience(&store, owner, minimal("Acme", "Engineer"))
            .await
            .unwrap();

        let stranger = Uuid::new_v4();
        let result = update_experience(
            &store,
            stranger,
            created.id,
            ExperienceUpdate { title: Some("Hijacked".to_string()), ..Default::default() },
        )
        .await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));

        // The row is untouched.
        let kept = fetch_scoped(&store, owner, created.id).await.unwrap();
        assert_eq!(kept.title, "Engineer");
    }
}
