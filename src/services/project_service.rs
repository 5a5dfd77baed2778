// Project CRUD with nested parts. Parts are always fetched and replaced as
// a set scoped to their parent project; a project update carrying a `parts`
// list replaces every existing part, while an absent list leaves them alone.

use std::collections::HashMap;

use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    Project, ProjectCreate, ProjectPart, ProjectPartInput, ProjectUpdate, ProjectView,
    PROJECT_COLUMNS,
};
use crate::store::{self, DataStore, Filter, SelectQuery};

use super::portfolio_service::{attach_parts, fetch_parts};
use super::next_order_index;

const TABLE: &str = "projects";
const PARTS_TABLE: &str = "project_parts";

/// List the caller's projects with their parts attached, both ordered.
pub async fn list_projects(
    store: &dyn DataStore,
    profile_id: Uuid,
) -> Result<Vec<ProjectView>, ApiError> {
    let rows = store
        .select(
            TABLE,
            SelectQuery::new()
                .columns(PROJECT_COLUMNS)
                .eq("profile_id", json!(profile_id))
                .order_asc("order_index"),
        )
        .await?;
    let projects: Vec<Project> = store::decode_rows(rows)?;
    let parts = fetch_parts(store, &projects).await?;
    Ok(attach_parts(projects, parts))
}

pub async fn create_project(
    store: &dyn DataStore,
    profile_id: Uuid,
    input: ProjectCreate,
) -> Result<ProjectView, ApiError> {
    if input.title.as_deref().unwrap_or("").trim().is_empty() {
        let mut field_errors = HashMap::new();
        field_errors.insert("title".to_string(), "This field is required".to_string());
        return Err(ApiError::validation_error("Missing required fields", Some(field_errors)));
    }

    let order_index = match input.order_index {
        Some(explicit) => explicit,
        None => next_order_index(store, TABLE, "profile_id", profile_id).await?,
    };

    let project = Project {
        id: Uuid::new_v4(),
        profile_id,
        title: input.title.unwrap_or_default(),
        subtitle: input.subtitle,
        cover_image_url: input.cover_image_url,
        order_index,
    };

    let rows = store
        .insert(TABLE, vec![serde_json::to_value(&project).map_err(encode_err)?])
        .await?;
    let row = rows
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::internal_server_error("Project insert returned no row"))?;
    let project: Project = store::decode_row(row)?;

    let parts = match input.parts {
        Some(inputs) if !inputs.is_empty() => insert_parts(store, project.id, inputs).await?,
        _ => Vec::new(),
    };

    Ok(ProjectView { project, parts })
}

pub async fn update_project(
    store: &dyn DataStore,
    profile_id: Uuid,
    id: Uuid,
    update: ProjectUpdate,
) -> Result<ProjectView, ApiError> {
    let mut patch = Map::new();
    if let Some(title) = update.title {
        patch.insert("title".to_string(), json!(title));
    }
    if let Some(subtitle) = update.subtitle {
        patch.insert("subtitle".to_string(), json!(subtitle));
    }
    if let Some(cover_image_url) = update.cover_image_url {
        patch.insert("cover_image_url".to_string(), json!(cover_image_url));
    }
    if let Some(order_index) = update.order_index {
        patch.insert("order_index".to_string(), json!(order_index));
    }

    // Scope check happens through the patched/fetched row either way.
    let project = if patch.is_empty() {
        fetch_scoped(store, profile_id, id).await?
    } else {
        let rows = store
            .update(TABLE, scoped_filters(profile_id, id), Value::Object(patch))
            .await?;
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::not_found("Project not found"))?;
        store::decode_row(row)?
    };

    let parts = match update.parts {
        // Replace-on-update: wipe and bulk-insert the supplied set. Not
        // transactional; the store exposes no multi-statement transaction,
        // so a reader can observe a momentarily empty part list.
        Some(inputs) => {
            store
                .delete(PARTS_TABLE, vec![Filter::eq("project_id", json!(project.id))])
                .await?;
            if inputs.is_empty() {
                Vec::new()
            } else {
                insert_parts(store, project.id, inputs).await?
            }
        }
        // Omitted entirely: existing parts stay untouched.
        None => fetch_parts(store, std::slice::from_ref(&project)).await?,
    };

    Ok(ProjectView { project, parts })
}

pub async fn delete_project(
    store: &dyn DataStore,
    profile_id: Uuid,
    id: Uuid,
) -> Result<(), ApiError> {
    // Verify ownership before touching child rows, so a guessed project id
    // cannot strip another user's parts.
    let project = fetch_scoped(store, profile_id, id).await?;

    // Best-effort child cleanup: a failure here is logged but does not
    // block the project deletion itself.
    if let Err(err) = store
        .delete(PARTS_TABLE, vec![Filter::eq("project_id", json!(project.id))])
        .await
    {
        tracing::warn!(project_id = %project.id, "failed to delete project parts: {}", err);
    }

    let deleted = store.delete(TABLE, scoped_filters(profile_id, id)).await?;
    if deleted == 0 {
        return Err(ApiError::not_found("Project not found"));
    }
    Ok(())
}

/// Bulk-insert a part set, assigning sequential display order from list
/// position wherever the caller left it unset.
async fn insert_parts(
    store: &dyn DataStore,
    project_id: Uuid,
    inputs: Vec<ProjectPartInput>,
) -> Result<Vec<ProjectPart>, ApiError> {
    let rows: Vec<Value> = inputs
        .into_iter()
        .enumerate()
        .map(|(position, input)| {
            let part = ProjectPart {
                id: Uuid::new_v4(),
                project_id,
                title: input.title,
                content: input.content,
                image_url: input.image_url,
                link_url: input.link_url,
                kind: input.kind,
                order_index: input.order_index.unwrap_or(position as i32 + 1),
            };
            serde_json::to_value(&part).map_err(encode_err)
        })
        .collect::<Result<_, _>>()?;

    let inserted = store.insert(PARTS_TABLE, rows).await?;
    let mut parts: Vec<ProjectPart> = store::decode_rows(inserted)?;
    parts.sort_by_key(|part| part.order_index);
    Ok(parts)
}

async fn fetch_scoped(
    store: &dyn DataStore,
    profile_id: Uuid,
    id: Uuid,
) -> Result<Project, ApiError> {
    let rows = store
        .select(
            TABLE,
            SelectQuery::new()
                .columns(PROJECT_COLUMNS)
                .eq("id", json!(id))
                .eq("profile_id", json!(profile_id))
                .limit(1),
        )
        .await?;
    store::decode_rows(rows)?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::not_found("Project not found"))
}

fn scoped_filters(profile_id: Uuid, id: Uuid) -> Vec<Filter> {
    vec![Filter::eq("id", json!(id)), Filter::eq("profile_id", json!(profile_id))]
}

fn encode_err(e: serde_json::Error) -> ApiError {
    ApiError::internal_server_error(format!("Failed to encode project: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryStore;

    fn titled(title: &str) -> ProjectCreate {
        ProjectCreate { title: Some(title.to_string()), ..Default::default() }
    }

    fn part_titled(title: &str) -> ProjectPartInput {
        ProjectPartInput { title: Some(title.to_string()), ..Default::default() }
    }

    #[tokio::test]
    async fn create_assigns_sequential_part_order_from_position() {
        let store = MemoryStore::new();
        let profile_id = Uuid::new_v4();

        let view = create_project(
            &store,
            profile_id,
            ProjectCreate {
                title: Some("Atlas".to_string()),
                parts: Some(vec![part_titled("intro"), part_titled("body"), part_titled("coda")]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let orders: Vec<i32> = view.parts.iter().map(|p| p.order_index).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn empty_parts_list_clears_and_omission_preserves() {
        let store = MemoryStore::new();
        let profile_id = Uuid::new_v4();
        let view = create_project(
            &store,
            profile_id,
            ProjectCreate {
                title: Some("Atlas".to_string()),
                parts: Some(vec![part_titled("intro")]),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        let project_id = view.project.id;

        // Omitting parts leaves the existing set alone.
        let untouched = update_project(
            &store,
            profile_id,
            project_id,
            ProjectUpdate { subtitle: Some("v2".to_string()), ..Default::default() },
        )
        .await
        .unwrap();
        assert_eq!(untouched.parts.len(), 1);

        // An explicit empty list wipes them.
        let cleared = update_project(
            &store,
            profile_id,
            project_id,
            ProjectUpdate { parts: Some(Vec::new()), ..Default::default() },
        )
        .await
        .unwrap();
        assert!(cleared.parts.is_empty());
    }

    #[tokio::test]
    async fn partial_update_leaves_other_fields_alone() {
        let store = MemoryStore::new();
        let profile_id = Uuid::new_v4();
        let view = create_project(
            &store,
            profile_id,
            ProjectCreate {
                title: Some("Atlas".to_string()),
                subtitle: Some("maps".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let updated = update_project(
            &store,
            profile_id,
            view.project.id,
            ProjectUpdate { title: Some("Atlas II".to_string()), ..Default::default() },
        )
        .await
        .unwrap();

        assert_eq!(updated.project.title, "Atlas II");
        assert_eq!(updated.project.subtitle.as_deref(), Some("maps"));
    }

    #[tokio::test]
    async fn delete_removes_project_and_parts() {
        let store = MemoryStore::new();
        let profile_id = Uuid::new_v4();
        let view = create_project(
            &store,
            profile_id,
            ProjectCreate {
                title: Some("Atlas".to_string()),
                parts: Some(vec![part_titled("intro")]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        delete_project(&store, profile_id, view.project.id).await.unwrap();

        assert!(list_projects(&store, profile_id).await.unwrap().is_empty());
        let orphaned = store
            .select(
                PARTS_TABLE,
                SelectQuery::new().eq("project_id", json!(view.project.id)),
            )
            .await
            .unwrap();
        assert!(orphaned.is_empty());
    }

    #[tokio::test]
    async fn delete_scoped_to_another_profile_keeps_parts_intact() {
        let store = MemoryStore::new();
        let owner = Uuid::new_v4();
        let view = create_project(
            &store,
            owner,
            ProjectCreate {
                title: Some("Atlas".to_string()),
                parts: Some(vec![part_titled("intro")]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let stranger = Uuid::new_v4();
        let result = delete_project(&store, stranger, view.project.id).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));

        let kept = list_projects(&store, owner).await.unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].parts.len(), 1);
    }

    #[tokio::test]
    async fn explicit_order_index_wins_over_auto_assignment() {
        let store = MemoryStore::new();
        let profile_id = Uuid::new_v4();

        let first = create_project(&store, profile_id, titled("One")).await.unwrap();
        let pinned = create_project(
            &store,
            profile_id,
            ProjectCreate {
                title: Some("Pinned".to_string()),
                order_index: Some(42),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(first.project.order_index, 1);
        assert_eq!(pinned.project.order_index, 42);
    }
}
