// Portfolio aggregation: profile + ordered experiences + ordered projects
// with their ordered parts, assembled from three independent reads.

use std::collections::HashMap;

use serde_json::json;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{
    Experience, PortfolioView, Profile, Project, ProjectPart, ProjectView, PROJECT_COLUMNS,
};
use crate::store::{self, DataStore, SelectQuery};

use super::profile_service;

/// Aggregate by public profile id; not-found when the profile is unknown.
pub async fn portfolio_by_profile_id(
    store: &dyn DataStore,
    profile_id: Uuid,
) -> Result<PortfolioView, ApiError> {
    let profile = profile_service::find_by_id(store, profile_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Portfolio not found"))?;
    build_portfolio(store, profile).await
}

/// Assemble the full portfolio for an already-resolved profile.
///
/// The reads are independent and span no transaction: a project deleted
/// between the project and part fetches simply shows up with zero parts.
pub async fn build_portfolio(
    store: &dyn DataStore,
    profile: Profile,
) -> Result<PortfolioView, ApiError> {
    let experience_rows = store
        .select(
            "experiences",
            SelectQuery::new().eq("profile_id", json!(profile.id)).order_asc("order_index"),
        )
        .await?;
    let experiences: Vec<Experience> = store::decode_rows(experience_rows)?;

    let project_rows = store
        .select(
            "projects",
            SelectQuery::new()
                .columns(PROJECT_COLUMNS)
                .eq("profile_id", json!(profile.id))
                .order_asc("order_index"),
        )
        .await?;
    let projects: Vec<Project> = store::decode_rows(project_rows)?;

    let parts = fetch_parts(store, &projects).await?;

    Ok(PortfolioView { profile, experiences, projects: attach_parts(projects, parts) })
}

/// Fetch the ordered parts for a set of projects in one id-set read.
pub(crate) async fn fetch_parts(
    store: &dyn DataStore,
    projects: &[Project],
) -> Result<Vec<ProjectPart>, ApiError> {
    if projects.is_empty() {
        return Ok(Vec::new());
    }

    let ids = projects.iter().map(|p| json!(p.id)).collect();
    let rows = store
        .select(
            "project_parts",
            SelectQuery::new().is_in("project_id", ids).order_asc("order_index"),
        )
        .await?;
    Ok(store::decode_rows(rows)?)
}

/// Group parts by owning project and attach them, preserving project order.
/// Parts arrive already ordered, so per-project lists stay ordered too.
pub(crate) fn attach_parts(projects: Vec<Project>, parts: Vec<ProjectPart>) -> Vec<ProjectView> {
    let mut by_project: HashMap<Uuid, Vec<ProjectPart>> = HashMap::new();
    for part in parts {
        by_project.entry(part.project_id).or_default().push(part);
    }

    projects
        .into_iter()
        .map(|project| {
            let parts = by_project.remove(&project.id).unwrap_or_default();
            ProjectView { project, parts }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project(id: Uuid, order_index: i32) -> Project {
        Project {
            id,
            profile_id: Uuid::new_v4(),
            title: "p".to_string(),
            subtitle: None,
            cover_image_url: None,
            order_index,
        }
    }

    fn part(project_id: Uuid, order_index: i32) -> ProjectPart {
        ProjectPart {
            id: Uuid::new_v4(),
            project_id,
            title: None,
            content: None,
            image_url: None,
            link_url: None,
            kind: None,
            order_index,
        }
    }

    #[test]
    fn parts_are_grouped_under_their_project() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let projects = vec![project(a, 1), project(b, 2)];
        let parts = vec![part(a, 1), part(b, 1), part(a, 2)];

        let views = attach_parts(projects, parts);

        assert_eq!(views[0].parts.len(), 2);
        assert_eq!(views[1].parts.len(), 1);
        assert!(views[0].parts.iter().all(|p| p.project_id == a));
    }

    #[test]
    fn projects_without_parts_get_an_empty_list() {
        let a = Uuid::new_v4();
        let views = attach_parts(vec![project(a, 1)], Vec::new());
        assert!(views[0].parts.is_empty());
    }

    #[test]
    fn orphaned_parts_are_dropped() {
        // A part whose project vanished between the two reads is skipped
        // rather than erroring.
        let a = Uuid::new_v4();
        let gone = Uuid::new_v4();
        let views = attach_parts(vec![project(a, 1)], vec![part(gone, 1)]);
        assert!(views[0].parts.is_empty());
    }

    #[test]
    fn part_order_within_a_project_is_preserved() {
        let a = Uuid::new_v4();
        let parts = vec![part(a, 1), part(a, 3), part(a, 7)];
        let views = attach_parts(vec![project(a, 1)], parts);
        let orders: Vec<i32> = views[0].parts.iter().map(|p| p.order_index).collect();
        assert_eq!(orders, vec![1, 3, 7]);
    }
}
