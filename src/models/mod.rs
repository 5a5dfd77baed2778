// Portfolio data model: rows as stored in the external service, the partial
// DTOs accepted over HTTP, and the composed view types returned to clients.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row per authenticated user, provisioned lazily on first access.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    pub updated_at: DateTime<Utc>,
}

/// Partial profile update. Omitted fields are left unmodified; `is_featured`
/// is store-managed (it drives the curated public listing) and not settable
/// here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experience {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub company: String,
    pub title: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
    pub order_index: i32,
}

/// Experience create payload. `company` and `title` are required but arrive
/// as options so missing fields produce a 400 with field errors instead of
/// a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExperienceCreate {
    pub company: Option<String>,
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub order_index: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExperienceUpdate {
    pub company: Option<String>,
    pub title: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub order_index: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    pub order_index: i32,
}

/// Column projection used whenever projects are read for display, keeping
/// heavier columns out of list responses.
pub const PROJECT_COLUMNS: &[&str] =
    &["id", "profile_id", "title", "subtitle", "cover_image_url", "order_index"];

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectCreate {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub cover_image_url: Option<String>,
    pub order_index: Option<i32>,
    pub parts: Option<Vec<ProjectPartInput>>,
}

/// Partial project update. A present `parts` list replaces every existing
/// part; an absent one leaves them untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectUpdate {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub cover_image_url: Option<String>,
    pub order_index: Option<i32>,
    pub parts: Option<Vec<ProjectPartInput>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectPart {
    pub id: Uuid,
    pub project_id: Uuid,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub link_url: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    pub order_index: i32,
}

/// Incoming part payload, nested inside project create/update bodies.
/// Missing `order_index` values are assigned from list position.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPartInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
    pub link_url: Option<String>,
    pub kind: Option<String>,
    pub order_index: Option<i32>,
}

/// Project with its ordered parts attached.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    #[serde(flatten)]
    pub project: Project,
    pub parts: Vec<ProjectPart>,
}

/// The full aggregate served by the portfolio endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioView {
    pub profile: Profile,
    pub experiences: Vec<Experience>,
    pub projects: Vec<ProjectView>,
}

/// Public listing: curated highlights plus the full roster.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioListing {
    pub featured: Vec<Profile>,
    pub list: Vec<Profile>,
}
