// Unauthenticated portfolio browsing.

use axum::extract::{Path, State};
use uuid::Uuid;

use crate::middleware::{ApiResponse, ApiResult};
use crate::models::{PortfolioListing, PortfolioView};
use crate::services::{portfolio_service, profile_service};
use crate::AppState;

/// GET /public/portfolios - curated highlights plus the full roster
pub async fn list(State(state): State<AppState>) -> ApiResult<PortfolioListing> {
    let listing = profile_service::public_listing(state.store.as_ref()).await?;
    Ok(ApiResponse::success(listing))
}

/// GET /public/portfolios/:id - one full portfolio; 404 when unknown
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<PortfolioView> {
    let portfolio =
        portfolio_service::portfolio_by_profile_id(state.store.as_ref(), id).await?;
    Ok(ApiResponse::success(portfolio))
}
