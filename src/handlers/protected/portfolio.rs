use axum::extract::State;
use axum::Extension;

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::models::PortfolioView;
use crate::services::{portfolio_service, profile_service};
use crate::AppState;

/// GET /me/portfolio - the caller's full portfolio, provisioning the
/// profile on first access.
pub async fn show(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<PortfolioView> {
    let profile =
        profile_service::get_or_create_profile(state.store.as_ref(), user.id).await?;
    let portfolio = portfolio_service::build_portfolio(state.store.as_ref(), profile).await?;
    Ok(ApiResponse::success(portfolio))
}
