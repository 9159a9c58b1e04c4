use axum::{extract::Extension, Json};

use crate::error::AppResult;
use crate::state::{AppState, MembershipSnapshot};

// key: membership-api -> refreshed per-club counts

pub async fn membership_summary(
    Extension(state): Extension<AppState>,
) -> AppResult<Json<MembershipSnapshot>> {
    let snapshot = state.refresh_membership().await?;
    Ok(Json(snapshot))
}
