use axum::{extract::State, Json};

use crate::error::Result;
use crate::models::DashboardStats;
use crate::state::AppState;

pub async fn dashboard_stats(State(state): State<AppState>) -> Result<Json<DashboardStats>> {
    let stats = state.project_service.stats().await?;
    Ok(Json(stats))
}
