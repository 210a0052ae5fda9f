use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use crate::auth::CurrentUser;
use crate::error::{AppError, Result};
use crate::models::{DeletedProject, ProjectDetail, ProjectOverview, ProjectUserQuery};
use crate::state::AppState;
use crate::validation::{parse_uuid, validate_project, ProjectPayload};

pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<ProjectOverview>>> {
    let projects = state.project_service.list().await?;
    Ok(Json(projects))
}

/// Projects a user created or is assigned to.
pub async fn list_projects_for_user(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ProjectUserQuery>, AppError>,
) -> Result<Json<Vec<ProjectOverview>>> {
    let raw = query
        .user_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::invalid("userId", "Required"))?;
    let user_id = parse_uuid("userId", &raw)?;

    let projects = state.project_service.list_for_user(user_id).await?;
    Ok(Json(projects))
}

pub async fn get_project(
    State(state): State<AppState>,
    WithRejection(Path(project_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<ProjectDetail>> {
    let project = state.project_service.get(project_id).await?;
    Ok(Json(project))
}

pub async fn create_project(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    WithRejection(Json(payload), _): WithRejection<Json<ProjectPayload>, AppError>,
) -> Result<(StatusCode, Json<ProjectOverview>)> {
    let input = validate_project(payload)?;
    let project = state.project_service.create(input, user).await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn update_project(
    State(state): State<AppState>,
    WithRejection(Path(project_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<ProjectPayload>, AppError>,
) -> Result<Json<ProjectOverview>> {
    let input = validate_project(payload)?;
    let project = state.project_service.update(project_id, input).await?;
    Ok(Json(project))
}

pub async fn delete_project(
    State(state): State<AppState>,
    WithRejection(Path(project_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<DeletedProject>> {
    let deleted = state.project_service.delete(project_id).await?;
    Ok(Json(deleted))
}

pub async fn add_project_user(
    State(state): State<AppState>,
    WithRejection(Path((project_id, user_id)), _): WithRejection<Path<(Uuid, Uuid)>, AppError>,
) -> Result<()> {
    state.project_service.add_member(project_id, user_id).await
}

pub async fn remove_project_user(
    State(state): State<AppState>,
    WithRejection(Path((project_id, user_id)), _): WithRejection<Path<(Uuid, Uuid)>, AppError>,
) -> Result<()> {
    state.project_service.remove_member(project_id, user_id).await
}
