use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{CommentDetail, CommentFilter, CommentQuery, CommentSummary, DeletedComment};
use crate::state::AppState;
use crate::validation::{parse_uuid, validate_comment, CommentPayload, ValidationErrors};

fn comment_filter(query: CommentQuery) -> Result<CommentFilter> {
    let mut errors = ValidationErrors::default();
    let mut parse = |field: &str, raw: Option<String>| {
        let raw = raw.filter(|s| !s.is_empty())?;
        match parse_uuid(field, &raw) {
            Ok(id) => Some(id),
            Err(_) => {
                errors.add(field, "Invalid uuid");
                None
            }
        }
    };

    let project_id = parse("projectId", query.project_id);
    let parent_comment_id = parse("parentCommentId", query.parent_comment_id);

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    Ok(CommentFilter {
        project_id,
        parent_comment_id,
    })
}

/// List comments. Root comments only unless `parentCommentId` is given.
pub async fn list_comments(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<CommentQuery>, AppError>,
) -> Result<Json<Vec<CommentDetail>>> {
    let filter = comment_filter(query)?;
    let comments = state.comment_service.list(filter).await?;
    Ok(Json(comments))
}

pub async fn get_comment(
    State(state): State<AppState>,
    WithRejection(Path(comment_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<CommentDetail>> {
    let comment = state.comment_service.get(comment_id).await?;
    Ok(Json(comment))
}

pub async fn create_comment(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): WithRejection<Json<CommentPayload>, AppError>,
) -> Result<(StatusCode, Json<CommentSummary>)> {
    let input = validate_comment(payload)?;
    let comment = state.comment_service.create(input).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn update_comment(
    State(state): State<AppState>,
    WithRejection(Path(comment_id), _): WithRejection<Path<Uuid>, AppError>,
    WithRejection(Json(payload), _): WithRejection<Json<CommentPayload>, AppError>,
) -> Result<Json<CommentSummary>> {
    let input = validate_comment(payload)?;
    let comment = state.comment_service.update(comment_id, input).await?;
    Ok(Json(comment))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    WithRejection(Path(comment_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<DeletedComment>> {
    let deleted = state.comment_service.delete(comment_id).await?;
    Ok(Json(deleted))
}
