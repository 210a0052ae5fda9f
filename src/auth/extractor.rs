use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// Header carrying the caller's user id, set by the upstream identity provider.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The authenticated caller, if any.
///
/// Missing, malformed or unknown ids resolve to `None`.
pub struct CurrentUser(pub Option<User>);

impl<S> FromRequestParts<S> for CurrentUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok());

        let Some(user_id) = user_id else {
            return Ok(CurrentUser(None));
        };

        Ok(CurrentUser(state.users.find_by_id(user_id).await?))
    }
}
