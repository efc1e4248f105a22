use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use time::OffsetDateTime;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    sessions::report::{daily_time_spent, DailyTotal},
    state::AppState,
};

pub fn session_routes() -> Router<AppState> {
    Router::new().route("/users/:id/getDailyTimeSpent", get(get_daily_time_spent))
}

#[instrument(skip(state))]
pub async fn get_daily_time_spent(
    State(state): State<AppState>,
    AuthUser(_requester): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<DailyTotal>>, ApiError> {
    let user = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let today = OffsetDateTime::now_utc().date();
    Ok(Json(daily_time_spent(&user.session_logs, today)))
}
