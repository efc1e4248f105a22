use std::collections::BTreeMap;

use axum::{
    extract::State,
    routing::{get, put},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{auth::jwt::AuthUser, error::ApiError, state::AppState};

pub fn widget_routes() -> Router<AppState> {
    Router::new()
        .route("/users/get/widget", get(get_widgets))
        .route("/users/update/widget", put(update_widgets))
}

/// The incoming payload must be a JSON object mapping widget names to
/// booleans; anything else is a validation error.
fn parse_widget_payload(value: &serde_json::Value) -> Result<BTreeMap<String, bool>, ApiError> {
    let object = value.as_object().ok_or_else(|| {
        ApiError::Validation("Widget preferences must be an object of booleans".into())
    })?;
    let mut prefs = BTreeMap::new();
    for (name, enabled) in object {
        let enabled = enabled.as_bool().ok_or_else(|| {
            ApiError::Validation(format!("Widget preference '{name}' must be a boolean"))
        })?;
        prefs.insert(name.clone(), enabled);
    }
    Ok(prefs)
}

#[instrument(skip(state))]
pub async fn get_widgets(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<BTreeMap<String, bool>>, ApiError> {
    let user = state
        .store
        .get(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    // Stored state is returned raw; missing widgets are not backfilled
    // with defaults at read time.
    Ok(Json(user.widget_preferences))
}

#[instrument(skip(state, payload))]
pub async fn update_widgets(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<BTreeMap<String, bool>>, ApiError> {
    let prefs = parse_widget_payload(&payload)?;

    let mut user = state
        .store
        .get(user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    // Wholesale replacement, not a merge.
    user.widget_preferences = prefs.clone();
    state.store.update(&user).await?;

    info!(%user_id, widgets = prefs.len(), "widget preferences replaced");
    Ok(Json(prefs))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::store::User;

    async fn seed(state: &AppState) -> User {
        let user = User::new(
            "Kai".into(),
            "Tester".into(),
            "kai@example.com".into(),
            "hash".into(),
            None,
            None,
            None,
        );
        state.store.insert(&user).await.unwrap();
        user
    }

    #[test]
    fn payload_must_be_an_object_of_booleans() {
        assert!(parse_widget_payload(&json!({"Profile": true})).is_ok());
        assert!(parse_widget_payload(&json!(null)).is_err());
        assert!(parse_widget_payload(&json!([true, false])).is_err());
        assert!(parse_widget_payload(&json!({"Profile": "yes"})).is_err());
        assert!(parse_widget_payload(&json!({"Profile": 1})).is_err());
    }

    #[tokio::test]
    async fn get_returns_stored_preferences() {
        let state = AppState::fake();
        let user = seed(&state).await;

        let res = get_widgets(State(state), AuthUser(user.id)).await.unwrap();
        assert_eq!(res.0.len(), 8);
        assert_eq!(res.0.get("ArchivedPosts"), Some(&false));
    }

    #[tokio::test]
    async fn update_replaces_the_whole_map() {
        let state = AppState::fake();
        let user = seed(&state).await;

        let res = update_widgets(
            State(state.clone()),
            AuthUser(user.id),
            Json(json!({"Profile": false})),
        )
        .await
        .unwrap();

        // Prior defaults beyond Profile are gone; the map was replaced.
        assert_eq!(res.0.len(), 1);
        assert_eq!(res.0.get("Profile"), Some(&false));

        let stored = state.store.get(user.id).await.unwrap().unwrap();
        assert_eq!(stored.widget_preferences.len(), 1);
        assert_eq!(stored.widget_preferences.get("Profile"), Some(&false));
    }
}
