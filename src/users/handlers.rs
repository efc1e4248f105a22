use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::handlers::{is_valid_email, validate_name},
    auth::jwt::AuthUser,
    error::ApiError,
    state::AppState,
    store::User,
    users::dto::{
        BlockRequest, FriendDetailsResponse, FriendProjection, MsgResponse,
        RemoveFollowerRequest, SearchQuery, ToggleFollowResponse, UnblockRequest,
        UpdateUserRequest,
    },
    users::services,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/getAll", get(get_all_users))
        .route("/users/:id", get(get_user))
        .route("/users/:id/friends/following", get(get_user_friends))
        .route("/users/:id/friend/details/:friend_id", get(get_friend_details))
        .route("/users/:id/followers", get(get_followers))
        .route("/users/:id/friends/:friend_id", post(add_remove_friend))
        .route("/users/blockUser", post(block_user))
        .route("/users/unblockUser", post(unblock_user))
        .route("/users/updateUser/:id", put(update_user_profile))
        .route("/users/:id/followers/delete", delete(delete_follower))
}

#[instrument(skip(state))]
pub async fn get_all_users(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = state.store.search(query.search.as_deref()).await?;
    Ok(Json(users))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_requester): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn get_user_friends(
    State(state): State<AppState>,
    AuthUser(_requester): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<FriendProjection>>, ApiError> {
    Ok(Json(services::friends_of(state.store.as_ref(), id).await?))
}

#[instrument(skip(state))]
pub async fn get_friend_details(
    State(state): State<AppState>,
    Path((user_id, friend_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<FriendDetailsResponse>, ApiError> {
    let details = services::friend_details(state.store.as_ref(), user_id, friend_id).await?;
    Ok(Json(details))
}

#[instrument(skip(state))]
pub async fn get_followers(
    State(state): State<AppState>,
    AuthUser(_requester): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<FriendProjection>>, ApiError> {
    Ok(Json(services::followers_of(state.store.as_ref(), id).await?))
}

#[instrument(skip(state))]
pub async fn add_remove_friend(
    State(state): State<AppState>,
    AuthUser(_requester): AuthUser,
    Path((id, friend_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ToggleFollowResponse>, ApiError> {
    let (friends, following_now) =
        services::toggle_follow(state.store.as_ref(), id, friend_id).await?;

    info!(actor = %id, target = %friend_id, following_now, "follow toggled");
    Ok(Json(ToggleFollowResponse {
        friends,
        message: if following_now {
            "Friend added successfully".into()
        } else {
            "Friend removed successfully".into()
        },
    }))
}

#[instrument(skip(state, payload))]
pub async fn block_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(payload): Json<BlockRequest>,
) -> Result<Json<MsgResponse>, ApiError> {
    services::block(state.store.as_ref(), actor, payload.user_id_to_block).await?;
    info!(%actor, blocked = %payload.user_id_to_block, "user blocked");
    Ok(Json(MsgResponse {
        msg: "User blocked successfully".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn unblock_user(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(payload): Json<UnblockRequest>,
) -> Result<Json<MsgResponse>, ApiError> {
    let to_unblock = payload.user_id_to_unblock.parse::<Uuid>().map_err(|_| {
        warn!(value = %payload.user_id_to_unblock, "malformed unblock id");
        ApiError::Validation("Invalid user id".into())
    })?;

    services::unblock(state.store.as_ref(), actor, to_unblock).await?;
    info!(%actor, unblocked = %to_unblock, "user unblocked");
    Ok(Json(MsgResponse {
        msg: "User unblocked successfully".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn update_user_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let mut user = state
        .store
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if let Some(first_name) = payload.first_name {
        validate_name("firstName", &first_name)?;
        user.first_name = first_name;
    }
    if let Some(last_name) = payload.last_name {
        validate_name("lastName", &last_name)?;
        user.last_name = last_name;
    }
    if let Some(email) = payload.email {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(ApiError::Validation("Invalid email".into()));
        }
        if let Some(existing) = state.store.find_by_email(&email).await? {
            if existing.id != user.id {
                return Err(ApiError::Conflict("Email already registered".into()));
            }
        }
        user.email = email;
    }
    if let Some(location) = payload.location {
        user.location = Some(location);
    }
    if let Some(occupation) = payload.occupation {
        user.occupation = Some(occupation);
    }
    if let Some(picture_path) = payload.picture_path {
        user.picture_path = picture_path;
    }

    state.store.update(&user).await?;
    info!(user_id = %user.id, "profile updated");
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn delete_follower(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RemoveFollowerRequest>,
) -> Result<Json<Vec<FriendProjection>>, ApiError> {
    let followers =
        services::remove_follower(state.store.as_ref(), id, payload.follower_id).await?;
    info!(target = %id, follower = %payload.follower_id, "follower removed");
    Ok(Json(followers))
}
