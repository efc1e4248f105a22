use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::User;

/// Profile projection used by every list-returning relationship operation.
/// Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendProjection {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub occupation: Option<String>,
    pub location: Option<String>,
    pub picture_path: String,
    pub friends: Vec<Uuid>,
    pub is_following: bool,
}

impl FriendProjection {
    pub fn of(user: &User, is_following: bool) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            occupation: user.occupation.clone(),
            location: user.location.clone(),
            picture_path: user.picture_path.clone(),
            friends: user.friends.clone(),
            is_following,
        }
    }
}

/// Reduced projection for mutual friends: no friends field.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MutualFriend {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub occupation: Option<String>,
    pub location: Option<String>,
    pub picture_path: String,
}

impl MutualFriend {
    pub fn of(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            occupation: user.occupation.clone(),
            location: user.location.clone(),
            picture_path: user.picture_path.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendDetailsResponse {
    pub user: FriendProjection,
    pub is_friend: bool,
    pub is_follower: bool,
    pub mutual_friends: Vec<MutualFriend>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleFollowResponse {
    pub friends: Vec<FriendProjection>,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockRequest {
    pub user_id_to_block: Uuid,
}

/// Unblock carries the id as a string so a malformed value answers with a
/// validation error instead of a body-deserialization rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnblockRequest {
    pub user_id_to_unblock: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveFollowerRequest {
    pub follower_id: Uuid,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub occupation: Option<String>,
    pub picture_path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MsgResponse {
    pub msg: String,
}
