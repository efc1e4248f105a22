//! Relationship engine: follow edges, reverse scans, mutual friends,
//! blocking. Follow edges are directed; "friends" is the outbound adjacency
//! list and followers are recomputed from it, never stored.

use uuid::Uuid;

use crate::error::ApiError;
use crate::store::{User, UserStore};
use crate::users::dto::{FriendDetailsResponse, FriendProjection, MutualFriend};

async fn load_user(store: &dyn UserStore, id: Uuid) -> Result<User, ApiError> {
    store
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))
}

/// Resolve a list of ids to projections, annotating each with whether it
/// appears in `lens` (the viewer's friends list). Ids that no longer resolve
/// are skipped; edge lists may reference deleted users.
async fn resolve_projections(
    store: &dyn UserStore,
    ids: &[Uuid],
    lens: &[Uuid],
) -> Result<Vec<FriendProjection>, ApiError> {
    let mut out = Vec::with_capacity(ids.len());
    for &id in ids {
        if let Some(user) = store.get(id).await? {
            out.push(FriendProjection::of(&user, lens.contains(&id)));
        }
    }
    Ok(out)
}

/// Intersection of both friends lists by id, excluding the two parties
/// themselves. Order and multiplicity follow `a`'s list.
pub fn mutual_friend_ids(a: &User, b: &User) -> Vec<Uuid> {
    a.friends
        .iter()
        .copied()
        .filter(|id| b.friends.contains(id))
        .filter(|id| *id != a.id && *id != b.id)
        .collect()
}

/// The actor's friends list, resolved to projections.
pub async fn friends_of(
    store: &dyn UserStore,
    user_id: Uuid,
) -> Result<Vec<FriendProjection>, ApiError> {
    let user = load_user(store, user_id).await?;
    resolve_projections(store, &user.friends, &user.friends).await
}

/// Follow if not following, unfollow otherwise. Only the actor's record is
/// written. Returns the refreshed friends list and whether the edge now
/// exists. Self-follow is not rejected here.
pub async fn toggle_follow(
    store: &dyn UserStore,
    actor_id: Uuid,
    target_id: Uuid,
) -> Result<(Vec<FriendProjection>, bool), ApiError> {
    let mut actor = load_user(store, actor_id).await?;
    load_user(store, target_id).await?;

    let following_now = if actor.friends.contains(&target_id) {
        actor.friends.retain(|id| *id != target_id);
        false
    } else {
        actor.friends.push(target_id);
        true
    };
    store.update(&actor).await?;

    let friends = resolve_projections(store, &actor.friends, &actor.friends).await?;
    Ok((friends, following_now))
}

/// Reverse scan: every user whose friends list contains `target_id`. The
/// isFollowing annotation is recomputed per follower even though it is true
/// by construction; callers depend on the field being present.
pub async fn followers_of(
    store: &dyn UserStore,
    target_id: Uuid,
) -> Result<Vec<FriendProjection>, ApiError> {
    let followers = store.followers_of(target_id).await?;
    Ok(followers
        .iter()
        .map(|f| FriendProjection::of(f, f.friends.contains(&target_id)))
        .collect())
}

/// Relationship details between two users. NotFound when neither direction
/// of the edge exists.
pub async fn friend_details(
    store: &dyn UserStore,
    user_id: Uuid,
    other_id: Uuid,
) -> Result<FriendDetailsResponse, ApiError> {
    let user = load_user(store, user_id).await?;
    let other = load_user(store, other_id).await?;

    let is_friend = user.friends.contains(&other_id);
    let is_follower = store
        .followers_of(user_id)
        .await?
        .iter()
        .any(|f| f.id == other_id);

    if !is_friend && !is_follower {
        return Err(ApiError::NotFound(
            "No relationship found between users".into(),
        ));
    }

    let mut mutual_friends = Vec::new();
    for id in mutual_friend_ids(&user, &other) {
        if let Some(friend) = store.get(id).await? {
            mutual_friends.push(MutualFriend::of(&friend));
        }
    }

    Ok(FriendDetailsResponse {
        user: FriendProjection::of(&other, is_friend),
        is_friend,
        is_follower,
        mutual_friends,
    })
}

/// Force-remove a follower: drop `target_id` from the follower's friends
/// list (the inverse direction of toggle_follow) and return the target's
/// refreshed follower list.
pub async fn remove_follower(
    store: &dyn UserStore,
    target_id: Uuid,
    follower_id: Uuid,
) -> Result<Vec<FriendProjection>, ApiError> {
    let mut follower = load_user(store, follower_id).await?;
    follower.friends.retain(|id| *id != target_id);
    store.update(&follower).await?;

    followers_of(store, target_id).await
}

pub async fn block(
    store: &dyn UserStore,
    actor_id: Uuid,
    to_block: Uuid,
) -> Result<(), ApiError> {
    if actor_id == to_block {
        return Err(ApiError::Validation("You cannot block yourself".into()));
    }
    let mut actor = load_user(store, actor_id).await?;
    if actor.blocked_users.contains(&to_block) {
        return Err(ApiError::Conflict("User already blocked".into()));
    }
    actor.blocked_users.push(to_block);
    store.update(&actor).await?;
    Ok(())
}

pub async fn unblock(
    store: &dyn UserStore,
    actor_id: Uuid,
    to_unblock: Uuid,
) -> Result<(), ApiError> {
    let mut actor = load_user(store, actor_id).await?;
    if !actor.blocked_users.contains(&to_unblock) {
        return Err(ApiError::Conflict("User is not blocked".into()));
    }
    actor.blocked_users.retain(|id| *id != to_unblock);
    store.update(&actor).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn seed(store: &MemoryStore, first: &str) -> User {
        let user = User::new(
            first.into(),
            "Tester".into(),
            format!("{}@example.com", first.to_lowercase()),
            "hash".into(),
            None,
            None,
            None,
        );
        store.insert(&user).await.unwrap();
        user
    }

    #[tokio::test]
    async fn follow_then_unfollow_restores_original_state() {
        let store = MemoryStore::new();
        let a = seed(&store, "Alice").await;
        let b = seed(&store, "Bob").await;

        let (friends, following) = toggle_follow(&store, a.id, b.id).await.unwrap();
        assert!(following);
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].id, b.id);
        assert!(friends[0].is_following);

        let (friends, following) = toggle_follow(&store, a.id, b.id).await.unwrap();
        assert!(!following);
        assert!(friends.is_empty());
        assert!(store.get(a.id).await.unwrap().unwrap().friends.is_empty());
    }

    #[tokio::test]
    async fn toggle_only_writes_the_actor() {
        let store = MemoryStore::new();
        let a = seed(&store, "Alice").await;
        let b = seed(&store, "Bob").await;

        toggle_follow(&store, a.id, b.id).await.unwrap();
        let b_stored = store.get(b.id).await.unwrap().unwrap();
        assert!(b_stored.friends.is_empty());
    }

    #[tokio::test]
    async fn toggle_with_missing_user_is_not_found() {
        let store = MemoryStore::new();
        let a = seed(&store, "Alice").await;

        let err = toggle_follow(&store, a.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        let err = toggle_follow(&store, Uuid::new_v4(), a.id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn followers_tracks_reverse_edges_exactly() {
        let store = MemoryStore::new();
        let a = seed(&store, "Alice").await;
        let b = seed(&store, "Bob").await;
        let c = seed(&store, "Cleo").await;

        toggle_follow(&store, a.id, b.id).await.unwrap();
        toggle_follow(&store, c.id, b.id).await.unwrap();

        let followers = followers_of(&store, b.id).await.unwrap();
        let ids: Vec<Uuid> = followers.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);
        assert!(followers.iter().all(|f| f.is_following));

        // Removing the A->B edge removes A from B's followers.
        toggle_follow(&store, a.id, b.id).await.unwrap();
        let followers = followers_of(&store, b.id).await.unwrap();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].id, c.id);
    }

    #[tokio::test]
    async fn following_is_not_symmetric() {
        let store = MemoryStore::new();
        let a = seed(&store, "Alice").await;
        let b = seed(&store, "Bob").await;

        toggle_follow(&store, a.id, b.id).await.unwrap();

        assert!(!followers_of(&store, a.id).await.unwrap().iter().any(|f| f.id == b.id));
        assert!(followers_of(&store, b.id).await.unwrap().iter().any(|f| f.id == a.id));
    }

    #[tokio::test]
    async fn mutual_friends_is_the_id_intersection_excluding_self() {
        let store = MemoryStore::new();
        let a = seed(&store, "Alice").await;
        let b = seed(&store, "Bob").await;
        let c = seed(&store, "Cleo").await;
        let d = seed(&store, "Dana").await;

        // A follows B, C, D; B follows A and C.
        toggle_follow(&store, a.id, b.id).await.unwrap();
        toggle_follow(&store, a.id, c.id).await.unwrap();
        toggle_follow(&store, a.id, d.id).await.unwrap();
        toggle_follow(&store, b.id, a.id).await.unwrap();
        toggle_follow(&store, b.id, c.id).await.unwrap();

        let details = friend_details(&store, a.id, b.id).await.unwrap();
        assert!(details.is_friend);
        assert!(details.is_follower);
        let mutual: Vec<Uuid> = details.mutual_friends.iter().map(|m| m.id).collect();
        assert_eq!(mutual, vec![c.id]);
    }

    #[tokio::test]
    async fn no_relationship_is_not_found() {
        let store = MemoryStore::new();
        let a = seed(&store, "Alice").await;
        let b = seed(&store, "Bob").await;

        let err = friend_details(&store, a.id, b.id).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn one_way_follow_is_a_relationship_in_both_lookups() {
        let store = MemoryStore::new();
        let a = seed(&store, "Alice").await;
        let b = seed(&store, "Bob").await;

        toggle_follow(&store, a.id, b.id).await.unwrap();

        let details = friend_details(&store, a.id, b.id).await.unwrap();
        assert!(details.is_friend);
        assert!(!details.is_follower);

        let details = friend_details(&store, b.id, a.id).await.unwrap();
        assert!(!details.is_friend);
        assert!(details.is_follower);
    }

    #[tokio::test]
    async fn remove_follower_drops_the_reverse_edge() {
        let store = MemoryStore::new();
        let a = seed(&store, "Alice").await;
        let b = seed(&store, "Bob").await;

        toggle_follow(&store, a.id, b.id).await.unwrap();
        let followers = remove_follower(&store, b.id, a.id).await.unwrap();
        assert!(followers.is_empty());
        assert!(store.get(a.id).await.unwrap().unwrap().friends.is_empty());
    }

    #[tokio::test]
    async fn stale_friend_ids_are_skipped_in_projections() {
        let store = MemoryStore::new();
        let mut a = seed(&store, "Alice").await;
        let b = seed(&store, "Bob").await;

        a.friends.push(b.id);
        a.friends.push(Uuid::new_v4()); // points at no record
        store.update(&a).await.unwrap();

        let friends = friends_of(&store, a.id).await.unwrap();
        assert_eq!(friends.len(), 1);
        assert_eq!(friends[0].id, b.id);
    }

    #[tokio::test]
    async fn blocking_rules() {
        let store = MemoryStore::new();
        let a = seed(&store, "Alice").await;
        let b = seed(&store, "Bob").await;

        let err = block(&store, a.id, a.id).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        block(&store, a.id, b.id).await.unwrap();
        let err = block(&store, a.id, b.id).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        unblock(&store, a.id, b.id).await.unwrap();
        assert!(store
            .get(a.id)
            .await
            .unwrap()
            .unwrap()
            .blocked_users
            .is_empty());

        let err = unblock(&store, a.id, b.id).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }
}
