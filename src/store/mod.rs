use std::collections::BTreeMap;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgUserStore;

/// One login session. Duration stays 0 at login; accumulation happens
/// elsewhere (out of scope for this service).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLog {
    #[serde(with = "time::serde::rfc3339")]
    pub date: OffsetDateTime,
    pub duration: i64,
}

/// The user aggregate. `friends` holds outbound follow edges in insertion
/// order; followers are never stored, they are recomputed by reverse scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub picture_path: String,
    pub location: Option<String>,
    pub occupation: Option<String>,
    pub viewed_profile: i32,
    pub impressions: i32,
    pub friends: Vec<Uuid>,
    pub blocked_users: Vec<Uuid>,
    pub widget_preferences: BTreeMap<String, bool>,
    pub session_logs: Vec<SessionLog>,
    pub reset_token: Option<String>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub reset_token_expiration: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The eight widgets every new account starts with.
pub fn default_widget_preferences() -> BTreeMap<String, bool> {
    BTreeMap::from([
        ("Profile".to_string(), true),
        ("CreatePost".to_string(), true),
        ("RecentSocialPosts".to_string(), true),
        ("Sponsored".to_string(), true),
        ("Followers".to_string(), true),
        ("Following".to_string(), true),
        ("MyBookmarkList".to_string(), true),
        ("ArchivedPosts".to_string(), false),
    ])
}

impl User {
    pub fn new(
        first_name: String,
        last_name: String,
        email: String,
        password_hash: String,
        picture_path: Option<String>,
        location: Option<String>,
        occupation: Option<String>,
    ) -> Self {
        let now = OffsetDateTime::now_utc();
        let mut rng = rand::thread_rng();
        Self {
            id: Uuid::new_v4(),
            first_name,
            last_name,
            email,
            password_hash,
            picture_path: picture_path.unwrap_or_default(),
            location,
            occupation,
            viewed_profile: rng.gen_range(0..10_000),
            impressions: rng.gen_range(0..10_000),
            friends: Vec::new(),
            blocked_users: Vec::new(),
            widget_preferences: default_widget_preferences(),
            session_logs: Vec::new(),
            reset_token: None,
            reset_token_expiration: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether this user follows `other` (forward edge only).
    pub fn is_following(&self, other: Uuid) -> bool {
        self.friends.contains(&other)
    }
}

/// Document-store port for user records. Everything is whole-record
/// read-modify-write; the store serializes conflicting writes to the same
/// record but concurrent requests for one user can still race (known, not
/// mitigated at this layer).
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    /// Find a user by email whose reset expiration is strictly in the future.
    async fn find_by_email_with_active_reset(
        &self,
        email: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>>;

    async fn insert(&self, user: &User) -> anyhow::Result<()>;

    /// Replace the whole stored record and bump `updated_at`.
    async fn update(&self, user: &User) -> anyhow::Result<()>;

    /// Reverse scan: all users whose friends list contains `target`.
    /// O(total users) without the index.
    async fn followers_of(&self, target: Uuid) -> anyhow::Result<Vec<User>>;

    /// All users, optionally filtered by a case-insensitive substring match
    /// on email, first name or last name.
    async fn search(&self, term: Option<&str>) -> anyhow::Result<Vec<User>>;
}
