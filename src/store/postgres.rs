use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{SessionLog, User, UserStore};

const USER_COLUMNS: &str = r#"
    id, first_name, last_name, email, password_hash, picture_path,
    location, occupation, viewed_profile, impressions, friends,
    blocked_users, widget_preferences, session_logs, reset_token,
    reset_token_expiration, created_at, updated_at
"#;

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
    picture_path: String,
    location: Option<String>,
    occupation: Option<String>,
    viewed_profile: i32,
    impressions: i32,
    friends: Vec<Uuid>,
    blocked_users: Vec<Uuid>,
    widget_preferences: Json<BTreeMap<String, bool>>,
    session_logs: Json<Vec<SessionLog>>,
    reset_token: Option<String>,
    reset_token_expiration: Option<OffsetDateTime>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            first_name: r.first_name,
            last_name: r.last_name,
            email: r.email,
            password_hash: r.password_hash,
            picture_path: r.picture_path,
            location: r.location,
            occupation: r.occupation,
            viewed_profile: r.viewed_profile,
            impressions: r.impressions,
            friends: r.friends,
            blocked_users: r.blocked_users,
            widget_preferences: r.widget_preferences.0,
            session_logs: r.session_logs.0,
            reset_token: r.reset_token,
            reset_token_expiration: r.reset_token_expiration,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Postgres-backed user store. Edge lists live in `uuid[]` columns, the
/// preference map and session logs in `jsonb`.
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_email_with_active_reset(
        &self,
        email: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE email = $1 AND reset_token_expiration > $2"
        ))
        .bind(email)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn insert(&self, user: &User) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, first_name, last_name, email, password_hash, picture_path,
                location, occupation, viewed_profile, impressions, friends,
                blocked_users, widget_preferences, session_logs, reset_token,
                reset_token_expiration, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                    $14, $15, $16, $17, $18)
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.picture_path)
        .bind(&user.location)
        .bind(&user.occupation)
        .bind(user.viewed_profile)
        .bind(user.impressions)
        .bind(&user.friends)
        .bind(&user.blocked_users)
        .bind(Json(&user.widget_preferences))
        .bind(Json(&user.session_logs))
        .bind(&user.reset_token)
        .bind(user.reset_token_expiration)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, user: &User) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users SET
                first_name = $2, last_name = $3, email = $4,
                password_hash = $5, picture_path = $6, location = $7,
                occupation = $8, viewed_profile = $9, impressions = $10,
                friends = $11, blocked_users = $12, widget_preferences = $13,
                session_logs = $14, reset_token = $15,
                reset_token_expiration = $16, updated_at = now()
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.picture_path)
        .bind(&user.location)
        .bind(&user.occupation)
        .bind(user.viewed_profile)
        .bind(user.impressions)
        .bind(&user.friends)
        .bind(&user.blocked_users)
        .bind(Json(&user.widget_preferences))
        .bind(Json(&user.session_logs))
        .bind(&user.reset_token)
        .bind(user.reset_token_expiration)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn followers_of(&self, target: Uuid) -> anyhow::Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE $1 = ANY(friends)
             ORDER BY created_at"
        ))
        .bind(target)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn search(&self, term: Option<&str>) -> anyhow::Result<Vec<User>> {
        let term = term.map(escape_like);
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE $1::text IS NULL
                OR email ILIKE '%' || $1 || '%'
                OR first_name ILIKE '%' || $1 || '%'
                OR last_name ILIKE '%' || $1 || '%'
             ORDER BY created_at"
        ))
        .bind(term)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(User::from).collect())
    }
}

/// Search terms match literally: `%` and `_` in user input are data, not
/// ILIKE wildcards.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}
