use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use super::{User, UserStore};

/// In-memory store used by `AppState::fake()` and the test suite. Mirrors
/// the Postgres store's semantics, including the insertion-order scans.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    order: RwLock<Vec<Uuid>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn all_ordered(&self) -> Vec<User> {
        let users = self.users.read().unwrap();
        self.order
            .read()
            .unwrap()
            .iter()
            .filter_map(|id| users.get(id).cloned())
            .collect()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.users.read().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_by_email_with_active_reset(
        &self,
        email: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .read()
            .unwrap()
            .values()
            .find(|u| u.email == email && u.reset_token_expiration.is_some_and(|exp| exp > now))
            .cloned())
    }

    async fn insert(&self, user: &User) -> anyhow::Result<()> {
        let mut users = self.users.write().unwrap();
        if users.values().any(|u| u.email == user.email) {
            anyhow::bail!("duplicate email: {}", user.email);
        }
        users.insert(user.id, user.clone());
        self.order.write().unwrap().push(user.id);
        Ok(())
    }

    async fn update(&self, user: &User) -> anyhow::Result<()> {
        let mut users = self.users.write().unwrap();
        if !users.contains_key(&user.id) {
            anyhow::bail!("no such user: {}", user.id);
        }
        let mut updated = user.clone();
        updated.updated_at = OffsetDateTime::now_utc();
        users.insert(user.id, updated);
        Ok(())
    }

    async fn followers_of(&self, target: Uuid) -> anyhow::Result<Vec<User>> {
        Ok(self
            .all_ordered()
            .into_iter()
            .filter(|u| u.friends.contains(&target))
            .collect())
    }

    async fn search(&self, term: Option<&str>) -> anyhow::Result<Vec<User>> {
        let all = self.all_ordered();
        Ok(match term {
            None => all,
            Some(t) => {
                let t = t.to_lowercase();
                all.into_iter()
                    .filter(|u| {
                        u.email.to_lowercase().contains(&t)
                            || u.first_name.to_lowercase().contains(&t)
                            || u.last_name.to_lowercase().contains(&t)
                    })
                    .collect()
            }
        })
    }
}
