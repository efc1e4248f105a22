use rand::RngCore;
use time::{Duration, OffsetDateTime};

use crate::store::User;

/// Lifetime of a reset token.
pub const RESET_TOKEN_TTL: Duration = Duration::seconds(3600);

const RESET_TOKEN_BYTES: usize = 20;

/// Explicit view of the reset fields on a user record. `token` and
/// `expires_at` are always set and cleared together; a record with only one
/// of them is treated as having no reset in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetState {
    NoReset,
    Pending {
        token: String,
        expires_at: OffsetDateTime,
    },
}

impl ResetState {
    /// A pending token is usable strictly before its expiration.
    pub fn is_usable(&self, now: OffsetDateTime) -> bool {
        match self {
            ResetState::NoReset => false,
            ResetState::Pending { expires_at, .. } => now < *expires_at,
        }
    }
}

/// 40 lowercase hex characters.
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

impl User {
    pub fn reset_state(&self) -> ResetState {
        match (&self.reset_token, self.reset_token_expiration) {
            (Some(token), Some(expires_at)) => ResetState::Pending {
                token: token.clone(),
                expires_at,
            },
            _ => ResetState::NoReset,
        }
    }

    /// Move to `Pending`: a fresh token expiring `RESET_TOKEN_TTL` from `now`.
    pub fn begin_reset(&mut self, token: String, now: OffsetDateTime) {
        self.reset_token = Some(token);
        self.reset_token_expiration = Some(now + RESET_TOKEN_TTL);
    }

    /// Collapse back to `NoReset`, clearing both fields together.
    pub fn clear_reset(&mut self) {
        self.reset_token = None;
        self.reset_token_expiration = None;
    }
}
