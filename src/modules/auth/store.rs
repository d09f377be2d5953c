use chrono::Utc;
use dashmap::DashMap;
use uuid::{Timestamp, Uuid};

use super::models::User;

/// In-memory account and session store.
pub struct UserStore {
    users: DashMap<Uuid, User>,
    sessions: DashMap<Uuid, Uuid>,
}

impl UserStore {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            sessions: DashMap::new(),
        }
    }

    /// Create an unverified account with a fresh verification token.
    /// Returns `None` when the email is already registered.
    pub fn insert(&self, username: String, email: String, password_hash: String) -> Option<User> {
        if self.find_by_email(&email).is_some() {
            return None;
        }

        let now = Utc::now();
        let user = User {
            uid: Uuid::new_v7(Timestamp::now(uuid::NoContext)),
            username,
            email,
            password_hash,
            is_verified: false,
            verification_token: Some(Uuid::new_v4()),
            created_at: now,
            updated_at: now,
        };
        self.users.insert(user.uid, user.clone());
        Some(user)
    }

    pub fn get(&self, uid: Uuid) -> Option<User> {
        self.users.get(&uid).map(|entry| entry.value().clone())
    }

    pub fn find_by_email(&self, email: &str) -> Option<User> {
        self.users
            .iter()
            .find(|entry| entry.value().email == email)
            .map(|entry| entry.value().clone())
    }

    /// Mark the account carrying this verification token as verified.
    pub fn verify(&self, token: Uuid) -> Option<User> {
        let uid = self
            .users
            .iter()
            .find(|entry| entry.value().verification_token == Some(token))
            .map(|entry| *entry.key())?;

        let mut entry = self.users.get_mut(&uid)?;
        let user = entry.value_mut();
        user.is_verified = true;
        user.verification_token = None;
        user.updated_at = Utc::now();
        Some(user.clone())
    }

    /// Issue an opaque session token for a logged-in account.
    pub fn create_session(&self, user_uid: Uuid) -> Uuid {
        let token = Uuid::new_v4();
        self.sessions.insert(token, user_uid);
        token
    }

    pub fn session_user(&self, token: Uuid) -> Option<Uuid> {
        self.sessions.get(&token).map(|entry| *entry.value())
    }
}

impl Default for UserStore {
    fn default() -> Self {
        Self::new()
    }
}
