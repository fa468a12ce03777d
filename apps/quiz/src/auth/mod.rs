//! Auth collaborator.
//!
//! The UI only needs the operations below; the account system behind them is
//! pluggable. Auth-state changes are published on a `watch` channel that the
//! UI subscribes to once at startup.

use std::collections::HashMap;

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::models::user::{AuthUser, UserId};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuthError {
    #[error("email and password are required")]
    MissingCredentials,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("an account already exists for this email")]
    EmailInUse,

    #[error("auth provider error: {0}")]
    Internal(String),
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError>;

    /// Creates the account and signs the new user in.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthUser, AuthError>;

    async fn sign_out(&self) -> Result<(), AuthError>;

    fn current_user(&self) -> Option<AuthUser>;

    /// Receives the current user immediately and again on every change.
    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>>;
}

/// Logs every auth-state change until the provider goes away.
pub async fn watch_auth_state(mut changes: watch::Receiver<Option<AuthUser>>) {
    loop {
        match changes.borrow_and_update().as_ref() {
            Some(user) => info!("User logged in: {}", user.email),
            None => info!("No user logged in"),
        }
        if changes.changed().await.is_err() {
            break;
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LocalAuthProvider
// ────────────────────────────────────────────────────────────────────────────

struct Account {
    user: AuthUser,
    password_hash: String,
}

/// In-process account registry with argon2 password hashes.
/// One session per process, mirroring one browser's auth state.
pub struct LocalAuthProvider {
    accounts: RwLock<HashMap<String, Account>>,
    session: watch::Sender<Option<AuthUser>>,
}

impl Default for LocalAuthProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalAuthProvider {
    pub fn new() -> Self {
        let (session, _) = watch::channel(None);
        Self {
            accounts: RwLock::new(HashMap::new()),
            session,
        }
    }

    fn set_session(&self, user: Option<AuthUser>) {
        // send_replace never fails, even with no live subscribers.
        self.session.send_replace(user);
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn hash_password(password: String) -> Result<String, AuthError> {
    // CPU-bound: run on the blocking pool.
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Internal(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Internal(e.to_string()))?
}

async fn verify_password(password: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash).map_err(|e| AuthError::Internal(e.to_string()))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    })
    .await
    .map_err(|e| AuthError::Internal(e.to_string()))?
}

#[async_trait]
impl AuthProvider for LocalAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let (user, hash) = {
            let accounts = self.accounts.read().await;
            let account = accounts.get(&email).ok_or(AuthError::InvalidCredentials)?;
            (account.user.clone(), account.password_hash.clone())
        };

        if !verify_password(password.to_string(), hash).await? {
            return Err(AuthError::InvalidCredentials);
        }

        self.set_session(Some(user.clone()));
        Ok(user)
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<AuthUser, AuthError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        if self.accounts.read().await.contains_key(&email) {
            return Err(AuthError::EmailInUse);
        }

        let password_hash = hash_password(password.to_string()).await?;
        let display_name = display_name.trim();
        let user = AuthUser {
            uid: UserId::new(Uuid::new_v4().simple().to_string()),
            email: email.clone(),
            display_name: (!display_name.is_empty()).then(|| display_name.to_string()),
        };

        {
            let mut accounts = self.accounts.write().await;
            // Re-check under the write lock: another sign-up may have won the race.
            if accounts.contains_key(&email) {
                return Err(AuthError::EmailInUse);
            }
            accounts.insert(
                email,
                Account {
                    user: user.clone(),
                    password_hash,
                },
            );
        }

        self.set_session(Some(user.clone()));
        Ok(user)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.set_session(None);
        Ok(())
    }

    fn current_user(&self) -> Option<AuthUser> {
        self.session.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<AuthUser>> {
        self.session.subscribe()
    }
}
