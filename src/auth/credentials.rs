use std::sync::Arc;

use anyhow::anyhow;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::{
    error::AppResult,
    users::{
        repo::UserStore,
        repo_types::{NewUser, Role, User, UserChanges},
    },
};

/// Profile fields of a user about to be created.
#[derive(Debug, Clone)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// Requested profile changes with the secret still in plaintext.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

/// User lookups plus everything that touches the hashed secret.
#[derive(Clone)]
pub struct Credentials {
    store: Arc<dyn UserStore>,
}

impl Credentials {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, profile: Profile, password: &str) -> AppResult<User> {
        let password_hash = hash_secret(password)?;
        self.store
            .create(NewUser {
                first_name: profile.first_name,
                last_name: profile.last_name,
                username: profile.username,
                email: profile.email,
                password_hash,
                role: profile.role,
            })
            .await
    }

    pub async fn find_by_id(&self, id: i64) -> AppResult<Option<User>> {
        self.store.find_by_id(id).await
    }

    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.store.find_by_username(username).await
    }

    pub fn verify_secret(&self, user: &User, password: &str) -> AppResult<bool> {
        Ok(secret_matches(password, &user.password_hash)?)
    }

    /// Applies only the fields present in `changes`; a new secret is hashed
    /// before it reaches the store.
    pub async fn update(&self, id: i64, changes: ProfileChanges) -> AppResult<Option<User>> {
        let password_hash = changes.password.as_deref().map(hash_secret).transpose()?;
        self.store
            .update(
                id,
                UserChanges {
                    first_name: changes.first_name,
                    last_name: changes.last_name,
                    username: changes.username,
                    email: changes.email,
                    password_hash,
                    role: changes.role,
                },
            )
            .await
    }
}

fn hash_secret(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

fn secret_matches(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}
