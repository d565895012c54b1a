use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr,
};
use tokio::task;
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::entities::users;

/// Fields needed to create an account. The password is still in clear text
/// here and is hashed by the repository.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts a user. Returns `None` if the username or email was taken
    /// between the caller's uniqueness check and the insert.
    pub async fn create(
        &self,
        user: NewUser,
        security: &SecurityConfig,
    ) -> Result<Option<users::Model>> {
        let password = user.password;
        let security = security.clone();
        let password_hash = task::spawn_blocking(move || hash_password(&password, Some(&security)))
            .await
            .context("Password hashing task panicked")??;

        let now = chrono::Utc::now();
        let active = users::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(user.username),
            email: Set(user.email),
            password_hash: Set(password_hash),
            first_name: Set(user.first_name),
            last_name: Set(user.last_name),
            bio: Set(None),
            avatar_url: Set(None),
            is_email_verified: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match active.insert(&self.conn).await {
            Ok(model) => Ok(Some(model)),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Ok(None)
            }
            Err(err) => Err(err).context("Failed to insert user"),
        }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<users::Model>> {
        users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")
    }

    pub async fn get_many(&self, ids: &[Uuid]) -> Result<Vec<users::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        users::Entity::find()
            .filter(users::Column::Id.is_in(ids.iter().copied()))
            .all(&self.conn)
            .await
            .context("Failed to query users by ID")
    }

    pub async fn exists_by_email(&self, email: &str) -> Result<bool> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.conn)
            .await
            .context("Failed to query user by email")?;
        Ok(count > 0)
    }

    pub async fn exists_by_username(&self, username: &str) -> Result<bool> {
        let count = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .count(&self.conn)
            .await
            .context("Failed to query user by username")?;
        Ok(count > 0)
    }

    /// Returns the user if the email exists and the password matches.
    /// Note: argon2 verification runs on the blocking pool.
    pub async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<users::Model>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for password verification")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let valid = verify_hash(user.password_hash.clone(), password.to_string()).await?;
        Ok(valid.then_some(user))
    }

    pub async fn verify_password(&self, id: Uuid, password: &str) -> Result<bool> {
        let Some(user) = self.get_by_id(id).await? else {
            return Ok(false);
        };

        verify_hash(user.password_hash, password.to_string()).await
    }

    pub async fn update_password(
        &self,
        id: Uuid,
        new_password: &str,
        security: &SecurityConfig,
    ) -> Result<()> {
        let user = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found: {id}"))?;

        let password = new_password.to_string();
        let security = security.clone();
        let new_hash = task::spawn_blocking(move || hash_password(&password, Some(&security)))
            .await
            .context("Password hashing task panicked")??;

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(new_hash);
        active.updated_at = Set(chrono::Utc::now());
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn list(&self, limit: u64) -> Result<Vec<users::Model>> {
        users::Entity::find()
            .order_by_asc(users::Column::CreatedAt)
            .limit(limit)
            .all(&self.conn)
            .await
            .context("Failed to list users")
    }

    pub async fn count(&self) -> Result<u64> {
        users::Entity::find()
            .count(&self.conn)
            .await
            .context("Failed to count users")
    }
}

async fn verify_hash(password_hash: String, password: String) -> Result<bool> {
    task::spawn_blocking(move || {
        let parsed_hash = PasswordHash::new(&password_hash)
            .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

        // Params are read from the PHC string, so the default instance verifies any cost.
        Ok::<bool, anyhow::Error>(
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
        )
    })
    .await
    .context("Password verification task panicked")?
}

/// Hash a password using Argon2id. `None` falls back to the crate defaults.
pub fn hash_password(password: &str, config: Option<&SecurityConfig>) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let argon2 = if let Some(cfg) = config {
        let params = Params::new(
            cfg.argon2_memory_cost_kib,
            cfg.argon2_time_cost,
            cfg.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
        Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
    } else {
        Argon2::default()
    };

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

/// Random opaque token, 64 hex characters.
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_with_config_roundtrips() {
        let config = SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        };
        let hash = hash_password("correct horse", Some(&config)).unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();
        assert!(
            Argon2::default()
                .verify_password(b"correct horse", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"battery staple", &parsed)
                .is_err()
        );
    }

    #[test]
    fn test_generate_token_shape() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
