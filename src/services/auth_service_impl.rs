//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::SecurityConfig;
use crate::db::repositories::user::generate_token;
use crate::db::{NewUser, Store};
use crate::domain::{normalize_email, validate_username};
use crate::entities::users;
use crate::services::auth_service::{
    AuthError, AuthService, AuthSession, AuthUser, PublicUser, Registration, UserProfile,
};
use crate::services::token::TokenSigner;

const MIN_PASSWORD_LEN: usize = 8;

pub struct SeaOrmAuthService {
    store: Store,
    signer: TokenSigner,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, signer: TokenSigner, security: SecurityConfig) -> Self {
        Self {
            store,
            signer,
            security,
        }
    }

    fn session_for(&self, user: users::Model) -> Result<AuthSession, AuthError> {
        let issued = self.signer.issue(&user)?;
        Ok(AuthSession {
            access_token: issued.token,
            refresh_token: generate_token(),
            expires_at: issued.expires_at,
            user: user.into(),
        })
    }
}

fn check_password_strength(password: &str, message: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::Validation(message.to_string()));
    }
    Ok(())
}

fn optional_name(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, registration: Registration) -> Result<AuthSession, AuthError> {
        let username = validate_username(&registration.username)?.to_string();
        let email = normalize_email(&registration.email)?;
        check_password_strength(
            &registration.password,
            "Password must be at least 8 characters long",
        )?;

        if self.store.email_taken(&email).await? {
            return Err(AuthError::Conflict(
                "User with this email already exists".to_string(),
            ));
        }

        if self.store.username_taken(&username).await? {
            return Err(AuthError::Conflict("Username is already taken".to_string()));
        }

        let new_user = NewUser {
            username,
            email,
            password: registration.password,
            first_name: optional_name(registration.first_name),
            last_name: optional_name(registration.last_name),
        };

        // A concurrent registration can still claim the name between the checks and the insert.
        let user = self
            .store
            .create_user(new_user, &self.security)
            .await?
            .ok_or_else(|| {
                AuthError::Conflict("User with this email or username already exists".to_string())
            })?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        self.session_for(user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let email = email.trim().to_lowercase();

        let Some(user) = self.store.verify_user_credentials(&email, password).await? else {
            warn!("Failed login attempt");
            return Err(AuthError::InvalidCredentials);
        };

        info!(user_id = %user.id, "User logged in");
        self.session_for(user)
    }

    async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        check_password_strength(new_password, "New password must be at least 8 characters")?;

        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let is_valid = self
            .store
            .verify_user_password(user_id, current_password)
            .await?;

        if !is_valid {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        self.store
            .update_user_password(user_id, new_password, &self.security)
            .await?;

        info!(%user_id, "Password changed");
        Ok(())
    }

    async fn me(&self, user_id: Uuid) -> Result<UserProfile, AuthError> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(user.into())
    }

    async fn list_users(&self, limit: u64) -> Result<Vec<PublicUser>, AuthError> {
        let users = self.store.list_users(limit).await?;
        Ok(users.into_iter().map(PublicUser::from).collect())
    }

    async fn count_users(&self) -> Result<u64, AuthError> {
        Ok(self.store.count_users().await?)
    }

    fn authenticate(&self, token: &str) -> Result<AuthUser, AuthError> {
        let claims = self
            .signer
            .verify(token)
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(AuthUser {
            id: claims.sub,
            username: claims.name,
        })
    }
}
