//! HS256 access tokens.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::entities::users;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub name: String,
    pub email_verified: bool,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies access tokens with the configured shared secret.
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    ttl: Duration,
}

impl TokenSigner {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            ttl: Duration::try_minutes(config.expiration_minutes)
                .unwrap_or_else(|| Duration::hours(1)),
        }
    }

    pub fn issue(&self, user: &users::Model) -> Result<IssuedToken, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let expires_at = now + self.ttl;

        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            name: user.username.clone(),
            email_verified: user.is_email_verified,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Checks signature, issuer, audience and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        decode::<Claims>(token, &self.decoding, &self.validation).map(|data| data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "0123456789abcdef0123456789abcdef".to_string(),
            ..AuthConfig::default()
        }
    }

    fn user() -> users::Model {
        let now = Utc::now();
        users::Model {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: String::new(),
            first_name: None,
            last_name: None,
            bio: None,
            avatar_url: None,
            is_email_verified: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_issue_and_verify() {
        let signer = TokenSigner::new(&config());
        let user = user();

        let issued = signer.issue(&user).unwrap();
        let claims = signer.verify(&issued.token).unwrap();

        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.name, "alice");
        assert_eq!(claims.iss, "cinelog");
        assert_eq!(claims.aud, "cinelog-clients");
        assert_eq!(claims.exp, issued.expires_at.timestamp());
    }

    #[test]
    fn test_rejects_foreign_audience_and_secret() {
        let signer = TokenSigner::new(&config());
        let token = signer.issue(&user()).unwrap().token;

        let other_audience = TokenSigner::new(&AuthConfig {
            audience: "someone-else".to_string(),
            ..config()
        });
        assert!(other_audience.verify(&token).is_err());

        let other_secret = TokenSigner::new(&AuthConfig {
            jwt_secret: "fedcba9876543210fedcba9876543210".to_string(),
            ..config()
        });
        assert!(other_secret.verify(&token).is_err());
    }

    #[test]
    fn test_rejects_expired_token() {
        let signer = TokenSigner::new(&config());
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: "alice@example.com".to_string(),
            name: "alice".to_string(),
            email_verified: false,
            jti: Uuid::new_v4().to_string(),
            iat: now - 7200,
            exp: now - 3600,
            iss: "cinelog".to_string(),
            aud: "cinelog-clients".to_string(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &signer.encoding).unwrap();

        assert!(signer.verify(&token).is_err());
    }
}
