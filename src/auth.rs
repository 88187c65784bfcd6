//! Admin accounts: password hashing, seeding and JWT issuing.

use argon2::{self, Config as ArgonConfig};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::oid::ObjectId;
use rand::Rng;

use crate::db::Store;
use crate::error::ApiError;
use crate::models::{AdminAccount, Claims};

const TOKEN_TTL_HOURS: i64 = 12;

/// Shared with the admin routes and [`crate::middleware::AdminAuth`].
#[derive(Clone)]
pub struct AuthSettings {
    jwt_secret: String,
}

impl AuthSettings {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        AuthSettings {
            jwt_secret: jwt_secret.into(),
        }
    }

    pub fn issue_token(&self, admin_id: &str) -> Result<String, ApiError> {
        let expiration = chrono::Utc::now()
            .checked_add_signed(chrono::Duration::hours(TOKEN_TTL_HOURS))
            .ok_or_else(|| ApiError::Internal("token expiry out of range".into()))?
            .timestamp() as usize;

        let claims = Claims {
            sub: admin_id.to_string(),
            exp: expiration,
        };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(self.jwt_secret.as_ref()))
            .map_err(|e| ApiError::Internal(format!("failed to encode token: {e}")))
    }

    /// Returns the admin id carried by a valid, unexpired token.
    pub fn verify_token(&self, token: &str) -> Result<String, ApiError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_ref()),
            &Validation::new(Algorithm::HS256),
        )
        .map(|data| data.claims.sub)
        .map_err(|_| ApiError::Unauthorized("Invalid token".into()))
    }
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt: [u8; 16] = rand::thread_rng().gen();
    let config = ArgonConfig::default();
    argon2::hash_encoded(password.as_bytes(), &salt, &config)
        .map_err(|e| ApiError::Internal(format!("password hashing failed: {e}")))
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    argon2::verify_encoded(hash, password.as_bytes()).unwrap_or(false)
}

/// Creates the configured admin, or refreshes its password if it exists.
pub async fn seed_admin(store: &dyn Store, email: &str, password: &str) -> Result<(), ApiError> {
    let admin = AdminAccount {
        id: ObjectId::new().to_hex(),
        name: "Admin".to_string(),
        email: email.trim().to_lowercase(),
        password_hash: hash_password(password)?,
    };
    store.upsert_admin(&admin).await?;
    log::info!("Admin account {} is ready", admin.email);
    Ok(())
}

/// Checks credentials and returns a signed token.
pub async fn login(store: &dyn Store, settings: &AuthSettings, email: &str, password: &str) -> Result<String, ApiError> {
    let invalid = || ApiError::Unauthorized("Invalid credentials".into());
    let admin = store
        .find_admin(&email.trim().to_lowercase())
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(&admin.password_hash, password) {
        return Err(invalid());
    }
    settings.issue_token(&admin.id)
}
