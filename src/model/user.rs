//! Accounts: registration, login, profile maintenance and password storage.

use super::core::{
    is_valid_email, non_blank, validation_message, ServiceError, DEFAULT_MAX_LENGTH,
    EMAIL_REGEX, PASSWORD_MIN_LENGTH, USERNAME_MAX_LENGTH, USERNAME_MIN_LENGTH,
};
use crate::config;
use anyhow::Ok as AnyOk;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use log::{info, warn};
use poem_openapi::Object;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use validator::Validate;

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

const HASH_SCHEME: &str = "sha256";
const HASH_ITERATIONS: u32 = 10_000;

type HmacSha256 = Hmac<Sha256>;

fn hmac_rounds(password: &str, salt: &str, iterations: u32) -> Result<Vec<u8>, anyhow::Error> {
    let mut digest = salt.as_bytes().to_vec();
    for _ in 0..iterations.max(1) {
        let mut mac = HmacSha256::new_from_slice(password.as_bytes())
            .map_err(|e| anyhow::anyhow!("Invalid hmac key: {}", e))?;
        mac.update(&digest);
        digest = mac.finalize().into_bytes().to_vec();
    }
    AnyOk(digest)
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Hash a password as `sha256$<iterations>$<salt>$<hex digest>`.
pub fn hash_password(password: &str) -> Result<String, anyhow::Error> {
    let salt = URL_SAFE_NO_PAD.encode(uuid::Uuid::new_v4().as_bytes());
    let digest = hmac_rounds(password, &salt, HASH_ITERATIONS)?;
    AnyOk(format!(
        "{}${}${}${}",
        HASH_SCHEME,
        HASH_ITERATIONS,
        salt,
        to_hex(&digest)
    ))
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let parts: Vec<&str> = stored.split('$').collect();
    if parts.len() != 4 || parts[0] != HASH_SCHEME {
        return false;
    }

    let iterations = match parts[1].parse::<u32>() {
        Ok(n) => n,
        Err(_) => return false,
    };

    let expected = parts[3].as_bytes();
    let actual = match hmac_rounds(password, parts[2], iterations) {
        Ok(digest) => to_hex(&digest),
        Err(_) => return false,
    };
    let actual = actual.as_bytes();

    if actual.len() != expected.len() {
        return false;
    }
    actual
        .iter()
        .zip(expected.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: String,
    pub profile_photo: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct Profile {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: String,
    pub profile_photo: Option<String>,
    pub profile_photo_url: Option<String>,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct PublicProfile {
    pub id: i64,
    pub username: String,
    pub full_name: Option<String>,
    pub profile_photo_url: Option<String>,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for Profile {
    fn from(user: &User) -> Self {
        Profile {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            address: user.address.clone(),
            role: user.role.clone(),
            profile_photo: user.profile_photo.clone(),
            profile_photo_url: user.profile_photo.as_deref().map(config::upload_url),
            last_login: user.last_login,
            created_at: user.created_at,
        }
    }
}

impl From<&User> for PublicProfile {
    fn from(user: &User) -> Self {
        PublicProfile {
            id: user.id,
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            profile_photo_url: user.profile_photo.as_deref().map(config::upload_url),
            role: user.role.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object, Validate)]
pub struct RegisterPayload {
    #[validate(length(
        min = "USERNAME_MIN_LENGTH",
        max = "USERNAME_MAX_LENGTH",
        message = "The length of username should be between 3 and 64."
    ))]
    pub username: String,

    #[validate(length(
        min = "PASSWORD_MIN_LENGTH",
        message = "The password should have at least 6 characters."
    ))]
    pub password: String,

    #[validate(length(max = "DEFAULT_MAX_LENGTH"))]
    pub full_name: Option<String>,

    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object)]
pub struct LoginPayload {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object, Validate)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = "DEFAULT_MAX_LENGTH", message = "Full name is required."))]
    pub full_name: String,

    #[validate(regex(path = "EMAIL_REGEX", message = "Invalid email format."))]
    pub email: String,

    #[validate(length(min = 1, max = 32, message = "Phone is required."))]
    pub phone: String,

    #[validate(length(min = 1, message = "Address is required."))]
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Object, Validate)]
pub struct PasswordChange {
    pub old_password: String,

    #[validate(length(
        min = "PASSWORD_MIN_LENGTH",
        message = "The new password should have at least 6 characters."
    ))]
    pub new_password: String,
}

impl RegisterPayload {
    /// Validate the payload and normalise the optional email.
    pub fn checked(mut self) -> Result<Self, anyhow::Error> {
        self.username = self.username.trim().to_string();
        self.full_name = non_blank(self.full_name);
        self.email = non_blank(self.email);
        if let Err(e) = self.validate() {
            return Err(ServiceError::invalid(&validation_message(&e)));
        }

        if let Some(email) = &self.email {
            if !is_valid_email(email) {
                return Err(ServiceError::invalid("Invalid email format."));
            }
        }

        AnyOk(self)
    }
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    pub async fn get(pool: &sqlx::PgPool, id: i64) -> Result<User, anyhow::Error> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM eventhub_user WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;

        match user {
            Some(user) => AnyOk(user),
            None => Err(ServiceError::not_found("User")),
        }
    }

    pub async fn find_by_username(
        pool: &sqlx::PgPool,
        username: &str,
    ) -> Result<Option<User>, anyhow::Error> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM eventhub_user WHERE username = $1")
            .bind(username)
            .fetch_optional(pool)
            .await?;

        AnyOk(user)
    }

    async fn email_taken(
        pool: &sqlx::PgPool,
        email: &str,
        except_id: Option<i64>,
    ) -> Result<bool, anyhow::Error> {
        let count = sqlx::query_as::<_, (i64,)>(
            "SELECT COUNT(*) FROM eventhub_user WHERE email = $1 AND ($2::BIGINT IS NULL OR id <> $2)",
        )
        .bind(email)
        .bind(except_id)
        .fetch_one(pool)
        .await?;

        AnyOk(count.0 > 0)
    }

    pub async fn register(
        pool: &sqlx::PgPool,
        payload: RegisterPayload,
    ) -> Result<User, anyhow::Error> {
        let payload = payload.checked()?;

        if User::find_by_username(pool, &payload.username).await?.is_some() {
            return Err(ServiceError::conflict("Username is already taken."));
        }

        if let Some(email) = &payload.email {
            if User::email_taken(pool, email, None).await? {
                return Err(ServiceError::conflict("Email is already registered."));
            }
        }

        let password_hash = hash_password(&payload.password)?;
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO eventhub_user (username, password_hash, full_name, email, phone, address, role) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING *",
        )
        .bind(&payload.username)
        .bind(&password_hash)
        .bind(non_blank(payload.full_name))
        .bind(&payload.email)
        .bind(non_blank(payload.phone))
        .bind(non_blank(payload.address))
        .bind(ROLE_USER)
        .fetch_one(pool)
        .await?;

        info!("Registered user {} ({})", user.username, user.id);
        AnyOk(user)
    }

    /// Check the credentials and stamp `last_login`.
    pub async fn authenticate(
        pool: &sqlx::PgPool,
        username: &str,
        password: &str,
    ) -> Result<User, anyhow::Error> {
        let user = match User::find_by_username(pool, username.trim()).await? {
            Some(user) if verify_password(password, &user.password_hash) => user,
            _ => {
                warn!("Failed login attempt for {}", username);
                return Err(ServiceError::invalid("Invalid username or password"));
            }
        };

        let user = sqlx::query_as::<_, User>(
            "UPDATE eventhub_user SET last_login = now() WHERE id = $1 RETURNING *",
        )
        .bind(user.id)
        .fetch_one(pool)
        .await?;

        AnyOk(user)
    }

    pub async fn update_profile(
        pool: &sqlx::PgPool,
        id: i64,
        payload: &ProfileUpdate,
    ) -> Result<User, anyhow::Error> {
        if let Err(e) = payload.validate() {
            return Err(ServiceError::invalid(&validation_message(&e)));
        }

        if User::email_taken(pool, payload.email.trim(), Some(id)).await? {
            return Err(ServiceError::conflict("Email is already used by another account."));
        }

        let user = sqlx::query_as::<_, User>(
            "UPDATE eventhub_user SET full_name = $1, email = $2, phone = $3, address = $4, updated_at = now() WHERE id = $5 RETURNING *",
        )
        .bind(payload.full_name.trim())
        .bind(payload.email.trim())
        .bind(payload.phone.trim())
        .bind(payload.address.trim())
        .bind(id)
        .fetch_optional(pool)
        .await?;

        match user {
            Some(user) => AnyOk(user),
            None => Err(ServiceError::not_found("User")),
        }
    }

    pub async fn change_password(
        pool: &sqlx::PgPool,
        id: i64,
        payload: &PasswordChange,
    ) -> Result<(), anyhow::Error> {
        if let Err(e) = payload.validate() {
            return Err(ServiceError::invalid(&validation_message(&e)));
        }

        let user = User::get(pool, id).await?;
        if !verify_password(&payload.old_password, &user.password_hash) {
            return Err(ServiceError::invalid("The old password is incorrect."));
        }

        sqlx::query("UPDATE eventhub_user SET password_hash = $1, updated_at = now() WHERE id = $2")
            .bind(hash_password(&payload.new_password)?)
            .bind(id)
            .execute(pool)
            .await?;

        info!("User {} changed the password", user.username);
        AnyOk(())
    }

    /// Set or clear the profile photo, returning the updated user and the previous photo path.
    pub async fn set_profile_photo(
        pool: &sqlx::PgPool,
        id: i64,
        photo: Option<&str>,
    ) -> Result<(User, Option<String>), anyhow::Error> {
        let previous = User::get(pool, id).await?.profile_photo;

        let user = sqlx::query_as::<_, User>(
            "UPDATE eventhub_user SET profile_photo = $1, updated_at = now() WHERE id = $2 RETURNING *",
        )
        .bind(photo)
        .bind(id)
        .fetch_one(pool)
        .await?;

        AnyOk((user, previous))
    }

    /// Create an admin account, or promote an existing one and reset its password.
    pub async fn upsert_admin(
        pool: &sqlx::PgPool,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> Result<User, anyhow::Error> {
        if username.trim().len() < USERNAME_MIN_LENGTH as usize {
            return Err(ServiceError::invalid("The username should have at least 3 characters."));
        }
        if password.len() < PASSWORD_MIN_LENGTH as usize {
            return Err(ServiceError::invalid("The password should have at least 6 characters."));
        }
        if let Some(email) = email {
            if !is_valid_email(email) {
                return Err(ServiceError::invalid("Invalid email format."));
            }
        }

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO eventhub_user (username, password_hash, email, role) VALUES ($1, $2, $3, $4)
             ON CONFLICT (username) DO UPDATE SET password_hash = EXCLUDED.password_hash, role = EXCLUDED.role,
             email = COALESCE(EXCLUDED.email, eventhub_user.email), updated_at = now()
             RETURNING *",
        )
        .bind(username.trim())
        .bind(hash_password(password)?)
        .bind(email)
        .bind(ROLE_ADMIN)
        .fetch_one(pool)
        .await?;

        AnyOk(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init_logger;
    use crate::setup_test_db;
    use log::LevelFilter;

    #[test]
    fn test_hash_and_verify_password() {
        let _ = init_logger("eventhub-test", LevelFilter::Debug);

        let hashed = hash_password("rahasia123").unwrap();
        assert!(hashed.starts_with("sha256$10000$"));
        assert_eq!(hashed.split('$').count(), 4);
        assert!(verify_password("rahasia123", &hashed));
        assert!(!verify_password("rahasia124", &hashed));

        // Salts differ per hash.
        assert_ne!(hashed, hash_password("rahasia123").unwrap());
    }

    #[test]
    fn test_verify_password_rejects_malformed() {
        assert!(!verify_password("x", "plaintext"));
        assert!(!verify_password("x", "md5$1$salt$abcd"));
        assert!(!verify_password("x", "sha256$many$salt$abcd"));
    }

    #[test]
    fn test_register_payload_checked() {
        let payload = RegisterPayload {
            username: " runner ".to_string(),
            password: "secret1".to_string(),
            full_name: None,
            email: Some("  ".to_string()),
            phone: None,
            address: None,
        };
        let checked = payload.clone().checked().unwrap();
        assert_eq!(checked.username, "runner");
        assert_eq!(checked.email, None);

        let mut short = payload.clone();
        short.password = "123".to_string();
        assert!(short.checked().is_err());

        let mut bad_email = payload.clone();
        bad_email.email = Some("runner@nowhere".to_string());
        assert!(bad_email.checked().is_err());

        // Length is checked on the trimmed username.
        let mut padded = payload.clone();
        padded.username = " ab ".to_string();
        assert!(padded.checked().is_err());

        let mut blank = payload;
        blank.username = "      ".to_string();
        assert!(blank.checked().is_err());
    }

    #[test]
    fn test_password_change_validation() {
        let change = PasswordChange {
            old_password: "old".to_string(),
            new_password: "12345".to_string(),
        };
        assert!(change.validate().is_err());
    }

    #[tokio::test]
    #[ignore]
    async fn test_register_and_authenticate() {
        let _ = init_logger("eventhub-test", LevelFilter::Debug);
        let pool = setup_test_db().await;
        let username = format!("runner_{}", crate::model::util::short_hex());

        let user = User::register(
            &pool,
            RegisterPayload {
                username: username.clone(),
                password: "secret12".to_string(),
                full_name: Some("Test Runner".to_string()),
                email: None,
                phone: None,
                address: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(user.role, ROLE_USER);

        let logged_in = User::authenticate(&pool, &username, "secret12").await.unwrap();
        assert!(logged_in.last_login.is_some());
        assert!(User::authenticate(&pool, &username, "wrong-pass").await.is_err());
    }
}
