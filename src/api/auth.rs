//! Token issuing and the security schemes guarding the API.
//!
//! A token is accepted from `Authorization: Bearer`, `x-access-token` or `token`, in that order.
//! Every request re-checks that the user behind the token still exists with the same role.

use crate::config;
use crate::model::user::{User, ROLE_ADMIN};
use anyhow::Ok as AnyOk;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, error, warn};
use poem::http::{header, HeaderMap, HeaderValue};
use poem::Request;
use poem_openapi::auth::Bearer;
use poem_openapi::SecurityScheme;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub user_id: i64,
    pub username: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn for_user(user: &User) -> Self {
        let now = chrono::Utc::now();
        Claims {
            sub: user.id.to_string(),
            user_id: user.id,
            username: user.username.clone(),
            role: user.role.clone(),
            iat: now.timestamp(),
            exp: (now + chrono::Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
        }
    }
}

pub fn encode_claims(claims: &Claims, secret: &str) -> Result<String, anyhow::Error> {
    let token = encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;
    AnyOk(token)
}

pub fn decode_claims(token: &str, secret: &str) -> Result<Claims, anyhow::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    AnyOk(data.claims)
}

fn secret() -> Result<String, anyhow::Error> {
    match config::jwt_secret_key() {
        Some(key) => AnyOk(key),
        None => Err(anyhow::anyhow!("JWT_SECRET_KEY is not set.")),
    }
}

/// Issue a signed access token for the user.
pub fn issue_token(user: &User) -> Result<String, anyhow::Error> {
    encode_claims(&Claims::for_user(user), &secret()?)
}

/// Header values sometimes carry the `Bearer ` prefix as well.
pub fn strip_bearer_prefix(value: &str) -> &str {
    let value = value.trim();
    match value.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => value[7..].trim(),
        _ => value,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i64,
    pub username: String,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }
}

async fn resolve_token(req: &Request, raw: &str) -> Option<AuthUser> {
    let token = strip_bearer_prefix(raw);
    if token.is_empty() {
        return None;
    }

    let claims = match secret().and_then(|key| decode_claims(token, &key)) {
        Ok(claims) => claims,
        Err(err) => {
            warn!("Rejected token: {}", err);
            return None;
        }
    };

    let pool = match req.data::<Arc<sqlx::PgPool>>() {
        Some(pool) => pool,
        None => {
            error!("Database pool is not attached to the request.");
            return None;
        }
    };

    match User::get(pool, claims.user_id).await {
        Ok(user) if user.username == claims.username && user.role == claims.role => {
            debug!("current_user: {} ({})", user.username, user.role);
            Some(AuthUser {
                id: user.id,
                username: user.username,
                role: user.role,
            })
        }
        Ok(_) => {
            warn!("Token claims no longer match user {}", claims.user_id);
            None
        }
        Err(err) => {
            warn!("Token user {} is not usable: {}", claims.user_id, err);
            None
        }
    }
}

/// Header names checked after `Authorization`, in order.
pub const TOKEN_HEADERS: [&str; 2] = ["x-access-token", "token"];

/// Copy a token sent in `x-access-token` or `token` into `Authorization: Bearer` so the
/// bearer scheme sees it. An existing bearer header wins.
pub fn promote_token_header(headers: &mut HeaderMap) {
    let has_bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| {
            let token = strip_bearer_prefix(v);
            !token.is_empty() && token.len() < v.trim().len()
        })
        .unwrap_or(false);
    if has_bearer {
        return;
    }

    let token = TOKEN_HEADERS.iter().find_map(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .map(strip_bearer_prefix)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
    });

    if let Some(token) = token {
        match HeaderValue::from_str(&format!("Bearer {}", token)) {
            Ok(value) => {
                headers.insert(header::AUTHORIZATION, value);
            }
            Err(e) => warn!("Ignoring malformed token header: {}", e),
        }
    }
}

/// Request hook installed in front of the API.
pub async fn forward_token_headers(mut req: Request) -> poem::Result<Request> {
    promote_token_header(req.headers_mut());
    Ok(req)
}

#[derive(SecurityScheme)]
#[oai(type = "bearer", checker = "jwt_token_checker")]
pub struct CustomSecurityScheme(pub AuthUser);

async fn jwt_token_checker(req: &Request, bearer: Bearer) -> Option<AuthUser> {
    resolve_token(req, &bearer.token).await
}

impl CustomSecurityScheme {
    pub fn user(&self) -> &AuthUser {
        &self.0
    }

    /// The current user when it has the admin role, otherwise the message for a 403.
    pub fn admin(&self) -> Result<&AuthUser, String> {
        let user = self.user();
        if user.is_admin() {
            Ok(user)
        } else {
            warn!("User {} tried to reach an admin operation", user.username);
            Err("Access denied, admin role required.".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::init_logger;
    use log::LevelFilter;

    fn sample_user(role: &str) -> User {
        let now = chrono::Utc::now();
        User {
            id: 7,
            username: "runner".to_string(),
            password_hash: "sha256$1$salt$00".to_string(),
            full_name: None,
            email: None,
            phone: None,
            address: None,
            role: role.to_string(),
            profile_photo: None,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_token_round_trip() {
        let _ = init_logger("eventhub-test", LevelFilter::Debug);

        let claims = Claims::for_user(&sample_user("admin"));
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_HOURS * 3600);

        let token = encode_claims(&claims, "test-secret").unwrap();
        let decoded = decode_claims(&token, "test-secret").unwrap();
        assert_eq!(decoded, claims);
        assert_eq!(decoded.sub, "7");

        assert!(decode_claims(&token, "other-secret").is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let mut claims = Claims::for_user(&sample_user("user"));
        claims.iat -= 3 * 24 * 3600;
        claims.exp = claims.iat + 60;

        let token = encode_claims(&claims, "test-secret").unwrap();
        assert!(decode_claims(&token, "test-secret").is_err());
    }

    #[test]
    fn test_forged_legacy_token_is_rejected() {
        assert!(decode_claims("1|admin|runner|abcdef", "test-secret").is_err());
    }

    #[test]
    fn test_strip_bearer_prefix() {
        assert_eq!(strip_bearer_prefix("Bearer abc.def"), "abc.def");
        assert_eq!(strip_bearer_prefix("bearer   abc"), "abc");
        assert_eq!(strip_bearer_prefix(" abc "), "abc");
        assert_eq!(strip_bearer_prefix("Bear"), "Bear");
    }

    #[test]
    fn test_admin_check() {
        let admin = CustomSecurityScheme(AuthUser {
            id: 1,
            username: "root".to_string(),
            role: "admin".to_string(),
        });
        assert!(admin.admin().is_ok());

        let user = CustomSecurityScheme(AuthUser {
            id: 2,
            username: "runner".to_string(),
            role: "user".to_string(),
        });
        assert_eq!(user.user().id, 2);
        assert!(user.admin().is_err());
    }

    fn bearer_of(headers: &HeaderMap) -> Option<String> {
        headers
            .get(header::AUTHORIZATION)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[test]
    fn test_promote_token_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-access-token", HeaderValue::from_static("abc.def"));
        promote_token_header(&mut headers);
        assert_eq!(bearer_of(&headers).as_deref(), Some("Bearer abc.def"));

        // The `token` header may carry its own prefix.
        let mut headers = HeaderMap::new();
        headers.insert("token", HeaderValue::from_static("Bearer xyz"));
        promote_token_header(&mut headers);
        assert_eq!(bearer_of(&headers).as_deref(), Some("Bearer xyz"));

        let mut headers = HeaderMap::new();
        headers.insert("x-access-token", HeaderValue::from_static("first"));
        headers.insert("token", HeaderValue::from_static("second"));
        promote_token_header(&mut headers);
        assert_eq!(bearer_of(&headers).as_deref(), Some("Bearer first"));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer kept"));
        headers.insert("token", HeaderValue::from_static("ignored"));
        promote_token_header(&mut headers);
        assert_eq!(bearer_of(&headers).as_deref(), Some("Bearer kept"));

        let mut headers = HeaderMap::new();
        headers.insert("token", HeaderValue::from_static("   "));
        promote_token_header(&mut headers);
        assert_eq!(bearer_of(&headers), None);
    }

    #[tokio::test]
    async fn test_forward_token_headers() {
        let req = Request::builder()
            .header("x-access-token", "abc.def")
            .finish();
        let req = forward_token_headers(req).await.unwrap();
        assert_eq!(bearer_of(req.headers()).as_deref(), Some("Bearer abc.def"));
    }

    struct AuthorizationEcho;

    #[poem_openapi::OpenApi]
    impl AuthorizationEcho {
        #[oai(path = "/api/v1/echo", method = "get")]
        async fn echo(&self, req: &Request) -> poem_openapi::payload::PlainText<String> {
            let value = req
                .headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("none")
                .to_string();
            poem_openapi::payload::PlainText(value)
        }
    }

    #[tokio::test]
    async fn test_token_headers_reach_mounted_api() {
        use poem::{EndpointExt, IntoEndpoint, Route};

        let service = poem_openapi::OpenApiService::new(AuthorizationEcho, "test", "1.0");
        let app = Route::new().nest_no_strip(
            "/api/v1",
            service.into_endpoint().before(forward_token_headers),
        );
        let cli = poem::test::TestClient::new(app);

        let resp = cli
            .get("/api/v1/echo")
            .header("x-access-token", "abc.def")
            .send()
            .await;
        resp.assert_status_is_ok();
        resp.assert_text("Bearer abc.def").await;

        let resp = cli.get("/api/v1/echo").header("token", "Bearer xyz").send().await;
        resp.assert_status_is_ok();
        resp.assert_text("Bearer xyz").await;

        let resp = cli.get("/api/v1/echo").send().await;
        resp.assert_status_is_ok();
        resp.assert_text("none").await;
    }
}
