//! Admin authentication.
//!
//! Passwords are stored as argon2 PHC strings. A successful login issues an
//! HS256 session token that the client sends back either in the `session`
//! cookie or as `Authorization: Bearer <token>`. Argon2 work runs on the
//! blocking pool so a login never stalls other requests.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use backoffice_core::{validation, AdminUser};
use backoffice_db::Database;

use crate::config::BootstrapAdmin;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "session";

/// Session token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (admin username)
    pub sub: String,

    /// Admin user id
    pub uid: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// Token id
    pub jti: String,
}

/// Signing keys and lifetime for session tokens.
#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    lifetime_secs: i64,
}

impl SessionKeys {
    pub fn new(secret: &str, lifetime_secs: i64) -> Self {
        SessionKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            lifetime_secs,
        }
    }

    pub fn lifetime_secs(&self) -> i64 {
        self.lifetime_secs
    }

    /// Signs a session token for `user`.
    pub fn issue(&self, user: &AdminUser) -> ApiResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.lifetime_secs);

        let claims = Claims {
            sub: user.username.clone(),
            uid: user.id,
            iat: now.timestamp(),
            exp: exp.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::internal(format!("Failed to issue session token: {}", e)))
    }

    /// Checks the signature and expiry of a token.
    pub fn verify(&self, token: &str) -> ApiResult<Claims> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "Rejected session token");
                ApiError::unauthorized("Invalid or expired session")
            })
    }

    /// HttpOnly session cookie carrying `token`, living as long as the token.
    pub fn cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(self.lifetime_secs))
            .build()
    }
}

/// What `CookieJar::remove` needs to expire the session cookie; the path
/// must match the one it was set with.
pub fn session_cookie_removal() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}

/// Extract bearer token from authorization header.
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Token from the bearer header, falling back to the `session` cookie.
pub fn request_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(extract_bearer_token);
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

// =============================================================================
// Passwords
// =============================================================================

/// Hash a password for storage.
///
/// Blocking; async callers go through [`hash_password_blocking`].
pub fn hash_password(password: &str) -> ApiResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;

    Ok(hash.to_string())
}

/// Verify a password against its stored hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// [`hash_password`] on tokio's blocking pool, off the request workers.
pub async fn hash_password_blocking(password: &str) -> ApiResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::internal(format!("Password hashing task failed: {e}")))?
}

/// [`verify_password`] on tokio's blocking pool.
pub async fn verify_password_blocking(password: &str, hash: &str) -> ApiResult<bool> {
    let (password, hash) = (password.to_string(), hash.to_string());
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| ApiError::internal(format!("Password check task failed: {e}")))
}

// =============================================================================
// Admin accounts
// =============================================================================

/// Creates an active admin with a hashed password.
pub async fn create_admin(
    db: &Database,
    username: &str,
    email: Option<&str>,
    password: &str,
) -> ApiResult<AdminUser> {
    validation::password(password)?;
    let hash = hash_password_blocking(password).await?;
    let user = db.admin_users().create(username, email, &hash).await?;
    info!(id = user.id, username = %user.username, "Admin user created");
    Ok(user)
}

/// Checks a username and password; inactive accounts are refused.
pub async fn authenticate(db: &Database, username: &str, password: &str) -> ApiResult<AdminUser> {
    let invalid = || ApiError::unauthorized("Invalid username or password");

    let user = db
        .admin_users()
        .get_by_username(username.trim())
        .await?
        .ok_or_else(invalid)?;

    if !verify_password_blocking(password, &user.password_hash).await? {
        warn!(username = %user.username, "Failed login attempt");
        return Err(invalid());
    }

    if !user.is_active {
        warn!(username = %user.username, "Login attempt on inactive account");
        return Err(ApiError::unauthorized("Account is disabled"));
    }

    Ok(user)
}

/// Creates the configured admin when the database has none yet.
pub async fn bootstrap_admin(db: &Database, admin: &BootstrapAdmin) -> ApiResult<Option<AdminUser>> {
    if db.admin_users().count().await? > 0 {
        debug!("Admin users present, skipping bootstrap");
        return Ok(None);
    }

    let user = create_admin(db, &admin.username, admin.email.as_deref(), &admin.password).await?;
    Ok(Some(user))
}

// =============================================================================
// Request guard
// =============================================================================

/// The admin behind the current request.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
}

/// Middleware that rejects requests without a valid session and attaches
/// [`CurrentUser`] to the rest.
pub async fn require_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request_token(req.headers())
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;
    let claims = state.sessions.verify(&token)?;

    // Deactivation takes effect on the next request
    let user = state
        .db
        .admin_users()
        .get_by_id(claims.uid)
        .await?
        .filter(|user| user.is_active && user.username == claims.sub)
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    req.extensions_mut().insert(CurrentUser {
        id: user.id,
        username: user.username,
    });

    Ok(next.run(req).await)
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;
    use axum::http::HeaderValue;
    use backoffice_db::DbConfig;

    fn admin(id: i64, username: &str) -> AdminUser {
        AdminUser {
            id,
            username: username.to_string(),
            email: None,
            password_hash: String::new(),
            is_active: true,
        }
    }

    #[test]
    fn test_session_roundtrip() {
        let keys = SessionKeys::new("test-secret", 3600);
        let token = keys.issue(&admin(4, "owner")).unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.sub, "owner");
        assert_eq!(claims.uid, 4);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let token = SessionKeys::new("secret-a", 3600)
            .issue(&admin(1, "owner"))
            .unwrap();

        let err = SessionKeys::new("secret-b", 3600).verify(&token).unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::Unauthorized);
    }

    #[test]
    fn test_extract_tokens() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);

        let with_cookie = |value: &'static str| {
            let mut headers = HeaderMap::new();
            headers.insert(COOKIE, HeaderValue::from_static(value));
            headers
        };
        assert_eq!(
            request_token(&with_cookie("theme=dark; session=abc.def; lang=en")).as_deref(),
            Some("abc.def")
        );
        assert_eq!(request_token(&with_cookie("sessionid=zzz")), None);
        assert_eq!(request_token(&with_cookie("session=")), None);

        let mut both = with_cookie("session=from-cookie");
        both.insert(AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(request_token(&both).as_deref(), Some("from-header"));
    }

    #[test]
    fn test_session_cookie_attributes() {
        let keys = SessionKeys::new("test-secret", 3600);
        let cookie = keys.cookie("abc.def".to_string());

        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.value(), "abc.def");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::seconds(3600)));
    }

    #[tokio::test]
    async fn test_blocking_password_helpers() {
        let hash = hash_password_blocking("correct-horse").await.unwrap();
        assert!(verify_password_blocking("correct-horse", &hash).await.unwrap());
        assert!(!verify_password_blocking("wrong-horse", &hash).await.unwrap());
    }

    #[test]
    fn test_password_hashing() {
        let hash = hash_password("correct-horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct-horse", &hash));
        assert!(!verify_password("wrong-horse", &hash));
        assert!(!verify_password("correct-horse", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn test_authenticate() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let user = create_admin(&db, "owner", Some("owner@example.com"), "correct-horse")
            .await
            .unwrap();

        let found = authenticate(&db, "owner", "correct-horse").await.unwrap();
        assert_eq!(found.id, user.id);

        assert!(authenticate(&db, "owner", "wrong-horse").await.is_err());
        assert!(authenticate(&db, "nobody", "correct-horse").await.is_err());

        db.admin_users().set_active(user.id, false).await.unwrap();
        let err = authenticate(&db, "owner", "correct-horse").await.unwrap_err();
        assert_eq!(err.message, "Account is disabled");
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = create_admin(&db, "owner", None, "short").await.unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ValidationError);
        assert_eq!(db.admin_users().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_bootstrap_runs_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let config = BootstrapAdmin {
            username: "owner".to_string(),
            password: "correct-horse".to_string(),
            email: None,
        };

        assert!(bootstrap_admin(&db, &config).await.unwrap().is_some());
        assert!(bootstrap_admin(&db, &config).await.unwrap().is_none());
        assert_eq!(db.admin_users().count().await.unwrap(), 1);
    }
}
