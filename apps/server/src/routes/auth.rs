use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use tracing::info;

use backoffice_core::AdminUser;

use crate::auth::{authenticate, session_cookie_removal, CurrentUser};
use crate::error::{ApiError, ApiResult};
use crate::extract::AppJson;
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/me", get(me))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: AdminUser,
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(body): AppJson<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let user = authenticate(&state.db, &body.username, &body.password).await?;
    let token = state.sessions.issue(&user)?;

    info!(username = %user.username, "Admin signed in");

    let jar = jar.add(state.sessions.cookie(token.clone()));

    Ok((
        jar,
        Json(LoginResponse {
            token,
            expires_in: state.sessions.lifetime_secs(),
            user,
        }),
    ))
}

async fn logout(user: CurrentUser, jar: CookieJar) -> impl IntoResponse {
    info!(username = %user.username, "Admin signed out");
    (StatusCode::NO_CONTENT, jar.remove(session_cookie_removal()))
}

async fn me(State(state): State<AppState>, user: CurrentUser) -> ApiResult<Json<AdminUser>> {
    let admin = state
        .db
        .admin_users()
        .get_by_id(user.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Admin user", user.id))?;
    Ok(Json(admin))
}
