//! Registration, login and the caller's profile.

use std::sync::OnceLock;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::guard::content::{self, CharClass, ContentPolicy};
use crate::guard::{Principal, Role};
use crate::http::extract::ValidJson;
use crate::http::response::ApiError;
use crate::http::server::AppState;
use crate::services::credentials::PasswordHash;
use crate::services::users::{NewUser, UserProfile};

/// Login fields are only checked for shape; the lookup decides the rest.
const LOGIN_FIELD_MAX: usize = 256;

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
}

pub async fn register(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<Credentials>,
) -> Result<(StatusCode, Json<UserProfile>), ApiError> {
    let username = content::check(&body.username, &state.policy.username)?;
    let password = content::check(&body.password, &state.policy.password)?;

    let password_hash = PasswordHash::derive(password.as_str());
    let user = state
        .users
        .put(NewUser {
            username,
            password_hash,
            role: Role::User,
        })
        .await?;

    tracing::info!(user_id = user.id, "User registered");
    Ok((StatusCode::CREATED, Json(user.profile())))
}

pub async fn login(
    State(state): State<AppState>,
    ValidJson(body): ValidJson<Credentials>,
) -> Result<Json<TokenResponse>, ApiError> {
    let shape = ContentPolicy::new(1, LOGIN_FIELD_MAX, CharClass::Printable);
    let username = content::check(&body.username, &shape)?;
    let password = content::check(&body.password, &shape)?;

    let user = state.users.find_by_username(username.as_str()).await?;
    let verified = match &user {
        Some(u) => u.password_hash.verify(password.as_str()),
        None => {
            // Same work as a real check so timing does not reveal unknown users.
            let _ = dummy_hash().verify(password.as_str());
            false
        }
    };
    let user = match user {
        Some(u) if verified => u,
        _ => {
            tracing::info!("Login failed");
            return Err(ApiError::InvalidCredentials);
        }
    };

    let principal = Principal {
        user_id: user.id,
        username: user.username,
        role: user.role,
    };
    let token = state.issuer.issue(&principal).map_err(ApiError::internal)?;

    tracing::info!(user_id = principal.user_id, role = %principal.role, "Login succeeded");
    Ok(Json(TokenResponse {
        token,
        token_type: "Bearer",
        expires_in: state.issuer.ttl().as_secs(),
    }))
}

pub async fn profile(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserProfile>, ApiError> {
    let principal = state.authenticate(&headers)?;
    let user = state
        .users
        .get(principal.user_id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(user.profile()))
}

fn dummy_hash() -> &'static PasswordHash {
    static DUMMY: OnceLock<PasswordHash> = OnceLock::new();
    DUMMY.get_or_init(|| PasswordHash::derive("dummy-password-for-timing"))
}
