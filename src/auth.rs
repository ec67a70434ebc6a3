use crate::errors::AppError;
use crate::models::{AppData, Session};
use crate::state::AppState;
use crate::storage::persist_data;
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use axum_extra::extract::cookie::CookieJar;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use ring::{
    digest, pbkdf2,
    rand::{SecureRandom, SystemRandom},
};
use std::num::NonZeroU32;
use tracing::{debug, info};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session_token";
pub const MIN_PASSWORD_LEN: usize = 8;

const HASH_SCHEME: &str = "pbkdf2-sha256";
const PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_LEN: usize = 16;
const CREDENTIAL_LEN: usize = digest::SHA256_OUTPUT_LEN;

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("failed to generate a random salt")]
    Random,

    #[error("stored password hash is malformed")]
    Malformed,
}

fn iterations(count: u32) -> Result<NonZeroU32, CredentialError> {
    NonZeroU32::new(count).ok_or(CredentialError::Malformed)
}

pub fn hash_password(password: &str) -> Result<String, CredentialError> {
    let mut salt = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt)
        .map_err(|_| CredentialError::Random)?;

    let mut credential = [0u8; CREDENTIAL_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations(PBKDF2_ITERATIONS)?,
        &salt,
        password.as_bytes(),
        &mut credential,
    );

    Ok(format!(
        "{HASH_SCHEME}${PBKDF2_ITERATIONS}${}${}",
        STANDARD.encode(salt),
        STANDARD.encode(credential)
    ))
}

pub fn verify_password(password: &str, stored: &str) -> Result<bool, CredentialError> {
    let mut parts = stored.split('$');
    let (Some(HASH_SCHEME), Some(count), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(CredentialError::Malformed);
    };

    let count: u32 = count.parse().map_err(|_| CredentialError::Malformed)?;
    let salt = STANDARD.decode(salt).map_err(|_| CredentialError::Malformed)?;
    let hash = STANDARD.decode(hash).map_err(|_| CredentialError::Malformed)?;

    Ok(pbkdf2::verify(
        pbkdf2::PBKDF2_HMAC_SHA256,
        iterations(count)?,
        &salt,
        password.as_bytes(),
        &hash,
    )
    .is_ok())
}

pub fn new_session_token() -> String {
    format!("session_{}", Uuid::new_v4().simple())
}

pub fn short_id(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &id[..12])
}

pub fn open_session(data: &mut AppData, user_id: &str, ttl_days: i64, now: DateTime<Utc>) -> String {
    let token = new_session_token();
    data.sessions.push(Session {
        session_token: token.clone(),
        user_id: user_id.to_string(),
        expires_at: now + Duration::days(ttl_days),
        created_at: now,
    });
    token
}

pub fn purge_expired_sessions(data: &mut AppData, now: DateTime<Utc>) -> usize {
    let before = data.sessions.len();
    data.sessions.retain(|session| !session.is_expired(now));
    before - data.sessions.len()
}

pub fn session_cookie(token: &str, ttl_days: i64, production: bool) -> String {
    let same_site = if production { "None" } else { "Lax" };
    let secure = if production { "; Secure" } else { "" };
    format!(
        "{SESSION_COOKIE}={token}; Max-Age={}; Path=/; HttpOnly; SameSite={same_site}{secure}",
        ttl_days * 24 * 60 * 60
    )
}

pub fn expired_session_cookie(production: bool) -> String {
    let same_site = if production { "None" } else { "Lax" };
    let secure = if production { "; Secure" } else { "" };
    format!(
        "{SESSION_COOKIE}=; Max-Age=0; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path=/; HttpOnly; SameSite={same_site}{secure}"
    )
}

pub fn session_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if !cookie.value().is_empty() {
            return Some(cookie.value().to_string());
        }
    }

    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers)
            .ok_or_else(|| AppError::unauthorized("Not authenticated"))?;

        let mut data = state.data.lock().await;
        let Some(position) = data
            .sessions
            .iter()
            .position(|session| session.session_token == token)
        else {
            return Err(AppError::unauthorized("Invalid session"));
        };

        let session = &data.sessions[position];
        if session.is_expired(Utc::now()) {
            debug!(user_id = %session.user_id, "session expired");
            data.sessions.remove(position);
            persist_data(&state.data_path, &data).await?;
            return Err(AppError::unauthorized("Session expired"));
        }

        Ok(CurrentUser(session.user_id.clone()))
    }
}

pub async fn run_session_sweeper(
    state: AppState,
    every: std::time::Duration,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let mut data = state.data.lock().await;
                let removed = purge_expired_sessions(&mut data, Utc::now());
                if removed > 0 {
                    info!(removed, "purged expired sessions");
                    if let Err(err) = persist_data(&state.data_path, &data).await {
                        tracing::error!("failed to persist after session purge: {}", err.message);
                    }
                }
            }
            _ = shutdown.changed() => {
                debug!("session sweeper stopped");
                return;
            }
        }
    }
}
