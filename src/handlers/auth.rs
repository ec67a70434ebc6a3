use crate::auth::{
    expired_session_cookie, hash_password, open_session, session_cookie, session_token, short_id,
    verify_password, CurrentUser, MIN_PASSWORD_LEN,
};
use crate::currency::Currency;
use crate::errors::AppError;
use crate::models::{
    CurrencyRequest, CurrencyResponse, LoginRequest, MessageResponse, RegisterRequest, User,
    UserProfile,
};
use crate::state::AppState;
use crate::storage::persist_data;
use axum::{
    extract::State,
    http::{header::SET_COOKIE, HeaderMap},
    response::{AppendHeaders, IntoResponse},
    Json,
};
use chrono::Utc;
use tracing::{info, warn};

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && domain.contains('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut boundary = true;
    for c in value.chars() {
        if c.is_alphabetic() {
            if boundary {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            boundary = false;
        } else {
            out.push(c);
            boundary = true;
        }
    }
    out
}

fn with_session_cookie(cookie: String, profile: UserProfile) -> impl IntoResponse {
    (AppendHeaders([(SET_COOKIE, cookie)]), Json(profile))
}

pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = payload.email.trim().to_lowercase();
    if !looks_like_email(&email) {
        return Err(AppError::bad_request("Invalid email address"));
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }

    let mut data = state.data.lock().await;
    if data.users.iter().any(|user| user.email == email) {
        return Err(AppError::bad_request("Email already registered"));
    }

    let password_hash = hash_password(&payload.password).map_err(AppError::internal)?;
    let name = payload
        .name
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| title_case(email.split('@').next().unwrap_or_default()));

    let now = Utc::now();
    let user = User {
        user_id: short_id("user"),
        email,
        name,
        picture: None,
        currency: Currency::default(),
        password_hash,
        created_at: now,
    };
    let profile = UserProfile::from(&user);
    data.users.push(user);

    let ttl = state.settings.session_ttl_days();
    let token = open_session(&mut data, &profile.user_id, ttl, now);
    persist_data(&state.data_path, &data).await?;

    info!(user_id = %profile.user_id, "registered user");
    let cookie = session_cookie(&token, ttl, state.settings.is_production());
    Ok(with_session_cookie(cookie, profile))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let email = payload.email.trim().to_lowercase();
    let mut data = state.data.lock().await;

    let Some(user) = data.users.iter().find(|user| user.email == email) else {
        return Err(AppError::unauthorized("Invalid email or password"));
    };
    let verified = verify_password(&payload.password, &user.password_hash).unwrap_or_else(|err| {
        warn!(user_id = %user.user_id, "cannot verify password: {err}");
        false
    });
    if !verified {
        return Err(AppError::unauthorized("Invalid email or password"));
    }
    let profile = UserProfile::from(user);

    let ttl = state.settings.session_ttl_days();
    let token = open_session(&mut data, &profile.user_id, ttl, Utc::now());
    persist_data(&state.data_path, &data).await?;

    let cookie = session_cookie(&token, ttl, state.settings.is_production());
    Ok(with_session_cookie(cookie, profile))
}

pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    if let Some(token) = session_token(&headers) {
        let mut data = state.data.lock().await;
        let before = data.sessions.len();
        data.sessions.retain(|session| session.session_token != token);
        if data.sessions.len() != before {
            persist_data(&state.data_path, &data).await?;
        }
    }

    let cookie = expired_session_cookie(state.settings.is_production());
    Ok((
        AppendHeaders([(SET_COOKIE, cookie)]),
        Json(MessageResponse::new("Logged out")),
    ))
}

pub async fn me(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<UserProfile>, AppError> {
    let data = state.data.lock().await;
    let user = data
        .user(&user_id)
        .ok_or_else(|| AppError::not_found("User not found"))?;
    Ok(Json(UserProfile::from(user)))
}

pub async fn update_currency(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<CurrencyRequest>,
) -> Result<Json<CurrencyResponse>, AppError> {
    let currency = Currency::parse(&payload.currency)
        .ok_or_else(|| AppError::bad_request("Invalid currency"))?;

    let mut data = state.data.lock().await;
    let user = data
        .users
        .iter_mut()
        .find(|user| user.user_id == user_id)
        .ok_or_else(|| AppError::not_found("User not found"))?;
    user.currency = currency;
    persist_data(&state.data_path, &data).await?;

    Ok(Json(CurrencyResponse { currency }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_names_are_title_cased() {
        assert_eq!(title_case("john.doe"), "John.Doe");
        assert_eq!(title_case("ANNA_K"), "Anna_K");
        assert_eq!(title_case("bettor99x"), "Bettor99X");
    }

    #[test]
    fn email_shape() {
        assert!(looks_like_email("a@b.io"));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.io"));
        assert!(!looks_like_email("a b@c.io"));
        assert!(!looks_like_email("plain"));
    }
}
