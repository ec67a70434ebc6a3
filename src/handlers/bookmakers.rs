use crate::auth::{short_id, CurrentUser};
use crate::errors::AppError;
use crate::models::{Bookmaker, MessageResponse, NameCreate, Tipster};
use crate::state::AppState;
use crate::storage::persist_data;
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;

pub(crate) fn unique_name<'a>(
    kind: &str,
    name: &str,
    mut existing: impl Iterator<Item = &'a str>,
) -> Result<String, AppError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request(format!("{kind} name is required")));
    }
    if existing.any(|other| other == name) {
        return Err(AppError::bad_request(format!("{kind} already exists")));
    }
    Ok(name.to_string())
}

pub async fn list_bookmakers(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<Bookmaker>>, AppError> {
    let data = state.data.lock().await;
    let mut bookmakers: Vec<Bookmaker> = data
        .bookmakers
        .iter()
        .filter(|bookmaker| bookmaker.user_id == user_id)
        .cloned()
        .collect();
    bookmakers.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(Json(bookmakers))
}

pub async fn create_bookmaker(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<NameCreate>,
) -> Result<Json<Bookmaker>, AppError> {
    let mut data = state.data.lock().await;
    let name = unique_name(
        "Bookmaker",
        &payload.name,
        data.bookmakers
            .iter()
            .filter(|bookmaker| bookmaker.user_id == user_id)
            .map(|bookmaker| bookmaker.name.as_str()),
    )?;

    let bookmaker = Bookmaker {
        bookmaker_id: short_id("bookmaker"),
        user_id,
        name,
        created_at: Utc::now(),
    };
    data.bookmakers.push(bookmaker.clone());
    persist_data(&state.data_path, &data).await?;

    Ok(Json(bookmaker))
}

pub async fn delete_bookmaker(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(bookmaker_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut data = state.data.lock().await;
    let before = data.bookmakers.len();
    data.bookmakers.retain(|bookmaker| {
        !(bookmaker.bookmaker_id == bookmaker_id && bookmaker.user_id == user_id)
    });
    if data.bookmakers.len() == before {
        return Err(AppError::not_found("Bookmaker not found"));
    }
    persist_data(&state.data_path, &data).await?;

    Ok(Json(MessageResponse::new("Bookmaker deleted")))
}

pub async fn list_tipsters(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<Tipster>>, AppError> {
    let data = state.data.lock().await;
    let mut tipsters: Vec<Tipster> = data
        .tipsters
        .iter()
        .filter(|tipster| tipster.user_id == user_id)
        .cloned()
        .collect();
    tipsters.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
    Ok(Json(tipsters))
}

pub async fn create_tipster(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<NameCreate>,
) -> Result<Json<Tipster>, AppError> {
    let mut data = state.data.lock().await;
    let name = unique_name(
        "Tipster",
        &payload.name,
        data.tipsters
            .iter()
            .filter(|tipster| tipster.user_id == user_id)
            .map(|tipster| tipster.name.as_str()),
    )?;

    let tipster = Tipster {
        tipster_id: short_id("tipster"),
        user_id,
        name,
        created_at: Utc::now(),
    };
    data.tipsters.push(tipster.clone());
    persist_data(&state.data_path, &data).await?;

    Ok(Json(tipster))
}

pub async fn delete_tipster(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(tipster_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut data = state.data.lock().await;
    let before = data.tipsters.len();
    data.tipsters
        .retain(|tipster| !(tipster.tipster_id == tipster_id && tipster.user_id == user_id));
    if data.tipsters.len() == before {
        return Err(AppError::not_found("Tipster not found"));
    }
    persist_data(&state.data_path, &data).await?;

    Ok(Json(MessageResponse::new("Tipster deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_trimmed_and_unique() {
        let existing = ["Coolbet", "Unibet"];
        assert_eq!(
            unique_name("Bookmaker", "  Betsson ", existing.iter().copied()).unwrap(),
            "Betsson"
        );

        let duplicate = unique_name("Bookmaker", "Unibet ", existing.iter().copied()).unwrap_err();
        assert_eq!(duplicate.message, "Bookmaker already exists");

        let empty = unique_name("Tipster", "   ", std::iter::empty()).unwrap_err();
        assert_eq!(empty.message, "Tipster name is required");
    }
}
