pub mod analytics;
pub mod auth;
pub mod bets;
pub mod bookmakers;
pub mod favorites;
pub mod imports;

use crate::errors::AppError;
use axum::Json;
use serde_json::{json, Value};
use std::str::FromStr;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) fn query_value<T: FromStr>(field: &str, value: Option<String>) -> Result<Option<T>, AppError> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .map(|text| {
            text.parse::<T>()
                .map_err(|_| AppError::bad_request(format!("Invalid {field}: {text}")))
        })
        .transpose()
}
