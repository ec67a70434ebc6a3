use crate::auth::{short_id, CurrentUser};
use crate::bets::{
    non_empty, paginate, require_text, settle_result, sort_newest_first, validate_amounts,
    BetFilter, Page,
};
use crate::errors::AppError;
use crate::handlers::query_value;
use crate::models::{AppData, Bet, BetCreate, BetStatus, BetUpdate, MessageResponse};
use crate::state::AppState;
use crate::storage::persist_data;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;

const DEFAULT_RECENT_LIMIT: usize = 10;

// Empty values and `all` mean no filter.
#[derive(Debug, Default, Deserialize)]
pub struct BetQuery {
    pub status: Option<String>,
    pub bookie: Option<String>,
    pub tipster: Option<String>,
    pub sport: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub page: Option<String>,
}

fn active(value: Option<String>) -> Option<String> {
    non_empty(value).filter(|value| !value.eq_ignore_ascii_case("all"))
}

fn query_date(field: &str, value: Option<String>) -> Result<Option<NaiveDate>, AppError> {
    query_value(field, active(value))
}

impl BetQuery {
    pub fn into_filter(self) -> Result<BetFilter, AppError> {
        let status = active(self.status)
            .map(|text| {
                BetStatus::parse(&text)
                    .ok_or_else(|| AppError::bad_request(format!("Invalid status: {text}")))
            })
            .transpose()?;

        Ok(BetFilter {
            status,
            bookie: active(self.bookie),
            tipster: active(self.tipster),
            sport: active(self.sport),
            date_from: query_date("date_from", self.date_from)?,
            date_to: query_date("date_to", self.date_to)?,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    pub limit: Option<String>,
}

pub(crate) fn filtered_newest_first(data: &AppData, user_id: &str, filter: &BetFilter) -> Vec<Bet> {
    let mut bets = filter.apply(data.user_bets(user_id));
    sort_newest_first(&mut bets);
    bets.into_iter().cloned().collect()
}

pub async fn list_bets(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<BetQuery>,
) -> Result<Json<Vec<Bet>>, AppError> {
    let filter = query.into_filter()?;
    let data = state.data.lock().await;
    Ok(Json(filtered_newest_first(&data, &user_id, &filter)))
}

pub async fn page_bets(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(mut query): Query<BetQuery>,
) -> Result<Json<Page<Bet>>, AppError> {
    let page = query_value::<usize>("page", query.page.take())?.unwrap_or(1);
    let filter = query.into_filter()?;
    let data = state.data.lock().await;
    let bets = filtered_newest_first(&data, &user_id, &filter);
    Ok(Json(paginate(&bets, page)))
}

pub async fn recent_bets(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<Bet>>, AppError> {
    let limit = query_value::<usize>("limit", query.limit)?.unwrap_or(DEFAULT_RECENT_LIMIT);
    let data = state.data.lock().await;
    let mut bets = filtered_newest_first(&data, &user_id, &BetFilter::default());
    bets.truncate(limit);
    Ok(Json(bets))
}

pub async fn create_bet(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<BetCreate>,
) -> Result<Json<Bet>, AppError> {
    require_text("Game", &payload.game)?;
    require_text("Bet", &payload.bet)?;
    validate_amounts(payload.stake, payload.odds)?;

    let bet = Bet {
        bet_id: short_id("bet"),
        user_id,
        date: payload.date,
        time: non_empty(payload.time),
        game: payload.game.trim().to_string(),
        bet: payload.bet.trim().to_string(),
        stake: payload.stake,
        odds: payload.odds,
        status: payload.status,
        result: settle_result(payload.status, payload.stake, payload.odds),
        bookie: non_empty(payload.bookie),
        tipster: non_empty(payload.tipster),
        sport: non_empty(payload.sport),
        notes: non_empty(payload.notes),
        external_id: None,
        created_at: Utc::now(),
    };

    let mut data = state.data.lock().await;
    data.bets.push(bet.clone());
    persist_data(&state.data_path, &data).await?;

    info!(bet_id = %bet.bet_id, status = %bet.status, "created bet");
    Ok(Json(bet))
}

pub(crate) fn apply_update(bet: &mut Bet, update: BetUpdate) -> Result<(), AppError> {
    let stake = update.stake.unwrap_or(bet.stake);
    let odds = update.odds.unwrap_or(bet.odds);
    validate_amounts(stake, odds)?;
    if let Some(game) = &update.game {
        require_text("Game", game)?;
    }
    if let Some(text) = &update.bet {
        require_text("Bet", text)?;
    }

    let resettle = update.status.is_some() || update.stake.is_some() || update.odds.is_some();

    if let Some(date) = update.date {
        bet.date = date;
    }
    if update.time.is_some() {
        bet.time = non_empty(update.time);
    }
    if let Some(game) = update.game {
        bet.game = game.trim().to_string();
    }
    if let Some(text) = update.bet {
        bet.bet = text.trim().to_string();
    }
    if let Some(status) = update.status {
        bet.status = status;
    }
    bet.stake = stake;
    bet.odds = odds;
    if update.bookie.is_some() {
        bet.bookie = non_empty(update.bookie);
    }
    if update.tipster.is_some() {
        bet.tipster = non_empty(update.tipster);
    }
    if update.sport.is_some() {
        bet.sport = non_empty(update.sport);
    }
    if update.notes.is_some() {
        bet.notes = non_empty(update.notes);
    }

    if resettle {
        bet.result = settle_result(bet.status, bet.stake, bet.odds);
    }
    Ok(())
}

pub async fn update_bet(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(bet_id): Path<String>,
    Json(payload): Json<BetUpdate>,
) -> Result<Json<Bet>, AppError> {
    let mut data = state.data.lock().await;
    let bet = data
        .bets
        .iter_mut()
        .find(|bet| bet.bet_id == bet_id && bet.user_id == user_id)
        .ok_or_else(|| AppError::not_found("Bet not found"))?;

    apply_update(bet, payload)?;
    let updated = bet.clone();
    persist_data(&state.data_path, &data).await?;

    Ok(Json(updated))
}

pub async fn delete_bet(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(bet_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut data = state.data.lock().await;
    let before = data.bets.len();
    data.bets
        .retain(|bet| !(bet.bet_id == bet_id && bet.user_id == user_id));
    if data.bets.len() == before {
        return Err(AppError::not_found("Bet not found"));
    }
    persist_data(&state.data_path, &data).await?;

    Ok(Json(MessageResponse::new("Bet deleted")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bets::fixtures::bet;

    #[test]
    fn query_strings_become_filters() {
        let query = BetQuery {
            status: Some("Won".to_string()),
            bookie: Some("".to_string()),
            sport: Some("all".to_string()),
            date_from: Some("2025-01-01".to_string()),
            ..BetQuery::default()
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.status, Some(BetStatus::Won));
        assert_eq!(filter.bookie, None);
        assert_eq!(filter.sport, None);
        assert_eq!(filter.date_from, NaiveDate::from_ymd_opt(2025, 1, 1));
    }

    #[test]
    fn bad_query_values_are_rejected() {
        let status = BetQuery {
            status: Some("maybe".to_string()),
            ..BetQuery::default()
        };
        assert_eq!(status.into_filter().unwrap_err().status.as_u16(), 400);

        let date = BetQuery {
            date_to: Some("31/01/2025".to_string()),
            ..BetQuery::default()
        };
        assert_eq!(
            date.into_filter().unwrap_err().message,
            "Invalid date_to: 31/01/2025"
        );
    }

    #[test]
    fn status_change_recomputes_result() {
        let mut pending = bet("2025-04-01", BetStatus::Pending, 100.0, 2.5);
        apply_update(
            &mut pending,
            BetUpdate {
                status: Some(BetStatus::Won),
                ..BetUpdate::default()
            },
        )
        .unwrap();
        assert_eq!(pending.result, 150.0);

        // Settled bets may move back to pending.
        apply_update(
            &mut pending,
            BetUpdate {
                status: Some(BetStatus::Pending),
                ..BetUpdate::default()
            },
        )
        .unwrap();
        assert_eq!(pending.result, 0.0);
    }

    #[test]
    fn text_only_update_keeps_result_and_clears_empty_fields() {
        let mut won = bet("2025-04-01", BetStatus::Won, 10.0, 3.0);
        won.bookie = Some("Unibet".to_string());
        won.result = 19.5;
        apply_update(
            &mut won,
            BetUpdate {
                notes: Some("late goal".to_string()),
                bookie: Some(" ".to_string()),
                ..BetUpdate::default()
            },
        )
        .unwrap();
        assert_eq!(won.result, 19.5);
        assert_eq!(won.bookie, None);
        assert_eq!(won.notes.as_deref(), Some("late goal"));
    }

    #[test]
    fn invalid_update_leaves_bet_untouched() {
        let mut lost = bet("2025-04-01", BetStatus::Lost, 10.0, 3.0);
        let err = apply_update(
            &mut lost,
            BetUpdate {
                stake: Some(0.0),
                status: Some(BetStatus::Won),
                ..BetUpdate::default()
            },
        )
        .unwrap_err();
        assert_eq!(err.message, "Stake must be greater than 0");
        assert_eq!(lost.status, BetStatus::Lost);
        assert_eq!(lost.result, -10.0);
    }
}
