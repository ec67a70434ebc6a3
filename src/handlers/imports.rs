use crate::auth::{short_id, CurrentUser};
use crate::bets::{settle_result, sort_chronological, BetFilter};
use crate::coolbet::{self, CoolbetImportRequest, NormalizedTicket};
use crate::csv_io::{parse_bets, write_bets, ImportedRow};
use crate::errors::AppError;
use crate::models::{Bet, CoolbetImportResponse, CsvImportRequest, CsvImportResponse};
use crate::state::AppState;
use crate::storage::persist_data;
use axum::{
    extract::State,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use std::collections::HashSet;
use tracing::{info, warn};

const EXPORT_FILENAME: &str = "bets_export.csv";

async fn export_matching(
    state: &AppState,
    user_id: &str,
    filter: &BetFilter,
) -> Result<Response, AppError> {
    let body = {
        let data = state.data.lock().await;
        let mut bets = filter.apply(data.user_bets(user_id));
        sort_chronological(&mut bets);
        write_bets(&bets)?
    };

    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename={EXPORT_FILENAME}"),
            ),
        ],
        body,
    )
        .into_response())
}

pub async fn export_all(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Response, AppError> {
    export_matching(&state, &user_id, &BetFilter::default()).await
}

pub async fn export_filtered(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(filter): Json<BetFilter>,
) -> Result<Response, AppError> {
    export_matching(&state, &user_id, &filter).await
}

fn bet_from_row(user_id: &str, row: ImportedRow, sport: String) -> Bet {
    Bet {
        bet_id: short_id("bet"),
        user_id: user_id.to_string(),
        date: row.date,
        time: row.time,
        game: row.game,
        bet: row.bet,
        stake: row.stake,
        odds: row.odds,
        status: row.status,
        result: row.result,
        bookie: row.bookie,
        tipster: row.tipster,
        sport: Some(sport),
        notes: None,
        external_id: None,
        created_at: Utc::now(),
    }
}

pub async fn import_csv(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<CsvImportRequest>,
) -> Result<Json<CsvImportResponse>, AppError> {
    let text = payload
        .csv_data
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| AppError::bad_request("csv_data required"))?;

    let mut failed = 0;
    let mut imported = Vec::new();
    for row in parse_bets(&text) {
        match row {
            Ok(row) => {
                let sport = match row.sport.clone() {
                    Some(sport) => sport,
                    None => state.sportsdb.detect_sport(&row.game).await,
                };
                imported.push(bet_from_row(&user_id, row, sport));
            }
            Err(err) => {
                warn!("skipping csv row: {err}");
                failed += 1;
            }
        }
    }

    let count = imported.len();
    if count > 0 {
        let mut data = state.data.lock().await;
        data.bets.extend(imported);
        persist_data(&state.data_path, &data).await?;
    }

    info!(imported = count, failed, "csv import finished");
    Ok(Json(CsvImportResponse {
        imported: count,
        failed,
    }))
}

fn bet_from_ticket(user_id: &str, ticket: NormalizedTicket, sport: String) -> Bet {
    Bet {
        bet_id: short_id("bet"),
        user_id: user_id.to_string(),
        date: ticket.date,
        time: ticket.time,
        game: ticket.game,
        bet: ticket.bet,
        stake: ticket.stake,
        odds: ticket.odds,
        status: ticket.status,
        result: settle_result(ticket.status, ticket.stake, ticket.odds),
        bookie: Some(coolbet::BOOKMAKER.to_string()),
        tipster: None,
        sport: Some(sport),
        notes: ticket.notes,
        external_id: Some(ticket.external_id),
        created_at: Utc::now(),
    }
}

pub(crate) fn fresh_tickets(
    tickets: Vec<NormalizedTicket>,
    known: &HashSet<String>,
) -> (Vec<NormalizedTicket>, usize) {
    let mut seen = HashSet::new();
    let mut skipped = 0;
    let fresh = tickets
        .into_iter()
        .filter(|ticket| {
            let new = !known.contains(&ticket.external_id) && seen.insert(ticket.external_id.clone());
            if !new {
                skipped += 1;
            }
            new
        })
        .collect();
    (fresh, skipped)
}

fn known_external_ids<'a>(bets: impl Iterator<Item = &'a Bet>) -> HashSet<String> {
    bets.filter_map(|bet| bet.external_id.clone()).collect()
}

pub async fn import_coolbet(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<CoolbetImportRequest>,
) -> Result<Json<CoolbetImportResponse>, AppError> {
    let total = payload.bets.len();
    let today = Utc::now().date_naive();

    let tickets: Vec<NormalizedTicket> = payload
        .bets
        .iter()
        .filter_map(|ticket| coolbet::normalize(ticket, today))
        .collect();
    let invalid = total - tickets.len();

    let known = {
        let data = state.data.lock().await;
        known_external_ids(data.user_bets(&user_id))
    };
    let (fresh, mut skipped) = fresh_tickets(tickets, &known);

    let mut bets = Vec::with_capacity(fresh.len());
    for ticket in fresh {
        let sport = match ticket.sport.clone() {
            Some(sport) => sport,
            None => state.sportsdb.detect_sport(&ticket.game).await,
        };
        bets.push(bet_from_ticket(&user_id, ticket, sport));
    }

    let mut data = state.data.lock().await;
    let known = known_external_ids(data.user_bets(&user_id));
    let before = bets.len();
    bets.retain(|bet| {
        bet.external_id
            .as_ref()
            .is_none_or(|id| !known.contains(id))
    });
    skipped += before - bets.len();

    let imported = bets.len();
    if imported > 0 {
        data.bets.extend(bets);
        persist_data(&state.data_path, &data).await?;
    }

    info!(
        source = payload.source.as_deref().unwrap_or(coolbet::BOOKMAKER),
        total, imported, skipped, invalid, "coolbet import finished"
    );
    Ok(Json(CoolbetImportResponse {
        total,
        imported,
        skipped,
        invalid,
    }))
}
