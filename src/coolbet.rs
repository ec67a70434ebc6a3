use crate::bets::{non_empty, parse_decimal};
use crate::models::BetStatus;
use crate::sport;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

pub const BOOKMAKER: &str = "Coolbet";
pub const EXTERNAL_ID_PREFIX: &str = "coolbet-";

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    pub fn value(&self) -> Option<f64> {
        match self {
            Amount::Number(value) if value.is_finite() => Some(*value),
            Amount::Number(_) => None,
            Amount::Text(text) => parse_decimal(text),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoolbetTicket {
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub stake: Option<Amount>,
    #[serde(default)]
    pub odds: Option<Amount>,
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub placed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub selection: Option<String>,
    #[serde(default)]
    pub bet_type: Option<String>,
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default)]
    pub market: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CoolbetImportRequest {
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub bets: Vec<CoolbetTicket>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTicket {
    pub external_id: String,
    pub date: NaiveDate,
    pub time: Option<String>,
    pub game: String,
    pub bet: String,
    pub stake: f64,
    pub odds: f64,
    pub status: BetStatus,
    pub sport: Option<String>,
    pub notes: Option<String>,
}

pub fn status_from_text(text: &str) -> BetStatus {
    let text = text.to_lowercase();
    if text.contains("won") {
        BetStatus::Won
    } else if text.contains("lost") {
        BetStatus::Lost
    } else {
        BetStatus::Pending
    }
}

pub fn sport_from_icon(icon: &str) -> Option<&'static str> {
    let icon = icon.trim();
    if icon.is_empty() || icon.eq_ignore_ascii_case("unknown") {
        return None;
    }
    match sport::canonical_sport(icon) {
        sport::OTHER => None,
        known => Some(known),
    }
}

fn external_id(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let ticket = raw.strip_prefix(EXTERNAL_ID_PREFIX).unwrap_or(raw).trim();
    if ticket.is_empty() || ticket == "undefined" || ticket == "null" {
        return None;
    }
    Some(format!("{EXTERNAL_ID_PREFIX}{ticket}"))
}

pub fn normalize(ticket: &CoolbetTicket, today: NaiveDate) -> Option<NormalizedTicket> {
    let external_id = external_id(ticket.external_id.as_deref()?)?;
    let stake = ticket.stake.as_ref()?.value()?;
    let odds = ticket.odds.as_ref()?.value()?;
    if stake <= 0.0 || odds < 1.0 {
        return None;
    }

    let game = non_empty(ticket.event.clone()).unwrap_or_else(|| "Unknown Event".to_string());
    let bet = non_empty(ticket.selection.clone())
        .or_else(|| match (non_empty(ticket.market.clone()), non_empty(ticket.outcome.clone())) {
            (Some(market), Some(outcome)) => Some(format!("{market} - {outcome}")),
            (market, outcome) => market.or(outcome),
        })
        .unwrap_or_else(|| game.clone());

    let notes = [
        non_empty(ticket.league.clone()).map(|league| format!("League: {league}")),
        non_empty(ticket.bet_type.clone()).map(|kind| format!("Type: {kind}")),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(", ");

    Some(NormalizedTicket {
        external_id,
        date: ticket
            .placed_at
            .map(|placed| placed.date_naive())
            .unwrap_or(today),
        time: ticket
            .placed_at
            .map(|placed| placed.format("%H:%M:%S").to_string()),
        game,
        bet,
        stake,
        odds,
        status: status_from_text(ticket.result.as_deref().unwrap_or_default()),
        sport: ticket
            .sport
            .as_deref()
            .and_then(sport_from_icon)
            .map(str::to_string),
        notes: non_empty(Some(notes)),
    })
}
