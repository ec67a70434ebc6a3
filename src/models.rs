use crate::currency::Currency;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Won,
    Lost,
    Push,
    Pending,
}

impl BetStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            BetStatus::Won => "won",
            BetStatus::Lost => "lost",
            BetStatus::Push => "push",
            BetStatus::Pending => "pending",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "won" => Some(BetStatus::Won),
            "lost" => Some(BetStatus::Lost),
            "push" => Some(BetStatus::Push),
            "pending" => Some(BetStatus::Pending),
            _ => None,
        }
    }

    pub fn from_import_label(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pushed" | "void" => Some(BetStatus::Push),
            "cashed out" => Some(BetStatus::Lost),
            "" => Some(BetStatus::Pending),
            other => Self::parse(other),
        }
    }

    pub fn is_settled(self) -> bool {
        matches!(self, BetStatus::Won | BetStatus::Lost)
    }
}

impl fmt::Display for BetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub bet_id: String,
    pub user_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<String>,
    pub game: String,
    pub bet: String,
    pub stake: f64,
    pub odds: f64,
    pub status: BetStatus,
    pub result: f64,
    #[serde(default)]
    pub bookie: Option<String>,
    #[serde(default)]
    pub tipster: Option<String>,
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bookmaker {
    pub bookmaker_id: String,
    pub user_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tipster {
    pub tipster_id: String,
    pub user_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FavoriteTeam {
    pub user_id: String,
    pub team_id: String,
    pub team_name: String,
    #[serde(default)]
    pub team_badge: Option<String>,
    pub sport: String,
    #[serde(default)]
    pub league: Option<String>,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub currency: Currency,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_token: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedFixture {
    pub fixture_id: String,
    pub home_team_id: Option<String>,
    pub away_team_id: Option<String>,
    pub home_team_name: Option<String>,
    pub away_team_name: Option<String>,
    pub home_team_badge: Option<String>,
    pub away_team_badge: Option<String>,
    pub event_date: String,
    pub event_time: Option<String>,
    pub venue: Option<String>,
    pub league: Option<String>,
    pub sport: Option<String>,
    pub status: String,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CachedFixture {
    pub fn involves_any(&self, team_ids: &[String]) -> bool {
        team_ids.iter().any(|id| {
            self.home_team_id.as_deref() == Some(id.as_str())
                || self.away_team_id.as_deref() == Some(id.as_str())
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamSearchResult {
    pub team_id: String,
    pub team_name: String,
    pub team_badge: Option<String>,
    pub sport: String,
    pub league: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedTeamSearch {
    pub teams: Vec<TeamSearchResult>,
    pub cached_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppData {
    pub users: Vec<User>,
    pub sessions: Vec<Session>,
    pub bets: Vec<Bet>,
    pub bookmakers: Vec<Bookmaker>,
    pub tipsters: Vec<Tipster>,
    pub favorite_teams: Vec<FavoriteTeam>,
    pub fixtures: Vec<CachedFixture>,
    pub team_searches: BTreeMap<String, CachedTeamSearch>,
}

impl AppData {
    pub fn user(&self, user_id: &str) -> Option<&User> {
        self.users.iter().find(|user| user.user_id == user_id)
    }

    pub fn user_bets<'a>(&'a self, user_id: &'a str) -> impl Iterator<Item = &'a Bet> + 'a {
        self.bets.iter().filter(move |bet| bet.user_id == user_id)
    }
}

// Request and response payloads

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct CurrencyRequest {
    pub currency: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CurrencyResponse {
    pub currency: Currency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub currency: Currency,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.user_id.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            picture: user.picture.clone(),
            currency: user.currency,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct BetCreate {
    pub date: NaiveDate,
    #[serde(default)]
    pub time: Option<String>,
    pub game: String,
    pub bet: String,
    pub stake: f64,
    pub odds: f64,
    pub status: BetStatus,
    #[serde(default)]
    pub bookie: Option<String>,
    #[serde(default)]
    pub tipster: Option<String>,
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BetUpdate {
    pub date: Option<NaiveDate>,
    pub time: Option<String>,
    pub game: Option<String>,
    pub bet: Option<String>,
    pub stake: Option<f64>,
    pub odds: Option<f64>,
    pub status: Option<BetStatus>,
    pub bookie: Option<String>,
    pub tipster: Option<String>,
    pub sport: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NameCreate {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct FavoriteTeamCreate {
    pub team_id: String,
    pub team_name: String,
    pub sport: String,
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default)]
    pub badge: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FavoriteAdded {
    pub message: String,
    pub team: FavoriteTeam,
}

#[derive(Debug, Deserialize)]
pub struct CsvImportRequest {
    #[serde(default)]
    pub csv_data: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CsvImportResponse {
    pub imported: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CoolbetImportResponse {
    pub total: usize,
    pub imported: usize,
    pub skipped: usize,
    pub invalid: usize,
}
