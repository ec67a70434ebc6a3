use crate::models::{CachedFixture, TeamSearchResult};
use crate::sport::{self, canonical_sport, split_teams};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::warn;

const LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);
const SEARCH_TIMEOUT: Duration = Duration::from_secs(5);
const EVENTS_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum SportsDbError {
    #[error("sports database lookups are disabled")]
    Disabled,

    #[error("sports database request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("sports database answered with status {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SportsDbTeam {
    pub id_team: Option<String>,
    pub str_team: Option<String>,
    #[serde(alias = "strBadge")]
    pub str_team_badge: Option<String>,
    pub str_sport: Option<String>,
    pub str_league: Option<String>,
    pub str_country: Option<String>,
}

impl SportsDbTeam {
    pub fn into_search_result(self) -> Option<TeamSearchResult> {
        Some(TeamSearchResult {
            team_id: self.id_team?,
            team_name: self.str_team?,
            team_badge: self.str_team_badge,
            sport: self.str_sport.unwrap_or_default().to_lowercase(),
            league: self.str_league,
            country: self.str_country,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SportsDbEvent {
    pub id_event: Option<String>,
    pub id_home_team: Option<String>,
    pub id_away_team: Option<String>,
    pub str_home_team: Option<String>,
    pub str_away_team: Option<String>,
    pub str_home_team_badge: Option<String>,
    pub str_away_team_badge: Option<String>,
    pub date_event: Option<String>,
    pub str_time: Option<String>,
    pub str_venue: Option<String>,
    pub str_league: Option<String>,
    pub str_sport: Option<String>,
    pub str_status: Option<String>,
}

impl SportsDbEvent {
    pub fn into_fixture(
        self,
        cached_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Option<CachedFixture> {
        Some(CachedFixture {
            fixture_id: self.id_event?,
            event_date: self.date_event?,
            home_team_id: self.id_home_team,
            away_team_id: self.id_away_team,
            home_team_name: self.str_home_team,
            away_team_name: self.str_away_team,
            home_team_badge: self.str_home_team_badge,
            away_team_badge: self.str_away_team_badge,
            event_time: self.str_time,
            venue: self.str_venue,
            league: self.str_league,
            sport: self.str_sport,
            status: self
                .str_status
                .filter(|status| !status.trim().is_empty())
                .unwrap_or_else(|| "scheduled".to_string())
                .to_lowercase(),
            cached_at,
            expires_at,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TeamsEnvelope {
    teams: Option<Vec<Option<SportsDbTeam>>>,
}

#[derive(Debug, Deserialize)]
struct EventsEnvelope {
    events: Option<Vec<Option<SportsDbEvent>>>,
}

#[derive(Clone)]
pub struct SportsDbClient {
    client: Client,
    base_url: String,
    api_key: String,
    enabled: bool,
    sport_cache: Arc<Mutex<HashMap<String, Option<&'static str>>>>,
}

impl SportsDbClient {
    pub fn new(base_url: String, api_key: String, enabled: bool) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
            enabled,
            sport_cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.api_key, path)
    }

    pub async fn search_teams(&self, name: &str) -> Result<Vec<SportsDbTeam>, SportsDbError> {
        self.search_teams_with_timeout(name, SEARCH_TIMEOUT).await
    }

    async fn search_teams_with_timeout(
        &self,
        name: &str,
        timeout: Duration,
    ) -> Result<Vec<SportsDbTeam>, SportsDbError> {
        if !self.enabled {
            return Err(SportsDbError::Disabled);
        }

        let response = self
            .client
            .get(self.endpoint("searchteams.php"))
            .query(&[("t", name)])
            .timeout(timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SportsDbError::Status(response.status()));
        }

        let envelope: TeamsEnvelope = response.json().await?;
        Ok(envelope.teams.unwrap_or_default().into_iter().flatten().collect())
    }

    pub async fn next_events(&self, team_id: &str) -> Result<Vec<SportsDbEvent>, SportsDbError> {
        if !self.enabled {
            return Err(SportsDbError::Disabled);
        }

        let response = self
            .client
            .get(self.endpoint("eventsnext.php"))
            .query(&[("id", team_id)])
            .timeout(EVENTS_TIMEOUT)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(SportsDbError::Status(response.status()));
        }

        let envelope: EventsEnvelope = response.json().await?;
        Ok(envelope.events.unwrap_or_default().into_iter().flatten().collect())
    }

    pub async fn lookup_sport(&self, team: &str) -> Option<&'static str> {
        let key = team.trim().to_lowercase();
        if key.is_empty() || !self.enabled {
            return None;
        }
        if let Some(cached) = self.sport_cache.lock().await.get(&key) {
            return *cached;
        }

        let sport = match self.search_teams_with_timeout(team, LOOKUP_TIMEOUT).await {
            Ok(teams) => teams
                .into_iter()
                .next()
                .and_then(|team| team.str_sport)
                .map(|name| canonical_sport(&name)),
            Err(err) => {
                warn!("sports database lookup for '{team}' failed: {err}");
                None
            }
        };

        self.sport_cache.lock().await.insert(key, sport);
        sport
    }

    pub async fn detect_sport(&self, game: &str) -> String {
        if let Some((home, away)) = split_teams(game) {
            for team in [home, away] {
                if let Some(found) = self.lookup_sport(team).await {
                    if found != sport::OTHER {
                        return found.to_string();
                    }
                }
            }
        }
        sport::detect_sport(game).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_client_uses_local_detection() {
        let client = SportsDbClient::new("http://127.0.0.1:9".to_string(), "3".to_string(), false);
        assert_eq!(client.lookup_sport("Arsenal").await, None);
        assert_eq!(client.detect_sport("Lakers vs Celtics").await, "Basketball");
        assert!(matches!(
            client.search_teams("Arsenal").await,
            Err(SportsDbError::Disabled)
        ));
    }

    #[test]
    fn decodes_team_search_payload() {
        let payload = r#"{"teams":[{"idTeam":"133604","strTeam":"Arsenal","strBadge":"https://badge","strSport":"Soccer","strLeague":"English Premier League","strCountry":"England"},null]}"#;
        let envelope: TeamsEnvelope = serde_json::from_str(payload).unwrap();
        let teams: Vec<SportsDbTeam> = envelope.teams.unwrap().into_iter().flatten().collect();
        assert_eq!(teams.len(), 1);

        let result = teams[0].clone().into_search_result().unwrap();
        assert_eq!(result.team_id, "133604");
        assert_eq!(result.sport, "soccer");
        assert_eq!(result.team_badge.as_deref(), Some("https://badge"));
    }

    #[test]
    fn events_without_id_or_date_are_dropped() {
        let now = Utc::now();
        let payload = r#"{"events":[{"idEvent":"1","dateEvent":"2025-05-01","idHomeTeam":"10","strStatus":"Not Started"},{"idEvent":"2"}]}"#;
        let envelope: EventsEnvelope = serde_json::from_str(payload).unwrap();
        let fixtures: Vec<CachedFixture> = envelope
            .events
            .unwrap()
            .into_iter()
            .flatten()
            .filter_map(|event| event.into_fixture(now, now))
            .collect();
        assert_eq!(fixtures.len(), 1);
        assert_eq!(fixtures[0].status, "not started");
        assert!(fixtures[0].involves_any(&["10".to_string()]));
    }
}
