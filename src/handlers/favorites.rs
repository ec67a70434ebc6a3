use crate::auth::CurrentUser;
use crate::bets::non_empty;
use crate::errors::AppError;
use crate::handlers::query_value;
use crate::models::{
    AppData, CachedFixture, CachedTeamSearch, FavoriteAdded, FavoriteTeam, FavoriteTeamCreate,
    MessageResponse, TeamSearchResult,
};
use crate::state::AppState;
use crate::storage::persist_data;
use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

const FIXTURE_TTL_HOURS: i64 = 6;
const TEAM_SEARCH_TTL_HOURS: i64 = 24;
const EVENTS_PER_TEAM: usize = 5;
const DEFAULT_UPCOMING_DAYS: i64 = 7;
const MIN_QUERY_LEN: usize = 2;

pub async fn list_favorites(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<FavoriteTeam>>, AppError> {
    let data = state.data.lock().await;
    let mut teams: Vec<FavoriteTeam> = data
        .favorite_teams
        .iter()
        .filter(|team| team.user_id == user_id)
        .cloned()
        .collect();
    teams.sort_by(|a, b| b.added_at.cmp(&a.added_at));
    Ok(Json(teams))
}

pub async fn add_favorite(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(payload): Json<FavoriteTeamCreate>,
) -> Result<Json<FavoriteAdded>, AppError> {
    let team_id = payload.team_id.trim().to_string();
    if team_id.is_empty() || payload.team_name.trim().is_empty() {
        return Err(AppError::bad_request("team_id and team_name are required"));
    }

    let mut data = state.data.lock().await;
    if data
        .favorite_teams
        .iter()
        .any(|team| team.user_id == user_id && team.team_id == team_id)
    {
        return Err(AppError::bad_request("Team already in favorites"));
    }

    let team = FavoriteTeam {
        user_id,
        team_id,
        team_name: payload.team_name.trim().to_string(),
        team_badge: non_empty(payload.badge),
        sport: payload.sport,
        league: non_empty(payload.league),
        added_at: Utc::now(),
    };
    data.favorite_teams.push(team.clone());
    persist_data(&state.data_path, &data).await?;

    Ok(Json(FavoriteAdded {
        message: "Team added to favorites".to_string(),
        team,
    }))
}

pub async fn remove_favorite(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(team_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let mut data = state.data.lock().await;
    let before = data.favorite_teams.len();
    data.favorite_teams
        .retain(|team| !(team.user_id == user_id && team.team_id == team_id));
    if data.favorite_teams.len() == before {
        return Err(AppError::not_found("Team not found in favorites"));
    }
    persist_data(&state.data_path, &data).await?;

    Ok(Json(MessageResponse::new("Team removed from favorites")))
}

#[derive(Debug, Deserialize)]
pub struct UpcomingQuery {
    pub days: Option<String>,
}

pub(crate) fn window_end(now: DateTime<Utc>, days: i64) -> Option<String> {
    Duration::try_days(days)
        .and_then(|span| now.checked_add_signed(span))
        .map(|end| end.date_naive().to_string())
}

// ISO dates compare as text.
pub(crate) fn fixtures_in_window<'a>(
    fixtures: impl IntoIterator<Item = &'a CachedFixture>,
    team_ids: &[String],
    from: &str,
    to: &str,
    now: DateTime<Utc>,
) -> Vec<CachedFixture> {
    fixtures
        .into_iter()
        .filter(|fixture| fixture.involves_any(team_ids))
        .filter(|fixture| fixture.event_date.as_str() >= from && fixture.event_date.as_str() <= to)
        .filter(|fixture| fixture.expires_at > now)
        .cloned()
        .collect()
}

pub(crate) fn group_by_date(fixtures: Vec<CachedFixture>) -> BTreeMap<String, Vec<CachedFixture>> {
    let mut grouped: BTreeMap<String, Vec<CachedFixture>> = BTreeMap::new();
    for fixture in fixtures {
        grouped
            .entry(fixture.event_date.clone())
            .or_default()
            .push(fixture);
    }
    for day in grouped.values_mut() {
        day.sort_by(|a, b| a.event_time.cmp(&b.event_time));
    }
    grouped
}

fn store_fixtures(data: &mut AppData, fetched: &[CachedFixture], now: DateTime<Utc>) {
    data.fixtures.retain(|fixture| {
        fixture.expires_at > now && !fetched.iter().any(|new| new.fixture_id == fixture.fixture_id)
    });
    data.fixtures.extend(fetched.iter().cloned());
}

async fn fetch_fixtures(state: &AppState, team_ids: &[String], now: DateTime<Utc>) -> Vec<CachedFixture> {
    let expires_at = now + Duration::hours(FIXTURE_TTL_HOURS);
    let mut fetched: Vec<CachedFixture> = Vec::new();
    for team_id in team_ids {
        match state.sportsdb.next_events(team_id).await {
            Ok(events) => {
                for fixture in events
                    .into_iter()
                    .take(EVENTS_PER_TEAM)
                    .filter_map(|event| event.into_fixture(now, expires_at))
                {
                    if !fetched.iter().any(|known| known.fixture_id == fixture.fixture_id) {
                        fetched.push(fixture);
                    }
                }
            }
            Err(err) => warn!(team_id = %team_id, "cannot fetch fixtures: {err}"),
        }
    }
    fetched
}

pub async fn upcoming_matches(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<UpcomingQuery>,
) -> Result<Json<BTreeMap<String, Vec<CachedFixture>>>, AppError> {
    let days = query_value::<i64>("days", query.days)?
        .filter(|days| *days > 0)
        .unwrap_or(DEFAULT_UPCOMING_DAYS);
    let now = Utc::now();
    let from = now.date_naive().to_string();
    let to = window_end(now, days).ok_or_else(|| AppError::bad_request("Invalid days"))?;

    let (team_ids, cached) = {
        let data = state.data.lock().await;
        let team_ids: Vec<String> = data
            .favorite_teams
            .iter()
            .filter(|team| team.user_id == user_id)
            .map(|team| team.team_id.clone())
            .collect();
        let cached = fixtures_in_window(&data.fixtures, &team_ids, &from, &to, now);
        (team_ids, cached)
    };

    if team_ids.is_empty() {
        return Ok(Json(BTreeMap::new()));
    }
    if !cached.is_empty() {
        return Ok(Json(group_by_date(cached)));
    }

    debug!(teams = team_ids.len(), "fixture cache miss");
    let fetched = fetch_fixtures(&state, &team_ids, now).await;
    if !fetched.is_empty() {
        let mut data = state.data.lock().await;
        store_fixtures(&mut data, &fetched, now);
        persist_data(&state.data_path, &data).await?;
    }

    let upcoming = fixtures_in_window(&fetched, &team_ids, &from, &to, now);
    Ok(Json(group_by_date(upcoming)))
}

#[derive(Debug, Deserialize)]
pub struct TeamSearchQuery {
    #[serde(default)]
    pub query: String,
    pub sport: Option<String>,
}

fn search_key(query: &str, sport: Option<&str>) -> String {
    match sport {
        Some(sport) => format!("{}:{}", sport.to_lowercase(), query.to_lowercase()),
        None => query.to_lowercase(),
    }
}

pub async fn search_teams(
    State(state): State<AppState>,
    CurrentUser(_user_id): CurrentUser,
    Query(params): Query<TeamSearchQuery>,
) -> Result<Json<Vec<TeamSearchResult>>, AppError> {
    let query = params.query.trim().to_string();
    if query.chars().count() < MIN_QUERY_LEN {
        return Ok(Json(Vec::new()));
    }
    let sport = non_empty(params.sport).map(|sport| sport.to_lowercase());
    let key = search_key(&query, sport.as_deref());
    let now = Utc::now();

    {
        let data = state.data.lock().await;
        if let Some(cached) = data.team_searches.get(&key) {
            if cached.expires_at > now {
                return Ok(Json(cached.teams.clone()));
            }
        }
    }

    let teams: Vec<TeamSearchResult> = match state.sportsdb.search_teams(&query).await {
        Ok(teams) => teams
            .into_iter()
            .filter_map(|team| team.into_search_result())
            .filter(|team| sport.as_deref().is_none_or(|sport| team.sport == sport))
            .collect(),
        Err(err) => {
            warn!("team search for '{query}' failed: {err}");
            return Ok(Json(Vec::new()));
        }
    };

    let mut data = state.data.lock().await;
    data.team_searches.retain(|_, cached| cached.expires_at > now);
    data.team_searches.insert(
        key,
        CachedTeamSearch {
            teams: teams.clone(),
            cached_at: now,
            expires_at: now + Duration::hours(TEAM_SEARCH_TTL_HOURS),
        },
    );
    persist_data(&state.data_path, &data).await?;

    Ok(Json(teams))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(id: &str, home: &str, date: &str, expires_at: DateTime<Utc>) -> CachedFixture {
        CachedFixture {
            fixture_id: id.to_string(),
            home_team_id: Some(home.to_string()),
            away_team_id: Some("999".to_string()),
            home_team_name: None,
            away_team_name: None,
            home_team_badge: None,
            away_team_badge: None,
            event_date: date.to_string(),
            event_time: None,
            venue: None,
            league: None,
            sport: None,
            status: "scheduled".to_string(),
            cached_at: expires_at - Duration::hours(FIXTURE_TTL_HOURS),
            expires_at,
        }
    }

    #[test]
    fn window_keeps_fresh_fixtures_of_followed_teams() {
        let now = Utc::now();
        let fresh = now + Duration::hours(1);
        let fixtures = vec![
            fixture("1", "10", "2025-05-02", fresh),
            fixture("2", "11", "2025-05-02", fresh),
            fixture("3", "10", "2025-05-20", fresh),
            fixture("4", "10", "2025-05-03", now - Duration::hours(1)),
        ];
        let kept = fixtures_in_window(&fixtures, &["10".to_string()], "2025-05-01", "2025-05-08", now);
        let ids: Vec<&str> = kept.iter().map(|f| f.fixture_id.as_str()).collect();
        assert_eq!(ids, vec!["1"]);
    }

    #[test]
    fn grouping_is_by_event_date() {
        let later = Utc::now() + Duration::hours(1);
        let grouped = group_by_date(vec![
            fixture("1", "10", "2025-05-03", later),
            fixture("2", "10", "2025-05-02", later),
            fixture("3", "11", "2025-05-03", later),
        ]);
        let dates: Vec<&String> = grouped.keys().collect();
        assert_eq!(dates, vec!["2025-05-02", "2025-05-03"]);
        assert_eq!(grouped["2025-05-03"].len(), 2);
    }

    #[test]
    fn refetched_fixtures_replace_cached_ones() {
        let now = Utc::now();
        let mut data = AppData::default();
        data.fixtures.push(fixture("1", "10", "2025-05-02", now + Duration::hours(1)));
        data.fixtures.push(fixture("2", "10", "2025-05-02", now - Duration::hours(1)));

        let replacement = fixture("1", "10", "2025-05-04", now + Duration::hours(6));
        store_fixtures(&mut data, &[replacement], now);

        assert_eq!(data.fixtures.len(), 1);
        assert_eq!(data.fixtures[0].event_date, "2025-05-04");
    }

    #[test]
    fn window_end_rejects_unrepresentable_spans() {
        let now: DateTime<Utc> = "2025-05-01T12:00:00Z".parse().unwrap();
        assert_eq!(window_end(now, 7).as_deref(), Some("2025-05-08"));
        assert_eq!(window_end(now, 100_000_000), None);
        assert_eq!(window_end(now, i64::MAX), None);
    }

    fn favorite(user_id: &str, team_id: &str) -> FavoriteTeam {
        FavoriteTeam {
            user_id: user_id.to_string(),
            team_id: team_id.to_string(),
            team_name: format!("Team {team_id}"),
            team_badge: None,
            sport: "basketball".to_string(),
            league: None,
            added_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn upcoming_matches_groups_cached_fixtures() {
        let now = Utc::now();
        let day = |offset: i64| (now + Duration::days(offset)).date_naive().to_string();
        let fresh = now + Duration::hours(1);

        let mut data = AppData::default();
        data.favorite_teams.push(favorite("user_fan", "10"));
        data.fixtures.push(fixture("1", "10", &day(2), fresh));
        data.fixtures.push(fixture("2", "10", &day(1), fresh));
        data.fixtures.push(fixture("3", "10", &day(2), fresh));
        data.fixtures.push(fixture("4", "10", &day(30), fresh));
        data.fixtures.push(fixture("5", "11", &day(1), fresh));
        let state = crate::state::scratch_state("upcoming_cached", data);

        let Json(grouped) = upcoming_matches(
            State(state.clone()),
            CurrentUser("user_fan".to_string()),
            Query(UpcomingQuery { days: None }),
        )
        .await
        .unwrap();
        let dates: Vec<&String> = grouped.keys().collect();
        assert_eq!(dates, vec![&day(1), &day(2)]);
        assert_eq!(grouped[&day(2)].len(), 2);
        assert_eq!(grouped[&day(1)][0].fixture_id, "2");

        let Json(nothing) = upcoming_matches(
            State(state.clone()),
            CurrentUser("user_stranger".to_string()),
            Query(UpcomingQuery { days: None }),
        )
        .await
        .unwrap();
        assert!(nothing.is_empty());

        let err = upcoming_matches(
            State(state.clone()),
            CurrentUser("user_fan".to_string()),
            Query(UpcomingQuery {
                days: Some("100000000".to_string()),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.message, "Invalid days");

        if let Some(dir) = state.data_path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn search_keys_include_sport() {
        assert_eq!(search_key("Arsenal", None), "arsenal");
        assert_eq!(search_key("Arsenal", Some("Soccer")), "soccer:arsenal");
    }
}
