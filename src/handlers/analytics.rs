use crate::auth::CurrentUser;
use crate::errors::AppError;
use crate::handlers::query_value;
use crate::models::{AppData, Bet};
use crate::report::render_report;
use crate::state::AppState;
use crate::stats::{
    bookmaker_key, breakdown_by, calendar, daily_chart, odds_breakdown, sport_key, summarize,
    tipster_key, BreakdownRow, CalendarDay, ChartPoint, PeriodQuery, StatsSummary,
};
use axum::{
    extract::{Query, State},
    response::Html,
    Json,
};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;

const DEFAULT_CHART_DAYS: i64 = 30;

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

#[derive(Debug, Default, Deserialize)]
pub struct PeriodParams {
    pub days: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sport: Option<String>,
}

impl PeriodParams {
    pub fn into_period(self) -> Result<PeriodQuery, AppError> {
        Ok(PeriodQuery {
            days: query_value("days", self.days)?,
            start_date: query_value("start_date", self.start_date)?,
            end_date: query_value("end_date", self.end_date)?,
            sport: self.sport.map(|sport| sport.trim().to_string()),
        })
    }
}

fn selected<'a>(data: &'a AppData, user_id: &'a str, period: &PeriodQuery) -> Vec<&'a Bet> {
    period.select(data.user_bets(user_id), today())
}

pub async fn stats(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<PeriodParams>,
) -> Result<Json<StatsSummary>, AppError> {
    let period = params.into_period()?;
    let data = state.data.lock().await;
    let bets = selected(&data, &user_id, &period);
    Ok(Json(summarize(&bets)))
}

pub async fn chart(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<PeriodParams>,
) -> Result<Json<Vec<ChartPoint>>, AppError> {
    let period = params.into_period()?.with_default_days(DEFAULT_CHART_DAYS);
    let data = state.data.lock().await;
    let bets = selected(&data, &user_id, &period);
    Ok(Json(daily_chart(bets)))
}

#[derive(Debug, Deserialize)]
pub struct CalendarQuery {
    pub year: Option<String>,
    pub month: Option<String>,
}

pub async fn calendar_month(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<CalendarQuery>,
) -> Result<Json<Vec<CalendarDay>>, AppError> {
    let now = today();
    let year = query_value::<i32>("year", query.year)?.unwrap_or(now.year());
    let month = query_value::<u32>("month", query.month)?.unwrap_or(now.month());
    if !(1..=12).contains(&month) {
        return Err(AppError::bad_request("Month must be between 1 and 12"));
    }

    let data = state.data.lock().await;
    Ok(Json(calendar(data.user_bets(&user_id), year, month)))
}

pub async fn bookmakers(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<PeriodParams>,
) -> Result<Json<Vec<BreakdownRow>>, AppError> {
    let period = params.into_period()?;
    let data = state.data.lock().await;
    let bets = selected(&data, &user_id, &period);
    Ok(Json(breakdown_by(bets, bookmaker_key)))
}

pub async fn tipsters(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<PeriodParams>,
) -> Result<Json<Vec<BreakdownRow>>, AppError> {
    let period = params.into_period()?;
    let data = state.data.lock().await;
    let bets = selected(&data, &user_id, &period);
    Ok(Json(breakdown_by(bets, tipster_key)))
}

pub async fn sports(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<PeriodParams>,
) -> Result<Json<Vec<BreakdownRow>>, AppError> {
    let period = params.into_period()?;
    let data = state.data.lock().await;
    let bets = selected(&data, &user_id, &period);
    Ok(Json(breakdown_by(bets, sport_key)))
}

pub async fn odds_ranges(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<PeriodParams>,
) -> Result<Json<Vec<BreakdownRow>>, AppError> {
    let period = params.into_period()?;
    let data = state.data.lock().await;
    let bets = selected(&data, &user_id, &period);
    Ok(Json(odds_breakdown(bets)))
}

pub(crate) fn period_label(period: &PeriodQuery, today: NaiveDate) -> String {
    let range = match period.bounds(today) {
        (None, None) => "All time".to_string(),
        (Some(from), None) if period.start_date.is_none() => match period.days {
            Some(days) => format!("Last {days} days"),
            None => format!("Since {from}"),
        },
        (Some(from), None) => format!("Since {from}"),
        (None, Some(to)) => format!("Until {to}"),
        (Some(from), Some(to)) => format!("{from} to {to}"),
    };
    match period.sport_filter() {
        Some(sport) => format!("{range}, {sport}"),
        None => range,
    }
}

pub async fn report(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(params): Query<PeriodParams>,
) -> Result<Html<String>, AppError> {
    let period = params.into_period()?;
    let now = today();
    let data = state.data.lock().await;
    let user = data
        .user(&user_id)
        .ok_or_else(|| AppError::not_found("User not found"))?;
    let bets = selected(&data, &user_id, &period);
    let summary = summarize(&bets);

    Ok(Html(render_report(
        &user.name,
        &period_label(&period, now),
        now,
        &summary,
        &bets,
        user.currency,
    )))
}
