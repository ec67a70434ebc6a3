use crate::bets::sort_chronological;
use crate::models::{Bet, BetStatus};
use chrono::{Datelike, NaiveDate, TimeDelta};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Default)]
pub struct PeriodQuery {
    pub days: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub sport: Option<String>,
}

impl PeriodQuery {
    // Explicit dates win over `days`. No positive, representable `days` means all time.
    pub fn bounds(&self, today: NaiveDate) -> (Option<NaiveDate>, Option<NaiveDate>) {
        if self.start_date.is_some() || self.end_date.is_some() {
            return (self.start_date, self.end_date);
        }
        let from = self
            .days
            .filter(|days| *days > 0)
            .and_then(TimeDelta::try_days)
            .and_then(|span| today.checked_sub_signed(span));
        (from, None)
    }

    pub fn with_default_days(mut self, days: i64) -> Self {
        if self.days.is_none() && self.start_date.is_none() && self.end_date.is_none() {
            self.days = Some(days);
        }
        self
    }

    pub fn sport_filter(&self) -> Option<&str> {
        self.sport
            .as_deref()
            .filter(|sport| !sport.is_empty() && !sport.eq_ignore_ascii_case("all"))
    }

    pub fn select<'a, I>(&self, bets: I, today: NaiveDate) -> Vec<&'a Bet>
    where
        I: IntoIterator<Item = &'a Bet>,
    {
        let (from, to) = self.bounds(today);
        let sport = self.sport_filter();

        let mut selected: Vec<&Bet> = bets
            .into_iter()
            .filter(|bet| from.is_none_or(|from| bet.date >= from))
            .filter(|bet| to.is_none_or(|to| bet.date <= to))
            .filter(|bet| sport.is_none_or(|sport| bet.sport.as_deref() == Some(sport)))
            .collect();
        sort_chronological(&mut selected);
        selected
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Streaks {
    pub current: u32,
    pub current_type: Option<BetStatus>,
    pub best_win: u32,
    pub worst_loss: u32,
}

pub fn compute_streaks<I>(outcomes: I) -> Streaks
where
    I: IntoIterator<Item = BetStatus>,
{
    let mut streaks = Streaks::default();
    for status in outcomes.into_iter().filter(|status| status.is_settled()) {
        if streaks.current_type == Some(status) {
            streaks.current += 1;
        } else {
            streaks.current = 1;
            streaks.current_type = Some(status);
        }
        match status {
            BetStatus::Won => streaks.best_win = streaks.best_win.max(streaks.current),
            _ => streaks.worst_loss = streaks.worst_loss.max(streaks.current),
        }
    }
    streaks
}

pub fn roi(profit_loss: f64, stake: f64) -> f64 {
    if stake > 0.0 {
        profit_loss / stake * 100.0
    } else {
        0.0
    }
}

pub fn win_rate(won: usize, lost: usize) -> f64 {
    let settled = won + lost;
    if settled > 0 {
        won as f64 / settled as f64 * 100.0
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsSummary {
    pub total_bets: usize,
    pub total_stake: f64,
    pub total_profit_loss: f64,
    pub roi: f64,
    pub won_count: usize,
    pub lost_count: usize,
    pub push_count: usize,
    pub pending_count: usize,
    pub win_rate: f64,
    pub current_streak: u32,
    pub current_streak_type: Option<BetStatus>,
    pub best_win_streak: u32,
    pub worst_loss_streak: u32,
}

// Expects `bets` in chronological order.
pub fn summarize(bets: &[&Bet]) -> StatsSummary {
    let tally = Tally::of(bets.iter().copied());
    let streaks = compute_streaks(bets.iter().map(|bet| bet.status));

    StatsSummary {
        total_bets: tally.bets,
        total_stake: tally.stake,
        total_profit_loss: tally.profit_loss,
        roi: roi(tally.profit_loss, tally.stake),
        won_count: tally.won,
        lost_count: tally.lost,
        push_count: tally.push,
        pending_count: tally.pending,
        win_rate: win_rate(tally.won, tally.lost),
        current_streak: streaks.current,
        current_streak_type: streaks.current_type,
        best_win_streak: streaks.best_win,
        worst_loss_streak: streaks.worst_loss,
    }
}

#[derive(Debug, Clone, Default)]
struct Tally {
    bets: usize,
    stake: f64,
    profit_loss: f64,
    won: usize,
    lost: usize,
    push: usize,
    pending: usize,
}

impl Tally {
    fn of<'a>(bets: impl IntoIterator<Item = &'a Bet>) -> Self {
        let mut tally = Tally::default();
        for bet in bets {
            tally.add(bet);
        }
        tally
    }

    fn add(&mut self, bet: &Bet) {
        self.bets += 1;
        self.stake += bet.stake;
        self.profit_loss += bet.result;
        match bet.status {
            BetStatus::Won => self.won += 1,
            BetStatus::Lost => self.lost += 1,
            BetStatus::Push => self.push += 1,
            BetStatus::Pending => self.pending += 1,
        }
    }

    fn into_row(self, name: String) -> BreakdownRow {
        BreakdownRow {
            name,
            bets: self.bets,
            stake: self.stake,
            profit_loss: self.profit_loss,
            won: self.won,
            lost: self.lost,
            push: self.push,
            pending: self.pending,
            win_rate: win_rate(self.won, self.lost),
            roi: roi(self.profit_loss, self.stake),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakdownRow {
    pub name: String,
    pub bets: usize,
    pub stake: f64,
    pub profit_loss: f64,
    pub won: usize,
    pub lost: usize,
    pub push: usize,
    pub pending: usize,
    pub win_rate: f64,
    pub roi: f64,
}

pub fn breakdown_by<'a, I, F>(bets: I, key: F) -> Vec<BreakdownRow>
where
    I: IntoIterator<Item = &'a Bet>,
    F: Fn(&Bet) -> Option<String>,
{
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Tally> = HashMap::new();
    for bet in bets {
        let Some(name) = key(bet) else { continue };
        let tally = groups.entry(name.clone()).or_insert_with(|| {
            order.push(name);
            Tally::default()
        });
        tally.add(bet);
    }

    let mut rows: Vec<BreakdownRow> = order
        .into_iter()
        .filter_map(|name| groups.remove(&name).map(|tally| tally.into_row(name)))
        .collect();
    rows.sort_by(|a, b| b.profit_loss.total_cmp(&a.profit_loss));
    rows
}

pub fn bookmaker_key(bet: &Bet) -> Option<String> {
    Some(named_or_unknown(&bet.bookie))
}

pub fn sport_key(bet: &Bet) -> Option<String> {
    Some(named_or_unknown(&bet.sport))
}

pub fn tipster_key(bet: &Bet) -> Option<String> {
    bet.tipster
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn named_or_unknown(value: &Option<String>) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or("Unknown")
        .to_string()
}

// Upper bounds are inclusive; the last range is open-ended.
pub const ODDS_RANGES: [(&str, f64); 5] = [
    ("1.00-1.50", 1.50),
    ("1.51-2.00", 2.00),
    ("2.01-3.00", 3.00),
    ("3.01-5.00", 5.00),
    ("5.01+", f64::INFINITY),
];

pub fn odds_range_name(odds: f64) -> &'static str {
    ODDS_RANGES
        .iter()
        .find(|(_, upper)| odds <= *upper)
        .map(|(name, _)| *name)
        .unwrap_or(ODDS_RANGES[ODDS_RANGES.len() - 1].0)
}

pub fn odds_breakdown<'a, I>(bets: I) -> Vec<BreakdownRow>
where
    I: IntoIterator<Item = &'a Bet>,
{
    let mut tallies: Vec<Tally> = vec![Tally::default(); ODDS_RANGES.len()];
    for bet in bets {
        let name = odds_range_name(bet.odds);
        if let Some(index) = ODDS_RANGES.iter().position(|(range, _)| *range == name) {
            tallies[index].add(bet);
        }
    }

    ODDS_RANGES
        .iter()
        .zip(tallies)
        .filter(|(_, tally)| tally.bets > 0)
        .map(|((name, _), tally)| tally.into_row(name.to_string()))
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub daily_pl: f64,
    pub cumulative_pl: f64,
    pub bets: usize,
}

pub fn daily_chart<'a, I>(bets: I) -> Vec<ChartPoint>
where
    I: IntoIterator<Item = &'a Bet>,
{
    let mut days: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for bet in bets {
        let entry = days.entry(bet.date).or_default();
        entry.0 += bet.result;
        entry.1 += 1;
    }

    let mut cumulative = 0.0;
    days.into_iter()
        .map(|(date, (daily_pl, bets))| {
            cumulative += daily_pl;
            ChartPoint {
                date,
                daily_pl,
                cumulative_pl: cumulative,
                bets,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub profit_loss: f64,
    pub bets: usize,
    pub won: usize,
    pub lost: usize,
}

pub fn calendar<'a, I>(bets: I, year: i32, month: u32) -> Vec<CalendarDay>
where
    I: IntoIterator<Item = &'a Bet>,
{
    let mut days: BTreeMap<NaiveDate, CalendarDay> = BTreeMap::new();
    for bet in bets
        .into_iter()
        .filter(|bet| bet.date.year() == year && bet.date.month() == month)
    {
        let day = days.entry(bet.date).or_insert_with(|| CalendarDay {
            date: bet.date,
            ..CalendarDay::default()
        });
        day.profit_loss += bet.result;
        day.bets += 1;
        match bet.status {
            BetStatus::Won => day.won += 1,
            BetStatus::Lost => day.lost += 1,
            _ => {}
        }
    }
    days.into_values().collect()
}
