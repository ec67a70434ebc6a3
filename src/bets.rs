use crate::errors::AppError;
use crate::models::{Bet, BetStatus};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const PAGE_SIZE: usize = 20;

pub fn settle_result(status: BetStatus, stake: f64, odds: f64) -> f64 {
    match status {
        BetStatus::Won => stake * (odds - 1.0),
        BetStatus::Lost => -stake,
        BetStatus::Push | BetStatus::Pending => 0.0,
    }
}

pub fn validate_amounts(stake: f64, odds: f64) -> Result<(), AppError> {
    if !stake.is_finite() || stake <= 0.0 {
        return Err(AppError::bad_request("Stake must be greater than 0"));
    }
    if !odds.is_finite() || odds < 1.0 {
        return Err(AppError::bad_request("Odds must be at least 1.0"));
    }
    Ok(())
}

pub fn require_text(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::bad_request(format!("{field} is required")));
    }
    Ok(())
}

pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

// Whichever of `,` or `.` comes last is the decimal separator.
pub fn parse_decimal(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, ',' | '.' | '-'))
        .collect();
    let normalized = match (cleaned.rfind(','), cleaned.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        _ => cleaned,
    };
    normalized.parse::<f64>().ok().filter(|value| value.is_finite())
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BetFilter {
    #[serde(default)]
    pub status: Option<BetStatus>,
    #[serde(default)]
    pub bookie: Option<String>,
    #[serde(default)]
    pub tipster: Option<String>,
    #[serde(default)]
    pub sport: Option<String>,
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
}

impl BetFilter {
    pub fn matches(&self, bet: &Bet) -> bool {
        if let Some(from) = self.date_from {
            if bet.date < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if bet.date > to {
                return false;
            }
        }
        if let Some(status) = self.status {
            if bet.status != status {
                return false;
            }
        }
        field_matches(&self.bookie, &bet.bookie)
            && field_matches(&self.tipster, &bet.tipster)
            && field_matches(&self.sport, &bet.sport)
    }

    pub fn apply<'a, I>(&self, bets: I) -> Vec<&'a Bet>
    where
        I: IntoIterator<Item = &'a Bet>,
    {
        bets.into_iter().filter(|bet| self.matches(bet)).collect()
    }
}

fn field_matches(wanted: &Option<String>, actual: &Option<String>) -> bool {
    match wanted.as_deref() {
        None | Some("") => true,
        Some(wanted) => actual.as_deref() == Some(wanted),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub page_count: usize,
    pub total: usize,
}

pub fn page_count(total: usize) -> usize {
    total.div_ceil(PAGE_SIZE)
}

pub fn paginate<T: Clone>(items: &[T], page: usize) -> Page<T> {
    let page = page.max(1);
    let start = (page - 1).saturating_mul(PAGE_SIZE);
    let slice = if start >= items.len() {
        &[][..]
    } else {
        &items[start..(start + PAGE_SIZE).min(items.len())]
    };

    Page {
        items: slice.to_vec(),
        page,
        page_size: PAGE_SIZE,
        page_count: page_count(items.len()),
        total: items.len(),
    }
}

fn chronological(a: &Bet, b: &Bet) -> Ordering {
    a.date
        .cmp(&b.date)
        .then_with(|| a.time.as_deref().unwrap_or("").cmp(b.time.as_deref().unwrap_or("")))
        .then_with(|| a.created_at.cmp(&b.created_at))
}

pub fn sort_chronological(bets: &mut [&Bet]) {
    bets.sort_by(|a, b| chronological(a, b));
}

pub fn sort_newest_first(bets: &mut [&Bet]) {
    bets.sort_by(|a, b| chronological(b, a));
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::{TimeZone, Utc};

    pub fn bet(date: &str, status: BetStatus, stake: f64, odds: f64) -> Bet {
        Bet {
            bet_id: format!("bet_{date}_{stake}_{odds}"),
            user_id: "user_test".to_string(),
            date: date.parse().expect("valid date"),
            time: None,
            game: "Arsenal - Chelsea".to_string(),
            bet: "Home".to_string(),
            stake,
            odds,
            status,
            result: settle_result(status, stake, odds),
            bookie: None,
            tipster: None,
            sport: None,
            notes: None,
            external_id: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::bet;
    use super::*;

    #[test]
    fn settles_by_status() {
        assert_eq!(settle_result(BetStatus::Won, 100.0, 2.5), 150.0);
        assert_eq!(settle_result(BetStatus::Lost, 100.0, 2.5), -100.0);
        assert_eq!(settle_result(BetStatus::Push, 100.0, 2.5), 0.0);
        assert_eq!(settle_result(BetStatus::Pending, 100.0, 2.5), 0.0);
    }

    #[test]
    fn rejects_bad_amounts() {
        assert!(validate_amounts(10.0, 1.0).is_ok());
        assert!(validate_amounts(0.0, 2.0).is_err());
        assert!(validate_amounts(-1.0, 2.0).is_err());
        assert!(validate_amounts(10.0, 0.99).is_err());
        assert!(validate_amounts(f64::NAN, 2.0).is_err());
    }

    #[test]
    fn parses_scraped_amounts() {
        assert_eq!(parse_decimal("12,50 kr"), Some(12.5));
        assert_eq!(parse_decimal("$1,234.50"), Some(1234.5));
        assert_eq!(parse_decimal("1.234,50 €"), Some(1234.5));
        assert_eq!(parse_decimal("\"2.10\""), Some(2.1));
        assert_eq!(parse_decimal("-40"), Some(-40.0));
        assert_eq!(parse_decimal("n/a"), None);
        assert_eq!(parse_decimal(""), None);
    }

    #[test]
    fn filter_requires_every_active_predicate() {
        let mut a = bet("2025-03-01", BetStatus::Won, 10.0, 2.0);
        a.bookie = Some("Coolbet".to_string());
        a.sport = Some("Football".to_string());
        let mut b = bet("2025-03-05", BetStatus::Won, 10.0, 2.0);
        b.bookie = Some("Unibet".to_string());
        let c = bet("2025-03-10", BetStatus::Lost, 10.0, 2.0);
        let bets = vec![a, b, c];

        let filter = BetFilter {
            status: Some(BetStatus::Won),
            bookie: Some("Coolbet".to_string()),
            ..BetFilter::default()
        };
        let filtered = filter.apply(&bets);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].bookie.as_deref(), Some("Coolbet"));

        let empty_fields = BetFilter {
            bookie: Some(String::new()),
            ..BetFilter::default()
        };
        assert_eq!(empty_fields.apply(&bets).len(), 3);
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let bets = vec![
            bet("2025-03-01", BetStatus::Won, 10.0, 2.0),
            bet("2025-03-05", BetStatus::Won, 10.0, 2.0),
            bet("2025-03-10", BetStatus::Won, 10.0, 2.0),
        ];
        let filter = BetFilter {
            date_from: "2025-03-01".parse().ok(),
            date_to: "2025-03-05".parse().ok(),
            ..BetFilter::default()
        };
        let dates: Vec<String> = filter
            .apply(&bets)
            .iter()
            .map(|bet| bet.date.to_string())
            .collect();
        assert_eq!(dates, vec!["2025-03-01", "2025-03-05"]);
    }

    #[test]
    fn pages_concatenate_to_input() {
        let items: Vec<usize> = (0..45).collect();
        let first = paginate(&items, 1);
        assert_eq!(first.page_count, 3);
        assert_eq!(first.items.len(), 20);
        assert_eq!(first.total, 45);

        let mut joined = Vec::new();
        for page in 1..=first.page_count {
            joined.extend(paginate(&items, page).items);
        }
        assert_eq!(joined, items);
    }

    #[test]
    fn page_edges() {
        let items: Vec<usize> = (0..20).collect();
        assert_eq!(paginate(&items, 0).page, 1);
        assert_eq!(paginate(&items, 1).page_count, 1);
        assert!(paginate(&items, 2).items.is_empty());

        let none: Vec<usize> = Vec::new();
        let page = paginate(&none, 1);
        assert_eq!(page.page_count, 0);
        assert!(page.items.is_empty());
    }

    #[test]
    fn newest_first_uses_date_then_time() {
        let mut early = bet("2025-03-01", BetStatus::Won, 10.0, 2.0);
        early.time = Some("18:00:00".to_string());
        let mut late = bet("2025-03-01", BetStatus::Won, 10.0, 2.0);
        late.time = Some("21:00:00".to_string());
        let older = bet("2025-02-01", BetStatus::Won, 10.0, 2.0);

        let mut refs = vec![&older, &early, &late];
        sort_newest_first(&mut refs);
        assert_eq!(refs[0].time.as_deref(), Some("21:00:00"));
        assert_eq!(refs[2].date.to_string(), "2025-02-01");
    }
}
