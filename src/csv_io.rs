use crate::bets::{non_empty, parse_decimal, settle_result};
use crate::models::{Bet, BetStatus};
use chrono::NaiveDate;
use csv::{ReaderBuilder, Trim, WriterBuilder};
use serde::Deserialize;

pub const COLUMNS: [&str; 11] = [
    "DATE", "TIME", "GAME", "BET", "ODDS", "STAKE", "STATUS", "RESULT", "TIPSTER", "SPORT",
    "BOOKIE",
];

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "UPPERCASE")]
struct RawRow {
    date: String,
    time: String,
    game: String,
    bet: String,
    odds: String,
    stake: String,
    status: String,
    result: String,
    tipster: String,
    sport: String,
    bookie: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportedRow {
    pub date: NaiveDate,
    pub time: Option<String>,
    pub game: String,
    pub bet: String,
    pub stake: f64,
    pub odds: f64,
    pub status: BetStatus,
    pub result: f64,
    pub tipster: Option<String>,
    pub bookie: Option<String>,
    pub sport: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RowError {
    #[error("row {line}: unreadable record: {message}")]
    Malformed { line: usize, message: String },

    #[error("row {line}: invalid date '{value}'")]
    Date { line: usize, value: String },

    #[error("row {line}: invalid {field} '{value}'")]
    Number {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("row {line}: unknown status '{value}'")]
    Status { line: usize, value: String },

    #[error("row {line}: missing {field}")]
    Missing { line: usize, field: &'static str },
}

fn clean(value: &str) -> String {
    value.trim().trim_matches('"').trim().to_string()
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

fn number(line: usize, field: &'static str, value: &str) -> Result<f64, RowError> {
    parse_decimal(value).ok_or_else(|| RowError::Number {
        line,
        field,
        value: value.to_string(),
    })
}

fn convert(line: usize, raw: RawRow) -> Result<ImportedRow, RowError> {
    let date_text = clean(&raw.date);
    let date = parse_date(&date_text).ok_or(RowError::Date {
        line,
        value: date_text,
    })?;

    let game = clean(&raw.game);
    if game.is_empty() {
        return Err(RowError::Missing { line, field: "GAME" });
    }

    let stake = number(line, "STAKE", &clean(&raw.stake))?;
    let odds = number(line, "ODDS", &clean(&raw.odds))?;
    if stake <= 0.0 {
        return Err(RowError::Number {
            line,
            field: "STAKE",
            value: raw.stake,
        });
    }
    if odds < 1.0 {
        return Err(RowError::Number {
            line,
            field: "ODDS",
            value: raw.odds,
        });
    }

    let status_text = clean(&raw.status);
    let status = BetStatus::from_import_label(&status_text).ok_or(RowError::Status {
        line,
        value: status_text,
    })?;

    // The spreadsheet's own result wins; cash-outs settle for less than the stake.
    let result_text = clean(&raw.result);
    let result = if result_text.is_empty() {
        settle_result(status, stake, odds)
    } else {
        number(line, "RESULT", &result_text)?
    };

    Ok(ImportedRow {
        date,
        time: non_empty(Some(clean(&raw.time))),
        bet: clean(&raw.bet),
        game,
        stake,
        odds,
        status,
        result,
        tipster: non_empty(Some(clean(&raw.tipster))),
        bookie: non_empty(Some(clean(&raw.bookie))),
        sport: non_empty(Some(clean(&raw.sport))),
    })
}

pub fn parse_bets(text: &str) -> Vec<Result<ImportedRow, RowError>> {
    let mut reader = ReaderBuilder::new()
        .delimiter(b';')
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    // Header names are matched case-insensitively.
    if let Ok(headers) = reader.headers() {
        let upper: csv::StringRecord = headers.iter().map(|h| clean(h).to_uppercase()).collect();
        reader.set_headers(upper);
    }

    reader
        .deserialize::<RawRow>()
        .enumerate()
        .map(|(index, record)| {
            let line = index + 2;
            record
                .map_err(|err| RowError::Malformed {
                    line,
                    message: err.to_string(),
                })
                .and_then(|raw| convert(line, raw))
        })
        .collect()
}

fn amount(value: f64) -> String {
    format!("{value}")
}

pub fn write_bets(bets: &[&Bet]) -> Result<String, csv::Error> {
    let mut writer = WriterBuilder::new().delimiter(b';').from_writer(Vec::new());
    writer.write_record(COLUMNS)?;

    for bet in bets {
        let date = bet.date.to_string();
        writer.write_record([
            date.as_str(),
            bet.time.as_deref().unwrap_or(""),
            bet.game.as_str(),
            bet.bet.as_str(),
            amount(bet.odds).as_str(),
            amount(bet.stake).as_str(),
            bet.status.as_str(),
            amount(bet.result).as_str(),
            bet.tipster.as_deref().unwrap_or(""),
            bet.sport.as_deref().unwrap_or(""),
            bet.bookie.as_deref().unwrap_or(""),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bets::fixtures::bet;

    const SAMPLE: &str = "DATE;TIME;GAME;BET;ODDS;STAKE;STATUS;RESULT;TIPSTER;SPORT;BOOKIE\n\
\"2025-01-10\";\"19:00:00\";\"Arsenal - Chelsea\";\"Home\";\"2,10\";\"100\";\"Won\";\"110\";\"Tipper\";\"\";\"Unibet\"\n\
2025-01-11;;Lakers vs Celtics;Over 220.5;1.9;50;pushed;0;;Basketball;\n\
2025-01-12;;Djokovic v Nadal;Djokovic;1.5;40;cashed out;-12.5;;;\n\
not-a-date;;Game;Bet;2;10;won;10;;;\n\
2025-01-13;;Game;Bet;2;10;void-ish;0;;;\n";

    #[test]
    fn parses_rows_and_reports_bad_ones() {
        let rows = parse_bets(SAMPLE);
        assert_eq!(rows.len(), 5);

        let first = rows[0].as_ref().unwrap();
        assert_eq!(first.odds, 2.1);
        assert_eq!(first.status, BetStatus::Won);
        assert_eq!(first.result, 110.0);
        assert_eq!(first.time.as_deref(), Some("19:00:00"));
        assert_eq!(first.tipster.as_deref(), Some("Tipper"));
        assert_eq!(first.sport, None);

        let second = rows[1].as_ref().unwrap();
        assert_eq!(second.status, BetStatus::Push);
        assert_eq!(second.sport.as_deref(), Some("Basketball"));
        assert_eq!(second.bookie, None);

        let third = rows[2].as_ref().unwrap();
        assert_eq!(third.status, BetStatus::Lost);
        assert_eq!(third.result, -12.5);

        assert!(matches!(rows[3], Err(RowError::Date { line: 5, .. })));
        assert!(matches!(rows[4], Err(RowError::Status { .. })));
    }

    #[test]
    fn missing_result_is_settled_from_status() {
        let text = "DATE;GAME;BET;ODDS;STAKE;STATUS\n2025-02-01;A - B;A;3;10;won\n";
        let rows = parse_bets(text);
        assert_eq!(rows[0].as_ref().unwrap().result, 20.0);
    }

    #[test]
    fn rejects_non_positive_stake() {
        let text = "DATE;GAME;BET;ODDS;STAKE;STATUS\n2025-02-01;A - B;A;3;0;won\n";
        assert!(matches!(
            parse_bets(text)[0],
            Err(RowError::Number { field: "STAKE", .. })
        ));
    }

    #[test]
    fn export_writes_header_and_rows() {
        let mut won = bet("2025-01-10", BetStatus::Won, 100.0, 2.5);
        won.bookie = Some("Coolbet".to_string());
        won.sport = Some("Football".to_string());
        let text = write_bets(&[&won]).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("DATE;TIME;GAME;BET;ODDS;STAKE;STATUS;RESULT;TIPSTER;SPORT;BOOKIE")
        );
        assert_eq!(
            lines.next(),
            Some("2025-01-10;;Arsenal - Chelsea;Home;2.5;100;won;150;;Football;Coolbet")
        );

        let reparsed = parse_bets(&text);
        let row = reparsed[0].as_ref().unwrap();
        assert_eq!(row.result, 150.0);
        assert_eq!(row.bookie.as_deref(), Some("Coolbet"));
    }
}
