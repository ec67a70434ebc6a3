use crate::bets::sort_newest_first;
use crate::currency::Currency;
use crate::models::{Bet, BetStatus};
use crate::stats::StatsSummary;
use chrono::NaiveDate;

pub const RECENT_ROWS: usize = 15;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn tone(value: f64) -> &'static str {
    if value > 0.0 {
        "pos"
    } else if value < 0.0 {
        "neg"
    } else {
        "flat"
    }
}

fn outcome_rows(summary: &StatsSummary) -> String {
    [
        (BetStatus::Won, summary.won_count),
        (BetStatus::Lost, summary.lost_count),
        (BetStatus::Push, summary.push_count),
        (BetStatus::Pending, summary.pending_count),
    ]
    .iter()
    .map(|(status, count)| {
        let share = if summary.total_bets > 0 {
            *count as f64 / summary.total_bets as f64 * 100.0
        } else {
            0.0
        };
        format!(
            "<tr><td class=\"status {status}\">{status}</td><td>{count}</td><td>{share:.1}%</td></tr>"
        )
    })
    .collect::<Vec<_>>()
    .join("\n")
}

fn recent_rows(bets: &[&Bet], currency: Currency) -> String {
    let mut recent = bets.to_vec();
    sort_newest_first(&mut recent);
    if recent.is_empty() {
        return "<tr><td colspan=\"6\" class=\"empty\">No bets in this period</td></tr>".to_string();
    }
    recent
        .iter()
        .take(RECENT_ROWS)
        .map(|bet| {
            format!(
                "<tr><td>{}</td><td>{}<div class=\"pick\">{}</div></td><td>{:.2}</td><td>{}</td><td class=\"status {}\">{}</td><td class=\"{}\">{}</td></tr>",
                bet.date,
                escape(&bet.game),
                escape(&bet.bet),
                bet.odds,
                currency.format(bet.stake),
                bet.status,
                bet.status,
                tone(bet.result),
                currency.format_signed(bet.result),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_report(
    user_name: &str,
    period: &str,
    generated: NaiveDate,
    summary: &StatsSummary,
    bets: &[&Bet],
    currency: Currency,
) -> String {
    REPORT_HTML
        .replace("{{USER}}", &escape(user_name))
        .replace("{{PERIOD}}", &escape(period))
        .replace("{{GENERATED}}", &generated.format("%B %-d, %Y").to_string())
        .replace("{{TOTAL_BETS}}", &summary.total_bets.to_string())
        .replace("{{WIN_RATE}}", &format!("{:.1}%", summary.win_rate))
        .replace("{{ROI}}", &format!("{:.1}%", summary.roi))
        .replace("{{ROI_TONE}}", tone(summary.roi))
        .replace("{{RESULT}}", &currency.format_signed(summary.total_profit_loss))
        .replace("{{RESULT_TONE}}", tone(summary.total_profit_loss))
        .replace("{{STAKE}}", &currency.format(summary.total_stake))
        .replace("{{OUTCOMES}}", &outcome_rows(summary))
        .replace("{{RECENT}}", &recent_rows(bets, currency))
}

const REPORT_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <title>Betting Report</title>
  <style>
    :root {
      --ink: #1f2933;
      --muted: #6b7280;
      --line: #e5e7eb;
      --pos: #15803d;
      --neg: #b91c1c;
    }

    body {
      margin: 32px;
      color: var(--ink);
      font-family: "Helvetica Neue", Arial, sans-serif;
      font-size: 13px;
    }

    h1 {
      margin: 0 0 4px;
      font-size: 24px;
    }

    h2 {
      margin: 28px 0 10px;
      font-size: 16px;
    }

    .meta {
      color: var(--muted);
    }

    .cards {
      display: grid;
      grid-template-columns: repeat(4, 1fr);
      gap: 12px;
      margin-top: 20px;
    }

    .card {
      border: 1px solid var(--line);
      border-radius: 8px;
      padding: 12px;
    }

    .card .label {
      color: var(--muted);
      font-size: 11px;
      text-transform: uppercase;
    }

    .card .value {
      font-size: 20px;
      font-weight: 600;
      margin-top: 4px;
    }

    table {
      width: 100%;
      border-collapse: collapse;
    }

    th, td {
      text-align: left;
      padding: 6px 8px;
      border-bottom: 1px solid var(--line);
    }

    th {
      color: var(--muted);
      font-weight: 500;
    }

    .pick {
      color: var(--muted);
      font-size: 11px;
    }

    .status {
      text-transform: capitalize;
    }

    .pos, .status.won {
      color: var(--pos);
    }

    .neg, .status.lost {
      color: var(--neg);
    }

    .empty {
      color: var(--muted);
      text-align: center;
    }

    @media print {
      body {
        margin: 12mm;
      }
    }
  </style>
</head>
<body>
  <h1>Betting Report</h1>
  <div class="meta">{{USER}} &middot; {{PERIOD}} &middot; Generated {{GENERATED}}</div>

  <div class="cards">
    <div class="card"><div class="label">Total bets</div><div class="value">{{TOTAL_BETS}}</div></div>
    <div class="card"><div class="label">Win rate</div><div class="value">{{WIN_RATE}}</div></div>
    <div class="card"><div class="label">ROI</div><div class="value {{ROI_TONE}}">{{ROI}}</div></div>
    <div class="card"><div class="label">Total result</div><div class="value {{RESULT_TONE}}">{{RESULT}}</div></div>
  </div>
  <p class="meta">Total staked: {{STAKE}}</p>

  <h2>Outcomes</h2>
  <table>
    <thead><tr><th>Status</th><th>Bets</th><th>Share</th></tr></thead>
    <tbody>
{{OUTCOMES}}
    </tbody>
  </table>

  <h2>Recent bets</h2>
  <table>
    <thead><tr><th>Date</th><th>Match</th><th>Odds</th><th>Stake</th><th>Status</th><th>P/L</th></tr></thead>
    <tbody>
{{RECENT}}
    </tbody>
  </table>

  <script>
    window.addEventListener('load', () => window.print());
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bets::fixtures::bet;
    use crate::stats::summarize;

    #[test]
    fn report_carries_summary_and_recent_bets() {
        let mut won = bet("2025-05-01", BetStatus::Won, 100.0, 2.5);
        won.game = "Arsenal <Women> - Chelsea".to_string();
        let lost = bet("2025-05-02", BetStatus::Lost, 50.0, 1.8);
        let bets = vec![&won, &lost];
        let summary = summarize(&bets);

        let html = render_report(
            "Ola",
            "All time",
            NaiveDate::from_ymd_opt(2025, 5, 3).unwrap(),
            &summary,
            &bets,
            Currency::Nok,
        );

        assert!(html.contains("Generated May 3, 2025"));
        assert!(html.contains("<div class=\"value\">2</div>"));
        assert!(html.contains("50.0%"));
        assert!(html.contains("+100.00 kr"));
        assert!(html.contains("Arsenal &lt;Women&gt; - Chelsea"));
        assert!(!html.contains("{{"));

        let newest = html.find("2025-05-02").unwrap();
        let oldest = html.find("2025-05-01").unwrap();
        assert!(newest < oldest);
    }

    #[test]
    fn recent_rows_are_capped() {
        let bets: Vec<Bet> = (1..=20)
            .map(|day| bet(&format!("2025-06-{day:02}"), BetStatus::Won, 10.0, 2.0))
            .collect();
        let refs: Vec<&Bet> = bets.iter().collect();
        let rows = recent_rows(&refs, Currency::Usd);
        assert_eq!(rows.lines().count(), RECENT_ROWS);
        assert!(rows.contains("2025-06-20"));
        assert!(!rows.contains("2025-06-05"));
    }

    #[test]
    fn empty_period_renders_placeholder_row() {
        let html = render_report(
            "Ola",
            "Last 7 days",
            NaiveDate::from_ymd_opt(2025, 5, 3).unwrap(),
            &StatsSummary::default(),
            &[],
            Currency::Usd,
        );
        assert!(html.contains("No bets in this period"));
        assert!(html.contains("0.0%"));
    }
}
