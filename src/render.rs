//! View updates. The core hands finished results to a `DashboardSink`; the
//! terminal implementation turns them into text.

use std::io::Write;

use serde_json::Value;

use crate::assess::Assessment;
use crate::error::MonitorError;
use crate::format::{hhmm, minutes_label, money, pct};
use crate::model::{Driver, RecommendationResult, RiskState};
use crate::portfolio::{PortfolioCell, PortfolioSnapshot};

pub trait DashboardSink: Send + Sync {
    fn render_assessment(&self, assessment: &Assessment);
    fn render_portfolio(&self, snapshot: &PortfolioSnapshot);
    fn render_decision_response(&self, response: &Value);
    fn render_error(&self, err: &MonitorError);
}

pub fn status_line(assessment: &Assessment) -> String {
    let risk = &assessment.risk;
    format!(
        "[{}] Balance {} | Buffer left {} | {}",
        assessment.severity.as_str(),
        money(risk.current_balance),
        money(risk.buffer_remaining),
        minutes_label(risk.minutes_to_breach)
    )
}

/// One line per forecast point with the buffer line alongside. An empty
/// forecast renders as an empty chart.
pub fn chart_lines(display: &RiskState) -> Vec<String> {
    display
        .forecast
        .iter()
        .map(|pt| {
            let marker = if pt.balance < display.early_warning_buffer { "!" } else { " " };
            format!(
                "{} {} {:>16}  buffer {}",
                hhmm(&pt.t),
                marker,
                money(pt.balance),
                money(display.early_warning_buffer)
            )
        })
        .collect()
}

pub fn driver_lines(drivers: &[Driver]) -> Vec<String> {
    drivers
        .iter()
        .map(|d| format!("{} {} {}", d.direction.as_str(), money(d.amount), d.rail))
        .collect()
}

/// Numbered in engine order; the number is what `select` refers to.
pub fn recommendation_lines(rec: &RecommendationResult) -> Vec<String> {
    if !rec.requires_action() {
        return vec!["No action required".to_string(), rec.explanation.clone()];
    }
    rec.ranked_actions
        .iter()
        .enumerate()
        .map(|(i, a)| match a.score() {
            Some(score) => format!("{}. {} - {} (score {:.2})", i + 1, a.label(), a.rationale(), score),
            None => format!("{}. {} - {}", i + 1, a.label(), a.rationale()),
        })
        .collect()
}

pub fn portfolio_lines(snapshot: &PortfolioSnapshot) -> Vec<String> {
    let r = &snapshot.rollup;
    let mut lines = vec![format!(
        "Portfolio {} | worst {} | warn {} | breach {} | offline {}",
        r.status.as_str(),
        minutes_label(r.worst_minutes_to_breach),
        r.warn_count,
        r.breach_count,
        r.offline_count
    )];
    for cell in &snapshot.cells {
        lines.push(match cell {
            PortfolioCell::Online(c) => format!(
                "  {}/{} {:<13} bal {} left {} {}",
                c.entity,
                c.currency,
                c.severity.as_str(),
                money(c.balance),
                money(c.remaining),
                minutes_label(c.mtb)
            ),
            PortfolioCell::Offline { entity, currency, reason } => {
                format!("  {}/{} OFFLINE ({})", entity, currency, reason)
            }
        });
    }
    lines
}

/// Writes to stdout.
pub struct TextDashboard;

impl TextDashboard {
    fn emit(lines: &[String]) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        for line in lines {
            let _ = writeln!(out, "{}", line);
        }
        let _ = out.flush();
    }
}

impl DashboardSink for TextDashboard {
    fn render_assessment(&self, assessment: &Assessment) {
        let mut lines = vec![
            format!(
                "== {} {}/{} ==",
                assessment.scenario_id, assessment.entity_id, assessment.currency
            ),
            status_line(assessment),
        ];
        if !assessment.what_if.is_neutral() {
            lines.push(format!(
                "what-if: shock {} delay {:.0} min (chart only)",
                pct(assessment.what_if.shock_pct),
                assessment.what_if.delay_minutes
            ));
        }
        lines.extend(chart_lines(&assessment.display));
        lines.push("drivers:".to_string());
        lines.extend(driver_lines(&assessment.drivers));
        if let Some(rec) = &assessment.recommendation {
            lines.push("recommendations:".to_string());
            lines.extend(recommendation_lines(rec));
        }
        Self::emit(&lines);
    }

    fn render_portfolio(&self, snapshot: &PortfolioSnapshot) {
        Self::emit(&portfolio_lines(snapshot));
    }

    fn render_decision_response(&self, response: &Value) {
        let body = serde_json::to_string_pretty(response).unwrap_or_else(|_| response.to_string());
        Self::emit(&[format!("engine response:\n{}", body)]);
    }

    fn render_error(&self, err: &MonitorError) {
        Self::emit(&[format!("error: {}", err)]);
    }
}
