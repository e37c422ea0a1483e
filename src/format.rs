//! Display formatting for money, minutes and forecast timestamps.

/// `$1,234,567` style, rounded to whole units. Negative values keep the sign in front.
pub fn money(amount: f64) -> String {
    if !amount.is_finite() {
        return "$-".to_string();
    }
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{}${}", sign, group_thousands(rounded.abs() as u64))
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

pub fn minutes_label(mtb: Option<i64>) -> String {
    match mtb {
        Some(m) => format!("{} min to breach", m),
        None => "No breach".to_string(),
    }
}

/// `HH:MM` from an ISO-8601 timestamp (characters 11..16). Short or
/// non-ASCII inputs come back unchanged.
pub fn hhmm(ts: &str) -> &str {
    ts.get(11..16).unwrap_or(ts)
}

pub fn pct(value: f64) -> String {
    format!("{:.1}%", value)
}
