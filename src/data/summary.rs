//! Summary view-model derived from the latest update.

use serde::Serialize;

use super::update::PortfolioUpdate;

/// Semantic colour of a change figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Positive,
    Negative,
}

impl Tone {
    /// Zero counts as positive.
    pub fn for_change(percent: f64) -> Self {
        if percent >= 0.0 {
            Tone::Positive
        } else {
            Tone::Negative
        }
    }
}

/// Values shown in the summary cards.
///
/// The change percent is forwarded from the server; it covers a window the
/// client does not retain and cannot be derived from the series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummarySnapshot {
    pub latest_value: f64,
    pub change_percent: Option<f64>,
    pub last_update_timestamp: String,
}

impl SummarySnapshot {
    pub fn from_update(update: &PortfolioUpdate) -> Self {
        Self {
            latest_value: update.total_value_usd(),
            change_percent: update.change_percent(),
            last_update_timestamp: update.timestamp().to_string(),
        }
    }

    /// "12,345.67"
    pub fn value_text(&self) -> String {
        format_currency(self.latest_value)
    }

    /// "+5.43%" or "-3.21%", if a change was sent.
    pub fn change_text(&self) -> Option<String> {
        self.change_percent.map(format_change)
    }

    pub fn change_tone(&self) -> Option<Tone> {
        self.change_percent.map(Tone::for_change)
    }
}

/// Format a monetary amount with thousands separators and two decimals.
pub fn format_currency(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, c) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let negative = value < 0.0 && fixed != "0.00";
    format!("{}{}.{}", if negative { "-" } else { "" }, grouped, frac_part)
}

/// Format a percentage with an explicit sign and two decimals.
pub fn format_change(percent: f64) -> String {
    match Tone::for_change(percent) {
        Tone::Positive => format!("+{:.2}%", percent.abs()),
        Tone::Negative => format!("{:.2}%", percent),
    }
}
