use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Canonical labels offered by the add-medicine form.
pub const FREQUENCY_OPTIONS: &[&str] = &[
    "Once daily",
    "Twice daily",
    "Three times daily",
    "Four times daily",
    "Every 6 hours",
    "Every 8 hours",
    "Every 12 hours",
    "Every 24 hours",
    "As needed",
    "Weekly",
    "Monthly",
];

/// Upper bound on an `"N times daily"` count.
pub const MAX_DAILY_DOSES: u32 = 24;

static TIMES_DAILY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*times?\s+daily").unwrap());

/// The `N` of an `"N times daily"` label. Digits too long to parse
/// saturate.
fn requested_daily(label: &str) -> Option<u64> {
    TIMES_DAILY
        .captures(label)
        .map(|caps| caps[1].parse::<u64>().unwrap_or(u64::MAX))
}

/// True when the label asks for more than [`MAX_DAILY_DOSES`] doses a day.
pub fn exceeds_daily_limit(label: &str) -> bool {
    requested_daily(label).is_some_and(|n| n > u64::from(MAX_DAILY_DOSES))
}

/// Parsed frequency label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Frequency {
    /// `n` doses per day.
    Daily(u32),
    /// One dose every `n` hours.
    EveryNHours(u32),
    AsNeeded,
    Weekly,
    Monthly,
    /// Anything the lookup does not recognise. Counts as once daily.
    Custom(String),
}

/// Substring lookup, checked in order after the numeric pattern.
static PHRASES: &[(&str, Frequency)] = &[
    ("once", Frequency::Daily(1)),
    ("twice", Frequency::Daily(2)),
    ("three times", Frequency::Daily(3)),
    ("four times", Frequency::Daily(4)),
    ("every 6 hours", Frequency::EveryNHours(6)),
    ("every 8 hours", Frequency::EveryNHours(8)),
    ("every 12 hours", Frequency::EveryNHours(12)),
    ("every 24 hours", Frequency::EveryNHours(24)),
    ("as needed", Frequency::AsNeeded),
    ("weekly", Frequency::Weekly),
    ("monthly", Frequency::Monthly),
];

impl Frequency {
    /// Parse a free-text label. Never fails: unknown text becomes `Custom`,
    /// and so does a count above [`MAX_DAILY_DOSES`].
    pub fn parse(label: &str) -> Self {
        if let Some(n) = requested_daily(label) {
            if let Ok(n) = u32::try_from(n) {
                if n <= MAX_DAILY_DOSES {
                    return Frequency::Daily(n);
                }
            }
        }

        let lower = label.to_lowercase();
        PHRASES
            .iter()
            .find(|(phrase, _)| lower.contains(phrase))
            .map(|(_, freq)| freq.clone())
            .unwrap_or_else(|| Frequency::Custom(label.trim().to_string()))
    }

    /// Doses per day. Always at least 1.
    pub fn dose_count(&self) -> u32 {
        match self {
            Frequency::Daily(n) => (*n).clamp(1, MAX_DAILY_DOSES),
            Frequency::EveryNHours(6) => 4,
            Frequency::EveryNHours(8) => 3,
            Frequency::EveryNHours(12) => 2,
            Frequency::EveryNHours(_) => 1,
            Frequency::AsNeeded | Frequency::Weekly | Frequency::Monthly => 1,
            Frequency::Custom(_) => 1,
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily(1) => write!(f, "Once daily"),
            Frequency::Daily(2) => write!(f, "Twice daily"),
            Frequency::Daily(3) => write!(f, "Three times daily"),
            Frequency::Daily(4) => write!(f, "Four times daily"),
            Frequency::Daily(n) => write!(f, "{n} times daily"),
            Frequency::EveryNHours(n) => write!(f, "Every {n} hours"),
            Frequency::AsNeeded => write!(f, "As needed"),
            Frequency::Weekly => write!(f, "Weekly"),
            Frequency::Monthly => write!(f, "Monthly"),
            Frequency::Custom(s) => write!(f, "{s}"),
        }
    }
}

/// How many doses per day `label` asks for. Unrecognised labels resolve
/// to 1 (once daily) rather than an error.
pub fn resolve_dose_count(label: &str) -> u32 {
    Frequency::parse(label).dose_count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_labels() {
        assert_eq!(resolve_dose_count("Once daily"), 1);
        assert_eq!(resolve_dose_count("Twice daily"), 2);
        assert_eq!(resolve_dose_count("Three times daily"), 3);
        assert_eq!(resolve_dose_count("Four times daily"), 4);
        assert_eq!(resolve_dose_count("Every 6 hours"), 4);
        assert_eq!(resolve_dose_count("Every 8 hours"), 3);
        assert_eq!(resolve_dose_count("Every 12 hours"), 2);
        assert_eq!(resolve_dose_count("Every 24 hours"), 1);
        assert_eq!(resolve_dose_count("As needed"), 1);
        assert_eq!(resolve_dose_count("Weekly"), 1);
        assert_eq!(resolve_dose_count("Monthly"), 1);
    }

    #[test]
    fn numeric_pattern_wins() {
        assert_eq!(resolve_dose_count("3 times daily"), 3);
        assert_eq!(resolve_dose_count("5 TIMES DAILY"), 5);
        assert_eq!(resolve_dose_count("take 6 times daily with food"), 6);
    }

    #[test]
    fn zero_times_daily_stays_positive() {
        assert_eq!(resolve_dose_count("0 times daily"), 1);
    }

    #[test]
    fn oversized_daily_count_is_bounded() {
        assert_eq!(resolve_dose_count("24 times daily"), 24);
        assert_eq!(resolve_dose_count("25 times daily"), 1);
        assert_eq!(resolve_dose_count("4000000000 times daily"), 1);
        assert_eq!(resolve_dose_count("99999999999999999999999 times daily"), 1);
        assert_eq!(Frequency::Daily(u32::MAX).dose_count(), MAX_DAILY_DOSES);
        assert!(exceeds_daily_limit("4000000000 times daily"));
        assert!(!exceeds_daily_limit("24 times daily"));
        assert!(!exceeds_daily_limit("Twice daily"));
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        assert_eq!(resolve_dose_count("TWICE a day"), 2);
        assert_eq!(resolve_dose_count("take every 8 hours after meals"), 3);
    }

    #[test]
    fn table_order_decides_overlaps() {
        // "twice" is checked before "weekly"
        assert_eq!(resolve_dose_count("Twice weekly"), 2);
    }

    #[test]
    fn unknown_label_defaults_to_once() {
        assert_eq!(resolve_dose_count("gibberish"), 1);
        assert_eq!(resolve_dose_count(""), 1);
        assert_eq!(resolve_dose_count("every 4 hours"), 1);
        assert_eq!(
            Frequency::parse("gibberish"),
            Frequency::Custom("gibberish".into())
        );
    }

    #[test]
    fn parse_yields_tagged_variants() {
        assert_eq!(Frequency::parse("Every 12 hours"), Frequency::EveryNHours(12));
        assert_eq!(Frequency::parse("as needed for pain"), Frequency::AsNeeded);
        assert_eq!(Frequency::parse("7 times daily"), Frequency::Daily(7));
    }

    #[test]
    fn every_option_resolves_through_display() {
        for label in FREQUENCY_OPTIONS {
            let freq = Frequency::parse(label);
            assert_eq!(&freq.to_string(), label);
        }
    }
}
