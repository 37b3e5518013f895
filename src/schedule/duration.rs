use std::sync::LazyLock;

use chrono::{Days, Months, NaiveDate};
use regex::Regex;

static DURATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+)\s*-?\s*([a-z]+)?").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationUnit {
    Days,
    Weeks,
    Months,
    Years,
}

impl DurationUnit {
    fn from_word(word: Option<&str>) -> Self {
        let word = word.map(str::to_lowercase).unwrap_or_default();
        if word.starts_with("week") || word.starts_with("wk") {
            DurationUnit::Weeks
        } else if word.starts_with("month") || word.starts_with("mo") {
            DurationUnit::Months
        } else if word.starts_with("year") || word.starts_with("yr") {
            DurationUnit::Years
        } else {
            DurationUnit::Days
        }
    }
}

/// Amount and unit of a free-text duration such as `"3 days"`, `"2 weeks"`
/// or `"7"`. `None` when the text holds no integer.
pub fn parse_duration(text: &str) -> Option<(u32, DurationUnit)> {
    let caps = DURATION.captures(text)?;
    let amount = caps[1].parse::<u32>().ok()?;
    let unit = DurationUnit::from_word(caps.get(2).map(|m| m.as_str()));
    Some((amount, unit))
}

/// Last day of a course that starts on `start` and lasts `duration_text`.
///
/// The window `[start, end]` counts the start unit, so `end` is
/// `start + (amount - 1)` units: `"3 days"` from the 1st ends on the 3rd.
/// Weeks step in multiples of 7 days; months and years use calendar
/// month arithmetic. Text without an integer, a zero amount or an
/// out-of-range result leaves `start` unchanged.
pub fn derive_end_date(start: NaiveDate, duration_text: &str) -> NaiveDate {
    let Some((amount, unit)) = parse_duration(duration_text) else {
        return start;
    };
    if amount == 0 {
        return start;
    }
    let steps = amount - 1;

    let end = match unit {
        DurationUnit::Days => start.checked_add_days(Days::new(u64::from(steps))),
        DurationUnit::Weeks => start.checked_add_days(Days::new(u64::from(steps) * 7)),
        DurationUnit::Months => start.checked_add_months(Months::new(steps)),
        DurationUnit::Years => steps
            .checked_mul(12)
            .and_then(|months| start.checked_add_months(Months::new(months))),
    };

    end.unwrap_or(start)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn days_are_inclusive_of_start() {
        assert_eq!(derive_end_date(d("2024-01-01"), "3 days"), d("2024-01-03"));
        assert_eq!(derive_end_date(d("2024-01-01"), "1 day"), d("2024-01-01"));
    }

    #[test]
    fn bare_number_means_days() {
        assert_eq!(derive_end_date(d("2024-01-01"), "7"), d("2024-01-07"));
    }

    #[test]
    fn no_integer_leaves_start_unchanged() {
        assert_eq!(derive_end_date(d("2024-01-01"), ""), d("2024-01-01"));
        assert_eq!(derive_end_date(d("2024-01-01"), "ongoing"), d("2024-01-01"));
    }

    #[test]
    fn zero_amount_leaves_start_unchanged() {
        assert_eq!(derive_end_date(d("2024-01-01"), "0 days"), d("2024-01-01"));
    }

    #[test]
    fn weeks_step_by_seven_days() {
        assert_eq!(derive_end_date(d("2024-01-01"), "2 weeks"), d("2024-01-08"));
        assert_eq!(derive_end_date(d("2024-01-01"), "1 week"), d("2024-01-01"));
    }

    #[test]
    fn months_use_calendar_arithmetic() {
        assert_eq!(derive_end_date(d("2024-01-31"), "2 months"), d("2024-02-29"));
        assert_eq!(derive_end_date(d("2024-03-15"), "3 Months"), d("2024-05-15"));
    }

    #[test]
    fn years_map_to_months() {
        assert_eq!(derive_end_date(d("2024-02-29"), "2 years"), d("2025-02-28"));
    }

    #[test]
    fn first_integer_wins() {
        assert_eq!(
            parse_duration("for 10 days then 5 more"),
            Some((10, DurationUnit::Days))
        );
        assert_eq!(parse_duration("6-week course"), Some((6, DurationUnit::Weeks)));
    }

    #[test]
    fn huge_amount_does_not_panic() {
        assert_eq!(derive_end_date(d("2024-01-01"), "99999999999 days"), d("2024-01-01"));
        assert_eq!(derive_end_date(d("2024-01-01"), "400000000 years"), d("2024-01-01"));
    }
}
