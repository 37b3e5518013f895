//! Adherence Statistics Engine.
//!
//! Aggregates the `consumed_dates` / `missed_dates` of a medicine
//! collection into dashboard figures: totals, compliance rate and
//! consecutive-day streaks. Pure functions; "today" is always passed in.

use std::collections::BTreeSet;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::models::enums::LogStatus;
use crate::models::Medicine;
use crate::schedule::parse_time;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Streaks {
    pub current_streak: u32,
    pub longest_streak: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdherenceStats {
    pub total_medicines: usize,
    pub total_taken: usize,
    pub total_missed: usize,
    pub compliance_rate: f64,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_days_tracked: usize,
}

/// Percentage of logged events that were taken, rounded to 2 decimals.
/// 0 when nothing has been logged.
pub fn compliance_rate(taken: usize, missed: usize) -> f64 {
    let total = taken + missed;
    if total == 0 {
        return 0.0;
    }
    let rate = taken as f64 / total as f64 * 100.0;
    (rate * 100.0).round() / 100.0
}

pub fn compute_stats(records: &[Medicine], today: NaiveDate) -> AdherenceStats {
    let total_taken = records.iter().map(|m| m.consumed_dates.len()).sum();
    let total_missed = records.iter().map(|m| m.missed_dates.len()).sum();

    let tracked: BTreeSet<NaiveDate> = records
        .iter()
        .flat_map(|m| m.consumed_dates.iter().chain(m.missed_dates.iter()))
        .copied()
        .collect();

    let streaks = compute_streaks(records, today);

    AdherenceStats {
        total_medicines: records.len(),
        total_taken,
        total_missed,
        compliance_rate: compliance_rate(total_taken, total_missed),
        current_streak: streaks.current_streak,
        longest_streak: streaks.longest_streak,
        total_days_tracked: tracked.len(),
    }
}

/// Streaks over the distinct days on which anything was taken. Missed
/// days break a streak only by being absent from that set.
pub fn compute_streaks(records: &[Medicine], today: NaiveDate) -> Streaks {
    let taken_days: BTreeSet<NaiveDate> = records
        .iter()
        .flat_map(|m| m.consumed_dates.iter().copied())
        .collect();
    streaks_from_dates(&taken_days, today)
}

pub fn streaks_from_dates(days: &BTreeSet<NaiveDate>, today: NaiveDate) -> Streaks {
    let sorted: Vec<NaiveDate> = days.iter().copied().collect();
    let Some(&latest) = sorted.last() else {
        return Streaks::default();
    };

    let mut longest = 1u32;
    let mut running = 1u32;
    for pair in sorted.windows(2) {
        if (pair[1] - pair[0]).num_days() == 1 {
            running += 1;
        } else {
            running = 1;
        }
        longest = longest.max(running);
    }

    let current = if (today - latest).num_days() <= 1 {
        1 + sorted
            .windows(2)
            .rev()
            .take_while(|pair| (pair[1] - pair[0]).num_days() == 1)
            .count() as u32
    } else {
        0
    };

    Streaks {
        current_streak: current,
        longest_streak: longest,
    }
}

/// One reminder on the "today" dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseStatus {
    pub medicine_id: String,
    pub medicine_name: String,
    pub dosage: String,
    pub time: String,
    pub time_slot_index: Option<u32>,
    pub status: LogStatus,
}

/// Reminders due on `date`: every medicine active that day, with its
/// taken/missed mark or `Pending`. Ordered by reminder time; records
/// without a parseable time come last.
pub fn doses_for_day(records: &[Medicine], date: NaiveDate) -> Vec<DoseStatus> {
    let mut doses: Vec<(Option<NaiveTime>, DoseStatus)> = records
        .iter()
        .filter(|m| m.is_active_on(date))
        .map(|m| {
            let status = if m.consumed_dates.contains(&date) {
                LogStatus::Taken
            } else if m.missed_dates.contains(&date) {
                LogStatus::Missed
            } else {
                LogStatus::Pending
            };
            let first_time = m.time.split(',').next().and_then(parse_time);
            (
                first_time,
                DoseStatus {
                    medicine_id: m.id.clone(),
                    medicine_name: m.medicine_name.clone(),
                    dosage: m.dosage.clone(),
                    time: m.time.clone(),
                    time_slot_index: m.time_slot_index,
                    status,
                },
            )
        })
        .collect();

    doses.sort_by(|(a, _), (b, _)| match (a, b) {
        (Some(a), Some(b)) => a.cmp(b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    doses.into_iter().map(|(_, dose)| dose).collect()
}
