use chrono::NaiveTime;
use serde::Serialize;

/// One dose of the day. `time_slot_index` is `None` for single-dose
/// schedules so they keep the plain single-time shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub time_slot_index: Option<u32>,
    pub time: NaiveTime,
}

/// Result of expanding selected times against a dose count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleExpansion {
    Complete(Vec<ScheduleEntry>),
    /// Some slots still have no time. Nothing is filled in on the
    /// caller's behalf.
    Partial { scheduled: u32, required: u32 },
}

impl ScheduleExpansion {
    pub fn is_complete(&self) -> bool {
        matches!(self, ScheduleExpansion::Complete(_))
    }

    /// `"n/N scheduled"`.
    pub fn progress_label(&self) -> String {
        match self {
            ScheduleExpansion::Complete(entries) => {
                format!("{0}/{0} scheduled", entries.len())
            }
            ScheduleExpansion::Partial { scheduled, required } => {
                format!("{scheduled}/{required} scheduled")
            }
        }
    }

    pub fn entries(&self) -> &[ScheduleEntry] {
        match self {
            ScheduleExpansion::Complete(entries) => entries,
            ScheduleExpansion::Partial { .. } => &[],
        }
    }
}

/// Expand `selected_times` (one optional time per slot) into schedule
/// entries. Only slots `0..dose_count` are considered.
pub fn expand_schedule(dose_count: u32, selected_times: &[Option<NaiveTime>]) -> ScheduleExpansion {
    let required = dose_count.max(1);
    let slots = selected_times.iter().take(required as usize);

    let scheduled = slots.clone().filter(|t| t.is_some()).count() as u32;
    if scheduled < required {
        return ScheduleExpansion::Partial { scheduled, required };
    }

    let entries = slots
        .flatten()
        .enumerate()
        .map(|(i, time)| ScheduleEntry {
            time_slot_index: (required > 1).then_some(i as u32),
            time: *time,
        })
        .collect();

    ScheduleExpansion::Complete(entries)
}

/// `h:mm AM/PM`, 12-hour clock without a leading zero.
pub fn format_time(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

/// Accepts `h:mm AM/PM` (any case) or 24-hour `HH:MM`.
pub fn parse_time(text: &str) -> Option<NaiveTime> {
    let trimmed = text.trim();
    NaiveTime::parse_from_str(&trimmed.to_uppercase(), "%I:%M %p")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .ok()
}

/// Join the set slots as `"8:00 AM, 2:00 PM"`. Unset slots are skipped.
pub fn format_schedule_display(times: &[Option<NaiveTime>]) -> String {
    times
        .iter()
        .flatten()
        .map(|t| format_time(*t))
        .collect::<Vec<_>>()
        .join(", ")
}
