//! Add / edit medicine flow.
//!
//! Turns a validated form submission into one persisted record per dose
//! of the day, and applies edits with an audit of what changed.

use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use crate::models::{Medicine, MedicineInput};
use crate::schedule::{
    derive_end_date, expand_schedule, format_time, parse_duration, resolve_dose_count,
    ScheduleExpansion,
};
use crate::validation::{validate_medicine_fields, validate_medicine_input, FieldError};

/// Start date defaults to `today`; end date is derived from the duration
/// text when the form left it empty and the duration holds an amount.
pub fn resolve_window(input: &MedicineInput, today: NaiveDate) -> (NaiveDate, Option<NaiveDate>) {
    let start = input.start_date.unwrap_or(today);
    let end = input.end_date.or_else(|| {
        parse_duration(&input.duration)
            .filter(|(amount, _)| *amount > 0)
            .map(|_| derive_end_date(start, &input.duration))
    });
    (start, end)
}

/// `input` with its date window filled in, so validation sees the dates
/// that will actually be stored.
pub fn with_resolved_window(input: &MedicineInput, fallback_start: NaiveDate) -> MedicineInput {
    let (start, end) = resolve_window(input, fallback_start);
    MedicineInput {
        start_date: Some(start),
        end_date: end,
        ..input.clone()
    }
}

/// Single record from form fields, keeping `input.time` as given.
/// Used by the REST backend where times arrive pre-formatted.
pub fn medicine_from_input(input: &MedicineInput, now: DateTime<Utc>, today: NaiveDate) -> Medicine {
    let (start, end) = resolve_window(input, today);
    Medicine {
        id: Uuid::new_v4().to_string(),
        parent_medicine_id: None,
        medicine_name: input.medicine_name.trim().to_string(),
        dosage: input.dosage.trim().to_string(),
        medicine_type: input.medicine_type.trim().to_string(),
        frequency: input.frequency.trim().to_string(),
        duration: input.duration.trim().to_string(),
        notes: input.notes.trim().to_string(),
        start_date: Some(start),
        end_date: end,
        time: input.time.trim().to_string(),
        consumed_dates: BTreeSet::new(),
        missed_dates: BTreeSet::new(),
        created_at: now,
        last_edited_date: None,
        last_edited_changes: None,
        time_slot_index: None,
    }
}

/// Validate a submission and mint its records.
///
/// A single-dose frequency yields one record with a plain `time`. A
/// multi-dose frequency yields one record per slot, each with its own id
/// and `time_slot_index`, all sharing a fresh `parent_medicine_id`.
pub fn build_medicine_records(
    input: &MedicineInput,
    times: &[Option<NaiveTime>],
    now: DateTime<Utc>,
    today: NaiveDate,
) -> Result<Vec<Medicine>, Vec<FieldError>> {
    let input = &with_resolved_window(input, today);
    validate_medicine_input(input, times)?;

    let dose_count = resolve_dose_count(&input.frequency);
    let entries = match expand_schedule(dose_count, times) {
        ScheduleExpansion::Complete(entries) => entries,
        partial @ ScheduleExpansion::Partial { .. } => {
            return Err(vec![FieldError::new("time", partial.progress_label())]);
        }
    };

    let base = medicine_from_input(input, now, today);
    if dose_count == 1 {
        let time = entries.first().map(|e| format_time(e.time)).unwrap_or_default();
        return Ok(vec![Medicine { time, ..base }]);
    }

    let parent_id = Uuid::new_v4().to_string();
    let records = entries
        .iter()
        .map(|entry| Medicine {
            id: Uuid::new_v4().to_string(),
            parent_medicine_id: Some(parent_id.clone()),
            time: format_time(entry.time),
            time_slot_index: entry.time_slot_index,
            ..base.clone()
        })
        .collect();

    Ok(records)
}

fn show_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "none".into())
}

/// Overwrite the editable fields of `record` with `input`.
///
/// Returns `true` when something changed, in which case
/// `last_edited_date` is set to `now` and `last_edited_changes`
/// lists each change as `field: old → new`. Adherence dates, ids and
/// slot assignment are untouched.
pub fn apply_edit(record: &mut Medicine, input: &MedicineInput, now: DateTime<Utc>) -> bool {
    let mut changes = Vec::new();

    let text_fields: [(&str, &mut String, &str); 7] = [
        ("medicineName", &mut record.medicine_name, input.medicine_name.trim()),
        ("dosage", &mut record.dosage, input.dosage.trim()),
        ("medicineType", &mut record.medicine_type, input.medicine_type.trim()),
        ("frequency", &mut record.frequency, input.frequency.trim()),
        ("duration", &mut record.duration, input.duration.trim()),
        ("notes", &mut record.notes, input.notes.trim()),
        ("time", &mut record.time, input.time.trim()),
    ];
    for (field, current, new) in text_fields {
        if current.as_str() != new {
            changes.push(format!("{field}: {current} → {new}"));
            *current = new.to_string();
        }
    }

    if input.start_date.is_some() && record.start_date != input.start_date {
        changes.push(format!(
            "startDate: {} → {}",
            show_date(record.start_date),
            show_date(input.start_date)
        ));
        record.start_date = input.start_date;
    }
    if record.end_date != input.end_date {
        changes.push(format!(
            "endDate: {} → {}",
            show_date(record.end_date),
            show_date(input.end_date)
        ));
        record.end_date = input.end_date;
    }

    if changes.is_empty() {
        return false;
    }
    record.last_edited_date = Some(now);
    record.last_edited_changes = Some(changes.join("; "));
    true
}

/// Validate `input` against `record` and apply it. A missing start date
/// keeps the stored one.
pub fn edit_medicine(
    record: &mut Medicine,
    input: &MedicineInput,
    now: DateTime<Utc>,
) -> Result<bool, Vec<FieldError>> {
    let fallback_start = record.start_date.unwrap_or_else(|| now.date_naive());
    let input = with_resolved_window(input, fallback_start);
    let errors = validate_medicine_fields(&input);
    if !errors.is_empty() {
        return Err(errors);
    }
    Ok(apply_edit(record, &input, now))
}

/// Editable fields of an existing record, for pre-filling the edit form.
pub fn input_from_medicine(record: &Medicine) -> MedicineInput {
    MedicineInput {
        medicine_name: record.medicine_name.clone(),
        dosage: record.dosage.clone(),
        medicine_type: record.medicine_type.clone(),
        frequency: record.frequency.clone(),
        duration: record.duration.clone(),
        notes: record.notes.clone(),
        start_date: record.start_date,
        end_date: record.end_date,
        time: record.time.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn t(h: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, 0, 0)
    }

    fn input(frequency: &str) -> MedicineInput {
        MedicineInput {
            medicine_name: " Amoxicillin ".into(),
            dosage: "250mg".into(),
            medicine_type: "Capsule".into(),
            frequency: frequency.into(),
            duration: "3 days".into(),
            start_date: Some(d("2024-01-01")),
            ..Default::default()
        }
    }

    #[test]
    fn single_dose_builds_one_plain_record() {
        let records =
            build_medicine_records(&input("Once daily"), &[t(8)], Utc::now(), d("2024-01-01"))
                .unwrap();
        assert_eq!(records.len(), 1);
        let med = &records[0];
        assert_eq!(med.medicine_name, "Amoxicillin");
        assert_eq!(med.time, "8:00 AM");
        assert_eq!(med.time_slot_index, None);
        assert_eq!(med.parent_medicine_id, None);
        assert_eq!(med.end_date, Some(d("2024-01-03")));
    }

    #[test]
    fn multi_dose_builds_sibling_records() {
        let records = build_medicine_records(
            &input("Three times daily"),
            &[t(8), t(14), t(20)],
            Utc::now(),
            d("2024-01-01"),
        )
        .unwrap();
        assert_eq!(records.len(), 3);

        let parents: HashSet<_> = records.iter().map(|m| m.parent_medicine_id.clone()).collect();
        assert_eq!(parents.len(), 1);
        assert!(records[0].parent_medicine_id.is_some());

        let ids: HashSet<_> = records.iter().map(|m| m.id.clone()).collect();
        assert_eq!(ids.len(), 3);

        let slots: HashSet<_> = records.iter().map(|m| m.time_slot_index).collect();
        assert_eq!(slots.len() as u32, resolve_dose_count("Three times daily"));
        assert_eq!(records[2].time, "8:00 PM");
    }

    #[test]
    fn partial_times_are_rejected() {
        let errors = build_medicine_records(
            &input("Three times daily"),
            &[t(8), t(14), None],
            Utc::now(),
            d("2024-01-01"),
        )
        .unwrap_err();
        assert!(errors.iter().any(|e| e.message.contains("2/3 scheduled")));
    }

    #[test]
    fn start_defaults_to_today_and_end_stays_open_without_amount() {
        let mut form = input("Once daily");
        form.start_date = None;
        form.duration = "ongoing".into();
        let med = medicine_from_input(&form, Utc::now(), d("2024-05-05"));
        assert_eq!(med.start_date, Some(d("2024-05-05")));
        assert_eq!(med.end_date, None);
    }

    #[test]
    fn explicit_end_date_wins_over_duration() {
        let mut form = input("Once daily");
        form.end_date = Some(d("2024-02-01"));
        let med = medicine_from_input(&form, Utc::now(), d("2024-01-01"));
        assert_eq!(med.end_date, Some(d("2024-02-01")));
    }

    #[test]
    fn end_before_defaulted_start_is_rejected() {
        let mut form = input("Once daily");
        form.start_date = None;
        form.end_date = Some(d("2020-01-01"));
        let errors =
            build_medicine_records(&form, &[t(8)], Utc::now(), d("2024-05-05")).unwrap_err();
        assert_eq!(errors, vec![FieldError::new("endDate", "End date cannot be before start date")]);
    }

    #[test]
    fn edit_checks_end_against_stored_start() {
        let mut med = medicine_from_input(&input("Once daily"), Utc::now(), d("2024-01-01"));
        let mut form = input_from_medicine(&med);
        form.start_date = None;
        form.end_date = Some(d("2023-12-01"));

        let errors = edit_medicine(&mut med, &form, Utc::now()).unwrap_err();
        assert_eq!(errors[0].field, "endDate");
        assert_eq!(med.end_date, Some(d("2024-01-03")));

        form.end_date = Some(d("2024-01-10"));
        assert!(edit_medicine(&mut med, &form, Utc::now()).unwrap());
        assert_eq!(med.start_date, Some(d("2024-01-01")));
        assert_eq!(med.end_date, Some(d("2024-01-10")));
    }

    #[test]
    fn edit_records_changes() {
        let mut med = medicine_from_input(&input("Once daily"), Utc::now(), d("2024-01-01"));
        med.mark_taken(d("2024-01-01"));

        let mut form = input_from_medicine(&med);
        form.dosage = "500mg".into();
        form.notes = "with food".into();

        let now = Utc::now();
        assert!(apply_edit(&mut med, &form, now));
        assert_eq!(med.dosage, "500mg");
        assert_eq!(med.last_edited_date, Some(now));
        let changes = med.last_edited_changes.clone().unwrap();
        assert!(changes.contains("dosage: 250mg → 500mg"));
        assert!(changes.contains("notes:  → with food"));
        assert!(med.taken_on(d("2024-01-01")));
    }

    #[test]
    fn unchanged_edit_leaves_audit_empty() {
        let mut med = medicine_from_input(&input("Once daily"), Utc::now(), d("2024-01-01"));
        let form = input_from_medicine(&med);
        assert!(!apply_edit(&mut med, &form, Utc::now()));
        assert_eq!(med.last_edited_date, None);
    }
}
