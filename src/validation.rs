//! Form validation. Every rule runs; violations are collected rather
//! than returned on the first failure.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::models::MedicineInput;
use crate::schedule::{
    exceeds_daily_limit, expand_schedule, resolve_dose_count, ScheduleExpansion, MAX_DAILY_DOSES,
};

const MAX_NAME_LEN: usize = 200;
const MAX_DOSAGE_LEN: usize = 100;
const MAX_FREQUENCY_LEN: usize = 200;
const MAX_NOTES_LEN: usize = 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

fn check_text(
    errors: &mut Vec<FieldError>,
    field: &str,
    label: &str,
    value: &str,
    max: usize,
    required: bool,
) {
    let trimmed = value.trim();
    if required && trimmed.is_empty() {
        errors.push(FieldError::new(field, format!("{label} is required")));
    } else if trimmed.chars().count() > max {
        errors.push(FieldError::new(
            field,
            format!("{label} is too long (max {max} characters)"),
        ));
    }
}

/// Field rules shared by the local form and the REST backend.
pub fn validate_medicine_fields(input: &MedicineInput) -> Vec<FieldError> {
    let mut errors = Vec::new();

    check_text(&mut errors, "medicineName", "Medicine name", &input.medicine_name, MAX_NAME_LEN, true);
    check_text(&mut errors, "dosage", "Dosage", &input.dosage, MAX_DOSAGE_LEN, true);
    check_text(&mut errors, "frequency", "Frequency", &input.frequency, MAX_FREQUENCY_LEN, true);
    if exceeds_daily_limit(&input.frequency) {
        errors.push(FieldError::new(
            "frequency",
            format!("Frequency cannot exceed {MAX_DAILY_DOSES} doses per day"),
        ));
    }
    check_text(&mut errors, "notes", "Notes", &input.notes, MAX_NOTES_LEN, false);

    if let (Some(start), Some(end)) = (input.start_date, input.end_date) {
        if end < start {
            errors.push(FieldError::new("endDate", "End date cannot be before start date"));
        }
    }

    errors
}

/// Field rules plus reminder-time completeness for the add-medicine form.
pub fn validate_medicine_input(
    input: &MedicineInput,
    times: &[Option<NaiveTime>],
) -> Result<(), Vec<FieldError>> {
    let mut errors = validate_medicine_fields(input);

    let dose_count = resolve_dose_count(&input.frequency);
    if let ScheduleExpansion::Partial { scheduled, required } = expand_schedule(dose_count, times) {
        let message = if required == 1 {
            "Reminder time is required".to_string()
        } else {
            format!("Select a time for every dose ({scheduled}/{required} scheduled)")
        };
        errors.push(FieldError::new("time", message));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn valid_input() -> MedicineInput {
        MedicineInput {
            medicine_name: "Metformin".into(),
            dosage: "500mg".into(),
            medicine_type: "Tablet".into(),
            frequency: "Twice daily".into(),
            duration: "7 days".into(),
            notes: String::new(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            end_date: None,
            time: String::new(),
        }
    }

    fn t(h: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, 0, 0)
    }

    #[test]
    fn valid_input_passes() {
        assert!(validate_medicine_input(&valid_input(), &[t(8), t(20)]).is_ok());
    }

    #[test]
    fn collects_every_violation() {
        let input = MedicineInput {
            medicine_name: "  ".into(),
            dosage: String::new(),
            frequency: String::new(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 10),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 1),
            ..Default::default()
        };
        let errors = validate_medicine_input(&input, &[]).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["medicineName", "dosage", "frequency", "endDate", "time"]);
    }

    #[test]
    fn incomplete_multi_dose_reports_progress() {
        let errors = validate_medicine_input(&valid_input(), &[t(8), None]).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "time");
        assert!(errors[0].message.contains("1/2 scheduled"));
    }

    #[test]
    fn overlong_fields_rejected() {
        let mut input = valid_input();
        input.medicine_name = "x".repeat(201);
        input.notes = "y".repeat(1001);
        let errors = validate_medicine_fields(&input);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("max 200"));
    }

    #[test]
    fn oversized_daily_count_is_a_field_error() {
        let mut input = valid_input();
        input.frequency = "4000000000 times daily".into();
        let errors = validate_medicine_input(&input, &[t(8)]).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "frequency");
        assert!(errors[0].message.contains("24 doses"));
    }

    #[test]
    fn same_start_and_end_is_fine() {
        let mut input = valid_input();
        input.end_date = input.start_date;
        assert!(validate_medicine_fields(&input).is_empty());
    }
}
