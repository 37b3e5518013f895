use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::enums::MedicineStatus;

/// One persisted medicine record.
///
/// Multi-dose schedules are stored as sibling records, one per dose of
/// the day, linked by `parent_medicine_id` and ordered by
/// `time_slot_index`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medicine {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_medicine_id: Option<String>,
    pub medicine_name: String,
    pub dosage: String,
    #[serde(default)]
    pub medicine_type: String,
    pub frequency: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub consumed_dates: BTreeSet<NaiveDate>,
    #[serde(default)]
    pub missed_dates: BTreeSet<NaiveDate>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited_changes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_slot_index: Option<u32>,
}

impl Medicine {
    /// Record `date` as taken. Removes it from the missed set.
    pub fn mark_taken(&mut self, date: NaiveDate) {
        self.missed_dates.remove(&date);
        self.consumed_dates.insert(date);
    }

    /// Record `date` as missed. Removes it from the taken set.
    pub fn mark_missed(&mut self, date: NaiveDate) {
        self.consumed_dates.remove(&date);
        self.missed_dates.insert(date);
    }

    /// Forget any adherence event on `date`.
    pub fn clear_mark(&mut self, date: NaiveDate) {
        self.consumed_dates.remove(&date);
        self.missed_dates.remove(&date);
    }

    pub fn taken_on(&self, date: NaiveDate) -> bool {
        self.consumed_dates.contains(&date)
    }

    /// Position of the `[start_date, end_date]` window relative to `today`.
    /// An open start or end is unbounded on that side.
    pub fn status_on(&self, today: NaiveDate) -> MedicineStatus {
        match (self.start_date, self.end_date) {
            (Some(start), _) if start > today => MedicineStatus::Upcoming,
            (_, Some(end)) if end < today => MedicineStatus::Completed,
            _ => MedicineStatus::Active,
        }
    }

    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.status_on(date) == MedicineStatus::Active
    }
}

/// Editable medicine fields as collected by the add/edit form or sent
/// to `POST /medicines` (no id, no adherence arrays).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicineInput {
    #[serde(default)]
    pub medicine_name: String,
    #[serde(default)]
    pub dosage: String,
    #[serde(default)]
    pub medicine_type: String,
    #[serde(default)]
    pub frequency: String,
    #[serde(default)]
    pub duration: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub time: String,
}

#[cfg(test)]
pub(crate) fn test_medicine(name: &str) -> Medicine {
    Medicine {
        id: uuid::Uuid::new_v4().to_string(),
        parent_medicine_id: None,
        medicine_name: name.into(),
        dosage: "500mg".into(),
        medicine_type: "Tablet".into(),
        frequency: "Once daily".into(),
        duration: String::new(),
        notes: String::new(),
        start_date: None,
        end_date: None,
        time: "8:00 AM".into(),
        consumed_dates: BTreeSet::new(),
        missed_dates: BTreeSet::new(),
        created_at: Utc::now(),
        last_edited_date: None,
        last_edited_changes: None,
        time_slot_index: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn taken_after_missed_moves_the_date() {
        let mut med = test_medicine("Metformin");
        med.mark_missed(d("2024-01-05"));
        med.mark_taken(d("2024-01-05"));
        assert!(med.consumed_dates.contains(&d("2024-01-05")));
        assert!(!med.missed_dates.contains(&d("2024-01-05")));

        med.mark_taken(d("2024-01-05"));
        assert_eq!(med.consumed_dates.len(), 1);
        assert!(med.missed_dates.is_empty());
    }

    #[test]
    fn missed_after_taken_moves_the_date() {
        let mut med = test_medicine("Metformin");
        med.mark_taken(d("2024-01-05"));
        med.mark_missed(d("2024-01-05"));
        assert!(med.consumed_dates.is_empty());
        assert_eq!(med.missed_dates.len(), 1);
    }

    #[test]
    fn clear_mark_removes_from_both() {
        let mut med = test_medicine("Metformin");
        med.mark_taken(d("2024-01-05"));
        med.clear_mark(d("2024-01-05"));
        assert!(!med.taken_on(d("2024-01-05")));
        assert!(med.missed_dates.is_empty());
    }

    #[test]
    fn status_follows_window() {
        let mut med = test_medicine("Amoxicillin");
        med.start_date = Some(d("2024-02-01"));
        med.end_date = Some(d("2024-02-07"));
        assert_eq!(med.status_on(d("2024-01-31")), MedicineStatus::Upcoming);
        assert_eq!(med.status_on(d("2024-02-01")), MedicineStatus::Active);
        assert_eq!(med.status_on(d("2024-02-07")), MedicineStatus::Active);
        assert_eq!(med.status_on(d("2024-02-08")), MedicineStatus::Completed);
    }

    #[test]
    fn open_window_is_active() {
        let med = test_medicine("Vitamin D");
        assert!(med.is_active_on(d("2030-01-01")));
    }

    #[test]
    fn missing_arrays_deserialize_as_empty() {
        let json = r#"{
            "id": "1700000000000",
            "medicineName": "Ibuprofen",
            "dosage": "200mg",
            "frequency": "As needed",
            "createdAt": "2024-01-01T08:00:00.000Z"
        }"#;
        let med: Medicine = serde_json::from_str(json).unwrap();
        assert!(med.consumed_dates.is_empty());
        assert!(med.missed_dates.is_empty());
        assert_eq!(med.start_date, None);
    }

    #[test]
    fn serializes_camel_case_dates() {
        let mut med = test_medicine("Metformin");
        med.mark_taken(d("2024-01-02"));
        let value = serde_json::to_value(&med).unwrap();
        assert_eq!(value["medicineName"], "Metformin");
        assert_eq!(value["consumedDates"][0], "2024-01-02");
        assert!(value.get("timeSlotIndex").is_none());
    }
}
