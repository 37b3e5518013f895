use chrono::{DateTime, NaiveDate, Utc};

use super::{JsonFileStore, KeyValueStore, StoreError};
use crate::adherence::{compute_stats, doses_for_day, AdherenceStats, DoseStatus};
use crate::config::{local_store_dir, MEDICINES_KEY};
use crate::medicines::edit_medicine;
use crate::models::{Medicine, MedicineInput};

/// The medicine collection persisted as one JSON array.
pub struct MedicineBook<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> MedicineBook<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Every stored record. A failed or unparseable read counts as an
    /// empty collection.
    pub fn load(&self) -> Vec<Medicine> {
        match self.try_load() {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, "Medicine collection unreadable, treating as empty");
                Vec::new()
            }
        }
    }

    /// Strict read used before every write, so a failed read never turns
    /// into an overwrite with an empty list.
    fn try_load(&self) -> Result<Vec<Medicine>, StoreError> {
        match self.store.get(MEDICINES_KEY)? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    fn save_all(&self, records: &[Medicine]) -> Result<(), StoreError> {
        let value = serde_json::to_value(records)?;
        self.store.set(MEDICINES_KEY, &value)
    }

    fn modify<T>(
        &self,
        f: impl FnOnce(&mut Vec<Medicine>) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut records = self.try_load()?;
        let out = f(&mut records)?;
        self.save_all(&records)?;
        Ok(out)
    }

    pub fn get(&self, id: &str) -> Option<Medicine> {
        self.load().into_iter().find(|m| m.id == id)
    }

    /// Sibling records of a multi-dose medicine, ordered by slot.
    pub fn siblings(&self, parent_id: &str) -> Vec<Medicine> {
        let mut group: Vec<Medicine> = self
            .load()
            .into_iter()
            .filter(|m| m.parent_medicine_id.as_deref() == Some(parent_id))
            .collect();
        group.sort_by_key(|m| m.time_slot_index);
        group
    }

    /// Append newly minted records.
    pub fn add(&self, new_records: Vec<Medicine>) -> Result<(), StoreError> {
        let count = new_records.len();
        self.modify(|records| {
            records.extend(new_records);
            Ok(())
        })?;
        tracing::info!(count, "Medicine records added");
        Ok(())
    }

    /// Validate and apply an edit to the record with `id`, overwriting it
    /// in place.
    pub fn update(
        &self,
        id: &str,
        input: &MedicineInput,
        now: DateTime<Utc>,
    ) -> Result<Medicine, StoreError> {
        self.modify(|records| {
            let record = find_mut(records, id)?;
            edit_medicine(record, input, now).map_err(StoreError::Invalid)?;
            Ok(record.clone())
        })
    }

    /// Remove the record with `id`. Returns `false` if it did not exist.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.modify(|records| {
            let before = records.len();
            records.retain(|m| m.id != id);
            Ok(records.len() != before)
        })
    }

    pub fn mark_taken(&self, id: &str, date: NaiveDate) -> Result<Medicine, StoreError> {
        self.modify(|records| {
            let record = find_mut(records, id)?;
            record.mark_taken(date);
            Ok(record.clone())
        })
    }

    pub fn mark_missed(&self, id: &str, date: NaiveDate) -> Result<Medicine, StoreError> {
        self.modify(|records| {
            let record = find_mut(records, id)?;
            record.mark_missed(date);
            Ok(record.clone())
        })
    }

    /// Undo a taken/missed mark on `date`.
    pub fn clear_mark(&self, id: &str, date: NaiveDate) -> Result<Medicine, StoreError> {
        self.modify(|records| {
            let record = find_mut(records, id)?;
            record.clear_mark(date);
            Ok(record.clone())
        })
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.clear()
    }

    pub fn stats(&self, today: NaiveDate) -> AdherenceStats {
        compute_stats(&self.load(), today)
    }

    pub fn doses_for_day(&self, date: NaiveDate) -> Vec<DoseStatus> {
        doses_for_day(&self.load(), date)
    }
}

impl MedicineBook<JsonFileStore> {
    /// Book backed by the JSON store under the app data directory.
    pub fn open_local() -> Result<Self, StoreError> {
        Ok(Self::new(JsonFileStore::open(local_store_dir())?))
    }
}

fn find_mut<'a>(records: &'a mut [Medicine], id: &str) -> Result<&'a mut Medicine, StoreError> {
    records
        .iter_mut()
        .find(|m| m.id == id)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))
}
