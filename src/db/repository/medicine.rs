use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::{LogStatus, MedicineStatus};
use crate::models::Medicine;

const MEDICINE_COLUMNS: &str = "id, parent_medicine_id, medicine_name, dosage, medicine_type,
     frequency, duration, notes, start_date, end_date, time, time_slot_index, created_at,
     last_edited_date, last_edited_changes";

/// Filters for listing a user's medicines. `today` anchors `status`.
#[derive(Debug, Clone)]
pub struct MedicineFilter {
    pub search: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<MedicineStatus>,
    pub today: NaiveDate,
    pub limit: u32,
    pub offset: u32,
}

impl MedicineFilter {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            search: None,
            start_date: None,
            end_date: None,
            status: None,
            today,
            limit: u32::MAX,
            offset: 0,
        }
    }
}

// Window overlap: a medicine matches [startDate, endDate] when its own
// window intersects it. Status mirrors `Medicine::status_on`.
const FILTER_CLAUSE: &str = "user_id = ?1
     AND (?2 IS NULL OR LOWER(medicine_name) LIKE ?2 ESCAPE '\\')
     AND (?3 IS NULL OR end_date IS NULL OR end_date >= ?3)
     AND (?4 IS NULL OR start_date IS NULL OR start_date <= ?4)
     AND (?5 IS NULL
          OR (?5 = 'upcoming' AND start_date > ?6)
          OR (?5 = 'completed' AND end_date < ?6 AND (start_date IS NULL OR start_date <= ?6))
          OR (?5 = 'active' AND (start_date IS NULL OR start_date <= ?6)
                            AND (end_date IS NULL OR end_date >= ?6)))";

pub fn insert_medicine(conn: &Connection, user_id: &Uuid, med: &Medicine) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO medicines (id, user_id, parent_medicine_id, medicine_name, dosage,
         medicine_type, frequency, duration, notes, start_date, end_date, time,
         time_slot_index, created_at, last_edited_date, last_edited_changes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            med.id,
            user_id.to_string(),
            med.parent_medicine_id,
            med.medicine_name,
            med.dosage,
            med.medicine_type,
            med.frequency,
            med.duration,
            med.notes,
            med.start_date,
            med.end_date,
            med.time,
            med.time_slot_index,
            med.created_at,
            med.last_edited_date,
            med.last_edited_changes,
        ],
    )
    .map_err(|e| DatabaseError::from_unique(e, "medicine id"))?;
    Ok(())
}

/// One medicine owned by `user_id`, with its taken/missed dates
/// materialized from the adherence logs.
pub fn get_medicine(
    conn: &Connection,
    user_id: &Uuid,
    id: &str,
) -> Result<Option<Medicine>, DatabaseError> {
    let sql = format!("SELECT {MEDICINE_COLUMNS} FROM medicines WHERE id = ?1 AND user_id = ?2");
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params![id, user_id.to_string()], medicine_row_from_rusqlite);

    match result {
        Ok(row) => {
            let mut med = medicine_from_row(row)?;
            attach_marks(conn, &mut med)?;
            Ok(Some(med))
        }
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// One page of a user's medicines, newest first.
pub fn list_medicines(
    conn: &Connection,
    user_id: &Uuid,
    filter: &MedicineFilter,
) -> Result<Vec<Medicine>, DatabaseError> {
    let sql = format!(
        "SELECT {MEDICINE_COLUMNS} FROM medicines WHERE {FILTER_CLAUSE}
         ORDER BY created_at DESC, id LIMIT ?7 OFFSET ?8"
    );
    let mut stmt = conn.prepare(&sql)?;
    let (search, start, end, status, today) = filter_params(filter);
    let rows = stmt.query_map(
        params![
            user_id.to_string(),
            search,
            start,
            end,
            status,
            today,
            i64::from(filter.limit),
            i64::from(filter.offset),
        ],
        medicine_row_from_rusqlite,
    )?;

    let mut meds = Vec::new();
    for row in rows {
        let mut med = medicine_from_row(row?)?;
        attach_marks(conn, &mut med)?;
        meds.push(med);
    }
    Ok(meds)
}

/// Total matches for `filter`, ignoring `limit`/`offset`.
pub fn count_medicines(
    conn: &Connection,
    user_id: &Uuid,
    filter: &MedicineFilter,
) -> Result<u64, DatabaseError> {
    let sql = format!("SELECT COUNT(*) FROM medicines WHERE {FILTER_CLAUSE}");
    let (search, start, end, status, today) = filter_params(filter);
    let count: i64 = conn.query_row(
        &sql,
        params![user_id.to_string(), search, start, end, status, today],
        |row| row.get(0),
    )?;
    Ok(count.max(0) as u64)
}

/// Every medicine of a user, for statistics.
pub fn all_medicines_for_user(conn: &Connection, user_id: &Uuid) -> Result<Vec<Medicine>, DatabaseError> {
    let sql = format!("SELECT {MEDICINE_COLUMNS} FROM medicines WHERE user_id = ?1 ORDER BY created_at");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![user_id.to_string()], medicine_row_from_rusqlite)?;

    let mut meds = Vec::new();
    for row in rows {
        let mut med = medicine_from_row(row?)?;
        attach_marks(conn, &mut med)?;
        meds.push(med);
    }
    Ok(meds)
}

/// Overwrite the editable columns. Returns `false` when no row owned by
/// `user_id` has that id.
pub fn update_medicine(conn: &Connection, user_id: &Uuid, med: &Medicine) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE medicines SET medicine_name = ?3, dosage = ?4, medicine_type = ?5,
         frequency = ?6, duration = ?7, notes = ?8, start_date = ?9, end_date = ?10,
         time = ?11, last_edited_date = ?12, last_edited_changes = ?13
         WHERE id = ?1 AND user_id = ?2",
        params![
            med.id,
            user_id.to_string(),
            med.medicine_name,
            med.dosage,
            med.medicine_type,
            med.frequency,
            med.duration,
            med.notes,
            med.start_date,
            med.end_date,
            med.time,
            med.last_edited_date,
            med.last_edited_changes,
        ],
    )?;
    Ok(changed > 0)
}

/// Delete a medicine and (via cascade) its logs.
pub fn delete_medicine(conn: &Connection, user_id: &Uuid, id: &str) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM medicines WHERE id = ?1 AND user_id = ?2",
        params![id, user_id.to_string()],
    )?;
    Ok(deleted > 0)
}

type FilterParams = (
    Option<String>,
    Option<NaiveDate>,
    Option<NaiveDate>,
    Option<&'static str>,
    NaiveDate,
);

/// Search text matches literally: `%`, `_` and `\` are escaped.
fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn filter_params(filter: &MedicineFilter) -> FilterParams {
    let search = filter
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", escape_like(&s.to_lowercase())));
    (
        search,
        filter.start_date,
        filter.end_date,
        filter.status.map(|s| s.as_str()),
        filter.today,
    )
}

fn attach_marks(conn: &Connection, med: &mut Medicine) -> Result<(), DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT date, status FROM medicine_logs WHERE medicine_id = ?1 AND status IN ('TAKEN', 'MISSED')",
    )?;
    let rows = stmt.query_map(params![med.id], |row| {
        Ok((row.get::<_, NaiveDate>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut consumed = BTreeSet::new();
    let mut missed = BTreeSet::new();
    for row in rows {
        let (date, status) = row?;
        match status.parse::<LogStatus>()? {
            LogStatus::Taken => consumed.insert(date),
            LogStatus::Missed => missed.insert(date),
            LogStatus::Pending | LogStatus::Edited => false,
        };
    }
    med.consumed_dates = consumed;
    med.missed_dates = missed;
    Ok(())
}

struct MedicineRow {
    id: String,
    parent_medicine_id: Option<String>,
    medicine_name: String,
    dosage: String,
    medicine_type: String,
    frequency: String,
    duration: String,
    notes: String,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    time: String,
    time_slot_index: Option<u32>,
    created_at: DateTime<Utc>,
    last_edited_date: Option<DateTime<Utc>>,
    last_edited_changes: Option<String>,
}

fn medicine_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<MedicineRow, rusqlite::Error> {
    Ok(MedicineRow {
        id: row.get(0)?,
        parent_medicine_id: row.get(1)?,
        medicine_name: row.get(2)?,
        dosage: row.get(3)?,
        medicine_type: row.get(4)?,
        frequency: row.get(5)?,
        duration: row.get(6)?,
        notes: row.get(7)?,
        start_date: row.get(8)?,
        end_date: row.get(9)?,
        time: row.get(10)?,
        time_slot_index: row.get(11)?,
        created_at: row.get(12)?,
        last_edited_date: row.get(13)?,
        last_edited_changes: row.get(14)?,
    })
}

fn medicine_from_row(row: MedicineRow) -> Result<Medicine, DatabaseError> {
    Ok(Medicine {
        id: row.id,
        parent_medicine_id: row.parent_medicine_id,
        medicine_name: row.medicine_name,
        dosage: row.dosage,
        medicine_type: row.medicine_type,
        frequency: row.frequency,
        duration: row.duration,
        notes: row.notes,
        start_date: row.start_date,
        end_date: row.end_date,
        time: row.time,
        consumed_dates: BTreeSet::new(),
        missed_dates: BTreeSet::new(),
        created_at: row.created_at,
        last_edited_date: row.last_edited_date,
        last_edited_changes: row.last_edited_changes,
        time_slot_index: row.time_slot_index,
    })
}
