use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::enums::LogStatus;
use crate::models::AdherenceLog;

/// Record one adherence event. A later event for the same medicine and
/// date replaces the earlier one, so a date is never both taken and
/// missed. Returns the stored row.
pub fn upsert_log(conn: &Connection, log: &AdherenceLog) -> Result<AdherenceLog, DatabaseError> {
    conn.execute(
        "INSERT INTO medicine_logs (id, medicine_id, date, status, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (medicine_id, date) DO UPDATE SET
             status = excluded.status,
             notes = excluded.notes,
             created_at = excluded.created_at",
        params![
            log.id.to_string(),
            log.medicine_id,
            log.date,
            log.status.as_str(),
            log.notes,
            log.created_at,
        ],
    )?;

    let mut stmt = conn.prepare(
        "SELECT id, medicine_id, date, status, notes, created_at
         FROM medicine_logs WHERE medicine_id = ?1 AND date = ?2",
    )?;
    let row = stmt.query_row(params![log.medicine_id, log.date], log_row_from_rusqlite)?;
    log_from_row(row)
}

/// Logs across all of a user's medicines, optionally bounded by an
/// inclusive date range. Newest date first.
pub fn list_logs(
    conn: &Connection,
    user_id: &Uuid,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<Vec<AdherenceLog>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT l.id, l.medicine_id, l.date, l.status, l.notes, l.created_at
         FROM medicine_logs l
         JOIN medicines m ON m.id = l.medicine_id
         WHERE m.user_id = ?1
           AND (?2 IS NULL OR l.date >= ?2)
           AND (?3 IS NULL OR l.date <= ?3)
         ORDER BY l.date DESC, l.created_at DESC",
    )?;

    let rows = stmt.query_map(
        params![
            user_id.to_string(),
            start,
            end,
        ],
        log_row_from_rusqlite,
    )?;

    let mut logs = Vec::new();
    for row in rows {
        logs.push(log_from_row(row?)?);
    }
    Ok(logs)
}

struct LogRow {
    id: String,
    medicine_id: String,
    date: NaiveDate,
    status: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

fn log_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<LogRow, rusqlite::Error> {
    Ok(LogRow {
        id: row.get(0)?,
        medicine_id: row.get(1)?,
        date: row.get(2)?,
        status: row.get(3)?,
        notes: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn log_from_row(row: LogRow) -> Result<AdherenceLog, DatabaseError> {
    Ok(AdherenceLog {
        id: Uuid::parse_str(&row.id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        medicine_id: row.medicine_id,
        date: row.date,
        status: LogStatus::from_str(&row.status)?,
        notes: row.notes,
        created_at: row.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::test_support::seed_user;
    use crate::db::repository::{get_medicine, insert_medicine};
    use crate::models::test_medicine;
    use chrono::Utc;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn log(medicine_id: &str, date: &str, status: LogStatus) -> AdherenceLog {
        AdherenceLog {
            id: Uuid::new_v4(),
            medicine_id: medicine_id.to_string(),
            date: d(date),
            status,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn later_event_replaces_earlier_on_same_date() {
        let conn = open_memory_database().unwrap();
        let user = seed_user(&conn, "ana@example.com");
        let med = test_medicine("Metformin");
        insert_medicine(&conn, &user.id, &med).unwrap();

        let first = upsert_log(&conn, &log(&med.id, "2024-01-02", LogStatus::Missed)).unwrap();
        let mut second = log(&med.id, "2024-01-02", LogStatus::Taken);
        second.notes = Some("late".into());
        let stored = upsert_log(&conn, &second).unwrap();

        assert_eq!(stored.id, first.id);
        assert_eq!(stored.status, LogStatus::Taken);
        assert_eq!(stored.notes.as_deref(), Some("late"));

        let loaded = get_medicine(&conn, &user.id, &med.id).unwrap().unwrap();
        assert!(loaded.taken_on(d("2024-01-02")));
        assert!(loaded.missed_dates.is_empty());
    }

    #[test]
    fn list_is_scoped_to_user_and_range() {
        let conn = open_memory_database().unwrap();
        let ana = seed_user(&conn, "ana@example.com");
        let ben = seed_user(&conn, "ben@example.com");
        let a = test_medicine("Metformin");
        let b = test_medicine("Lisinopril");
        insert_medicine(&conn, &ana.id, &a).unwrap();
        insert_medicine(&conn, &ben.id, &b).unwrap();

        for date in ["2024-01-01", "2024-01-02", "2024-01-03"] {
            upsert_log(&conn, &log(&a.id, date, LogStatus::Taken)).unwrap();
        }
        upsert_log(&conn, &log(&b.id, "2024-01-02", LogStatus::Taken)).unwrap();

        let all = list_logs(&conn, &ana.id, None, None).unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].date, d("2024-01-03"));

        let ranged = list_logs(&conn, &ana.id, Some(d("2024-01-02")), Some(d("2024-01-02"))).unwrap();
        assert_eq!(ranged.len(), 1);
        assert_eq!(ranged[0].medicine_id, a.id);
    }

    #[test]
    fn unknown_medicine_rejected_by_foreign_key() {
        let conn = open_memory_database().unwrap();
        assert!(upsert_log(&conn, &log("missing", "2024-01-01", LogStatus::Taken)).is_err());
    }
}
