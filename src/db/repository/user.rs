use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::DatabaseError;
use crate::models::User;

/// Insert a new account. A second account with the same email (case
/// insensitive) is a `Conflict`.
pub fn insert_user(conn: &Connection, user: &User) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO users (id, email, name, password_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user.id.to_string(),
            user.email,
            user.name,
            user.password_hash,
            user.created_at,
        ],
    )
    .map_err(|e| DatabaseError::from_unique(e, "email"))?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &Uuid) -> Result<Option<User>, DatabaseError> {
    query_one(conn, "WHERE id = ?1", &id.to_string())
}

pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, DatabaseError> {
    query_one(conn, "WHERE email = ?1", email.trim())
}

struct UserRow {
    id: String,
    email: String,
    name: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

fn query_one(conn: &Connection, clause: &str, key: &str) -> Result<Option<User>, DatabaseError> {
    let sql = format!("SELECT id, email, name, password_hash, created_at FROM users {clause}");
    let mut stmt = conn.prepare(&sql)?;
    let result = stmt.query_row(params![key], |row| {
        Ok(UserRow {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            password_hash: row.get(3)?,
            created_at: row.get(4)?,
        })
    });

    match result {
        Ok(row) => Ok(Some(user_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn user_from_row(row: UserRow) -> Result<User, DatabaseError> {
    Ok(User {
        id: Uuid::parse_str(&row.id).map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        email: row.email,
        name: row.name,
        password_hash: row.password_hash,
        created_at: row.created_at,
    })
}
