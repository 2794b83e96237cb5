use super::models::{FileRecord, UserAccount};
use super::statement::{QueryExecutor, Statement};
use crate::error::Error;
use rusqlite::types::Value;

// ── Files ────────────────────────────────────────────────────

/// Snapshot of every file record, ordered by id.
pub fn file_records<Q: QueryExecutor + ?Sized>(db: &Q) -> Result<Vec<FileRecord>, Error> {
    let table = db.query_table(&Statement::new(
        "SELECT id, path FROM file ORDER BY id",
        vec![],
    ))?;
    Ok(table
        .rows
        .into_iter()
        .filter_map(|row| match (row.first(), row.get(1)) {
            (Some(Value::Integer(id)), Some(Value::Text(path))) => Some(FileRecord {
                id: *id,
                path: path.clone(),
            }),
            _ => None,
        })
        .collect())
}

pub fn insert_file_record<Q: QueryExecutor + ?Sized>(db: &Q, path: &str) -> Result<i64, Error> {
    db.execute_all(&[Statement::new(
        "INSERT INTO file (path) VALUES (?1)",
        vec![Value::Text(path.to_string())],
    )])?;
    match db.query_first(&Statement::new("SELECT MAX(id) FROM file", vec![]))? {
        Some(Value::Integer(id)) => Ok(id),
        _ => Err(Error::Validation("file insert produced no id".to_string())),
    }
}

/// The id of the `mooring_equipment` link row for a (mooring, equipment) pair.
pub fn mooring_equipment_id<Q: QueryExecutor + ?Sized>(
    db: &Q,
    mooring_id: i64,
    equipment_id: i64,
) -> Result<Option<i64>, Error> {
    let first = db.query_first(&Statement::new(
        "SELECT id FROM mooring_equipment WHERE mooring_id = ?1 AND equipment_id = ?2",
        vec![Value::Integer(mooring_id), Value::Integer(equipment_id)],
    ))?;
    Ok(as_int(first))
}

// ── Deployments ──────────────────────────────────────────────

pub fn next_deployment_id<Q: QueryExecutor + ?Sized>(db: &Q) -> Result<i64, Error> {
    let max = db.query_first(&Statement::new(
        "SELECT MAX(id) FROM deployment",
        vec![],
    ))?;
    Ok(as_int(max).map_or(1, |id| id + 1))
}

// ── Users ────────────────────────────────────────────────────

pub fn user_id_by_username<Q: QueryExecutor + ?Sized>(
    db: &Q,
    username: &str,
) -> Result<Option<i64>, Error> {
    let first = db.query_first(&Statement::new(
        "SELECT id FROM app_user WHERE username = ?1",
        vec![Value::Text(username.to_string())],
    ))?;
    Ok(as_int(first))
}

pub fn user_id_by_email<Q: QueryExecutor + ?Sized>(db: &Q, email: &str) -> Result<Option<i64>, Error> {
    let first = db.query_first(&Statement::new(
        "SELECT id FROM app_user WHERE email = ?1",
        vec![Value::Text(email.to_string())],
    ))?;
    Ok(as_int(first))
}

pub fn user_by_username<Q: QueryExecutor + ?Sized>(
    db: &Q,
    username: &str,
) -> Result<Option<UserAccount>, Error> {
    let table = db.query_table(&Statement::new(
        "SELECT id, username, email, role, password_expired FROM app_user WHERE username = ?1",
        vec![Value::Text(username.to_string())],
    ))?;
    Ok(table.rows.into_iter().next().and_then(|row| {
        match (&row[0], &row[1], &row[2], &row[3], &row[4]) {
            (
                Value::Integer(id),
                Value::Text(username),
                Value::Text(email),
                Value::Integer(role),
                Value::Integer(expired),
            ) => Some(UserAccount {
                id: *id,
                username: username.clone(),
                email: email.clone(),
                role: *role,
                password_expired: *expired != 0,
            }),
            _ => None,
        }
    }))
}

fn as_int(value: Option<Value>) -> Option<i64> {
    match value {
        Some(Value::Integer(v)) => Some(v),
        _ => None,
    }
}
