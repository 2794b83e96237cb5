use super::sqlite::Database;
use crate::error::Error;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use std::collections::BTreeSet;
use tracing::debug;

/// A single SQL statement with positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    pub fn is_delete(&self) -> bool {
        self.sql.trim_start().starts_with("DELETE")
    }

    pub fn is_update(&self) -> bool {
        self.sql.trim_start().starts_with("UPDATE")
    }

    pub fn is_insert(&self) -> bool {
        self.sql.trim_start().starts_with("INSERT")
    }
}

/// Right-hand side of an `IN` filter over an id set bound as the single parameter `?N`.
///
/// SQLite limits the number of bound variables per statement, so id sets of any size
/// travel as one JSON array unpacked with `json_each`.
pub fn id_set(param: usize) -> String {
    format!("(SELECT value FROM json_each(?{}))", param)
}

/// The parameter value paired with [`id_set`].
pub fn id_set_value(ids: &[i64]) -> Value {
    Value::Text(serde_json::Value::from(ids.to_vec()).to_string())
}

/// Result set with ordered column names and rows in query order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Integer values of one column, skipping NULLs and non-integers.
    pub fn int_column(&self, name: &str) -> Vec<i64> {
        let Some(idx) = self.column_index(name) else {
            return Vec::new();
        };
        self.rows
            .iter()
            .filter_map(|row| match row.get(idx) {
                Some(Value::Integer(v)) => Some(*v),
                _ => None,
            })
            .collect()
    }
}

/// Narrow facade every component uses to reach the relational store.
pub trait QueryExecutor {
    /// Run every statement in order inside one transaction. Either all commit or none do.
    /// Returns the total number of rows changed.
    fn execute_all(&self, batch: &[Statement]) -> Result<usize, Error>;

    fn query_table(&self, statement: &Statement) -> Result<Table, Error>;

    /// First column of the first row, or `None` when the query returns nothing.
    fn query_first(&self, statement: &Statement) -> Result<Option<Value>, Error> {
        let table = self.query_table(statement)?;
        Ok(table.rows.into_iter().next().and_then(|row| row.into_iter().next()))
    }

    /// Integer values of the first column as a set.
    fn query_ids(&self, statement: &Statement) -> Result<BTreeSet<i64>, Error> {
        let table = self.query_table(statement)?;
        Ok(table
            .rows
            .iter()
            .filter_map(|row| match row.first() {
                Some(Value::Integer(v)) => Some(*v),
                _ => None,
            })
            .collect())
    }
}

impl QueryExecutor for Database {
    fn execute_all(&self, batch: &[Statement]) -> Result<usize, Error> {
        if batch.is_empty() {
            return Ok(0);
        }
        let tx = self.connection().unchecked_transaction()?;
        let mut changed = 0;
        for statement in batch {
            changed += tx.execute(&statement.sql, params_from_iter(statement.params.iter()))?;
        }
        tx.commit()?;
        debug!("Committed batch of {} statements ({} rows)", batch.len(), changed);
        Ok(changed)
    }

    fn query_table(&self, statement: &Statement) -> Result<Table, Error> {
        let mut stmt = self.connection().prepare(&statement.sql)?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();
        let width = columns.len();
        let mut rows = Vec::new();
        let mut cursor = stmt.query(params_from_iter(statement.params.iter()))?;
        while let Some(row) = cursor.next()? {
            let values = (0..width)
                .map(|i| row.get::<_, Value>(i))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.push(values);
        }
        Ok(Table { columns, rows })
    }
}
