use rusqlite::{Connection, Result};
use std::path::Path;
use tracing::debug;

/// Tables in dependency order: children first, so drops never trip a foreign key.
const TABLES: &[&str] = &[
    "app_user",
    "file",
    "mooring_equipment",
    "deployment_organization",
    "deployment_contact",
    "mooring",
    "equipment",
    "contact",
    "deployment",
    "organization",
    "country",
];

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.configure_pragmas()?;
        db.create_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.configure_pragmas()?;
        db.create_schema()?;
        Ok(db)
    }

    fn configure_pragmas(&self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        debug!("SQLite pragmas configured (WAL mode, foreign keys on)");
        Ok(())
    }

    fn create_schema(&self) -> Result<()> {
        self.conn.execute_batch(include_str!("schema.sql"))?;
        debug!("SQLite schema initialized");
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Drop every table. The database is unusable until `initialize` runs.
    pub fn wipe(&self) -> Result<()> {
        let sql: String = TABLES
            .iter()
            .map(|table| format!("DROP TABLE IF EXISTS {};\n", table))
            .collect();
        self.conn.execute_batch(&sql)?;
        debug!("Dropped {} tables", TABLES.len());
        Ok(())
    }

    /// Drop and recreate every table, discarding all stored values.
    pub fn initialize(&self) -> Result<()> {
        self.wipe()?;
        self.create_schema()
    }
}
