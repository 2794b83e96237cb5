pub mod models;
pub mod queries;
pub mod sqlite;
pub mod statement;

pub use sqlite::Database;
pub use statement::{QueryExecutor, Statement, Table};
