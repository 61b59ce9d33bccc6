//! Database schema migrations.

use rusqlite::Connection;

mod v2;
pub use v2::V2;
mod v3;
pub use v3::V3;

pub trait DbMigration {
    fn do_migration(conn: &Connection);
}

/// Column names of a table, used to guard idempotent column additions.
pub(crate) fn table_columns(conn: &Connection, table: &str) -> Vec<String> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .unwrap();
    stmt.query_map([], |row| row.get::<_, String>(1))
        .unwrap()
        .map(|r| r.unwrap())
        .collect()
}
