use rusqlite::Connection;
use tracing::info;

use super::DbMigration;

/// Add the `autokick` and `nickname_sync` toggles to `guild_settings`.
pub struct V3;

impl DbMigration for V3 {
    fn do_migration(conn: &Connection) {
        let columns = super::table_columns(conn, "guild_settings");

        for column in ["autokick", "nickname_sync"] {
            if !columns.contains(&column.to_string()) {
                info!("adding column '{}' to 'guild_settings'", column);
                conn.execute(
                    &format!(
                        "ALTER TABLE guild_settings ADD COLUMN {column} INTEGER NOT NULL DEFAULT 0"
                    ),
                    [],
                )
                .unwrap();
            }
        }
    }
}
