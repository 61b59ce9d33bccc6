use rusqlite::Connection;
use tracing::info;

use super::DbMigration;

/// Add the per clan role mapping columns to `guild_settings`.
pub struct V2;

impl DbMigration for V2 {
    fn do_migration(conn: &Connection) {
        let columns = super::table_columns(conn, "guild_settings");

        for column in [
            "role_member_id",
            "role_elder_id",
            "role_co_leader_id",
            "role_leader_id",
        ] {
            if !columns.contains(&column.to_string()) {
                info!("adding column '{}' to 'guild_settings'", column);
                conn.execute(
                    &format!("ALTER TABLE guild_settings ADD COLUMN {column} INTEGER"),
                    [],
                )
                .unwrap();
            }
        }
    }
}
