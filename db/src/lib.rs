//! SQLite based storage layer used by the bot.
//!
//! This crate defines the [`SharedDatabase`] type implementing the storage
//! traits from [`clashtrack_shared`] on top of a single SQLite file.

use std::{env, error::Error, path::Path, sync::Arc};

use async_trait::async_trait;
use clashtrack_shared::{
    ClanRole, GuildPolicy, Player, PlayerTag, TrackedMember,
    traits::{ClanStore, GuildPolicySource, StoreError, TrackedMemberSource},
};
use migrations::DbMigration;
use poise::serenity_prelude::{ChannelId, GuildId, RoleId, UserId};
use rusqlite::{Connection, OptionalExtension, params};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info};

mod migrations;

/// Thread-safe wrapper around a SQLite database connection used across async tasks.
#[derive(Debug, Clone)]
pub struct SharedDatabase {
    conn: Arc<Mutex<Connection>>,
    init_once: Arc<OnceCell<()>>,
}

#[async_trait]
impl GuildPolicySource for SharedDatabase {
    async fn get_policy(&self, guild_id: GuildId) -> Result<GuildPolicy, StoreError> {
        let guild_id_u64: u64 = guild_id.into();

        let db = self.conn.lock().await;

        let policy = db
            .query_row(
                "SELECT clan_tag, log_channel_id,
                    role_member_id, role_elder_id, role_co_leader_id, role_leader_id,
                    autokick, nickname_sync
                FROM guild_settings WHERE guild_id = ?",
                [guild_id_u64],
                |row| {
                    let clan_tag: Option<String> = row.get(0)?;
                    let log_channel: Option<u64> = row.get(1)?;
                    let role_member: Option<u64> = row.get(2)?;
                    let role_elder: Option<u64> = row.get(3)?;
                    let role_co_leader: Option<u64> = row.get(4)?;
                    let role_leader: Option<u64> = row.get(5)?;
                    let autokick: i64 = row.get(6)?;
                    let nickname_sync: i64 = row.get(7)?;
                    Ok(GuildPolicy {
                        clan_tag: clan_tag.as_deref().map(PlayerTag::from_raw),
                        log_channel: log_channel.map(ChannelId::new),
                        role_member: role_member.map(RoleId::new),
                        role_elder: role_elder.map(RoleId::new),
                        role_co_leader: role_co_leader.map(RoleId::new),
                        role_leader: role_leader.map(RoleId::new),
                        autokick: autokick != 0,
                        nickname_sync: nickname_sync != 0,
                    })
                },
            )
            .optional()?;

        Ok(policy.unwrap_or_default())
    }

    async fn set_clan_tag(&self, guild_id: GuildId, tag: PlayerTag) -> Result<(), StoreError> {
        self.upsert_setting(guild_id, "clan_tag", Some(tag.as_str().to_string()))
            .await
    }

    async fn set_log_channel(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<(), StoreError> {
        let channel_id_u64: u64 = channel_id.into();
        self.upsert_setting(guild_id, "log_channel_id", Some(channel_id_u64))
            .await
    }

    async fn set_clan_role(
        &self,
        guild_id: GuildId,
        role: ClanRole,
        role_id: Option<RoleId>,
    ) -> Result<(), StoreError> {
        let column = match role {
            ClanRole::Member => "role_member_id",
            ClanRole::Elder => "role_elder_id",
            ClanRole::CoLeader => "role_co_leader_id",
            ClanRole::Leader => "role_leader_id",
        };
        self.upsert_setting(guild_id, column, role_id.map(u64::from))
            .await
    }

    async fn set_autokick(&self, guild_id: GuildId, enabled: bool) -> Result<(), StoreError> {
        self.upsert_setting(guild_id, "autokick", Some(i64::from(enabled)))
            .await
    }

    async fn set_nickname_sync(&self, guild_id: GuildId, enabled: bool) -> Result<(), StoreError> {
        self.upsert_setting(guild_id, "nickname_sync", Some(i64::from(enabled)))
            .await
    }

    async fn tracked_guilds(&self) -> Result<Vec<GuildId>, StoreError> {
        let db = self.conn.lock().await;

        let mut stmt = db.prepare("SELECT guild_id FROM guild_settings")?;
        let rows = stmt.query_map([], |row| row.get::<_, u64>(0))?;

        let mut guilds = Vec::new();
        for row in rows {
            guilds.push(GuildId::new(row?));
        }
        Ok(guilds)
    }
}

#[async_trait]
impl TrackedMemberSource for SharedDatabase {
    async fn link_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        tag: PlayerTag,
        verified: bool,
    ) -> Result<(), StoreError> {
        let guild_id_u64: u64 = guild_id.into();
        let user_id_u64: u64 = user_id.into();

        let mut db = self.conn.lock().await;

        let tx = db.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO guild_settings (guild_id) VALUES (?1)",
            [guild_id_u64],
        )?;

        // Re-linking the same tag keeps the stored snapshot so diffing
        // continues seamlessly, switching accounts resets the baseline.
        tx.execute(
            "INSERT INTO members (user_id, tag, verified, last_snapshot)
                VALUES (?1, ?2, ?3, NULL)
                ON CONFLICT(user_id) DO UPDATE SET
                    verified = excluded.verified,
                    last_snapshot = CASE
                        WHEN members.tag = excluded.tag THEN members.last_snapshot
                        ELSE NULL
                    END,
                    tag = excluded.tag",
            params![user_id_u64, tag.as_str(), i64::from(verified)],
        )?;

        tx.execute(
            "INSERT OR IGNORE INTO member_guilds (user_id, guild_id) VALUES (?1, ?2)",
            params![user_id_u64, guild_id_u64],
        )?;

        tx.commit().map_err(|e| e.into())
    }

    async fn unlink_member(&self, guild_id: GuildId, user_id: UserId) -> Result<(), StoreError> {
        let guild_id_u64: u64 = guild_id.into();
        let user_id_u64: u64 = user_id.into();

        let db = self.conn.lock().await;

        db.execute(
            "DELETE FROM member_guilds WHERE user_id = ?1 AND guild_id = ?2",
            params![user_id_u64, guild_id_u64],
        )?;

        let remaining: i64 = db.query_row(
            "SELECT COUNT(*) FROM member_guilds WHERE user_id = ?1",
            [user_id_u64],
            |row| row.get(0),
        )?;

        if remaining == 0 {
            db.execute("DELETE FROM members WHERE user_id = ?1", [user_id_u64])?;
        }

        Ok(())
    }

    async fn members_for(&self, guild_id: GuildId) -> Result<Vec<TrackedMember>, StoreError> {
        let guild_id_u64: u64 = guild_id.into();

        let raw_rows = {
            let db = self.conn.lock().await;

            let mut stmt = db.prepare(
                "SELECT m.user_id, m.tag, m.verified, m.last_snapshot
                FROM members m
                INNER JOIN member_guilds mg ON m.user_id = mg.user_id
                WHERE mg.guild_id = ?
                ORDER BY m.user_id",
            )?;

            let rows = stmt.query_map([guild_id_u64], |row| {
                Ok((
                    row.get::<_, u64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, Option<String>>(3)?,
                ))
            })?;

            rows.collect::<Result<Vec<_>, _>>()?
        };

        let mut members = Vec::with_capacity(raw_rows.len());
        for (user_id, tag, verified, snapshot_json) in raw_rows {
            let last_snapshot = match snapshot_json {
                Some(json) => Some(serde_json::from_str::<Player>(&json)?),
                None => None,
            };
            members.push(TrackedMember {
                user_id: UserId::new(user_id),
                tag: PlayerTag::from_raw(&tag),
                verified: verified != 0,
                last_snapshot,
            });
        }
        Ok(members)
    }

    async fn set_snapshot(&self, user_id: UserId, snapshot: &Player) -> Result<(), StoreError> {
        let user_id_u64: u64 = user_id.into();
        let json =
            serde_json::to_string(snapshot).map_err(|e| Box::new(e) as Box<dyn Error + Send + Sync>)?;

        let db = self.conn.lock().await;

        db.execute(
            "UPDATE members SET last_snapshot = ?1 WHERE user_id = ?2",
            params![json, user_id_u64],
        )?;
        Ok(())
    }
}

impl ClanStore for SharedDatabase {}

impl SharedDatabase {
    /// Create a new database at the given path.
    pub fn new(path: impl AsRef<Path>) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        Ok(SharedDatabase::from_connection(conn))
    }

    /// Create a new database from the given connection.
    pub fn from_connection(conn: Connection) -> Self {
        info!("opening SQLite connection");
        Self {
            conn: Arc::new(Mutex::new(conn)),
            init_once: Arc::new(OnceCell::new()),
        }
    }

    /// Create a new database using the `DB_PATH` environment variable.
    pub fn new_from_env() -> rusqlite::Result<Self> {
        let db_dir = env::var("DB_PATH").unwrap_or_else(|_| "./".to_string());

        // Expand '~' to the user's home directory
        let db_dir = if db_dir == "~" || db_dir.starts_with("~/") {
            if let Ok(home) = env::var("HOME") {
                format!("{}{}", home, &db_dir[1..])
            } else {
                db_dir
            }
        } else {
            db_dir
        };

        let mut db_path = std::path::PathBuf::from(db_dir);
        db_path.push("clashtrack.db3");
        Self::new(db_path)
    }

    /// Initialize the schemas of the database.
    pub async fn init(&self) {
        let _ = self
            .init_once
            .get_or_init(|| async {
                info!("initializing schema");

                let db = self.conn.lock().await;

                db.execute(
                    "CREATE TABLE IF NOT EXISTS guild_settings (
                        guild_id INTEGER PRIMARY KEY,
                        clan_tag TEXT,
                        log_channel_id INTEGER
                    )",
                    [],
                )
                .unwrap();

                db.execute(
                    "CREATE TABLE IF NOT EXISTS members (
                        user_id INTEGER PRIMARY KEY,
                        tag TEXT NOT NULL,
                        verified INTEGER NOT NULL DEFAULT 0,
                        last_snapshot TEXT
                    )",
                    [],
                )
                .unwrap();

                db.execute(
                    "CREATE TABLE IF NOT EXISTS member_guilds (
                        user_id INTEGER,
                        guild_id INTEGER,
                        PRIMARY KEY (user_id, guild_id),
                        FOREIGN KEY (user_id) REFERENCES members(user_id),
                        FOREIGN KEY (guild_id) REFERENCES guild_settings(guild_id)
                    )",
                    [],
                )
                .unwrap();

                debug!("running migrations");
                migrations::V2::do_migration(&db);
                migrations::V3::do_migration(&db);

                info!("database ready");
            })
            .await;
    }

    /// Set one `guild_settings` column, creating the row when needed.
    async fn upsert_setting<V>(
        &self,
        guild_id: GuildId,
        column: &str,
        value: Option<V>,
    ) -> Result<(), StoreError>
    where
        V: rusqlite::ToSql + Send,
    {
        let guild_id_u64: u64 = guild_id.into();

        let db = self.conn.lock().await;

        // Column names come from a fixed internal list, never from input.
        let sql = format!(
            "INSERT INTO guild_settings (guild_id, {column}) VALUES (?1, ?2)
            ON CONFLICT(guild_id) DO UPDATE SET {column} = excluded.{column}"
        );
        db.execute(&sql, params![guild_id_u64, value])?;
        Ok(())
    }
}
