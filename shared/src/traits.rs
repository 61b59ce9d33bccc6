//! Async trait seams between storage, the API client and the components
//! that consume them. Keeping these here lets every crate depend on the
//! behavior without depending on an implementation.

use std::{error::Error as ErrorT, fmt::Debug};

use async_trait::async_trait;
use poise::serenity_prelude::{ChannelId, GuildId, RoleId, UserId};

use crate::{ClanRole, GuildPolicy, Player, PlayerTag, TrackedMember};

/// Errors returned by storage implementations.
pub type StoreError = Box<dyn ErrorT + Send + Sync>;

/// Structures able to store and retrieve per guild tracking policies.
#[async_trait]
pub trait GuildPolicySource {
    /// Policy for a guild, default values when nothing was configured yet.
    async fn get_policy(&self, guild_id: GuildId) -> Result<GuildPolicy, StoreError>;

    async fn set_clan_tag(&self, guild_id: GuildId, tag: PlayerTag) -> Result<(), StoreError>;

    async fn set_log_channel(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<(), StoreError>;

    /// Map an in game role to a Discord role, `None` clears the mapping.
    async fn set_clan_role(
        &self,
        guild_id: GuildId,
        role: ClanRole,
        role_id: Option<RoleId>,
    ) -> Result<(), StoreError>;

    async fn set_autokick(&self, guild_id: GuildId, enabled: bool) -> Result<(), StoreError>;

    async fn set_nickname_sync(&self, guild_id: GuildId, enabled: bool) -> Result<(), StoreError>;

    /// Every guild with stored settings, the candidates for polling cycles.
    async fn tracked_guilds(&self) -> Result<Vec<GuildId>, StoreError>;
}

/// Structures able to store and retrieve tracked member bindings.
#[async_trait]
pub trait TrackedMemberSource: Send + Sync + Debug {
    /// Bind a user to a player tag in one guild. Re-linking a different tag
    /// resets the stored snapshot.
    async fn link_member(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        tag: PlayerTag,
        verified: bool,
    ) -> Result<(), StoreError>;

    async fn unlink_member(&self, guild_id: GuildId, user_id: UserId) -> Result<(), StoreError>;

    /// All members linked in a guild, most recently stored snapshot included.
    async fn members_for(&self, guild_id: GuildId) -> Result<Vec<TrackedMember>, StoreError>;

    /// Persist the freshly fetched snapshot as the new diff baseline.
    async fn set_snapshot(&self, user_id: UserId, snapshot: &Player) -> Result<(), StoreError>;
}

/// Super-trait for the full storage surface the tracking loops need.
pub trait ClanStore: GuildPolicySource + TrackedMemberSource {}

pub mod api {
    use bytes::Bytes;

    use super::*;

    pub type ApiError = Box<dyn ErrorT + Send + Sync + 'static>;

    /// Structures able to perform raw authenticated requests against the
    /// Clash of Clans API.
    #[async_trait]
    pub trait ApiRequest: Send + Sync + Debug {
        /// Request `path` relative to the API base and return the raw body.
        async fn request(&self, path: String) -> Result<Bytes, ApiError>;
    }

    /// Player endpoint surface used by the tracking loops and commands.
    #[async_trait]
    pub trait PlayerApi: ApiRequest {
        /// Cheap credential presence check, evaluated before each cycle.
        fn ensure_credentials(&self) -> Result<(), ApiError>;

        async fn get_player(&self, tag: &PlayerTag) -> Result<Player, ApiError>;

        /// Prove account ownership with a single use in game API token.
        async fn verify_token(&self, tag: &PlayerTag, token: &str) -> Result<bool, ApiError>;
    }
}
