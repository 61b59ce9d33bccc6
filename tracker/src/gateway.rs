//! Seam over the Discord guild member endpoints used by role sync and
//! autokick, so the loops can be exercised against a recording fake.

use std::sync::Arc;

use async_trait::async_trait;
use poise::serenity_prelude::{EditMember, GuildId, Http, RoleId, UserId};

/// Errors returned by guild member operations.
pub type GatewayError = Box<dyn std::error::Error + Send + Sync>;

/// The slice of a guild member the sync pass needs to decide what to change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberView {
    pub roles: Vec<RoleId>,
    pub display_name: String,
    /// Guild owners cannot be renamed through the API.
    pub is_owner: bool,
}

/// Guild member reads and mutations performed by the tracking loops.
#[async_trait]
pub trait MemberGateway: Send + Sync {
    async fn member_view(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<MemberView, GatewayError>;

    async fn grant_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), GatewayError>;

    async fn revoke_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), GatewayError>;

    async fn set_nickname(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        nickname: &str,
    ) -> Result<(), GatewayError>;

    async fn kick(&self, guild_id: GuildId, user_id: UserId, reason: &str)
    -> Result<(), GatewayError>;
}

#[async_trait]
impl MemberGateway for Arc<Http> {
    async fn member_view(
        &self,
        guild_id: GuildId,
        user_id: UserId,
    ) -> Result<MemberView, GatewayError> {
        let member = guild_id.member(self, user_id).await?;
        let owner_id = guild_id.to_partial_guild(self).await?.owner_id;

        Ok(MemberView {
            roles: member.roles.clone(),
            display_name: member.display_name().to_string(),
            is_owner: member.user.id == owner_id,
        })
    }

    async fn grant_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), GatewayError> {
        self.add_member_role(guild_id, user_id, role_id, Some("clan role sync"))
            .await?;
        Ok(())
    }

    async fn revoke_role(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        role_id: RoleId,
    ) -> Result<(), GatewayError> {
        self.remove_member_role(guild_id, user_id, role_id, Some("clan role sync"))
            .await?;
        Ok(())
    }

    async fn set_nickname(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        nickname: &str,
    ) -> Result<(), GatewayError> {
        guild_id
            .edit_member(self, user_id, EditMember::new().nickname(nickname))
            .await?;
        Ok(())
    }

    async fn kick(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        reason: &str,
    ) -> Result<(), GatewayError> {
        guild_id.kick_with_reason(self, user_id, reason).await?;
        Ok(())
    }
}
