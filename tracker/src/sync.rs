//! Converges Discord roles and nicknames with the in game state of a
//! tracked member.

use clashtrack_shared::{GuildPolicy, diff::RosterEntry};
use poise::serenity_prelude::{GuildId, RoleId};
use tracing::{debug, warn};

use crate::gateway::{MemberGateway, MemberView};

/// Discord rejects nicknames longer than this.
pub const NICKNAME_MAX_LEN: usize = 32;

/// Role mutations derived for one member, computed before touching Discord.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct RolePlan {
    pub grant: Option<RoleId>,
    pub revoke: Vec<RoleId>,
}

impl RolePlan {
    /// Diff the held roles against the single desired mapping. Only roles
    /// listed in `managed` are ever revoked.
    pub fn compute(held: &[RoleId], desired: Option<RoleId>, managed: &[RoleId]) -> Self {
        let revoke = held
            .iter()
            .copied()
            .filter(|role| managed.contains(role) && Some(*role) != desired)
            .collect();
        let grant = desired.filter(|role| !held.contains(role));

        Self { grant, revoke }
    }

    pub fn is_noop(&self) -> bool {
        self.grant.is_none() && self.revoke.is_empty()
    }
}

/// Bring one member's Discord roles and nickname in line with the fetched
/// player state. Partial failures are logged and skipped, they never abort
/// the surrounding cycle.
pub async fn sync_member(
    gateway: &dyn MemberGateway,
    guild_id: GuildId,
    policy: &GuildPolicy,
    entry: &RosterEntry,
) {
    let view = match gateway.member_view(guild_id, entry.user_id).await {
        Ok(view) => view,
        Err(e) => {
            warn!("could not load guild member {}: {e}", entry.user_id);
            return;
        }
    };

    sync_roles(gateway, guild_id, policy, entry, &view).await;

    if policy.nickname_sync {
        sync_nickname(gateway, guild_id, entry, &view).await;
    }
}

async fn sync_roles(
    gateway: &dyn MemberGateway,
    guild_id: GuildId,
    policy: &GuildPolicy,
    entry: &RosterEntry,
    view: &MemberView,
) {
    let desired = entry
        .current
        .clan_role()
        .and_then(|role| policy.role_for(role));
    let plan = RolePlan::compute(&view.roles, desired, &policy.managed_roles());
    if plan.is_noop() {
        return;
    }

    debug!("updating clan roles of {}: {plan:?}", entry.user_id);

    for role in plan.revoke {
        if let Err(e) = gateway.revoke_role(guild_id, entry.user_id, role).await {
            warn!("could not revoke role {role} from {}: {e}", entry.user_id);
        }
    }
    if let Some(role) = plan.grant {
        if let Err(e) = gateway.grant_role(guild_id, entry.user_id, role).await {
            warn!("could not grant role {role} to {}: {e}", entry.user_id);
        }
    }
}

async fn sync_nickname(
    gateway: &dyn MemberGateway,
    guild_id: GuildId,
    entry: &RosterEntry,
    view: &MemberView,
) {
    if view.is_owner {
        debug!("guild owner {} cannot be renamed, skipping", entry.user_id);
        return;
    }

    let wanted: String = entry.current.name.chars().take(NICKNAME_MAX_LEN).collect();
    if view.display_name == wanted {
        return;
    }

    if let Err(e) = gateway.set_nickname(guild_id, entry.user_id, &wanted).await {
        warn!("could not rename {}: {e}", entry.user_id);
    }
}
