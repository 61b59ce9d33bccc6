//! Slash command implementations used by the Discord bot.

use clashtrack_shared::{
    ClanRole, PlayerTag,
    traits::{GuildPolicySource, TrackedMemberSource},
};
use clashtrack_tracker::{TrackerError, enforce_guild};
use poise::serenity_prelude::ChannelType;
use tracing::{debug, info};

use super::{Context, Error, serenity};

/// Error message shown when a command is used outside of a guild context.
const GUILD_ONLY_ERR: &str = "❌ This command can only be used inside a guild.";
const INTERNAL_DB_ERR: &str = "❌ Internal Error: Something went wrong during database operations.";

/// Return the [`GuildId`] of the context or notify the user if the command was
/// run outside a guild.
async fn require_guild(ctx: &Context<'_>) -> Option<serenity::GuildId> {
    match ctx.guild_id() {
        Some(id) => Some(id),
        None => {
            let _ = ctx.say(GUILD_ONLY_ERR).await;
            None
        }
    }
}

fn enter_command_log(command_name: &str) {
    info!("/{} invoked", command_name)
}

/// Link your Discord account to your Clash of Clans player.
#[poise::command(slash_command, category = "Linking", ephemeral)]
pub async fn link(
    ctx: Context<'_>,
    #[description = "Your player tag, e.g. #2PP0JCVL."] tag: String,
    #[description = "The API token from the in game settings."] api_token: String,
) -> Result<(), Error> {
    enter_command_log("link");

    let Some(guild_id) = require_guild(&ctx).await else {
        return Ok(());
    };

    let tag = match PlayerTag::parse(&tag) {
        Ok(tag) => tag,
        Err(e) => {
            ctx.say(format!("❌ {e}")).await?;
            return Ok(());
        }
    };

    debug!("[CMD] verifying ownership of {}", tag);
    let verified = match ctx.data().api.verify_token(&tag, api_token.trim()).await {
        Ok(verified) => verified,
        Err(e) => {
            tracing::error!("API error while verifying token: {}", e);
            ctx.say("❌ Internal Error: The Clash of Clans API could not be reached.")
                .await?;
            return Ok(());
        }
    };

    if !verified {
        // A rejected token also drops any previous binding, a stale link must
        // not keep tracking an account the user no longer proves.
        if let Err(e) = ctx.data().db.unlink_member(guild_id, ctx.author().id).await {
            tracing::error!("DB error while clearing stale link: {}", e);
        }
        ctx.say(
            "❌ The API token does not match this player. You can find yours in game under \
             Settings → More Settings → API Token.",
        )
        .await?;
        return Ok(());
    }

    if let Err(e) = ctx
        .data()
        .db
        .link_member(guild_id, ctx.author().id, tag.clone(), true)
        .await
    {
        tracing::error!("DB error while linking member: {}", e);
        ctx.say(INTERNAL_DB_ERR).await?;
        return Ok(());
    }

    ctx.say(format!("🎉 Successfully linked your account to **{tag}**."))
        .await?;
    Ok(())
}

/// Remove the link between your Discord account and a player.
#[poise::command(slash_command, category = "Linking", ephemeral)]
pub async fn unlink(ctx: Context<'_>) -> Result<(), Error> {
    enter_command_log("unlink");

    let Some(guild_id) = require_guild(&ctx).await else {
        return Ok(());
    };

    if let Err(e) = ctx.data().db.unlink_member(guild_id, ctx.author().id).await {
        tracing::error!("DB error while unlinking member: {}", e);
        ctx.say(INTERNAL_DB_ERR).await?;
        return Ok(());
    }

    ctx.say("🗑️ Successfully removed your account link.")
        .await?;
    Ok(())
}

/// Show the accounts linked in this server.
#[poise::command(slash_command, category = "Linking", ephemeral)]
pub async fn linked(ctx: Context<'_>) -> Result<(), Error> {
    enter_command_log("linked");

    let Some(guild_id) = require_guild(&ctx).await else {
        return Ok(());
    };

    let response = match ctx.data().db.members_for(guild_id).await {
        Ok(members) if members.is_empty() => {
            "No linked accounts yet. Members can run `/link` to bind theirs.".to_string()
        }
        Ok(members) => {
            let mut s: String = "Currently linked:\n".to_owned();
            for member in members {
                let marker = if member.verified { "" } else { " (unverified)" };
                let row = format!("\n- <@{}>: **{}**{}", member.user_id, member.tag, marker);
                s = s + &row;
            }
            s
        }
        Err(e) => {
            tracing::error!("DB query error: {}", e);
            "❌ Internal Error: Couldn't retrieve linked accounts for this server.".to_string()
        }
    };

    ctx.say(response).await?;
    Ok(())
}

/// Set the home clan whose members are tracked in this server.
#[poise::command(
    slash_command,
    category = "Settings",
    ephemeral,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn set_clan_tag(
    ctx: Context<'_>,
    #[description = "The clan tag, e.g. #2PPCN0."] tag: String,
) -> Result<(), Error> {
    enter_command_log("set_clan_tag");

    let Some(guild_id) = require_guild(&ctx).await else {
        return Ok(());
    };

    let tag = match PlayerTag::parse(&tag) {
        Ok(tag) => tag,
        Err(e) => {
            ctx.say(format!("❌ {e}")).await?;
            return Ok(());
        }
    };

    if let Err(e) = ctx.data().db.set_clan_tag(guild_id, tag.clone()).await {
        tracing::error!("DB error while setting clan tag: {}", e);
        ctx.say("❌ Internal Error: Couldn't update the clan tag.")
            .await?;
        return Ok(());
    }

    ctx.say(format!("🎉 Home clan set to **{tag}**.")).await?;
    Ok(())
}

/// Change the channel where the bot should send tracking alerts.
#[poise::command(
    slash_command,
    category = "Settings",
    ephemeral,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn set_log_channel(
    ctx: Context<'_>,
    #[description = "The text channel where to send tracking alerts."]
    channel: serenity::GuildChannel,
) -> Result<(), Error> {
    enter_command_log("set_log_channel");

    if channel.kind != ChannelType::Text {
        ctx.say("❌ Specified channel need to be a Text channel where messages can be sent !")
            .await?;
        return Ok(());
    }

    let Some(guild_id) = require_guild(&ctx).await else {
        return Ok(());
    };

    if let Err(e) = ctx.data().db.set_log_channel(guild_id, channel.id).await {
        tracing::error!("DB error while setting log channel: {}", e);
        ctx.say("❌ Internal Error: Couldn't update the log channel.")
            .await?;
        return Ok(());
    }

    let response = format!("🎉 Successfully set alerts diffusion to channel {}", channel);
    ctx.say(response).await?;
    Ok(())
}

/// Map an in game clan role to a Discord role.
#[poise::command(
    slash_command,
    category = "Settings",
    ephemeral,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn set_clan_role(
    ctx: Context<'_>,
    #[description = "In game role"] clan_role: ClanRole,
    #[description = "Discord role to grant, leave empty to clear the mapping"] role: Option<
        serenity::Role,
    >,
) -> Result<(), Error> {
    enter_command_log("set_clan_role");

    let Some(guild_id) = require_guild(&ctx).await else {
        return Ok(());
    };

    let role_id = role.as_ref().map(|role| role.id);
    if let Err(e) = ctx
        .data()
        .db
        .set_clan_role(guild_id, clan_role, role_id)
        .await
    {
        tracing::error!("DB error while mapping clan role: {}", e);
        ctx.say("❌ Internal Error: Couldn't update the role mapping.")
            .await?;
        return Ok(());
    }

    let response = match role {
        Some(role) => format!("🎉 {clan_role} now maps to {role}."),
        None => format!("🗑️ Cleared the role mapping for {clan_role}."),
    };
    ctx.say(response).await?;
    Ok(())
}

/// Enable or disable automatic removal of members who left the clan.
#[poise::command(
    slash_command,
    category = "Settings",
    ephemeral,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn set_autokick(
    ctx: Context<'_>,
    #[description = "Enable or disable autokick"] enabled: bool,
) -> Result<(), Error> {
    enter_command_log("set_autokick");

    let Some(guild_id) = require_guild(&ctx).await else {
        return Ok(());
    };

    if let Err(e) = ctx.data().db.set_autokick(guild_id, enabled).await {
        tracing::error!("DB error while setting autokick: {}", e);
        ctx.say("❌ Internal Error: Couldn't update the autokick setting.")
            .await?;
        return Ok(());
    }

    let status = if enabled { "enabled" } else { "disabled" };
    ctx.say(format!("✅ Autokick is now {}.", status)).await?;
    Ok(())
}

/// Enable or disable renaming members after their in game name.
#[poise::command(
    slash_command,
    category = "Settings",
    ephemeral,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn set_nickname_sync(
    ctx: Context<'_>,
    #[description = "Enable or disable nickname sync"] enabled: bool,
) -> Result<(), Error> {
    enter_command_log("set_nickname_sync");

    let Some(guild_id) = require_guild(&ctx).await else {
        return Ok(());
    };

    if let Err(e) = ctx.data().db.set_nickname_sync(guild_id, enabled).await {
        tracing::error!("DB error while setting nickname sync: {}", e);
        ctx.say("❌ Internal Error: Couldn't update the nickname sync setting.")
            .await?;
        return Ok(());
    }

    let status = if enabled { "enabled" } else { "disabled" };
    ctx.say(format!("✅ Nickname sync is now {}.", status))
        .await?;
    Ok(())
}

/// Show the tracking configuration of this server.
#[poise::command(slash_command, category = "Settings", ephemeral)]
pub async fn settings(ctx: Context<'_>) -> Result<(), Error> {
    enter_command_log("settings");

    let Some(guild_id) = require_guild(&ctx).await else {
        return Ok(());
    };

    let policy = match ctx.data().db.get_policy(guild_id).await {
        Ok(policy) => policy,
        Err(e) => {
            tracing::error!("DB query error: {}", e);
            ctx.say("❌ Internal Error: Couldn't retrieve the settings for this server.")
                .await?;
            return Ok(());
        }
    };

    let clan = policy
        .clan_tag
        .as_ref()
        .map_or("not set".to_string(), |tag| format!("**{tag}**"));
    let channel = policy
        .log_channel
        .map_or("not set".to_string(), |id| format!("<#{id}>"));
    let role_line =
        |role: Option<serenity::RoleId>| role.map_or("not set".to_string(), |id| format!("<@&{id}>"));
    let toggle = |on: bool| if on { "enabled" } else { "disabled" };

    let response = format!(
        "Home clan: {clan}\nLog channel: {channel}\nMember role: {}\nElder role: {}\nCo-Leader role: {}\nLeader role: {}\nAutokick: {}\nNickname sync: {}",
        role_line(policy.role_member),
        role_line(policy.role_elder),
        role_line(policy.role_co_leader),
        role_line(policy.role_leader),
        toggle(policy.autokick),
        toggle(policy.nickname_sync),
    );

    ctx.say(response).await?;
    Ok(())
}

/// Kick every member whose account left the clan, right now.
#[poise::command(
    slash_command,
    category = "Settings",
    ephemeral,
    required_permissions = "MANAGE_GUILD"
)]
pub async fn force_autokick(
    ctx: Context<'_>,
    #[description = "Set to True to confirm kicking every stray member."] confirm: bool,
) -> Result<(), Error> {
    enter_command_log("force_autokick");

    let Some(guild_id) = require_guild(&ctx).await else {
        return Ok(());
    };

    if !confirm {
        ctx.say(
            "⚠️ This removes every member whose account left the clan. \
             Re-run with `confirm: True` to proceed.",
        )
        .await?;
        return Ok(());
    }

    // One fetch per member, this can take a while on big rosters.
    ctx.defer_ephemeral().await?;

    let gateway = ctx.serenity_context().http.clone();
    let summary = match enforce_guild(
        ctx.data().api.as_ref(),
        &ctx.data().db,
        &gateway,
        guild_id,
        ctx.data().fetch_delay,
    )
    .await
    {
        Ok(summary) => summary,
        Err(TrackerError::ClanTagNotConfigured) => {
            ctx.say("❌ No clan tag is configured. Set one with `/set_clan_tag` first.")
                .await?;
            return Ok(());
        }
        Err(e) => {
            tracing::error!("Autokick pass failed: {}", e);
            ctx.say("❌ Internal Error: The enforcement pass could not be completed.")
                .await?;
            return Ok(());
        }
    };

    let response = if summary.is_empty() {
        "✅ Everyone is in the clan, nothing to do.".to_string()
    } else {
        format!(
            "👢 Removed {} member(s), {} failure(s).",
            summary.kicked.len(),
            summary.failed.len()
        )
    };
    ctx.say(response).await?;
    Ok(())
}
