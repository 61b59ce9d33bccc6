//! Membership enforcement: removes guild members whose linked account left
//! the home clan.

use std::{sync::Arc, time::Duration};

use clashtrack_alert::{AlertDispatcher, MessageSender};
use clashtrack_db::SharedDatabase;
use clashtrack_shared::{
    events::{KickFailure, KickOutcome, KickSummary},
    traits::{GuildPolicySource, TrackedMemberSource, api::PlayerApi},
};
use poise::serenity_prelude::GuildId;
use tracing::{debug, error, info, warn};

use crate::{TrackerError, gateway::MemberGateway, roster::build_roster};

/// Kick every stray member of one guild and report what happened. A failed
/// kick is collected into the summary, it never aborts the pass.
pub async fn enforce_guild(
    api: &dyn PlayerApi,
    db: &SharedDatabase,
    gateway: &dyn MemberGateway,
    guild_id: GuildId,
    fetch_delay: Duration,
) -> Result<KickSummary, TrackerError> {
    let policy = db.get_policy(guild_id).await.map_err(TrackerError::Store)?;
    let Some(clan_tag) = policy.clan_tag.clone() else {
        return Err(TrackerError::ClanTagNotConfigured);
    };

    let members = db
        .members_for(guild_id)
        .await
        .map_err(TrackerError::Store)?;
    let roster = build_roster(api, &policy, members, fetch_delay).await;

    let mut summary = KickSummary::default();
    for stray in roster.strays {
        let reason = match &stray.found_clan {
            Some(clan) => format!("Not in clan {clan_tag} (found in {clan})"),
            None => format!("Not in clan {clan_tag}"),
        };

        match gateway.kick(guild_id, stray.member.user_id, &reason).await {
            Ok(()) => {
                info!(
                    "👢 kicked {} ({}) from guild {guild_id}",
                    stray.player_name, stray.member.tag
                );
                summary.kicked.push(KickOutcome {
                    user_id: stray.member.user_id,
                    player_name: stray.player_name,
                    tag: stray.member.tag,
                    found_clan: stray.found_clan,
                });
            }
            Err(e) => {
                warn!("could not kick {}: {e}", stray.member.user_id);
                summary.failed.push(KickFailure {
                    user_id: stray.member.user_id,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(summary)
}

/// Periodic loop applying the autokick policy of every tracked guild.
pub struct AutokickEnforcer<Api, S> {
    api: Arc<Api>,
    db: SharedDatabase,
    dispatcher: AlertDispatcher<S, SharedDatabase>,
    gateway: Arc<dyn MemberGateway>,
    interval: Duration,
    fetch_delay: Duration,
}

impl<Api, S> AutokickEnforcer<Api, S>
where
    Api: PlayerApi + 'static,
    S: MessageSender + 'static,
{
    pub fn new(
        api: Arc<Api>,
        db: SharedDatabase,
        dispatcher: AlertDispatcher<S, SharedDatabase>,
        gateway: Arc<dyn MemberGateway>,
        interval: Duration,
        fetch_delay: Duration,
    ) -> Self {
        Self {
            api,
            db,
            dispatcher,
            gateway,
            interval,
            fetch_delay,
        }
    }

    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!("🥾 autokick loop started");

            let mut interval = tokio::time::interval(self.interval);

            loop {
                interval.tick().await;
                self.run_once().await
            }
        })
    }

    pub async fn run_once(&self) {
        if let Err(e) = self.api.ensure_credentials() {
            error!("❌ aborting autokick cycle: {e}");
            return;
        }

        let guilds = match self.db.tracked_guilds().await {
            Ok(guilds) => guilds,
            Err(e) => {
                error!("Database error while fetching guilds: {e}");
                return;
            }
        };

        for guild_id in guilds {
            if let Err(e) = self.run_guild(guild_id).await {
                error!("Autokick pass for guild {guild_id} exited with error: {e}");
            }
        }
    }

    async fn run_guild(&self, guild_id: GuildId) -> Result<(), TrackerError> {
        let policy = self
            .db
            .get_policy(guild_id)
            .await
            .map_err(TrackerError::Store)?;
        if !policy.autokick || policy.clan_tag.is_none() {
            debug!("autokick not active for guild {guild_id}");
            return Ok(());
        }

        let summary = enforce_guild(
            self.api.as_ref(),
            &self.db,
            self.gateway.as_ref(),
            guild_id,
            self.fetch_delay,
        )
        .await?;

        if summary.is_empty() {
            debug!("no strays in guild {guild_id}");
            return Ok(());
        }

        self.dispatcher.dispatch_alert(guild_id, &summary).await;
        Ok(())
    }
}
