//! Background loops keeping Discord in step with the Clash of Clans API:
//! change detection alerts, role and nickname sync and clan membership
//! enforcement.

use std::{sync::Arc, time::Duration};

use clashtrack_alert::{AlertDispatcher, MemberActivity, MessageSender};
use clashtrack_db::SharedDatabase;
use clashtrack_shared::{
    GuildPolicy,
    diff::{self, RosterEntry},
    traits::{GuildPolicySource, StoreError, TrackedMemberSource, api::PlayerApi},
};
use poise::serenity_prelude::GuildId;
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub mod autokick;
pub mod gateway;
pub mod roster;
pub mod scheduler;
pub mod sync;

pub use autokick::{AutokickEnforcer, enforce_guild};
pub use scheduler::{CycleKind, Scheduler};

use crate::{gateway::MemberGateway, roster::build_roster};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("An error occured during a local store operation: {0}")]
    Store(StoreError),
    #[error("No clan tag is configured for this server")]
    ClanTagNotConfigured,
}

/// Periodic loop fetching every tracked member and turning snapshot drift
/// into alerts and Discord side effects.
pub struct ClanTracker<Api, S> {
    api: Arc<Api>,
    db: SharedDatabase,
    dispatcher: AlertDispatcher<S, SharedDatabase>,
    gateway: Arc<dyn MemberGateway>,
    poll_interval: Duration,
    fetch_delay: Duration,
}

impl<Api, S> ClanTracker<Api, S>
where
    Api: PlayerApi + 'static,
    S: MessageSender + 'static,
{
    pub fn new(
        api: Arc<Api>,
        db: SharedDatabase,
        dispatcher: AlertDispatcher<S, SharedDatabase>,
        gateway: Arc<dyn MemberGateway>,
        poll_interval: Duration,
        fetch_delay: Duration,
    ) -> Self {
        Self {
            api,
            db,
            dispatcher,
            gateway,
            poll_interval,
            fetch_delay,
        }
    }

    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            info!("🔄 clan tracker started");

            let mut interval = tokio::time::interval(self.poll_interval);

            loop {
                interval.tick().await;
                self.poll_once().await
            }
        })
    }

    async fn poll_once(&self) {
        info!("🔄 starting tracking cycle");

        if let Err(e) = self.api.ensure_credentials() {
            error!("❌ aborting tracking cycle: {e}");
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
            if let Err(e) = self.process_guild(guild_id).await {
                error!("Tracking cycle for guild {guild_id} exited with error: {e}");
            }
        }
    }

    async fn process_guild(&self, guild_id: GuildId) -> Result<(), TrackerError> {
        let policy = self
            .db
            .get_policy(guild_id)
            .await
            .map_err(TrackerError::Store)?;
        if policy.clan_tag.is_none() || policy.log_channel.is_none() {
            debug!("guild {guild_id} is not fully configured, skipping");
            return Ok(());
        }

        let members = self
            .db
            .members_for(guild_id)
            .await
            .map_err(TrackerError::Store)?;
        let roster = build_roster(self.api.as_ref(), &policy, members, self.fetch_delay).await;

        for entry in &roster.entries {
            self.process_member(guild_id, &policy, entry, &roster.entries)
                .await;
        }

        Ok(())
    }

    async fn process_member(
        &self,
        guild_id: GuildId,
        policy: &GuildPolicy,
        entry: &RosterEntry,
        roster: &[RosterEntry],
    ) {
        let events = diff::detect(entry, roster);

        // Role and nickname drift is independent of stat drift, converge on
        // every cycle.
        sync::sync_member(self.gateway.as_ref(), guild_id, policy, entry).await;

        if events.is_empty() {
            // A quiet cycle leaves the stored baseline untouched. The very
            // first observation seeds it, without notifying.
            if entry.previous.is_none() {
                self.store_snapshot(entry).await;
            }
            return;
        }

        debug!(
            "{} change(s) detected for {}",
            events.len(),
            entry.current.tag
        );
        let activity = MemberActivity::new(entry, events);
        self.dispatcher.dispatch_alert(guild_id, &activity).await;

        // Stored after the alert attempt so an interrupted cycle replays the
        // diff instead of dropping it.
        self.store_snapshot(entry).await;
    }

    async fn store_snapshot(&self, entry: &RosterEntry) {
        if let Err(e) = self.db.set_snapshot(entry.user_id, &entry.current).await {
            warn!("could not persist snapshot of {}: {e}", entry.current.tag);
        }
    }
}
