use std::{env, sync::Arc};

use async_trait::async_trait;
use clashtrack_alert::{AlertDispatcher, MemberActivity};
use clashtrack_shared::{
    ClanRole, GuildPolicy, Player, PlayerTag,
    diff::RosterEntry,
    events::{ChangeEvent, CounterField, KickFailure, KickOutcome, KickSummary, RoleDirection},
    traits::{GuildPolicySource, StoreError},
};
use dotenv::dotenv;
use poise::serenity_prelude::{ChannelId, GuildId, Http, RoleId, UserId};
use serde_json::json;

struct TestPolicies {
    channel: ChannelId,
}

#[async_trait]
impl GuildPolicySource for TestPolicies {
    async fn get_policy(&self, _guild_id: GuildId) -> Result<GuildPolicy, StoreError> {
        Ok(GuildPolicy {
            log_channel: Some(self.channel),
            ..Default::default()
        })
    }

    async fn set_clan_tag(&self, _guild_id: GuildId, _tag: PlayerTag) -> Result<(), StoreError> {
        Ok(())
    }

    async fn set_log_channel(
        &self,
        _guild_id: GuildId,
        _channel_id: ChannelId,
    ) -> Result<(), StoreError> {
        Ok(())
    }

    async fn set_clan_role(
        &self,
        _guild_id: GuildId,
        _role: ClanRole,
        _role_id: Option<RoleId>,
    ) -> Result<(), StoreError> {
        Ok(())
    }

    async fn set_autokick(&self, _guild_id: GuildId, _enabled: bool) -> Result<(), StoreError> {
        Ok(())
    }

    async fn set_nickname_sync(&self, _guild_id: GuildId, _enabled: bool) -> Result<(), StoreError> {
        Ok(())
    }

    async fn tracked_guilds(&self) -> Result<Vec<GuildId>, StoreError> {
        Ok(vec![GuildId::new(1)])
    }
}

fn sample_player() -> Player {
    serde_json::from_value(json!({
        "tag": "#2PP0JCVL",
        "name": "Winter",
        "townHallLevel": 14,
        "role": "admin",
        "warPreference": "in",
        "trophies": 5210,
        "bestTrophies": 5600,
        "warStars": 1184,
        "attackWins": 132,
        "defenseWins": 17,
        "donations": 452,
        "donationsReceived": 305,
        "clanCapitalContributions": 41250,
        "clan": { "tag": "#2PPCN0", "name": "Home Clan" }
    }))
    .unwrap()
}

fn live_dispatcher() -> AlertDispatcher<Arc<Http>, TestPolicies> {
    dotenv().ok();
    let token = env::var("DISCORD_BOT_TOKEN").expect("DISCORD_BOT_TOKEN not set");
    let channel_id: u64 = env::var("TEST_CHANNEL_ID")
        .expect("TEST_CHANNEL_ID not set")
        .parse()
        .expect("invalid channel id");
    let http = Arc::new(Http::new(&token));
    let policies = TestPolicies {
        channel: ChannelId::new(channel_id),
    };

    AlertDispatcher::new(http, policies)
}

#[tokio::test]
#[ignore = "Requires Discord credentials"]
async fn dispatch_activity_alert_to_discord() {
    let dispatcher = live_dispatcher();

    let entry = RosterEntry {
        user_id: UserId::new(1),
        previous: None,
        current: sample_player(),
    };
    let activity = MemberActivity::new(
        &entry,
        vec![
            ChangeEvent::RoleChanged {
                old: ClanRole::Member,
                new: ClanRole::Elder,
                direction: RoleDirection::Promotion,
            },
            ChangeEvent::CounterIncreased {
                field: CounterField::WarStars,
                old: 1180,
                new: 1184,
                delta: 4,
            },
            ChangeEvent::TrophiesGained {
                delta: 31,
                total: 5210,
            },
        ],
    );

    dispatcher.dispatch_alert(GuildId::new(1), &activity).await;
}

#[tokio::test]
#[ignore = "Requires Discord credentials"]
async fn dispatch_kick_summary_to_discord() {
    let dispatcher = live_dispatcher();

    let summary = KickSummary {
        kicked: vec![KickOutcome {
            user_id: UserId::new(2),
            player_name: "Bob".into(),
            tag: PlayerTag::from_raw("#8QU0VCRL"),
            found_clan: Some("Elsewhere".into()),
        }],
        failed: vec![KickFailure {
            user_id: UserId::new(3),
            reason: "Missing Permissions".into(),
        }],
    };

    dispatcher.dispatch_alert(GuildId::new(1), &summary).await;
}
