use clashtrack_alert::{MemberActivity, TryIntoAlert};
use clashtrack_shared::{
    ClanRole, Player, PlayerTag,
    diff::RosterEntry,
    events::{ChangeEvent, CounterField, KickOutcome, KickSummary, RoleDirection},
};
use poise::serenity_prelude::{ChannelId, CreateMessage, Http, UserId};
use serde_json::json;

fn sample_player(name: &str) -> Player {
    serde_json::from_value(json!({
        "tag": "#2PP0JCVL",
        "name": name,
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

#[tokio::test]
#[ignore = "Discord E2E"]
async fn send_sample_alerts() {
    dotenv::dotenv().ok();
    let token = match std::env::var("DISCORD_BOT_TOKEN") {
        Ok(t) => t,
        Err(_) => return,
    };
    let channel_id: u64 = match std::env::var("TEST_CHANNEL_ID") {
        Ok(c) => c.parse().unwrap(),
        Err(_) => return,
    };
    let http = Http::new(&token);
    let channel = ChannelId::new(channel_id);

    let entry = RosterEntry {
        user_id: UserId::new(1),
        previous: None,
        current: sample_player("Winter"),
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
    let summary = KickSummary {
        kicked: vec![KickOutcome {
            user_id: UserId::new(2),
            player_name: "Bob".into(),
            tag: PlayerTag::from_raw("#8QU0VCRL"),
            found_clan: Some("Elsewhere".into()),
        }],
        failed: vec![],
    };

    for embed in [
        activity.try_into_alert().unwrap(),
        summary.try_into_alert().unwrap(),
    ] {
        channel
            .send_message(&http, CreateMessage::new().embed(embed))
            .await
            .unwrap();
    }
}
