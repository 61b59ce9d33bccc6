//! Builds the per cycle roster: one fresh snapshot per linked member,
//! split into home clan entries and strays.

use std::time::Duration;

use clashtrack_shared::{GuildPolicy, TrackedMember, diff::RosterEntry, traits::api::PlayerApi};
use tracing::{debug, warn};

/// A linked member whose account currently sits outside the home clan.
#[derive(Debug)]
pub struct StrayMember {
    pub member: TrackedMember,
    pub player_name: String,
    pub found_clan: Option<String>,
}

/// State of every tracked member of one guild at a single point in time.
#[derive(Debug, Default)]
pub struct Roster {
    pub entries: Vec<RosterEntry>,
    pub strays: Vec<StrayMember>,
}

/// Fetch the current player state of every verified member. Fetches are
/// spaced by `fetch_delay` and a failed fetch drops the member from this
/// cycle only, the stored baseline stays untouched.
pub async fn build_roster(
    api: &dyn PlayerApi,
    policy: &GuildPolicy,
    members: Vec<TrackedMember>,
    fetch_delay: Duration,
) -> Roster {
    let mut roster = Roster::default();

    for member in members {
        if !member.verified {
            debug!("skipping unverified link of {}", member.user_id);
            continue;
        }

        let player = match api.get_player(&member.tag).await {
            Ok(player) => player,
            Err(e) => {
                warn!("could not fetch player {}: {e}", member.tag);
                tokio::time::sleep(fetch_delay).await;
                continue;
            }
        };
        tokio::time::sleep(fetch_delay).await;

        if policy.is_home_clan(&player) {
            roster.entries.push(RosterEntry {
                user_id: member.user_id,
                previous: member.last_snapshot,
                current: player,
            });
        } else {
            roster.strays.push(StrayMember {
                player_name: player.name.clone(),
                found_clan: player.clan_name().map(str::to_owned),
                member,
            });
        }
    }

    roster
}
