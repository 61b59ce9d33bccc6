//! Snapshot diff engine. Turns two consecutive snapshots of a player into an
//! ordered list of semantic change events, correlating donation counters
//! across the rest of the cycle's roster.

use std::cmp::Ordering;

use poise::serenity_prelude::UserId;

use crate::{
    events::{ChangeEvent, CounterField, DonationCredit, ItemKind, RoleDirection},
    player::{Achievement, Player},
};

/// One member of a polling cycle's roster: the tracked user together with
/// the snapshot stored last cycle and the profile fetched this cycle.
#[derive(Debug, Clone)]
pub struct RosterEntry {
    pub user_id: UserId,
    pub previous: Option<Player>,
    pub current: Player,
}

const COUNTERS: [CounterField; 4] = [
    CounterField::AttackWins,
    CounterField::DefenseWins,
    CounterField::WarStars,
    CounterField::CapitalContributions,
];

/// Diff one roster entry against its stored snapshot.
///
/// Returns nothing when no previous snapshot exists, the first observation
/// only establishes a baseline. A role change always comes first in the
/// output, the remaining events follow a fixed field order with donations
/// last. `roster` is the full cycle roster including `entry` itself and is
/// only consulted to attribute donation deltas.
pub fn detect(entry: &RosterEntry, roster: &[RosterEntry]) -> Vec<ChangeEvent> {
    let Some(previous) = entry.previous.as_ref() else {
        return Vec::new();
    };
    let current = &entry.current;

    let mut events = Vec::new();

    if let Some(event) = role_change(previous, current) {
        events.push(event);
    }

    counter_changes(previous, current, &mut events);
    trophy_change(previous, current, &mut events);

    if previous.league_name() != current.league_name() {
        events.push(ChangeEvent::LeagueChanged {
            old: previous.league_name().map(str::to_owned),
            new: current.league_name().map(str::to_owned),
        });
    }
    if previous.clan_name() != current.clan_name() {
        events.push(ChangeEvent::ClanChanged {
            old: previous.clan_name().map(str::to_owned),
            new: current.clan_name().map(str::to_owned),
        });
    }
    if previous.name != current.name {
        events.push(ChangeEvent::NameChanged {
            old: previous.name.clone(),
            new: current.name.clone(),
        });
    }
    if previous.war_preference != current.war_preference {
        events.push(ChangeEvent::WarPreferenceChanged {
            old: previous.war_preference.clone(),
            new: current.war_preference.clone(),
        });
    }
    if previous.town_hall_level != current.town_hall_level {
        events.push(ChangeEvent::TownHallChanged {
            old: previous.town_hall_level,
            new: current.town_hall_level,
        });
    }
    if previous.builder_hall_level != current.builder_hall_level {
        events.push(ChangeEvent::BuilderHallChanged {
            old: previous.builder_hall_level,
            new: current.builder_hall_level,
        });
    }

    achievement_changes(previous, current, &mut events);
    item_changes(previous, current, &mut events);
    donation_changes(entry, previous, current, roster, &mut events);

    events
}

fn role_change(previous: &Player, current: &Player) -> Option<ChangeEvent> {
    // Unrecognized vocabulary on either side suppresses the event entirely.
    let old = previous.clan_role()?;
    let new = current.clan_role()?;
    if old == new {
        return None;
    }
    let direction = match new.hierarchy().cmp(&old.hierarchy()) {
        Ordering::Greater => RoleDirection::Promotion,
        Ordering::Less => RoleDirection::Demotion,
        Ordering::Equal => RoleDirection::Lateral,
    };
    Some(ChangeEvent::RoleChanged { old, new, direction })
}

fn counter_value(player: &Player, field: CounterField) -> u64 {
    match field {
        CounterField::AttackWins => u64::from(player.attack_wins),
        CounterField::DefenseWins => u64::from(player.defense_wins),
        CounterField::WarStars => u64::from(player.war_stars),
        CounterField::CapitalContributions => player.clan_capital_contributions,
    }
}

fn counter_changes(previous: &Player, current: &Player, events: &mut Vec<ChangeEvent>) {
    for field in COUNTERS {
        let old = counter_value(previous, field);
        let new = counter_value(current, field);
        if new > old {
            events.push(ChangeEvent::CounterIncreased {
                field,
                old,
                new,
                delta: new - old,
            });
        }
    }
}

fn trophy_change(previous: &Player, current: &Player, events: &mut Vec<ChangeEvent>) {
    let old = previous.trophies;
    let new = current.trophies;
    match new.cmp(&old) {
        Ordering::Greater => events.push(ChangeEvent::TrophiesGained {
            delta: new - old,
            total: new,
        }),
        Ordering::Less => events.push(ChangeEvent::TrophiesLost {
            delta: old - new,
            total: new,
        }),
        Ordering::Equal => {}
    }
}

fn achievement_changes(previous: &Player, current: &Player, events: &mut Vec<ChangeEvent>) {
    for achievement in &current.achievements {
        let old = previous
            .achievements
            .iter()
            .find(|candidate| candidate.name == achievement.name);
        if let Some(event) = achievement_change(old, achievement) {
            events.push(event);
        }
    }
}

/// At most one event per achievement per cycle. A star gain outranks the
/// completion check, a completion outranks plain progress.
fn achievement_change(old: Option<&Achievement>, new: &Achievement) -> Option<ChangeEvent> {
    let Some(old) = old else {
        // Freshly listed achievements only announce once they carry stars.
        if new.stars > 0 {
            return Some(ChangeEvent::AchievementUnlocked {
                name: new.name.clone(),
                stars: new.stars,
            });
        }
        return None;
    };

    if new.stars > old.stars {
        return Some(ChangeEvent::AchievementUpgraded {
            name: new.name.clone(),
            old_stars: old.stars,
            new_stars: new.stars,
        });
    }
    if new.stars == old.stars && new.value >= new.target && old.value < new.target {
        return Some(ChangeEvent::AchievementCompleted {
            name: new.name.clone(),
            value: new.value,
            target: new.target,
        });
    }
    if new.stars == old.stars && new.value > old.value && new.value < new.target {
        return Some(ChangeEvent::AchievementProgressed {
            name: new.name.clone(),
            old_value: old.value,
            new_value: new.value,
            target: new.target,
        });
    }
    None
}

fn item_changes(previous: &Player, current: &Player, events: &mut Vec<ChangeEvent>) {
    let groups = [
        (ItemKind::Troop, &previous.troops, &current.troops),
        (ItemKind::Spell, &previous.spells, &current.spells),
        (ItemKind::Hero, &previous.heroes, &current.heroes),
        (
            ItemKind::Equipment,
            &previous.hero_equipment,
            &current.hero_equipment,
        ),
    ];
    for (kind, old_items, new_items) in groups {
        for item in new_items {
            // Items appearing for the first time are unlocks, not upgrades.
            let Some(old) = old_items.iter().find(|candidate| candidate.name == item.name) else {
                continue;
            };
            if item.level > old.level {
                events.push(ChangeEvent::ItemUpgraded {
                    kind,
                    name: item.name.clone(),
                    old_level: old.level,
                    new_level: item.level,
                });
            }
        }
    }
}

fn donation_changes(
    entry: &RosterEntry,
    previous: &Player,
    current: &Player,
    roster: &[RosterEntry],
    events: &mut Vec<ChangeEvent>,
) {
    if current.donations > previous.donations {
        let delta = current.donations - previous.donations;
        let pool = sibling_deltas(entry, roster, |player| player.donations_received);
        let (credits, unattributed) = attribute(delta, pool);
        events.push(ChangeEvent::DonationsSent {
            delta,
            total: current.donations,
            credits,
            unattributed,
        });
    }
    if current.donations_received > previous.donations_received {
        let delta = current.donations_received - previous.donations_received;
        let pool = sibling_deltas(entry, roster, |player| player.donations);
        let (credits, unattributed) = attribute(delta, pool);
        events.push(ChangeEvent::DonationsReceived {
            delta,
            total: current.donations_received,
            credits,
            unattributed,
        });
    }
}

/// Positive deltas of a counter across all other roster entries that have
/// both snapshots this cycle, in roster order.
fn sibling_deltas(
    entry: &RosterEntry,
    roster: &[RosterEntry],
    counter: impl Fn(&Player) -> u32,
) -> Vec<(UserId, String, u32)> {
    roster
        .iter()
        .filter(|sibling| sibling.user_id != entry.user_id)
        .filter_map(|sibling| {
            let previous = sibling.previous.as_ref()?;
            let delta = counter(&sibling.current).checked_sub(counter(previous))?;
            (delta > 0).then(|| (sibling.user_id, sibling.current.name.clone(), delta))
        })
        .collect()
}

/// Best effort attribution of an aggregate delta to sibling deltas.
///
/// The upstream API only exposes per player totals, it never pairs a
/// donation with its recipient. When the sibling deltas sum exactly to the
/// observed delta the pairing is unambiguous and attributed in full.
/// Anything else degrades to greedy lower bound credits, largest sibling
/// delta first, plus an explicit unattributed remainder. Siblings with equal
/// deltas are indistinguishable and credited in roster order.
fn attribute(delta: u32, mut pool: Vec<(UserId, String, u32)>) -> (Vec<DonationCredit>, u32) {
    let total: u32 = pool.iter().map(|(_, _, amount)| amount).sum();
    if total == delta {
        let credits = pool
            .into_iter()
            .map(|(user_id, player_name, amount)| DonationCredit {
                user_id,
                player_name,
                amount,
                at_least: false,
            })
            .collect();
        return (credits, 0);
    }

    // Stable sort keeps roster order between equal deltas.
    pool.sort_by(|a, b| b.2.cmp(&a.2));
    let mut remaining = delta;
    let mut credits = Vec::new();
    for (user_id, player_name, amount) in pool {
        if remaining == 0 {
            break;
        }
        let credited = amount.min(remaining);
        credits.push(DonationCredit {
            user_id,
            player_name,
            amount: credited,
            at_least: true,
        });
        remaining -= credited;
    }
    (credits, remaining)
}
