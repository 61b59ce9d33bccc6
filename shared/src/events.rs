//! Semantic change events produced by the snapshot diff engine, plus the
//! outcome types reported by the membership enforcer.

use poise::serenity_prelude::UserId;

use crate::{ClanRole, PlayerTag};

/// Monotonic counters compared between snapshots. Decreases, typically
/// seasonal resets, are never reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterField {
    AttackWins,
    DefenseWins,
    WarStars,
    CapitalContributions,
}

/// Direction of a clan role transition on the promotion ladder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleDirection {
    Promotion,
    Demotion,
    Lateral,
}

/// Upgradeable item categories, in announcement order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Troop,
    Spell,
    Hero,
    Equipment,
}

/// One tracked sibling credited with part of a donation delta.
#[derive(Debug, Clone, PartialEq)]
pub struct DonationCredit {
    pub user_id: UserId,
    pub player_name: String,
    pub amount: u32,
    /// Set when attribution was ambiguous and `amount` is a lower bound.
    pub at_least: bool,
}

/// One semantic difference between two consecutive snapshots of a player.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent {
    RoleChanged {
        old: ClanRole,
        new: ClanRole,
        direction: RoleDirection,
    },
    CounterIncreased {
        field: CounterField,
        old: u64,
        new: u64,
        delta: u64,
    },
    TrophiesGained {
        delta: u32,
        total: u32,
    },
    TrophiesLost {
        delta: u32,
        total: u32,
    },
    LeagueChanged {
        old: Option<String>,
        new: Option<String>,
    },
    ClanChanged {
        old: Option<String>,
        new: Option<String>,
    },
    NameChanged {
        old: String,
        new: String,
    },
    WarPreferenceChanged {
        old: Option<String>,
        new: Option<String>,
    },
    TownHallChanged {
        old: u32,
        new: u32,
    },
    BuilderHallChanged {
        old: Option<u32>,
        new: Option<u32>,
    },
    AchievementUnlocked {
        name: String,
        stars: u32,
    },
    AchievementUpgraded {
        name: String,
        old_stars: u32,
        new_stars: u32,
    },
    AchievementCompleted {
        name: String,
        value: i64,
        target: i64,
    },
    AchievementProgressed {
        name: String,
        old_value: i64,
        new_value: i64,
        target: i64,
    },
    ItemUpgraded {
        kind: ItemKind,
        name: String,
        old_level: u32,
        new_level: u32,
    },
    DonationsSent {
        delta: u32,
        total: u32,
        credits: Vec<DonationCredit>,
        unattributed: u32,
    },
    DonationsReceived {
        delta: u32,
        total: u32,
        credits: Vec<DonationCredit>,
        unattributed: u32,
    },
}

/// One successful removal performed by the membership enforcer.
#[derive(Debug, Clone, PartialEq)]
pub struct KickOutcome {
    pub user_id: UserId,
    pub player_name: String,
    pub tag: PlayerTag,
    /// Clan the player was found in instead, if any.
    pub found_clan: Option<String>,
}

/// One removal attempt the platform rejected.
#[derive(Debug, Clone, PartialEq)]
pub struct KickFailure {
    pub user_id: UserId,
    pub reason: String,
}

/// Result of one enforcement pass over a guild.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KickSummary {
    pub kicked: Vec<KickOutcome>,
    pub failed: Vec<KickFailure>,
}

impl KickSummary {
    pub fn is_empty(&self) -> bool {
        self.kicked.is_empty() && self.failed.is_empty()
    }
}
