//! Typed view of the player payload served by the Clash of Clans API.

use serde::{Deserialize, Serialize};

use crate::{ClanRole, PlayerTag};

/// One point in time record of a player's public profile.
///
/// Parsed straight from the API body and persisted as JSON between polling
/// cycles. Unknown upstream fields are ignored, enum like string fields are
/// kept raw so new upstream values survive a round trip through storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub tag: PlayerTag,
    pub name: String,
    /// Clan role as spelled by the API, absent for clanless players.
    #[serde(default)]
    pub role: Option<String>,
    /// "in" or "out", absent for clanless players.
    #[serde(default)]
    pub war_preference: Option<String>,
    pub trophies: u32,
    pub best_trophies: u32,
    pub attack_wins: u32,
    pub defense_wins: u32,
    pub donations: u32,
    pub donations_received: u32,
    pub war_stars: u32,
    #[serde(default)]
    pub clan_capital_contributions: u64,
    pub town_hall_level: u32,
    /// Absent until the player unlocks the builder base.
    #[serde(default)]
    pub builder_hall_level: Option<u32>,
    #[serde(default)]
    pub clan: Option<ClanInfo>,
    #[serde(default)]
    pub league: Option<League>,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
    #[serde(default)]
    pub troops: Vec<UnitLevel>,
    #[serde(default)]
    pub spells: Vec<UnitLevel>,
    #[serde(default)]
    pub heroes: Vec<UnitLevel>,
    #[serde(default)]
    pub hero_equipment: Vec<UnitLevel>,
}

impl Player {
    /// Clan role mapped onto the known ladder, `None` for clanless players
    /// and unrecognized vocabulary.
    pub fn clan_role(&self) -> Option<ClanRole> {
        self.role.as_deref().and_then(ClanRole::from_api)
    }

    pub fn league_name(&self) -> Option<&str> {
        self.league.as_ref().map(|league| league.name.as_str())
    }

    pub fn clan_name(&self) -> Option<&str> {
        self.clan.as_ref().map(|clan| clan.name.as_str())
    }
}

/// Clan summary embedded in a player payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClanInfo {
    pub tag: PlayerTag,
    pub name: String,
}

/// League placement embedded in a player payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct League {
    pub name: String,
}

/// Progress entry for one achievement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub name: String,
    pub stars: u32,
    pub value: i64,
    pub target: i64,
}

/// Level entry for one troop, spell, hero or equipment piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitLevel {
    pub name: String,
    pub level: u32,
    pub max_level: u32,
}
