use std::fmt;

use poise::serenity_prelude::{ChannelId, RoleId, UserId};
use serde::{Deserialize, Serialize};

pub mod diff;
pub mod errors;
pub mod events;
pub mod player;
pub mod traits;

pub use errors::TagError;
pub use player::Player;

/// A normalized Clash of Clans tag, stored uppercase with a leading `#`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerTag(String);

impl PlayerTag {
    /// Parse user supplied input. A leading `#` is optional, the rest is
    /// uppercased and must be alphanumeric.
    pub fn parse(input: &str) -> Result<Self, TagError> {
        let trimmed = input.trim();
        let body = trimmed.strip_prefix('#').unwrap_or(trimmed).to_uppercase();
        if body.is_empty() {
            return Err(TagError::Empty);
        }
        if !body.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(TagError::InvalidCharacters(trimmed.to_string()));
        }
        Ok(Self(format!("#{body}")))
    }

    /// Normalize a value coming from the API or from storage. Upstream data
    /// is trusted to be a tag, so this never fails.
    pub fn from_raw(raw: &str) -> Self {
        let body = raw.trim().trim_start_matches('#').to_uppercase();
        Self(format!("#{body}"))
    }

    /// Percent encoded form used in request paths, `#` becomes `%23`.
    pub fn api_encoded(&self) -> String {
        urlencoding::encode(&self.0).into_owned()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for PlayerTag {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for PlayerTag {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_raw(&raw))
    }
}

/// In game clan role, ordered from lowest to highest rank.
///
/// The upstream API spells elder as `admin` and keeps `coleader` unhyphenated,
/// see [`ClanRole::from_api`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, poise::ChoiceParameter)]
pub enum ClanRole {
    Member,
    Elder,
    #[name = "Co-Leader"]
    CoLeader,
    Leader,
}

impl ClanRole {
    /// Map the upstream API vocabulary onto the ladder. Unknown words map to
    /// `None` so new upstream roles never get misclassified.
    pub fn from_api(raw: &str) -> Option<Self> {
        match raw.to_lowercase().as_str() {
            "member" => Some(Self::Member),
            "admin" => Some(Self::Elder),
            "coleader" => Some(Self::CoLeader),
            "leader" => Some(Self::Leader),
            _ => None,
        }
    }

    /// Position on the promotion ladder, lowest first.
    pub fn hierarchy(&self) -> u8 {
        match self {
            Self::Member => 0,
            Self::Elder => 1,
            Self::CoLeader => 2,
            Self::Leader => 3,
        }
    }
}

impl fmt::Display for ClanRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Member => "Member",
            Self::Elder => "Elder",
            Self::CoLeader => "Co-Leader",
            Self::Leader => "Leader",
        };
        write!(f, "{label}")
    }
}

/// A Discord user bound to a Clash of Clans account.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedMember {
    pub user_id: UserId,
    pub tag: PlayerTag,
    /// Whether ownership was proven with an in game API token.
    pub verified: bool,
    /// Snapshot stored at the end of the last completed cycle, if any.
    pub last_snapshot: Option<Player>,
}

/// Per guild configuration driving tracking, announcements and enforcement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GuildPolicy {
    pub clan_tag: Option<PlayerTag>,
    pub log_channel: Option<ChannelId>,
    pub role_member: Option<RoleId>,
    pub role_elder: Option<RoleId>,
    pub role_co_leader: Option<RoleId>,
    pub role_leader: Option<RoleId>,
    pub autokick: bool,
    pub nickname_sync: bool,
}

impl GuildPolicy {
    /// Discord role mapped to the given in game role, when configured.
    pub fn role_for(&self, role: ClanRole) -> Option<RoleId> {
        match role {
            ClanRole::Member => self.role_member,
            ClanRole::Elder => self.role_elder,
            ClanRole::CoLeader => self.role_co_leader,
            ClanRole::Leader => self.role_leader,
        }
    }

    /// Every Discord role the synchronizer is allowed to touch.
    pub fn managed_roles(&self) -> Vec<RoleId> {
        let mut roles: Vec<RoleId> = [
            self.role_member,
            self.role_elder,
            self.role_co_leader,
            self.role_leader,
        ]
        .into_iter()
        .flatten()
        .collect();
        roles.sort_unstable();
        roles.dedup();
        roles
    }

    /// Whether the player currently belongs to the guild's configured clan.
    pub fn is_home_clan(&self, player: &Player) -> bool {
        match (&self.clan_tag, player.clan.as_ref()) {
            (Some(want), Some(clan)) => clan.tag == *want,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_parse_normalizes_input() {
        assert_eq!(PlayerTag::parse("#abc123").unwrap().as_str(), "#ABC123");
        assert_eq!(PlayerTag::parse("abc123").unwrap().as_str(), "#ABC123");
        assert_eq!(PlayerTag::parse("  #9qR8 ").unwrap().as_str(), "#9QR8");
    }

    #[test]
    fn tag_parse_rejects_garbage() {
        assert_eq!(PlayerTag::parse(""), Err(TagError::Empty));
        assert_eq!(PlayerTag::parse("#"), Err(TagError::Empty));
        assert!(matches!(
            PlayerTag::parse("#AB C"),
            Err(TagError::InvalidCharacters(_))
        ));
        assert!(matches!(
            PlayerTag::parse("#AB-C"),
            Err(TagError::InvalidCharacters(_))
        ));
    }

    #[test]
    fn tag_api_encoding_escapes_the_hash() {
        let tag = PlayerTag::parse("#abc123").unwrap();
        assert_eq!(tag.api_encoded(), "%23ABC123");
    }

    #[test]
    fn tag_from_raw_accepts_anything() {
        assert_eq!(PlayerTag::from_raw("#qqq").as_str(), "#QQQ");
        assert_eq!(PlayerTag::from_raw("qqq").as_str(), "#QQQ");
    }

    #[test]
    fn role_maps_the_api_vocabulary() {
        assert_eq!(ClanRole::from_api("member"), Some(ClanRole::Member));
        assert_eq!(ClanRole::from_api("admin"), Some(ClanRole::Elder));
        assert_eq!(ClanRole::from_api("coLeader"), Some(ClanRole::CoLeader));
        assert_eq!(ClanRole::from_api("LEADER"), Some(ClanRole::Leader));
        assert_eq!(ClanRole::from_api("elder"), None);
        assert_eq!(ClanRole::from_api("governor"), None);
    }

    #[test]
    fn role_hierarchy_is_strictly_increasing() {
        assert!(ClanRole::Member.hierarchy() < ClanRole::Elder.hierarchy());
        assert!(ClanRole::Elder.hierarchy() < ClanRole::CoLeader.hierarchy());
        assert!(ClanRole::CoLeader.hierarchy() < ClanRole::Leader.hierarchy());
    }

    #[test]
    fn managed_roles_skips_unset_and_duplicate_mappings() {
        let policy = GuildPolicy {
            role_member: Some(RoleId::new(10)),
            role_elder: Some(RoleId::new(10)),
            role_leader: Some(RoleId::new(30)),
            ..Default::default()
        };
        assert_eq!(
            policy.managed_roles(),
            vec![RoleId::new(10), RoleId::new(30)]
        );
    }
}
