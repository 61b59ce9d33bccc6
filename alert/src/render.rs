//! Embed rendering for change announcements and kick summaries.

use clashtrack_shared::{
    PlayerTag,
    diff::RosterEntry,
    events::{ChangeEvent, CounterField, DonationCredit, ItemKind, KickSummary, RoleDirection},
};
use poise::serenity_prelude::{Colour, CreateEmbedAuthor, CreateEmbedFooter, UserId};

use crate::{Alert, AlertCreationError, TryIntoAlert};

const ACTIVITY_COLOUR: Colour = Colour::new(0x00_96_88);
const KICK_COLOUR: Colour = Colour::new(0xc0_39_2b);

/// Discord rejects embed descriptions longer than this.
const DESCRIPTION_LIMIT: usize = 4096;

/// Everything needed to announce one member's detected changes.
#[derive(Debug, Clone)]
pub struct MemberActivity {
    pub user_id: UserId,
    pub player_name: String,
    pub player_tag: PlayerTag,
    pub events: Vec<ChangeEvent>,
}

impl MemberActivity {
    pub fn new(entry: &RosterEntry, events: Vec<ChangeEvent>) -> Self {
        Self {
            user_id: entry.user_id,
            player_name: entry.current.name.clone(),
            player_tag: entry.current.tag.clone(),
            events,
        }
    }
}

impl TryIntoAlert for MemberActivity {
    fn try_into_alert(&self) -> Result<Alert, AlertCreationError> {
        if self.events.is_empty() {
            return Err(AlertCreationError::EmptyChangeSet {
                tag: self.player_tag.to_string(),
            });
        }

        let lines: Vec<String> = self.events.iter().map(event_line).collect();
        let description = clamp_description(lines.join("\n"));

        Ok(Alert::new()
            .author(CreateEmbedAuthor::new(self.player_name.clone()))
            .description(description)
            .footer(CreateEmbedFooter::new(format!(
                "{} | {}",
                self.player_tag, self.user_id
            )))
            .colour(ACTIVITY_COLOUR))
    }
}

impl TryIntoAlert for KickSummary {
    fn try_into_alert(&self) -> Result<Alert, AlertCreationError> {
        if self.is_empty() {
            return Err(AlertCreationError::EmptyKickSummary);
        }

        let mut lines = Vec::new();
        for kick in &self.kicked {
            let detail = match &kick.found_clan {
                Some(clan) => format!("found in {clan}"),
                None => "not in any clan".to_string(),
            };
            lines.push(format!(
                "**👢 Removed {} ({})**\n-# **{}**",
                kick.player_name, kick.tag, detail
            ));
        }
        for failure in &self.failed {
            lines.push(format!(
                "**⚠️ Could not remove <@{}>**\n-# **{}**",
                failure.user_id, failure.reason
            ));
        }

        Ok(Alert::new()
            .title("Clan membership enforcement")
            .description(clamp_description(lines.join("\n")))
            .colour(KICK_COLOUR))
    }
}

fn clamp_description(mut description: String) -> String {
    if description.len() > DESCRIPTION_LIMIT {
        let mut cut = DESCRIPTION_LIMIT - '…'.len_utf8();
        while !description.is_char_boundary(cut) {
            cut -= 1;
        }
        description.truncate(cut);
        description.push('…');
    }
    description
}

fn plural(count: impl Into<u64>) -> &'static str {
    if count.into() == 1 { "" } else { "s" }
}

fn event_line(event: &ChangeEvent) -> String {
    match event {
        ChangeEvent::RoleChanged {
            old,
            new,
            direction,
        } => match direction {
            RoleDirection::Promotion => {
                format!("**👑 Promoted to {new}**\n-# **was {old}**")
            }
            RoleDirection::Demotion => {
                format!("**🪶 Demoted to {new}**\n-# **was {old}**")
            }
            RoleDirection::Lateral => format!("**👑 Clan role changed to {new}**"),
        },
        ChangeEvent::CounterIncreased {
            field, new, delta, ..
        } => counter_line(*field, *new, *delta),
        ChangeEvent::TrophiesGained { delta, total } => {
            format!("**📈 Gained {delta} trophies**\n-# **{total} trophies now**")
        }
        ChangeEvent::TrophiesLost { delta, total } => {
            format!("**📉 Lost {delta} trophies**\n-# **{total} trophies now**")
        }
        ChangeEvent::LeagueChanged { old, new } => match (old, new) {
            (_, Some(new)) => format!("**🏅 New league: {new}**"),
            (Some(old), None) => format!("**🏅 Dropped out of {old}**"),
            (None, None) => "**🏅 League changed**".to_string(),
        },
        ChangeEvent::ClanChanged { old, new } => match (old, new) {
            (_, Some(new)) => format!("**🏠 Now in clan {new}**"),
            (Some(old), None) => format!("**🏠 Left clan {old}**"),
            (None, None) => "**🏠 Clan changed**".to_string(),
        },
        ChangeEvent::NameChanged { old, new } => {
            format!("**📝 Name changed to {new}**\n-# **was {old}**")
        }
        ChangeEvent::WarPreferenceChanged { new, .. } => match new.as_deref() {
            Some("in") => "**⚔️ Opted in for clan wars**".to_string(),
            Some("out") => "**🕊️ Opted out of clan wars**".to_string(),
            Some(other) => format!("**⚔️ War preference changed to {other}**"),
            None => "**⚔️ War preference cleared**".to_string(),
        },
        ChangeEvent::TownHallChanged { old, new } => {
            if new > old {
                format!("**🏰 Town Hall upgraded to level {new}**")
            } else {
                format!("**🏰 Town Hall level changed to {new}**")
            }
        }
        ChangeEvent::BuilderHallChanged { old, new } => match (old, new) {
            (Some(old), Some(new)) if new > old => {
                format!("**🏚️ Builder Hall upgraded to level {new}**")
            }
            (_, Some(new)) => format!("**🏚️ Builder Hall now level {new}**"),
            (_, None) => "**🏚️ Builder Hall level no longer reported**".to_string(),
        },
        ChangeEvent::AchievementUnlocked { name, stars } => {
            format!(
                "**🎉 Achievement unlocked: {name}**\n-# **{stars} star{}**",
                plural(*stars)
            )
        }
        ChangeEvent::AchievementUpgraded {
            name, new_stars, ..
        } => {
            format!(
                "**🎖️ Achievement upgraded: {name}**\n-# **now {new_stars} star{}**",
                plural(*new_stars)
            )
        }
        ChangeEvent::AchievementCompleted { name, target, .. } => {
            format!("**🎖️ Achievement completed: {name}**\n-# **reached {target}**")
        }
        ChangeEvent::AchievementProgressed {
            name,
            new_value,
            target,
            ..
        } => {
            format!("**📊 Achievement progress: {name}**\n-# **{new_value} / {target}**")
        }
        ChangeEvent::ItemUpgraded {
            kind,
            name,
            new_level,
            ..
        } => {
            let emoji = match kind {
                ItemKind::Troop => "🪖",
                ItemKind::Spell => "🧪",
                ItemKind::Hero => "🦸",
                ItemKind::Equipment => "⚙️",
            };
            format!("**{emoji} {name} upgraded to level {new_level}**")
        }
        ChangeEvent::DonationsSent {
            delta,
            total,
            credits,
            unattributed,
        } => {
            let mut line = format!(
                "**📤 Donated {delta} troop{}**\n-# **{total} donations this season**",
                plural(*delta)
            );
            for credit in credits {
                line.push('\n');
                line.push_str(&credit_line(credit, "received"));
            }
            if *unattributed > 0 {
                line.push_str(&format!(
                    "\n-# {unattributed} donation{} with unknown recipients",
                    plural(*unattributed)
                ));
            }
            line
        }
        ChangeEvent::DonationsReceived {
            delta,
            total,
            credits,
            unattributed,
        } => {
            let mut line = format!(
                "**📥 Received {delta} troop{}**\n-# **{total} received this season**",
                plural(*delta)
            );
            for credit in credits {
                line.push('\n');
                line.push_str(&credit_line(credit, "sent"));
            }
            if *unattributed > 0 {
                line.push_str(&format!(
                    "\n-# {unattributed} donation{} from unknown senders",
                    plural(*unattributed)
                ));
            }
            line
        }
    }
}

fn counter_line(field: CounterField, new: u64, delta: u64) -> String {
    match field {
        CounterField::AttackWins => format!(
            "**🏆 Won {delta} attack{}**\n-# **{new} attacks won**",
            plural(delta)
        ),
        CounterField::DefenseWins => format!(
            "**🛡️ Won {delta} defense{}**\n-# **{new} defenses won**",
            plural(delta)
        ),
        CounterField::WarStars => format!(
            "**⭐ Earned {delta} war star{}**\n-# **{new} war stars total**",
            plural(delta)
        ),
        CounterField::CapitalContributions => format!(
            "**🏛️ Contributed {delta} to the Clan Capital**\n-# **{new} total contributions**"
        ),
    }
}

fn credit_line(credit: &DonationCredit, verb: &str) -> String {
    if credit.at_least {
        format!(
            "-# **{}** {verb} at least {}",
            credit.player_name, credit.amount
        )
    } else {
        format!("-# **{}** {verb} {}", credit.player_name, credit.amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clashtrack_shared::{
        ClanRole,
        events::{KickFailure, KickOutcome},
    };

    fn activity(events: Vec<ChangeEvent>) -> MemberActivity {
        MemberActivity {
            user_id: UserId::new(42),
            player_name: "Ana".into(),
            player_tag: PlayerTag::parse("#P1").unwrap(),
            events,
        }
    }

    fn description_of(alert: &Alert) -> String {
        let value = serde_json::to_value(alert).unwrap();
        value["description"].as_str().unwrap().to_string()
    }

    #[test]
    fn empty_change_set_refuses_to_render() {
        let err = activity(vec![]).try_into_alert().unwrap_err();
        assert!(matches!(err, AlertCreationError::EmptyChangeSet { .. }));
    }

    #[test]
    fn activity_embed_carries_name_tag_and_user() {
        let alert = activity(vec![ChangeEvent::TrophiesGained {
            delta: 31,
            total: 5031,
        }])
        .try_into_alert()
        .unwrap();

        let value = serde_json::to_value(&alert).unwrap();
        assert_eq!(value["author"]["name"], "Ana");
        assert_eq!(value["footer"]["text"], "#P1 | 42");
        assert!(description_of(&alert).contains("Gained 31 trophies"));
    }

    #[test]
    fn promotion_line_shows_both_roles() {
        let alert = activity(vec![ChangeEvent::RoleChanged {
            old: ClanRole::Member,
            new: ClanRole::CoLeader,
            direction: RoleDirection::Promotion,
        }])
        .try_into_alert()
        .unwrap();

        let description = description_of(&alert);
        assert!(description.contains("Promoted to Co-Leader"));
        assert!(description.contains("was Member"));
    }

    #[test]
    fn singular_counters_drop_the_plural_s() {
        let alert = activity(vec![ChangeEvent::CounterIncreased {
            field: CounterField::AttackWins,
            old: 10,
            new: 11,
            delta: 1,
        }])
        .try_into_alert()
        .unwrap();

        let description = description_of(&alert);
        assert!(description.contains("Won 1 attack**"));
        assert!(!description.contains("Won 1 attacks"));
    }

    #[test]
    fn donation_credits_render_with_lower_bound_marker() {
        let alert = activity(vec![ChangeEvent::DonationsSent {
            delta: 10,
            total: 110,
            credits: vec![
                DonationCredit {
                    user_id: UserId::new(2),
                    player_name: "Bob".into(),
                    amount: 6,
                    at_least: true,
                },
                DonationCredit {
                    user_id: UserId::new(3),
                    player_name: "Cid".into(),
                    amount: 4,
                    at_least: false,
                },
            ],
            unattributed: 0,
        }])
        .try_into_alert()
        .unwrap();

        let description = description_of(&alert);
        assert!(description.contains("**Bob** received at least 6"));
        assert!(description.contains("**Cid** received 4"));
    }

    #[test]
    fn unattributed_remainder_is_called_out() {
        let alert = activity(vec![ChangeEvent::DonationsSent {
            delta: 10,
            total: 110,
            credits: vec![],
            unattributed: 10,
        }])
        .try_into_alert()
        .unwrap();

        assert!(description_of(&alert).contains("10 donations with unknown recipients"));
    }

    #[test]
    fn overlong_descriptions_are_clamped() {
        let events = (0..600)
            .map(|i| ChangeEvent::TrophiesGained {
                delta: i + 1,
                total: 5000,
            })
            .collect();
        let alert = activity(events).try_into_alert().unwrap();

        let description = description_of(&alert);
        assert!(description.len() <= DESCRIPTION_LIMIT);
        assert!(description.ends_with('…'));
    }

    #[test]
    fn kick_summary_lists_removals_and_failures() {
        let summary = KickSummary {
            kicked: vec![KickOutcome {
                user_id: UserId::new(7),
                player_name: "Ana".into(),
                tag: PlayerTag::parse("#P1").unwrap(),
                found_clan: Some("Rival Clan".into()),
            }],
            failed: vec![KickFailure {
                user_id: UserId::new(8),
                reason: "Missing Permissions".into(),
            }],
        };

        let alert = summary.try_into_alert().unwrap();
        let description = description_of(&alert);
        assert!(description.contains("Removed Ana (#P1)"));
        assert!(description.contains("found in Rival Clan"));
        assert!(description.contains("<@8>"));
        assert!(description.contains("Missing Permissions"));
    }

    #[test]
    fn empty_kick_summary_refuses_to_render() {
        let err = KickSummary::default().try_into_alert().unwrap_err();
        assert!(matches!(err, AlertCreationError::EmptyKickSummary));
    }
}
