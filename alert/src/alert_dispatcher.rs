use std::sync::Arc;

use clashtrack_shared::traits::GuildPolicySource;
use poise::serenity_prelude::{ChannelId, CreateMessage, GuildId, Http};
use tracing::{error, warn};

use super::*;
use message_sender::MessageSender;

/// An AlertDispatcher which uses a discord Http client to send alerts.
pub type DiscordAlertDispatcher<C> = AlertDispatcher<Arc<Http>, C>;

/// Delivers rendered alerts to the log channel configured for a guild.
#[derive(Debug, Clone, Copy)]
pub struct AlertDispatcher<S, C> {
    sender: S,
    policies: C,
}

impl<S, C> AlertDispatcher<S, C>
where
    S: MessageSender,
    C: GuildPolicySource + Send + Sync,
{
    /// Create a new dispatcher using the given message sender and policy source.
    pub fn new(sender: S, policies: C) -> Self {
        Self { sender, policies }
    }

    /// Send one alert to the guild's configured log channel, best effort.
    /// Guilds without a log channel silently swallow the alert.
    pub async fn dispatch_alert<T>(&self, guild_id: GuildId, source: &T)
    where
        T: TryIntoAlert + Send + Sync,
    {
        let alert = match source.try_into_alert() {
            Ok(alert) => alert,
            Err(reason) => {
                error!("failed to build alert: {}", reason);
                return;
            }
        };

        let Some(channel_id) = self.log_channel(guild_id).await else {
            warn!("guild {} has no log channel, skipping alert", guild_id);
            return;
        };

        if let Err(e) = self
            .sender
            .send_message(channel_id, CreateMessage::new().embed(alert))
            .await
        {
            error!("failed to send message: {}", e)
        }
    }

    async fn log_channel(&self, guild_id: GuildId) -> Option<ChannelId> {
        match self.policies.get_policy(guild_id).await {
            Ok(policy) => policy.log_channel,
            Err(e) => {
                error!("DB error while reading guild policy: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use clashtrack_shared::{
        ClanRole, GuildPolicy, PlayerTag,
        events::ChangeEvent,
        traits::StoreError,
    };
    use poise::serenity_prelude::{self as serenity, RoleId, UserId};
    use std::sync::{Arc, Mutex};

    struct DummySender {
        pub sent: Arc<Mutex<Vec<(ChannelId, String)>>>,
        pub fail: bool,
    }

    #[async_trait]
    impl MessageSender for DummySender {
        async fn send_message(
            &self,
            channel_id: ChannelId,
            msg: CreateMessage,
        ) -> serenity::Result<()> {
            if self.fail {
                return Err(serenity::Error::Other("fail"));
            }
            let data = serde_json::to_string(&msg).unwrap();
            self.sent.lock().unwrap().push((channel_id, data));
            Ok(())
        }
    }

    struct DummyPolicies {
        pub log_channel: Option<ChannelId>,
    }

    #[async_trait]
    impl GuildPolicySource for DummyPolicies {
        async fn get_policy(&self, _guild_id: GuildId) -> Result<GuildPolicy, StoreError> {
            Ok(GuildPolicy {
                log_channel: self.log_channel,
                ..Default::default()
            })
        }

        async fn set_clan_tag(
            &self,
            _guild_id: GuildId,
            _tag: PlayerTag,
        ) -> Result<(), StoreError> {
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

        async fn set_nickname_sync(
            &self,
            _guild_id: GuildId,
            _enabled: bool,
        ) -> Result<(), StoreError> {
            Ok(())
        }

        async fn tracked_guilds(&self) -> Result<Vec<GuildId>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn sample_activity() -> MemberActivity {
        MemberActivity {
            user_id: UserId::new(42),
            player_name: "Ana".into(),
            player_tag: PlayerTag::parse("#P1").unwrap(),
            events: vec![ChangeEvent::TrophiesGained {
                delta: 10,
                total: 4010,
            }],
        }
    }

    fn dummy_sender() -> DummySender {
        DummySender {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    #[tokio::test]
    async fn dispatch_sends_to_the_configured_channel() {
        let policies = DummyPolicies {
            log_channel: Some(ChannelId::new(10)),
        };
        let dispatcher = AlertDispatcher::new(dummy_sender(), policies);

        dispatcher
            .dispatch_alert(GuildId::new(1), &sample_activity())
            .await;

        let sent = dispatcher.sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, ChannelId::new(10));
        assert!(sent[0].1.contains("Gained 10 trophies"));
    }

    #[tokio::test]
    async fn dispatch_skips_guilds_without_a_channel() {
        let policies = DummyPolicies { log_channel: None };
        let dispatcher = AlertDispatcher::new(dummy_sender(), policies);

        dispatcher
            .dispatch_alert(GuildId::new(1), &sample_activity())
            .await;

        assert!(dispatcher.sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dispatch_swallows_sender_failures() {
        let policies = DummyPolicies {
            log_channel: Some(ChannelId::new(10)),
        };
        let sender = DummySender {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        };
        let dispatcher = AlertDispatcher::new(sender, policies);

        // Must not panic, the error is logged and dropped.
        dispatcher
            .dispatch_alert(GuildId::new(1), &sample_activity())
            .await;

        assert!(dispatcher.sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dispatch_drops_unbuildable_alerts() {
        let policies = DummyPolicies {
            log_channel: Some(ChannelId::new(10)),
        };
        let dispatcher = AlertDispatcher::new(dummy_sender(), policies);

        let empty = MemberActivity {
            events: vec![],
            ..sample_activity()
        };
        dispatcher.dispatch_alert(GuildId::new(1), &empty).await;

        assert!(dispatcher.sender.sent.lock().unwrap().is_empty());
    }
}
