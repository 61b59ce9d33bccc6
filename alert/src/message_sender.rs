//! Message delivery seam between the dispatcher and Discord.

use std::sync::Arc;

use async_trait::async_trait;
use poise::serenity_prelude::{self as serenity, ChannelId, CreateMessage};

/// A way to push a message, usually one carrying an alert embed, into a
/// channel. Tests swap in a recording implementation.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_message(&self, channel_id: ChannelId, msg: CreateMessage)
    -> serenity::Result<()>;
}

#[async_trait]
impl MessageSender for Arc<serenity::Http> {
    async fn send_message(
        &self,
        channel_id: ChannelId,
        msg: CreateMessage,
    ) -> serenity::Result<()> {
        channel_id.send_message(self, msg).await.map(|_| ())
    }
}
