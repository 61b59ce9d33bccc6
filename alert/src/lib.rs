//! Alert building and dispatching for tracked clan members.
//!
//! Domain payloads implement [`TryIntoAlert`] to render themselves as Discord
//! embeds, and [`AlertDispatcher`] delivers them to the log channel each
//! guild configured.

use poise::serenity_prelude::CreateEmbed;
use thiserror::Error;

mod alert_dispatcher;
mod message_sender;
pub mod render;

pub use alert_dispatcher::{AlertDispatcher, DiscordAlertDispatcher};
pub use message_sender::MessageSender;
pub use render::MemberActivity;

#[derive(Error, Debug)]
pub enum AlertCreationError {
    #[error("No change event to announce for {tag}.")]
    EmptyChangeSet { tag: String },
    #[error("The kick summary contains no outcome to announce.")]
    EmptyKickSummary,
}

pub type Alert = CreateEmbed;

pub trait TryIntoAlert {
    fn try_into_alert(&self) -> Result<Alert, AlertCreationError>;
}
