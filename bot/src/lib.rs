use std::{env, sync::Arc, time::Duration};

use clashtrack_db::SharedDatabase;
use clashtrack_shared::traits::api::PlayerApi;
use commands::{
    force_autokick, link, linked, set_autokick, set_clan_role, set_clan_tag, set_log_channel,
    set_nickname_sync, settings, unlink,
};
use poise::serenity_prelude as serenity;
use serenity::*;
use tracing::{error, info};

use handler::event_handler;

mod commands;
mod handler;

// Types used by all command functions
type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

pub struct DiscordBot {
    pub client: Client,
}

impl DiscordBot {
    pub async fn new(db: SharedDatabase, api: Arc<dyn PlayerApi>, fetch_delay: Duration) -> Self {
        let token =
            env::var("DISCORD_BOT_TOKEN").expect("Expected a discord bot token in the environment");
        let intents = GatewayIntents::non_privileged();
        let framework = poise::Framework::builder()
            .options(poise::FrameworkOptions {
                commands: vec![
                    link(),
                    unlink(),
                    linked(),
                    set_clan_tag(),
                    set_log_channel(),
                    set_clan_role(),
                    set_autokick(),
                    set_nickname_sync(),
                    settings(),
                    force_autokick(),
                ],
                event_handler: |ctx, event, framework, _| {
                    Box::pin(event_handler(ctx, event, framework))
                },
                ..Default::default()
            })
            .setup(move |ctx, _ready, framework| {
                Box::pin(async move {
                    poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                    Ok(Data {
                        db,
                        api,
                        fetch_delay,
                    })
                })
            })
            .build();
        let client_builder = ClientBuilder::new(token, intents).framework(framework);

        info!("🤖 [DISCORD] initializing bot");
        let client = client_builder
            .await
            .expect("Discord client creation should success.");

        Self { client }
    }

    pub fn start(self) -> tokio::task::JoinHandle<Result<(), serenity::Error>> {
        tokio::spawn(async move { self.run().await })
    }

    async fn run(mut self) -> Result<(), serenity::Error> {
        info!("🌐 [DISCORD] connecting to gateway");
        if let Err(why) = self.client.start().await {
            error!("❌ [DISCORD] connection failed: {why:?}");
            return Err(why);
        }

        Ok(())
    }
}

// Custom user data passed to all command functions
#[derive(Debug)]
pub struct Data {
    db: SharedDatabase,
    api: Arc<dyn PlayerApi>,
    fetch_delay: Duration,
}
