use std::sync::Arc;

use clashtrack_alert::AlertDispatcher;
use clashtrack_bot::DiscordBot;
use clashtrack_coc_api::CocApiClient;
use clashtrack_db::SharedDatabase;
use clashtrack_shared::traits::api::PlayerApi;
use clashtrack_tracker::{
    AutokickEnforcer, ClanTracker, CycleKind, Scheduler, gateway::MemberGateway,
};
use config::Config;
use tracing::{error, info};

mod config;
mod error;
mod logging;

#[tokio::main]
async fn main() {
    logging::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(why) => {
            error!("❌ invalid configuration: {why}");
            std::process::exit(1);
        }
    };

    info!("⚔️ starting clashtrack");

    let db = match SharedDatabase::new_from_env() {
        Ok(db) => db,
        Err(why) => {
            error!("❌ failed to open the database: {why}");
            std::process::exit(1);
        }
    };
    db.init().await;

    let api = Arc::new(CocApiClient::new(config.coc_api_key.clone()));
    api.start_metrics_logging();

    let bot = DiscordBot::new(
        db.clone(),
        api.clone() as Arc<dyn PlayerApi>,
        config.member_fetch_delay(),
    )
    .await;
    let http = bot.client.http.clone();

    let dispatcher = AlertDispatcher::new(http.clone(), db.clone());
    let gateway: Arc<dyn MemberGateway> = Arc::new(http);

    let mut scheduler = Scheduler::new();
    scheduler.register(
        CycleKind::ChangeDetection,
        ClanTracker::new(
            api.clone(),
            db.clone(),
            dispatcher.clone(),
            gateway.clone(),
            config.poll_interval(),
            config.member_fetch_delay(),
        )
        .start(),
    );
    scheduler.register(
        CycleKind::Autokick,
        AutokickEnforcer::new(
            api,
            db,
            dispatcher,
            gateway,
            config.autokick_interval(),
            config.member_fetch_delay(),
        )
        .start(),
    );

    let bot_task = bot.start();

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("🛑 shutdown signal received");
        }
        result = bot_task => match result {
            Ok(Ok(())) => info!("Discord client stopped"),
            Ok(Err(why)) => error!("❌ Discord client error: {why:?}"),
            Err(why) => error!("❌ Discord client task failed: {why}"),
        },
    }

    scheduler.shutdown().await;
}
