mod models;
mod commands;
mod services;

use std::collections::HashSet;
use std::env;
use std::error;
use std::fs;
use std::sync::{Arc, Mutex};

use models::config::Config;
use services::channel_config::{self, ChannelConfig};
use services::cooldown::Cooldowns;
use services::like_api::LikeApi;
use serenity::{
    client::ClientBuilder,
    http::Http,
    model::{gateway::GatewayIntents, id::UserId}
};
use tokio::sync::RwLock;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;

type Error = Box<dyn error::Error + Send + Sync>;
type LikeContext<'a> = poise::Context<'a, (), Error>;

fn init_logger() -> std::io::Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::hourly("logs", "likebot.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing::subscriber::set_global_default(
        fmt::Subscriber::builder()
            .with_target(true)
            .with_thread_ids(true)
            .with_thread_names(true)
            .with_span_events(fmt::format::FmtSpan::CLOSE)
            .with_ansi(true)
            .with_max_level(tracing::Level::DEBUG)
            .finish()
            .with(fmt::Layer::default().with_writer(non_blocking))
    ).expect("Failed to set global subscriber");

    const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");
    info!("Initializing likebot v{}", VERSION.unwrap_or("<unknown>"));
    info!("Reading from {}", env::current_dir()?.display());

    Ok(guard)
}

async fn fetch_bot_owners(token: &str) -> HashSet<UserId> {
    let http = Http::new(token);

    match http.get_current_application_info().await {
        Ok(info) => {
            let mut owners = HashSet::new();

            if let Some(team) = info.team {
                owners.insert(team.owner_user_id);
            } else if let Some(owner) = info.owner {
                owners.insert(owner.id);
            }

            owners
        },
        Err(ex) => panic!("Failed to fetch bot info: {ex}")
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn error::Error>> {
    let _guard = match init_logger() {
        Ok(guard) => Some(guard),
        Err(ex) => {
            eprintln!("Failed to initialize logger: {ex}");
            None
        }
    };

    let config_json = fs::read_to_string("config.json").expect("config.json not found");
    let config: Config = serde_json::from_str(&config_json).expect("config.json is malformed");

    let owners = fetch_bot_owners(&config.token).await;
    let options = commands::get_framework(&config.cmd_prefix, owners);

    let like_api = Arc::new(LikeApi::new(&config.like_api_host, &config.like_api_key)?);
    let cooldowns = Arc::new(Mutex::new(Cooldowns::new(commands::likes::COOLDOWN_WINDOW)));
    let channels = Arc::new(RwLock::new(ChannelConfig::load(channel_config::CONFIG_FILE).await));

    let framework = poise::Framework::builder()
        .options(options)
        .setup(move |ctx, ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                info!("Logged in as {}", ready.user.name);
                Ok(())
            })
        })
        .build();

    let intents = GatewayIntents::non_privileged() | GatewayIntents::MESSAGE_CONTENT;
    let mut client = ClientBuilder::new(config.token.as_str(), intents)
        .framework(framework)
        .await
        .expect("Failed to create client");

    {
        let mut data = client.data.write().await;
        data.insert::<LikeApi>(like_api);
        data.insert::<Cooldowns>(cooldowns);
        data.insert::<ChannelConfig>(channels);
    }

    if let Err(ex) = client.start().await {
        error!("Discord bot client error: {:?}", ex);
    }

    Ok(())
}
