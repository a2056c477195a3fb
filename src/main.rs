mod commands;
mod config;
mod help;
mod modules;

use serenity::{
    async_trait,
    client::{bridge::gateway::ShardManager, Client, Context, EventHandler},
    framework::standard::{DispatchError, StandardFramework},
    http::Http,
    model::{gateway::{Activity, Ready}, id::UserId},
    prelude::{GatewayIntents, Mutex, TypeMapKey},
};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::signal;

use crate::config::BotConfig;
use crate::help::framework::display_prefix;
use crate::modules::Module;

// TypeMap key for the shard manager, used by the shutdown command
pub struct ShardManagerContainer;
impl TypeMapKey for ShardManagerContainer {
    type Value = Arc<Mutex<ShardManager>>;
}

// TypeMap key for process start time
pub struct StartTime;
impl TypeMapKey for StartTime {
    type Value = Instant;
}

// TypeMap key for the prefix as shown in command signatures
pub struct BotPrefix;
impl TypeMapKey for BotPrefix {
    type Value = String;
}

// TypeMap key for the bot owners
pub struct BotOwners;
impl TypeMapKey for BotOwners {
    type Value = HashSet<UserId>;
}

// TypeMap key for the modules registered with the framework
pub struct LoadedModules;
impl TypeMapKey for LoadedModules {
    type Value = Vec<&'static Module>;
}

// Event handler implementation
struct Handler {
    activity: String,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        ctx.set_activity(Activity::listening(&self.activity)).await;
        log::info!("✅ {} successfully logged in!", ready.user.name);
    }
}

// Owners from the config plus the application owner reported by Discord
async fn resolve_owners(token: &str, configured: &HashSet<UserId>) -> HashSet<UserId> {
    let mut owners = configured.clone();
    match Http::new(token).get_current_application_info().await {
        Ok(info) => {
            owners.insert(info.owner.id);
        }
        Err(e) => {
            log::warn!("⚠️  Could not fetch application info, using configured owners only: {}", e);
        }
    }
    owners
}

#[tokio::main]
async fn main() {
    // Initialize logger - must be done before any logging calls
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();

    let config = match BotConfig::load() {
        Ok(config) => config,
        Err(error) => {
            log::error!("❌ Failed to load configuration: {}", error);
            eprintln!("Create a botconfig.txt file in the project root with: DISCORD_TOKEN=your_token_here and PREFIX=haya");
            return;
        }
    };

    let prefix = display_prefix(&config.prefix);
    log::info!("🤖 Starting bot with prefix: '{}'", config.prefix);

    let owners = resolve_owners(&config.token, &config.owners).await;
    let loaded = modules::select_modules(config.modules.as_deref());

    // Set up command framework
    let framework = StandardFramework::new()
        .configure(|c| {
            c.prefix(&config.prefix)
                .case_insensitivity(true)
                .with_whitespace(true)
                .owners(owners.clone())
        })
        .after(|_ctx, msg, command_name, result| Box::pin(async move {
            if let Err(e) = result {
                log::error!("❌ Command '{}' failed for user {} ({}): {:?}",
                           command_name, msg.author.name, msg.author.id, e);
            }
        }))
        .unrecognised_command(|_ctx, msg, unrecognised_command_name| Box::pin(async move {
            log::debug!("❓ Unrecognised command '{}' attempted by user {} ({})",
                       unrecognised_command_name, msg.author.name, msg.author.id);
        }))
        .on_dispatch_error(|ctx, msg, error, command_name| Box::pin(async move {
            match &error {
                DispatchError::Ratelimited(info) => {
                    if info.is_first_try {
                        if let Err(e) = msg
                            .channel_id
                            .say(&ctx.http, format!("Try this again in {} seconds.", info.as_secs()))
                            .await
                        {
                            log::warn!("⚠️  Failed to send cooldown notice for '{}': {}", command_name, e);
                        }
                    }
                }
                _ => {
                    log::debug!("Command '{}' not dispatched for {}: {:?}", command_name, msg.author.name, error);
                }
            }
        }));
    let framework = modules::register(framework, &loaded).await;

    // Configure bot intents
    let intents = GatewayIntents::non_privileged()
        | GatewayIntents::MESSAGE_CONTENT;

    // Create and start client
    let mut client = match Client::builder(&config.token, intents)
        .event_handler(Handler {
            activity: format!("{}help", prefix),
        })
        .framework(framework)
        .await
    {
        Ok(client) => client,
        Err(e) => {
            log::error!("❌ Error creating Discord client: {:?}", e);
            eprintln!("Check your token in botconfig.txt file");
            return;
        }
    };

    {
        let mut data = client.data.write().await;
        data.insert::<ShardManagerContainer>(client.shard_manager.clone());
        data.insert::<StartTime>(Instant::now());
        data.insert::<BotPrefix>(prefix);
        data.insert::<BotOwners>(owners);
        data.insert::<LoadedModules>(loaded);
    }

    let shard_manager = client.shard_manager.clone();

    // Set up graceful shutdown on CTRL+C
    log::info!("🚀 Bot is running... Press Ctrl+C to stop");
    tokio::select! {
        _ = signal::ctrl_c() => {
            log::info!("⏹️ Stopping bot gracefully...");
            shard_manager.lock().await.shutdown_all().await;
        }
        result = client.start() => {
            if let Err(why) = result {
                log::error!("❌ Client error: {:?}", why);
            }
        }
    }

    log::info!("✅ Bot stopped");
}
