// admin.rs - Administrative commands for bot management
// Only the bot owners can use these.

use serenity::{
    client::Context,
    framework::standard::{macros::command, macros::group, Args, CommandResult},
    model::channel::Message,
};

use super::Module;
use crate::{LoadedModules, ShardManagerContainer};

pub static MODULE: Module = Module {
    id: "admin",
    group: &ADMIN_GROUP,
    buckets: &[],
};

#[command]
#[aliases("stopbot")]
#[description = "Shut the bot down gracefully"]
pub async fn shutdown(ctx: &Context, msg: &Message, _args: Args) -> CommandResult {
    let shard_manager = {
        let data = ctx.data.read().await;
        data.get::<ShardManagerContainer>().cloned()
    };

    let shard_manager = match shard_manager {
        Some(manager) => manager,
        None => {
            msg.reply(ctx, "❌ Could not reach the shard manager.").await?;
            return Ok(());
        }
    };

    log::info!("[ADMIN] Shutdown requested by owner {} ({})", msg.author.name, msg.author.id);
    msg.reply(ctx, "⏹️ Shutting down...").await?;
    shard_manager.lock().await.shutdown_all().await;
    Ok(())
}

#[command]
#[aliases("modules")]
#[description = "List the loaded modules"]
#[help_available(false)]
pub async fn loaded(ctx: &Context, msg: &Message) -> CommandResult {
    let loaded = {
        let data = ctx.data.read().await;
        data.get::<LoadedModules>().cloned().unwrap_or_default()
    };

    let lines: Vec<String> = loaded
        .iter()
        .map(|m| format!("• `{}` ({})", m.id, m.group.name))
        .collect();
    let reply = if lines.is_empty() {
        "No modules loaded.".to_string()
    } else {
        format!("**Loaded modules:**\n{}", lines.join("\n"))
    };
    msg.reply(ctx, reply).await?;
    Ok(())
}

#[group]
#[description = "Owner-only bot management"]
#[owners_only]
#[commands(shutdown, loaded)]
pub struct Admin;
