// general.rs - General Module
// Everyday commands: connectivity test, echo, and information about the bot.
//
// Used by: modules/mod.rs (module table)

// ============================================================================
// IMPORTS
// ============================================================================

use serenity::{
    client::Context,
    framework::standard::{macros::command, macros::group, Args, CommandResult},
    model::channel::Message,
};

use super::{BucketSpec, Module};
use crate::StartTime;

pub static MODULE: Module = Module {
    id: "general",
    group: &GENERAL_GROUP,
    buckets: &[BucketSpec {
        name: "general",
        limit: 2,
        time_span: 5,
    }],
};

// ============================================================================
// COMMAND IMPLEMENTATION
// ============================================================================

#[command]
#[description = "Check that the bot is alive and how fast it answers"]
pub async fn ping(ctx: &Context, msg: &Message, _args: Args) -> CommandResult {
    let start_time = std::time::Instant::now();

    // Send the initial response and measure the time
    let response_result = msg.reply(ctx, "Pong! Calculating delay...").await;
    let elapsed = start_time.elapsed();

    if let Ok(mut response_msg) = response_result {
        let updated_content = format!("Pong! Response time: {}ms", elapsed.as_millis());
        if let Err(e) = response_msg.edit(&ctx.http, |m| m.content(updated_content)).await {
            log::warn!("[PING] Failed to update ping message with delay: {}", e);
        }
    }

    Ok(())
}

#[command]
#[aliases("say")]
#[description = "Repeat your message back"]
#[usage = "<text>"]
#[bucket = "general"]
pub async fn echo(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    let text = args.message();
    if text.is_empty() {
        msg.reply(ctx, "Please provide text to echo!").await?;
    } else {
        msg.reply(ctx, text).await?;
    }
    Ok(())
}

#[command]
#[aliases("info")]
#[description = "About the bot"]
#[sub_commands(uptime, version)]
pub async fn about(ctx: &Context, msg: &Message) -> CommandResult {
    let me = ctx.cache.current_user();
    msg.reply(
        ctx,
        format!(
            "**{}** v{}\nUse `help about` to see what else you can ask.",
            me.name,
            env!("CARGO_PKG_VERSION")
        ),
    )
    .await?;
    Ok(())
}

#[command]
#[description = "How long the bot has been running"]
pub async fn uptime(ctx: &Context, msg: &Message) -> CommandResult {
    let started = {
        let data = ctx.data.read().await;
        data.get::<StartTime>().copied()
    };

    let reply = match started {
        Some(started) => format!("Up for {}", format_uptime(started.elapsed().as_secs())),
        None => "Uptime is not being tracked.".to_string(),
    };
    msg.reply(ctx, reply).await?;
    Ok(())
}

#[command]
#[description = "The running bot version"]
pub async fn version(ctx: &Context, msg: &Message) -> CommandResult {
    msg.reply(ctx, format!("v{}", env!("CARGO_PKG_VERSION"))).await?;
    Ok(())
}

/// `1d 2h 3m 4s`, leading zero units dropped.
fn format_uptime(total_secs: u64) -> String {
    let days = total_secs / 86_400;
    let hours = (total_secs % 86_400) / 3_600;
    let minutes = (total_secs % 3_600) / 60;
    let seconds = total_secs % 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(format!("{}d", days));
    }
    if days > 0 || hours > 0 {
        parts.push(format!("{}h", hours));
    }
    if days > 0 || hours > 0 || minutes > 0 {
        parts.push(format!("{}m", minutes));
    }
    parts.push(format!("{}s", seconds));
    parts.join(" ")
}

// ============================================================================
// COMMAND GROUP
// ============================================================================

#[group]
#[description = "Everyday commands"]
#[commands(ping, echo, about)]
pub struct General;
