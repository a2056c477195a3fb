// moderation.rs - Moderation Module
// Channel housekeeping for members with the right permissions.

use serenity::{
    client::Context,
    framework::standard::{
        macros::{check, command, group},
        Args, CommandOptions, CommandResult, Reason,
    },
    model::channel::Message,
};

use super::{BucketSpec, Module};

pub static MODULE: Module = Module {
    id: "moderation",
    group: &MODERATION_GROUP,
    buckets: &[BucketSpec {
        name: "moderation",
        limit: 1,
        time_span: 10,
    }],
};

const MAX_PURGE: u64 = 50;

#[check]
#[name = "Human"]
async fn human_check(
    _: &Context,
    msg: &Message,
    _: &mut Args,
    _: &CommandOptions,
) -> Result<(), Reason> {
    if msg.author.bot {
        return Err(Reason::User("Bots cannot run moderation commands.".to_string()));
    }
    Ok(())
}

#[command]
#[aliases("clear")]
#[description = "Delete the most recent messages in this channel"]
#[usage = "<count>"]
#[required_permissions("MANAGE_MESSAGES")]
#[bucket = "moderation"]
pub async fn purge(ctx: &Context, msg: &Message, mut args: Args) -> CommandResult {
    let count = match args.single::<u64>() {
        Ok(count) if (1..=MAX_PURGE).contains(&count) => count,
        _ => {
            msg.reply(ctx, format!("Please give a number of messages between 1 and {}!", MAX_PURGE))
                .await?;
            return Ok(());
        }
    };

    let messages = msg
        .channel_id
        .messages(&ctx.http, |r| r.before(msg.id).limit(count))
        .await?;

    for message in &messages {
        msg.channel_id.delete_message(&ctx.http, message.id).await?;
    }
    log::info!(
        "🧹 {} purged {} messages in channel {}",
        msg.author.name,
        messages.len(),
        msg.channel_id
    );

    msg.reply(ctx, format!("Deleted {} messages.", messages.len())).await?;
    Ok(())
}

#[group]
#[description = "Keep the server tidy"]
#[only_in(guilds)]
#[checks(Human)]
#[commands(purge)]
pub struct Moderation;
