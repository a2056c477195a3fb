// help.rs - Help Command Module
// `help [command|category]` renders categorized help embeds for whatever modules
// are loaded. The command itself lives in the uncategorized "Others" group.
//
// Used by: modules/mod.rs (always registered)

use serenity::{
    client::Context,
    framework::standard::{macros::command, macros::group, Args, CommandResult},
    model::channel::Message,
};

use crate::help::framework::{bot_profile, category_of, commands_of, ChannelSink, HelpInvocation};
use crate::help::{send_help, RegistrySnapshot};
use crate::modules::{cooldown_table, BucketSpec, Module};
use crate::{BotOwners, BotPrefix, LoadedModules};

pub static HELP_BUCKET: BucketSpec = BucketSpec {
    name: "help",
    limit: 1,
    time_span: 3,
};

/// Snapshot of the loaded modules plus the uncategorized commands.
pub fn build_snapshot(modules: &[&'static Module], prefix: &str) -> RegistrySnapshot<HelpInvocation> {
    let cooldowns = cooldown_table(modules);
    let mut snapshot = RegistrySnapshot::new();
    for module in modules {
        snapshot.add_category(category_of(module.group), commands_of(module.group, prefix, &cooldowns));
    }
    snapshot.add_uncategorized(commands_of(&OTHERS_GROUP, prefix, &cooldowns));
    snapshot
}

#[command]
#[aliases("commands")]
#[description = "The help command for the bot"]
#[usage = "[command|category]"]
#[bucket = "help"]
pub async fn help(ctx: &Context, msg: &Message, args: Args) -> CommandResult {
    let (modules, prefix, owners) = {
        let data = ctx.data.read().await;
        (
            data.get::<LoadedModules>().cloned().unwrap_or_default(),
            data.get::<BotPrefix>().cloned().unwrap_or_default(),
            data.get::<BotOwners>().cloned().unwrap_or_default(),
        )
    };

    let snapshot = build_snapshot(&modules, &prefix);
    let profile = bot_profile(ctx, msg).await;
    let invocation = HelpInvocation {
        ctx: ctx.clone(),
        msg: msg.clone(),
        owners,
    };
    let sink = ChannelSink::new(ctx.http.clone(), msg.channel_id);

    send_help(&snapshot, Some(args.rest()), &invocation, &profile, &sink).await?;
    Ok(())
}

// ============================================================================
// COMMAND GROUP
// ============================================================================

#[group]
#[commands(help)]
pub struct Others;
