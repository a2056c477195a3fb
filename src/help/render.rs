// render.rs - Help Renderers
// Builds the overview, command and group/category help embeds from a registry
// snapshot and pushes each one to a sink exactly once.
//
// Permission predicates are awaited one after another in snapshot order, so the
// field order of every embed follows the snapshot.

use async_trait::async_trait;

use super::embed::{HelpEmbed, NO_HELP};
use super::registry::{Category, HelpCommand, HelpTarget, RegistrySnapshot};

#[derive(Debug, thiserror::Error)]
pub enum HelpError {
    #[error("failed to deliver help message: {0}")]
    Delivery(String),
}

/// Where rendered help goes.
#[async_trait]
pub trait HelpSink: Send + Sync {
    async fn send_embed(&self, embed: HelpEmbed) -> Result<(), HelpError>;
    async fn send_text(&self, text: String) -> Result<(), HelpError>;
}

/// The bot account as shown in the overview header.
#[derive(Debug, Clone, Default)]
pub struct BotProfile {
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// A command group or a category, rendered by the same helper.
pub enum HelpEntity<'a, C> {
    Group(&'a HelpCommand<C>),
    Category(&'a Category, &'a [HelpCommand<C>]),
}

/// Visible commands whose predicate allows `ctx`, in input order.
pub async fn filter_commands<'a, C: Sync>(
    commands: &'a [HelpCommand<C>],
    ctx: &C,
) -> Vec<&'a HelpCommand<C>> {
    let mut usable = Vec::new();
    for command in commands.iter().filter(|c| !c.hidden) {
        if command.predicate.evaluate(ctx).await.is_usable() {
            usable.push(command);
        }
    }
    usable
}

pub async fn render_overview<C: Sync>(
    snapshot: &RegistrySnapshot<C>,
    ctx: &C,
    profile: &BotProfile,
    sink: &dyn HelpSink,
) -> Result<HelpEmbed, HelpError> {
    let mut embed = HelpEmbed::new(format!("{} Help", profile.display_name))
        .thumbnail(profile.avatar_url.clone());
    let mut usable = 0;

    for (bucket, commands) in snapshot.buckets() {
        let filtered = filter_commands(commands, ctx).await;
        if filtered.is_empty() {
            continue;
        }
        usable += filtered.len();
        embed.add_field(
            format!("{} [{}]", bucket.name(), filtered.len()),
            bucket.description(),
        );
    }

    embed.description = format!("{} commands | {} usable", snapshot.total_commands(), usable);

    sink.send_embed(embed.clone()).await?;
    Ok(embed)
}

pub async fn render_command<C: Sync>(
    command: &HelpCommand<C>,
    ctx: &C,
    sink: &dyn HelpSink,
) -> Result<HelpEmbed, HelpError> {
    let mut embed = HelpEmbed::new(command.signature.clone())
        .description(command.help.as_deref().unwrap_or(NO_HELP));

    if let Some(category) = &command.category {
        embed.add_field("Category", category.name.clone());
    }

    let usable = if command.predicate.evaluate(ctx).await.is_usable() {
        "Yes"
    } else {
        "No"
    };
    embed.add_field("Usable", usable);

    if let Some(cooldown) = command.cooldown {
        embed.add_field("Cooldown", cooldown.to_string());
    }

    sink.send_embed(embed.clone()).await?;
    Ok(embed)
}

pub async fn render_group_or_category<C: Sync>(
    entity: HelpEntity<'_, C>,
    ctx: &C,
    sink: &dyn HelpSink,
) -> Result<HelpEmbed, HelpError> {
    let (title, description, commands) = match entity {
        HelpEntity::Group(group) => (
            group.signature.clone(),
            group.help.as_deref(),
            group.subcommands.as_slice(),
        ),
        HelpEntity::Category(category, commands) => {
            // Unnamed categories have always been titled "No".
            let title = if category.name.is_empty() {
                "No".to_string()
            } else {
                category.name.clone()
            };
            (title, category.description.as_deref(), commands)
        }
    };

    let mut embed = HelpEmbed::new(title).description(description.unwrap_or(NO_HELP));
    for command in filter_commands(commands, ctx).await {
        embed.add_field(
            command.signature.clone(),
            command.help.as_deref().unwrap_or(NO_HELP),
        );
    }

    sink.send_embed(embed.clone()).await?;
    Ok(embed)
}

/// Entry point for `help [target]`.
pub async fn send_help<C: Sync>(
    snapshot: &RegistrySnapshot<C>,
    query: Option<&str>,
    ctx: &C,
    profile: &BotProfile,
    sink: &dyn HelpSink,
) -> Result<(), HelpError> {
    match snapshot.resolve(query) {
        HelpTarget::Overview => render_overview(snapshot, ctx, profile, sink).await.map(drop),
        HelpTarget::Command(command) => render_command(command, ctx, sink).await.map(drop),
        HelpTarget::Group(group) => {
            render_group_or_category(HelpEntity::Group(group), ctx, sink).await.map(drop)
        }
        HelpTarget::Category(category, commands) => {
            render_group_or_category(HelpEntity::Category(category, commands), ctx, sink)
                .await
                .map(drop)
        }
        HelpTarget::NotFound(text) => sink.send_text(text).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::help::registry::testing::Always;
    use crate::help::registry::{Cooldown, Permission, PermissionPredicate};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSink {
        embeds: Mutex<Vec<HelpEmbed>>,
        texts: Mutex<Vec<String>>,
    }

    impl RecordingSink {
        fn sends(&self) -> usize {
            self.embeds.lock().unwrap().len() + self.texts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl HelpSink for RecordingSink {
        async fn send_embed(&self, embed: HelpEmbed) -> Result<(), HelpError> {
            self.embeds.lock().unwrap().push(embed);
            Ok(())
        }

        async fn send_text(&self, text: String) -> Result<(), HelpError> {
            self.texts.lock().unwrap().push(text);
            Ok(())
        }
    }

    /// Test invoker: only owners pass the `OwnerOnly` predicate.
    struct Invoker {
        owner: bool,
    }

    struct OwnerOnly;

    #[async_trait]
    impl PermissionPredicate<Invoker> for OwnerOnly {
        async fn evaluate(&self, ctx: &Invoker) -> Permission {
            if ctx.owner {
                Permission::Allowed
            } else {
                Permission::Denied
            }
        }
    }

    fn cmd(name: &str, permission: Permission) -> HelpCommand<Invoker> {
        HelpCommand::new(name, format!("haya {}", name), Arc::new(Always(permission)))
    }

    fn profile() -> BotProfile {
        BotProfile {
            display_name: "Haya".to_string(),
            avatar_url: Some("https://cdn.example/haya.png".to_string()),
        }
    }

    fn example_snapshot() -> RegistrySnapshot<Invoker> {
        let mut snapshot = RegistrySnapshot::new();
        snapshot.add_category(
            Category::new("Moderation", Some("Keep the server tidy")),
            vec![
                cmd("purge", Permission::Allowed),
                cmd("kick", Permission::Allowed),
                cmd("ban", Permission::CheckFailed),
            ],
        );
        snapshot.add_category(
            Category::new("Utility", None),
            vec![cmd("ping", Permission::Allowed)],
        );
        snapshot
    }

    #[tokio::test]
    async fn test_overview_counts_and_fields() {
        let sink = RecordingSink::default();
        let embed = render_overview(&example_snapshot(), &Invoker { owner: false }, &profile(), &sink)
            .await
            .unwrap();

        assert_eq!(embed.title, "Haya Help");
        assert_eq!(embed.thumbnail.as_deref(), Some("https://cdn.example/haya.png"));
        assert_eq!(embed.description, "4 commands | 3 usable");
        let fields: Vec<(&str, &str)> = embed
            .fields
            .iter()
            .map(|f| (f.name.as_str(), f.value.as_str()))
            .collect();
        assert_eq!(
            fields,
            vec![("Moderation [2]", "Keep the server tidy"), ("Utility [1]", "No description")]
        );
        assert_eq!(sink.sends(), 1);
    }

    #[tokio::test]
    async fn test_overview_skips_fully_filtered_buckets() {
        let mut snapshot = example_snapshot();
        snapshot.add_category(
            Category::new("Owner", None),
            vec![HelpCommand::<Invoker>::new("shutdown", "haya shutdown", Arc::new(OwnerOnly))],
        );
        let mut secret = cmd("debug", Permission::Allowed);
        secret.hidden = true;
        snapshot.add_uncategorized(vec![cmd("help", Permission::Allowed), secret]);

        let sink = RecordingSink::default();
        let guest = render_overview(&snapshot, &Invoker { owner: false }, &profile(), &sink)
            .await
            .unwrap();
        assert_eq!(guest.description, "7 commands | 4 usable");
        assert_eq!(guest.fields.len(), 3);
        assert_eq!(guest.field("Others [1]"), Some("Uncategorized commands"));
        assert!(guest.fields.len() < snapshot.buckets().count());

        let owner = render_overview(&snapshot, &Invoker { owner: true }, &profile(), &sink)
            .await
            .unwrap();
        assert_eq!(owner.description, "7 commands | 5 usable");
        assert_eq!(owner.fields[2].name, "Owner [1]");
    }

    #[tokio::test]
    async fn test_overview_on_empty_snapshot() {
        let sink = RecordingSink::default();
        let snapshot = RegistrySnapshot::<Invoker>::new();
        let embed = render_overview(&snapshot, &Invoker { owner: false }, &BotProfile::default(), &sink)
            .await
            .unwrap();
        assert!(embed.fields.is_empty());
        assert_eq!(embed.description, "0 commands | 0 usable");
        assert_eq!(sink.sends(), 1);
    }

    #[tokio::test]
    async fn test_command_view_fields() {
        let snapshot = example_snapshot();
        let mut purge = snapshot.commands().find(|c| c.name() == "purge").unwrap().clone();
        purge.help = Some("Delete recent messages".to_string());
        purge.cooldown = Some(Cooldown::new(1, Duration::from_secs(10)));

        let sink = RecordingSink::default();
        let embed = render_command(&purge, &Invoker { owner: false }, &sink).await.unwrap();
        assert_eq!(embed.title, "haya purge");
        assert_eq!(embed.description, "Delete recent messages");
        let names: Vec<&str> = embed.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["Category", "Usable", "Cooldown"]);
        assert_eq!(embed.field("Category"), Some("Moderation"));
        assert_eq!(embed.field("Usable"), Some("Yes"));
        assert_eq!(embed.field("Cooldown"), Some("1 per 10 seconds"));
        assert_eq!(sink.sends(), 1);
    }

    #[tokio::test]
    async fn test_command_view_without_cooldown_or_category() {
        let sink = RecordingSink::default();
        let help = cmd("help", Permission::Denied);
        let embed = render_command(&help, &Invoker { owner: false }, &sink).await.unwrap();
        assert_eq!(embed.description, NO_HELP);
        assert_eq!(embed.field("Category"), None);
        assert_eq!(embed.field("Cooldown"), None);
        assert_eq!(embed.field("Usable"), Some("No"));
    }

    #[tokio::test]
    async fn test_failed_check_reads_as_not_usable() {
        let sink = RecordingSink::default();
        let ban = cmd("ban", Permission::CheckFailed);
        let embed = render_command(&ban, &Invoker { owner: true }, &sink).await.unwrap();
        assert_eq!(embed.field("Usable"), Some("No"));
        assert!(sink.texts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_group_view_lists_usable_subcommands() {
        let mut about = cmd("about", Permission::Allowed);
        about.help = Some("About the bot".to_string());
        let mut uptime = cmd("about uptime", Permission::Allowed);
        uptime.help = Some("How long the bot has been up".to_string());
        about.subcommands = vec![
            uptime,
            cmd("about version", Permission::Allowed),
            cmd("about secrets", Permission::CheckFailed),
        ];

        let sink = RecordingSink::default();
        let embed = render_group_or_category(HelpEntity::Group(&about), &Invoker { owner: false }, &sink)
            .await
            .unwrap();
        assert_eq!(embed.title, "haya about");
        assert_eq!(embed.description, "About the bot");
        assert_eq!(embed.fields.len(), 2);
        assert_eq!(embed.field("haya about uptime"), Some("How long the bot has been up"));
        assert_eq!(embed.field("haya about version"), Some(NO_HELP));
    }

    #[tokio::test]
    async fn test_empty_group_renders_no_fields() {
        let group = cmd("empty", Permission::Allowed);
        let sink = RecordingSink::default();
        let embed = render_group_or_category(HelpEntity::Group(&group), &Invoker { owner: false }, &sink)
            .await
            .unwrap();
        assert!(embed.fields.is_empty());
        assert_eq!(embed.description, NO_HELP);
        assert_eq!(sink.sends(), 1);
    }

    #[tokio::test]
    async fn test_category_view_and_unnamed_title() {
        let snapshot = example_snapshot();
        let (category, commands) = snapshot.find_category("Moderation").unwrap();
        let sink = RecordingSink::default();
        let embed = render_group_or_category(
            HelpEntity::Category(category, commands),
            &Invoker { owner: false },
            &sink,
        )
        .await
        .unwrap();
        assert_eq!(embed.title, "Moderation");
        assert_eq!(embed.description, "Keep the server tidy");
        let names: Vec<&str> = embed.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["haya purge", "haya kick"]);

        let unnamed = Category::new("", None);
        let embed = render_group_or_category(HelpEntity::Category(&unnamed, &[]), &Invoker { owner: false }, &sink)
            .await
            .unwrap();
        assert_eq!(embed.title, "No");
        assert_eq!(embed.description, NO_HELP);
    }

    #[tokio::test]
    async fn test_rendering_is_repeatable() {
        let snapshot = example_snapshot();
        let sink = RecordingSink::default();
        let ctx = Invoker { owner: false };
        let first = render_overview(&snapshot, &ctx, &profile(), &sink).await.unwrap();
        let second = render_overview(&snapshot, &ctx, &profile(), &sink).await.unwrap();
        assert_eq!(first.description, second.description);
        assert_eq!(first.fields, second.fields);
    }

    #[tokio::test]
    async fn test_send_help_dispatches_one_message() {
        let snapshot = example_snapshot();
        let ctx = Invoker { owner: false };

        let sink = RecordingSink::default();
        send_help(&snapshot, Some("utility"), &ctx, &profile(), &sink).await.unwrap();
        assert_eq!(sink.embeds.lock().unwrap()[0].title, "Utility");
        assert_eq!(sink.sends(), 1);

        let sink = RecordingSink::default();
        send_help(&snapshot, Some("ping"), &ctx, &profile(), &sink).await.unwrap();
        assert_eq!(sink.embeds.lock().unwrap()[0].title, "haya ping");

        let sink = RecordingSink::default();
        send_help(&snapshot, None, &ctx, &profile(), &sink).await.unwrap();
        assert_eq!(sink.embeds.lock().unwrap()[0].title, "Haya Help");

        let sink = RecordingSink::default();
        send_help(&snapshot, Some("nope"), &ctx, &profile(), &sink).await.unwrap();
        assert_eq!(sink.texts.lock().unwrap().as_slice(), ["No command called \"nope\" found.".to_string()]);
        assert_eq!(sink.sends(), 1);
    }
}
