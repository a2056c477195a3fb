// framework.rs - Serenity Help Bridge
// Turns serenity command groups into help registry entries, answers permission
// predicates the way the standard framework would gate a command, and delivers
// rendered help to a Discord channel.

use async_trait::async_trait;
use serenity::{
    client::Context,
    framework::standard::{
        Args, Check, Command, CommandGroup, CommandOptions, Delimiter, GroupOptions, OnlyIn,
        Reason,
    },
    http::Http,
    model::{
        channel::{Channel, Message},
        id::{ChannelId, RoleId, UserId},
        permissions::Permissions,
        Timestamp,
    },
};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use super::embed::HelpEmbed;
use super::registry::{Category, Cooldown, HelpCommand, Permission, PermissionPredicate};
use super::render::{BotProfile, HelpError, HelpSink};

/// Everything a permission predicate needs to know about who asked for help.
pub struct HelpInvocation {
    pub ctx: Context,
    pub msg: Message,
    pub owners: HashSet<UserId>,
}

impl HelpInvocation {
    fn is_owner(&self) -> bool {
        self.owners.contains(&self.msg.author.id)
    }
}

/// Gating options shared by groups and commands.
#[derive(Clone, Copy)]
struct Requirements {
    owners_only: bool,
    owner_privilege: bool,
    only_in: &'static OnlyIn,
    allowed_roles: &'static [&'static str],
    required_permissions: Permissions,
    checks: &'static [&'static Check],
}

impl From<&'static GroupOptions> for Requirements {
    fn from(options: &'static GroupOptions) -> Self {
        Self {
            owners_only: options.owners_only,
            owner_privilege: options.owner_privilege,
            only_in: &options.only_in,
            allowed_roles: options.allowed_roles,
            required_permissions: options.required_permissions,
            checks: options.checks,
        }
    }
}

impl From<&'static CommandOptions> for Requirements {
    fn from(options: &'static CommandOptions) -> Self {
        Self {
            owners_only: options.owners_only,
            owner_privilege: options.owner_privilege,
            only_in: &options.only_in,
            allowed_roles: options.allowed_roles,
            required_permissions: options.required_permissions,
            checks: options.checks,
        }
    }
}

impl Requirements {
    /// Whether a guild caller has to be looked up at all.
    fn needs_member(&self, is_owner: bool) -> bool {
        let permissions = !self.required_permissions.is_empty() && !(is_owner && self.owner_privilege);
        permissions || !self.allowed_roles.is_empty()
    }

    /// Verdict reachable without touching the cache or the API. Permissions and
    /// roles only apply inside a guild.
    fn static_verdict(&self, is_owner: bool, in_guild: bool) -> Option<Permission> {
        if self.owners_only && !is_owner {
            return Some(Permission::Denied);
        }
        match self.only_in {
            OnlyIn::Dm if in_guild => Some(Permission::Denied),
            OnlyIn::Guild if !in_guild => Some(Permission::Denied),
            _ => None,
        }
    }

    /// Administrators pass any role requirement.
    fn member_verdict(&self, is_owner: bool, permissions: Permissions, has_allowed_role: bool) -> Permission {
        if !(permissions.contains(self.required_permissions) || (self.owner_privilege && is_owner)) {
            return Permission::Denied;
        }
        if !permissions.administrator() && !has_allowed_role {
            return Permission::Denied;
        }
        Permission::Allowed
    }

    /// Role ids are resolved by name against `guild_roles`.
    fn has_allowed_role(&self, guild_roles: &[(RoleId, &str)], member_roles: &[RoleId]) -> bool {
        self.allowed_roles.is_empty()
            || self
                .allowed_roles
                .iter()
                .filter_map(|name| guild_roles.iter().find(|(_, role)| role == name))
                .any(|(id, _)| member_roles.contains(id))
    }

    /// Channel permissions of the caller and whether they hold an allowed role.
    async fn member_standing(&self, inv: &HelpInvocation) -> Option<(Permissions, bool)> {
        let member = inv.msg.member(&inv.ctx).await.ok()?;
        let guild = inv.msg.guild(&inv.ctx.cache)?;

        // Threads take their permissions from the parent channel.
        let channel = match guild.channels.get(&inv.msg.channel_id) {
            Some(Channel::Guild(channel)) => channel,
            _ => {
                let parent = guild
                    .threads
                    .iter()
                    .find(|thread| thread.id == inv.msg.channel_id)
                    .and_then(|thread| thread.parent_id)?;
                match guild.channels.get(&parent) {
                    Some(Channel::Guild(channel)) => channel,
                    _ => return None,
                }
            }
        };
        let permissions = guild.user_permissions_in(channel, &member).ok()?;

        let roles: Vec<(RoleId, &str)> = guild
            .roles
            .values()
            .map(|role| (role.id, role.name.as_str()))
            .collect();
        Some((permissions, self.has_allowed_role(&roles, &member.roles)))
    }

    async fn discrepancy(&self, inv: &HelpInvocation) -> Permission {
        let is_owner = inv.is_owner();
        let in_guild = inv.msg.guild_id.is_some();
        if let Some(verdict) = self.static_verdict(is_owner, in_guild) {
            return verdict;
        }
        if !in_guild || !self.needs_member(is_owner) {
            return Permission::Allowed;
        }

        match self.member_standing(inv).await {
            Some((permissions, has_allowed_role)) => {
                self.member_verdict(is_owner, permissions, has_allowed_role)
            }
            None => Permission::CheckFailed,
        }
    }
}

/// Awaits check outcomes in order and stops at the first failure.
async fn checks_verdict<F>(outcomes: impl IntoIterator<Item = F>) -> Permission
where
    F: Future<Output = Result<(), Reason>>,
{
    for outcome in outcomes {
        if outcome.await.is_err() {
            return Permission::Denied;
        }
    }
    Permission::Allowed
}

/// Runs a command's group and command requirements, outermost first.
pub struct FrameworkGate {
    levels: Vec<Requirements>,
    command: &'static CommandOptions,
}

impl FrameworkGate {
    /// Privileged owners skip checks when every level grants the privilege.
    fn owner_skips_checks(&self, is_owner: bool) -> bool {
        is_owner && self.levels.iter().all(|level| level.owner_privilege)
    }

    fn help_checks(&self) -> Vec<&'static Check> {
        self.levels
            .iter()
            .flat_map(|level| level.checks.iter().copied())
            .filter(|check| check.check_in_help)
            .collect()
    }
}

#[async_trait]
impl PermissionPredicate<HelpInvocation> for FrameworkGate {
    async fn evaluate(&self, inv: &HelpInvocation) -> Permission {
        for level in &self.levels {
            let verdict = level.discrepancy(inv).await;
            if verdict != Permission::Allowed {
                return verdict;
            }
        }
        if self.owner_skips_checks(inv.is_owner()) {
            return Permission::Allowed;
        }

        let checks = self.help_checks();
        let mut args: Vec<Args> = checks
            .iter()
            .map(|_| Args::new("", &[Delimiter::Single(' ')]))
            .collect();
        let outcomes: Vec<_> = checks
            .iter()
            .zip(args.iter_mut())
            .map(|(check, args)| (check.function)(&inv.ctx, &inv.msg, args, self.command))
            .collect();
        checks_verdict(outcomes).await
    }
}

/// Prefix as it should read in front of a command name.
pub fn display_prefix(prefix: &str) -> String {
    match prefix.chars().last() {
        Some(c) if c.is_alphanumeric() => format!("{} ", prefix),
        _ => prefix.to_string(),
    }
}

/// `<prefix>[<parent path> ]<name> <usage>`, where the name reads
/// `[name|alias|...]` when the command has aliases.
pub fn signature(
    prefix: &str,
    parent_path: Option<&str>,
    name: &str,
    aliases: &[&str],
    usage: Option<&str>,
) -> String {
    let mut invoked = if aliases.is_empty() {
        name.to_string()
    } else {
        format!("[{}|{}]", name, aliases.join("|"))
    };
    if let Some(parent) = parent_path {
        invoked = format!("{} {}", parent, invoked);
    }
    let line = format!("{}{} {}", prefix, invoked, usage.unwrap_or(""));
    line.trim_end().to_string()
}

/// Descriptions from the command macros carry a trailing newline.
fn description_text(text: Option<&str>) -> Option<&str> {
    text.map(str::trim_end)
}

pub fn category_of(group: &'static CommandGroup) -> Category {
    Category::new(group.name, description_text(group.options.description))
}

/// Top-level commands of `group` and its sub-groups, in declaration order.
pub fn commands_of(
    group: &'static CommandGroup,
    prefix: &str,
    cooldowns: &HashMap<&str, Cooldown>,
) -> Vec<HelpCommand<HelpInvocation>> {
    let mut out = Vec::new();
    collect_group(group, &[], prefix, cooldowns, &mut out);
    out
}

fn collect_group(
    group: &'static CommandGroup,
    outer: &[Requirements],
    prefix: &str,
    cooldowns: &HashMap<&str, Cooldown>,
    out: &mut Vec<HelpCommand<HelpInvocation>>,
) {
    let mut levels = outer.to_vec();
    levels.push(Requirements::from(group.options));

    for command in group.options.commands {
        out.push(help_command(command, None, &levels, prefix, cooldowns));
    }
    for sub_group in group.options.sub_groups {
        collect_group(sub_group, &levels, prefix, cooldowns, out);
    }
}

/// Qualified name and signature path of a parent command.
struct Parent<'a> {
    qualified_name: &'a str,
    path: &'a str,
}

fn help_command(
    command: &'static Command,
    parent: Option<Parent<'_>>,
    outer: &[Requirements],
    prefix: &str,
    cooldowns: &HashMap<&str, Cooldown>,
) -> HelpCommand<HelpInvocation> {
    let options = command.options;
    let name = options.names.first().copied().unwrap_or_default();
    let aliases = options.names.get(1..).unwrap_or_default();
    let (qualified_name, path) = match &parent {
        Some(parent) => (
            format!("{} {}", parent.qualified_name, name),
            format!("{} {}", parent.path, name),
        ),
        None => (name.to_string(), name.to_string()),
    };
    // Sub-commands show the parent's usage after its name.
    let path = match options.usage {
        Some(usage) => format!("{} {}", path, usage),
        None => path,
    };

    let mut levels = outer.to_vec();
    levels.push(Requirements::from(options));

    let gate = FrameworkGate {
        levels: levels.clone(),
        command: options,
    };
    let mut entry = HelpCommand::new(
        qualified_name.clone(),
        signature(
            prefix,
            parent.as_ref().map(|parent| parent.path),
            name,
            aliases,
            options.usage,
        ),
        Arc::new(gate),
    );
    entry.aliases = aliases.iter().map(|a| a.to_string()).collect();
    entry.help = description_text(options.desc).map(str::to_string);
    entry.cooldown = options.bucket.and_then(|bucket| cooldowns.get(bucket).copied());
    entry.hidden = !options.help_available;
    entry.subcommands = options
        .sub_commands
        .iter()
        .map(|sub| {
            let parent = Parent {
                qualified_name: &qualified_name,
                path: &path,
            };
            help_command(sub, Some(parent), &levels, prefix, cooldowns)
        })
        .collect();
    entry
}

/// Bot name (guild nickname when there is one) and avatar.
pub async fn bot_profile(ctx: &Context, msg: &Message) -> BotProfile {
    let me = ctx.cache.current_user();
    let nick = match msg.guild_id {
        Some(guild_id) => guild_id
            .member(ctx, me.id)
            .await
            .ok()
            .and_then(|member| member.nick),
        None => None,
    };
    BotProfile {
        display_name: nick.unwrap_or_else(|| me.name.clone()),
        avatar_url: Some(me.face()),
    }
}

/// Sends help to the channel the request came from.
pub struct ChannelSink {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl ChannelSink {
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        Self { http, channel_id }
    }
}

#[async_trait]
impl HelpSink for ChannelSink {
    async fn send_embed(&self, embed: HelpEmbed) -> Result<(), HelpError> {
        let timestamp = Timestamp::from_unix_timestamp(embed.timestamp.timestamp()).ok();
        self.channel_id
            .send_message(&self.http, |m| {
                m.embed(|e| {
                    e.title(&embed.title);
                    e.description(&embed.description);
                    e.colour(embed.colour);
                    if let Some(url) = &embed.thumbnail {
                        e.thumbnail(url);
                    }
                    for field in &embed.fields {
                        e.field(&field.name, &field.value, field.inline);
                    }
                    e.footer(|f| f.text(embed.footer));
                    if let Some(timestamp) = timestamp {
                        e.timestamp(timestamp);
                    }
                    e
                })
            })
            .await
            .map_err(|e| HelpError::Delivery(e.to_string()))?;
        Ok(())
    }

    async fn send_text(&self, text: String) -> Result<(), HelpError> {
        self.channel_id
            .say(&self.http, text)
            .await
            .map_err(|e| HelpError::Delivery(e.to_string()))?;
        Ok(())
    }
}
