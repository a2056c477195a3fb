// registry.rs - Help Registry Snapshot
// A read-only picture of the loaded commands, grouped by category, that the help
// renderers walk. Built fresh for every help invocation.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Outcome of a permission predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Allowed,
    Denied,
    CheckFailed,
}

impl Permission {
    /// `CheckFailed` counts as not usable.
    pub fn is_usable(self) -> bool {
        matches!(self, Permission::Allowed)
    }
}

/// Decides whether the invoker described by `C` may run a command.
#[async_trait]
pub trait PermissionPredicate<C>: Send + Sync {
    async fn evaluate(&self, ctx: &C) -> Permission;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub description: Option<String>,
}

impl Category {
    pub fn new(name: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            name: name.into(),
            description: description.map(str::to_string),
        }
    }
}

/// Key of one snapshot bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bucket<'a> {
    Category(&'a Category),
    Uncategorized,
}

impl Bucket<'_> {
    pub fn name(&self) -> &str {
        match self {
            Bucket::Category(category) => &category.name,
            Bucket::Uncategorized => "Others",
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Bucket::Category(category) => category.description.as_deref().unwrap_or("No description"),
            Bucket::Uncategorized => "Uncategorized commands",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cooldown {
    pub rate: u32,
    pub per: Duration,
}

impl Cooldown {
    pub fn new(rate: u32, per: Duration) -> Self {
        Self { rate, per }
    }
}

impl std::fmt::Display for Cooldown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} per {:.0} seconds", self.rate, self.per.as_secs_f64())
    }
}

pub struct HelpCommand<C> {
    /// Space separated path from the top-level command.
    pub qualified_name: String,
    pub aliases: Vec<String>,
    pub signature: String,
    pub help: Option<String>,
    pub category: Option<Category>,
    pub cooldown: Option<Cooldown>,
    pub hidden: bool,
    pub subcommands: Vec<HelpCommand<C>>,
    pub predicate: Arc<dyn PermissionPredicate<C>>,
}

impl<C> Clone for HelpCommand<C> {
    fn clone(&self) -> Self {
        Self {
            qualified_name: self.qualified_name.clone(),
            aliases: self.aliases.clone(),
            signature: self.signature.clone(),
            help: self.help.clone(),
            category: self.category.clone(),
            cooldown: self.cooldown,
            hidden: self.hidden,
            subcommands: self.subcommands.clone(),
            predicate: Arc::clone(&self.predicate),
        }
    }
}

impl<C> std::fmt::Debug for HelpCommand<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelpCommand")
            .field("qualified_name", &self.qualified_name)
            .field("signature", &self.signature)
            .field("category", &self.category)
            .field("subcommands", &self.subcommands.len())
            .finish()
    }
}

impl<C: Sync> HelpCommand<C> {
    pub fn new(
        qualified_name: impl Into<String>,
        signature: impl Into<String>,
        predicate: Arc<dyn PermissionPredicate<C>>,
    ) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            aliases: Vec::new(),
            signature: signature.into(),
            help: None,
            category: None,
            cooldown: None,
            hidden: false,
            subcommands: Vec::new(),
            predicate,
        }
    }

    pub fn is_group(&self) -> bool {
        !self.subcommands.is_empty()
    }

    /// Last segment of the qualified name.
    pub fn name(&self) -> &str {
        self.qualified_name
            .rsplit(' ')
            .next()
            .unwrap_or(&self.qualified_name)
    }

    fn answers_to(&self, word: &str) -> bool {
        self.name().eq_ignore_ascii_case(word)
            || self.aliases.iter().any(|a| a.eq_ignore_ascii_case(word))
    }

    fn set_category(&mut self, category: Option<&Category>) {
        self.category = category.cloned();
        for sub in &mut self.subcommands {
            sub.set_category(category);
        }
    }
}

/// What a `help <target>` query points at.
pub enum HelpTarget<'a, C> {
    Overview,
    Command(&'a HelpCommand<C>),
    Group(&'a HelpCommand<C>),
    Category(&'a Category, &'a [HelpCommand<C>]),
    NotFound(String),
}

impl<C> std::fmt::Debug for HelpTarget<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HelpTarget::Overview => f.write_str("Overview"),
            HelpTarget::Command(command) => f.debug_tuple("Command").field(command).finish(),
            HelpTarget::Group(group) => f.debug_tuple("Group").field(group).finish(),
            HelpTarget::Category(category, commands) => f
                .debug_tuple("Category")
                .field(category)
                .field(&commands.len())
                .finish(),
            HelpTarget::NotFound(text) => f.debug_tuple("NotFound").field(text).finish(),
        }
    }
}

pub struct RegistrySnapshot<C> {
    categories: Vec<(Category, Vec<HelpCommand<C>>)>,
    uncategorized: Vec<HelpCommand<C>>,
}

impl<C: Sync> Default for RegistrySnapshot<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Sync> RegistrySnapshot<C> {
    pub fn new() -> Self {
        Self {
            categories: Vec::new(),
            uncategorized: Vec::new(),
        }
    }

    /// Files `commands` under `category`, extending it if the name is already present.
    pub fn add_category(&mut self, category: Category, commands: Vec<HelpCommand<C>>) {
        let index = match self.categories.iter().position(|(c, _)| c.name == category.name) {
            Some(index) => index,
            None => {
                self.categories.push((category, Vec::new()));
                self.categories.len() - 1
            }
        };
        let (category, bucket) = &mut self.categories[index];
        for mut command in commands {
            command.set_category(Some(&*category));
            bucket.push(command);
        }
    }

    pub fn add_uncategorized(&mut self, commands: Vec<HelpCommand<C>>) {
        for mut command in commands {
            command.set_category(None);
            self.uncategorized.push(command);
        }
    }

    /// Buckets in registration order, the uncategorized bucket last.
    pub fn buckets(&self) -> impl Iterator<Item = (Bucket<'_>, &[HelpCommand<C>])> {
        self.categories
            .iter()
            .map(|(c, commands)| (Bucket::Category(c), commands.as_slice()))
            .chain(std::iter::once((Bucket::Uncategorized, self.uncategorized.as_slice())))
    }

    pub fn commands(&self) -> impl Iterator<Item = &HelpCommand<C>> {
        self.buckets().flat_map(|(_, commands)| commands.iter())
    }

    /// Number of top-level commands, hidden ones included.
    pub fn total_commands(&self) -> usize {
        self.commands().count()
    }

    pub fn find_category(&self, name: &str) -> Option<(&Category, &[HelpCommand<C>])> {
        self.categories
            .iter()
            .find(|(c, _)| c.name.eq_ignore_ascii_case(name))
            .map(|(c, commands)| (c, commands.as_slice()))
    }

    pub fn resolve(&self, query: Option<&str>) -> HelpTarget<'_, C> {
        let query = match query.map(str::trim) {
            Some(q) if !q.is_empty() => q,
            _ => return HelpTarget::Overview,
        };

        if let Some((category, commands)) = self.find_category(query) {
            return HelpTarget::Category(category, commands);
        }

        let mut words = query.split_whitespace();
        let first = match words.next() {
            Some(word) => word,
            None => return HelpTarget::Overview,
        };
        let mut current = match self.commands().find(|c| c.answers_to(first)) {
            Some(command) => command,
            None => return HelpTarget::NotFound(format!("No command called \"{}\" found.", first)),
        };

        for word in words {
            if !current.is_group() {
                return HelpTarget::NotFound(format!(
                    "Command \"{}\" has no subcommands.",
                    current.qualified_name
                ));
            }
            current = match current.subcommands.iter().find(|c| c.answers_to(word)) {
                Some(sub) => sub,
                None => {
                    return HelpTarget::NotFound(format!(
                        "Command \"{}\" has no subcommand named {}",
                        current.qualified_name, word
                    ))
                }
            };
        }

        if current.is_group() {
            HelpTarget::Group(current)
        } else {
            HelpTarget::Command(current)
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;

    /// Predicate with a fixed answer.
    pub struct Always(pub Permission);

    #[async_trait]
    impl<C: Sync> PermissionPredicate<C> for Always {
        async fn evaluate(&self, _ctx: &C) -> Permission {
            self.0
        }
    }
}
