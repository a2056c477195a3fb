// modules/mod.rs - Module Table
// Every loadable module ("cog") is listed here with its command group and the
// cooldown buckets its commands use. Which ones get loaded is decided at startup
// from the MODULES config key.

pub mod admin;
pub mod general;
pub mod moderation;

use log::{info, warn};
use serenity::framework::standard::{CommandGroup, StandardFramework};
use std::collections::HashMap;
use std::time::Duration;

use crate::commands::help::{HELP_BUCKET, OTHERS_GROUP};
use crate::help::Cooldown;

/// A per-user rate limit: `limit` uses every `time_span` seconds.
#[derive(Debug)]
pub struct BucketSpec {
    pub name: &'static str,
    pub limit: u32,
    pub time_span: u64,
}

impl BucketSpec {
    pub fn cooldown(&self) -> Cooldown {
        Cooldown::new(self.limit, Duration::from_secs(self.time_span))
    }

    async fn register(&self, framework: StandardFramework) -> StandardFramework {
        framework
            .bucket(self.name, |b| b.limit(self.limit).time_span(self.time_span))
            .await
    }
}

pub struct Module {
    pub id: &'static str,
    pub group: &'static CommandGroup,
    pub buckets: &'static [BucketSpec],
}

pub static MODULES: &[&Module] = &[&general::MODULE, &moderation::MODULE, &admin::MODULE];

/// Modules to load, in table order. Unknown ids are skipped.
pub fn select_modules(requested: Option<&[String]>) -> Vec<&'static Module> {
    let requested = match requested {
        Some(ids) => ids,
        None => return MODULES.to_vec(),
    };

    for id in requested {
        if !MODULES.iter().any(|m| m.id == id) {
            warn!("⚠️  Unknown module '{}' in MODULES, skipping", id);
        }
    }

    MODULES
        .iter()
        .copied()
        .filter(|m| requested.iter().any(|id| id == m.id))
        .collect()
}

/// Bucket name to cooldown for the loaded modules and the help command.
pub fn cooldown_table(modules: &[&'static Module]) -> HashMap<&'static str, Cooldown> {
    modules
        .iter()
        .flat_map(|m| m.buckets.iter())
        .chain(std::iter::once(&HELP_BUCKET))
        .map(|b| (b.name, b.cooldown()))
        .collect()
}

/// Adds the modules' buckets and groups, then the always-on help group.
pub async fn register(mut framework: StandardFramework, modules: &[&'static Module]) -> StandardFramework {
    for module in modules {
        for bucket in module.buckets {
            framework = bucket.register(framework).await;
        }
        framework = framework.group(module.group);
        info!("📦 Loaded module '{}' ({})", module.id, module.group.name);
    }

    framework = HELP_BUCKET.register(framework).await;
    framework.group(&OTHERS_GROUP)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(modules: &[&Module]) -> Vec<&'static str> {
        modules.iter().map(|m| m.id).collect()
    }

    #[test]
    fn test_all_modules_by_default() {
        assert_eq!(ids(&select_modules(None)), vec!["general", "moderation", "admin"]);
    }

    #[test]
    fn test_selection_keeps_table_order_and_skips_unknown() {
        let requested = vec!["admin".to_string(), "music".to_string(), "general".to_string()];
        assert_eq!(ids(&select_modules(Some(&requested))), vec!["general", "admin"]);
        assert!(select_modules(Some(&[])).is_empty());
    }

    #[test]
    fn test_cooldown_table_includes_help() {
        let table = cooldown_table(&select_modules(Some(&["moderation".to_string()])));
        assert_eq!(table.get("help").map(|c| c.to_string()).as_deref(), Some("1 per 3 seconds"));
        assert!(table.contains_key("moderation"));
        assert!(!table.contains_key("general"));
    }
}
