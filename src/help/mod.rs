// help/mod.rs - Help System
// Framework-independent help rendering (registry, embed, render) plus the
// serenity bridge that feeds it the loaded command groups.

pub mod embed;
pub mod framework;
pub mod registry;
pub mod render;

pub use registry::{Cooldown, RegistrySnapshot};
pub use render::send_help;
