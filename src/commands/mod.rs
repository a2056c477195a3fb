// commands/mod.rs - Command Module Registry
// Commands that are always registered, independent of the module table.

pub mod help;           // Help system: overview, command, group and category help
