// embed.rs - Help Embed
// The presentation-ready view produced by every help render. Footer, colour and
// timestamp are preset so the renderers only deal with title, description and fields.

use chrono::{DateTime, Utc};

pub const HELP_FOOTER: &str =
    "Use help [command] or help [category] for more information | <> is required | [] is optional";

/// #fdf0b3
pub const HELP_COLOUR: u32 = 0xFDF0B3;

pub const NO_HELP: &str = "No help found...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone)]
pub struct HelpEmbed {
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub fields: Vec<EmbedField>,
    pub footer: &'static str,
    pub colour: u32,
    pub timestamp: DateTime<Utc>,
}

impl HelpEmbed {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            thumbnail: None,
            fields: Vec::new(),
            footer: HELP_FOOTER,
            colour: HELP_COLOUR,
            timestamp: Utc::now(),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn thumbnail(mut self, url: Option<String>) -> Self {
        self.thumbnail = url;
        self
    }

    pub fn add_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline: true,
        });
    }

    /// Field value by label, first match.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_applied() {
        let embed = HelpEmbed::new("title");
        assert_eq!(embed.footer, HELP_FOOTER);
        assert_eq!(embed.colour, 0xFDF0B3);
        assert!(embed.fields.is_empty());
        assert!(embed.thumbnail.is_none());
    }

    #[test]
    fn test_fields_keep_insertion_order() {
        let mut embed = HelpEmbed::new("title").description("desc");
        embed.add_field("b", "2");
        embed.add_field("a", "1");
        let names: Vec<&str> = embed.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(embed.field("a"), Some("1"));
        assert_eq!(embed.field("missing"), None);
        assert!(embed.fields.iter().all(|f| f.inline));
    }
}
