use serde::{Deserialize, Serialize};

/// One row of the preprocessed games data used by the analysis API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GameEntry {
    pub appid: u32,
    pub name: String,
    pub combined_text: String,
    #[serde(default)]
    pub header_image_url: String,
    #[serde(default)]
    pub store_page_url: String,
    /// Tags as exported by the store, e.g. `"Action, RPG, Indie"`.
    #[serde(default)]
    pub tags: String,
}

impl GameEntry {
    /// Tag words, split on whitespace and list commas.
    pub fn tag_list(&self) -> impl Iterator<Item = &str> {
        self.tags
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_list_keeps_store_casing() {
        let game = GameEntry {
            appid: 1,
            name: "Orbit".to_string(),
            combined_text: String::new(),
            header_image_url: String::new(),
            store_page_url: String::new(),
            tags: "Space, Open World,RPG".to_string(),
        };
        let tags: Vec<&str> = game.tag_list().collect();
        assert_eq!(tags, vec!["Space", "Open", "World", "RPG"]);
    }
}
