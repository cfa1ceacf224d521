use std::collections::HashMap;

use clap::ValueEnum;

/// How an original `.env` key becomes a Container Apps secret name.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum NameStyle {
    /// `DB_HOST` -> `db-host`
    #[default]
    KebabLower,
    /// `DB_HOST` -> `db_host`
    Lower,
    /// `DB_HOST` -> `DB_HOST`
    Preserve,
}

impl NameStyle {
    pub fn apply(self, key: &str) -> String {
        match self {
            NameStyle::KebabLower => key.to_lowercase().replace('_', "-"),
            NameStyle::Lower => key.to_lowercase(),
            NameStyle::Preserve => key.to_string(),
        }
    }
}

/// Maps a key to its target name: naming style first, then the optional prefix.
pub fn target_name(key: &str, style: NameStyle, prefix: Option<&str>) -> String {
    let styled = style.apply(key);
    match prefix {
        Some(prefix) => format!("{}{}", prefix, styled),
        None => styled,
    }
}

/// A target name produced by more than one original key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub target_name: String,
    pub keys: Vec<String>,
}

/// Records which original keys produced each target name.
#[derive(Debug, Default)]
pub struct CollisionReport {
    order: Vec<String>,
    sources: HashMap<String, Vec<String>>,
}

impl CollisionReport {
    pub fn record(&mut self, target_name: &str, original_key: &str) {
        if !self.sources.contains_key(target_name) {
            self.order.push(target_name.to_string());
        }
        self.sources
            .entry(target_name.to_string())
            .or_default()
            .push(original_key.to_string());
    }

    /// Every colliding group, in the order the target names first appeared.
    pub fn collisions(&self) -> Vec<Collision> {
        self.order
            .iter()
            .filter_map(|name| {
                let keys = &self.sources[name];
                (keys.len() > 1).then(|| Collision {
                    target_name: name.clone(),
                    keys: keys.clone(),
                })
            })
            .collect()
    }
}
