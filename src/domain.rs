use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DexError;

pub const PLACEHOLDER_SPRITE: &str = "placeholder.png";

pub const MAX_STAT_VALUE: u32 = 255;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemKey {
    Id(u32),
    Name(String),
}

impl ItemKey {
    pub fn path_segment(&self) -> String {
        match self {
            ItemKey::Id(id) => id.to_string(),
            ItemKey::Name(name) => name.clone(),
        }
    }

    pub fn fallback_name(&self) -> String {
        match self {
            ItemKey::Id(id) => format!("ID {id}"),
            ItemKey::Name(name) => name.clone(),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemKey::Id(id) => write!(f, "{id}"),
            ItemKey::Name(name) => write!(f, "{name}"),
        }
    }
}

impl From<u32> for ItemKey {
    fn from(value: u32) -> Self {
        ItemKey::Id(value)
    }
}

impl FromStr for ItemKey {
    type Err = DexError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(DexError::InvalidItemKey(value.to_string()));
        }
        if normalized.chars().all(|ch| ch.is_ascii_digit()) {
            return match normalized.parse::<u32>() {
                Ok(id) if id > 0 => Ok(ItemKey::Id(id)),
                _ => Err(DexError::InvalidItemKey(value.to_string())),
            };
        }
        let is_valid = normalized
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-');
        if !is_valid {
            return Err(DexError::InvalidItemKey(value.to_string()));
        }
        Ok(ItemKey::Name(normalized))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: u32,
    pub name: String,
    pub sprite: String,
    pub categories: Vec<String>,
}

impl ItemSummary {
    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|value| value == category)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stat {
    pub name: String,
    pub value: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SpriteSet {
    pub front_default: Option<String>,
    pub front_shiny: Option<String>,
    pub back_default: Option<String>,
    pub back_shiny: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemDetail {
    pub id: u32,
    pub name: String,
    pub categories: Vec<String>,
    pub stats: Vec<Stat>,
    pub sprites: SpriteSet,
    pub versions: Value,
    pub species_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineageNode {
    pub id: String,
    pub name: String,
    pub sprite: Option<String>,
}

impl LineageNode {
    pub fn degraded(key: &ItemKey) -> Self {
        Self {
            id: key.to_string(),
            name: key.fallback_name(),
            sprite: Some(PLACEHOLDER_SPRITE.to_string()),
        }
    }

    pub fn sprite_or_placeholder(&self) -> &str {
        self.sprite.as_deref().unwrap_or(PLACEHOLDER_SPRITE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Theme {
    type Err = DexError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            _ => Err(DexError::InvalidTheme(value.to_string())),
        }
    }
}

pub fn display_id(id: u32) -> String {
    format!("#{id:04}")
}

pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
