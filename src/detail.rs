use std::thread;

use serde::Serialize;
use serde_json::Value;

use crate::domain::{ItemDetail, ItemKey, MAX_STAT_VALUE, PLACEHOLDER_SPRITE, Stat, display_id};
use crate::error::ErrorKind;
use crate::lineage::{self, Lineage, LineageGap};
use crate::pokeapi::{PokeApiClient, fetch_detail};

pub const DETAIL_ERROR_MESSAGE: &str =
    "Could not load Pokémon base details. Please try again later.";
pub const NO_GENERATION_SPRITES_MESSAGE: &str =
    "No older generation sprites available in API data.";

const GENERATION_ORDER: &[(&str, &str)] = &[
    ("generation-i", "Gen I"),
    ("generation-ii", "Gen II"),
    ("generation-iii", "Gen III"),
    ("generation-iv", "Gen IV"),
    ("generation-v", "Gen V"),
    ("generation-vi", "Gen VI"),
    ("generation-vii", "Gen VII"),
    ("generation-viii", "Gen VIII"),
];

const GAME_NAMES: &[(&str, &str)] = &[
    ("red-blue", "R/B"),
    ("yellow", "Y"),
    ("gold", "G"),
    ("silver", "S"),
    ("crystal", "C"),
    ("ruby-sapphire", "R/S"),
    ("emerald", "E"),
    ("firered-leafgreen", "FR/LG"),
    ("diamond-pearl", "D/P"),
    ("platinum", "Pt"),
    ("heartgold-soulsilver", "HG/SS"),
    ("black-white", "B/W"),
    ("omegaruby-alphasapphire", "OR/AS"),
    ("x-y", "X/Y"),
    ("ultra-sun-ultra-moon", "US/UM"),
    ("sun-moon", "S/M"),
    ("icons", "Icons"),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailHeader {
    pub id: u32,
    pub display_id: String,
    pub name: String,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpriteTile {
    pub label: &'static str,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatBar {
    pub name: String,
    pub label: String,
    pub value: u32,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSprite {
    pub game: String,
    pub url: String,
    pub animated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationGroup {
    pub label: &'static str,
    pub sprites: Vec<GameSprite>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub header: DetailHeader,
    pub sprites: Vec<SpriteTile>,
    pub stats: Vec<StatBar>,
    pub lineage: Lineage,
    pub generations: Vec<GenerationGroup>,
}

impl DetailView {
    pub fn generations_notice(&self) -> Option<&'static str> {
        self.generations
            .is_empty()
            .then_some(NO_GENERATION_SPRITES_MESSAGE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DetailState {
    Loading { key: ItemKey },
    Ready { view: Box<DetailView> },
    Failed {
        key: ItemKey,
        kind: ErrorKind,
        message: String,
    },
}

/// A failed base fetch ends the flow before any further request.
pub fn assemble<C: PokeApiClient + ?Sized>(
    client: &C,
    key: &ItemKey,
    concurrency: usize,
) -> DetailState {
    let detail = match fetch_detail(client, key) {
        Ok(detail) => detail,
        Err(err) => {
            return DetailState::Failed {
                key: key.clone(),
                kind: err.kind(),
                message: DETAIL_ERROR_MESSAGE.to_string(),
            };
        }
    };

    let (lineage, (stats, generations)) = thread::scope(|scope| {
        let handle = scope.spawn(|| lineage::resolve(client, &detail, concurrency));
        let derived = (
            stat_bars(&detail.stats),
            generation_groups(&detail.versions),
        );
        let lineage = handle.join().unwrap_or_else(|_| Lineage::Unavailable {
            gap: LineageGap::NoChain {
                kind: ErrorKind::Local,
            },
        });
        (lineage, derived)
    });

    DetailState::Ready {
        view: Box::new(DetailView {
            header: header(&detail),
            sprites: sprite_tiles(&detail),
            stats,
            lineage,
            generations,
        }),
    }
}

fn header(detail: &ItemDetail) -> DetailHeader {
    DetailHeader {
        id: detail.id,
        display_id: display_id(detail.id),
        name: detail.name.clone(),
        categories: detail.categories.clone(),
    }
}

pub fn sprite_tiles(detail: &ItemDetail) -> Vec<SpriteTile> {
    let placeholder = || PLACEHOLDER_SPRITE.to_string();
    let mut tiles = vec![
        SpriteTile {
            label: "Default",
            url: detail.sprites.front_default.clone().unwrap_or_else(placeholder),
        },
        SpriteTile {
            label: "Shiny",
            url: detail.sprites.front_shiny.clone().unwrap_or_else(placeholder),
        },
    ];
    if let Some(url) = &detail.sprites.back_default {
        tiles.push(SpriteTile {
            label: "Back",
            url: url.clone(),
        });
    }
    if let Some(url) = &detail.sprites.back_shiny {
        tiles.push(SpriteTile {
            label: "Shiny Back",
            url: url.clone(),
        });
    }
    tiles
}

pub fn stat_bars(stats: &[Stat]) -> Vec<StatBar> {
    stats
        .iter()
        .map(|stat| StatBar {
            name: stat.name.clone(),
            label: stat.name.replace('-', " "),
            value: stat.value,
            percent: stat_percent(stat.value),
        })
        .collect()
}

pub fn stat_percent(value: u32) -> f64 {
    (f64::from(value) / f64::from(MAX_STAT_VALUE) * 100.0).min(100.0)
}

pub fn generation_groups(versions: &Value) -> Vec<GenerationGroup> {
    GENERATION_ORDER
        .iter()
        .filter_map(|(key, label)| {
            let games = versions.get(*key)?.as_object()?;
            let sprites: Vec<GameSprite> = games
                .iter()
                .filter_map(|(game, sprites)| game_sprite(game, sprites))
                .collect();
            (!sprites.is_empty()).then_some(GenerationGroup {
                label: *label,
                sprites,
            })
        })
        .collect()
}

fn game_sprite(game: &str, sprites: &Value) -> Option<GameSprite> {
    let front = sprites
        .get("front_default")
        .and_then(|value| value.as_str())
        .filter(|value| !value.is_empty());
    let (url, animated) = match front {
        Some(url) => (url, false),
        None if game == "black-white" => {
            let animated = sprites
                .get("animated")
                .and_then(|value| value.get("front_default"))
                .and_then(|value| value.as_str())
                .filter(|value| !value.is_empty())?;
            (animated, true)
        }
        None => return None,
    };
    Some(GameSprite {
        game: game_label(game),
        url: url.to_string(),
        animated,
    })
}

pub fn game_label(game: &str) -> String {
    GAME_NAMES
        .iter()
        .find(|(key, _)| *key == game)
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| game.replace('-', " "))
}
