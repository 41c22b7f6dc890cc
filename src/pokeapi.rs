use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde_json::Value;

use crate::config::ResolvedConfig;
use crate::domain::{ItemDetail, ItemKey, ItemSummary, LineageNode, PLACEHOLDER_SPRITE, SpriteSet, Stat};
use crate::error::DexError;

pub trait PokeApiClient: Send + Sync {
    fn fetch_pokemon(&self, key: &ItemKey) -> Result<Value, DexError>;
    fn fetch_url(&self, url: &str) -> Result<Value, DexError>;
}

#[derive(Clone)]
pub struct PokeApiHttpClient {
    client: Client,
    base_url: String,
}

impl PokeApiHttpClient {
    pub fn new(config: &ResolvedConfig) -> Result<Self, DexError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("pokedex-viewer/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| DexError::Http(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|err| DexError::Http(err.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    pub fn pokemon_url(&self, key: &ItemKey) -> String {
        format!("{}pokemon/{}", self.base_url, key.path_segment())
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, DexError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "PokeAPI request failed".to_string());
        Err(DexError::Status { status, message })
    }

    fn get_json(&self, url: &str) -> Result<Value, DexError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| DexError::Http(err.to_string()))?;
        let response = Self::handle_status(response)?;
        response.json::<Value>().map_err(|err| {
            if err.is_decode() {
                DexError::Parse(err.to_string())
            } else {
                DexError::Http(err.to_string())
            }
        })
    }
}

impl PokeApiClient for PokeApiHttpClient {
    fn fetch_pokemon(&self, key: &ItemKey) -> Result<Value, DexError> {
        let url = self.pokemon_url(key);
        self.get_json(&url)
    }

    fn fetch_url(&self, url: &str) -> Result<Value, DexError> {
        self.get_json(url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamedResource {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChainLink {
    pub species: NamedResource,
    #[serde(default)]
    pub evolves_to: Vec<ChainLink>,
}

pub fn fetch_summary<C: PokeApiClient + ?Sized>(
    client: &C,
    id: u32,
) -> Result<ItemSummary, DexError> {
    client
        .fetch_pokemon(&ItemKey::Id(id))
        .and_then(|raw| extract_summary(&raw))
        .inspect_err(|err| tracing::warn!(id, error = %err, "summary fetch failed"))
}

pub fn fetch_detail<C: PokeApiClient + ?Sized>(
    client: &C,
    key: &ItemKey,
) -> Result<ItemDetail, DexError> {
    client
        .fetch_pokemon(key)
        .and_then(|raw| extract_detail(&raw))
        .inspect_err(|err| tracing::warn!(%key, error = %err, "detail fetch failed"))
}

pub fn fetch_lineage_root<C: PokeApiClient + ?Sized>(
    client: &C,
    species_url: &str,
) -> Result<ChainLink, DexError> {
    let result = client.fetch_url(species_url).and_then(|species| {
        let chain_url = species
            .get("evolution_chain")
            .and_then(|value| value.get("url"))
            .and_then(|value| value.as_str())
            .ok_or_else(|| {
                let name = species
                    .get("name")
                    .and_then(|value| value.as_str())
                    .unwrap_or(species_url);
                DexError::MissingLink(format!("no evolution chain for {name}"))
            })?;
        let chain = client.fetch_url(chain_url)?;
        extract_chain(&chain)
    });
    result.inspect_err(|err| tracing::warn!(species_url, error = %err, "lineage fetch failed"))
}

pub fn fetch_minimal<C: PokeApiClient + ?Sized>(client: &C, key: &ItemKey) -> LineageNode {
    match client.fetch_pokemon(key).and_then(|raw| extract_summary(&raw)) {
        Ok(summary) => LineageNode {
            id: summary.id.to_string(),
            name: summary.name,
            sprite: Some(summary.sprite),
        },
        Err(err) => {
            tracing::warn!(%key, error = %err, "minimal fetch failed, using placeholder");
            LineageNode::degraded(key)
        }
    }
}

pub fn extract_summary(raw: &Value) -> Result<ItemSummary, DexError> {
    Ok(ItemSummary {
        id: extract_id(raw)?,
        name: extract_name(raw)?,
        sprite: sprite_field(raw, "front_default")
            .unwrap_or_else(|| PLACEHOLDER_SPRITE.to_string()),
        categories: extract_categories(raw)?,
    })
}

pub fn extract_detail(raw: &Value) -> Result<ItemDetail, DexError> {
    let stats = raw
        .get("stats")
        .and_then(|value| value.as_array())
        .ok_or_else(|| DexError::Parse("missing stats".to_string()))?
        .iter()
        .map(|entry| {
            let name = entry
                .get("stat")
                .and_then(|value| value.get("name"))
                .and_then(|value| value.as_str())
                .ok_or_else(|| DexError::Parse("stat without name".to_string()))?;
            let value = entry
                .get("base_stat")
                .and_then(|value| value.as_u64())
                .and_then(|value| u32::try_from(value).ok())
                .ok_or_else(|| DexError::Parse(format!("stat {name} without base_stat")))?;
            Ok(Stat {
                name: name.to_string(),
                value,
            })
        })
        .collect::<Result<Vec<_>, DexError>>()?;

    let versions = raw
        .get("sprites")
        .and_then(|value| value.get("versions"))
        .filter(|value| value.is_object())
        .cloned()
        .unwrap_or_else(|| Value::Object(Default::default()));

    let species_url = raw
        .get("species")
        .and_then(|value| value.get("url"))
        .and_then(|value| value.as_str())
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string());

    Ok(ItemDetail {
        id: extract_id(raw)?,
        name: extract_name(raw)?,
        categories: extract_categories(raw)?,
        stats,
        sprites: SpriteSet {
            front_default: sprite_field(raw, "front_default"),
            front_shiny: sprite_field(raw, "front_shiny"),
            back_default: sprite_field(raw, "back_default"),
            back_shiny: sprite_field(raw, "back_shiny"),
        },
        versions,
        species_url,
    })
}

pub fn extract_chain(raw: &Value) -> Result<ChainLink, DexError> {
    let chain = raw
        .get("chain")
        .ok_or_else(|| DexError::Parse("evolution chain payload without chain".to_string()))?;
    serde_json::from_value(chain.clone()).map_err(|err| DexError::Parse(err.to_string()))
}

fn extract_id(raw: &Value) -> Result<u32, DexError> {
    raw.get("id")
        .and_then(|value| value.as_u64())
        .and_then(|value| u32::try_from(value).ok())
        .filter(|value| *value > 0)
        .ok_or_else(|| DexError::Parse("missing id".to_string()))
}

fn extract_name(raw: &Value) -> Result<String, DexError> {
    raw.get("name")
        .and_then(|value| value.as_str())
        .map(|value| value.to_string())
        .ok_or_else(|| DexError::Parse("missing name".to_string()))
}

fn extract_categories(raw: &Value) -> Result<Vec<String>, DexError> {
    let entries = raw
        .get("types")
        .and_then(|value| value.as_array())
        .ok_or_else(|| DexError::Parse("missing types".to_string()))?;
    let mut categories: Vec<String> = Vec::with_capacity(entries.len());
    for entry in entries {
        let name = entry
            .get("type")
            .and_then(|value| value.get("name"))
            .and_then(|value| value.as_str())
            .ok_or_else(|| DexError::Parse("type entry without name".to_string()))?;
        if !categories.iter().any(|existing| existing == name) {
            categories.push(name.to_string());
        }
    }
    Ok(categories)
}

fn sprite_field(raw: &Value, field: &str) -> Option<String> {
    raw.get("sprites")
        .and_then(|value| value.get(field))
        .and_then(|value| value.as_str())
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn pikachu() -> Value {
        json!({
            "id": 25,
            "name": "pikachu",
            "types": [{"slot": 1, "type": {"name": "electric", "url": "https://pokeapi.co/api/v2/type/13/"}}],
            "sprites": {
                "front_default": "https://img/25.png",
                "front_shiny": null,
                "back_default": "https://img/back/25.png"
            },
            "stats": [
                {"base_stat": 35, "stat": {"name": "hp"}},
                {"base_stat": 55, "stat": {"name": "attack"}}
            ],
            "species": {"name": "pikachu", "url": "https://pokeapi.co/api/v2/pokemon-species/25/"}
        })
    }

    #[test]
    fn summary_from_payload() {
        let summary = extract_summary(&pikachu()).unwrap();
        assert_eq!(summary.id, 25);
        assert_eq!(summary.sprite, "https://img/25.png");
        assert_eq!(summary.categories, vec!["electric".to_string()]);
    }

    #[test]
    fn summary_without_sprite_uses_placeholder() {
        let mut raw = pikachu();
        raw["sprites"]["front_default"] = Value::Null;
        let summary = extract_summary(&raw).unwrap();
        assert_eq!(summary.sprite, PLACEHOLDER_SPRITE);
    }

    #[test]
    fn summary_without_types_is_a_parse_error() {
        let mut raw = pikachu();
        raw.as_object_mut().unwrap().remove("types");
        let err = extract_summary(&raw).unwrap_err();
        assert!(matches!(err, DexError::Parse(_)));
    }

    #[test]
    fn detail_keeps_optional_sprites_and_species() {
        let detail = extract_detail(&pikachu()).unwrap();
        assert_eq!(detail.stats.len(), 2);
        assert_eq!(detail.sprites.front_shiny, None);
        assert_eq!(detail.sprites.back_default.as_deref(), Some("https://img/back/25.png"));
        assert_eq!(
            detail.species_url.as_deref(),
            Some("https://pokeapi.co/api/v2/pokemon-species/25/")
        );
        assert!(detail.versions.as_object().unwrap().is_empty());
    }

    #[test]
    fn chain_defaults_missing_children() {
        let raw = json!({"chain": {"species": {"name": "tauros", "url": "https://x/pokemon-species/128/"}}});
        let chain = extract_chain(&raw).unwrap();
        assert!(chain.evolves_to.is_empty());
    }
}
