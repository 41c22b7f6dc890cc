use serde::Serialize;

use crate::domain::{ItemDetail, ItemKey, LineageNode};
use crate::error::ErrorKind;
use crate::fanout::settle_all;
use crate::pokeapi::{ChainLink, PokeApiClient, fetch_lineage_root, fetch_minimal};

pub const NO_SPECIES_MESSAGE: &str = "Species data unavailable, cannot fetch evolution.";
pub const NO_CHAIN_MESSAGE: &str = "No evolution data found for this species.";
pub const NO_EVOLUTION_MESSAGE: &str = "This Pokémon does not evolve or data is unavailable.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineageStage {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum LineageGap {
    NoSpecies,
    NoChain { kind: ErrorKind },
}

impl LineageGap {
    pub fn message(self) -> &'static str {
        match self {
            LineageGap::NoSpecies => NO_SPECIES_MESSAGE,
            LineageGap::NoChain { .. } => NO_CHAIN_MESSAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Lineage {
    Resolved { nodes: Vec<LineageNode> },
    Unavailable { gap: LineageGap },
}

impl Lineage {
    pub fn nodes(&self) -> &[LineageNode] {
        match self {
            Lineage::Resolved { nodes } => nodes,
            Lineage::Unavailable { .. } => &[],
        }
    }

    pub fn evolves(&self) -> bool {
        self.nodes().len() > 1
    }

    pub fn notice(&self) -> Option<&'static str> {
        match self {
            Lineage::Unavailable { gap } => Some(gap.message()),
            Lineage::Resolved { .. } if !self.evolves() => Some(NO_EVOLUTION_MESSAGE),
            Lineage::Resolved { .. } => None,
        }
    }
}

pub fn resolve<C: PokeApiClient + ?Sized>(
    client: &C,
    detail: &ItemDetail,
    concurrency: usize,
) -> Lineage {
    let Some(species_url) = detail.species_url.as_deref() else {
        tracing::warn!(id = detail.id, "no species reference, lineage unavailable");
        return Lineage::Unavailable {
            gap: LineageGap::NoSpecies,
        };
    };

    let root = match fetch_lineage_root(client, species_url) {
        Ok(root) => root,
        Err(err) => {
            return Lineage::Unavailable {
                gap: LineageGap::NoChain { kind: err.kind() },
            };
        }
    };

    let stages = walk_first_branch(&root);
    let nodes = resolve_sprites(client, &stages, concurrency);
    Lineage::Resolved { nodes }
}

/// Follows `evolves_to[0]` from the root. Stages whose species URL carries
/// no id are skipped.
pub fn walk_first_branch(root: &ChainLink) -> Vec<LineageStage> {
    let mut stages = Vec::new();
    let mut current = Some(root);
    while let Some(link) = current {
        match species_id(&link.species.url) {
            Some(id) => stages.push(LineageStage {
                id: id.to_string(),
                name: link.species.name.clone(),
            }),
            None => tracing::warn!(species = %link.species.name, "species url without id"),
        }
        current = link.evolves_to.first();
    }
    stages
}

/// Final non-empty path segment, e.g. `.../pokemon-species/25/` -> `25`.
pub fn species_id(url: &str) -> Option<&str> {
    url.split('/').filter(|part| !part.is_empty()).next_back()
}

fn resolve_sprites<C: PokeApiClient + ?Sized>(
    client: &C,
    stages: &[LineageStage],
    concurrency: usize,
) -> Vec<LineageNode> {
    let fetched = settle_all(stages, concurrency, |stage| {
        let key = stage
            .id
            .parse::<ItemKey>()
            .unwrap_or_else(|_| ItemKey::Name(stage.id.clone()));
        fetch_minimal(client, &key)
    });
    stages
        .iter()
        .zip(fetched)
        .map(|(stage, minimal)| LineageNode {
            id: stage.id.clone(),
            name: stage.name.clone(),
            sprite: minimal.sprite,
        })
        .collect()
}
