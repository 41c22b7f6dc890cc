use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink};
use crate::domain::{ItemSummary, display_id};
use crate::fanout::settle_all;
use crate::filter::{FilterCriteria, filter};
use crate::pokeapi::{PokeApiClient, fetch_summary};

#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    summaries: Vec<ItemSummary>,
    categories: BTreeSet<String>,
    requested: u32,
    loaded_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadReport {
    pub requested: u32,
    pub loaded: usize,
    pub failed: usize,
    pub categories: usize,
    pub elapsed_ms: u128,
}

impl Catalog {
    pub fn load_all<C: PokeApiClient + ?Sized>(
        client: &C,
        count: u32,
        concurrency: usize,
        sink: &dyn ProgressSink,
    ) -> (Self, LoadReport) {
        sink.event(ProgressEvent {
            message: format!("phase=Load; fetching {count} summaries"),
            elapsed: None,
        });
        let start = Instant::now();
        let ids: Vec<u32> = (1..=count).collect();
        let results = settle_all(&ids, concurrency, |id| fetch_summary(client, *id));

        let failed = results.iter().filter(|result| result.is_err()).count();
        let summaries = results.into_iter().filter_map(Result::ok).collect();
        let mut catalog = Self::from_summaries(summaries);
        catalog.requested = count;
        catalog.loaded_at = Some(chrono::Utc::now().to_rfc3339());

        let elapsed = start.elapsed();
        let report = LoadReport {
            requested: count,
            loaded: catalog.len(),
            failed,
            categories: catalog.categories.len(),
            elapsed_ms: elapsed.as_millis(),
        };
        tracing::info!(
            requested = report.requested,
            loaded = report.loaded,
            failed = report.failed,
            "catalog loaded"
        );
        sink.event(ProgressEvent {
            message: format!(
                "phase=Ready; loaded {} of {} ({} failed) latency_ms={}",
                report.loaded, report.requested, report.failed, report.elapsed_ms
            ),
            elapsed: Some(elapsed),
        });
        (catalog, report)
    }

    pub fn from_summaries(summaries: Vec<ItemSummary>) -> Self {
        let mut seen = HashSet::new();
        let summaries: Vec<ItemSummary> = summaries
            .into_iter()
            .filter(|summary| seen.insert(summary.id))
            .collect();
        let categories = summaries
            .iter()
            .flat_map(|summary| summary.categories.iter().cloned())
            .collect();
        Self {
            requested: u32::try_from(summaries.len()).unwrap_or(u32::MAX),
            summaries,
            categories,
            loaded_at: None,
        }
    }

    pub fn summaries(&self) -> &[ItemSummary] {
        &self.summaries
    }

    pub fn categories(&self) -> &BTreeSet<String> {
        &self.categories
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    pub fn requested(&self) -> u32 {
        self.requested
    }

    pub fn loaded_at(&self) -> Option<&str> {
        self.loaded_at.as_deref()
    }

    pub fn get(&self, id: u32) -> Option<&ItemSummary> {
        self.summaries.iter().find(|summary| summary.id == id)
    }

    pub fn filter(&self, criteria: &FilterCriteria) -> Vec<ItemSummary> {
        filter(&self.summaries, criteria)
    }

    pub fn describe(&self, id: u32) -> Option<String> {
        self.get(id)
            .map(|summary| format!("{} {}", display_id(summary.id), summary.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: u32, name: &str, categories: &[&str]) -> ItemSummary {
        ItemSummary {
            id,
            name: name.to_string(),
            sprite: format!("https://img/{id}.png"),
            categories: categories.iter().map(|value| value.to_string()).collect(),
        }
    }

    #[test]
    fn categories_are_the_union() {
        let catalog = Catalog::from_summaries(vec![
            summary(1, "bulbasaur", &["grass", "poison"]),
            summary(4, "charmander", &["fire"]),
            summary(6, "charizard", &["fire", "flying"]),
        ]);
        let expected: BTreeSet<String> = ["fire", "flying", "grass", "poison"]
            .iter()
            .map(|value| value.to_string())
            .collect();
        assert_eq!(catalog.categories(), &expected);
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let catalog = Catalog::from_summaries(vec![
            summary(1, "bulbasaur", &["grass"]),
            summary(1, "impostor", &["normal"]),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(1).unwrap().name, "bulbasaur");
        assert!(!catalog.categories().contains("normal"));
    }

    #[test]
    fn requested_counts_distinct_summaries() {
        let catalog = Catalog::from_summaries(vec![
            summary(1, "bulbasaur", &["grass"]),
            summary(1, "impostor", &["normal"]),
            summary(7, "squirtle", &["water"]),
        ]);
        assert_eq!(catalog.requested(), 2);
        assert_eq!(Catalog::from_summaries(Vec::new()).requested(), 0);
    }

    #[test]
    fn describe_uses_padded_id() {
        let catalog = Catalog::from_summaries(vec![summary(25, "pikachu", &["electric"])]);
        assert_eq!(catalog.describe(25).as_deref(), Some("#0025 pikachu"));
        assert_eq!(catalog.describe(26), None);
    }
}
