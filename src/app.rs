use std::time::{Duration, Instant};

use serde::Serialize;

use crate::catalog::{Catalog, LoadReport};
use crate::config::ResolvedConfig;
use crate::detail::{self, DetailState};
use crate::domain::{ItemKey, ItemSummary, capitalize};
use crate::filter::FilterCriteria;
use crate::pokeapi::PokeApiClient;
use crate::view::Session;

#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub total: usize,
    pub matched: usize,
    pub criteria: FilterCriteria,
    pub items: Vec<ItemSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoriesResult {
    pub categories: Vec<CategoryEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryEntry {
    pub name: String,
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Clone)]
pub struct App<C: PokeApiClient> {
    client: C,
    config: ResolvedConfig,
}

impl<C: PokeApiClient> App<C> {
    pub fn new(client: C, config: ResolvedConfig) -> Self {
        Self { client, config }
    }

    pub fn load_catalog(&self, sink: &dyn ProgressSink) -> (Catalog, LoadReport) {
        Catalog::load_all(
            &self.client,
            self.config.item_count,
            self.config.concurrency,
            sink,
        )
    }

    pub fn list(&self, catalog: &Catalog, criteria: FilterCriteria) -> ListResult {
        let items = catalog.filter(&criteria);
        ListResult {
            total: catalog.len(),
            matched: items.len(),
            criteria,
            items,
        }
    }

    pub fn categories(&self, catalog: &Catalog) -> CategoriesResult {
        let categories = catalog
            .categories()
            .iter()
            .map(|name| CategoryEntry {
                name: name.clone(),
                label: capitalize(name),
                count: catalog
                    .summaries()
                    .iter()
                    .filter(|summary| summary.has_category(name))
                    .count(),
            })
            .collect();
        CategoriesResult { categories }
    }

    pub fn detail(&self, key: &ItemKey, sink: &dyn ProgressSink) -> DetailState {
        sink.event(ProgressEvent {
            message: format!("phase=Detail; loading {key}"),
            elapsed: None,
        });
        let start = Instant::now();
        let state = detail::assemble(&self.client, key, self.config.concurrency);
        let elapsed = start.elapsed();
        let outcome = match &state {
            DetailState::Ready { .. } => "ready",
            DetailState::Failed { .. } => "failed",
            DetailState::Loading { .. } => "loading",
        };
        sink.event(ProgressEvent {
            message: format!(
                "phase=Ready; detail {key} {outcome} latency_ms={}",
                elapsed.as_millis()
            ),
            elapsed: Some(elapsed),
        });
        state
    }

    pub fn open_detail(
        &self,
        session: &mut Session,
        key: ItemKey,
        sink: &dyn ProgressSink,
    ) -> bool {
        let ticket = session.open_detail(key);
        let state = self.detail(ticket.key(), sink);
        session.complete_detail(&ticket, state)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::{Value, json};

    use super::*;
    use crate::error::DexError;

    struct NoopSink;

    impl ProgressSink for NoopSink {
        fn event(&self, _event: ProgressEvent) {}
    }

    struct FixtureApi {
        pokemon: HashMap<String, Value>,
    }

    impl PokeApiClient for FixtureApi {
        fn fetch_pokemon(&self, key: &ItemKey) -> Result<Value, DexError> {
            self.pokemon
                .get(&key.path_segment())
                .cloned()
                .ok_or_else(|| DexError::Status {
                    status: 404,
                    message: "Not Found".to_string(),
                })
        }

        fn fetch_url(&self, _url: &str) -> Result<Value, DexError> {
            Err(DexError::Http("offline".to_string()))
        }
    }

    fn entry(id: u32, name: &str, types: &[&str]) -> Value {
        json!({
            "id": id,
            "name": name,
            "sprites": {"front_default": format!("https://img/{id}.png")},
            "types": types.iter().map(|t| json!({"type": {"name": t}})).collect::<Vec<_>>(),
            "stats": []
        })
    }

    fn app() -> App<FixtureApi> {
        let mut pokemon = HashMap::new();
        pokemon.insert("1".to_string(), entry(1, "bulbasaur", &["grass", "poison"]));
        pokemon.insert("2".to_string(), entry(2, "ivysaur", &["grass", "poison"]));
        pokemon.insert("4".to_string(), entry(4, "charmander", &["fire"]));
        let config = ResolvedConfig {
            item_count: 4,
            concurrency: 2,
            ..ResolvedConfig::default()
        };
        App::new(FixtureApi { pokemon }, config)
    }

    #[test]
    fn load_skips_missing_ids() {
        let (catalog, report) = app().load_catalog(&NoopSink);
        assert_eq!(catalog.len(), 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.requested, 4);
    }

    #[test]
    fn categories_are_counted_and_labelled() {
        let app = app();
        let (catalog, _) = app.load_catalog(&NoopSink);
        let result = app.categories(&catalog);
        let grass = result
            .categories
            .iter()
            .find(|entry| entry.name == "grass")
            .unwrap();
        assert_eq!(grass.count, 2);
        assert_eq!(grass.label, "Grass");
    }

    #[test]
    fn list_reports_match_counts() {
        let app = app();
        let (catalog, _) = app.load_catalog(&NoopSink);
        let result = app.list(&catalog, FilterCriteria::new("saur", ["poison"]));
        assert_eq!(result.total, 3);
        assert_eq!(result.matched, 2);
    }
}
