use std::collections::{BTreeSet, HashSet};
use std::sync::Mutex;

use serde_json::{Value, json};

use pokedex_viewer::app::{App, ProgressEvent, ProgressSink};
use pokedex_viewer::catalog::Catalog;
use pokedex_viewer::config::ResolvedConfig;
use pokedex_viewer::domain::{ItemKey, ItemSummary, Theme};
use pokedex_viewer::error::DexError;
use pokedex_viewer::filter::{FilterCriteria, filter};
use pokedex_viewer::pokeapi::PokeApiClient;
use pokedex_viewer::view::{CardList, Session};

/// Generates a record per id, failing the ids it was told to.
struct RangeApi {
    failing: HashSet<u32>,
}

impl PokeApiClient for RangeApi {
    fn fetch_pokemon(&self, key: &ItemKey) -> Result<Value, DexError> {
        let ItemKey::Id(id) = key else {
            return Err(DexError::Status {
                status: 404,
                message: "Not Found".to_string(),
            });
        };
        if self.failing.contains(id) {
            return Err(DexError::Http(format!("timeout for {id}")));
        }
        let types = if id % 2 == 0 {
            json!([{"type": {"name": "fire"}}, {"type": {"name": "flying"}}])
        } else {
            json!([{"type": {"name": "water"}}])
        };
        Ok(json!({
            "id": id,
            "name": format!("mon-{id}"),
            "sprites": {"front_default": format!("https://sprites.example/{id}.png")},
            "types": types,
            "stats": []
        }))
    }

    fn fetch_url(&self, url: &str) -> Result<Value, DexError> {
        Err(DexError::Http(format!("unexpected request {url}")))
    }
}

#[derive(Default)]
struct RecordingSink {
    messages: Mutex<Vec<String>>,
}

impl ProgressSink for RecordingSink {
    fn event(&self, event: ProgressEvent) {
        self.messages.lock().unwrap().push(event.message);
    }
}

fn summary(id: u32, name: &str, categories: &[&str]) -> ItemSummary {
    ItemSummary {
        id,
        name: name.to_string(),
        sprite: format!("https://sprites.example/{id}.png"),
        categories: categories.iter().map(|c| c.to_string()).collect(),
    }
}

fn starters() -> Vec<ItemSummary> {
    vec![
        summary(1, "bulbasaur", &["grass", "poison"]),
        summary(4, "charmander", &["fire"]),
        summary(6, "charizard", &["fire", "flying"]),
        summary(7, "squirtle", &["water"]),
        summary(16, "pidgey", &["normal", "flying"]),
    ]
}

#[test]
fn partial_load_keeps_successes_in_order() {
    let api = RangeApi {
        failing: [2, 5, 9].into_iter().collect(),
    };
    let config = ResolvedConfig {
        item_count: 10,
        concurrency: 4,
        ..ResolvedConfig::default()
    };
    let app = App::new(api, config);
    let sink = RecordingSink::default();

    let (catalog, report) = app.load_catalog(&sink);

    assert_eq!(catalog.len(), 7);
    assert_eq!(report.failed, 3);
    assert_eq!(report.loaded, 7);
    let ids: Vec<u32> = catalog.summaries().iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 3, 4, 6, 7, 8, 10]);
    assert!(catalog.loaded_at().is_some());

    let messages = sink.messages.lock().unwrap();
    assert!(messages[0].starts_with("phase=Load;"));
    let last = messages.last().unwrap();
    assert!(last.contains("7 of 10"));
    assert!(last.contains("latency_ms="));
}

#[test]
fn load_where_every_fetch_fails_is_empty_not_an_error() {
    let api = RangeApi {
        failing: (1..=6).collect(),
    };
    let config = ResolvedConfig {
        item_count: 6,
        concurrency: 3,
        ..ResolvedConfig::default()
    };
    let app = App::new(api, config);

    let (catalog, report) = app.load_catalog(&RecordingSink::default());

    assert!(catalog.is_empty());
    assert!(catalog.categories().is_empty());
    assert_eq!(report.failed, 6);
    assert_eq!(report.loaded, 0);
    assert_eq!(catalog.requested(), 6);

    let session = Session::new(catalog, Theme::Light);
    assert!(matches!(session.view_model().cards, CardList::NoMatch { .. }));
    assert!(session.view_model().categories.is_empty());
}

#[test]
fn category_set_is_union_of_summaries() {
    let catalog = Catalog::from_summaries(starters());
    let union: BTreeSet<String> = starters()
        .iter()
        .flat_map(|s| s.categories.iter().cloned())
        .collect();
    assert_eq!(catalog.categories(), &union);
    let ordered: Vec<&str> = catalog.categories().iter().map(String::as_str).collect();
    assert_eq!(ordered, vec!["fire", "flying", "grass", "normal", "poison", "water"]);
}

#[test]
fn duplicate_ids_keep_first_occurrence() {
    let mut summaries = starters();
    summaries.push(summary(4, "impostor", &["ghost"]));
    let catalog = Catalog::from_summaries(summaries);
    assert_eq!(catalog.len(), 5);
    assert_eq!(catalog.get(4).unwrap().name, "charmander");
    assert!(!catalog.categories().contains("ghost"));
}

#[test]
fn category_selection_returns_supersets_only() {
    let items = starters();
    let criteria = FilterCriteria::new("", ["fire", "flying"]);
    let matched = filter(&items, &criteria);
    let names: Vec<&str> = matched.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["charizard"]);
}

#[test]
fn empty_criteria_returns_input_unchanged() {
    let items = starters();
    assert_eq!(filter(&items, &FilterCriteria::default()), items);
    assert_eq!(filter(&items, &FilterCriteria::new("   ", Vec::<String>::new())), items);
}

#[test]
fn filter_is_idempotent() {
    let items = starters();
    for criteria in [
        FilterCriteria::new("char", Vec::<String>::new()),
        FilterCriteria::new("", ["flying"]),
        FilterCriteria::new("PID", ["normal"]),
    ] {
        let once = filter(&items, &criteria);
        assert_eq!(filter(&once, &criteria), once);
    }
}

#[test]
fn search_is_case_insensitive_and_trimmed() {
    let items = starters();
    let matched = filter(&items, &FilterCriteria::new("  SAUR ", Vec::<String>::new()));
    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].id, 1);
}

#[test]
fn session_reports_no_match_state() {
    let mut session = Session::new(Catalog::from_summaries(starters()), Theme::Dark);
    session.set_search("char");
    session.toggle_category("water");
    assert!(matches!(session.view_model().cards, CardList::NoMatch { .. }));
    session.clear_categories();
    assert_eq!(session.view_model().cards.cards().len(), 2);
}
