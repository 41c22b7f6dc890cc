use serde::Serialize;

use crate::catalog::Catalog;
use crate::detail::DetailState;
use crate::domain::{ItemKey, ItemSummary, Theme, capitalize, display_id};
use crate::filter::FilterCriteria;

pub const NO_MATCH_MESSAGE: &str = "No Pokémon match your criteria.";

pub trait RenderSink {
    fn render(&self, model: &ViewModel);
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    pub id: u32,
    pub display_id: String,
    pub name: String,
    pub sprite: String,
    pub categories: Vec<String>,
}

impl From<&ItemSummary> for Card {
    fn from(summary: &ItemSummary) -> Self {
        Self {
            id: summary.id,
            display_id: display_id(summary.id),
            name: summary.name.clone(),
            sprite: summary.sprite.clone(),
            categories: summary.categories.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CardList {
    Items { cards: Vec<Card> },
    NoMatch { message: &'static str },
}

impl CardList {
    pub fn cards(&self) -> &[Card] {
        match self {
            CardList::Items { cards } => cards,
            CardList::NoMatch { .. } => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryChip {
    pub name: String,
    pub label: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub theme: Theme,
    pub categories: Vec<CategoryChip>,
    pub cards: CardList,
    pub detail: Option<DetailState>,
}

/// Identifies one detail open. Only the most recent ticket may complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailTicket {
    seq: u64,
    key: ItemKey,
}

impl DetailTicket {
    pub fn key(&self) -> &ItemKey {
        &self.key
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    catalog: Catalog,
    criteria: FilterCriteria,
    detail: Option<DetailState>,
    detail_seq: u64,
    theme: Theme,
}

impl Session {
    pub fn new(catalog: Catalog, theme: Theme) -> Self {
        Self {
            catalog,
            criteria: FilterCriteria::default(),
            detail: None,
            detail_seq: 0,
            theme,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn replace_catalog(&mut self, catalog: Catalog) {
        self.catalog = catalog;
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn set_search(&mut self, term: &str) {
        self.criteria.search_term = term.to_string();
    }

    pub fn toggle_category(&mut self, category: &str) {
        self.criteria.toggle_category(category);
    }

    pub fn clear_categories(&mut self) {
        self.criteria.clear_categories();
    }

    pub fn detail(&self) -> Option<&DetailState> {
        self.detail.as_ref()
    }

    pub fn is_detail_open(&self) -> bool {
        self.detail.is_some()
    }

    pub fn open_detail(&mut self, key: ItemKey) -> DetailTicket {
        self.detail_seq += 1;
        self.detail = Some(DetailState::Loading { key: key.clone() });
        DetailTicket {
            seq: self.detail_seq,
            key,
        }
    }

    pub fn complete_detail(&mut self, ticket: &DetailTicket, state: DetailState) -> bool {
        if ticket.seq != self.detail_seq || self.detail.is_none() {
            tracing::debug!(key = %ticket.key, "dropping superseded detail result");
            return false;
        }
        self.detail = Some(state);
        true
    }

    pub fn close_detail(&mut self) {
        self.detail_seq += 1;
        self.detail = None;
    }

    pub fn visible(&self) -> Vec<ItemSummary> {
        self.catalog.filter(&self.criteria)
    }

    pub fn view_model(&self) -> ViewModel {
        let visible = self.visible();
        let cards = if visible.is_empty() {
            CardList::NoMatch {
                message: NO_MATCH_MESSAGE,
            }
        } else {
            CardList::Items {
                cards: visible.iter().map(Card::from).collect(),
            }
        };
        let categories = self
            .catalog
            .categories()
            .iter()
            .map(|name| CategoryChip {
                name: name.clone(),
                label: capitalize(name),
                selected: self.criteria.selected_categories.contains(name),
            })
            .collect();
        ViewModel {
            theme: self.theme,
            categories,
            cards,
            detail: self.detail.clone(),
        }
    }

    pub fn render(&self, sink: &dyn RenderSink) {
        sink.render(&self.view_model());
    }
}
