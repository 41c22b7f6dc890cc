use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::ItemSummary;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub search_term: String,
    pub selected_categories: BTreeSet<String>,
}

impl FilterCriteria {
    pub fn new<I, S>(search_term: &str, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            search_term: search_term.to_string(),
            selected_categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized_term().is_empty() && self.selected_categories.is_empty()
    }

    pub fn toggle_category(&mut self, category: &str) {
        if !self.selected_categories.remove(category) {
            self.selected_categories.insert(category.to_string());
        }
    }

    pub fn clear_categories(&mut self) {
        self.selected_categories.clear();
    }

    pub fn matches(&self, summary: &ItemSummary) -> bool {
        let categories_match = self
            .selected_categories
            .iter()
            .all(|category| summary.has_category(category));
        if !categories_match {
            return false;
        }
        let term = self.normalized_term();
        term.is_empty() || summary.name.to_lowercase().contains(&term)
    }

    fn normalized_term(&self) -> String {
        self.search_term.trim().to_lowercase()
    }
}

pub fn filter(summaries: &[ItemSummary], criteria: &FilterCriteria) -> Vec<ItemSummary> {
    summaries
        .iter()
        .filter(|summary| criteria.matches(summary))
        .cloned()
        .collect()
}
