pub mod app;
pub mod catalog;
pub mod config;
pub mod detail;
pub mod domain;
pub mod error;
pub mod fanout;
pub mod filter;
pub mod lineage;
pub mod output;
pub mod pokeapi;
pub mod prefs;
pub mod tui;
pub mod view;
