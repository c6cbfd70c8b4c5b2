pub mod api;
pub mod app;
pub mod bookmarks;
pub mod cache;
pub mod config;
pub mod domain;
pub mod enrich;
pub mod error;
pub mod listing;
pub mod output;
pub mod store;
pub mod tui;
