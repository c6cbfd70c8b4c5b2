use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PokedexError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogReference {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u32);

impl RecordId {
    pub fn new(value: u32) -> Result<Self, PokedexError> {
        if value == 0 {
            return Err(PokedexError::InvalidRecordId(value.to_string()));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = PokedexError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim().trim_start_matches('#');
        let parsed = trimmed
            .parse::<u32>()
            .map_err(|_| PokedexError::InvalidRecordId(value.to_string()))?;
        Self::new(parsed).map_err(|_| PokedexError::InvalidRecordId(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub stat_name: String,
    pub base_value: u32,
}

/// Display-ready catalog entry. Built once by enrichment and never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub name: String,
    pub display_name: String,
    pub category: String,
    pub sprite_url: String,
    pub types: Vec<String>,
    pub stats: Vec<Stat>,
}

impl Record {
    pub fn matches(&self, needle: &str) -> bool {
        if needle.is_empty() {
            return true;
        }
        self.id.to_string().contains(needle)
            || self.name.to_lowercase().contains(needle)
            || self.display_name.to_lowercase().contains(needle)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PageWindow {
    pub limit: u32,
    pub offset: u32,
}

impl PageWindow {
    /// Window for a 1-based page, with the limit clamped to the catalog end.
    pub fn for_page(page_number: u32, page_size: u32, catalog_size: u32) -> Self {
        let offset = page_number
            .saturating_sub(1)
            .saturating_mul(page_size)
            .min(catalog_size);
        Self {
            limit: page_size.min(catalog_size - offset),
            offset,
        }
    }
}

impl fmt::Display for PageWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "limit={} offset={}", self.limit, self.offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Window(PageWindow),
    All,
    Detail(RecordId),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Window(window) => write!(f, "window({window})"),
            CacheKey::All => write!(f, "all"),
            CacheKey::Detail(id) => write!(f, "detail({id})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_window_is_clamped() {
        let window = PageWindow::for_page(8, 20, 151);
        assert_eq!(window, PageWindow { limit: 11, offset: 140 });
    }

    #[test]
    fn window_past_end_is_empty() {
        let window = PageWindow::for_page(12, 20, 151);
        assert_eq!(window.offset, 151);
        assert_eq!(window.limit, 0);
    }
}
