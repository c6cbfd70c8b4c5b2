use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::PokedexError;

pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_CATALOG_SIZE: u32 = 151;
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_LANGUAGE: &str = "ko";
pub const CONFIG_FILE_NAME: &str = "pokedex.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub catalog_size: Option<u32>,
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub data_dir: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub catalog_size: u32,
    pub page_size: u32,
}

impl CatalogConfig {
    pub fn total_pages(&self) -> u32 {
        total_pages(self.catalog_size as usize, self.page_size)
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            catalog_size: DEFAULT_CATALOG_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_url: String,
    pub catalog: CatalogConfig,
    pub language: String,
    pub request_timeout: Option<Duration>,
    pub data_dir: Option<Utf8PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            catalog: CatalogConfig::default(),
            language: DEFAULT_LANGUAGE.to_string(),
            request_timeout: None,
            data_dir: None,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads `pokedex.json` from the working directory, or `path` when given.
    /// A missing default file resolves to defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, PokedexError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(CONFIG_FILE_NAME),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| PokedexError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| PokedexError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, PokedexError> {
        let catalog_size = config.catalog_size.unwrap_or(DEFAULT_CATALOG_SIZE);
        let page_size = config.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if catalog_size == 0 {
            return Err(PokedexError::ConfigInvalid(
                "catalog_size must be positive".to_string(),
            ));
        }
        if page_size == 0 {
            return Err(PokedexError::ConfigInvalid(
                "page_size must be positive".to_string(),
            ));
        }

        let base_url = config
            .base_url
            .map(|url| url.trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let language = config
            .language
            .map(|lang| lang.trim().to_lowercase())
            .filter(|lang| !lang.is_empty())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        Ok(ResolvedConfig {
            base_url,
            catalog: CatalogConfig {
                catalog_size,
                page_size,
            },
            language,
            request_timeout: config.request_timeout_secs.map(Duration::from_secs),
            data_dir: config.data_dir.map(Utf8PathBuf::from),
        })
    }
}

pub fn total_pages(count: usize, page_size: u32) -> u32 {
    let page_size = page_size.max(1) as usize;
    count.div_ceil(page_size) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_resolves_to_defaults() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
        assert_eq!(resolved.catalog, CatalogConfig::default());
        assert_eq!(resolved.language, "ko");
        assert!(resolved.request_timeout.is_none());
    }

    #[test]
    fn bounded_catalog_has_eight_pages() {
        assert_eq!(CatalogConfig::default().total_pages(), 8);
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(total_pages(20, 20), 1);
        assert_eq!(total_pages(21, 20), 2);
    }
}
