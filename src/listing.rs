use std::collections::BTreeSet;
use std::sync::Arc;

use reqwest::Url;
use serde::Serialize;
use tracing::debug;

use crate::api::CatalogClient;
use crate::cache::{QueryCache, QueryState};
use crate::config::{CatalogConfig, total_pages};
use crate::domain::{CacheKey, PageWindow, Record, RecordId};
use crate::enrich::Enricher;
use crate::error::PokedexError;

pub const NAV_BASE: &str = "pokedex://browse";
const PAGE_PARAM: &str = "page";
const SEARCH_PARAM: &str = "search";

/// Shareable navigation state: the raw `page` and `search` parameters of a
/// browse link. Only whole-state replacements are exposed, so the search
/// text and the page it resets can never be written separately.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavState {
    page: Option<String>,
    search: Option<String>,
}

impl NavState {
    pub fn parse(link: &str) -> Result<Self, PokedexError> {
        let url =
            Url::parse(link).map_err(|err| PokedexError::InvalidNavigation(err.to_string()))?;
        let mut nav = NavState::default();
        for (name, value) in url.query_pairs() {
            match name.as_ref() {
                PAGE_PARAM => nav.page = Some(value.into_owned()),
                SEARCH_PARAM => nav.search = Some(value.into_owned()),
                _ => {}
            }
        }
        Ok(nav)
    }

    pub fn from_parts(page: Option<u32>, search: Option<&str>) -> Self {
        Self {
            page: page.map(|page| page.to_string()),
            search: search
                .map(normalize_search)
                .filter(|search| !search.is_empty()),
        }
    }

    pub fn to_link(&self) -> String {
        let mut url = Url::parse(NAV_BASE).expect("NAV_BASE is a valid URL");
        {
            let mut pairs = url.query_pairs_mut();
            if let Some(page) = &self.page {
                pairs.append_pair(PAGE_PARAM, page);
            }
            if let Some(search) = &self.search {
                pairs.append_pair(SEARCH_PARAM, search);
            }
        }
        let link = url.to_string();
        link.strip_suffix('?').map(str::to_string).unwrap_or(link)
    }

    /// New state for an edited search: the text replaces the old one and the
    /// page goes back to 1 in the same write.
    pub fn with_search(&self, text: &str) -> Self {
        let search = normalize_search(text);
        Self {
            page: Some("1".to_string()),
            search: (!search.is_empty()).then_some(search),
        }
    }

    pub fn with_page(&self, page_number: u32) -> Self {
        Self {
            page: Some(page_number.max(1).to_string()),
            search: self.search.clone(),
        }
    }
}

fn normalize_search(text: &str) -> String {
    text.to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingMode {
    Browsing,
    Searching,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingState {
    pub page_number: u32,
    pub search_query: String,
}

impl ListingState {
    /// Pure derivation; invalid or missing pages read as 1.
    pub fn from_nav(nav: &NavState) -> Self {
        let page_number = nav
            .page
            .as_deref()
            .and_then(|page| page.trim().parse::<u32>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1);
        let search_query = nav.search.clone().unwrap_or_default();
        Self {
            page_number,
            search_query,
        }
    }

    pub fn mode(&self) -> ListingMode {
        if self.search_query.trim().is_empty() {
            ListingMode::Browsing
        } else {
            ListingMode::Searching
        }
    }

    /// Browsing fetches one clamped page window; searching fetches the whole
    /// catalog under one key whatever the query text is.
    pub fn cache_key(&self, catalog: &CatalogConfig) -> CacheKey {
        match self.mode() {
            ListingMode::Browsing => {
                let page = clamp_page(self.page_number, catalog.total_pages());
                CacheKey::Window(PageWindow::for_page(
                    page,
                    catalog.page_size,
                    catalog.catalog_size,
                ))
            }
            ListingMode::Searching => CacheKey::All,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingView {
    pub records: Vec<Record>,
    pub is_loading: bool,
    pub is_error: bool,
    pub page_number: u32,
    pub total_pages: u32,
    pub mode: ListingMode,
    pub search_query: String,
    pub bookmarked_ids: BTreeSet<RecordId>,
}

impl ListingView {
    pub fn has_previous(&self) -> bool {
        self.page_number > 1
    }

    pub fn has_next(&self) -> bool {
        self.page_number < self.total_pages
    }
}

pub fn clamp_page(page_number: u32, total_pages: u32) -> u32 {
    page_number.clamp(1, total_pages.max(1))
}

/// Case-insensitive substring filter over id, source name and localized
/// name. Ids beyond the catalog are dropped.
pub fn filter_records(records: &[Record], query: &str, catalog_size: u32) -> Vec<Record> {
    let needle = query.trim().to_lowercase();
    records
        .iter()
        .filter(|record| record.id.get() <= catalog_size && record.matches(&needle))
        .cloned()
        .collect()
}

pub fn paginate(records: &[Record], page_number: u32, page_size: u32) -> Vec<Record> {
    let start = page_number.saturating_sub(1) as usize * page_size as usize;
    records
        .iter()
        .skip(start)
        .take(page_size as usize)
        .cloned()
        .collect()
}

/// Writes a page change. `target` is 0-based and clamped to
/// `[0, total_pages - 1]`; the stored page is 1-based.
pub fn handle_page_change(nav: &NavState, target: i64, total_pages: u32) -> NavState {
    let last = i64::from(total_pages.saturating_sub(1));
    let clamped = target.clamp(0, last);
    nav.with_page(clamped as u32 + 1)
}

pub struct ListingCoordinator<C> {
    enricher: Arc<Enricher<C>>,
    listings: QueryCache,
    details: QueryCache,
    catalog: CatalogConfig,
}

impl<C: CatalogClient + 'static> ListingCoordinator<C> {
    pub fn new(enricher: Enricher<C>, catalog: CatalogConfig) -> Self {
        Self {
            enricher: Arc::new(enricher),
            listings: QueryCache::new(),
            details: QueryCache::new(),
            catalog,
        }
    }

    pub fn enricher(&self) -> &Enricher<C> {
        &self.enricher
    }

    pub fn cache(&self) -> &QueryCache {
        &self.listings
    }

    pub async fn load(&self, nav: &NavState, bookmarked_ids: BTreeSet<RecordId>) -> ListingView {
        let state = ListingState::from_nav(nav);
        let key = state.cache_key(&self.catalog);
        let enricher = self.enricher.clone();
        let catalog_size = self.catalog.catalog_size;
        let query = self
            .listings
            .query(key, move || produce(enricher, key, catalog_size))
            .await;
        self.build_view(&state, &query, bookmarked_ids)
    }

    pub fn snapshot(&self, nav: &NavState, bookmarked_ids: BTreeSet<RecordId>) -> ListingView {
        let state = ListingState::from_nav(nav);
        let key = state.cache_key(&self.catalog);
        let query = self.listings.snapshot(key);
        self.build_view(&state, &query, bookmarked_ids)
    }

    pub fn invalidate(&self, nav: &NavState) {
        let key = ListingState::from_nav(nav).cache_key(&self.catalog);
        self.listings.invalidate(key);
    }

    pub async fn detail(&self, id: RecordId) -> Result<Record, PokedexError> {
        let key = CacheKey::Detail(id);
        let enricher = self.enricher.clone();
        let catalog_size = self.catalog.catalog_size;
        let query = self
            .details
            .query(key, move || produce(enricher, key, catalog_size))
            .await;
        if let Some(err) = query.error {
            return Err(err);
        }
        query
            .records
            .first()
            .cloned()
            .ok_or(PokedexError::RecordNotFound(id.get()))
    }

    fn build_view(
        &self,
        state: &ListingState,
        query: &QueryState,
        bookmarked_ids: BTreeSet<RecordId>,
    ) -> ListingView {
        let page_size = self.catalog.page_size;
        let mode = state.mode();
        let (records, total) = match mode {
            ListingMode::Browsing => (query.records.to_vec(), self.catalog.total_pages()),
            ListingMode::Searching => {
                let filtered =
                    filter_records(&query.records, &state.search_query, self.catalog.catalog_size);
                let total = total_pages(filtered.len(), page_size);
                let page = clamp_page(state.page_number, total);
                (paginate(&filtered, page, page_size), total)
            }
        };
        let page_number = clamp_page(state.page_number, total);
        debug!(
            key = %query.key,
            page_number,
            total,
            count = records.len(),
            placeholder = query.is_placeholder,
            "listing.view"
        );
        ListingView {
            records,
            is_loading: query.is_loading(),
            is_error: query.is_error(),
            page_number,
            total_pages: total,
            mode,
            search_query: state.search_query.clone(),
            bookmarked_ids,
        }
    }
}

async fn produce<C: CatalogClient>(
    enricher: Arc<Enricher<C>>,
    key: CacheKey,
    catalog_size: u32,
) -> Result<Vec<Record>, PokedexError> {
    match key {
        CacheKey::Window(window) => {
            if window.limit == 0 {
                return Ok(Vec::new());
            }
            let references = enricher
                .client()
                .list_page(window.limit, window.offset)
                .await?;
            enricher.enrich_all(&references).await
        }
        CacheKey::All => {
            let references = enricher.client().list_page(catalog_size, 0).await?;
            enricher.enrich_all(&references).await
        }
        CacheKey::Detail(id) => Ok(vec![enricher.enrich_by_id(id).await?]),
    }
}
