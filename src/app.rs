use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::api::CatalogClient;
use crate::bookmarks::BookmarkStore;
use crate::domain::{Record, RecordId};
use crate::error::PokedexError;
use crate::listing::{ListingCoordinator, ListingView, NavState, handle_page_change};
use crate::store::KeyValueStorage;

#[derive(Debug, Clone, Serialize)]
pub struct DetailResult {
    pub record: Record,
    pub bookmarked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookmarksResult {
    pub bookmarks: Vec<Record>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleResult {
    pub id: RecordId,
    pub name: String,
    pub bookmarked: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkResult {
    pub link: String,
}

pub struct App<C, S> {
    coordinator: Arc<ListingCoordinator<C>>,
    bookmarks: BookmarkStore<S>,
    nav: NavState,
}

impl<C: CatalogClient + 'static, S: KeyValueStorage> App<C, S> {
    pub fn new(
        coordinator: ListingCoordinator<C>,
        bookmarks: BookmarkStore<S>,
        nav: NavState,
    ) -> Self {
        Self {
            coordinator: Arc::new(coordinator),
            bookmarks,
            nav,
        }
    }

    pub fn nav(&self) -> &NavState {
        &self.nav
    }

    pub fn coordinator(&self) -> &Arc<ListingCoordinator<C>> {
        &self.coordinator
    }

    pub fn bookmarks(&self) -> &BookmarkStore<S> {
        &self.bookmarks
    }

    pub fn link(&self) -> LinkResult {
        LinkResult {
            link: self.nav.to_link(),
        }
    }

    pub fn navigate(&mut self, nav: NavState) {
        self.nav = nav;
    }

    pub fn search(&mut self, text: &str) {
        info!(query = text, "intent.search");
        self.nav = self.nav.with_search(text);
    }

    /// `page_number` is 1-based; it is clamped against the page count of the
    /// view currently on screen.
    pub fn go_to_page(&mut self, page_number: u32) {
        let total = self.snapshot().total_pages;
        info!(page_number, total, "intent.go_to_page");
        self.nav = handle_page_change(&self.nav, i64::from(page_number) - 1, total);
    }

    pub fn next_page(&mut self) {
        let view = self.snapshot();
        self.nav = handle_page_change(&self.nav, i64::from(view.page_number), view.total_pages);
    }

    pub fn previous_page(&mut self) {
        let view = self.snapshot();
        self.nav = handle_page_change(
            &self.nav,
            i64::from(view.page_number) - 2,
            view.total_pages,
        );
    }

    pub async fn view(&self) -> ListingView {
        self.coordinator.load(&self.nav, self.bookmarks.ids()).await
    }

    pub fn snapshot(&self) -> ListingView {
        self.coordinator.snapshot(&self.nav, self.bookmarks.ids())
    }

    pub async fn detail(&self, id: RecordId) -> Result<DetailResult, PokedexError> {
        let record = self.coordinator.detail(id).await?;
        Ok(DetailResult {
            bookmarked: self.bookmarks.contains(record.id),
            record,
        })
    }

    /// Toggles using the record already on screen or bookmarked, fetching it
    /// only when neither has it.
    pub async fn toggle_bookmark(&mut self, id: RecordId) -> Result<ToggleResult, PokedexError> {
        let record = match self.known_record(id) {
            Some(record) => record,
            None => self.coordinator.detail(id).await?,
        };
        self.toggle_record(&record)
    }

    pub fn toggle_record(&mut self, record: &Record) -> Result<ToggleResult, PokedexError> {
        let bookmarked = self.bookmarks.toggle(record)?;
        info!(id = %record.id, bookmarked, "intent.toggle_bookmark");
        Ok(ToggleResult {
            id: record.id,
            name: record.name.clone(),
            bookmarked,
        })
    }

    pub fn list_bookmarks(&self) -> BookmarksResult {
        BookmarksResult {
            bookmarks: self.bookmarks.records().to_vec(),
        }
    }

    fn known_record(&self, id: RecordId) -> Option<Record> {
        if let Some(record) = self.bookmarks.get(id) {
            return Some(record.clone());
        }
        self.snapshot()
            .records
            .into_iter()
            .find(|record| record.id == id)
    }
}
