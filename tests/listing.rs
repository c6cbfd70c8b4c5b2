mod common;

use std::collections::{BTreeSet, HashSet};

use common::{MockCatalog, record};
use pokedex_browser::config::CatalogConfig;
use pokedex_browser::domain::{CacheKey, RecordId};
use pokedex_browser::enrich::Enricher;
use pokedex_browser::listing::{
    ListingCoordinator, ListingMode, ListingState, NavState, filter_records, handle_page_change,
    paginate,
};

fn coordinator(catalog: MockCatalog) -> ListingCoordinator<MockCatalog> {
    ListingCoordinator::new(Enricher::new(catalog, "ko"), CatalogConfig::default())
}

fn page(n: u32) -> NavState {
    NavState::from_parts(Some(n), None)
}

#[tokio::test]
async fn browsing_has_eight_pages_and_short_last_page() {
    let coordinator = coordinator(MockCatalog::new(151));

    let first = coordinator.load(&page(1), BTreeSet::new()).await;
    assert_eq!(first.mode, ListingMode::Browsing);
    assert_eq!(first.total_pages, 8);
    assert_eq!(first.records.len(), 20);
    assert!(!first.is_loading);
    assert!(!first.is_error);

    let last = coordinator.load(&page(8), BTreeSet::new()).await;
    assert_eq!(last.page_number, 8);
    assert_eq!(last.records.len(), 11);
    assert_eq!(last.records.last().unwrap().id.get(), 151);
}

#[tokio::test]
async fn pages_reconstruct_the_catalog_without_duplicates() {
    let coordinator = coordinator(MockCatalog::new(151));
    let mut seen = HashSet::new();
    for n in 1..=8 {
        let view = coordinator.load(&page(n), BTreeSet::new()).await;
        for record in view.records {
            assert!(seen.insert(record.id.get()), "duplicate id {}", record.id);
        }
    }
    assert_eq!(seen.len(), 151);
    assert_eq!(coordinator.enricher().client().list_calls(), 8);
}

#[tokio::test]
async fn revisiting_a_page_does_not_refetch() {
    let coordinator = coordinator(MockCatalog::new(151));
    coordinator.load(&page(2), BTreeSet::new()).await;
    coordinator.load(&page(3), BTreeSet::new()).await;
    coordinator.load(&page(2), BTreeSet::new()).await;
    assert_eq!(coordinator.enricher().client().list_calls(), 2);
}

#[tokio::test]
async fn page_beyond_end_shows_last_page() {
    let coordinator = coordinator(MockCatalog::new(151));
    let view = coordinator.load(&page(40), BTreeSet::new()).await;
    assert_eq!(view.page_number, 8);
    assert_eq!(view.records.len(), 11);
}

#[tokio::test]
async fn search_matches_id_substrings_within_catalog() {
    let coordinator = coordinator(MockCatalog::new(151));
    let nav = NavState::default().with_search("4");

    let view = coordinator.load(&nav, BTreeSet::new()).await;

    assert_eq!(view.mode, ListingMode::Searching);
    assert_eq!(view.page_number, 1);
    // 33 ids up to 151 contain a "4".
    assert_eq!(view.total_pages, 2);
    let ids = view.records.iter().map(|r| r.id.get()).collect::<Vec<_>>();
    assert_eq!(&ids[..5], &[4, 14, 24, 34, 40]);
    assert_eq!(ids.len(), 20);

    let second = coordinator.load(&nav.with_page(2), BTreeSet::new()).await;
    assert_eq!(second.records.len(), 13);
    assert!(second.records.iter().all(|r| r.id.to_string().contains('4')));
    assert!(second.records.iter().all(|r| r.id.get() <= 151));
}

#[tokio::test]
async fn search_matches_names_case_insensitively() {
    let coordinator = coordinator(MockCatalog::new(151));

    // source_name(25) == "pokecf"
    let by_name = coordinator
        .load(&NavState::default().with_search("POKECF"), BTreeSet::new())
        .await;
    assert_eq!(by_name.records.len(), 1);
    assert_eq!(by_name.records[0].id.get(), 25);

    // localized_name(25) == "몬cf"
    let by_localized = coordinator
        .load(&NavState::default().with_search("몬cf"), BTreeSet::new())
        .await;
    assert_eq!(by_localized.records.len(), 1);
}

#[tokio::test]
async fn searches_share_one_full_catalog_fetch() {
    let coordinator = coordinator(MockCatalog::new(151));
    coordinator
        .load(&NavState::default().with_search("1"), BTreeSet::new())
        .await;
    coordinator
        .load(&NavState::default().with_search("pokeb"), BTreeSet::new())
        .await;
    let client = coordinator.enricher().client();
    assert_eq!(client.list_calls(), 1);
    assert_eq!(client.detail_calls(), 151);
    assert_eq!(coordinator.cache().displayed(), Some(CacheKey::All));
}

#[tokio::test]
async fn search_without_matches_has_no_pages() {
    let coordinator = coordinator(MockCatalog::new(151));
    let view = coordinator
        .load(&NavState::default().with_search("zzz"), BTreeSet::new())
        .await;
    assert!(view.records.is_empty());
    assert_eq!(view.total_pages, 0);
    assert_eq!(view.page_number, 1);
    assert!(!view.has_next());
}

#[tokio::test]
async fn searching_then_clearing_returns_to_first_browse_page() {
    let coordinator = coordinator(MockCatalog::new(151));
    let nav = page(5).with_search("4").with_page(2);
    assert_eq!(ListingState::from_nav(&nav).page_number, 2);

    let cleared = nav.with_search("");
    let view = coordinator.load(&cleared, BTreeSet::new()).await;
    assert_eq!(view.mode, ListingMode::Browsing);
    assert_eq!(view.page_number, 1);
    assert_eq!(view.records[0].id.get(), 1);
}

#[tokio::test]
async fn failing_reference_fails_the_whole_page() {
    let mut catalog = MockCatalog::new(151);
    catalog.failing.insert(30);
    let coordinator = coordinator(catalog);

    let ok = coordinator.load(&page(1), BTreeSet::new()).await;
    assert!(!ok.is_error);

    let broken = coordinator.load(&page(2), BTreeSet::new()).await;
    assert!(broken.is_error);
    assert!(!broken.is_loading);
    // Page 1 stays visible instead of an empty list.
    assert_eq!(broken.records[0].id.get(), 1);
}

#[tokio::test]
async fn snapshot_before_load_is_pending() {
    let coordinator = coordinator(MockCatalog::new(151));
    let view = coordinator.snapshot(&page(1), BTreeSet::new());
    assert!(view.is_loading);
    assert!(view.records.is_empty());
    assert_eq!(coordinator.enricher().client().list_calls(), 0);
}

#[tokio::test]
async fn detail_is_cached_per_id() {
    let coordinator = coordinator(MockCatalog::new(151));
    let id = RecordId::new(25).unwrap();
    let first = coordinator.detail(id).await.unwrap();
    let second = coordinator.detail(id).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(coordinator.enricher().client().detail_calls(), 1);
    // Detail lookups do not disturb the listing's displayed key.
    assert_eq!(coordinator.cache().displayed(), None);
}

#[test]
fn bookmarked_ids_pass_through() {
    let view_ids: BTreeSet<RecordId> = [RecordId::new(25).unwrap()].into_iter().collect();
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let coordinator = coordinator(MockCatalog::new(151));
    let view = runtime.block_on(coordinator.load(&page(2), view_ids.clone()));
    assert_eq!(view.bookmarked_ids, view_ids);
}

#[test]
fn filter_drops_ids_beyond_catalog() {
    let records = vec![record(4), record(14), record(154)];
    let filtered = filter_records(&records, "4", 151);
    let ids = filtered.iter().map(|r| r.id.get()).collect::<Vec<_>>();
    assert_eq!(ids, vec![4, 14]);
}

#[test]
fn paginate_slices_by_page() {
    let records = (1..=45).map(record).collect::<Vec<_>>();
    assert_eq!(paginate(&records, 1, 20).len(), 20);
    assert_eq!(paginate(&records, 3, 20).len(), 5);
    assert!(paginate(&records, 4, 20).is_empty());
    assert_eq!(paginate(&records, 3, 20)[0].id.get(), 41);
}

#[test]
fn page_change_translates_zero_based_targets() {
    let nav = NavState::default().with_search("4");
    let next = handle_page_change(&nav, 1, 2);
    let state = ListingState::from_nav(&next);
    assert_eq!(state.page_number, 2);
    assert_eq!(state.search_query, "4");
    assert_eq!(ListingState::from_nav(&handle_page_change(&nav, 5, 2)).page_number, 2);
}
