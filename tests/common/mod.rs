#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use pokedex_browser::api::{
    CatalogClient, DetailPayload, LocalizedGenus, LocalizedName, NamedResource, SpeciesPayload,
    Sprites, StatSlot, TypeSlot,
};
use pokedex_browser::domain::{CatalogReference, Record, RecordId};
use pokedex_browser::error::PokedexError;

/// Digits spelled as letters so generated names never contain digits.
pub fn spelled(id: u32) -> String {
    id.to_string()
        .chars()
        .map(|ch| (b'a' + ch.to_digit(10).unwrap() as u8) as char)
        .collect()
}

pub fn source_name(id: u32) -> String {
    format!("poke{}", spelled(id))
}

pub fn localized_name(id: u32) -> String {
    format!("몬{}", spelled(id))
}

pub fn record(id: u32) -> Record {
    Record {
        id: RecordId::new(id).unwrap(),
        name: source_name(id),
        display_name: localized_name(id),
        category: "씨앗포켓몬".to_string(),
        sprite_url: format!("https://img/{id}.png"),
        types: vec!["grass".to_string()],
        stats: Vec::new(),
    }
}

fn resource(name: &str) -> NamedResource {
    NamedResource {
        name: name.to_string(),
        url: String::new(),
    }
}

/// In-memory catalog of `size` entries with call counters.
#[derive(Default)]
pub struct MockCatalog {
    pub size: u32,
    pub unlocalized: HashSet<u32>,
    pub failing: HashSet<u32>,
    pub fail_listing: bool,
    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub species_calls: AtomicUsize,
}

impl MockCatalog {
    pub fn new(size: u32) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn species_calls(&self) -> usize {
        self.species_calls.load(Ordering::SeqCst)
    }

    fn id_from_url(url: &str) -> Option<u32> {
        url.trim_end_matches('/').rsplit('/').next()?.parse().ok()
    }
}

impl CatalogClient for MockCatalog {
    async fn list_page(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<CatalogReference>, PokedexError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_listing {
            return Err(PokedexError::Unavailable("listing down".to_string()));
        }
        let end = offset.saturating_add(limit).min(self.size);
        Ok((offset + 1..=end)
            .map(|id| CatalogReference {
                name: source_name(id),
                url: format!("mock://pokemon/{id}/"),
            })
            .collect())
    }

    async fn detail(&self, reference: &CatalogReference) -> Result<DetailPayload, PokedexError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        let id = Self::id_from_url(&reference.url)
            .ok_or_else(|| PokedexError::Unavailable(format!("bad url {}", reference.url)))?;
        // Higher ids resolve first, so arrival order differs from input order.
        for _ in 0..(self.size.saturating_sub(id) % 7) {
            tokio::task::yield_now().await;
        }
        if self.failing.contains(&id) || id > self.size {
            return Err(PokedexError::Unavailable(format!("detail {id} failed")));
        }
        Ok(DetailPayload {
            id,
            name: source_name(id),
            sprites: Sprites {
                front_default: Some(format!("https://img/{id}.png")),
            },
            types: vec![TypeSlot {
                kind: resource("grass"),
            }],
            stats: vec![StatSlot {
                base_stat: 45,
                stat: resource("hp"),
            }],
        })
    }

    async fn species(&self, id: RecordId) -> Result<SpeciesPayload, PokedexError> {
        self.species_calls.fetch_add(1, Ordering::SeqCst);
        let mut names = vec![LocalizedName {
            name: source_name(id.get()).to_uppercase(),
            language: resource("en"),
        }];
        let mut genera = Vec::new();
        if !self.unlocalized.contains(&id.get()) {
            names.push(LocalizedName {
                name: localized_name(id.get()),
                language: resource("ko"),
            });
            genera.push(LocalizedGenus {
                genus: "씨앗포켓몬".to_string(),
                language: resource("ko"),
            });
        }
        Ok(SpeciesPayload { names, genera })
    }

    fn reference_for(&self, id: RecordId) -> CatalogReference {
        CatalogReference {
            name: id.to_string(),
            url: format!("mock://pokemon/{id}/"),
        }
    }
}
