use futures::future::try_join_all;
use tracing::{debug, trace};

use crate::api::{CatalogClient, DetailPayload, SpeciesPayload};
use crate::domain::{CatalogReference, Record, RecordId, Stat};
use crate::error::PokedexError;

pub struct Enricher<C> {
    client: C,
    language: String,
}

impl<C: CatalogClient> Enricher<C> {
    pub fn new(client: C, language: impl Into<String>) -> Self {
        Self {
            client,
            language: language.into(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Detail first, then species: species is keyed by the numeric id the
    /// detail payload carries.
    pub async fn enrich(&self, reference: &CatalogReference) -> Result<Record, PokedexError> {
        let detail = self.client.detail(reference).await?;
        let id = RecordId::new(detail.id).map_err(|_| {
            PokedexError::Unavailable(format!("detail for {} has no id", reference.name))
        })?;
        let species = self.client.species(id).await?;
        trace!(%id, name = %detail.name, "enriched");
        Ok(build_record(id, &detail, &species, &reference.name, &self.language))
    }

    pub async fn enrich_by_id(&self, id: RecordId) -> Result<Record, PokedexError> {
        let reference = self.client.reference_for(id);
        self.enrich(&reference).await
    }

    /// Fail-fast fan-out: every reference is enriched concurrently, the
    /// output keeps input order, and the first error aborts the batch.
    pub async fn enrich_all(
        &self,
        references: &[CatalogReference],
    ) -> Result<Vec<Record>, PokedexError> {
        debug!(count = references.len(), "enrich.fan_out");
        try_join_all(references.iter().map(|reference| self.enrich(reference))).await
    }
}

/// Merges detail and species payloads. Missing localization falls back to
/// `fallback_name` for both the display name and the category.
pub fn build_record(
    id: RecordId,
    detail: &DetailPayload,
    species: &SpeciesPayload,
    fallback_name: &str,
    language: &str,
) -> Record {
    let source_name = if detail.name.is_empty() {
        fallback_name
    } else {
        detail.name.as_str()
    };

    let display_name = species
        .names
        .iter()
        .find(|entry| entry.language.name == language)
        .map(|entry| entry.name.trim())
        .filter(|name| !name.is_empty())
        .unwrap_or(source_name)
        .to_string();
    let category = species
        .genera
        .iter()
        .find(|entry| entry.language.name == language)
        .map(|entry| entry.genus.trim())
        .filter(|genus| !genus.is_empty())
        .unwrap_or(source_name)
        .to_string();

    Record {
        id,
        name: source_name.to_string(),
        display_name,
        category,
        sprite_url: detail.sprites.front_default.clone().unwrap_or_default(),
        types: detail
            .types
            .iter()
            .map(|slot| slot.kind.name.clone())
            .collect(),
        stats: detail
            .stats
            .iter()
            .map(|slot| Stat {
                stat_name: slot.stat.name.clone(),
                base_value: slot.base_stat,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{LocalizedGenus, LocalizedName, NamedResource, Sprites};

    fn lang(name: &str) -> NamedResource {
        NamedResource {
            name: name.to_string(),
            url: String::new(),
        }
    }

    fn bulbasaur() -> DetailPayload {
        DetailPayload {
            id: 1,
            name: "bulbasaur".to_string(),
            sprites: Sprites {
                front_default: Some("https://img/1.png".to_string()),
            },
            types: Vec::new(),
            stats: Vec::new(),
        }
    }

    #[test]
    fn picks_target_language() {
        let species = SpeciesPayload {
            names: vec![
                LocalizedName {
                    name: "Bulbasaur".to_string(),
                    language: lang("en"),
                },
                LocalizedName {
                    name: "이상해씨".to_string(),
                    language: lang("ko"),
                },
            ],
            genera: vec![LocalizedGenus {
                genus: "씨앗포켓몬".to_string(),
                language: lang("ko"),
            }],
        };
        let id = RecordId::new(1).unwrap();
        let record = build_record(id, &bulbasaur(), &species, "bulbasaur", "ko");
        assert_eq!(record.display_name, "이상해씨");
        assert_eq!(record.category, "씨앗포켓몬");
        assert_eq!(record.sprite_url, "https://img/1.png");
    }

    #[test]
    fn missing_localization_falls_back_to_source_name() {
        let species = SpeciesPayload {
            names: vec![LocalizedName {
                name: "Bulbasaur".to_string(),
                language: lang("en"),
            }],
            genera: Vec::new(),
        };
        let id = RecordId::new(1).unwrap();
        let record = build_record(id, &bulbasaur(), &species, "bulbasaur", "ko");
        assert_eq!(record.display_name, "bulbasaur");
        assert_eq!(record.category, "bulbasaur");
    }
}
