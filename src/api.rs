use std::future::Future;

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::ResolvedConfig;
use crate::domain::{CatalogReference, RecordId};
use crate::error::PokedexError;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NamedResource {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sprites {
    #[serde(default)]
    pub front_default: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeSlot {
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatSlot {
    pub base_stat: u32,
    pub stat: NamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetailPayload {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub sprites: Sprites,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
    #[serde(default)]
    pub stats: Vec<StatSlot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalizedName {
    pub name: String,
    pub language: NamedResource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalizedGenus {
    pub genus: String,
    pub language: NamedResource,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeciesPayload {
    #[serde(default)]
    pub names: Vec<LocalizedName>,
    #[serde(default)]
    pub genera: Vec<LocalizedGenus>,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    results: Vec<CatalogReference>,
}

/// Remote catalog access. Every failure is reported as
/// [`PokedexError::Unavailable`]; nothing is retried here.
pub trait CatalogClient: Send + Sync {
    fn list_page(
        &self,
        limit: u32,
        offset: u32,
    ) -> impl Future<Output = Result<Vec<CatalogReference>, PokedexError>> + Send;

    fn detail(
        &self,
        reference: &CatalogReference,
    ) -> impl Future<Output = Result<DetailPayload, PokedexError>> + Send;

    fn species(
        &self,
        id: RecordId,
    ) -> impl Future<Output = Result<SpeciesPayload, PokedexError>> + Send;

    fn reference_for(&self, id: RecordId) -> CatalogReference;
}

#[derive(Clone)]
pub struct HttpCatalogClient {
    client: Client,
    base_url: String,
}

impl HttpCatalogClient {
    pub fn new(config: &ResolvedConfig) -> Result<Self, PokedexError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("pokedex/{}", env!("CARGO_PKG_VERSION")))
                .map_err(PokedexError::unavailable)?,
        );
        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(PokedexError::unavailable)?;
        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn list_url(&self, limit: u32, offset: u32) -> String {
        format!("{}/pokemon?limit={limit}&offset={offset}", self.base_url)
    }

    fn species_url(&self, id: RecordId) -> String {
        format!("{}/pokemon-species/{id}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, PokedexError> {
        debug!(url, "catalog.request");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(PokedexError::unavailable)?;
        let status = response.status();
        if !status.is_success() {
            return Err(PokedexError::Unavailable(format!(
                "GET {url} returned status {}",
                status.as_u16()
            )));
        }
        response.json::<T>().await.map_err(PokedexError::unavailable)
    }
}

impl CatalogClient for HttpCatalogClient {
    async fn list_page(
        &self,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<CatalogReference>, PokedexError> {
        let url = self.list_url(limit, offset);
        let list: ListResponse = self.get_json(&url).await?;
        Ok(list.results)
    }

    async fn detail(&self, reference: &CatalogReference) -> Result<DetailPayload, PokedexError> {
        self.get_json(&reference.url).await
    }

    async fn species(&self, id: RecordId) -> Result<SpeciesPayload, PokedexError> {
        let url = self.species_url(id);
        self.get_json(&url).await
    }

    fn reference_for(&self, id: RecordId) -> CatalogReference {
        CatalogReference {
            name: id.to_string(),
            url: format!("{}/pokemon/{id}/", self.base_url),
        }
    }
}
