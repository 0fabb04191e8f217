use super::{async_trait, date_from_text, split_name, Provider, ProviderError, ProviderFields};
use crate::config::Config;
use crate::identifier::{Identifier, IdentifierKind};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

const GOOGLE_BOOKS_API_BASE: &str = "https://www.googleapis.com/books/v1/volumes";

/// Google Books volumes API, queried by ISBN.
pub struct GoogleBooksProvider {
    client: Client,
}

impl GoogleBooksProvider {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .user_agent(config.user_agent())
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    items: Option<Vec<VolumeItem>>,
}

#[derive(Debug, Deserialize)]
struct VolumeItem {
    #[serde(rename = "volumeInfo")]
    volume_info: Value,
}

#[derive(Debug, Deserialize)]
struct VolumeInfo {
    title: Option<String>,
    authors: Option<Vec<String>>,
    publisher: Option<String>,
    #[serde(rename = "publishedDate")]
    published_date: Option<String>,
    #[serde(rename = "pageCount")]
    page_count: Option<u32>,
    #[serde(rename = "infoLink")]
    info_link: Option<String>,
    edition: Option<String>,
}

fn parse_volume(info: &VolumeInfo) -> ProviderFields {
    let authors = info
        .authors
        .as_ref()
        .map(|names| names.iter().map(|n| split_name(n)).collect::<Vec<_>>());

    ProviderFields {
        title: info.title.clone(),
        authors,
        publisher: info.publisher.clone(),
        issued: info.published_date.as_deref().and_then(date_from_text),
        page_count: info.page_count,
        url: info.info_link.clone(),
        edition: info.edition.clone(),
        ..Default::default()
    }
}

#[async_trait]
impl Provider for GoogleBooksProvider {
    fn name(&self) -> &'static str {
        "googlebooks"
    }

    fn supports(&self, kind: IdentifierKind) -> bool {
        kind == IdentifierKind::Isbn
    }

    async fn lookup(
        &self,
        id: &Identifier,
    ) -> Result<Option<(ProviderFields, Value)>, ProviderError> {
        let query = format!("isbn:{}", id.normalized);

        let response = self
            .client
            .get(GOOGLE_BOOKS_API_BASE)
            .query(&[("q", query.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }

        let body: VolumesResponse = response.json().await?;

        let Some(item) = body.items.and_then(|mut items| {
            if items.is_empty() {
                None
            } else {
                Some(items.swap_remove(0))
            }
        }) else {
            return Ok(None);
        };

        let info: VolumeInfo = serde_json::from_value(item.volume_info.clone())
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(Some((parse_volume(&info), item.volume_info)))
    }
}
