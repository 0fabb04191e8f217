use super::{async_trait, date_from_text, split_author_list, Provider, ProviderError, ProviderFields};
use crate::config::Config;
use crate::identifier::{Identifier, IdentifierKind};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

const WORLDCAT_API_BASE: &str = "http://xisbn.worldcat.org/webservices/xid/isbn";

/// WorldCat xISBN library-catalog lookup.
pub struct WorldCatProvider {
    client: Client,
}

impl WorldCatProvider {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .user_agent(config.user_agent())
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct XisbnResponse {
    list: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct XisbnRecord {
    title: Option<String>,
    /// One string, possibly several names joined with semicolons.
    author: Option<String>,
    publisher: Option<String>,
    year: Option<String>,
    city: Option<String>,
    ed: Option<String>,
}

fn parse_record(record: &XisbnRecord) -> ProviderFields {
    ProviderFields {
        title: record.title.clone(),
        authors: record
            .author
            .as_deref()
            .map(split_author_list)
            .filter(|a| !a.is_empty()),
        publisher: record.publisher.clone(),
        issued: record.year.as_deref().and_then(date_from_text),
        publisher_place: record.city.clone(),
        edition: record.ed.clone(),
        ..Default::default()
    }
}

#[async_trait]
impl Provider for WorldCatProvider {
    fn name(&self) -> &'static str {
        "worldcat"
    }

    fn supports(&self, kind: IdentifierKind) -> bool {
        kind == IdentifierKind::Isbn
    }

    async fn lookup(
        &self,
        id: &Identifier,
    ) -> Result<Option<(ProviderFields, Value)>, ProviderError> {
        let url = format!("{}/{}", WORLDCAT_API_BASE, id.normalized);

        let response = self
            .client
            .get(&url)
            .query(&[("method", "getMetadata"), ("format", "json"), ("fl", "*")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }

        let body: XisbnResponse = response.json().await?;

        let Some(raw) = body.list.and_then(|mut list| {
            if list.is_empty() {
                None
            } else {
                Some(list.swap_remove(0))
            }
        }) else {
            return Ok(None);
        };

        let record: XisbnRecord = serde_json::from_value(raw.clone())
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(Some((parse_record(&record), raw)))
    }
}
