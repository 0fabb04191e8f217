use super::{async_trait, date_from_text, split_name, Provider, ProviderError, ProviderFields};
use crate::config::Config;
use crate::identifier::{Identifier, IdentifierKind};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

const ISBNDB_API_BASE: &str = "https://api.isbndb.com/book";

/// Commercial ISBN database. Constructed only when an API key is
/// configured; lowest precedence in the ISBN merge order.
pub struct IsbndbProvider {
    client: Client,
    api_key: String,
}

impl IsbndbProvider {
    /// Returns `None` without a key: the aggregator simply leaves this
    /// provider out of the precedence list.
    pub fn new(config: &Config) -> Option<Self> {
        let api_key = config.isbndb_api_key.clone()?;
        let client = Client::builder()
            .user_agent(config.user_agent())
            .build()
            .expect("Failed to create HTTP client");
        Some(Self { client, api_key })
    }
}

#[derive(Debug, Deserialize)]
struct IsbndbResponse {
    book: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct IsbndbBook {
    title: Option<String>,
    authors: Option<Vec<String>>,
    publisher: Option<String>,
    date_published: Option<String>,
    pages: Option<u32>,
    edition: Option<String>,
}

fn parse_book(book: &IsbndbBook) -> ProviderFields {
    ProviderFields {
        title: book.title.clone(),
        authors: book
            .authors
            .as_ref()
            .map(|names| names.iter().map(|n| split_name(n)).collect()),
        publisher: book.publisher.clone(),
        issued: book.date_published.as_deref().and_then(date_from_text),
        page_count: book.pages,
        edition: book.edition.clone(),
        ..Default::default()
    }
}

#[async_trait]
impl Provider for IsbndbProvider {
    fn name(&self) -> &'static str {
        "isbndb"
    }

    fn supports(&self, kind: IdentifierKind) -> bool {
        kind == IdentifierKind::Isbn
    }

    async fn lookup(
        &self,
        id: &Identifier,
    ) -> Result<Option<(ProviderFields, Value)>, ProviderError> {
        let url = format!("{}/{}", ISBNDB_API_BASE, id.normalized);

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.api_key.as_str())
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }

        let body: IsbndbResponse = response.json().await?;
        let Some(raw) = body.book else {
            return Ok(None);
        };

        let book: IsbndbBook = serde_json::from_value(raw.clone())
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(Some((parse_book(&book), raw)))
    }
}
