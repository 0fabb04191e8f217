use super::{async_trait, split_name, Provider, ProviderError, ProviderFields};
use crate::config::Config;
use crate::identifier::{Identifier, IdentifierKind};
use crate::record::{Author, CslDate};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

const CROSSREF_API_BASE: &str = "https://api.crossref.org/works";

/// Registry of record for most DOIs; highest precedence in the DOI
/// merge order.
pub struct CrossrefProvider {
    client: Client,
}

impl CrossrefProvider {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .user_agent(config.user_agent())
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct CrossrefResponse {
    status: String,
    message: Value,
}

#[derive(Debug, Deserialize)]
struct CrossrefWork {
    title: Option<Vec<String>>,
    author: Option<Vec<CrossrefAuthor>>,
    publisher: Option<String>,
    #[serde(rename = "container-title")]
    container_title: Option<Vec<String>>,
    #[serde(rename = "published-print")]
    published_print: Option<CrossrefDate>,
    #[serde(rename = "published-online")]
    published_online: Option<CrossrefDate>,
    published: Option<CrossrefDate>,
    created: Option<CrossrefDate>,
    #[serde(rename = "type")]
    work_type: Option<String>,
    volume: Option<String>,
    issue: Option<String>,
    page: Option<String>,
    #[serde(rename = "ISSN")]
    issn: Option<Vec<String>>,
    #[serde(rename = "abstract")]
    abstract_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrossrefAuthor {
    given: Option<String>,
    family: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CrossrefDate {
    #[serde(rename = "date-parts")]
    date_parts: Option<Vec<Vec<i32>>>,
}

impl CrossrefDate {
    fn to_csl(&self) -> Option<CslDate> {
        let parts = self.date_parts.clone()?;
        if parts.first().map_or(true, |p| p.is_empty()) {
            return None;
        }
        Some(CslDate { date_parts: parts })
    }
}

fn parse_work(work: &CrossrefWork) -> ProviderFields {
    let authors = work.author.as_ref().map(|authors| {
        authors
            .iter()
            .map(|a| match (&a.family, &a.given) {
                (None, None) => split_name(a.name.as_deref().unwrap_or_default()),
                _ => Author {
                    family: a.family.clone(),
                    given: a.given.clone(),
                },
            })
            .collect::<Vec<_>>()
    });

    // Print date preferred over online, then the catch-all `published`,
    // then the deposit timestamp as a last resort.
    let issued = work
        .published_print
        .as_ref()
        .or(work.published_online.as_ref())
        .or(work.published.as_ref())
        .or(work.created.as_ref())
        .and_then(CrossrefDate::to_csl);

    ProviderFields {
        title: work.title.as_ref().and_then(|t| t.first().cloned()),
        authors,
        publisher: work.publisher.clone(),
        issued,
        container_title: work.container_title.as_ref().and_then(|t| t.first().cloned()),
        volume: work.volume.clone(),
        issue: work.issue.clone(),
        page: work.page.clone(),
        issn: work.issn.as_ref().and_then(|i| i.first().cloned()),
        abstract_text: work.abstract_text.clone(),
        raw_type: work.work_type.clone(),
        ..Default::default()
    }
}

#[async_trait]
impl Provider for CrossrefProvider {
    fn name(&self) -> &'static str {
        "crossref"
    }

    fn supports(&self, kind: IdentifierKind) -> bool {
        kind == IdentifierKind::Doi
    }

    async fn lookup(
        &self,
        id: &Identifier,
    ) -> Result<Option<(ProviderFields, Value)>, ProviderError> {
        let url = format!("{}/{}", CROSSREF_API_BASE, id.normalized);

        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }

        let body: CrossrefResponse = response.json().await?;
        if body.status != "ok" {
            return Ok(None);
        }

        let work: CrossrefWork = serde_json::from_value(body.message.clone())
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(Some((parse_work(&work), body.message)))
    }
}
