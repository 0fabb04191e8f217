use super::{async_trait, split_name, Provider, ProviderError, ProviderFields};
use crate::config::Config;
use crate::identifier::{Identifier, IdentifierKind};
use crate::record::{Author, CslDate};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

const DATACITE_API_BASE: &str = "https://api.datacite.org/dois";

/// Alternate DOI registry; covers datasets and repository DOIs that
/// Crossref does not carry.
pub struct DataCiteProvider {
    client: Client,
}

impl DataCiteProvider {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .user_agent(config.user_agent())
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct DataCiteResponse {
    data: DataCiteData,
}

#[derive(Debug, Deserialize)]
struct DataCiteData {
    attributes: Value,
}

#[derive(Debug, Deserialize)]
struct DataCiteAttributes {
    titles: Option<Vec<DataCiteTitle>>,
    creators: Option<Vec<DataCiteCreator>>,
    publisher: Option<String>,
    dates: Option<Vec<DataCiteDateEntry>>,
    #[serde(rename = "publicationYear")]
    publication_year: Option<i32>,
    url: Option<String>,
    types: Option<DataCiteTypes>,
}

#[derive(Debug, Deserialize)]
struct DataCiteTitle {
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DataCiteCreator {
    #[serde(rename = "givenName")]
    given_name: Option<String>,
    #[serde(rename = "familyName")]
    family_name: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DataCiteDateEntry {
    date: Option<String>,
    #[serde(rename = "dateType")]
    date_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DataCiteTypes {
    citeproc: Option<String>,
}

fn parse_attributes(attrs: &DataCiteAttributes) -> ProviderFields {
    let title = attrs
        .titles
        .as_ref()
        .and_then(|t| t.first())
        .and_then(|t| t.title.clone());

    let authors = attrs.creators.as_ref().map(|creators| {
        creators
            .iter()
            .map(|c| match (&c.family_name, &c.given_name) {
                (None, None) => split_name(c.name.as_deref().unwrap_or_default()),
                _ => Author {
                    family: c.family_name.clone(),
                    given: c.given_name.clone(),
                },
            })
            .collect::<Vec<_>>()
    });

    // The "Issued" entry wins; the registration year is only a fallback.
    let issued = attrs
        .dates
        .as_ref()
        .and_then(|dates| {
            dates
                .iter()
                .find(|d| d.date_type.as_deref() == Some("Issued"))
        })
        .and_then(|d| d.date.as_deref())
        .and_then(|date| date.get(..4))
        .and_then(|year| year.parse().ok())
        .map(CslDate::from_year)
        .or_else(|| attrs.publication_year.map(CslDate::from_year));

    ProviderFields {
        title,
        authors,
        publisher: attrs.publisher.clone(),
        issued,
        url: attrs.url.clone(),
        raw_type: attrs.types.as_ref().and_then(|t| t.citeproc.clone()),
        ..Default::default()
    }
}

#[async_trait]
impl Provider for DataCiteProvider {
    fn name(&self) -> &'static str {
        "datacite"
    }

    fn supports(&self, kind: IdentifierKind) -> bool {
        kind == IdentifierKind::Doi
    }

    async fn lookup(
        &self,
        id: &Identifier,
    ) -> Result<Option<(ProviderFields, Value)>, ProviderError> {
        // DataCite expects the DOI percent-encoded as a single path
        // segment.
        let url = format!(
            "{}/{}",
            DATACITE_API_BASE,
            urlencoding::encode(&id.normalized)
        );

        let response = self.client.get(&url).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }

        let body: DataCiteResponse = response.json().await?;

        let attrs: DataCiteAttributes = serde_json::from_value(body.data.attributes.clone())
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(Some((parse_attributes(&attrs), body.data.attributes)))
    }
}
