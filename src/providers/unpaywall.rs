use super::{async_trait, Provider, ProviderError, ProviderFields};
use crate::config::Config;
use crate::identifier::{Identifier, IdentifierKind};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

const UNPAYWALL_API_BASE: &str = "https://api.unpaywall.org/v2";

/// Open-access location lookup. Contributes exactly one logical field,
/// the open-access URL, which the aggregator applies as an override
/// after the main merge: the best available public copy outranks a
/// paywalled registry URL.
pub struct UnpaywallProvider {
    client: Client,
    email: String,
}

impl UnpaywallProvider {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .user_agent(config.user_agent())
            .build()
            .expect("Failed to create HTTP client");
        Self {
            client,
            email: config.contact_email.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UnpaywallResponse {
    is_oa: Option<bool>,
    best_oa_location: Option<OaLocation>,
}

#[derive(Debug, Deserialize)]
struct OaLocation {
    url: Option<String>,
}

fn parse_response(body: &UnpaywallResponse) -> ProviderFields {
    let open_access_url = if body.is_oa == Some(true) {
        body.best_oa_location.as_ref().and_then(|l| l.url.clone())
    } else {
        None
    };

    ProviderFields {
        open_access_url,
        ..Default::default()
    }
}

#[async_trait]
impl Provider for UnpaywallProvider {
    fn name(&self) -> &'static str {
        "unpaywall"
    }

    fn supports(&self, kind: IdentifierKind) -> bool {
        kind == IdentifierKind::Doi
    }

    async fn lookup(
        &self,
        id: &Identifier,
    ) -> Result<Option<(ProviderFields, Value)>, ProviderError> {
        let url = format!("{}/{}", UNPAYWALL_API_BASE, id.normalized);

        let response = self
            .client
            .get(&url)
            .query(&[("email", self.email.as_str())])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }

        let raw: Value = response.json().await?;
        let body: UnpaywallResponse = serde_json::from_value(raw.clone())
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        let fields = parse_response(&body);
        if fields.is_empty() {
            // Known DOI but no open copy; nothing to contribute.
            return Ok(None);
        }

        Ok(Some((fields, raw)))
    }
}
