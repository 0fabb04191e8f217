use crate::config::Config;
use crate::identifier::Identifier;
use crate::providers::{
    crossref::CrossrefProvider, datacite::DataCiteProvider, googlebooks::GoogleBooksProvider,
    isbndb::IsbndbProvider, openlibrary::OpenLibraryProvider, unpaywall::UnpaywallProvider,
    worldcat::WorldCatProvider, Provider, ProviderError, ProviderFields, ProviderResult,
};
use futures::future::join_all;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Everything the providers could tell us about one identifier, merged
/// under the precedence policy. Built fresh per request and consumed by
/// the record builder.
#[derive(Debug, Clone, Default)]
pub struct RawMetadataBag {
    /// Merged logical fields; each one holds the value from the
    /// highest-precedence provider that supplied it.
    pub fields: ProviderFields,
    /// Providers that contributed at least one field, in precedence
    /// order.
    pub sources: Vec<String>,
    /// Original per-provider payload subtrees, for traceability.
    pub payloads: BTreeMap<String, Value>,
}

impl RawMetadataBag {
    /// No provider contributed anything usable.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Copy every field the incoming set supplies that the bag does not
    /// have yet. First writer wins: a field set by a higher-precedence
    /// provider is never overwritten. Returns whether anything was
    /// taken.
    fn fill_missing(&mut self, incoming: &ProviderFields) -> bool {
        let mut contributed = false;
        macro_rules! take {
            ($($field:ident),+ $(,)?) => {$(
                if self.fields.$field.is_none() {
                    if let Some(value) = &incoming.$field {
                        self.fields.$field = Some(value.clone());
                        contributed = true;
                    }
                }
            )+};
        }
        take!(
            title,
            authors,
            publisher,
            issued,
            container_title,
            volume,
            issue,
            page,
            page_count,
            edition,
            publisher_place,
            url,
            open_access_url,
            abstract_text,
            issn,
            raw_type,
        );
        contributed
    }
}

/// Fans one identifier out to every provider that supports its kind,
/// tolerating any subset of them failing, and merges the results in
/// precedence order.
pub struct Aggregator {
    /// Held in precedence order; the per-kind orderings share this list
    /// because no provider supports both kinds.
    providers: Vec<Box<dyn Provider>>,
    timeout: Duration,
}

impl Aggregator {
    pub fn new(config: &Config) -> Self {
        let mut providers: Vec<Box<dyn Provider>> = vec![
            Box::new(CrossrefProvider::new(config)),
            Box::new(DataCiteProvider::new(config)),
            Box::new(UnpaywallProvider::new(config)),
            Box::new(OpenLibraryProvider::new(config)),
            Box::new(GoogleBooksProvider::new(config)),
            Box::new(WorldCatProvider::new(config)),
        ];
        if let Some(isbndb) = IsbndbProvider::new(config) {
            providers.push(Box::new(isbndb));
        }
        Self {
            providers,
            timeout: config.provider_timeout,
        }
    }

    /// A custom provider list, in precedence order.
    pub fn with_providers(providers: Vec<Box<dyn Provider>>, timeout: Duration) -> Self {
        Self { providers, timeout }
    }

    /// Query every provider supporting the identifier's kind and merge
    /// whatever came back. Never fails: an empty bag means nothing was
    /// found anywhere.
    ///
    /// Providers run concurrently, each under its own timeout; a timed
    /// out provider is treated like one that returned a network error.
    /// `join_all` preserves input order, so the merge below walks the
    /// precedence list regardless of which provider answered first.
    pub async fn aggregate(&self, id: &Identifier) -> RawMetadataBag {
        let active: Vec<&dyn Provider> = self
            .providers
            .iter()
            .map(|p| p.as_ref())
            .filter(|p| p.supports(id.kind))
            .collect();

        let results = join_all(active.iter().map(|provider| async move {
            match tokio::time::timeout(self.timeout, provider.fetch(id)).await {
                Ok(result) => result,
                Err(_) => ProviderResult::failed(
                    provider.name(),
                    ProviderError::Network("request timed out".to_string()),
                ),
            }
        }))
        .await;

        let mut bag = RawMetadataBag::default();
        for result in results {
            if let Some(error) = &result.error {
                warn!(provider = result.provider, %error, "provider lookup failed");
                continue;
            }
            let Some(fields) = &result.fields else {
                debug!(provider = result.provider, "no payload for identifier");
                continue;
            };
            if bag.fill_missing(fields) {
                bag.sources.push(result.provider.to_string());
            }
            if let Some(raw) = result.raw {
                bag.payloads.insert(result.provider.to_string(), raw);
            }
        }

        // Open-access override: a public copy replaces, not merely
        // fills, whatever URL the registries supplied.
        if let Some(oa_url) = bag.fields.open_access_url.clone() {
            bag.fields.url = Some(oa_url);
        }

        bag
    }
}
