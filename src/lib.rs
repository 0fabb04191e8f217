pub mod aggregate;
pub mod cache;
pub mod config;
pub mod csl;
pub mod error;
pub mod identifier;
pub mod providers;
pub mod record;
pub mod render;
pub mod styles;

pub use config::Config;
pub use error::CitationError;
pub use identifier::{classify, Identifier, IdentifierKind};
pub use record::CanonicalRecord;
pub use render::OutputFormat;

use aggregate::Aggregator;
use cache::ResponseCache;
use render::{FallbackRenderer, Renderer};
use serde::Serialize;
use tracing::{debug, info};

/// A finished citation in one style: the rendered full form plus both
/// in-text forms, alongside the canonical record they were built from.
#[derive(Debug, Clone, Serialize)]
pub struct Citation {
    pub identifier: String,
    pub kind: IdentifierKind,
    pub style: String,
    pub full_citation: String,
    pub parenthetical: String,
    pub narrative: String,
    pub record: CanonicalRecord,
}

/// Wires the pipeline together: classifier, provider aggregation,
/// canonical-record construction, style handling, rendering, and the
/// response cache.
pub struct CitationGenerator {
    aggregator: Aggregator,
    cache: ResponseCache<Citation>,
    renderer: Box<dyn Renderer>,
}

impl CitationGenerator {
    pub fn new(config: &Config) -> Self {
        Self::with_aggregator(Aggregator::new(config), config)
    }

    /// A generator over a custom provider set (still in precedence
    /// order).
    pub fn with_aggregator(aggregator: Aggregator, config: &Config) -> Self {
        Self {
            aggregator,
            cache: ResponseCache::new(
                config.cache_enabled,
                config.cache_max_entries,
                config.cache_ttl,
            ),
            renderer: Box::new(FallbackRenderer),
        }
    }

    /// Swap in an external CSL rendering engine.
    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Classify an identifier without touching the network.
    pub fn validate(&self, raw: &str) -> Result<Identifier, CitationError> {
        identifier::classify(raw)
    }

    /// Resolve an identifier to its canonical record. Errors with
    /// `NoMetadataFound` when no provider contributed anything.
    pub async fn resolve(&self, raw: &str) -> Result<CanonicalRecord, CitationError> {
        let id = identifier::classify(raw)?;
        let bag = self.aggregator.aggregate(&id).await;
        if bag.is_empty() {
            return Err(CitationError::NoMetadataFound {
                identifier: id.normalized.clone(),
                kind: id.kind,
            });
        }
        Ok(csl::build(&bag, &id))
    }

    /// The full pipeline: classify, resolve the style (before any
    /// network call), aggregate, build, render.
    pub async fn generate(
        &self,
        raw: &str,
        style_name: &str,
        format: OutputFormat,
    ) -> Result<Citation, CitationError> {
        let id = identifier::classify(raw)?;
        let style = styles::resolve(style_name)?;

        // The format participates in the key so an HTML request can
        // never be answered with a cached plain rendering.
        let cache_style = match format {
            OutputFormat::Plain => style.name.to_string(),
            OutputFormat::Html => format!("{}+html", style.name),
        };
        if let Some(hit) = self.cache.get(&id.normalized, &cache_style) {
            debug!(identifier = %id.normalized, style = style.name, "cache hit");
            return Ok(hit);
        }

        info!(identifier = %id.normalized, kind = %id.kind, "fetching metadata");
        let bag = self.aggregator.aggregate(&id).await;
        if bag.is_empty() {
            return Err(CitationError::NoMetadataFound {
                identifier: id.normalized.clone(),
                kind: id.kind,
            });
        }
        debug!(sources = ?bag.sources, "metadata aggregated");

        let record = csl::build(&bag, &id);
        let full_citation = self.renderer.render(&record, style.csl_id, format)?;

        let citation = Citation {
            identifier: id.normalized.clone(),
            kind: id.kind,
            style: style.name.to_string(),
            full_citation,
            parenthetical: styles::parenthetical(&record, style.name),
            narrative: styles::narrative(&record, style.name),
            record,
        };
        self.cache.set(&id.normalized, &cache_style, citation.clone());

        Ok(citation)
    }

    /// Every style available for `generate`.
    pub fn styles(&self) -> &'static [styles::Style] {
        styles::STYLES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{async_trait, Provider, ProviderError, ProviderFields};
    use crate::record::{Author, CslDate};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct ScriptedProvider {
        fields: Option<ProviderFields>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        fn supports(&self, _kind: IdentifierKind) -> bool {
            true
        }

        async fn lookup(
            &self,
            _id: &Identifier,
        ) -> Result<Option<(ProviderFields, Value)>, ProviderError> {
            self.calls.fetch_add(1, Ordering::Relaxed);
            Ok(self.fields.clone().map(|f| (f, json!({}))))
        }
    }

    fn generator_with(fields: Option<ProviderFields>) -> (CitationGenerator, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = ScriptedProvider {
            fields,
            calls: Arc::clone(&calls),
        };
        let aggregator =
            Aggregator::with_providers(vec![Box::new(provider)], Duration::from_secs(5));
        let generator = CitationGenerator::with_aggregator(aggregator, &Config::default());
        (generator, calls)
    }

    fn article_fields() -> ProviderFields {
        ProviderFields {
            title: Some("Quantum".to_string()),
            authors: Some(vec![Author::new("Bell", "")]),
            issued: Some(CslDate::from_year(2009)),
            raw_type: Some("journal-article".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn malformed_identifier_fails_before_any_provider_call() {
        let (generator, calls) = generator_with(Some(article_fields()));
        let err = generator
            .generate("not-an-id", "apa", OutputFormat::Plain)
            .await
            .unwrap_err();

        assert!(matches!(err, CitationError::InvalidIdentifier(_)));
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn unknown_style_fails_before_any_provider_call() {
        let (generator, calls) = generator_with(Some(article_fields()));
        let err = generator
            .generate("10.1038/nphys1170", "klingon", OutputFormat::Plain)
            .await
            .unwrap_err();

        assert!(matches!(err, CitationError::StyleNotFound(_)));
        assert_eq!(calls.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn generate_produces_all_three_citation_forms() {
        let (generator, _) = generator_with(Some(article_fields()));
        let citation = generator
            .generate("10.1038/nphys1170", "apa", OutputFormat::Plain)
            .await
            .unwrap();

        assert_eq!(citation.identifier, "10.1038/nphys1170");
        assert_eq!(citation.parenthetical, "(Bell, 2009)");
        assert_eq!(citation.narrative, "Bell (2009)");
        assert!(citation.full_citation.contains("Quantum"));
        assert_eq!(citation.record.doi.as_deref(), Some("10.1038/nphys1170"));
    }

    #[tokio::test]
    async fn second_generate_is_served_from_the_cache() {
        let (generator, calls) = generator_with(Some(article_fields()));
        let first = generator
            .generate("10.1038/nphys1170", "apa", OutputFormat::Plain)
            .await
            .unwrap();
        let second = generator
            .generate("10.1038/nphys1170", "apa", OutputFormat::Plain)
            .await
            .unwrap();

        assert_eq!(first.full_citation, second.full_citation);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn empty_aggregation_surfaces_not_found() {
        let (generator, calls) = generator_with(None);
        let err = generator
            .generate("10.1038/nphys1170", "apa", OutputFormat::Plain)
            .await
            .unwrap_err();

        assert!(matches!(err, CitationError::NoMetadataFound { .. }));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn validate_does_not_require_a_runtime() {
        let (generator, _) = generator_with(None);
        assert!(generator.validate("9780140449136").is_ok());
        assert!(generator.validate("garbage").is_err());
    }
}
