pub use async_trait::async_trait;

pub mod crossref;
pub mod datacite;
pub mod googlebooks;
pub mod isbndb;
pub mod openlibrary;
pub mod unpaywall;
pub mod worldcat;

use crate::identifier::{Identifier, IdentifierKind};
use crate::record::{Author, CslDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").unwrap());

/// How a single provider call failed. Always captured inside a
/// [`ProviderResult`], never propagated past the aggregator.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Network(String),
    #[error("unexpected HTTP status: {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Decode(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

/// The shared logical field vocabulary every adapter parses into.
///
/// Each adapter's parse step is a pure function from that provider's
/// concrete response schema to this shape; a `None` means the provider
/// did not supply the field, which is normal and carries no error.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderFields {
    pub title: Option<String>,
    pub authors: Option<Vec<Author>>,
    pub publisher: Option<String>,
    pub issued: Option<CslDate>,
    pub container_title: Option<String>,
    pub volume: Option<String>,
    pub issue: Option<String>,
    pub page: Option<String>,
    pub page_count: Option<u32>,
    pub edition: Option<String>,
    pub publisher_place: Option<String>,
    pub url: Option<String>,
    pub open_access_url: Option<String>,
    pub abstract_text: Option<String>,
    pub issn: Option<String>,
    /// The provider's native type string (e.g. Crossref's
    /// `journal-article`); mapped to the canonical vocabulary by the
    /// record builder, not here.
    pub raw_type: Option<String>,
}

impl ProviderFields {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Outcome of one provider call for one request. Ephemeral: owned by the
/// aggregator for the duration of a single aggregation.
#[derive(Debug)]
pub struct ProviderResult {
    pub provider: &'static str,
    /// Parsed fields when the provider had a usable payload.
    pub fields: Option<ProviderFields>,
    /// The provider's original payload subtree, retained for
    /// traceability in the merged bag.
    pub raw: Option<Value>,
    pub error: Option<ProviderError>,
}

impl ProviderResult {
    pub fn hit(provider: &'static str, fields: ProviderFields, raw: Value) -> Self {
        Self {
            provider,
            fields: Some(fields),
            raw: Some(raw),
            error: None,
        }
    }

    /// The provider answered but had nothing for this identifier
    /// (e.g. a 404). Not a failure.
    pub fn miss(provider: &'static str) -> Self {
        Self {
            provider,
            fields: None,
            raw: None,
            error: None,
        }
    }

    pub fn failed(provider: &'static str, error: ProviderError) -> Self {
        Self {
            provider,
            fields: None,
            raw: None,
            error: Some(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// A bibliographic data source queried by identifier.
#[async_trait]
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Which identifier kind this source can resolve. The aggregator
    /// only invokes providers whose supported kind matches the request.
    fn supports(&self, kind: IdentifierKind) -> bool;

    /// Query the source. `Ok(None)` means the identifier is unknown to
    /// this provider; errors are real transport/decode failures.
    async fn lookup(
        &self,
        id: &Identifier,
    ) -> Result<Option<(ProviderFields, Value)>, ProviderError>;

    /// Infallible wrapper around [`Provider::lookup`]: every failure is
    /// captured in the returned [`ProviderResult`].
    async fn fetch(&self, id: &Identifier) -> ProviderResult {
        match self.lookup(id).await {
            Ok(Some((fields, raw))) => ProviderResult::hit(self.name(), fields, raw),
            Ok(None) => ProviderResult::miss(self.name()),
            Err(err) => ProviderResult::failed(self.name(), err),
        }
    }
}

/// Split a display name into family/given by treating the last
/// whitespace-delimited token as the family name. Known to mis-parse
/// multi-word family names; see the regression test below.
pub(crate) fn split_name(name: &str) -> Author {
    let name = name.trim();
    match name.rsplit_once(char::is_whitespace) {
        Some((given, family)) => Author::new(family, given.trim()),
        None => Author::new(name, ""),
    }
}

/// Split a semicolon-joined author string (WorldCat style) into
/// individual authors.
pub(crate) fn split_author_list(joined: &str) -> Vec<Author> {
    joined
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(split_name)
        .collect()
}

/// Pull the first 4-digit year out of a free-form date string. Absence
/// of a year is normal: the date is simply omitted.
pub(crate) fn date_from_text(text: &str) -> Option<CslDate> {
    let year = YEAR_RE.find(text)?.as_str().parse().ok()?;
    Some(CslDate::from_year(year))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_simple_name() {
        let author = split_name("Ada Lovelace");
        assert_eq!(author.family.as_deref(), Some("Lovelace"));
        assert_eq!(author.given.as_deref(), Some("Ada"));
    }

    #[test]
    fn single_token_becomes_family_name() {
        let author = split_name("Aristotle");
        assert_eq!(author.family.as_deref(), Some("Aristotle"));
        assert_eq!(author.given, None);
    }

    #[test]
    fn multi_word_family_names_are_misparsed() {
        // Pins the current last-token heuristic: "Vaughan Williams" is a
        // compound family name, but the split assigns only "Williams".
        let author = split_name("Ralph Vaughan Williams");
        assert_eq!(author.family.as_deref(), Some("Williams"));
        assert_eq!(author.given.as_deref(), Some("Ralph Vaughan"));
    }

    #[test]
    fn splits_semicolon_joined_authors() {
        let authors = split_author_list("John Steinbeck; Robert DeMott ;");
        assert_eq!(authors.len(), 2);
        assert_eq!(authors[0].family.as_deref(), Some("Steinbeck"));
        assert_eq!(authors[1].given.as_deref(), Some("Robert"));
    }

    #[test]
    fn extracts_year_from_date_strings() {
        assert_eq!(date_from_text("May 1998").unwrap().year(), Some(1998));
        assert_eq!(date_from_text("2009-04-01").unwrap().year(), Some(2009));
        assert!(date_from_text("n.d.").is_none());
    }

    #[test]
    fn empty_fields_report_empty() {
        assert!(ProviderFields::default().is_empty());
        let fields = ProviderFields {
            title: Some("X".to_string()),
            ..Default::default()
        };
        assert!(!fields.is_empty());
    }
}
