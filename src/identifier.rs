use crate::error::CitationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static DOI_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^10\.\d{4,9}/[-._;()/:A-Z0-9]+$").unwrap());

/// Digits followed by a hyphen or space, i.e. an ISBN written with
/// separators. DOIs never start with a bare digit run.
static ISBN_SEP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[-\s]").unwrap());

/// The two identifier families this service resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentifierKind {
    Doi,
    Isbn,
}

impl std::fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentifierKind::Doi => write!(f, "DOI"),
            IdentifierKind::Isbn => write!(f, "ISBN"),
        }
    }
}

/// A validated, normalized identifier. Built once per request by
/// [`classify`] and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    /// The string as the user supplied it.
    pub raw: String,
    /// No surrounding whitespace, no resolver-URL prefix for DOIs, no
    /// hyphens or spaces for ISBNs.
    pub normalized: String,
    pub kind: IdentifierKind,
}

/// Validate and type a raw identifier string.
///
/// The DOI pattern is checked before the ISBN pattern; a string matching
/// neither is an error, never a best-guess classification.
pub fn classify(raw: &str) -> Result<Identifier, CitationError> {
    let normalized = normalize(raw);

    let kind = if DOI_RE.is_match(&normalized) {
        IdentifierKind::Doi
    } else if is_isbn_shaped(&normalized) {
        IdentifierKind::Isbn
    } else {
        return Err(CitationError::InvalidIdentifier(raw.to_string()));
    };

    Ok(Identifier {
        raw: raw.to_string(),
        normalized,
        kind,
    })
}

/// Strip whitespace, unwrap `doi.org` resolver URLs, and remove ISBN
/// separators.
fn normalize(raw: &str) -> String {
    let mut id = raw.trim().to_string();

    if id.starts_with("http://") || id.starts_with("https://") {
        if let Some(pos) = id.find("doi.org/") {
            id = id[pos + "doi.org/".len()..].to_string();
        }
    }

    if ISBN_SEP_RE.is_match(&id) {
        id.retain(|c| c != '-' && !c.is_whitespace());
    }

    id.trim().to_string()
}

/// ISBN-10: nine digits plus a digit-or-X check character. ISBN-13:
/// thirteen digits. Checksums are deliberately not verified; shape is
/// enough to route the lookup, and providers decide real existence.
fn is_isbn_shaped(s: &str) -> bool {
    let bytes = s.as_bytes();
    match bytes.len() {
        10 => {
            bytes[..9].iter().all(|b| b.is_ascii_digit())
                && (bytes[9].is_ascii_digit() || bytes[9] == b'X' || bytes[9] == b'x')
        }
        13 => bytes.iter().all(|b| b.is_ascii_digit()),
        _ => false,
    }
}
