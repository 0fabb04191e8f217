use crate::identifier::IdentifierKind;
use crate::render::RenderError;
use thiserror::Error;

/// Service-level failures surfaced to the caller.
///
/// Per-provider failures never appear here; the aggregator absorbs them
/// and only the aggregate "nothing usable from any source" condition
/// escalates as [`CitationError::NoMetadataFound`].
#[derive(Error, Debug)]
pub enum CitationError {
    /// Input matched neither the DOI nor the ISBN pattern. No network
    /// calls are attempted for malformed input.
    #[error("not a recognizable DOI or ISBN: {0:?}")]
    InvalidIdentifier(String),

    /// Every relevant provider failed or returned nothing usable.
    /// Distinct from a malformed identifier.
    #[error("no metadata found for {kind} {identifier}")]
    NoMetadataFound {
        identifier: String,
        kind: IdentifierKind,
    },

    /// The requested citation style has no known style-sheet mapping.
    /// Never silently substituted with a default.
    #[error("unknown citation style: {0:?}")]
    StyleNotFound(String),

    #[error("rendering failed: {0}")]
    Render(#[from] RenderError),
}
