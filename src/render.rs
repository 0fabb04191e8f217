use crate::record::{Author, CanonicalRecord};
use thiserror::Error;

/// Output flavor requested from a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Plain,
    Html,
}

#[derive(Error, Debug)]
pub enum RenderError {
    /// The engine has no style sheet for the requested CSL style id.
    #[error("style sheet unavailable: {0}")]
    StyleUnavailable(String),
    #[error("render engine failure: {0}")]
    Engine(String),
}

/// The external CSL-processing engine boundary: full-citation rendering
/// is delegated through this trait, with the canonical record and a CSL
/// style-sheet identifier going in and formatted text coming out.
pub trait Renderer: Send + Sync {
    fn render(
        &self,
        record: &CanonicalRecord,
        csl_id: &str,
        format: OutputFormat,
    ) -> Result<String, RenderError>;
}

/// Built-in author-year formatter used when no CSL engine is wired in.
/// Deliberately not a CSL processor: it produces one reasonable
/// APA-leaning shape for every style sheet.
pub struct FallbackRenderer;

impl Renderer for FallbackRenderer {
    fn render(
        &self,
        record: &CanonicalRecord,
        _csl_id: &str,
        format: OutputFormat,
    ) -> Result<String, RenderError> {
        let mut segments: Vec<String> = Vec::new();

        if let Some(authors) = record.author.as_deref() {
            let names: Vec<String> = authors.iter().map(format_author).collect();
            let joined = match names.len() {
                0 => String::new(),
                1 => names[0].clone(),
                _ => format!(
                    "{}, & {}",
                    names[..names.len() - 1].join(", "),
                    names[names.len() - 1]
                ),
            };
            if !joined.is_empty() {
                segments.push(with_period(&joined));
            }
        }

        if let Some(year) = record.year() {
            segments.push(format!("({year})."));
        }

        if let Some(title) = &record.title {
            segments.push(with_period(title));
        }

        if let Some(container) = &record.container_title {
            let mut part = container.clone();
            if let Some(volume) = &record.volume {
                part.push_str(&format!(", {volume}"));
                if let Some(issue) = &record.issue {
                    part.push_str(&format!("({issue})"));
                }
            }
            if let Some(page) = &record.page {
                part.push_str(&format!(", {page}"));
            }
            segments.push(with_period(&part));
        }

        if let Some(publisher) = &record.publisher {
            let part = match &record.publisher_place {
                Some(place) => format!("{place}: {publisher}"),
                None => publisher.clone(),
            };
            segments.push(with_period(&part));
        }

        if let Some(url) = &record.url {
            segments.push(url.clone());
        }

        if segments.is_empty() {
            segments.push(record.id.clone());
        }

        let text = segments.join(" ");
        Ok(match format {
            OutputFormat::Plain => text,
            OutputFormat::Html => format!("<div class=\"csl-entry\">{text}</div>"),
        })
    }
}

fn format_author(author: &Author) -> String {
    match (&author.family, &author.given) {
        (Some(family), Some(given)) => {
            let initials: Vec<String> = given
                .split_whitespace()
                .filter_map(|word| word.chars().next())
                .map(|c| format!("{}.", c.to_uppercase()))
                .collect();
            if initials.is_empty() {
                family.clone()
            } else {
                format!("{family}, {}", initials.join(" "))
            }
        }
        (Some(family), None) => family.clone(),
        (None, Some(given)) => given.clone(),
        (None, None) => String::new(),
    }
}

fn with_period(text: &str) -> String {
    if text.ends_with(['.', '?', '!']) {
        text.to_string()
    } else {
        format!("{text}.")
    }
}
