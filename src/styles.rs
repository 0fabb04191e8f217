use crate::error::CitationError;
use crate::record::CanonicalRecord;

/// A user-facing citation style and its CSL style-sheet identifier.
#[derive(Debug, Clone, Copy)]
pub struct Style {
    pub name: &'static str,
    /// Identifier in the CSL style repository, consumed by the
    /// rendering engine behind the facade.
    pub csl_id: &'static str,
    pub description: &'static str,
}

/// Every style this service knows how to request from a renderer.
pub const STYLES: &[Style] = &[
    Style { name: "apa", csl_id: "apa", description: "APA 6th Edition" },
    Style { name: "apa-7th", csl_id: "apa-6th-edition", description: "APA 7th Edition" },
    Style { name: "mla", csl_id: "modern-language-association", description: "MLA 8th Edition" },
    Style { name: "mla-9", csl_id: "modern-language-association-8th-edition", description: "MLA 9th Edition" },
    Style { name: "chicago", csl_id: "chicago-author-date", description: "Chicago Author-Date" },
    Style { name: "chicago-notes", csl_id: "chicago-note-bibliography", description: "Chicago Notes and Bibliography" },
    Style { name: "harvard", csl_id: "harvard-cite-them-right", description: "Harvard Reference Format" },
    Style { name: "ieee", csl_id: "ieee", description: "IEEE" },
    Style { name: "vancouver", csl_id: "vancouver", description: "Vancouver" },
    Style { name: "ama", csl_id: "american-medical-association", description: "American Medical Association" },
    Style { name: "acs", csl_id: "american-chemical-society", description: "American Chemical Society" },
    Style { name: "nature", csl_id: "nature", description: "Nature Journal" },
    Style { name: "science", csl_id: "science", description: "Science Magazine" },
    Style { name: "bibtex", csl_id: "bibtex", description: "BibTeX" },
    Style { name: "acm", csl_id: "acm-sig-proceedings", description: "Association for Computing Machinery" },
];

/// Look a style up by its user-facing name (case-insensitive). Unknown
/// names error; a citation is never silently produced in a different
/// style than the one asked for.
pub fn resolve(name: &str) -> Result<&'static Style, CitationError> {
    let lower = name.to_lowercase();
    STYLES
        .iter()
        .find(|s| s.name == lower)
        .ok_or_else(|| CitationError::StyleNotFound(name.to_string()))
}

/// Family-name portion of an in-text citation: one name as-is, two
/// joined, three or more as "et al.".
fn author_text(record: &CanonicalRecord, join: &str) -> Option<String> {
    let authors = record.author.as_deref()?;
    let family = |i: usize| -> String {
        authors
            .get(i)
            .and_then(|a| a.family.clone())
            .unwrap_or_default()
    };
    let text = match authors.len() {
        0 => return None,
        1 => family(0),
        2 => format!("{} {} {}", family(0), join, family(1)),
        _ => format!("{} et al.", family(0)),
    };
    (!text.trim().is_empty()).then_some(text)
}

fn year_text(record: &CanonicalRecord) -> Option<String> {
    record.year().map(|y| y.to_string())
}

fn generic_author_year(
    author: &Option<String>,
    year: &Option<String>,
    id: &str,
    parenthesized: bool,
) -> String {
    match (author, year) {
        (Some(a), Some(y)) if parenthesized => format!("({a}, {y})"),
        (Some(a), Some(y)) => format!("{a} ({y})"),
        (Some(a), None) if parenthesized => format!("({a})"),
        (Some(a), None) => a.clone(),
        (None, Some(y)) => format!("({y})"),
        (None, None) if parenthesized => format!("({id})"),
        (None, None) => id.to_string(),
    }
}

/// Parenthetical in-text citation, e.g. `(Bell & Aspect, 2009)`.
/// `style` is the already-resolved lowercase style name.
pub fn parenthetical(record: &CanonicalRecord, style: &str) -> String {
    let author = author_text(record, "&");
    let year = year_text(record);

    let styled = match style {
        "apa" | "apa-7th" | "harvard" => match (&author, &year) {
            (Some(a), Some(y)) => Some(format!("({a}, {y})")),
            (Some(a), None) => Some(format!("({a})")),
            (None, Some(y)) => Some(format!("({y})")),
            (None, None) => None,
        },
        "mla" | "mla-9" => author.as_ref().map(|a| format!("({a})")),
        "chicago" | "chicago-notes" => match (&author, &year) {
            (Some(a), Some(y)) => Some(format!("({a} {y})")),
            _ => None,
        },
        "ieee" => Some(format!("[{}]", record.id)),
        _ => None,
    };

    styled.unwrap_or_else(|| generic_author_year(&author, &year, &record.id, true))
}

/// Narrative in-text citation, e.g. `Bell and Aspect (2009)`.
pub fn narrative(record: &CanonicalRecord, style: &str) -> String {
    let author = author_text(record, "and");
    let year = year_text(record);

    let styled = match style {
        "apa" | "apa-7th" | "harvard" | "chicago" | "chicago-notes" => match (&author, &year) {
            (Some(a), Some(y)) => Some(format!("{a} ({y})")),
            (Some(a), None) => Some(a.clone()),
            (None, Some(y)) => Some(format!("({y})")),
            (None, None) => None,
        },
        "mla" | "mla-9" => author.clone(),
        "ieee" => Some(format!("[{}]", record.id)),
        _ => None,
    };

    styled.unwrap_or_else(|| generic_author_year(&author, &year, &record.id, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Author, CanonicalRecord, CslDate, CslType};

    fn record(authors: &[&str], year: Option<i32>) -> CanonicalRecord {
        let mut record = CanonicalRecord::new("10.1234/test", CslType::ArticleJournal);
        if !authors.is_empty() {
            record.author = Some(authors.iter().map(|a| Author::new(*a, "")).collect());
        }
        record.issued = year.map(CslDate::from_year);
        record
    }

    #[test]
    fn resolve_is_case_insensitive() {
        assert_eq!(resolve("APA").unwrap().csl_id, "apa");
        assert_eq!(resolve("chicago").unwrap().csl_id, "chicago-author-date");
    }

    #[test]
    fn unknown_style_is_an_error_not_a_default() {
        assert!(matches!(
            resolve("klingon"),
            Err(CitationError::StyleNotFound(_))
        ));
    }

    #[test]
    fn apa_parenthetical_joins_two_authors_with_ampersand() {
        let r = record(&["Bell", "Aspect"], Some(2009));
        assert_eq!(parenthetical(&r, "apa"), "(Bell & Aspect, 2009)");
        assert_eq!(narrative(&r, "apa"), "Bell and Aspect (2009)");
    }

    #[test]
    fn three_or_more_authors_collapse_to_et_al() {
        let r = record(&["Bell", "Aspect", "Clauser"], Some(1972));
        assert_eq!(parenthetical(&r, "apa"), "(Bell et al., 1972)");
    }

    #[test]
    fn mla_cites_author_without_year() {
        let r = record(&["Steinbeck"], Some(1952));
        assert_eq!(parenthetical(&r, "mla"), "(Steinbeck)");
        assert_eq!(narrative(&r, "mla"), "Steinbeck");
    }

    #[test]
    fn chicago_drops_the_comma() {
        let r = record(&["Bell"], Some(2009));
        assert_eq!(parenthetical(&r, "chicago"), "(Bell 2009)");
    }

    #[test]
    fn ieee_uses_the_record_id() {
        let r = record(&["Bell"], Some(2009));
        assert_eq!(parenthetical(&r, "ieee"), "[10.1234/test]");
        assert_eq!(narrative(&r, "ieee"), "[10.1234/test]");
    }

    #[test]
    fn unknown_fields_fall_back_to_the_id() {
        let r = record(&[], None);
        assert_eq!(parenthetical(&r, "apa"), "(10.1234/test)");
        assert_eq!(narrative(&r, "apa"), "10.1234/test");
    }

    #[test]
    fn year_only_records_cite_the_year() {
        let r = record(&[], Some(1859));
        assert_eq!(parenthetical(&r, "apa"), "(1859)");
        assert_eq!(narrative(&r, "vancouver"), "(1859)");
    }
}
