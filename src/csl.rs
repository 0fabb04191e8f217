use crate::aggregate::RawMetadataBag;
use crate::identifier::{Identifier, IdentifierKind};
use crate::record::{CanonicalRecord, CslType};
use once_cell::sync::Lazy;
use regex::Regex;

static EDITION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)\w*\s+edition").unwrap());
static LEADING_DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+").unwrap());

/// Map a raw registry type string onto the closed CSL vocabulary.
/// Anything unrecognized is treated as a journal article, the dominant
/// DOI content type.
fn map_raw_type(raw: Option<&str>) -> CslType {
    match raw {
        Some("journal-article") | Some("journal-issue") | Some("journal-volume")
        | Some("journal") => CslType::ArticleJournal,
        Some("book") | Some("monograph") | Some("edited-book") | Some("reference-book")
        | Some("book-series") | Some("book-set") => CslType::Book,
        Some("book-chapter") | Some("book-track") | Some("book-part") | Some("book-section") => {
            CslType::Chapter
        }
        Some("proceedings-article") | Some("proceedings") | Some("conference-paper")
        | Some("proceedings-series") => CslType::PaperConference,
        Some("report") | Some("report-series") | Some("report-component") | Some("standard")
        | Some("standard-series") => CslType::Report,
        Some("dissertation") => CslType::Thesis,
        Some("dataset") => CslType::Dataset,
        Some("posted-content") => CslType::Post,
        _ => CslType::ArticleJournal,
    }
}

/// Pull the numeric part out of an edition string: `"2nd edition"` and
/// `"3"` both yield the digits, prose like `"Deluxe edition"` yields
/// nothing and the field is omitted.
fn extract_edition_number(text: &str) -> Option<String> {
    if let Some(caps) = EDITION_RE.captures(text) {
        return Some(caps[1].to_string());
    }
    LEADING_DIGITS_RE
        .find(text.trim())
        .map(|m| m.as_str().to_string())
}

/// Build the canonical CSL record from a merged metadata bag.
///
/// Total and pure: missing optional data degrades the record instead of
/// failing, and identical inputs always produce the identical record.
pub fn build(bag: &RawMetadataBag, id: &Identifier) -> CanonicalRecord {
    let csl_type = match id.kind {
        IdentifierKind::Doi => map_raw_type(bag.fields.raw_type.as_deref()),
        // ISBN records are unconditionally books.
        IdentifierKind::Isbn => CslType::Book,
    };

    let mut record = CanonicalRecord::new(&id.normalized, csl_type);

    record.title = bag.fields.title.clone();
    record.author = bag.fields.authors.clone();
    record.issued = bag.fields.issued.clone();
    record.publisher = bag.fields.publisher.clone();
    record.container_title = bag.fields.container_title.clone();
    record.volume = bag.fields.volume.clone();
    record.issue = bag.fields.issue.clone();
    record.page = bag.fields.page.clone();
    record.issn = bag.fields.issn.clone();
    record.publisher_place = bag.fields.publisher_place.clone();
    record.number_of_pages = bag.fields.page_count;
    record.abstract_text = bag.fields.abstract_text.clone();
    record.edition = bag
        .fields
        .edition
        .as_deref()
        .and_then(extract_edition_number);

    match id.kind {
        IdentifierKind::Doi => {
            record.doi = Some(id.normalized.clone());
            // The aggregator has already replaced the URL with an
            // open-access location when one exists; otherwise fall back
            // to the standard resolver.
            record.url = Some(
                bag.fields
                    .url
                    .clone()
                    .unwrap_or_else(|| format!("https://doi.org/{}", id.normalized)),
            );
        }
        IdentifierKind::Isbn => {
            record.isbn = Some(id.normalized.clone());
            record.url = bag.fields.url.clone();
        }
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::classify;
    use crate::providers::ProviderFields;
    use crate::record::{Author, CslDate};

    fn bag_with(fields: ProviderFields, sources: &[&str]) -> RawMetadataBag {
        RawMetadataBag {
            fields,
            sources: sources.iter().map(|s| s.to_string()).collect(),
            payloads: Default::default(),
        }
    }

    #[test]
    fn maps_registry_types_onto_the_closed_vocabulary() {
        assert_eq!(map_raw_type(Some("journal-article")), CslType::ArticleJournal);
        assert_eq!(map_raw_type(Some("book-chapter")), CslType::Chapter);
        assert_eq!(map_raw_type(Some("proceedings-article")), CslType::PaperConference);
        assert_eq!(map_raw_type(Some("dissertation")), CslType::Thesis);
        assert_eq!(map_raw_type(Some("dataset")), CslType::Dataset);
        assert_eq!(map_raw_type(Some("posted-content")), CslType::Post);
        assert_eq!(map_raw_type(Some("monograph")), CslType::Book);
        assert_eq!(map_raw_type(Some("standard")), CslType::Report);
        // Unmapped and absent types both default to article-journal.
        assert_eq!(map_raw_type(Some("foobar")), CslType::ArticleJournal);
        assert_eq!(map_raw_type(None), CslType::ArticleJournal);
    }

    #[test]
    fn edition_number_extraction() {
        assert_eq!(extract_edition_number("2nd edition").as_deref(), Some("2"));
        assert_eq!(extract_edition_number("10th Edition").as_deref(), Some("10"));
        assert_eq!(extract_edition_number("3").as_deref(), Some("3"));
        assert_eq!(extract_edition_number("Deluxe edition"), None);
        assert_eq!(extract_edition_number("Revised"), None);
    }

    #[test]
    fn doi_record_synthesizes_resolver_url_when_no_open_access_copy() {
        let id = classify("10.1038/nphys1170").unwrap();
        let record = build(&bag_with(ProviderFields::default(), &[]), &id);
        assert_eq!(record.url.as_deref(), Some("https://doi.org/10.1038/nphys1170"));
    }

    #[test]
    fn doi_record_keeps_the_overridden_open_access_url() {
        let id = classify("10.1234/x").unwrap();
        let fields = ProviderFields {
            url: Some("https://repo.example/pdf".to_string()),
            ..Default::default()
        };
        let record = build(&bag_with(fields, &["unpaywall"]), &id);
        assert_eq!(record.url.as_deref(), Some("https://repo.example/pdf"));
    }

    #[test]
    fn registry_only_doi_scenario_produces_the_expected_record() {
        let id = classify("10.1038/nphys1170").unwrap();
        let fields = ProviderFields {
            title: Some("Quantum".to_string()),
            authors: Some(vec![Author::new("Bell", "")]),
            issued: Some(CslDate::from_year(2009)),
            raw_type: Some("journal-article".to_string()),
            ..Default::default()
        };
        let record = build(&bag_with(fields, &["crossref"]), &id);

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "10.1038/nphys1170",
                "type": "article-journal",
                "title": "Quantum",
                "author": [{ "family": "Bell" }],
                "issued": { "date-parts": [[2009]] },
                "URL": "https://doi.org/10.1038/nphys1170",
                "DOI": "10.1038/nphys1170"
            })
        );
    }

    #[test]
    fn empty_isbn_bag_still_builds_a_minimal_book_record() {
        let id = classify("9780140449136").unwrap();
        let bag = RawMetadataBag::default();
        assert!(bag.is_empty());

        let record = build(&bag, &id);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": "9780140449136",
                "type": "book",
                "ISBN": "9780140449136"
            })
        );
    }

    #[test]
    fn building_twice_from_the_same_inputs_is_byte_identical() {
        let id = classify("0140449132").unwrap();
        let fields = ProviderFields {
            title: Some("The Odyssey".to_string()),
            authors: Some(vec![Author::new("Homer", "")]),
            issued: Some(CslDate::from_year(1997)),
            publisher: Some("Penguin".to_string()),
            page_count: Some(541),
            edition: Some("2nd edition".to_string()),
            ..Default::default()
        };
        let bag = bag_with(fields, &["openlibrary"]);

        let first = serde_json::to_string(&build(&bag, &id)).unwrap();
        let second = serde_json::to_string(&build(&bag, &id)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn isbn_records_are_always_books_regardless_of_raw_type() {
        let id = classify("9780140449136").unwrap();
        let fields = ProviderFields {
            raw_type: Some("journal-article".to_string()),
            ..Default::default()
        };
        let record = build(&bag_with(fields, &["worldcat"]), &id);
        assert_eq!(record.csl_type, CslType::Book);
        assert!(record.doi.is_none());
    }
}
