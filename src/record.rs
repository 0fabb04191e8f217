use serde::{Deserialize, Serialize};

/// A single contributor. Order within an author list preserves the
/// contribution order reported by the source, never alphabetical.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given: Option<String>,
}

impl Author {
    pub fn new(family: impl Into<String>, given: impl Into<String>) -> Self {
        let family = family.into();
        let given = given.into();
        Self {
            family: (!family.is_empty()).then_some(family),
            given: (!given.is_empty()).then_some(given),
        }
    }
}

/// CSL structured date: `{"date-parts": [[year, month, day]]}` with the
/// month and day optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CslDate {
    #[serde(rename = "date-parts")]
    pub date_parts: Vec<Vec<i32>>,
}

impl CslDate {
    pub fn from_year(year: i32) -> Self {
        Self {
            date_parts: vec![vec![year]],
        }
    }

    /// The year component, when one is present.
    pub fn year(&self) -> Option<i32> {
        self.date_parts.first().and_then(|p| p.first()).copied()
    }
}

/// The closed CSL item-type vocabulary this service emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CslType {
    #[serde(rename = "article-journal")]
    ArticleJournal,
    #[serde(rename = "book")]
    Book,
    #[serde(rename = "chapter")]
    Chapter,
    #[serde(rename = "paper-conference")]
    PaperConference,
    #[serde(rename = "report")]
    Report,
    #[serde(rename = "thesis")]
    Thesis,
    #[serde(rename = "dataset")]
    Dataset,
    #[serde(rename = "post")]
    Post,
}

/// The canonical CSL-JSON bibliographic record produced by the builder
/// and consumed by the rendering facade. `id` and `csl_type` are always
/// populated; everything optional is omitted from serialization rather
/// than emitted as null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub csl_type: CslType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<Vec<Author>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued: Option<CslDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(rename = "container-title", skip_serializing_if = "Option::is_none")]
    pub container_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    #[serde(rename = "URL", skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "DOI", skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(rename = "ISBN", skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    #[serde(rename = "ISSN", skip_serializing_if = "Option::is_none")]
    pub issn: Option<String>,
    #[serde(rename = "publisher-place", skip_serializing_if = "Option::is_none")]
    pub publisher_place: Option<String>,
    #[serde(rename = "number-of-pages", skip_serializing_if = "Option::is_none")]
    pub number_of_pages: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edition: Option<String>,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
}

impl CanonicalRecord {
    pub fn new(id: impl Into<String>, csl_type: CslType) -> Self {
        Self {
            id: id.into(),
            csl_type,
            title: None,
            author: None,
            issued: None,
            publisher: None,
            container_title: None,
            volume: None,
            issue: None,
            page: None,
            url: None,
            doi: None,
            isbn: None,
            issn: None,
            publisher_place: None,
            number_of_pages: None,
            edition: None,
            abstract_text: None,
        }
    }

    /// Publication year, when the record carries one.
    pub fn year(&self) -> Option<i32> {
        self.issued.as_ref().and_then(|d| d.year())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_are_omitted_not_null() {
        let record = CanonicalRecord::new("9780140449136", CslType::Book);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "9780140449136");
        assert_eq!(json["type"], "book");
        assert!(json.get("title").is_none());
        assert!(json.get("URL").is_none());
    }

    #[test]
    fn csl_field_names_survive_serialization() {
        let mut record = CanonicalRecord::new("10.1/x", CslType::ArticleJournal);
        record.container_title = Some("Nature Physics".to_string());
        record.doi = Some("10.1/x".to_string());
        record.issued = Some(CslDate::from_year(2009));

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "article-journal");
        assert_eq!(json["container-title"], "Nature Physics");
        assert_eq!(json["DOI"], "10.1/x");
        assert_eq!(json["issued"]["date-parts"][0][0], 2009);
    }

    #[test]
    fn author_without_given_name_serializes_family_only() {
        let author = Author::new("Bell", "");
        let json = serde_json::to_value(&author).unwrap();
        assert_eq!(json, serde_json::json!({ "family": "Bell" }));
    }
}
