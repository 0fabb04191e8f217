use super::{async_trait, date_from_text, split_name, Provider, ProviderError, ProviderFields};
use crate::config::Config;
use crate::identifier::{Identifier, IdentifierKind};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

const OPENLIBRARY_API_BASE: &str = "https://openlibrary.org/api/books";

/// Open Library books API; highest precedence for ISBN lookups.
pub struct OpenLibraryProvider {
    client: Client,
}

impl OpenLibraryProvider {
    pub fn new(config: &Config) -> Self {
        let client = Client::builder()
            .user_agent(config.user_agent())
            .build()
            .expect("Failed to create HTTP client");
        Self { client }
    }
}

#[derive(Debug, Deserialize)]
struct OpenLibraryBook {
    title: Option<String>,
    authors: Option<Vec<NamedItem>>,
    publishers: Option<Vec<NamedItem>>,
    publish_date: Option<String>,
    number_of_pages: Option<u32>,
    publish_places: Option<Vec<NamedItem>>,
    edition_name: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedItem {
    name: Option<String>,
}

fn parse_book(book: &OpenLibraryBook) -> ProviderFields {
    let authors = book.authors.as_ref().map(|authors| {
        authors
            .iter()
            .filter_map(|a| a.name.as_deref())
            .map(split_name)
            .collect::<Vec<_>>()
    });

    ProviderFields {
        title: book.title.clone(),
        authors,
        publisher: book
            .publishers
            .as_ref()
            .and_then(|p| p.first())
            .and_then(|p| p.name.clone()),
        issued: book.publish_date.as_deref().and_then(date_from_text),
        page_count: book.number_of_pages,
        publisher_place: book
            .publish_places
            .as_ref()
            .and_then(|p| p.first())
            .and_then(|p| p.name.clone()),
        edition: book.edition_name.clone(),
        url: book.url.clone(),
        ..Default::default()
    }
}

#[async_trait]
impl Provider for OpenLibraryProvider {
    fn name(&self) -> &'static str {
        "openlibrary"
    }

    fn supports(&self, kind: IdentifierKind) -> bool {
        kind == IdentifierKind::Isbn
    }

    async fn lookup(
        &self,
        id: &Identifier,
    ) -> Result<Option<(ProviderFields, Value)>, ProviderError> {
        let bibkey = format!("ISBN:{}", id.normalized);

        let response = self
            .client
            .get(OPENLIBRARY_API_BASE)
            .query(&[
                ("bibkeys", bibkey.as_str()),
                ("format", "json"),
                ("jscmd", "data"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::HttpStatus(response.status()));
        }

        // The response is an object keyed by the requested bibkey; an
        // unknown ISBN comes back as an empty object.
        let mut body: HashMap<String, Value> = response.json().await?;
        let Some(raw) = body.remove(&bibkey) else {
            return Ok(None);
        };

        let book: OpenLibraryBook = serde_json::from_value(raw.clone())
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        Ok(Some((parse_book(&book), raw)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_book_data() {
        let book: OpenLibraryBook = serde_json::from_value(json!({
            "title": "The Odyssey",
            "authors": [{ "name": "Homer" }, { "name": "Robert Fagles" }],
            "publishers": [{ "name": "Penguin Classics" }],
            "publish_date": "November 1997",
            "number_of_pages": 541,
            "publish_places": [{ "name": "New York" }],
            "edition_name": "2nd edition",
            "url": "https://openlibrary.org/books/OL123M/The_Odyssey"
        }))
        .unwrap();

        let fields = parse_book(&book);
        assert_eq!(fields.title.as_deref(), Some("The Odyssey"));
        assert_eq!(fields.issued.unwrap().year(), Some(1997));
        assert_eq!(fields.page_count, Some(541));
        assert_eq!(fields.publisher_place.as_deref(), Some("New York"));
        assert_eq!(fields.edition.as_deref(), Some("2nd edition"));

        let authors = fields.authors.unwrap();
        assert_eq!(authors[0].family.as_deref(), Some("Homer"));
        assert_eq!(authors[0].given, None);
        assert_eq!(authors[1].family.as_deref(), Some("Fagles"));
    }

    #[test]
    fn unparseable_publish_date_omits_the_date() {
        let book: OpenLibraryBook = serde_json::from_value(json!({
            "title": "Undated",
            "publish_date": "n.d."
        }))
        .unwrap();
        assert!(parse_book(&book).issued.is_none());
    }
}
