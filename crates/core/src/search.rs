//! Web search URL for finding lyrics by their first line.

use crate::error::{Error, Result};
use crate::types::Language;
use std::sync::LazyLock;
use url::Url;

/// Search engine endpoint the query is appended to.
static SEARCH_BASE_URL: LazyLock<Url> =
    LazyLock::new(|| Url::parse("https://www.google.com/search").unwrap());

/// Builds lyrics search URLs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchQueryBuilder;

impl SearchQueryBuilder {
    /// Create a new query builder.
    pub fn new() -> Self {
        Self
    }

    /// The plain search phrase for a lyrics snippet.
    pub fn phrase(&self, snippet: &str, language: &str) -> String {
        format!("lyrics {} {} christian devotional", snippet, language)
    }

    /// Build a search URL with the phrase form-encoded into the `q` parameter.
    ///
    /// # Example
    /// ```
    /// use lyrics_core::SearchQueryBuilder;
    ///
    /// let url = SearchQueryBuilder::new().build_url("Amazing Grace", "English");
    /// assert_eq!(
    ///     url,
    ///     "https://www.google.com/search?q=lyrics+Amazing+Grace+English+christian+devotional"
    /// );
    /// ```
    pub fn build_url(&self, snippet: &str, language: &str) -> String {
        let mut url = SEARCH_BASE_URL.clone();
        url.query_pairs_mut()
            .append_pair("q", &self.phrase(snippet, language));
        url.into()
    }

    /// Like [`build_url`](Self::build_url), but rejects an empty snippet.
    pub fn try_build_url(&self, snippet: &str, language: Language) -> Result<String> {
        let snippet = snippet.trim();
        if snippet.is_empty() {
            return Err(Error::MissingInput("Please enter the first line of lyrics."));
        }
        Ok(self.build_url(snippet, language.label()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded_query(url: &str) -> String {
        let url = Url::parse(url).unwrap();
        url.query_pairs()
            .find(|(k, _)| k == "q")
            .map(|(_, v)| v.into_owned())
            .unwrap()
    }

    #[test]
    fn test_query_decodes_to_phrase() {
        let url = SearchQueryBuilder::new().build_url("Amazing Grace", "English");
        assert!(url.starts_with("https://www.google.com/search?q="));
        assert_eq!(
            decoded_query(&url),
            "lyrics Amazing Grace English christian devotional"
        );
    }

    #[test]
    fn test_reserved_characters_are_encoded() {
        let url = SearchQueryBuilder::new().build_url("Holy & true? 100%", "Tamil");
        assert!(!url.contains(' '));
        assert!(url.contains("%26"));
        assert_eq!(
            decoded_query(&url),
            "lyrics Holy & true? 100% Tamil christian devotional"
        );
    }

    #[test]
    fn test_non_ascii_snippet() {
        let url = SearchQueryBuilder::new().build_url("ആരാധന", "Malayalam");
        assert!(url.is_ascii());
        assert_eq!(
            decoded_query(&url),
            "lyrics ആരാധന Malayalam christian devotional"
        );
    }

    #[test]
    fn test_try_build_url_requires_snippet() {
        let builder = SearchQueryBuilder::new();
        assert!(matches!(
            builder.try_build_url("   ", Language::Hindi),
            Err(Error::MissingInput(_))
        ));

        let url = builder.try_build_url(" Amazing Grace ", Language::English).unwrap();
        assert_eq!(url, builder.build_url("Amazing Grace", "English"));
    }
}
