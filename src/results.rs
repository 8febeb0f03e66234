//! Ordered collection of matched articles.

use crate::models::{ArticleRecord, MatchResult};
use serde::Serialize;

/// Matches in site configuration order, then discovery order within a site.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultSet {
    matches: Vec<MatchResult>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: MatchResult) {
        self.matches.push(result);
    }

    pub fn extend(&mut self, results: impl IntoIterator<Item = MatchResult>) {
        self.matches.extend(results);
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &MatchResult> {
        self.matches.iter()
    }

    /// Number of matches attributed to `source_name`.
    pub fn per_site_count(&self, source_name: &str) -> usize {
        self.matches
            .iter()
            .filter(|m| m.article.source_name == source_name)
            .count()
    }

    /// Flat output records; `preview_len` cuts each text to that many characters.
    pub fn records(&self, preview_len: Option<usize>) -> Vec<ArticleRecord> {
        self.matches
            .iter()
            .map(|m| ArticleRecord::from_match(m, preview_len))
            .collect()
    }
}

impl IntoIterator for ResultSet {
    type Item = MatchResult;
    type IntoIter = std::vec::IntoIter<MatchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtractedArticle;
    use url::Url;

    fn result(source: &str, n: usize) -> MatchResult {
        MatchResult {
            article: ExtractedArticle {
                title: format!("Story {n}"),
                text: "Climate text that is fairly long".to_string(),
                keywords: Vec::new(),
                source_name: source.to_string(),
                url: Url::parse(&format!("http://a.example/{n}")).unwrap(),
                publish_date: None,
            },
            matched_tags: vec!["climate".to_string()],
        }
    }

    #[test]
    fn test_preserves_insertion_order() {
        let mut set = ResultSet::new();
        set.push(result("A", 1));
        set.extend([result("B", 2), result("A", 3)]);
        let titles: Vec<_> = set.iter().map(|m| m.article.title.as_str()).collect();
        assert_eq!(titles, vec!["Story 1", "Story 2", "Story 3"]);
        assert_eq!(set.per_site_count("A"), 2);
        assert_eq!(set.per_site_count("C"), 0);
    }

    #[test]
    fn test_records_with_preview() {
        let mut set = ResultSet::new();
        set.push(result("A", 1));
        let records = set.records(Some(7));
        assert_eq!(records[0].text, "Climate");
        assert_eq!(records[0].keywords, "");
        assert_eq!(set.records(None)[0].text, "Climate text that is fairly long");
    }
}
