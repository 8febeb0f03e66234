//! Tag matching.
//!
//! A tag matches when it occurs, case-insensitively, as a substring of the
//! article title, body or keywords. Matching is deliberately not tokenized:
//! `tech` matches `technology`.

use crate::error::ConfigError;
use crate::models::ExtractedArticle;

/// A validated, non-empty set of query tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSet {
    /// (tag as supplied, lowercased form), in input order.
    tags: Vec<(String, String)>,
}

impl TagSet {
    /// Trim tags, drop blanks and case-insensitive duplicates.
    ///
    /// # Errors
    ///
    /// [`ConfigError::EmptyTags`] when nothing is left.
    pub fn new<I, S>(tags: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<(String, String)> = Vec::new();
        for tag in tags {
            let tag = tag.as_ref().trim();
            if tag.is_empty() {
                continue;
            }
            let lower = tag.to_lowercase();
            if out.iter().all(|(_, existing)| *existing != lower) {
                out.push((tag.to_string(), lower));
            }
        }
        if out.is_empty() {
            return Err(ConfigError::EmptyTags);
        }
        Ok(Self { tags: out })
    }

    /// Tags as supplied, in order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|(tag, _)| tag.as_str())
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Tags found in the article, in tag order.
    pub fn matched(&self, article: &ExtractedArticle) -> Vec<String> {
        let mut haystack = String::with_capacity(article.title.len() + article.text.len() + 2);
        haystack.push_str(&article.title.to_lowercase());
        haystack.push('\n');
        haystack.push_str(&article.text.to_lowercase());
        if !article.keywords.is_empty() {
            haystack.push('\n');
            haystack.push_str(&article.keywords.join(",").to_lowercase());
        }

        self.tags
            .iter()
            .filter(|(_, lower)| haystack.contains(lower.as_str()))
            .map(|(tag, _)| tag.clone())
            .collect()
    }

    /// Whether any tag occurs in the article.
    pub fn matches(&self, article: &ExtractedArticle) -> bool {
        !self.matched(article).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn article(title: &str, text: &str, keywords: &[&str]) -> ExtractedArticle {
        ExtractedArticle {
            title: title.to_string(),
            text: text.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            source_name: "Test".to_string(),
            url: Url::parse("http://a.example/1").unwrap(),
            publish_date: None,
        }
    }

    #[test]
    fn test_rejects_empty_tag_sets() {
        assert!(matches!(
            TagSet::new(Vec::<String>::new()),
            Err(ConfigError::EmptyTags)
        ));
        assert!(matches!(TagSet::new(" , ,".split(',')), Err(ConfigError::EmptyTags)));
    }

    #[test]
    fn test_trims_and_dedupes() {
        let tags = TagSet::new("climate, Technology ,,CLIMATE,health".split(',')).unwrap();
        assert_eq!(tags.tags().collect::<Vec<_>>(), vec!["climate", "Technology", "health"]);
        assert_eq!(tags.len(), 3);
    }

    #[test]
    fn test_case_insensitive_substring() {
        let tags = TagSet::new(["TECH"]).unwrap();
        assert!(tags.matches(&article("", "New technology rules", &[])));
        assert!(tags.matches(&article("Biotech boom", "", &[])));
        assert!(!tags.matches(&article("Sports", "Football results", &[])));
    }

    #[test]
    fn test_keywords_only_when_present() {
        let tags = TagSet::new(["election"]).unwrap();
        assert!(tags.matches(&article("Vote", "Polls open", &["election", "vote"])));
        assert!(!tags.matches(&article("Vote", "Polls open", &[])));
    }

    #[test]
    fn test_matched_reports_tags_in_order() {
        let tags = TagSet::new(["health", "zzzznotfound", "Climate"]).unwrap();
        let a = article("Climate and health", "text", &[]);
        assert_eq!(tags.matched(&a), vec!["health", "Climate"]);
    }

    #[test]
    fn test_no_cross_field_match() {
        // "ab" must not match across the title/text boundary.
        let tags = TagSet::new(["ab"]).unwrap();
        assert!(!tags.matches(&article("xa", "bx", &[])));
    }
}
