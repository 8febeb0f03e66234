//! Optional keyword annotation run on each article before tag matching.
//!
//! The crawler works without an annotator; keywords then stay empty and
//! matching only looks at title and body.

use crate::models::ExtractedArticle;
use itertools::Itertools;
use std::collections::{HashMap, HashSet};

/// Hook that may fill or extend [`ExtractedArticle::keywords`].
pub trait Annotator: Send + Sync {
    fn annotate(&self, article: &mut ExtractedArticle);
}

const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "even",
    "few", "for", "from", "further", "had", "has", "have", "having", "he", "her", "here", "hers",
    "herself", "him", "himself", "his", "how", "i", "if", "in", "into", "is", "it", "its",
    "itself", "just", "like", "made", "make", "many", "may", "me", "might", "more", "most",
    "much", "must", "my", "myself", "new", "no", "nor", "not", "now", "of", "off", "on", "once",
    "one", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "said",
    "same", "say", "says", "she", "should", "since", "so", "some", "still", "such", "than",
    "that", "the", "their", "theirs", "them", "themselves", "then", "there", "these", "they",
    "this", "those", "through", "to", "too", "two", "under", "until", "up", "us", "very", "was",
    "way", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will",
    "with", "would", "year", "years", "yet", "you", "your", "yours", "yourself", "yourselves",
];

/// Frequency-ranked keywords from title + body.
///
/// Words shorter than `min_word_len` letters and stopwords are ignored;
/// ties keep first-appearance order. The stopword set is built once here
/// and shared by every annotation.
#[derive(Debug, Clone)]
pub struct KeywordAnnotator {
    stopwords: HashSet<&'static str>,
    max_keywords: usize,
    min_word_len: usize,
}

impl Default for KeywordAnnotator {
    fn default() -> Self {
        Self::new(10)
    }
}

impl KeywordAnnotator {
    pub fn new(max_keywords: usize) -> Self {
        Self {
            stopwords: STOPWORDS.iter().copied().collect(),
            max_keywords,
            min_word_len: 3,
        }
    }

    /// Rank the keywords of `text`.
    pub fn keywords(&self, text: &str) -> Vec<String> {
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        let words = text
            .split(|c: char| !c.is_alphanumeric() && c != '\'')
            .map(|w| w.trim_matches('\'').to_lowercase())
            .filter(|w| {
                w.chars().count() >= self.min_word_len
                    && w.chars().any(char::is_alphabetic)
                    && !self.stopwords.contains(w.as_str())
            });
        for (position, word) in words.enumerate() {
            counts.entry(word).or_insert((0, position)).0 += 1;
        }

        counts
            .into_iter()
            .sorted_by(|(_, (ca, pa)), (_, (cb, pb))| cb.cmp(ca).then(pa.cmp(pb)))
            .take(self.max_keywords)
            .map(|(word, _)| word)
            .collect()
    }
}

impl Annotator for KeywordAnnotator {
    fn annotate(&self, article: &mut ExtractedArticle) {
        let combined = format!("{} {}", article.title, article.text);
        let found = self.keywords(&combined);
        let extra = found
            .into_iter()
            .filter(|k| !article.keywords.contains(k))
            .collect::<Vec<_>>();
        article.keywords.extend(extra);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn test_ranks_by_frequency_then_position() {
        let annotator = KeywordAnnotator::new(3);
        let kws = annotator.keywords(
            "Solar power grows. Wind power grows too. The solar industry and power markets.",
        );
        assert_eq!(kws, vec!["power", "solar", "grows"]);
    }

    #[test]
    fn test_skips_stopwords_short_words_and_numbers() {
        let annotator = KeywordAnnotator::default();
        let kws = annotator.keywords("The of and an EU 2025 2025 2025 budget");
        assert_eq!(kws, vec!["budget"]);
    }

    #[test]
    fn test_annotate_extends_existing_keywords() {
        let mut article = ExtractedArticle {
            title: "Climate summit".to_string(),
            text: "Leaders met at the climate summit to discuss climate finance.".to_string(),
            keywords: vec!["climate".to_string()],
            source_name: "Test".to_string(),
            url: Url::parse("http://a.example/1").unwrap(),
            publish_date: None,
        };
        KeywordAnnotator::new(3).annotate(&mut article);
        assert_eq!(article.keywords, vec!["climate", "summit", "leaders"]);
    }
}
