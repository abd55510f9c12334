//! URL relevance scoring for best-first crawls.

/// Scores a URL by the share of keywords that appear in it.
#[derive(Debug, Clone)]
pub struct KeywordRelevanceScorer {
    keywords: Vec<String>,
    weight: f64,
}

impl KeywordRelevanceScorer {
    pub fn new<I, S>(keywords: I, weight: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { keywords, weight }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// `weight * matched / total`, case-insensitive; 0 without keywords.
    pub fn score(&self, url: &str) -> f64 {
        if self.keywords.is_empty() {
            return 0.0;
        }
        let url = url.to_lowercase();
        let matched = self.keywords.iter().filter(|k| url.contains(k.as_str())).count();
        self.weight * matched as f64 / self.keywords.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_is_weighted_share_of_matches() {
        let scorer = KeywordRelevanceScorer::new(["Phones", "galaxy", " "], 0.7);
        assert_eq!(scorer.keywords(), ["phones", "galaxy"]);
        assert_eq!(scorer.score("https://shop.com/about"), 0.0);
        assert!((scorer.score("https://shop.com/PHONES/list") - 0.35).abs() < 1e-9);
        assert!((scorer.score("https://shop.com/phones/galaxy-s24") - 0.7).abs() < 1e-9);
    }

    #[test]
    fn test_no_keywords_scores_zero() {
        let scorer = KeywordRelevanceScorer::new(Vec::<String>::new(), 0.7);
        assert_eq!(scorer.score("https://shop.com/phones"), 0.0);
    }
}
