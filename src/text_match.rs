use unicode_normalization::UnicodeNormalization;

use super::*;

/// Case- and compatibility-insensitive fold used by every text predicate:
/// NFKC first so full-width and ligature forms compare equal, then lowercase.
pub(crate) fn fold_text(input: &str) -> String {
    input.nfkc().collect::<String>().to_lowercase()
}

/// Keyword matcher backed by a single alternation regex over folded text.
#[derive(Debug, Clone)]
pub(crate) struct KeywordMatcher {
    backend: fancy_regex::Regex,
}

impl KeywordMatcher {
    pub(crate) fn new(keywords: &[String]) -> Result<Self> {
        let alternatives = keywords
            .iter()
            .map(|keyword| fold_text(keyword.trim()))
            .filter(|keyword| !keyword.is_empty())
            .map(|keyword| {
                // Inner whitespace in a keyword matches any whitespace run.
                keyword
                    .split_whitespace()
                    .map(fancy_regex::escape)
                    .collect::<Vec<_>>()
                    .join(r"\s+")
            })
            .collect::<Vec<_>>();
        if alternatives.is_empty() {
            return Err(Error::InvalidConfig(
                "keyword matcher requires at least one keyword".into(),
            ));
        }
        let pattern = format!("(?:{})", alternatives.join("|"));
        let backend = fancy_regex::Regex::new(&pattern).map_err(regex_error)?;
        Ok(Self { backend })
    }

    pub(crate) fn is_match(&self, text: &str) -> Result<bool> {
        self.backend
            .is_match(&fold_text(text))
            .map_err(regex_error)
    }
}

/// True when the folded text contains every one of `needles`.
pub(crate) fn contains_all(text: &str, needles: &[&str]) -> bool {
    let folded = fold_text(text);
    needles.iter().all(|needle| folded.contains(needle))
}

fn regex_error(err: fancy_regex::Error) -> Error {
    Error::Regex(err.to_string())
}
