//! Text normalizer — lowercases, tokenizes, and drops stopwords.
//!
//! The output of [`TextNormalizer::normalize`] is what every vectorizer in
//! the model bundle was trained on, so the stopword set here must stay in
//! lockstep with training.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

/// Standard English stopword list.
const ENGLISH_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "by", "for", "with", "about", "against",
    "between", "into", "through", "during", "before", "after", "above", "below", "to", "from",
    "up", "down", "in", "out", "on", "off", "over", "under", "again", "further", "then", "once",
    "here", "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more",
    "most", "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than",
    "too", "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now",
    "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't",
    "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn",
    "wouldn't",
];

/// Conversational filler and clinical boilerplate excluded on top of the standard list.
const DOMAIN_STOP_WORDS: &[&str] = &[
    "feel",
    "feeling",
    "felt",
    "work",
    "meeting",
    "doctor",
    "definition",
    "causes",
    "symptoms",
    "diagnosis",
];

/// Treebank-style tokens: hyphenated or dotted compounds stay whole, split
/// clitics (`n't`, `'s`, `'re`, ...) are single tokens, then plain word runs
/// and punctuation runs.
static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\w+(?:[-.]\w+)+|n't|'(?:s|m|re|ve|ll|d)\b|\w+|[^\w\s]+")
        .expect("token pattern is valid")
});

/// `cannot` tokenizes as `can` + `not`.
static CANNOT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bcannot\b").expect("cannot pattern is valid"));

/// Negation clitic: `can't` splits as `ca` + `n't`, `don't` as `do` + `n't`.
static NEGATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\w)n't\b").expect("negation pattern is valid"));

/// Other English clitics: `it's` splits as `it` + `'s`.
static CLITIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\w)'(s|m|re|ve|ll|d)\b").expect("clitic pattern is valid")
});

/// Lowercases, tokenizes, and filters text against a stopword set.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    stop_words: HashSet<String>,
}

impl TextNormalizer {
    /// Normalizer with the standard English list plus the domain exclusions.
    pub fn new() -> Self {
        Self::with_stop_words(
            ENGLISH_STOP_WORDS
                .iter()
                .chain(DOMAIN_STOP_WORDS)
                .map(|w| w.to_string()),
        )
    }

    /// Normalizer with a custom stopword set. Entries are lowercased.
    pub fn with_stop_words<I>(words: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            stop_words: words.into_iter().map(|w| w.to_lowercase()).collect(),
        }
    }

    /// Whether `word` is filtered out.
    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }

    /// Lowercase, tokenize, keep purely alphabetic non-stopword tokens, rejoin with spaces.
    pub fn normalize(&self, text: &str) -> String {
        let lowered = text.to_lowercase();
        let split = CANNOT.replace_all(&lowered, "can not");
        let split = NEGATION.replace_all(&split, "${1} n't");
        let split = CLITIC.replace_all(&split, "${1} '${2}");

        TOKEN_PATTERN
            .find_iter(&split)
            .map(|m| m.as_str())
            .filter(|token| token.chars().all(char::is_alphabetic))
            .filter(|token| !self.stop_words.contains(*token))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
