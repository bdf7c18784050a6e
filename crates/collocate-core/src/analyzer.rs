//! Token normalization for context windows.
//!
//! Every context token passes through the same chain before it reaches the
//! positional index: part-of-speech handling, lowercasing, token class
//! filtering, stop-word removal and lemma folding.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::lemma::LemmaDictionary;
use crate::text::{POS_SEPARATOR, split_pos};

/// Punctuation at either edge of a token.
static EDGE_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\p{P}+|\p{P}+$").expect("valid regex"));

/// Remove punctuation from both edges of `word`.
pub(crate) fn trim_edge_punctuation(word: &str) -> std::borrow::Cow<'_, str> {
    EDGE_PUNCTUATION.replace_all(word, "")
}

/// Which Unicode character classes may start a token.
///
/// A token whose first character belongs to a hidden class is dropped. When
/// punctuation is hidden, punctuation at the edges of a token is trimmed
/// first, so `end.` survives as `end` while `...` disappears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(default)]
pub struct TokenClasses {
    /// Letters (`\p{L}`).
    pub letters: bool,
    /// Numbers (`\p{N}`).
    pub numbers: bool,
    /// Symbols (`\p{S}`).
    pub symbols: bool,
    /// Combining marks (`\p{M}`).
    pub marks: bool,
    /// Punctuation (`\p{P}`).
    pub punctuation: bool,
}

impl Default for TokenClasses {
    fn default() -> Self {
        Self {
            letters: true,
            numbers: true,
            symbols: false,
            marks: false,
            punctuation: false,
        }
    }
}

impl TokenClasses {
    /// Show every class.
    pub const fn all() -> Self {
        Self {
            letters: true,
            numbers: true,
            symbols: true,
            marks: true,
            punctuation: true,
        }
    }

    fn hidden_start_pattern(self) -> Option<Regex> {
        let mut class = String::new();
        for (shown, name) in [
            (self.letters, r"\p{L}"),
            (self.numbers, r"\p{N}"),
            (self.symbols, r"\p{S}"),
            (self.marks, r"\p{M}"),
            (self.punctuation, r"\p{P}"),
        ] {
            if !shown {
                class.push_str(name);
            }
        }
        if class.is_empty() {
            return None;
        }
        Regex::new(&format!("^[{class}]")).ok()
    }
}

/// Normalizes raw corpus tokens into index terms.
pub struct TokenAnalyzer<'a> {
    show_part_of_speech: bool,
    lowercase: bool,
    classes: TokenClasses,
    hidden_start: Option<Regex>,
    stop_words: HashSet<String>,
    lemmas: Option<&'a dyn LemmaDictionary>,
}

impl std::fmt::Debug for TokenAnalyzer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAnalyzer")
            .field("show_part_of_speech", &self.show_part_of_speech)
            .field("lowercase", &self.lowercase)
            .field("classes", &self.classes)
            .field("stop_words", &self.stop_words.len())
            .field("lemmas", &self.lemmas.is_some())
            .finish()
    }
}

impl Default for TokenAnalyzer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> TokenAnalyzer<'a> {
    /// Analyzer with default token classes and no other normalization.
    pub fn new() -> Self {
        let classes = TokenClasses::default();
        Self {
            show_part_of_speech: false,
            lowercase: false,
            classes,
            hidden_start: classes.hidden_start_pattern(),
            stop_words: HashSet::new(),
            lemmas: None,
        }
    }

    /// Keep part-of-speech payloads on terms (`word_POS_tag`).
    pub const fn with_part_of_speech(mut self, show: bool) -> Self {
        self.show_part_of_speech = show;
        self
    }

    /// Lowercase the word part of every term.
    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self.stop_words = self.normalize_stop_words(self.stop_words.iter().cloned());
        self
    }

    /// Choose which character classes may start a term.
    pub fn with_token_classes(mut self, classes: TokenClasses) -> Self {
        self.classes = classes;
        self.hidden_start = classes.hidden_start_pattern();
        self
    }

    /// Drop these words from context windows.
    pub fn with_stop_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop_words = self.normalize_stop_words(words.into_iter().map(Into::into));
        self
    }

    /// Fold alternate forms onto their lemma.
    pub fn with_lemmas(mut self, lemmas: Option<&'a dyn LemmaDictionary>) -> Self {
        self.lemmas = lemmas;
        self
    }

    fn normalize_stop_words(&self, words: impl Iterator<Item = String>) -> HashSet<String> {
        words
            .map(|w| if self.lowercase { w.to_lowercase() } else { w })
            .collect()
    }

    /// Whether terms keep their part-of-speech payload.
    pub const fn shows_part_of_speech(&self) -> bool {
        self.show_part_of_speech
    }

    /// Whether terms are lowercased.
    pub const fn lowercases(&self) -> bool {
        self.lowercase
    }

    /// The active lemma dictionary, if lemma folding is on.
    pub fn lemmas(&self) -> Option<&'a dyn LemmaDictionary> {
        self.lemmas
    }

    /// Normalize a context token, or `None` when the token is filtered out.
    pub fn analyze(&self, token: &str) -> Option<String> {
        let (word, pos) = split_pos(token);
        let mut word = self.case(word);

        if !self.classes.punctuation {
            word = trim_edge_punctuation(&word).into_owned();
        }
        if word.is_empty() {
            return None;
        }
        if self.hidden_start.as_ref().is_some_and(|re| re.is_match(&word)) {
            return None;
        }
        if self.stop_words.contains(&word) {
            return None;
        }

        Some(self.finish(word, pos))
    }

    /// Normalize a node token. Node tokens are never filtered out.
    ///
    /// Edge punctuation is trimmed like on context tokens unless nothing would
    /// remain of the node.
    pub fn analyze_node(&self, token: &str) -> String {
        let (word, pos) = split_pos(token);
        let mut word = self.case(word);
        if !self.classes.punctuation {
            let trimmed = trim_edge_punctuation(&word);
            if !trimmed.is_empty() {
                word = trimmed.into_owned();
            }
        }
        self.finish(word, pos)
    }

    fn case(&self, word: &str) -> String {
        if self.lowercase {
            word.to_lowercase()
        } else {
            word.to_string()
        }
    }

    fn finish(&self, word: String, pos: Option<&str>) -> String {
        let word = self
            .lemmas
            .and_then(|l| l.canonical(&word))
            .map_or(word, str::to_string);
        match pos {
            Some(pos) if self.show_part_of_speech => format!("{word}{POS_SEPARATOR}{pos}"),
            _ => word,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lemma::LemmaList;

    #[test]
    fn strips_pos_by_default() {
        let analyzer = TokenAnalyzer::new();
        assert_eq!(analyzer.analyze("dog_POS_NN").as_deref(), Some("dog"));
    }

    #[test]
    fn keeps_pos_when_shown() {
        let analyzer = TokenAnalyzer::new().with_part_of_speech(true);
        assert_eq!(analyzer.analyze("dog_POS_NN").as_deref(), Some("dog_POS_NN"));
        assert_eq!(analyzer.analyze("dog").as_deref(), Some("dog"));
    }

    #[test]
    fn lowercases_word_but_not_payload() {
        let analyzer = TokenAnalyzer::new()
            .with_part_of_speech(true)
            .with_lowercase(true);
        assert_eq!(analyzer.analyze("Dog_POS_NN").as_deref(), Some("dog_POS_NN"));
    }

    #[test]
    fn trims_edge_punctuation() {
        let analyzer = TokenAnalyzer::new();
        assert_eq!(analyzer.analyze("end.").as_deref(), Some("end"));
        assert_eq!(analyzer.analyze("(word)").as_deref(), Some("word"));
        assert_eq!(analyzer.analyze("...").as_deref(), None);
        assert_eq!(analyzer.analyze(",_POS_PU").as_deref(), None);
    }

    #[test]
    fn keeps_punctuation_when_shown() {
        let analyzer = TokenAnalyzer::new().with_token_classes(TokenClasses::all());
        assert_eq!(analyzer.analyze("end.").as_deref(), Some("end."));
        assert_eq!(analyzer.analyze(",").as_deref(), Some(","));
    }

    #[test]
    fn hidden_class_at_start_drops_token() {
        let classes = TokenClasses {
            numbers: false,
            ..TokenClasses::default()
        };
        let analyzer = TokenAnalyzer::new().with_token_classes(classes);
        assert_eq!(analyzer.analyze("42"), None);
        assert_eq!(analyzer.analyze("$5"), None);
        assert_eq!(analyzer.analyze("a42").as_deref(), Some("a42"));
    }

    #[test]
    fn stop_words_follow_lowercasing() {
        let analyzer = TokenAnalyzer::new()
            .with_stop_words(["The"])
            .with_lowercase(true);
        assert_eq!(analyzer.analyze("THE"), None);
        assert_eq!(analyzer.analyze("cat").as_deref(), Some("cat"));
    }

    #[test]
    fn lemmas_fold_forms() {
        let lemmas: LemmaList = [("go", vec!["went"])].into_iter().collect();
        let analyzer = TokenAnalyzer::new().with_lemmas(Some(&lemmas));
        assert_eq!(analyzer.analyze("went").as_deref(), Some("go"));
        assert_eq!(analyzer.analyze_node("went_POS_VBD"), "go");
    }

    #[test]
    fn node_tokens_are_never_filtered() {
        let analyzer = TokenAnalyzer::new().with_stop_words(["the"]);
        assert_eq!(analyzer.analyze("the"), None);
        assert_eq!(analyzer.analyze_node("the"), "the");
        assert_eq!(analyzer.analyze_node("leave,"), "leave");
        assert_eq!(analyzer.analyze_node("?"), "?");
    }
}
