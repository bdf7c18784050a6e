//! Corpus collaborator.
//!
//! Collocation analysis reads from a corpus through the [`Corpus`] trait:
//! evaluate a node query, fetch document content, and look up term and
//! document frequencies. [`MemoryCorpus`] is an in-memory implementation for
//! small corpora, tests and the command line.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::ops::Range;

use crate::analyzer::trim_edge_punctuation;
use crate::error::{CorpusError, CorpusResult};
use crate::query::{NodeQuery, Phrase};
use crate::text::{POS_SEPARATOR, split_pos, token_ranges};

/// Identifier of a document within a corpus.
pub type DocId = usize;

/// The node occurrences found in one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    /// Document the matches belong to.
    pub doc: DocId,
    /// Byte ranges of each match, in document order.
    ///
    /// A range covers the word part of the matched tokens; a trailing
    /// part-of-speech payload is not included.
    pub matches: Vec<Range<usize>>,
}

/// Capabilities the collocation engine needs from a corpus.
pub trait Corpus {
    /// Documents matching `query`, with the offsets of every match.
    fn search(&self, query: &NodeQuery) -> CorpusResult<Vec<Hit>>;

    /// Full tokenized content of `doc`.
    fn content(&self, doc: DocId) -> CorpusResult<Cow<'_, str>>;

    /// Number of occurrences of `term` in the whole corpus.
    fn total_term_freq(&self, term: &str) -> CorpusResult<u64>;

    /// Number of documents containing `term`.
    fn doc_freq(&self, term: &str) -> CorpusResult<u64>;

    /// Number of tokens in the whole corpus.
    fn total_token_count(&self) -> CorpusResult<u64>;

    /// Whether terms are counted and looked up in lowercase.
    fn is_lowercased(&self) -> bool {
        false
    }
}

impl<C: Corpus + ?Sized> Corpus for &C {
    fn search(&self, query: &NodeQuery) -> CorpusResult<Vec<Hit>> {
        (**self).search(query)
    }

    fn content(&self, doc: DocId) -> CorpusResult<Cow<'_, str>> {
        (**self).content(doc)
    }

    fn total_term_freq(&self, term: &str) -> CorpusResult<u64> {
        (**self).total_term_freq(term)
    }

    fn doc_freq(&self, term: &str) -> CorpusResult<u64> {
        (**self).doc_freq(term)
    }

    fn total_token_count(&self) -> CorpusResult<u64> {
        (**self).total_token_count()
    }

    fn is_lowercased(&self) -> bool {
        (**self).is_lowercased()
    }
}

/// A document held by a [`MemoryCorpus`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Display name, usually the source file name.
    pub name: String,
    /// Whitespace-tokenized content with optional `_POS_` payloads.
    pub content: String,
}

/// In-memory corpus of whitespace-tokenized documents.
///
/// Every token is counted under its word (`dog`) and, when it carries a
/// part-of-speech payload, under its tagged spelling (`dog_POS_NN`). A word
/// with punctuation at its edges is also counted under its trimmed form, so
/// `end.` contributes to both `end.` and `end`.
#[derive(Debug, Clone, Default)]
pub struct MemoryCorpus {
    documents: Vec<Document>,
    term_freq: HashMap<String, u64>,
    doc_freq: HashMap<String, u64>,
    total_tokens: u64,
    lowercase: bool,
    tagger_separator: Option<String>,
}

impl MemoryCorpus {
    /// Create an empty corpus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count terms in lowercase. Set before adding documents.
    #[must_use]
    pub const fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    /// Convert a tagger's word/tag separator (for example `#`) to `_POS_`
    /// when documents are added.
    #[must_use]
    pub fn with_tagger_separator(mut self, separator: Option<String>) -> Self {
        self.tagger_separator = separator.filter(|s| !s.is_empty() && s != POS_SEPARATOR);
        self
    }

    /// Add a document and return its identifier.
    pub fn add_document(&mut self, name: impl Into<String>, content: impl Into<String>) -> DocId {
        let content = self.convert_separator(content.into());
        let mut seen = HashSet::new();

        for range in token_ranges(&content) {
            self.total_tokens += 1;
            for term in self.terms_of(&content[range]) {
                *self.term_freq.entry(term.clone()).or_default() += 1;
                seen.insert(term);
            }
        }
        for term in seen {
            *self.doc_freq.entry(term).or_default() += 1;
        }

        let id = self.documents.len();
        let name = name.into();
        tracing::debug!(doc = id, name = %name, "added document");
        self.documents.push(Document { name, content });
        id
    }

    /// Builder form of [`MemoryCorpus::add_document`].
    #[must_use]
    pub fn with_document(mut self, name: impl Into<String>, content: impl Into<String>) -> Self {
        self.add_document(name, content);
        self
    }

    /// The stored documents, indexed by [`DocId`].
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the corpus holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Number of distinct terms counted.
    pub fn vocabulary_size(&self) -> usize {
        self.term_freq.len()
    }

    fn convert_separator(&self, content: String) -> String {
        let Some(sep) = self.tagger_separator.as_deref() else {
            return content;
        };
        let mut converted = String::with_capacity(content.len());
        let mut last = 0;
        for range in token_ranges(&content) {
            converted.push_str(&content[last..range.start]);
            let token = &content[range.clone()];
            match token.rsplit_once(sep) {
                Some((word, tag)) if !word.is_empty() => {
                    converted.push_str(word);
                    converted.push_str(POS_SEPARATOR);
                    converted.push_str(tag);
                }
                _ => converted.push_str(token),
            }
            last = range.end;
        }
        converted.push_str(&content[last..]);
        converted
    }

    /// Every spelling a word is counted and matched under.
    fn word_forms(&self, word: &str) -> Vec<String> {
        let word = if self.lowercase {
            word.to_lowercase()
        } else {
            word.to_string()
        };
        let trimmed = trim_edge_punctuation(&word).into_owned();
        if trimmed.is_empty() || trimmed == word {
            vec![word]
        } else {
            vec![word, trimmed]
        }
    }

    fn terms_of(&self, token: &str) -> Vec<String> {
        let (word, pos) = split_pos(token);
        let forms = self.word_forms(word);
        match pos {
            Some(pos) => forms
                .iter()
                .map(|f| format!("{f}{POS_SEPARATOR}{pos}"))
                .chain(forms.iter().cloned())
                .collect(),
            None => forms,
        }
    }

    fn phrase_matches(&self, phrase: &Phrase, content: &str, tokens: &[Range<usize>]) -> bool {
        phrase.terms().iter().zip(tokens).all(|(term, range)| {
            let token = &content[range.clone()];
            let (word, pos) = split_pos(token);
            let forms = self.word_forms(word);
            if term.is_tagged() {
                pos.is_some_and(|pos| {
                    forms
                        .iter()
                        .any(|f| term.matches(&format!("{f}{POS_SEPARATOR}{pos}")))
                })
            } else {
                forms.iter().any(|f| term.matches(f))
            }
        })
    }
}

impl Corpus for MemoryCorpus {
    #[tracing::instrument(skip_all, fields(query = %query))]
    fn search(&self, query: &NodeQuery) -> CorpusResult<Vec<Hit>> {
        let mut hits = Vec::new();
        for (doc, document) in self.documents.iter().enumerate() {
            let content = document.content.as_str();
            let tokens = token_ranges(content);
            let mut matches = Vec::new();

            for phrase in query.alternatives() {
                let len = phrase.len();
                if len == 0 || len > tokens.len() {
                    continue;
                }
                for start in 0..=tokens.len() - len {
                    let window = &tokens[start..start + len];
                    if !self.phrase_matches(phrase, content, window) {
                        continue;
                    }
                    let last = &window[len - 1];
                    let (last_word, _) = split_pos(&content[last.clone()]);
                    matches.push(window[0].start..last.start + last_word.len());
                }
            }

            if !matches.is_empty() {
                matches.sort_by_key(|r| (r.start, r.end));
                matches.dedup();
                hits.push(Hit { doc, matches });
            }
        }
        tracing::debug!(documents = hits.len(), "search complete");
        Ok(hits)
    }

    fn content(&self, doc: DocId) -> CorpusResult<Cow<'_, str>> {
        self.documents
            .get(doc)
            .map(|d| Cow::Borrowed(d.content.as_str()))
            .ok_or(CorpusError::UnknownDocument(doc))
    }

    fn total_term_freq(&self, term: &str) -> CorpusResult<u64> {
        Ok(self.term_freq.get(term).copied().unwrap_or(0))
    }

    fn doc_freq(&self, term: &str) -> CorpusResult<u64> {
        Ok(self.doc_freq.get(term).copied().unwrap_or(0))
    }

    fn total_token_count(&self) -> CorpusResult<u64> {
        Ok(self.total_tokens)
    }

    fn is_lowercased(&self) -> bool {
        self.lowercase
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> MemoryCorpus {
        MemoryCorpus::new()
            .with_document("a", "the dog_POS_NN barks at the cat_POS_NN")
            .with_document("b", "a dog_POS_NN sleeps. The end.")
    }

    #[test]
    fn counts_words_and_tagged_spellings() {
        let c = corpus();
        assert_eq!(c.total_term_freq("dog").unwrap(), 2);
        assert_eq!(c.total_term_freq("dog_POS_NN").unwrap(), 2);
        assert_eq!(c.doc_freq("dog").unwrap(), 2);
        assert_eq!(c.total_term_freq("the").unwrap(), 2);
        assert_eq!(c.doc_freq("the").unwrap(), 1);
        assert_eq!(c.total_term_freq("missing").unwrap(), 0);
    }

    #[test]
    fn counts_trimmed_forms() {
        let c = corpus();
        assert_eq!(c.total_term_freq("end.").unwrap(), 1);
        assert_eq!(c.total_term_freq("end").unwrap(), 1);
        assert_eq!(c.total_term_freq("sleeps").unwrap(), 1);
    }

    #[test]
    fn total_tokens_counts_each_token_once() {
        assert_eq!(corpus().total_token_count().unwrap(), 11);
    }

    #[test]
    fn lowercase_counts() {
        let c = MemoryCorpus::new()
            .with_lowercase(true)
            .with_document("a", "The the THE");
        assert_eq!(c.total_term_freq("the").unwrap(), 3);
        assert_eq!(c.total_term_freq("The").unwrap(), 0);
        assert!(c.is_lowercased());
        assert!(!corpus().is_lowercased());
    }

    #[test]
    fn converts_tagger_separator() {
        let c = MemoryCorpus::new()
            .with_tagger_separator(Some("#".to_string()))
            .with_document("a", "dog#NN  barks#VBZ\n#");
        assert_eq!(c.documents()[0].content, "dog_POS_NN  barks_POS_VBZ\n#");
        assert_eq!(c.total_term_freq("barks_POS_VBZ").unwrap(), 1);
    }

    #[test]
    fn search_reports_word_ranges() {
        let c = corpus();
        let hits = c.search(&NodeQuery::parse("dog").unwrap()).unwrap();
        assert_eq!(hits.len(), 2);
        let content = c.content(hits[0].doc).unwrap();
        let m = hits[0].matches[0].clone();
        assert_eq!(&content[m], "dog");
    }

    #[test]
    fn search_phrase_spans_tokens() {
        let c = corpus();
        let hits = c
            .search(&NodeQuery::parse(r#""dog barks""#).unwrap())
            .unwrap();
        assert_eq!(hits.len(), 1);
        let content = c.content(0).unwrap();
        assert_eq!(&content[hits[0].matches[0].clone()], "dog_POS_NN barks");
    }

    #[test]
    fn search_tagged_term() {
        let c = corpus();
        let hits = c.search(&NodeQuery::parse("cat_POS_NN").unwrap()).unwrap();
        assert_eq!(hits.len(), 1);
        assert!(
            c.search(&NodeQuery::parse("cat_POS_VB").unwrap())
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn search_matches_trimmed_form() {
        let c = corpus();
        let hits = c.search(&NodeQuery::parse("end").unwrap()).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc, 1);
    }

    #[test]
    fn search_without_match_is_empty() {
        let c = corpus();
        assert!(c.search(&NodeQuery::parse("zebra").unwrap()).unwrap().is_empty());
    }

    #[test]
    fn unknown_document() {
        assert!(matches!(
            corpus().content(7),
            Err(CorpusError::UnknownDocument(7))
        ));
    }
}
