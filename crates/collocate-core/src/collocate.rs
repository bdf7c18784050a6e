//! Collocate enumeration.
//!
//! [`CollocateEnumerator`] runs a node query against a [`Corpus`], extracts
//! context windows around every match, indexes them in an ephemeral
//! [`PositionalIndex`] and then lazily yields one [`CollocateRecord`] per
//! candidate term that passes the configured [`Thresholds`].
//!
//! ```
//! use collocate_core::{CollocateEnumerator, CollocationOptions, MemoryCorpus};
//!
//! let corpus = MemoryCorpus::new()
//!     .with_document("a", "strong tea and strong coffee")
//!     .with_document("b", "they drank strong tea");
//! let records = CollocateEnumerator::new(&corpus, "tea", CollocationOptions::default())
//!     .unwrap()
//!     .collect::<Result<Vec<_>, _>>()
//!     .unwrap();
//! let strong = records.iter().find(|r| r.word == "strong").unwrap();
//! assert_eq!(strong.left_freq, 2);
//! ```

use std::collections::HashSet;
use std::iter::FusedIterator;

use camino::Utf8Path;
use serde::Serialize;
use serde::ser::SerializeMap;

use crate::analyzer::TokenAnalyzer;
use crate::corpus::Corpus;
use crate::error::{CollocationError, CollocationResult, IndexResult};
use crate::index::{
    DEFAULT_BATCH_SIZE, IndexStorage, PositionalIndex, PositionalIndexWriter, Zone,
};
use crate::lemma::LemmaDictionary;
use crate::measure::{Measure, Thresholds};
use crate::query::NodeQuery;
use crate::stats::{AssociationMeasures, ContingencySignature};
use crate::text::{NODE_SEPARATOR, POS_SEPARATOR, split_pos, untag_node};
use crate::window::{ContextWindowExtractor, Selection, WindowMode};

/// Frequencies of a collocate at each offset from the node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionVector {
    left: Vec<u64>,
    node: u64,
    right: Vec<u64>,
}

impl PositionVector {
    /// Build from left (`L1` first), node and right (`R1` first) counts.
    pub const fn new(left: Vec<u64>, node: u64, right: Vec<u64>) -> Self {
        Self { left, node, right }
    }

    /// Counts at `L1..Lk`.
    pub fn left(&self) -> &[u64] {
        &self.left
    }

    /// Counts at `R1..Rk`.
    pub fn right(&self) -> &[u64] {
        &self.right
    }

    /// Number of left positions.
    pub fn left_span(&self) -> usize {
        self.left.len()
    }

    /// Number of right positions.
    pub fn right_span(&self) -> usize {
        self.right.len()
    }

    /// Count at a signed offset: negative is left, zero is the node.
    pub fn at(&self, offset: isize) -> Option<u64> {
        let distance = offset.unsigned_abs();
        match offset {
            0 => Some(self.node),
            o if o < 0 => self.left.get(distance - 1).copied(),
            _ => self.right.get(distance - 1).copied(),
        }
    }

    /// Count at a position label such as `"L3"` or `"R1"`.
    pub fn get(&self, label: &str) -> Option<u64> {
        let (side, n) = label.split_at_checked(1)?;
        let n: usize = n.parse().ok().filter(|n| *n > 0)?;
        match side {
            "L" => self.left.get(n - 1).copied(),
            "R" => self.right.get(n - 1).copied(),
            _ => None,
        }
    }

    /// Labelled counts from the farthest left position to the farthest right.
    pub fn labelled(&self) -> impl Iterator<Item = (String, u64)> + '_ {
        let left = self
            .left
            .iter()
            .enumerate()
            .rev()
            .map(|(i, v)| (format!("L{}", i + 1), *v));
        let right = self
            .right
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("R{}", i + 1), *v));
        left.chain(right)
    }
}

impl Serialize for PositionVector {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.left.len() + self.right.len()))?;
        for (label, value) in self.labelled() {
            map.serialize_entry(&label, &value)?;
        }
        map.end()
    }
}

/// One collocate with its statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollocateRecord {
    /// The collocate, multi-word nodes separated by spaces.
    pub word: String,
    /// Counts the measures were derived from.
    pub signature: ContingencySignature,
    /// Association measures.
    pub measures: AssociationMeasures,
    /// Occurrences in left contexts.
    pub left_freq: u64,
    /// Occurrences in right contexts.
    pub right_freq: u64,
    /// Occurrences as the node.
    pub node_freq: u64,
    /// Occurrences per offset from the node.
    pub positions: PositionVector,
}

impl CollocateRecord {
    /// Read a named measure.
    pub fn measure(&self, measure: Measure) -> f64 {
        measure.value(self)
    }
}

/// How a collocation query is run.
#[derive(Debug)]
pub struct CollocationOptions<'l> {
    /// Windowing policy.
    pub mode: WindowMode,
    /// Normalization applied to every term.
    pub analyzer: TokenAnalyzer<'l>,
    /// Minimum measure values a record must reach.
    pub thresholds: Thresholds,
    /// Where the positional index keeps committed batches.
    pub storage: IndexStorage,
    /// Windows per committed batch.
    pub batch_size: usize,
}

impl Default for CollocationOptions<'_> {
    fn default() -> Self {
        Self {
            mode: WindowMode::default(),
            analyzer: TokenAnalyzer::new(),
            thresholds: Thresholds::new(),
            storage: IndexStorage::Memory,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl<'l> CollocationOptions<'l> {
    /// Options for `mode` with defaults otherwise.
    pub fn new(mode: WindowMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Use `analyzer` for every term.
    #[must_use]
    pub fn with_analyzer(mut self, analyzer: TokenAnalyzer<'l>) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Filter records with `thresholds`.
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    /// Choose index storage.
    #[must_use]
    pub const fn with_storage(mut self, storage: IndexStorage) -> Self {
        self.storage = storage;
        self
    }

    /// Windows per committed index batch.
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }
}

#[derive(Debug, Clone, Copy)]
enum Strategy {
    Surface {
        windows: u64,
        sample_tokens: u64,
        corpus_tokens: u64,
    },
    Textual {
        node_windows: u64,
        windows: u64,
    },
}

/// Lazy, single-pass sequence of collocate records.
///
/// The positional index is released when the sequence is exhausted, when an
/// error is yielded, on [`CollocateEnumerator::close`], or on drop.
pub struct CollocateEnumerator<'l, C: Corpus> {
    corpus: C,
    index: Option<PositionalIndex>,
    strategy: Strategy,
    terms: std::vec::IntoIter<String>,
    skip: HashSet<String>,
    thresholds: Thresholds,
    lemmas: Option<&'l dyn LemmaDictionary>,
    yielded: u64,
    filtered: u64,
    done: bool,
}

impl<C: Corpus> std::fmt::Debug for CollocateEnumerator<'_, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollocateEnumerator")
            .field("strategy", &self.strategy)
            .field("remaining", &self.terms.len())
            .field("yielded", &self.yielded)
            .field("filtered", &self.filtered)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

impl<'l, C: Corpus> CollocateEnumerator<'l, C> {
    /// Parse `query`, extract and index every window, and prepare the
    /// enumeration.
    ///
    /// Query errors are returned before the corpus is touched. The query
    /// ignores case when the analyzer lowercases.
    ///
    /// The analyzer must lowercase exactly when the corpus does
    /// ([`Corpus::is_lowercased`]), since collocate frequencies are looked up
    /// in the corpus under their analyzed spelling. A mismatch fails with
    /// [`CollocationError::CaseMismatch`].
    #[tracing::instrument(skip(corpus, options), fields(mode = ?options.mode))]
    pub fn new(corpus: C, query: &str, options: CollocationOptions<'l>) -> CollocationResult<Self> {
        let query = if options.analyzer.lowercases() {
            NodeQuery::parse_ignore_case(query)?
        } else {
            NodeQuery::parse(query)?
        };
        Self::with_query(corpus, &query, options)
    }

    /// Like [`CollocateEnumerator::new`] with an already parsed query.
    pub fn with_query(
        corpus: C,
        query: &NodeQuery,
        options: CollocationOptions<'l>,
    ) -> CollocationResult<Self> {
        let CollocationOptions {
            mode,
            analyzer,
            thresholds,
            storage,
            batch_size,
        } = options;
        if analyzer.lowercases() != corpus.is_lowercased() {
            return Err(CollocationError::CaseMismatch {
                analyzer: analyzer.lowercases(),
                corpus: corpus.is_lowercased(),
            });
        }
        let lemmas = analyzer.lemmas();

        let (left_span, right_span) = match mode {
            WindowMode::Surface {
                left_span,
                right_span,
                ..
            } => (left_span, right_span),
            WindowMode::TextualSentence | WindowMode::TextualParagraph => (0, 0),
        };
        let selection = if mode.is_surface() {
            Selection::Highlighted
        } else {
            Selection::All
        };
        let extractor = ContextWindowExtractor::new(mode, analyzer).with_selection(selection);

        let hits = corpus.search(query)?;
        let mut writer = PositionalIndexWriter::create(storage, left_span, right_span)?
            .with_batch_size(batch_size);
        for hit in &hits {
            let content = corpus.content(hit.doc)?;
            for span in extractor.extract(&content, hit) {
                writer.add(&span)?;
            }
            writer.commit()?;
        }
        let index = writer.seal()?;

        let strategy = match Self::strategy(&corpus, &index, mode) {
            Ok(strategy) => strategy,
            Err(e) => {
                if let Err(close_err) = index.close() {
                    tracing::warn!(error = %close_err, "failed to release positional index");
                }
                return Err(e);
            }
        };

        let terms = index.vocabulary(Zone::Text);
        let skip: HashSet<String> = terms
            .iter()
            .filter_map(|t| untag_node(t))
            .map(str::to_string)
            .collect();
        tracing::info!(
            documents = hits.len(),
            windows = index.window_count(),
            candidates = terms.len(),
            "collocate enumeration ready"
        );

        Ok(Self {
            corpus,
            index: Some(index),
            strategy,
            terms: terms.into_iter(),
            skip,
            thresholds,
            lemmas,
            yielded: 0,
            filtered: 0,
            done: false,
        })
    }

    fn strategy(corpus: &C, index: &PositionalIndex, mode: WindowMode) -> CollocationResult<Strategy> {
        Ok(if mode.is_surface() {
            Strategy::Surface {
                windows: index.window_count(),
                sample_tokens: index.sum_term_freq(Zone::Text),
                corpus_tokens: corpus.total_token_count()?,
            }
        } else {
            Strategy::Textual {
                node_windows: index.node_window_count(),
                windows: index.window_count(),
            }
        })
    }

    /// Backing storage of the positional index, while it is open.
    pub fn storage_path(&self) -> Option<&Utf8Path> {
        self.index.as_ref().and_then(PositionalIndex::storage_path)
    }

    /// Whether the enumeration has finished and released its index.
    pub const fn is_finished(&self) -> bool {
        self.done
    }

    /// Stop early and release the positional index.
    pub fn close(mut self) -> CollocationResult<()> {
        self.done = true;
        self.release()?;
        Ok(())
    }

    fn release(&mut self) -> IndexResult<()> {
        match self.index.take() {
            Some(index) => index.close(),
            None => Ok(()),
        }
    }

    fn record_for(&self, term: &str) -> CollocationResult<Option<CollocateRecord>> {
        let Some(index) = self.index.as_ref() else {
            return Ok(None);
        };
        if self.skip.contains(term) {
            return Ok(None);
        }
        let plain = untag_node(term);
        let word = plain.unwrap_or(term);
        let display = word.replace(NODE_SEPARATOR, " ");

        let record = match self.strategy {
            Strategy::Surface {
                windows,
                sample_tokens,
                corpus_tokens,
            } => {
                let mut window_freq = index.term_freq(Zone::Text, term);
                let mut corpus_freq = self.corpus.total_term_freq(word)?;
                if plain.is_some() {
                    window_freq += index.term_freq(Zone::Text, word);
                }
                if let Some(lemmas) = self.lemmas {
                    let (lemma, pos) = split_pos(word);
                    for form in lemmas.alternates(lemma) {
                        corpus_freq += match pos {
                            Some(pos) => self
                                .corpus
                                .total_term_freq(&format!("{form}{POS_SEPARATOR}{pos}"))?,
                            None => self.corpus.total_term_freq(form)?,
                        };
                    }
                }
                let signature = ContingencySignature::surface(
                    display,
                    window_freq,
                    corpus_freq,
                    windows,
                    sample_tokens,
                    corpus_tokens,
                );
                let node_freq = index.term_freq(Zone::Node, word);
                let positions = PositionVector::new(
                    (1..=index.left_span())
                        .map(|i| index.term_freq(Zone::LeftAt(i), word))
                        .collect(),
                    node_freq,
                    (1..=index.right_span())
                        .map(|i| index.term_freq(Zone::RightAt(i), word))
                        .collect(),
                );
                CollocateRecord {
                    word: signature.word.clone(),
                    measures: AssociationMeasures::from_signature(&signature),
                    left_freq: index.term_freq(Zone::Left, word),
                    right_freq: index.term_freq(Zone::Right, word),
                    node_freq,
                    positions,
                    signature,
                }
            }
            Strategy::Textual {
                node_windows,
                windows,
            } => {
                let cooccurrence = index.doc_freq(Zone::Node, term);
                if cooccurrence == 0 {
                    return Ok(None);
                }
                let mut with_word = index.doc_freq(Zone::Text, term);
                if plain.is_some() {
                    with_word += index.doc_freq(Zone::Text, word);
                }
                let signature = ContingencySignature::textual(
                    display,
                    cooccurrence,
                    node_windows,
                    with_word,
                    windows,
                );
                let node_freq = if plain.is_some() { node_windows } else { 0 };
                CollocateRecord {
                    word: signature.word.clone(),
                    measures: AssociationMeasures::from_signature(&signature),
                    left_freq: 0,
                    right_freq: 0,
                    node_freq,
                    positions: PositionVector::new(Vec::new(), node_freq, Vec::new()),
                    signature,
                }
            }
        };
        Ok(Some(record))
    }
}

impl<C: Corpus> Iterator for CollocateEnumerator<'_, C> {
    type Item = CollocationResult<CollocateRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        while let Some(term) = self.terms.next() {
            match self.record_for(&term) {
                Ok(Some(record)) if self.thresholds.accepts(&record) => {
                    self.yielded += 1;
                    return Some(Ok(record));
                }
                Ok(Some(_)) => self.filtered += 1,
                Ok(None) => {}
                Err(e) => {
                    self.done = true;
                    if let Err(close_err) = self.release() {
                        tracing::warn!(error = %close_err, "failed to release positional index");
                    }
                    return Some(Err(e));
                }
            }
        }

        self.done = true;
        tracing::info!(
            yielded = self.yielded,
            filtered = self.filtered,
            "collocate enumeration complete"
        );
        self.release()
            .err()
            .map(|e| Err(CollocationError::from(e)))
    }
}

impl<C: Corpus> FusedIterator for CollocateEnumerator<'_, C> {}

impl<C: Corpus> Drop for CollocateEnumerator<'_, C> {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            tracing::warn!(error = %e, "failed to release positional index");
        }
    }
}
