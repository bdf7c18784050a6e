//! Core library for collocate.
//!
//! Collocation analysis over a tokenized corpus: find every occurrence of a
//! node query, gather the context around it, count which words co-occur with
//! the node and rank them by association measures.
//!
//! # Modules
//!
//! - [`query`] - Node query parsing
//! - [`corpus`] - The corpus collaborator and an in-memory corpus
//! - [`analyzer`] - Per-token normalization
//! - [`window`] - Context window extraction
//! - [`index`] - Ephemeral positional co-occurrence index
//! - [`stats`] - Contingency tables and association measures
//! - [`measure`] - Named measures and threshold filtering
//! - [`collocate`] - Collocate enumeration
//! - [`lemma`] - Lemma dictionaries
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//!
//! # Quick Start
//!
//! ```
//! use collocate_core::{CollocateEnumerator, CollocationOptions, Measure, MemoryCorpus, Thresholds};
//!
//! let corpus = MemoryCorpus::new()
//!     .with_document("a", "a cup of strong tea")
//!     .with_document("b", "strong tea is good");
//! let options = CollocationOptions::default()
//!     .with_thresholds(Thresholds::new().with(Measure::Cooccurrence, 2.0));
//!
//! for record in CollocateEnumerator::new(&corpus, "tea", options).unwrap() {
//!     let record = record.unwrap();
//!     println!("{} {:.3}", record.word, record.measures.log_likelihood);
//! }
//! ```
#![deny(unsafe_code)]

pub mod analyzer;
pub mod collocate;
pub mod config;
pub mod corpus;
pub mod error;
pub mod index;
pub mod lemma;
pub mod measure;
pub mod query;
pub mod stats;
pub mod text;
pub mod window;

pub use analyzer::{TokenAnalyzer, TokenClasses};
pub use collocate::{CollocateEnumerator, CollocateRecord, CollocationOptions, PositionVector};
pub use config::{
    CollocationSettings, Config, ConfigLoader, ConfigSources, DEFAULT_MAX_INPUT_BYTES, LogLevel,
    WindowKind,
};
pub use corpus::{Corpus, DocId, Hit, MemoryCorpus};
pub use error::{
    CollocationError, CollocationResult, ConfigError, ConfigResult, CorpusError, CorpusResult,
    IndexError, IndexResult, QueryError, QueryResult,
};
pub use index::{IndexStorage, PositionalIndex, PositionalIndexWriter, Zone};
pub use lemma::{LemmaDictionary, LemmaList};
pub use measure::{Measure, Thresholds};
pub use query::NodeQuery;
pub use stats::{AssociationMeasures, ContingencyCells, ContingencySignature};
pub use window::{ContextWindow, ContextWindowExtractor, Selection, Span, TextualSpan, WindowMode};
