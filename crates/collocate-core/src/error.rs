//! Error types for collocate-core.

use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur when working with configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to deserialize configuration.
    #[error("invalid configuration: {0}")]
    Deserialize(#[from] Box<figment::Error>),

    /// Configuration file not found after searching all locations.
    #[error("no configuration file found")]
    NotFound,

    /// A threshold names a measure that does not exist.
    #[error("unknown measure: {name}. Use: {available}")]
    UnknownMeasure {
        /// The measure name that was requested.
        name: String,
        /// Comma-separated list of available measure names.
        available: String,
    },
}

/// Result type alias using [`ConfigError`].
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while parsing a node query.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum QueryError {
    /// The query contained no terms.
    #[error("empty query")]
    Empty,

    /// A double quote was opened but never closed.
    #[error("unbalanced quote in query: {0}")]
    UnbalancedQuote(String),

    /// A quoted phrase contained no terms.
    #[error("empty phrase in query")]
    EmptyPhrase,

    /// A term consisted only of wildcards and would match every token.
    #[error("wildcard-only term is not allowed: {0}")]
    BareWildcard(String),

    /// The wildcard pattern could not be compiled.
    #[error("invalid wildcard pattern {pattern}: {reason}")]
    InvalidPattern {
        /// The offending term.
        pattern: String,
        /// Why the pattern was rejected.
        reason: String,
    },
}

/// Result type alias using [`QueryError`].
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors reported by a corpus collaborator.
#[derive(Error, Debug)]
pub enum CorpusError {
    /// The requested document does not exist.
    #[error("unknown document: {0}")]
    UnknownDocument(usize),

    /// A lookup against the backing corpus failed.
    #[error("corpus lookup failed: {0}")]
    Lookup(String),
}

/// Result type alias using [`CorpusError`].
pub type CorpusResult<T> = Result<T, CorpusError>;

/// Errors raised by the ephemeral positional index.
#[derive(Error, Debug)]
pub enum IndexError {
    /// The temporary storage could not be created.
    #[error("failed to create index storage: {0}")]
    Create(#[source] std::io::Error),

    /// A segment could not be written.
    #[error("failed to write index segment {path}")]
    Write {
        /// Segment file being written.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A segment could not be read back.
    #[error("failed to read index segment {path}")]
    Read {
        /// Segment file being read.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A segment line did not decode.
    #[error("corrupt index segment {path}: {source}")]
    Corrupt {
        /// Segment file being decoded.
        path: Utf8PathBuf,
        /// Decoder failure.
        #[source]
        source: serde_json::Error,
    },

    /// The temporary storage could not be removed.
    #[error("failed to release index storage: {0}")]
    Release(#[source] std::io::Error),

    /// The temporary directory path is not valid UTF-8.
    #[error("index storage path is not valid UTF-8: {0}")]
    NonUtf8Path(String),
}

/// Result type alias using [`IndexError`].
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors that abort a collocation enumeration.
#[derive(Error, Debug)]
pub enum CollocationError {
    /// The node query was malformed.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The corpus collaborator failed.
    #[error(transparent)]
    Corpus(#[from] CorpusError),

    /// The positional index failed.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// The analyzer and the corpus disagree on lowercasing.
    #[error("analyzer lowercasing ({analyzer}) does not match corpus lowercasing ({corpus})")]
    CaseMismatch {
        /// Whether the analyzer lowercases terms.
        analyzer: bool,
        /// Whether the corpus counts terms in lowercase.
        corpus: bool,
    },
}

/// Result type alias using [`CollocationError`].
pub type CollocationResult<T> = Result<T, CollocationError>;
