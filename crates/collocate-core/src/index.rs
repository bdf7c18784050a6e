//! Ephemeral positional co-occurrence index.
//!
//! The index is built once per collocation query. A [`PositionalIndexWriter`]
//! receives extracted spans and aggregates term statistics per [`Zone`];
//! [`PositionalIndexWriter::seal`] turns it into a read-only
//! [`PositionalIndex`]. Closing the sealed index releases any backing
//! storage. A writer or index dropped without closing still removes its
//! storage.
//!
//! With [`IndexStorage::Disk`] every committed batch is written as one
//! JSON-lines segment into a private temporary directory, so memory while
//! building is bounded by one batch. Sealing merges the segments back into
//! memory: a sealed disk index takes as much memory as a memory index and
//! lookups never touch the segment files.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::str::FromStr;

use camino::{Utf8Path, Utf8PathBuf};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use crate::error::{IndexError, IndexResult};
use crate::text::tag_node;
use crate::window::{ContextWindow, Span, TextualSpan};

/// Default number of windows per committed batch.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// A logical field of the positional index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Zone {
    /// Every left-context term.
    Left,
    /// Every right-context term.
    Right,
    /// The node term (surface) or every term of a node span (textual).
    Node,
    /// Every term of the window.
    Text,
    /// The term at an exact distance left of the node (1 is adjacent).
    LeftAt(usize),
    /// The term at an exact distance right of the node (1 is adjacent).
    RightAt(usize),
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => f.write_str("LEFT"),
            Self::Right => f.write_str("RIGHT"),
            Self::Node => f.write_str("NODE"),
            Self::Text => f.write_str("TEXT"),
            Self::LeftAt(n) => write!(f, "L{n}"),
            Self::RightAt(n) => write!(f, "R{n}"),
        }
    }
}

impl FromStr for Zone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let positional = |rest: &str| rest.parse::<usize>().ok().filter(|n| *n > 0);
        match s {
            "LEFT" => Ok(Self::Left),
            "RIGHT" => Ok(Self::Right),
            "NODE" => Ok(Self::Node),
            "TEXT" => Ok(Self::Text),
            _ => {
                if let Some(n) = s.strip_prefix('L').and_then(positional) {
                    Ok(Self::LeftAt(n))
                } else if let Some(n) = s.strip_prefix('R').and_then(positional) {
                    Ok(Self::RightAt(n))
                } else {
                    Err(format!("unknown zone: {s}"))
                }
            }
        }
    }
}

impl From<Zone> for String {
    fn from(zone: Zone) -> Self {
        zone.to_string()
    }
}

impl TryFrom<String> for Zone {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Frequencies of one term in one zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermStats {
    /// Occurrences across all windows.
    pub total: u64,
    /// Windows containing the term.
    pub docs: u64,
}

impl TermStats {
    fn merge(&mut self, other: Self) {
        self.total += other.total;
        self.docs += other.docs;
    }
}

/// Where committed batches are kept while the index is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum IndexStorage {
    /// Aggregate batches in memory.
    #[default]
    Memory,
    /// Spill batches to segment files in a temporary directory while the
    /// index is built. The sealed index is held in memory.
    Disk,
}

impl IndexStorage {
    /// The lowercase name used in configuration.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Disk => "disk",
        }
    }
}

impl fmt::Display for IndexStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type ZoneTable = HashMap<Zone, BTreeMap<String, TermStats>>;

fn merge_tables(into: &mut ZoneTable, from: ZoneTable) {
    for (zone, terms) in from {
        let target = into.entry(zone).or_default();
        for (term, stats) in terms {
            target.entry(term).or_default().merge(stats);
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct SegmentEntry {
    zone: Zone,
    term: String,
    total: u64,
    docs: u64,
}

/// Temporary directory holding JSON-lines segments.
#[derive(Debug)]
struct SegmentDir {
    dir: TempDir,
    path: Utf8PathBuf,
    segments: Vec<Utf8PathBuf>,
}

impl SegmentDir {
    fn create() -> IndexResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("collocate-index-")
            .tempdir()
            .map_err(IndexError::Create)?;
        let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .map_err(|p| IndexError::NonUtf8Path(p.display().to_string()))?;
        tracing::debug!(path = %path, "created index storage");
        Ok(Self {
            dir,
            path,
            segments: Vec::new(),
        })
    }

    fn write(&mut self, table: &ZoneTable) -> IndexResult<()> {
        let path = self
            .path
            .join(format!("segment-{:05}.jsonl", self.segments.len()));
        let write_err = |source| IndexError::Write {
            path: path.clone(),
            source,
        };

        let file = File::create(&path).map_err(write_err)?;
        let mut out = BufWriter::new(file);
        for (zone, terms) in table {
            for (term, stats) in terms {
                let entry = SegmentEntry {
                    zone: *zone,
                    term: term.clone(),
                    total: stats.total,
                    docs: stats.docs,
                };
                serde_json::to_writer(&mut out, &entry)
                    .map_err(|e| write_err(std::io::Error::other(e)))?;
                out.write_all(b"\n").map_err(write_err)?;
            }
        }
        out.flush().map_err(write_err)?;
        self.segments.push(path);
        Ok(())
    }

    fn read_all(&self) -> IndexResult<ZoneTable> {
        let mut table = ZoneTable::new();
        for path in &self.segments {
            let file = File::open(path).map_err(|source| IndexError::Read {
                path: path.clone(),
                source,
            })?;
            for line in BufReader::new(file).lines() {
                let line = line.map_err(|source| IndexError::Read {
                    path: path.clone(),
                    source,
                })?;
                if line.is_empty() {
                    continue;
                }
                let entry: SegmentEntry =
                    serde_json::from_str(&line).map_err(|source| IndexError::Corrupt {
                        path: path.clone(),
                        source,
                    })?;
                table
                    .entry(entry.zone)
                    .or_default()
                    .entry(entry.term)
                    .or_default()
                    .merge(TermStats {
                        total: entry.total,
                        docs: entry.docs,
                    });
            }
        }
        Ok(table)
    }

    fn close(self) -> IndexResult<()> {
        tracing::debug!(path = %self.path, "releasing index storage");
        self.dir.close().map_err(IndexError::Release)
    }
}

/// Builds a positional index span by span.
#[derive(Debug)]
pub struct PositionalIndexWriter {
    left_span: usize,
    right_span: usize,
    batch_size: usize,
    pending: ZoneTable,
    pending_windows: usize,
    committed: ZoneTable,
    segments: Option<SegmentDir>,
    windows: u64,
    node_windows: u64,
    batches: usize,
}

impl PositionalIndexWriter {
    /// Create a writer. Positional zones cover `left_span` and `right_span`
    /// offsets on each side of the node.
    pub fn create(storage: IndexStorage, left_span: usize, right_span: usize) -> IndexResult<Self> {
        let segments = match storage {
            IndexStorage::Memory => None,
            IndexStorage::Disk => Some(SegmentDir::create()?),
        };
        Ok(Self {
            left_span,
            right_span,
            batch_size: DEFAULT_BATCH_SIZE,
            pending: ZoneTable::new(),
            pending_windows: 0,
            committed: ZoneTable::new(),
            segments,
            windows: 0,
            node_windows: 0,
            batches: 0,
        })
    }

    /// Commit automatically after this many windows (at least one).
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Directory holding segments, for disk storage.
    pub fn storage_path(&self) -> Option<&Utf8Path> {
        self.segments.as_ref().map(|s| s.path.as_path())
    }

    /// Write one extracted span.
    pub fn add(&mut self, span: &Span) -> IndexResult<()> {
        match span {
            Span::Surface(window) => self.add_window(window),
            Span::Textual(text) => self.add_text(text),
        }
    }

    /// Write a surface window into every zone.
    pub fn add_window(&mut self, window: &ContextWindow) -> IndexResult<()> {
        let left = window.left.iter().map(String::as_str);
        let right = window.right.iter().map(String::as_str);
        let tagged = tag_node(&window.node);

        self.count(Zone::Left, left.clone());
        self.count(Zone::Right, right.clone());
        self.count(Zone::Node, [window.node.as_str()]);
        self.count(
            Zone::Text,
            left.clone().chain([tagged.as_str()]).chain(right.clone()),
        );
        for (offset, term) in left.rev().take(self.left_span).enumerate() {
            self.count(Zone::LeftAt(offset + 1), [term]);
        }
        for (offset, term) in right.take(self.right_span).enumerate() {
            self.count(Zone::RightAt(offset + 1), [term]);
        }

        self.node_windows += 1;
        self.finish_window()
    }

    /// Write a sentence or paragraph span.
    pub fn add_text(&mut self, span: &TextualSpan) -> IndexResult<()> {
        let terms = span.tokens.iter().map(String::as_str);
        if span.has_node() {
            self.count(Zone::Node, terms.clone());
            self.node_windows += 1;
        }
        self.count(Zone::Text, terms);
        self.finish_window()
    }

    fn count<'t>(&mut self, zone: Zone, terms: impl IntoIterator<Item = &'t str>) {
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for term in terms.into_iter().filter(|t| !t.is_empty()) {
            *counts.entry(term).or_default() += 1;
        }
        if counts.is_empty() {
            return;
        }
        let table = self.pending.entry(zone).or_default();
        for (term, total) in counts {
            table
                .entry(term.to_string())
                .or_default()
                .merge(TermStats { total, docs: 1 });
        }
    }

    fn finish_window(&mut self) -> IndexResult<()> {
        self.windows += 1;
        self.pending_windows += 1;
        if self.pending_windows >= self.batch_size {
            self.commit()?;
        }
        Ok(())
    }

    /// Flush pending windows to storage.
    pub fn commit(&mut self) -> IndexResult<()> {
        if self.pending_windows == 0 {
            return Ok(());
        }
        let batch = std::mem::take(&mut self.pending);
        match self.segments.as_mut() {
            Some(segments) => segments.write(&batch)?,
            None => merge_tables(&mut self.committed, batch),
        }
        self.batches += 1;
        tracing::debug!(
            batch = self.batches,
            windows = self.pending_windows,
            "committed index batch"
        );
        self.pending_windows = 0;
        Ok(())
    }

    /// Commit outstanding windows and open the index for reading.
    #[tracing::instrument(skip_all, fields(windows = self.windows))]
    pub fn seal(mut self) -> IndexResult<PositionalIndex> {
        self.commit()?;
        let mut zones = std::mem::take(&mut self.committed);
        if let Some(segments) = self.segments.as_ref() {
            merge_tables(&mut zones, segments.read_all()?);
        }
        let index = PositionalIndex {
            zones,
            windows: self.windows,
            node_windows: self.node_windows,
            left_span: self.left_span,
            right_span: self.right_span,
            segments: self.segments.take(),
        };
        tracing::info!(
            windows = index.windows,
            vocabulary = index.vocabulary_size(Zone::Text),
            "positional index sealed"
        );
        Ok(index)
    }
}

/// A sealed, read-only positional index.
#[derive(Debug)]
pub struct PositionalIndex {
    zones: ZoneTable,
    windows: u64,
    node_windows: u64,
    left_span: usize,
    right_span: usize,
    segments: Option<SegmentDir>,
}

impl PositionalIndex {
    /// Number of windows written.
    pub const fn window_count(&self) -> u64 {
        self.windows
    }

    /// Number of windows that contain the node.
    pub const fn node_window_count(&self) -> u64 {
        self.node_windows
    }

    /// Left positional zones (`L1..Lk`).
    pub const fn left_span(&self) -> usize {
        self.left_span
    }

    /// Right positional zones (`R1..Rk`).
    pub const fn right_span(&self) -> usize {
        self.right_span
    }

    fn stats(&self, zone: Zone, term: &str) -> TermStats {
        self.zones
            .get(&zone)
            .and_then(|terms| terms.get(term))
            .copied()
            .unwrap_or_default()
    }

    /// Occurrences of `term` in `zone`.
    pub fn term_freq(&self, zone: Zone, term: &str) -> u64 {
        self.stats(zone, term).total
    }

    /// Windows with `term` in `zone`.
    pub fn doc_freq(&self, zone: Zone, term: &str) -> u64 {
        self.stats(zone, term).docs
    }

    /// Total occurrences of every term in `zone`.
    pub fn sum_term_freq(&self, zone: Zone) -> u64 {
        self.zones
            .get(&zone)
            .map_or(0, |terms| terms.values().map(|s| s.total).sum())
    }

    /// Distinct terms in `zone`.
    pub fn vocabulary_size(&self, zone: Zone) -> usize {
        self.zones.get(&zone).map_or(0, BTreeMap::len)
    }

    /// Terms of `zone` in sorted order.
    pub fn vocabulary(&self, zone: Zone) -> Vec<String> {
        self.zones
            .get(&zone)
            .map(|terms| terms.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Directory holding segments, for disk storage.
    pub fn storage_path(&self) -> Option<&Utf8Path> {
        self.segments.as_ref().map(|s| s.path.as_path())
    }

    /// Release the index and its backing storage.
    #[tracing::instrument(skip_all)]
    pub fn close(self) -> IndexResult<()> {
        match self.segments {
            Some(segments) => segments.close(),
            None => Ok(()),
        }
    }
}
