//! Context window extraction.
//!
//! Turns the node matches of one document into spans of analyzed terms. The
//! windowing policy is a closed set of modes:
//!
//! - [`WindowMode::Surface`]: one window per match, holding up to
//!   `left_span` terms before and `right_span` terms after the node.
//! - [`WindowMode::TextualSentence`]: the document split into sentences,
//!   with node occurrences tagged inside each sentence.
//! - [`WindowMode::TextualParagraph`]: the same, split on newlines.
//!
//! Spans never split a token from its part-of-speech payload.

use std::fmt;
use std::ops::Range;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analyzer::TokenAnalyzer;
use crate::corpus::Hit;
use crate::text::{
    NODE_SEPARATOR, paragraph_ranges, sentence_ranges, skip_pos_payload, strip_node_tags,
    tag_node, token_ranges,
};

/// Default number of context tokens on each side of the node.
pub const DEFAULT_SPAN_SIZE: usize = 10;

/// How context around a node is delimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    /// Fixed token spans around each node occurrence.
    Surface {
        /// Context terms kept before the node.
        left_span: usize,
        /// Context terms kept after the node.
        right_span: usize,
        /// Stop the spans at the sentence containing the node.
        within_sentence: bool,
    },
    /// Whole sentences containing the node.
    TextualSentence,
    /// Whole paragraphs containing the node.
    TextualParagraph,
}

impl Default for WindowMode {
    fn default() -> Self {
        Self::Surface {
            left_span: DEFAULT_SPAN_SIZE,
            right_span: DEFAULT_SPAN_SIZE,
            within_sentence: false,
        }
    }
}

impl WindowMode {
    /// Whether this is the surface mode.
    pub const fn is_surface(&self) -> bool {
        matches!(self, Self::Surface { .. })
    }
}

/// Which textual spans to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Selection {
    /// Only spans containing the node.
    #[default]
    Highlighted,
    /// Every span of the document.
    All,
}

/// A surface window around one node occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextWindow {
    /// Context terms before the node, in text order.
    pub left: Vec<String>,
    /// The node, multi-word nodes joined by `_NODE_`.
    pub node: String,
    /// Context terms after the node, in text order.
    pub right: Vec<String>,
}

impl ContextWindow {
    /// The left context as one string.
    pub fn left_text(&self) -> String {
        self.left.join(" ")
    }

    /// The right context as one string.
    pub fn right_text(&self) -> String {
        self.right.join(" ")
    }
}

impl fmt::Display for ContextWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = self.left.clone();
        parts.push(tag_node(&self.node));
        parts.extend(self.right.iter().cloned());
        f.write_str(&parts.join(" "))
    }
}

/// A sentence or paragraph with node occurrences tagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextualSpan {
    /// Analyzed terms; each node occurrence is one `<node>...</node>` term.
    pub tokens: Vec<String>,
    /// Number of node occurrences in the span.
    pub node_count: usize,
}

impl TextualSpan {
    /// Whether the span contains the node.
    pub const fn has_node(&self) -> bool {
        self.node_count > 0
    }

    /// Terms joined with single spaces, node tags kept.
    pub fn text(&self) -> String {
        self.tokens.join(" ")
    }

    /// Terms joined with single spaces, node tags removed.
    pub fn plain(&self) -> String {
        strip_node_tags(&self.text()).replace(NODE_SEPARATOR, " ")
    }
}

/// One extracted span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Span {
    /// Produced by [`WindowMode::Surface`].
    Surface(ContextWindow),
    /// Produced by the textual modes.
    Textual(TextualSpan),
}

/// Extracts analyzed spans from document content.
#[derive(Debug)]
pub struct ContextWindowExtractor<'l> {
    mode: WindowMode,
    selection: Selection,
    analyzer: TokenAnalyzer<'l>,
}

impl<'l> ContextWindowExtractor<'l> {
    /// Extractor for `mode` using `analyzer` on every term.
    pub const fn new(mode: WindowMode, analyzer: TokenAnalyzer<'l>) -> Self {
        Self {
            mode,
            selection: Selection::Highlighted,
            analyzer,
        }
    }

    /// Choose which textual spans are returned. Ignored in surface mode.
    #[must_use]
    pub const fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    /// The windowing mode.
    pub const fn mode(&self) -> WindowMode {
        self.mode
    }

    /// The analyzer applied to terms.
    pub const fn analyzer(&self) -> &TokenAnalyzer<'l> {
        &self.analyzer
    }

    /// Spans for every match of `hit` inside `content`.
    ///
    /// A hit without matches yields no spans.
    #[tracing::instrument(skip_all, fields(doc = hit.doc, matches = hit.matches.len()))]
    pub fn extract(&self, content: &str, hit: &Hit) -> Vec<Span> {
        if hit.matches.is_empty() {
            return Vec::new();
        }
        let spans: Vec<Span> = match self.mode {
            WindowMode::Surface {
                left_span,
                right_span,
                within_sentence,
            } => self
                .surface_windows(content, &hit.matches, left_span, right_span, within_sentence)
                .into_iter()
                .map(Span::Surface)
                .collect(),
            WindowMode::TextualSentence => self
                .textual_spans(content, &hit.matches, &sentence_ranges(content))
                .into_iter()
                .map(Span::Textual)
                .collect(),
            WindowMode::TextualParagraph => self
                .textual_spans(content, &hit.matches, &paragraph_ranges(content))
                .into_iter()
                .map(Span::Textual)
                .collect(),
        };
        tracing::trace!(spans = spans.len(), "extracted spans");
        spans
    }

    fn surface_windows(
        &self,
        content: &str,
        matches: &[Range<usize>],
        left_span: usize,
        right_span: usize,
        within_sentence: bool,
    ) -> Vec<ContextWindow> {
        let tokens = token_ranges(content);
        let sentences = if within_sentence {
            sentence_ranges(content)
        } else {
            Vec::new()
        };

        let nodes = node_spans(content, &tokens, matches);
        let mut windows = Vec::with_capacity(nodes.len());
        for node in nodes {
            let bounds = if within_sentence {
                containing_range(&sentences, tokens[node.start].start)
                    .unwrap_or(0..content.len())
            } else {
                0..content.len()
            };

            let mut left: Vec<String> = tokens[..node.start]
                .iter()
                .rev()
                .take_while(|t| t.start >= bounds.start)
                .filter_map(|t| self.analyzer.analyze(&content[t.clone()]))
                .take(left_span)
                .collect();
            left.reverse();

            let right: Vec<String> = tokens[node.end..]
                .iter()
                .take_while(|t| t.end <= bounds.end)
                .filter_map(|t| self.analyzer.analyze(&content[t.clone()]))
                .take(right_span)
                .collect();

            let node = tokens[node]
                .iter()
                .map(|t| self.analyzer.analyze_node(&content[t.clone()]))
                .collect::<Vec<_>>()
                .join(NODE_SEPARATOR);

            windows.push(ContextWindow { left, node, right });
        }
        windows
    }

    fn textual_spans(
        &self,
        content: &str,
        matches: &[Range<usize>],
        blocks: &[Range<usize>],
    ) -> Vec<TextualSpan> {
        let tokens = token_ranges(content);

        // Each token covered by a node carries the index of that node.
        let mut labels: Vec<Option<usize>> = vec![None; tokens.len()];
        for (id, node) in node_spans(content, &tokens, matches).into_iter().enumerate() {
            for label in &mut labels[node] {
                *label = Some(id);
            }
        }

        let mut spans = Vec::new();
        for block in blocks {
            let first = tokens.partition_point(|t| t.start < block.start);
            let mut terms = Vec::new();
            let mut node_count = 0;
            let mut pending: Option<(usize, Vec<String>)> = None;

            for (idx, t) in tokens
                .iter()
                .enumerate()
                .skip(first)
                .take_while(|(_, t)| t.end <= block.end)
            {
                let token = &content[t.clone()];
                match labels[idx] {
                    Some(id) => {
                        let piece = self.analyzer.analyze_node(token);
                        match pending.as_mut() {
                            Some((current, pieces)) if *current == id => pieces.push(piece),
                            _ => {
                                flush_node(&mut pending, &mut terms, &mut node_count);
                                pending = Some((id, vec![piece]));
                            }
                        }
                    }
                    None => {
                        flush_node(&mut pending, &mut terms, &mut node_count);
                        terms.extend(self.analyzer.analyze(token));
                    }
                }
            }
            flush_node(&mut pending, &mut terms, &mut node_count);

            let keep = match self.selection {
                Selection::Highlighted => node_count > 0,
                Selection::All => !terms.is_empty(),
            };
            if keep {
                spans.push(TextualSpan {
                    tokens: terms,
                    node_count,
                });
            }
        }
        spans
    }
}

fn flush_node(
    pending: &mut Option<(usize, Vec<String>)>,
    terms: &mut Vec<String>,
    node_count: &mut usize,
) {
    if let Some((_, pieces)) = pending.take() {
        terms.push(tag_node(&pieces.join(NODE_SEPARATOR)));
        *node_count += 1;
    }
}

/// Token index ranges of the node occurrences, in text order.
///
/// Matches sharing a token are one occurrence covering all their tokens, so
/// overlapping query alternatives never yield more than one node.
fn node_spans(
    content: &str,
    tokens: &[Range<usize>],
    matches: &[Range<usize>],
) -> Vec<Range<usize>> {
    let mut spans: Vec<Range<usize>> = matches
        .iter()
        .filter_map(|m| node_tokens(content, tokens, m))
        .collect();
    spans.sort_by_key(|r| (r.start, r.end));

    let mut merged: Vec<Range<usize>> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if span.start < last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
    }
    merged
}

/// Indices of the tokens a match covers, including any part-of-speech payload
/// directly after the match.
fn node_tokens(content: &str, tokens: &[Range<usize>], m: &Range<usize>) -> Option<Range<usize>> {
    let end = skip_pos_payload(content, m.end);
    let first = tokens.partition_point(|t| t.end <= m.start);
    let last = tokens.partition_point(|t| t.start < end);
    (first < last).then_some(first..last)
}

fn containing_range(ranges: &[Range<usize>], offset: usize) -> Option<Range<usize>> {
    let idx = ranges.partition_point(|r| r.end <= offset);
    ranges.get(idx).filter(|r| r.start <= offset).cloned()
}
