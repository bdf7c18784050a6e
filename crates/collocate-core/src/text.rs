//! Text processing utilities.
//!
//! Corpus content is whitespace-tokenized text in which every token may carry
//! a trailing part-of-speech payload after [`POS_SEPARATOR`] (`word_POS_tag`).
//! This module locates tokens, sentences and paragraphs as byte ranges over
//! that content so that match offsets reported by the corpus can be mapped
//! back onto them.

use std::ops::Range;

use unicode_segmentation::UnicodeSegmentation;

/// Reserved in-token separator between a word and its part-of-speech tag.
pub const POS_SEPARATOR: &str = "_POS_";

/// Placeholder that joins the words of a multi-word node into one term.
pub const NODE_SEPARATOR: &str = "_NODE_";

/// Marker placed before a node occurrence.
pub const PRE_NODE_TAG: &str = "<node>";

/// Marker placed after a node occurrence.
pub const POST_NODE_TAG: &str = "</node>";

/// Byte ranges of every whitespace-delimited token in `text`.
pub fn token_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = None;
    for (i, ch) in text.char_indices() {
        match (ch.is_whitespace(), start) {
            (true, Some(s)) => {
                ranges.push(s..i);
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        ranges.push(s..text.len());
    }
    ranges
}

/// Split a token into its word and optional part-of-speech payload.
pub fn split_pos(token: &str) -> (&str, Option<&str>) {
    match token.split_once(POS_SEPARATOR) {
        Some((word, pos)) => (word, Some(pos)),
        None => (token, None),
    }
}

/// Advance `offset` past a part-of-speech separator and its payload.
///
/// When `offset` sits immediately before [`POS_SEPARATOR`], returns the offset
/// of the next whitespace (or the end of `text`) so the payload stays attached
/// to the token it describes. Otherwise `offset` is returned unchanged.
pub fn skip_pos_payload(text: &str, offset: usize) -> usize {
    match text.get(offset..) {
        Some(rest) if rest.starts_with(POS_SEPARATOR) => next_whitespace(text, offset),
        _ => offset,
    }
}

fn next_whitespace(text: &str, offset: usize) -> usize {
    text[offset..]
        .find(char::is_whitespace)
        .map_or(text.len(), |i| offset + i)
}

/// Move a boundary that falls inside a token to the end of that token.
fn snap_to_token_end(text: &str, offset: usize) -> usize {
    let offset = skip_pos_payload(text, offset);
    if offset == 0 || offset >= text.len() {
        return offset;
    }
    let before = text[..offset].chars().next_back();
    let after = text[offset..].chars().next();
    match (before, after) {
        (Some(b), Some(a)) if !b.is_whitespace() && !a.is_whitespace() => {
            next_whitespace(text, offset)
        }
        _ => offset,
    }
}

/// Partition `text` into sentences using Unicode sentence boundaries (UAX #29).
///
/// Boundaries never split a token: a break that lands between a word and its
/// part-of-speech payload, or anywhere else inside a token, is moved to the
/// end of that token. Ranges that contain only whitespace are dropped.
#[tracing::instrument(skip_all, fields(text_len = text.len()))]
pub fn sentence_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for (offset, sentence) in text.split_sentence_bound_indices() {
        let end = snap_to_token_end(text, offset + sentence.len());
        if end <= start {
            continue;
        }
        push_non_blank(text, &mut ranges, start..end);
        start = end;
    }
    if start < text.len() {
        push_non_blank(text, &mut ranges, start..text.len());
    }
    ranges
}

/// Partition `text` into paragraphs delimited by newlines.
pub fn paragraph_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for (i, _) in text.match_indices('\n') {
        push_non_blank(text, &mut ranges, start..i);
        start = i + 1;
    }
    push_non_blank(text, &mut ranges, start..text.len());
    ranges
}

fn push_non_blank(text: &str, ranges: &mut Vec<Range<usize>>, range: Range<usize>) {
    if !text[range.clone()].trim().is_empty() {
        ranges.push(range);
    }
}

/// Wrap a term in node markers.
pub fn tag_node(term: &str) -> String {
    format!("{PRE_NODE_TAG}{term}{POST_NODE_TAG}")
}

/// Return the inner term when `term` is wrapped in node markers.
pub fn untag_node(term: &str) -> Option<&str> {
    term.strip_prefix(PRE_NODE_TAG)?.strip_suffix(POST_NODE_TAG)
}

/// Remove every node marker from `text`.
pub fn strip_node_tags(text: &str) -> String {
    text.replace(PRE_NODE_TAG, "").replace(POST_NODE_TAG, "")
}
