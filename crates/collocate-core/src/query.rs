//! Node queries.
//!
//! A node query is a list of whitespace-separated alternatives. Each
//! alternative is either a single term or a `"double quoted"` phrase of
//! consecutive terms. Terms may use `*` (any run of characters) and `?` (one
//! character) wildcards. A term containing the part-of-speech separator
//! (`leave_POS_VB`) is compared against the tagged spelling of a token; any
//! other term against its word part.
//!
//! ```
//! use collocate_core::NodeQuery;
//!
//! let query = NodeQuery::parse(r#"leav* "take off""#).unwrap();
//! assert_eq!(query.alternatives().len(), 2);
//! assert!(query.alternatives()[0].terms()[0].matches("leaves"));
//! ```

use globset::{GlobBuilder, GlobMatcher};

use crate::error::{QueryError, QueryResult};
use crate::text::{POS_SEPARATOR, split_pos};

/// One term of a node query.
#[derive(Debug, Clone)]
pub struct TermPattern {
    source: String,
    matcher: Option<GlobMatcher>,
    ignore_case: bool,
}

impl TermPattern {
    fn compile(term: &str, ignore_case: bool) -> QueryResult<Self> {
        let is_wildcard = term.contains(['*', '?']);
        if is_wildcard && term.chars().all(|c| c == '*' || c == '?') {
            return Err(QueryError::BareWildcard(term.to_string()));
        }
        let source = if ignore_case {
            fold_case(term)
        } else {
            term.to_string()
        };
        let matcher = if is_wildcard {
            let glob = GlobBuilder::new(&escape_glob(&source))
                .case_insensitive(ignore_case)
                .literal_separator(false)
                .backslash_escape(true)
                .build()
                .map_err(|e| QueryError::InvalidPattern {
                    pattern: term.to_string(),
                    reason: e.to_string(),
                })?;
            Some(glob.compile_matcher())
        } else {
            None
        };
        Ok(Self {
            source,
            matcher,
            ignore_case,
        })
    }

    /// The term as written (lowercased for case-insensitive queries).
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the term uses wildcards.
    pub const fn is_wildcard(&self) -> bool {
        self.matcher.is_some()
    }

    /// Whether the term targets the tagged `word_POS_tag` spelling.
    pub fn is_tagged(&self) -> bool {
        self.source.contains(POS_SEPARATOR)
    }

    /// Test a word (or tagged spelling) against this term.
    pub fn matches(&self, candidate: &str) -> bool {
        match &self.matcher {
            Some(m) => m.is_match(candidate),
            None if self.ignore_case => fold_case(candidate) == self.source,
            None => candidate == self.source,
        }
    }
}

/// Lowercase the word part, leaving a part-of-speech payload untouched.
fn fold_case(term: &str) -> String {
    match split_pos(term) {
        (word, Some(pos)) => format!("{}{POS_SEPARATOR}{pos}", word.to_lowercase()),
        (word, None) => word.to_lowercase(),
    }
}

/// Only `*` and `?` are wildcards; every other glob metacharacter is literal.
fn escape_glob(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '[' | ']' | '{' | '}' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// A sequence of terms matched against consecutive tokens.
#[derive(Debug, Clone)]
pub struct Phrase {
    terms: Vec<TermPattern>,
}

impl Phrase {
    /// The terms, in token order.
    pub fn terms(&self) -> &[TermPattern] {
        &self.terms
    }

    /// Number of tokens this phrase spans.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Always false for a parsed phrase.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// A parsed node query.
#[derive(Debug, Clone)]
pub struct NodeQuery {
    source: String,
    alternatives: Vec<Phrase>,
    ignore_case: bool,
}

impl NodeQuery {
    /// Parse a case-sensitive query.
    pub fn parse(query: &str) -> QueryResult<Self> {
        Self::parse_with(query, false)
    }

    /// Parse a query that ignores case.
    pub fn parse_ignore_case(query: &str) -> QueryResult<Self> {
        Self::parse_with(query, true)
    }

    #[tracing::instrument(skip_all, fields(query = %query))]
    fn parse_with(query: &str, ignore_case: bool) -> QueryResult<Self> {
        let mut alternatives = Vec::new();
        let mut rest = query.trim_start();

        while !rest.is_empty() {
            if let Some(inner) = rest.strip_prefix('"') {
                let close = inner
                    .find('"')
                    .ok_or_else(|| QueryError::UnbalancedQuote(query.to_string()))?;
                let terms = inner[..close]
                    .split_whitespace()
                    .map(|t| TermPattern::compile(t, ignore_case))
                    .collect::<QueryResult<Vec<_>>>()?;
                if terms.is_empty() {
                    return Err(QueryError::EmptyPhrase);
                }
                alternatives.push(Phrase { terms });
                rest = &inner[close + 1..];
            } else {
                let end = rest
                    .find(|c: char| c.is_whitespace() || c == '"')
                    .unwrap_or(rest.len());
                let term = TermPattern::compile(&rest[..end], ignore_case)?;
                alternatives.push(Phrase { terms: vec![term] });
                rest = &rest[end..];
            }
            rest = rest.trim_start();
        }

        if alternatives.is_empty() {
            return Err(QueryError::Empty);
        }
        tracing::debug!(alternatives = alternatives.len(), "parsed node query");
        Ok(Self {
            source: query.trim().to_string(),
            alternatives,
            ignore_case,
        })
    }

    /// The query text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Parsed alternatives in query order.
    pub fn alternatives(&self) -> &[Phrase] {
        &self.alternatives
    }

    /// Whether the query ignores case.
    pub const fn ignores_case(&self) -> bool {
        self.ignore_case
    }
}

impl std::fmt::Display for NodeQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_term() {
        let q = NodeQuery::parse("leave").unwrap();
        assert_eq!(q.alternatives().len(), 1);
        let term = &q.alternatives()[0].terms()[0];
        assert!(term.matches("leave"));
        assert!(!term.matches("Leave"));
        assert!(!term.is_wildcard());
    }

    #[test]
    fn alternatives_and_phrases() {
        let q = NodeQuery::parse(r#"go "take off"  leave"#).unwrap();
        let lens: Vec<usize> = q.alternatives().iter().map(Phrase::len).collect();
        assert_eq!(lens, vec![1, 2, 1]);
        assert_eq!(q.alternatives()[1].terms()[1].as_str(), "off");
    }

    #[test]
    fn adjacent_phrase_without_space() {
        let q = NodeQuery::parse(r#"go"take off""#).unwrap();
        assert_eq!(q.alternatives().len(), 2);
    }

    #[test]
    fn wildcards() {
        let q = NodeQuery::parse("leav* ?o").unwrap();
        let star = &q.alternatives()[0].terms()[0];
        assert!(star.is_wildcard());
        assert!(star.matches("leaves"));
        assert!(star.matches("leave"));
        assert!(!star.matches("believe"));
        let one = &q.alternatives()[1].terms()[0];
        assert!(one.matches("go"));
        assert!(!one.matches("goo"));
    }

    #[test]
    fn glob_metacharacters_are_literal() {
        let q = NodeQuery::parse("[a]*").unwrap();
        let term = &q.alternatives()[0].terms()[0];
        assert!(term.matches("[a]bc"));
        assert!(!term.matches("abc"));
    }

    #[test]
    fn ignore_case() {
        let q = NodeQuery::parse_ignore_case("Leave LEAV*").unwrap();
        assert!(q.alternatives()[0].terms()[0].matches("LEAVE"));
        assert!(q.alternatives()[1].terms()[0].matches("Leaves"));
    }

    #[test]
    fn tagged_terms() {
        let q = NodeQuery::parse("leave_POS_VB").unwrap();
        assert!(q.alternatives()[0].terms()[0].is_tagged());

        let q = NodeQuery::parse_ignore_case("Leave_POS_VB").unwrap();
        let term = &q.alternatives()[0].terms()[0];
        assert!(term.is_tagged());
        assert!(term.matches("LEAVE_POS_VB"));
        assert!(!term.matches("leave_POS_NN"));
    }

    #[test]
    fn empty_query() {
        assert_eq!(NodeQuery::parse("   ").unwrap_err(), QueryError::Empty);
    }

    #[test]
    fn unbalanced_quote() {
        assert!(matches!(
            NodeQuery::parse(r#"go "take off"#),
            Err(QueryError::UnbalancedQuote(_))
        ));
    }

    #[test]
    fn empty_phrase() {
        assert_eq!(
            NodeQuery::parse(r#"go "  ""#).unwrap_err(),
            QueryError::EmptyPhrase
        );
    }

    #[test]
    fn bare_wildcard() {
        assert_eq!(
            NodeQuery::parse("*").unwrap_err(),
            QueryError::BareWildcard("*".to_string())
        );
        assert!(NodeQuery::parse("?*").is_err());
    }
}
