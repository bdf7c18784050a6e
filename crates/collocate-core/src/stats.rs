//! Contingency statistics.
//!
//! Association measures between a node and a collocate derived from the 2x2
//! contingency table of a [`ContingencySignature`].
//!
//! | cell | observed          | expected            |
//! |------|-------------------|---------------------|
//! | 11   | `O`               | `f1 * f2 / N`       |
//! | 12   | `f1 - O`          | `f1 * (N - f2) / N` |
//! | 21   | `f2 - O`          | `(N - f1) * f2 / N` |
//! | 22   | `N - f1 - f2 + O` | `(N - f1)^2 / N`    |
//!
//! Cells are evaluated in floating point. Surface windows may count one
//! collocate several times around the same node occurrence, so `O` can exceed
//! a marginal and a cell can go negative. Measures then come out as NaN or
//! infinite, which callers treat as "value unavailable".

use serde::{Deserialize, Serialize};

/// Sufficient statistics for one node/collocate pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContingencySignature {
    /// The collocate.
    pub word: String,
    /// Observed co-occurrence frequency.
    pub o: u64,
    /// Node marginal frequency.
    pub f1: u64,
    /// Collocate marginal frequency.
    pub f2: u64,
    /// Reference population size.
    pub n: u64,
}

impl ContingencySignature {
    /// Build a signature from its four counts.
    pub fn new(word: impl Into<String>, o: u64, f1: u64, f2: u64, n: u64) -> Self {
        Self {
            word: word.into(),
            o,
            f1,
            f2,
            n,
        }
    }

    /// Signature for span-based (surface) co-occurrence.
    ///
    /// `windows` is the number of node windows, `sample_tokens` the token count
    /// of all windows (node included), `corpus_tokens` the corpus token count,
    /// `corpus_freq` the collocate's corpus frequency and `window_freq` its
    /// frequency inside the windows. The node marginal is weighted by span
    /// size and the node occurrences are removed from the population
    /// (Evert 2007, section 5.2).
    pub fn surface(
        word: impl Into<String>,
        window_freq: u64,
        corpus_freq: u64,
        windows: u64,
        sample_tokens: u64,
        corpus_tokens: u64,
    ) -> Self {
        Self::new(
            word,
            window_freq,
            sample_tokens.saturating_sub(windows),
            corpus_freq,
            corpus_tokens.saturating_sub(windows),
        )
    }

    /// Signature for sentence or paragraph co-occurrence, counted in windows.
    pub fn textual(
        word: impl Into<String>,
        node_windows_with_word: u64,
        node_windows: u64,
        windows_with_word: u64,
        windows: u64,
    ) -> Self {
        Self::new(
            word,
            node_windows_with_word,
            node_windows,
            windows_with_word,
            windows,
        )
    }

    /// Observed and expected cell values.
    #[allow(clippy::cast_precision_loss)]
    pub fn cells(&self) -> ContingencyCells {
        let o = self.o as f64;
        let f1 = self.f1 as f64;
        let f2 = self.f2 as f64;
        let n = self.n as f64;
        ContingencyCells {
            o11: o,
            o12: f1 - o,
            o21: f2 - o,
            o22: n - f1 - f2 + o,
            e11: f1 * f2 / n,
            e12: f1 * (n - f2) / n,
            e21: (n - f1) * f2 / n,
            e22: (n - f1) * (n - f1) / n,
            n,
        }
    }
}

/// Observed (`o*`) and expected (`e*`) cells of a contingency table.
#[derive(Debug, Clone, Copy, PartialEq)]
#[allow(missing_docs)]
pub struct ContingencyCells {
    pub o11: f64,
    pub o12: f64,
    pub o21: f64,
    pub o22: f64,
    pub e11: f64,
    pub e12: f64,
    pub e21: f64,
    pub e22: f64,
    pub n: f64,
}

/// Association measures computed once from a signature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationMeasures {
    /// Mutual information, `log2(O11 / E11)`.
    pub mi: f64,
    /// Cubic mutual information, `log2(O11^3 / E11)`.
    pub mi3: f64,
    /// `(O11 - E11) / sqrt(E11)`.
    pub zscore: f64,
    /// `(O11 - E11) / sqrt(O11)`.
    pub tscore: f64,
    /// Single-cell log-likelihood.
    #[serde(rename = "simpleLL")]
    pub simple_ll: f64,
    /// Dice coefficient.
    pub dice: f64,
    /// Log odds ratio with Haldane-Anscombe correction.
    pub odds_ratio: f64,
    /// Yates-corrected chi-squared.
    pub chi_squared_corr: f64,
    /// Four-cell log-likelihood (G2).
    pub log_likelihood: f64,
}

impl AssociationMeasures {
    /// Compute every measure for `signature`.
    pub fn from_signature(signature: &ContingencySignature) -> Self {
        Self::from_cells(&signature.cells())
    }

    /// Compute every measure from precomputed cells.
    pub fn from_cells(c: &ContingencyCells) -> Self {
        Self {
            mi: (c.o11 / c.e11).log2(),
            mi3: (c.o11.powi(3) / c.e11).log2(),
            zscore: undefined_at_zero(c.e11, (c.o11 - c.e11) / c.e11.sqrt()),
            tscore: undefined_at_zero(c.o11, (c.o11 - c.e11) / c.o11.sqrt()),
            simple_ll: 2.0 * (c.o11 * (c.o11 / c.e11).ln() - (c.o11 - c.e11)),
            dice: 2.0 * c.o11 / (2.0 * c.o11 + c.o12 + c.o21),
            odds_ratio: (((c.o11 + 0.5) * (c.o22 + 0.5)) / ((c.o12 + 0.5) * (c.o21 + 0.5))).ln(),
            chi_squared_corr: chi_squared_corr(c),
            log_likelihood: 2.0
                * (ll_term(c.o11, c.e11)
                    + ll_term(c.o12, c.e12)
                    + ll_term(c.o21, c.e21)
                    + ll_term(c.o22, c.e22)),
        }
    }
}

/// NaN when `divisor` is zero, otherwise `value`.
fn undefined_at_zero(divisor: f64, value: f64) -> f64 {
    if divisor == 0.0 { f64::NAN } else { value }
}

fn chi_squared_corr(c: &ContingencyCells) -> f64 {
    let diff = (c.o11 * c.o22 - c.o12 * c.o21).abs() - c.n / 2.0;
    c.n * diff * diff / ((c.o11 + c.o12) * (c.o21 + c.o22) * (c.o11 + c.o21) * (c.o12 + c.o22))
}

/// One cell of the log-likelihood sum. An empty cell contributes nothing.
fn ll_term(observed: f64, expected: f64) -> f64 {
    if observed == 0.0 {
        0.0
    } else {
        observed * (observed / expected).ln()
    }
}
