//! Named association measures and threshold filtering.

use std::collections::BTreeMap;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::collocate::CollocateRecord;
use crate::error::ConfigError;

/// A measure that can be read off a [`CollocateRecord`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum Measure {
    /// Raw co-occurrence frequency `O`.
    Cooccurrence,
    /// Mutual information.
    #[serde(rename = "MI", alias = "mi")]
    Mi,
    /// Cubic mutual information.
    #[serde(rename = "MI3", alias = "mi3")]
    Mi3,
    /// Dice coefficient.
    Dice,
    /// Log odds ratio.
    OddsRatio,
    /// T-score.
    TScore,
    /// Z-score.
    ZScore,
    /// Single-cell log-likelihood.
    #[serde(rename = "SimpleLL")]
    SimpleLl,
    /// Yates-corrected chi-squared.
    ChiSquaredCorr,
    /// Four-cell log-likelihood.
    LogLikelihood,
}

impl Measure {
    /// Every measure, in display order.
    pub const ALL: [Self; 10] = [
        Self::Cooccurrence,
        Self::Mi,
        Self::Mi3,
        Self::Dice,
        Self::OddsRatio,
        Self::TScore,
        Self::ZScore,
        Self::SimpleLl,
        Self::ChiSquaredCorr,
        Self::LogLikelihood,
    ];

    /// Canonical display name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cooccurrence => "Cooccurrence",
            Self::Mi => "MI",
            Self::Mi3 => "MI3",
            Self::Dice => "Dice",
            Self::OddsRatio => "OddsRatio",
            Self::TScore => "TScore",
            Self::ZScore => "ZScore",
            Self::SimpleLl => "SimpleLL",
            Self::ChiSquaredCorr => "ChiSquaredCorr",
            Self::LogLikelihood => "LogLikelihood",
        }
    }

    /// Cutoff used when a measure is enabled without an explicit value.
    ///
    /// SimpleLL 3.84 corresponds to p < .05 with one degree of freedom; the
    /// 1.96 cutoffs to a two-sided 95% normal interval.
    pub const fn default_cutoff(self) -> f64 {
        match self {
            Self::Cooccurrence => 5.0,
            Self::Mi | Self::Dice | Self::OddsRatio => 2.0,
            Self::Mi3 => 8.0,
            Self::SimpleLl => 3.84,
            Self::TScore | Self::ZScore | Self::ChiSquaredCorr | Self::LogLikelihood => 1.96,
        }
    }

    /// Read this measure off a record.
    #[allow(clippy::cast_precision_loss)]
    pub fn value(self, record: &CollocateRecord) -> f64 {
        let m = &record.measures;
        match self {
            Self::Cooccurrence => record.signature.o as f64,
            Self::Mi => m.mi,
            Self::Mi3 => m.mi3,
            Self::Dice => m.dice,
            Self::OddsRatio => m.odds_ratio,
            Self::TScore => m.tscore,
            Self::ZScore => m.zscore,
            Self::SimpleLl => m.simple_ll,
            Self::ChiSquaredCorr => m.chi_squared_corr,
            Self::LogLikelihood => m.log_likelihood,
        }
    }

    fn available() -> String {
        Self::ALL
            .iter()
            .map(|m| m.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl std::fmt::Display for Measure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Measure {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ConfigError::UnknownMeasure {
                name: wanted.to_string(),
                available: Self::available(),
            })
    }
}

/// Minimum acceptable values per measure.
///
/// A record passes when no configured cutoff exceeds its value. Cutoffs are
/// inclusive, and a NaN value never fails a cutoff.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Thresholds(BTreeMap<Measure, f64>);

impl Thresholds {
    /// No thresholds: every record passes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `measure >= value`.
    pub fn set(&mut self, measure: Measure, value: f64) -> &mut Self {
        self.0.insert(measure, value);
        self
    }

    /// Require `measure` to reach its default cutoff.
    pub fn enable(&mut self, measure: Measure) -> &mut Self {
        self.set(measure, measure.default_cutoff())
    }

    /// Builder form of [`Thresholds::set`].
    #[must_use]
    pub fn with(mut self, measure: Measure, value: f64) -> Self {
        self.set(measure, value);
        self
    }

    /// Configured cutoff for `measure`.
    pub fn get(&self, measure: Measure) -> Option<f64> {
        self.0.get(&measure).copied()
    }

    /// Whether no cutoff is configured.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Configured cutoffs in measure order.
    pub fn iter(&self) -> impl Iterator<Item = (Measure, f64)> + '_ {
        self.0.iter().map(|(m, v)| (*m, *v))
    }

    /// Whether `record` satisfies every cutoff.
    pub fn accepts(&self, record: &CollocateRecord) -> bool {
        !self.0.iter().any(|(m, &min)| min > m.value(record))
    }
}

impl FromIterator<(Measure, f64)> for Thresholds {
    fn from_iter<T: IntoIterator<Item = (Measure, f64)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
