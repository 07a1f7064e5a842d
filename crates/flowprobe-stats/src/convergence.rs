//! Convergence of a running mean toward the overall mean
//!
//! Walking `N` samples in order, the running mean after `i` samples is
//! compared with the mean of all `N`. The absolute difference shows how an
//! ensemble estimate settles as more samples are drawn, and can be plotted
//! against a closed-form [`TheoryBound`] such as the Monte-Carlo rate
//! `c / sqrt(i)`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::StatsError;

/// Absolute error of the running mean for every prefix length.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvergenceSeries {
    /// Mean over all samples.
    pub overall_mean: f64,
    /// `errors[i - 1] = |mean(samples[..i]) - overall_mean|`.
    pub errors: Vec<f64>,
}

impl ConvergenceSeries {
    /// Builds the series from samples in input order.
    ///
    /// The overall mean is the final running sum divided by the sample count,
    /// so the last error is exactly zero.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::NoSamples`] if `values` is empty.
    #[expect(clippy::cast_precision_loss)]
    pub fn from_values(values: &[f64]) -> Result<Self, StatsError> {
        if values.is_empty() {
            return Err(StatsError::NoSamples);
        }

        let running_sums = values
            .iter()
            .scan(0.0, |sum, value| {
                *sum += value;
                Some(*sum)
            })
            .collect::<Vec<f64>>();
        let total = running_sums[running_sums.len() - 1];
        let overall_mean = total / values.len() as f64;

        let errors = running_sums
            .iter()
            .enumerate()
            .map(|(idx, sum)| (sum / (idx + 1) as f64 - overall_mean).abs())
            .collect();

        Ok(Self {
            overall_mean,
            errors,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// `(i, error)` pairs with a 1-based sample index.
    pub fn points(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.errors.iter().enumerate().map(|(idx, e)| (idx + 1, *e))
    }
}

/// Shape of a theoretical convergence curve.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::FromStr,
    derive_more::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum BoundKind {
    /// `c / sqrt(i)`, the Monte-Carlo rate.
    #[display("sqrt")]
    Sqrt,
    /// `c / i`
    #[display("linear")]
    Linear,
    /// `c / i^2`
    #[display("quadratic")]
    Quadratic,
}

/// A closed-form error curve `c * i^-order` with a fitted coefficient.
///
/// # Examples
///
/// ```
/// use flowprobe_stats::convergence::{BoundKind, TheoryBound};
///
/// let bound = TheoryBound { kind: BoundKind::Sqrt, coefficient: 0.01 };
/// assert_eq!(bound.eval(4), 0.005);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TheoryBound {
    pub kind: BoundKind,
    pub coefficient: f64,
}

impl TheoryBound {
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn eval(&self, samples: usize) -> f64 {
        let n = samples as f64;
        match self.kind {
            BoundKind::Sqrt => self.coefficient / n.sqrt(),
            BoundKind::Linear => self.coefficient / n,
            BoundKind::Quadratic => self.coefficient / n.powi(2),
        }
    }
}

impl fmt::Display for TheoryBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.coefficient)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid bound {text:?}; expected <sqrt|linear|quadratic>:<coefficient>")]
pub struct ParseBoundError {
    #[error(not(source))]
    pub text: String,
}

/// Parses `kind:coefficient`, e.g. `sqrt:0.01`.
impl FromStr for TheoryBound {
    type Err = ParseBoundError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseBoundError { text: s.to_owned() };
        let (kind, coefficient) = s.split_once(':').ok_or_else(err)?;
        let coefficient = coefficient.trim().parse::<f64>().map_err(|_| err())?;
        if !coefficient.is_finite() {
            return Err(err());
        }
        Ok(Self {
            kind: kind.trim().parse().map_err(|_| err())?,
            coefficient,
        })
    }
}

/// Deviation of ensemble means from the mean of the largest ensemble.
///
/// Each entry pairs an ensemble's sample count with its mean. The ensemble
/// with the most samples is the reference; its own error is zero.
///
/// # Examples
///
/// ```
/// use flowprobe_stats::convergence::EnsembleConvergence;
///
/// let means = [(200, 0.0125), (50, 0.0135), (100, 0.013)];
/// let conv = EnsembleConvergence::from_means(&means).unwrap();
/// assert_eq!(conv.reference_samples, 200);
/// assert_eq!(conv.points[0].0, 50);
/// assert_eq!(conv.points[2], (200, 0.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EnsembleConvergence {
    /// Sample count of the reference ensemble.
    pub reference_samples: usize,
    /// Mean of the reference ensemble.
    pub reference_mean: f64,
    /// `(samples, |mean - reference_mean|)`, ascending by sample count.
    pub points: Vec<(usize, f64)>,
}

impl EnsembleConvergence {
    /// # Errors
    ///
    /// Returns [`StatsError::NoSamples`] if `means` is empty.
    pub fn from_means(means: &[(usize, f64)]) -> Result<Self, StatsError> {
        let mut sorted = means.to_vec();
        sorted.sort_by_key(|(samples, _)| *samples);
        let &(reference_samples, reference_mean) =
            sorted.last().ok_or(StatsError::NoSamples)?;
        let points = sorted
            .iter()
            .map(|(samples, mean)| (*samples, (mean - reference_mean).abs()))
            .collect();
        Ok(Self {
            reference_samples,
            reference_mean,
            points,
        })
    }
}
