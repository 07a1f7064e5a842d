//! Statistical reductions for probe samples of the cavity flow ensemble.
//!
//! This crate provides the pure computations behind the `flowprobe` reductions:
//!
//! - **Grouped moments**: per-key mean and Bessel-corrected standard deviation
//! - **Fixed-range histograms**: equal-width binning with a trailing extra bin
//! - **Convergence series**: running-mean error against the overall mean, with
//!   optional closed-form theory bounds, and the deviation of ensemble means
//!   from the largest ensemble
//!
//! # Modules
//!
//! - [`grouped`]: Two-pass grouped mean / standard deviation
//! - [`histogram`]: Fixed-range histogram binning
//! - [`convergence`]: Cumulative and cross-ensemble convergence, theory bounds
//!
//! # Examples
//!
//! ## Mean and standard deviation per time step
//!
//! ```
//! use flowprobe_stats::{Divisor, grouped::GroupedSamples};
//!
//! let mut samples = GroupedSamples::new(1);
//! samples.push(50.0, &[0.010]);
//! samples.push(50.0, &[0.020]);
//! samples.push(50.0, &[0.030]);
//!
//! let groups = samples.moments(Divisor::Fixed(3)).unwrap();
//! assert!((groups[0].mean[0] - 0.020).abs() < 1e-12);
//! assert!((groups[0].std_dev.as_ref().unwrap()[0] - 0.01).abs() < 1e-12);
//! ```
//!
//! ## Binning values into a fixed range
//!
//! ```
//! use flowprobe_stats::histogram::FixedRangeHistogram;
//!
//! let mut histogram = FixedRangeHistogram::new(0.0, 1.0, 4).unwrap();
//! histogram.extend([0.1, 0.3, 0.3, 1.1]);
//! assert_eq!(histogram.counts().collect::<Vec<_>>(), [1, 2, 0, 0, 1]);
//! ```
//!
//! ## Convergence of the running mean
//!
//! ```
//! use flowprobe_stats::convergence::ConvergenceSeries;
//!
//! let series = ConvergenceSeries::from_values(&[1.0, 2.0, 3.0]).unwrap();
//! assert_eq!(series.overall_mean, 2.0);
//! assert_eq!(series.errors, [1.0, 0.5, 0.0]);
//! ```

pub mod convergence;
pub mod grouped;
pub mod histogram;

/// Errors raised when a reduction would otherwise divide by zero or work on
/// an invalid configuration.
#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error)]
pub enum StatsError {
    #[display("group at key {key} has no samples to average")]
    EmptyGroup { key: f64 },
    #[display("group at key {key} has a sample count of {count}; standard deviation needs at least 2")]
    DegenerateVariance { key: f64, count: usize },
    #[display("no samples to estimate convergence from")]
    NoSamples,
    #[display("invalid histogram range [{lower}, {upper}) with {nr_bins} bins")]
    InvalidHistogramRange {
        lower: f64,
        upper: f64,
        nr_bins: usize,
    },
}

/// The sample count a group's sums are divided by.
///
/// # Examples
///
/// ```
/// use flowprobe_stats::Divisor;
///
/// assert_eq!(Divisor::Observed.resolve(7), 7);
/// assert_eq!(Divisor::Fixed(50).resolve(7), 50);
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Divisor {
    /// Divide by the number of samples actually seen for the group.
    #[default]
    Observed,
    /// Divide by a configured sample count, regardless of how many samples
    /// the group holds.
    Fixed(usize),
}

impl Divisor {
    #[must_use]
    pub fn resolve(self, observed: usize) -> usize {
        match self {
            Self::Observed => observed,
            Self::Fixed(n) => n,
        }
    }
}
