use std::ops::Range;

use crate::StatsError;

/// An equal-width histogram over a fixed `[lower, upper)` range.
///
/// The range is split into `nr_bins` intervals of width
/// `step = (upper - lower) / nr_bins`. One extra bin, `[upper, upper + step)`
/// (up to rounding), follows the last regular interval, so a histogram always
/// holds `nr_bins + 1` bins. Values outside all bins are dropped and only
/// tallied in [`dropped`](Self::dropped).
#[derive(Debug, Clone)]
pub struct FixedRangeHistogram {
    /// The bins, regular intervals first and the extra bin last.
    pub bins: Vec<HistogramBin>,
    dropped: u64,
}

/// A single bin in a histogram.
#[derive(Debug, Clone)]
pub struct HistogramBin {
    /// The range of values covered by this bin (inclusive start, exclusive end).
    pub range: Range<f64>,
    /// The number of values that fall within this bin's range.
    pub count: u64,
}

impl HistogramBin {
    /// The center of the bin's range.
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        0.5 * (self.range.start + self.range.end)
    }
}

impl FixedRangeHistogram {
    /// Creates an empty histogram.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::InvalidHistogramRange`] if `nr_bins` is zero, a
    /// bound is not finite or `upper <= lower`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use flowprobe_stats::histogram::FixedRangeHistogram;
    /// let histogram = FixedRangeHistogram::new(999.0, 2001.0, 12).unwrap();
    /// assert_eq!(histogram.bins.len(), 13);
    /// assert!(FixedRangeHistogram::new(1.0, 1.0, 12).is_err());
    /// ```
    #[expect(clippy::cast_precision_loss)]
    pub fn new(lower: f64, upper: f64, nr_bins: usize) -> Result<Self, StatsError> {
        if nr_bins == 0 || !lower.is_finite() || !upper.is_finite() || upper <= lower {
            return Err(StatsError::InvalidHistogramRange {
                lower,
                upper,
                nr_bins,
            });
        }

        let step = (upper - lower) / nr_bins as f64;
        // Bin edges are recomputed from the index rather than accumulated, so
        // a value `lower + i * step` always lands in bin `i`.
        let bins = (0..=nr_bins)
            .map(|i| HistogramBin {
                range: lower + (i as f64) * step..lower + ((i + 1) as f64) * step,
                count: 0,
            })
            .collect();

        Ok(Self { bins, dropped: 0 })
    }

    /// Counts `value` in the first bin containing it.
    ///
    /// Returns `false` if the value lies outside every bin.
    pub fn add(&mut self, value: f64) -> bool {
        match self.bins.iter_mut().find(|bin| bin.range.contains(&value)) {
            Some(bin) => {
                bin.count += 1;
                true
            }
            None => {
                self.dropped += 1;
                false
            }
        }
    }

    pub fn extend<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = f64>,
    {
        for value in values {
            self.add(value);
        }
    }

    /// Per-bin counts, extra bin last.
    pub fn counts(&self) -> impl Iterator<Item = u64> + '_ {
        self.bins.iter().map(|bin| bin.count)
    }

    /// Number of values counted in any bin.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts().sum()
    }

    /// Number of values that fell outside every bin.
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}
