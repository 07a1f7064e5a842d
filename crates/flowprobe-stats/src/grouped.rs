//! Grouped mean and standard deviation
//!
//! Samples are collected per key (a time step or a Reynolds number) and kept
//! in input order. Finalizing walks each group twice: once summing values for
//! the mean, once summing squared deviations from that mean for the
//! Bessel-corrected standard deviation.
//!
//! The divisor of both passes is chosen by [`Divisor`]. With
//! [`Divisor::Fixed`], a group is divided by the configured sample count even
//! if it holds a different number of rows.

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

use crate::{Divisor, StatsError};

/// Fixed-width samples grouped by an exact floating-point key.
///
/// Keys are compared by value without tolerance, except that `-0.0` and
/// `0.0` share a group. Groups iterate in ascending numeric key order.
#[derive(Debug, Clone)]
pub struct GroupedSamples {
    width: usize,
    /// Flattened rows of `width` values per sample, in insertion order.
    groups: BTreeMap<OrderedFloat<f64>, Vec<f64>>,
}

/// Finalized statistics of one group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    /// The group key.
    pub key: f64,
    /// Number of samples actually pushed for this key.
    pub count: usize,
    /// The divisor the sums were finalized with.
    pub divisor: usize,
    /// Mean of each value column.
    pub mean: Vec<f64>,
    /// Sample standard deviation of each value column, if computed.
    pub std_dev: Option<Vec<f64>>,
}

impl GroupedSamples {
    /// Creates an empty collection for samples of `width` values each.
    #[must_use]
    pub fn new(width: usize) -> Self {
        Self {
            width,
            groups: BTreeMap::new(),
        }
    }

    /// Collects `(key, values)` records.
    ///
    /// # Examples
    ///
    /// ```
    /// use flowprobe_stats::grouped::GroupedSamples;
    ///
    /// let samples = GroupedSamples::from_records(2, [(1.0, [0.5, 1.5]), (0.5, [1.0, 2.0])]);
    /// assert_eq!(samples.keys().collect::<Vec<_>>(), [0.5, 1.0]);
    /// ```
    pub fn from_records<I, V>(width: usize, records: I) -> Self
    where
        I: IntoIterator<Item = (f64, V)>,
        V: AsRef<[f64]>,
    {
        let mut samples = Self::new(width);
        for (key, values) in records {
            samples.push(key, values.as_ref());
        }
        samples
    }

    /// Adds one sample under `key`.
    ///
    /// # Panics
    ///
    /// Panics if `values` does not hold exactly `width` values.
    pub fn push(&mut self, key: f64, values: &[f64]) {
        assert_eq!(
            values.len(),
            self.width,
            "sample width does not match the collection width"
        );
        self.groups
            .entry(OrderedFloat(key))
            .or_default()
            .extend_from_slice(values);
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Distinct keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = f64> + '_ {
        self.groups.keys().map(|k| k.into_inner())
    }

    /// Number of samples pushed under `key`.
    #[must_use]
    pub fn count(&self, key: f64) -> usize {
        self.groups
            .get(&OrderedFloat(key))
            .map_or(0, |flat| self.rows_in(flat))
    }

    /// Finalizes each group to its mean, sorted by key.
    ///
    /// Fails with [`StatsError::EmptyGroup`] if a group's divisor is zero.
    pub fn means(&self, divisor: Divisor) -> Result<Vec<GroupSummary>, StatsError> {
        self.groups
            .iter()
            .map(|(key, flat)| self.summarize_mean(*key, flat, divisor))
            .collect()
    }

    /// Finalizes each group to its mean and sample standard deviation, sorted by key.
    ///
    /// The squared deviations are divided by `divisor - 1`. A divisor of one
    /// or less fails with [`StatsError::DegenerateVariance`].
    ///
    /// # Examples
    ///
    /// ```
    /// use flowprobe_stats::{Divisor, StatsError, grouped::GroupedSamples};
    ///
    /// let samples = GroupedSamples::from_records(1, [(50.0, [0.01])]);
    /// assert_eq!(
    ///     samples.moments(Divisor::Fixed(1)),
    ///     Err(StatsError::DegenerateVariance { key: 50.0, count: 1 }),
    /// );
    /// ```
    #[expect(clippy::cast_precision_loss)]
    pub fn moments(&self, divisor: Divisor) -> Result<Vec<GroupSummary>, StatsError> {
        self.groups
            .iter()
            .map(|(key, flat)| {
                let mut summary = self.summarize_mean(*key, flat, divisor)?;
                if summary.divisor <= 1 {
                    return Err(StatsError::DegenerateVariance {
                        key: key.into_inner(),
                        count: summary.divisor,
                    });
                }

                let mut squares = vec![0.0; self.width];
                for row in flat.chunks_exact(self.width) {
                    for ((acc, value), mean) in squares.iter_mut().zip(row).zip(&summary.mean) {
                        *acc += (value - mean).powi(2);
                    }
                }
                let bessel = (summary.divisor - 1) as f64;
                summary.std_dev = Some(squares.iter().map(|s| (s / bessel).sqrt()).collect());
                Ok(summary)
            })
            .collect()
    }

    #[expect(clippy::cast_precision_loss)]
    fn summarize_mean(
        &self,
        key: OrderedFloat<f64>,
        flat: &[f64],
        divisor: Divisor,
    ) -> Result<GroupSummary, StatsError> {
        let count = self.rows_in(flat);
        let n = divisor.resolve(count);
        if n == 0 {
            return Err(StatsError::EmptyGroup { key: key.into_inner() });
        }

        let mut sums = vec![0.0; self.width];
        for row in flat.chunks_exact(self.width) {
            for (acc, value) in sums.iter_mut().zip(row) {
                *acc += value;
            }
        }
        let mean = sums.into_iter().map(|s| s / n as f64).collect();

        Ok(GroupSummary {
            key: key.into_inner(),
            count,
            divisor: n,
            mean,
            std_dev: None,
        })
    }

    fn rows_in(&self, flat: &[f64]) -> usize {
        if self.width == 0 {
            0
        } else {
            flat.len() / self.width
        }
    }
}
