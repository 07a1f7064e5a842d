//! Histograms at one time step
//!
//! Bins each selected field and the Reynolds number of the rows at a single
//! simulation time into fixed ranges. Each output line holds a bin midpoint
//! and its count.

use std::path::Path;

use anyhow::Context;
use flowprobe_data::sample::{Field, Probe, Quantity};
use flowprobe_stats::histogram::FixedRangeHistogram;
use serde::{Deserialize, Serialize};

use crate::{
    command::{self, IoArg},
    util::{self, Cell, TsvTable},
};

pub(crate) const INPUT: &str = "../CSV/mc_2000.csv";
pub(crate) const TIME: f64 = 50.0;
pub(crate) const NR_BINS: usize = 12;
pub(crate) const FIELDS: [Field; 3] = [
    Field::new(Quantity::U, Probe::P1),
    Field::new(Quantity::U, Probe::P2),
    Field::new(Quantity::U, Probe::P3),
];
pub(crate) const FIELD_LOWER: [f64; 3] = [0.009, -0.055, -0.06];
pub(crate) const FIELD_UPPER: [f64; 3] = [0.018, -0.03, -0.046];
pub(crate) const RE_LOWER: f64 = 999.0;
pub(crate) const RE_UPPER: f64 = 2001.0;

#[derive(Debug, Clone, PartialEq, clap::Args, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct HistogramArg {
    /// Input CSV file
    #[arg(long, default_value = INPUT)]
    pub input: String,

    /// Simulation time to select rows at
    #[arg(long, default_value_t = TIME)]
    pub time: f64,

    /// Number of regular bins; one extra bin follows the upper bound
    #[arg(long, default_value_t = NR_BINS)]
    pub nr_bins: usize,

    /// Fields to bin (comma-separated)
    #[arg(long, value_delimiter = ',', default_values_t = FIELDS)]
    pub fields: Vec<Field>,

    /// Lower bound per field
    #[arg(
        long,
        value_delimiter = ',',
        allow_negative_numbers = true,
        default_values_t = FIELD_LOWER
    )]
    pub lower: Vec<f64>,

    /// Upper bound per field
    #[arg(
        long,
        value_delimiter = ',',
        allow_negative_numbers = true,
        default_values_t = FIELD_UPPER
    )]
    pub upper: Vec<f64>,

    /// Lower bound of the Reynolds number histogram
    #[arg(long, default_value_t = RE_LOWER)]
    pub re_lower: f64,

    /// Upper bound of the Reynolds number histogram
    #[arg(long, default_value_t = RE_UPPER)]
    pub re_upper: f64,

    #[command(flatten)]
    #[serde(flatten)]
    pub io: IoArg,
}

impl Default for HistogramArg {
    fn default() -> Self {
        Self {
            input: INPUT.to_owned(),
            time: TIME,
            nr_bins: NR_BINS,
            fields: FIELDS.to_vec(),
            lower: FIELD_LOWER.to_vec(),
            upper: FIELD_UPPER.to_vec(),
            re_lower: RE_LOWER,
            re_upper: RE_UPPER,
            io: IoArg::default(),
        }
    }
}

pub(crate) fn run(arg: &HistogramArg) -> anyhow::Result<()> {
    let tables = reduce(arg)?;
    util::write_tables(&arg.io.output_dir, &tables)
}

pub(crate) fn reduce(arg: &HistogramArg) -> anyhow::Result<Vec<TsvTable>> {
    if arg.lower.len() != arg.fields.len() || arg.upper.len() != arg.fields.len() {
        anyhow::bail!(
            "Expected one lower and upper bound per field ({} fields, {} lower, {} upper)",
            arg.fields.len(),
            arg.lower.len(),
            arg.upper.len()
        );
    }

    let mut histograms = arg
        .fields
        .iter()
        .zip(arg.lower.iter().zip(&arg.upper))
        .map(|(field, (&lower, &upper))| {
            let histogram = FixedRangeHistogram::new(lower, upper, arg.nr_bins)
                .with_context(|| format!("Invalid histogram for {field}"))?;
            Ok((format!("hist_{field}"), *field, histogram))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;
    let mut re_histogram = FixedRangeHistogram::new(arg.re_lower, arg.re_upper, arg.nr_bins)
        .context("Invalid Reynolds number histogram")?;

    let path = Path::new(&arg.input);
    let rows = arg.io.read_samples(path)?;
    let rows = command::rows_at_time(&rows, arg.time, path)?;
    for row in &rows {
        for (_, field, histogram) in &mut histograms {
            histogram.add(row.value(*field));
        }
        re_histogram.add(row.reynolds);
    }

    let named = histograms
        .into_iter()
        .map(|(name, _, histogram)| (name, histogram))
        .chain([("hist_re".to_owned(), re_histogram)]);
    let mut tables = vec![];
    for (name, histogram) in named {
        if histogram.dropped() > 0 {
            eprintln!(
                "  {name}: {} of {} values outside all bins",
                histogram.dropped(),
                rows.len()
            );
        }
        let mut table = TsvTable::new(name);
        for bin in &histogram.bins {
            table.push_row([Cell::from(bin.midpoint()), Cell::from(bin.count)]);
        }
        tables.push(table);
    }
    Ok(tables)
}
