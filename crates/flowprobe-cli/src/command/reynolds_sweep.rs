//! Probe fields over the Reynolds number
//!
//! Selects the rows at one simulation time and writes the mean of each field
//! per Reynolds number, in ascending Reynolds order.

use std::path::Path;

use anyhow::Context;
use flowprobe_data::sample::{Field, GroupKey, Probe, Quantity};
use flowprobe_stats::{Divisor, grouped::GroupedSamples};
use serde::{Deserialize, Serialize};

use crate::{
    command::{self, IoArg},
    util::{self, Cell, TsvTable},
};

pub(crate) const INPUT: &str = "../CSV/mc_2000.csv";
pub(crate) const TIME: f64 = 50.0;
pub(crate) const FIELDS: [Field; 6] = [
    Field::new(Quantity::U, Probe::P1),
    Field::new(Quantity::U, Probe::P2),
    Field::new(Quantity::U, Probe::P3),
    Field::new(Quantity::V, Probe::P1),
    Field::new(Quantity::V, Probe::P2),
    Field::new(Quantity::V, Probe::P3),
];

#[derive(Debug, Clone, PartialEq, clap::Args, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct ReynoldsSweepArg {
    /// Input CSV file
    #[arg(long, default_value = INPUT)]
    pub input: String,

    /// Simulation time to select rows at
    #[arg(long, default_value_t = TIME)]
    pub time: f64,

    /// Fields to average (comma-separated)
    #[arg(long, value_delimiter = ',', default_values_t = FIELDS)]
    pub fields: Vec<Field>,

    #[command(flatten)]
    #[serde(flatten)]
    pub io: IoArg,
}

impl Default for ReynoldsSweepArg {
    fn default() -> Self {
        Self {
            input: INPUT.to_owned(),
            time: TIME,
            fields: FIELDS.to_vec(),
            io: IoArg::default(),
        }
    }
}

pub(crate) fn run(arg: &ReynoldsSweepArg) -> anyhow::Result<()> {
    let tables = reduce(arg)?;
    util::write_tables(&arg.io.output_dir, &tables)
}

pub(crate) fn reduce(arg: &ReynoldsSweepArg) -> anyhow::Result<Vec<TsvTable>> {
    let path = Path::new(&arg.input);
    let rows = arg.io.read_samples(path)?;
    let rows = command::rows_at_time(&rows, arg.time, path)?;

    let grouped = GroupedSamples::from_records(
        arg.fields.len(),
        rows.iter().map(|row| {
            let values = arg.fields.iter().map(|f| row.value(*f)).collect::<Vec<_>>();
            (row.key(GroupKey::Reynolds), values)
        }),
    );
    let groups = grouped
        .means(Divisor::Observed)
        .with_context(|| format!("Failed to average {}", path.display()))?;
    eprintln!("  {} Reynolds numbers", groups.len());
    let repeated = groups.iter().filter(|g| g.count > 1).count();
    if repeated > 0 {
        eprintln!("  Warning: {repeated} Reynolds numbers occur more than once; averaging them");
    }

    let mut tables = vec![];
    for (col, field) in arg.fields.iter().enumerate() {
        let mut table = TsvTable::new(format!(
            "{}_over_reynolds_{}",
            field.quantity, field.probe
        ));
        for group in &groups {
            table.push_row([Cell::from(group.key), Cell::from(group.mean[col])]);
        }
        tables.push(table);
    }
    Ok(tables)
}
