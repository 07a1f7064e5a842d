//! Velocity over time
//!
//! For each equidistant ensemble, groups rows by simulation time and writes
//! the mean and sample standard deviation of each field per time step.
//! Both are divided by the configured ensemble size rather than the number
//! of rows found for a time step.

use anyhow::Context;
use flowprobe_data::sample::{Field, GroupKey, Probe, Quantity};
use flowprobe_stats::{Divisor, grouped::GroupedSamples};
use serde::{Deserialize, Serialize};

use crate::{
    command::IoArg,
    util::{self, Cell, TsvTable},
};

pub(crate) const ENSEMBLE_SIZES: [usize; 3] = [50, 100, 200];
pub(crate) const INPUT_PATTERN: &str = "../CSV/eq_{n}.csv";
pub(crate) const FIELDS: [Field; 3] = [
    Field::new(Quantity::U, Probe::P1),
    Field::new(Quantity::U, Probe::P2),
    Field::new(Quantity::U, Probe::P3),
];

#[derive(Debug, Clone, PartialEq, clap::Args, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct VelocityOverTimeArg {
    /// Ensemble sizes to reduce, one input file each
    #[arg(long, value_delimiter = ',', default_values_t = ENSEMBLE_SIZES)]
    pub samples: Vec<usize>,

    /// Input path; `{n}` is replaced by the ensemble size
    #[arg(long, default_value = INPUT_PATTERN)]
    pub input: String,

    /// Fields to reduce (comma-separated, e.g. u_p1,v_p2)
    #[arg(long, value_delimiter = ',', default_values_t = FIELDS)]
    pub fields: Vec<Field>,

    #[command(flatten)]
    #[serde(flatten)]
    pub io: IoArg,
}

impl Default for VelocityOverTimeArg {
    fn default() -> Self {
        Self {
            samples: ENSEMBLE_SIZES.to_vec(),
            input: INPUT_PATTERN.to_owned(),
            fields: FIELDS.to_vec(),
            io: IoArg::default(),
        }
    }
}

pub(crate) fn run(arg: &VelocityOverTimeArg) -> anyhow::Result<()> {
    let tables = reduce(arg)?;
    util::write_tables(&arg.io.output_dir, &tables)
}

pub(crate) fn reduce(arg: &VelocityOverTimeArg) -> anyhow::Result<Vec<TsvTable>> {
    let mut tables = vec![];
    for &n in &arg.samples {
        let path = util::dataset_path(&arg.input, n);
        let rows = arg.io.read_samples(&path)?;

        let mut grouped = GroupedSamples::new(arg.fields.len());
        for row in &rows {
            let values = arg.fields.iter().map(|f| row.value(*f)).collect::<Vec<_>>();
            grouped.push(row.key(GroupKey::Time), &values);
        }

        let groups = grouped
            .moments(Divisor::Fixed(n))
            .with_context(|| format!("Failed to reduce {}", path.display()))?;
        eprintln!("  {} time steps", groups.len());
        for group in groups.iter().filter(|g| g.count != n) {
            eprintln!(
                "  Warning: t = {:?} has {} rows, dividing by ensemble size {n}",
                group.key, group.count
            );
        }

        for (col, field) in arg.fields.iter().enumerate() {
            let mut table = TsvTable::new(format!(
                "eq_{n}_{}_over_time_{}",
                field.quantity, field.probe
            ));
            for group in &groups {
                let std_dev = group.std_dev.as_ref().map_or(f64::NAN, |s| s[col]);
                table.push_row([
                    Cell::from(group.key),
                    Cell::from(group.mean[col]),
                    Cell::from(std_dev),
                ]);
            }
            tables.push(table);
        }
    }
    Ok(tables)
}
