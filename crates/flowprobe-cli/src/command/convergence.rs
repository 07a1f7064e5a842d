//! Monte-Carlo convergence
//!
//! Takes the rows at one time step in file order and writes, per field, the
//! error of the running mean after `i` samples against the mean of all
//! samples, optionally followed by theory bound columns.

use std::path::Path;

use anyhow::Context;
use flowprobe_data::sample::{Field, Probe, Quantity};
use flowprobe_stats::convergence::{BoundKind, ConvergenceSeries, TheoryBound};
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
pub(crate) const MONTE_CARLO_BOUND: TheoryBound = TheoryBound {
    kind: BoundKind::Sqrt,
    coefficient: 0.01,
};

#[derive(Debug, Clone, PartialEq, clap::Args, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct ConvergenceArg {
    /// Input CSV file
    #[arg(long, default_value = INPUT)]
    pub input: String,

    /// Simulation time to select rows at
    #[arg(long, default_value_t = TIME)]
    pub time: f64,

    /// Fields to estimate (comma-separated)
    #[arg(long, value_delimiter = ',', default_values_t = FIELDS)]
    pub fields: Vec<Field>,

    /// Theory bounds written next to the error, as kind:coefficient
    /// (kind is sqrt, linear or quadratic)
    #[arg(long = "bound", value_delimiter = ',', default_values_t = [MONTE_CARLO_BOUND])]
    pub bounds: Vec<TheoryBound>,

    /// Do not write any theory bound column
    #[arg(long, conflicts_with = "bounds")]
    #[serde(skip)]
    pub no_bound: bool,

    /// Expected number of rows at the selected time; a mismatch is reported
    #[arg(long)]
    pub samples: Option<usize>,

    #[command(flatten)]
    #[serde(flatten)]
    pub io: IoArg,
}

impl Default for ConvergenceArg {
    fn default() -> Self {
        Self {
            input: INPUT.to_owned(),
            time: TIME,
            fields: FIELDS.to_vec(),
            bounds: vec![MONTE_CARLO_BOUND],
            no_bound: false,
            samples: None,
            io: IoArg::default(),
        }
    }
}

impl ConvergenceArg {
    fn active_bounds(&self) -> &[TheoryBound] {
        if self.no_bound { &[] } else { &self.bounds }
    }
}

pub(crate) fn run(arg: &ConvergenceArg) -> anyhow::Result<()> {
    let tables = reduce(arg)?;
    util::write_tables(&arg.io.output_dir, &tables)
}

pub(crate) fn reduce(arg: &ConvergenceArg) -> anyhow::Result<Vec<TsvTable>> {
    let path = Path::new(&arg.input);
    let rows = arg.io.read_samples(path)?;
    let rows = command::rows_at_time(&rows, arg.time, path)?;
    if let Some(expected) = arg.samples
        && expected != rows.len()
    {
        eprintln!(
            "  Warning: expected {expected} samples, found {}",
            rows.len()
        );
    }

    let bounds = arg.active_bounds();
    let mut tables = vec![];
    for field in &arg.fields {
        let values = rows.iter().map(|row| row.value(*field)).collect::<Vec<_>>();
        let series = ConvergenceSeries::from_values(&values)
            .with_context(|| format!("Failed to estimate convergence of {field}"))?;
        eprintln!("  {field}: overall mean {:?}", series.overall_mean);

        let mut table = TsvTable::new(format!("conv_{field}"));
        for (i, error) in series.points() {
            table.push_row(
                [Cell::from(i), Cell::from(error)]
                    .into_iter()
                    .chain(bounds.iter().map(|b| Cell::from(b.eval(i)))),
            );
        }
        tables.push(table);
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, TempDir};

    fn arg_for(dir: &TempDir) -> ConvergenceArg {
        ConvergenceArg {
            input: dir.join("mc.csv").display().to_string(),
            io: IoArg {
                output_dir: dir.join("out"),
                ..IoArg::default()
            },
            ..ConvergenceArg::default()
        }
    }

    fn write_input(dir: &TempDir) {
        let lines = vec![
            testing::sample_line(0, 1100.0, 50.0, [4.0, 1.0, 0.0], [0.1; 3]),
            testing::sample_line(1, 1200.0, 10.0, [100.0; 3], [0.1; 3]),
            testing::sample_line(2, 1300.0, 50.0, [0.0, 1.0, 0.0], [0.2; 3]),
            testing::sample_line(3, 1400.0, 50.0, [2.0, 1.0, 0.0], [0.3; 3]),
        ];
        testing::write_lines(&dir.join("mc.csv"), &lines);
    }

    #[test]
    fn test_error_series_with_bound() {
        let dir = TempDir::new("convergence-bound");
        write_input(&dir);
        let arg = arg_for(&dir);
        run(&arg).unwrap();

        let table = testing::read_table(&arg.io.output_dir.join("conv_u_p1"));
        assert_eq!(table.len(), 3);
        assert_eq!(
            table.iter().map(|row| row[0].as_str()).collect::<Vec<_>>(),
            ["1", "2", "3"]
        );
        assert_eq!(testing::parse_column(&table, 1), [2.0, 0.0, 0.0]);
        assert_eq!(testing::parse_column(&table, 2)[0], 0.01);

        let p2 = testing::read_table(&arg.io.output_dir.join("conv_u_p2"));
        assert_eq!(testing::parse_column(&p2, 1), [0.0; 3]);
    }

    #[test]
    fn test_last_error_is_zero() {
        let dir = TempDir::new("convergence-last");
        write_input(&dir);
        let arg = ConvergenceArg {
            fields: vec!["v_p3".parse().unwrap()],
            no_bound: true,
            ..arg_for(&dir)
        };
        let tables = reduce(&arg).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name(), "conv_v_p3");

        run(&arg).unwrap();
        let table = testing::read_table(&arg.io.output_dir.join("conv_v_p3"));
        assert!(table.iter().all(|row| row.len() == 2));
        assert_eq!(table[2][1], "0.0");
    }

    #[test]
    fn test_several_bounds() {
        let dir = TempDir::new("convergence-bounds");
        write_input(&dir);
        let arg = ConvergenceArg {
            fields: vec!["u_p1".parse().unwrap()],
            bounds: vec!["linear:2".parse().unwrap(), "quadratic:4".parse().unwrap()],
            ..arg_for(&dir)
        };
        run(&arg).unwrap();
        let table = testing::read_table(&arg.io.output_dir.join("conv_u_p1"));
        assert_eq!(table[1][2..], ["1.0", "1.0"]);
    }

    #[test]
    fn test_missing_time_step() {
        let dir = TempDir::new("convergence-missing");
        write_input(&dir);
        let arg = ConvergenceArg {
            time: 51.0,
            ..arg_for(&dir)
        };
        let err = reduce(&arg).unwrap_err();
        assert!(err.to_string().contains("No rows at t = 51.0"), "{err}");
    }
}
