//! Convergence across ensemble sizes
//!
//! Reads one input file per ensemble size, averages each field over the rows
//! at one time step (dividing by the ensemble size) and writes the deviation
//! of each ensemble's mean from the mean of the largest ensemble.

use anyhow::Context;
use flowprobe_data::sample::{Field, GroupKey, Probe, Quantity};
use flowprobe_stats::{
    Divisor,
    convergence::{EnsembleConvergence, TheoryBound},
    grouped::GroupedSamples,
};
use serde::{Deserialize, Serialize};

use crate::{
    command::{self, IoArg},
    util::{self, Cell, TsvTable},
};

pub(crate) const ENSEMBLE_SIZES: [usize; 3] = [50, 100, 200];
pub(crate) const INPUT_PATTERN: &str = "../CSV/eq_{n}.csv";
pub(crate) const TIME: f64 = 50.0;
pub(crate) const FIELDS: [Field; 1] = [Field::new(Quantity::U, Probe::P1)];

#[derive(Debug, Clone, PartialEq, clap::Args, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct EnsembleConvergenceArg {
    /// Ensemble sizes to compare; the largest is the reference
    #[arg(long, value_delimiter = ',', default_values_t = ENSEMBLE_SIZES)]
    pub samples: Vec<usize>,

    /// Input path; `{n}` is replaced by the ensemble size
    #[arg(long, default_value = INPUT_PATTERN)]
    pub input: String,

    /// Simulation time to select rows at
    #[arg(long, default_value_t = TIME)]
    pub time: f64,

    /// Fields to compare (comma-separated)
    #[arg(long, value_delimiter = ',', default_values_t = FIELDS)]
    pub fields: Vec<Field>,

    /// Theory bounds evaluated at each ensemble size, as kind:coefficient
    #[arg(long = "bound", value_delimiter = ',')]
    pub bounds: Vec<TheoryBound>,

    #[command(flatten)]
    #[serde(flatten)]
    pub io: IoArg,
}

impl Default for EnsembleConvergenceArg {
    fn default() -> Self {
        Self {
            samples: ENSEMBLE_SIZES.to_vec(),
            input: INPUT_PATTERN.to_owned(),
            time: TIME,
            fields: FIELDS.to_vec(),
            bounds: vec![],
            io: IoArg::default(),
        }
    }
}

pub(crate) fn run(arg: &EnsembleConvergenceArg) -> anyhow::Result<()> {
    let tables = reduce(arg)?;
    util::write_tables(&arg.io.output_dir, &tables)
}

pub(crate) fn reduce(arg: &EnsembleConvergenceArg) -> anyhow::Result<Vec<TsvTable>> {
    if arg.samples.is_empty() {
        anyhow::bail!("No ensemble sizes given");
    }

    // means[field][ensemble] = (size, mean)
    let mut means = vec![vec![]; arg.fields.len()];
    for &n in &arg.samples {
        let path = util::dataset_path(&arg.input, n);
        let rows = arg.io.read_samples(&path)?;
        let rows = command::rows_at_time(&rows, arg.time, &path)?;
        if rows.len() != n {
            eprintln!(
                "  Warning: {} rows at t = {:?}, dividing by ensemble size {n}",
                rows.len(),
                arg.time
            );
        }

        let grouped = GroupedSamples::from_records(
            arg.fields.len(),
            rows.iter().map(|row| {
                let values = arg.fields.iter().map(|f| row.value(*f)).collect::<Vec<_>>();
                (row.key(GroupKey::Time), values)
            }),
        );
        let groups = grouped
            .means(Divisor::Fixed(n))
            .with_context(|| format!("Failed to average {}", path.display()))?;
        for (col, field_means) in means.iter_mut().enumerate() {
            field_means.push((n, groups[0].mean[col]));
        }
    }

    let mut tables = vec![];
    for (field, field_means) in arg.fields.iter().zip(&means) {
        let conv = EnsembleConvergence::from_means(field_means)
            .with_context(|| format!("Failed to compare ensembles of {field}"))?;
        eprintln!(
            "  {field}: reference mean {:?} from {} samples",
            conv.reference_mean, conv.reference_samples
        );

        let mut table = TsvTable::new(format!("conv_{field}"));
        for &(n, error) in &conv.points {
            table.push_row(
                [Cell::from(n), Cell::from(error)]
                    .into_iter()
                    .chain(arg.bounds.iter().map(|b| Cell::from(b.eval(n)))),
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

    fn write_ensemble(dir: &TempDir, n: usize, u: f64) {
        let mut lines = (0..n)
            .map(|i| testing::sample_line(i, 1000.0, TIME, [u, 0.0, 0.0], [0.0; 3]))
            .collect::<Vec<_>>();
        lines.push(testing::sample_line(n, 1000.0, 0.0, [9.0; 3], [0.0; 3]));
        testing::write_lines(&dir.join(format!("eq_{n}.csv")), &lines);
    }

    fn arg_for(dir: &TempDir, samples: Vec<usize>) -> EnsembleConvergenceArg {
        EnsembleConvergenceArg {
            samples,
            input: dir.join("eq_{n}.csv").display().to_string(),
            io: IoArg {
                output_dir: dir.join("out"),
                ..IoArg::default()
            },
            ..EnsembleConvergenceArg::default()
        }
    }

    #[test]
    fn test_three_point_output() {
        let dir = TempDir::new("ensemble-three");
        write_ensemble(&dir, 2, 3.0);
        write_ensemble(&dir, 4, 1.5);
        write_ensemble(&dir, 8, 1.0);

        let arg = arg_for(&dir, vec![8, 2, 4]);
        run(&arg).unwrap();

        let table = testing::read_table(&arg.io.output_dir.join("conv_u_p1"));
        assert_eq!(
            table,
            [["2", "2.0"], ["4", "0.5"], ["8", "0.0"]]
                .iter()
                .map(|row| row.iter().map(|c| (*c).to_owned()).collect::<Vec<_>>())
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_bounds_at_ensemble_size() {
        let dir = TempDir::new("ensemble-bounds");
        write_ensemble(&dir, 2, 3.0);
        write_ensemble(&dir, 4, 1.0);
        let arg = EnsembleConvergenceArg {
            bounds: vec!["linear:8".parse().unwrap(), "quadratic:8".parse().unwrap()],
            ..arg_for(&dir, vec![2, 4])
        };
        let tables = reduce(&arg).unwrap();
        assert_eq!(tables.len(), 1);

        run(&arg).unwrap();
        let table = testing::read_table(&arg.io.output_dir.join("conv_u_p1"));
        assert_eq!(table[0], ["2", "2.0", "4.0", "2.0"]);
        assert_eq!(table[1], ["4", "0.0", "2.0", "0.5"]);
    }

    #[test]
    fn test_divides_by_ensemble_size() {
        let dir = TempDir::new("ensemble-divisor");
        // Only two rows at the selected time, but the file claims four samples.
        let lines = (0..2)
            .map(|i| testing::sample_line(i, 1000.0, TIME, [2.0; 3], [0.0; 3]))
            .collect::<Vec<_>>();
        testing::write_lines(&dir.join("eq_4.csv"), &lines);
        write_ensemble(&dir, 8, 0.0);

        let arg = arg_for(&dir, vec![4, 8]);
        run(&arg).unwrap();
        let table = testing::read_table(&arg.io.output_dir.join("conv_u_p1"));
        assert_eq!(table[0], ["4", "1.0"]);
    }

    #[test]
    fn test_missing_time_step() {
        let dir = TempDir::new("ensemble-missing");
        write_ensemble(&dir, 2, 1.0);
        let arg = EnsembleConvergenceArg {
            time: 7.0,
            ..arg_for(&dir, vec![2])
        };
        assert!(reduce(&arg).is_err());
    }
}
