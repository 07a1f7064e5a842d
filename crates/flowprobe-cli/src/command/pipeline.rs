//! JSON pipelines
//!
//! A pipeline lists reductions with their full settings. `run` executes each
//! job in order and stops at the first failure; `default-config` prints the
//! pipeline that regenerates every result directory from `CSV/`.

use std::path::PathBuf;

use anyhow::Context;
use flowprobe_data::sample::{Field, Probe, Quantity};
use serde::{Deserialize, Serialize};

use crate::{
    command::{
        IoArg,
        convergence::{self, ConvergenceArg},
        ensemble_convergence::{self, EnsembleConvergenceArg},
        histogram::{self, HistogramArg},
        reynolds_sweep::{self, ReynoldsSweepArg},
        velocity_over_time::{self, VelocityOverTimeArg},
    },
    util::{self, Output},
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct RunArg {
    /// Pipeline config file (JSON)
    config: PathBuf,
}

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct DefaultConfigArg {
    /// Output file path (stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct PipelineConfig {
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "kebab-case")]
pub(crate) enum Job {
    VelocityOverTime(VelocityOverTimeArg),
    Histogram(HistogramArg),
    Convergence(ConvergenceArg),
    EnsembleConvergence(EnsembleConvergenceArg),
    ReynoldsSweep(ReynoldsSweepArg),
}

impl Job {
    fn name(&self) -> &'static str {
        match self {
            Job::VelocityOverTime(_) => "velocity-over-time",
            Job::Histogram(_) => "histogram",
            Job::Convergence(_) => "convergence",
            Job::EnsembleConvergence(_) => "ensemble-convergence",
            Job::ReynoldsSweep(_) => "reynolds-sweep",
        }
    }

    fn io(&self) -> &IoArg {
        match self {
            Job::VelocityOverTime(arg) => &arg.io,
            Job::Histogram(arg) => &arg.io,
            Job::Convergence(arg) => &arg.io,
            Job::EnsembleConvergence(arg) => &arg.io,
            Job::ReynoldsSweep(arg) => &arg.io,
        }
    }

    fn run(&self) -> anyhow::Result<()> {
        match self {
            Job::VelocityOverTime(arg) => velocity_over_time::run(arg),
            Job::Histogram(arg) => histogram::run(arg),
            Job::Convergence(arg) => convergence::run(arg),
            Job::EnsembleConvergence(arg) => ensemble_convergence::run(arg),
            Job::ReynoldsSweep(arg) => reynolds_sweep::run(arg),
        }
    }
}

pub(crate) fn run(arg: &RunArg) -> anyhow::Result<()> {
    let RunArg { config } = arg;
    let pipeline: PipelineConfig = util::read_json_file("pipeline", config)?;
    let total = pipeline.jobs.len();
    for (i, job) in pipeline.jobs.iter().enumerate() {
        eprintln!(
            "[{}/{total}] {} -> {}",
            i + 1,
            job.name(),
            job.io().output_dir.display()
        );
        job.run()
            .with_context(|| format!("Job {} ({}) failed", i + 1, job.name()))?;
    }
    eprintln!("Finished {total} jobs");
    Ok(())
}

pub(crate) fn print_default_config(arg: &DefaultConfigArg) -> anyhow::Result<()> {
    let DefaultConfigArg { output } = arg;
    Output::save_json(&default_pipeline(), output.clone())
}

fn io_in(dir: &str) -> IoArg {
    IoArg {
        output_dir: PathBuf::from(dir),
        ..IoArg::default()
    }
}

/// One job per result directory, reading from `CSV/` next to them.
pub(crate) fn default_pipeline() -> PipelineConfig {
    const EQ_INPUT: &str = "CSV/eq_{n}.csv";
    const MC_INPUT: &str = "CSV/mc_2000.csv";
    let u_fields = Probe::ALL
        .iter()
        .map(|p| Field::new(Quantity::U, *p))
        .collect::<Vec<_>>();

    let jobs = vec![
        Job::VelocityOverTime(VelocityOverTimeArg {
            input: EQ_INPUT.to_owned(),
            io: io_in("Geschw_ueber_Zeit_EQ"),
            ..VelocityOverTimeArg::default()
        }),
        Job::Histogram(HistogramArg {
            input: MC_INPUT.to_owned(),
            io: io_in("Histogramm_MC"),
            ..HistogramArg::default()
        }),
        Job::Convergence(ConvergenceArg {
            input: MC_INPUT.to_owned(),
            bounds: vec![],
            io: io_in("Konvergenz"),
            ..ConvergenceArg::default()
        }),
        Job::Convergence(ConvergenceArg {
            input: MC_INPUT.to_owned(),
            fields: u_fields,
            io: io_in("Konvergenz_MC"),
            ..ConvergenceArg::default()
        }),
        Job::EnsembleConvergence(EnsembleConvergenceArg {
            input: EQ_INPUT.to_owned(),
            io: io_in("Konvergenz_EQ"),
            ..EnsembleConvergenceArg::default()
        }),
        Job::ReynoldsSweep(ReynoldsSweepArg {
            input: MC_INPUT.to_owned(),
            io: io_in("Reynolds_Geschw_Plot"),
            ..ReynoldsSweepArg::default()
        }),
    ];
    PipelineConfig { jobs }
}

#[cfg(test)]
mod tests {
    use flowprobe_stats::convergence::TheoryBound;

    use super::*;
    use crate::testing::{self, TempDir};

    #[test]
    fn test_default_pipeline_round_trip() {
        let pipeline = default_pipeline();
        let json = serde_json::to_string_pretty(&pipeline).unwrap();
        let parsed: PipelineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, pipeline);
        assert_eq!(parsed.jobs.len(), 6);
    }

    #[test]
    fn test_missing_settings_use_defaults() {
        let json = r#"{
            "jobs": [
                { "command": "histogram", "nr-bins": 4, "output-dir": "hist" },
                { "command": "convergence", "bounds": [] }
            ]
        }"#;
        let pipeline: PipelineConfig = serde_json::from_str(json).unwrap();
        let Job::Histogram(hist) = &pipeline.jobs[0] else {
            panic!("unexpected job {:?}", pipeline.jobs[0]);
        };
        assert_eq!(hist.nr_bins, 4);
        assert_eq!(hist.input, histogram::INPUT);
        assert_eq!(hist.io.output_dir, PathBuf::from("hist"));
        assert!(!hist.io.skip_header);

        let Job::Convergence(conv) = &pipeline.jobs[1] else {
            panic!("unexpected job {:?}", pipeline.jobs[1]);
        };
        assert!(conv.bounds.is_empty());
        assert_eq!(conv.fields, convergence::FIELDS);
    }

    #[test]
    fn test_bound_and_field_encoding() {
        let json = r#"{
            "command": "convergence",
            "fields": ["v_p2"],
            "bounds": [{ "kind": "linear", "coefficient": 0.5 }]
        }"#;
        let job: Job = serde_json::from_str(json).unwrap();
        let Job::Convergence(conv) = &job else {
            panic!("unexpected job {job:?}");
        };
        assert_eq!(conv.fields, ["v_p2".parse::<Field>().unwrap()]);
        assert_eq!(conv.bounds, ["linear:0.5".parse::<TheoryBound>().unwrap()]);
    }

    #[test]
    fn test_unknown_command() {
        let json = r#"{ "jobs": [{ "command": "fourier" }] }"#;
        assert!(serde_json::from_str::<PipelineConfig>(json).is_err());
    }

    #[test]
    fn test_run_pipeline() {
        let dir = TempDir::new("pipeline-run");
        let lines = vec![
            testing::sample_line(0, 1000.0, 50.0, [1.0; 3], [0.0; 3]),
            testing::sample_line(1, 2000.0, 50.0, [3.0; 3], [0.0; 3]),
        ];
        testing::write_lines(&dir.join("mc.csv"), &lines);

        let pipeline = PipelineConfig {
            jobs: vec![
                Job::ReynoldsSweep(ReynoldsSweepArg {
                    input: dir.join("mc.csv").display().to_string(),
                    io: IoArg {
                        output_dir: dir.join("sweep"),
                        ..IoArg::default()
                    },
                    ..ReynoldsSweepArg::default()
                }),
                Job::Convergence(ConvergenceArg {
                    input: dir.join("mc.csv").display().to_string(),
                    io: IoArg {
                        output_dir: dir.join("conv"),
                        ..IoArg::default()
                    },
                    ..ConvergenceArg::default()
                }),
            ],
        };
        let config = dir.join("pipeline.json");
        Output::save_json(&pipeline, Some(config.clone())).unwrap();

        run(&RunArg { config }).unwrap();
        let sweep = testing::read_table(&dir.join("sweep").join("u_over_reynolds_p1"));
        assert_eq!(testing::parse_column(&sweep, 1), [1.0, 3.0]);
        let conv = testing::read_table(&dir.join("conv").join("conv_v_p3"));
        assert_eq!(conv.len(), 2);
    }

    #[test]
    fn test_run_stops_at_failing_job() {
        let dir = TempDir::new("pipeline-fail");
        let config = dir.join("pipeline.json");
        let pipeline = PipelineConfig {
            jobs: vec![Job::Histogram(HistogramArg {
                input: dir.join("absent.csv").display().to_string(),
                ..HistogramArg::default()
            })],
        };
        Output::save_json(&pipeline, Some(config.clone())).unwrap();

        let err = run(&RunArg { config }).unwrap_err();
        assert!(format!("{err:#}").contains("Job 1 (histogram)"), "{err:#}");
    }
}
