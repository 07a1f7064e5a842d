use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use flowprobe_data::{
    reader::{self, ReadOptions},
    sample::{self, SampleRow},
};
use serde::{Deserialize, Serialize};

use self::{
    convergence::ConvergenceArg,
    ensemble_convergence::EnsembleConvergenceArg,
    histogram::HistogramArg,
    pipeline::{DefaultConfigArg, RunArg},
    reynolds_sweep::ReynoldsSweepArg,
    velocity_over_time::VelocityOverTimeArg,
};

mod convergence;
mod ensemble_convergence;
mod histogram;
mod pipeline;
mod reynolds_sweep;
mod velocity_over_time;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Which reduction to run
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Per-time mean and standard deviation of probe fields for each ensemble size
    VelocityOverTime(#[clap(flatten)] VelocityOverTimeArg),
    /// Fixed-range histograms of probe fields and the Reynolds number at one time step
    Histogram(#[clap(flatten)] HistogramArg),
    /// Running-mean error against the sample count at one time step
    Convergence(#[clap(flatten)] ConvergenceArg),
    /// Error of ensemble means against the largest ensemble
    EnsembleConvergence(#[clap(flatten)] EnsembleConvergenceArg),
    /// Probe field means over the Reynolds number at one time step
    ReynoldsSweep(#[clap(flatten)] ReynoldsSweepArg),
    /// Run every reduction listed in a JSON pipeline file
    Run(#[clap(flatten)] RunArg),
    /// Print the pipeline that reproduces all reductions with their defaults
    DefaultConfig(#[clap(flatten)] DefaultConfigArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::VelocityOverTime(arg) => velocity_over_time::run(&arg)?,
        Mode::Histogram(arg) => histogram::run(&arg)?,
        Mode::Convergence(arg) => convergence::run(&arg)?,
        Mode::EnsembleConvergence(arg) => ensemble_convergence::run(&arg)?,
        Mode::ReynoldsSweep(arg) => reynolds_sweep::run(&arg)?,
        Mode::Run(arg) => pipeline::run(&arg)?,
        Mode::DefaultConfig(arg) => pipeline::print_default_config(&arg)?,
    }
    Ok(())
}

/// Input and output settings shared by all reductions.
#[derive(Debug, Clone, PartialEq, clap::Args, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub(crate) struct IoArg {
    /// Skip the first line of each input file
    #[arg(long)]
    pub skip_header: bool,

    /// Directory to write the output files into
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,
}

impl Default for IoArg {
    fn default() -> Self {
        Self {
            skip_header: false,
            output_dir: PathBuf::from("."),
        }
    }
}

impl IoArg {
    pub(crate) fn read_samples(&self, path: &Path) -> anyhow::Result<Vec<SampleRow>> {
        eprintln!("Reading {}...", path.display());
        let rows = reader::read_samples(
            path,
            ReadOptions {
                skip_header: self.skip_header,
            },
        )
        .with_context(|| format!("Failed to load samples from {}", path.display()))?;
        eprintln!("  {} rows", rows.len());
        Ok(rows)
    }
}

/// Rows at exactly `time`, failing if there are none.
pub(crate) fn rows_at_time<'a>(
    rows: &'a [SampleRow],
    time: f64,
    path: &Path,
) -> anyhow::Result<Vec<&'a SampleRow>> {
    let selected = sample::at_time(rows, time).collect::<Vec<_>>();
    if selected.is_empty() {
        anyhow::bail!("No rows at t = {time:?} in {}", path.display());
    }
    eprintln!("  {} rows at t = {time:?}", selected.len());
    Ok(selected)
}
