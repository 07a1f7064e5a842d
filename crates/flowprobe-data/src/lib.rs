//! Probe sample rows written by the cavity flow solver.
//!
//! Each row holds the Reynolds number and simulation time of one ensemble
//! member together with position, velocity and pressure at three probes.
//!
//! - [`sample`]: Row layout, field selection and grouping keys
//! - [`reader`]: CSV parsing with line-level error reporting

pub mod reader;
pub mod sample;
