use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Number of probes recorded per row.
pub const PROBE_COUNT: usize = 3;

/// Values recorded per probe: `x, y, u, v, p`.
pub const VALUES_PER_PROBE: usize = 5;

/// Columns per row: `id, Re, t` followed by the probe groups.
pub const COLUMN_COUNT: usize = 3 + VALUES_PER_PROBE * PROBE_COUNT;

/// Position, velocity and pressure recorded at one probe.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ProbeSample {
    pub x: f64,
    pub y: f64,
    pub u: f64,
    pub v: f64,
    pub p: f64,
}

/// One line of solver output.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleRow {
    /// Running line id written by the solver. Not used by any reduction.
    pub id: f64,
    pub reynolds: f64,
    pub time: f64,
    pub probes: [ProbeSample; PROBE_COUNT],
}

impl SampleRow {
    /// Builds a row from its 18 column values in file order.
    #[must_use]
    pub fn from_columns(columns: &[f64; COLUMN_COUNT]) -> Self {
        let probes = std::array::from_fn(|i| {
            let base = 3 + VALUES_PER_PROBE * i;
            ProbeSample {
                x: columns[base],
                y: columns[base + 1],
                u: columns[base + 2],
                v: columns[base + 3],
                p: columns[base + 4],
            }
        });
        Self {
            id: columns[0],
            reynolds: columns[1],
            time: columns[2],
            probes,
        }
    }

    #[must_use]
    pub fn probe(&self, probe: Probe) -> &ProbeSample {
        &self.probes[probe.index()]
    }

    #[must_use]
    pub fn value(&self, field: Field) -> f64 {
        let probe = self.probe(field.probe);
        match field.quantity {
            Quantity::X => probe.x,
            Quantity::Y => probe.y,
            Quantity::U => probe.u,
            Quantity::V => probe.v,
            Quantity::P => probe.p,
        }
    }

    #[must_use]
    pub fn key(&self, key: GroupKey) -> f64 {
        match key {
            GroupKey::Time => self.time,
            GroupKey::Reynolds => self.reynolds,
        }
    }
}

/// Rows recorded at exactly `time`, in input order.
pub fn at_time(rows: &[SampleRow], time: f64) -> impl Iterator<Item = &SampleRow> {
    rows.iter().filter(move |row| row.time == time)
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Display,
    derive_more::FromStr,
)]
pub enum Probe {
    #[display("p1")]
    P1,
    #[display("p2")]
    P2,
    #[display("p3")]
    P3,
}

impl Probe {
    pub const ALL: [Self; PROBE_COUNT] = [Self::P1, Self::P2, Self::P3];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::P1 => 0,
            Self::P2 => 1,
            Self::P3 => 2,
        }
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    derive_more::Display,
    derive_more::FromStr,
)]
pub enum Quantity {
    #[display("x")]
    X,
    #[display("y")]
    Y,
    #[display("u")]
    U,
    #[display("v")]
    V,
    #[display("p")]
    P,
}

impl Quantity {
    const fn offset(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::U => 2,
            Self::V => 3,
            Self::P => 4,
        }
    }
}

/// A single column of a probe, written `u_p1`, `v_p3`, ...
///
/// # Examples
///
/// ```
/// use flowprobe_data::sample::{Field, Probe, Quantity};
///
/// let field = "v_p2".parse::<Field>().unwrap();
/// assert_eq!(field, Field::new(Quantity::V, Probe::P2));
/// assert_eq!(field.column(), 11);
/// assert_eq!(field.to_string(), "v_p2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Field {
    pub quantity: Quantity,
    pub probe: Probe,
}

impl Field {
    #[must_use]
    pub const fn new(quantity: Quantity, probe: Probe) -> Self {
        Self { quantity, probe }
    }

    /// Zero-based column of this field in a row.
    #[must_use]
    pub const fn column(self) -> usize {
        3 + VALUES_PER_PROBE * self.probe.index() + self.quantity.offset()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.quantity, self.probe)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("invalid field {text:?}; expected <quantity>_<probe> such as u_p1")]
pub struct ParseFieldError {
    #[error(not(source))]
    pub text: String,
}

impl FromStr for Field {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseFieldError { text: s.to_owned() };
        let (quantity, probe) = s.split_once('_').ok_or_else(err)?;
        Ok(Self {
            quantity: quantity.parse().map_err(|_| err())?,
            probe: probe.parse().map_err(|_| err())?,
        })
    }
}

impl TryFrom<String> for Field {
    type Error = ParseFieldError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Field> for String {
    fn from(field: Field) -> Self {
        field.to_string()
    }
}

/// The column rows are grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    Time,
    Reynolds,
}
