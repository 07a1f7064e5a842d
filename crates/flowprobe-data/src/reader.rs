//! Parsing of the solver's probe CSV
//!
//! Rows are comma-separated with exactly [`COLUMN_COUNT`] numeric columns.
//! Cells may be padded with whitespace. Blank lines are skipped. Any other
//! deviation aborts the read with the offending line number.

use std::{
    fs::File,
    io,
    num::ParseFloatError,
    path::{Path, PathBuf},
};

use csv::{Position, ReaderBuilder, StringRecord, Trim};

use crate::sample::{COLUMN_COUNT, SampleRow};

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ParseRowError {
    #[display("expected {} columns, found {found}", COLUMN_COUNT)]
    ColumnCount { found: usize },
    #[display("column {column} is not a number: {text:?}")]
    InvalidNumber {
        column: usize,
        text: String,
        source: ParseFloatError,
    },
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ReadSamplesError {
    #[display("failed to open {}", path.display())]
    Open { path: PathBuf, source: io::Error },
    #[display("failed to read {}:{line}", path.display())]
    Read {
        path: PathBuf,
        line: u64,
        source: csv::Error,
    },
    #[display("malformed row at {}:{line}", path.display())]
    Row {
        path: PathBuf,
        line: u64,
        source: ParseRowError,
    },
}

/// Options for reading a sample file.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReadOptions {
    /// Drop the first line (`ID, RE, T, X00, ...` as written by the solver).
    pub skip_header: bool,
}

fn csv_reader<R>(reader: R, options: ReadOptions) -> csv::Reader<R>
where
    R: io::Read,
{
    ReaderBuilder::new()
        .has_headers(options.skip_header)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader)
}

/// A line holding nothing but whitespace.
fn is_blank(record: &StringRecord) -> bool {
    record.len() == 1 && record[0].is_empty()
}

fn line_of(position: Option<&Position>) -> u64 {
    position.map_or(0, Position::line)
}

/// Converts one CSV record into a row.
pub fn parse_record(record: &StringRecord) -> Result<SampleRow, ParseRowError> {
    if record.len() != COLUMN_COUNT {
        return Err(ParseRowError::ColumnCount {
            found: record.len(),
        });
    }
    let mut columns = [0.0; COLUMN_COUNT];
    for (column, (slot, text)) in columns.iter_mut().zip(record).enumerate() {
        *slot = text
            .parse()
            .map_err(|source| ParseRowError::InvalidNumber {
                column,
                text: text.to_owned(),
                source,
            })?;
    }
    Ok(SampleRow::from_columns(&columns))
}

/// Parses all rows from `reader`, reporting errors against `path`.
///
/// # Examples
///
/// ```
/// use std::path::Path;
///
/// use flowprobe_data::reader::{ReadOptions, parse_samples};
///
/// let input = "0, 1.0e3, 50.0, 0.5, 0.1, 0.01, 0.0, 0.0, \
///              0.5, 0.5, -0.04, 0.0, 0.0, 0.5, 0.9, -0.05, 0.0, 0.0\n";
/// let rows = parse_samples(input.as_bytes(), Path::new("mc.csv"), ReadOptions::default())
///     .unwrap();
/// assert_eq!(rows[0].reynolds, 1000.0);
/// assert_eq!(rows[0].probes[2].u, -0.05);
/// ```
pub fn parse_samples<R>(
    reader: R,
    path: &Path,
    options: ReadOptions,
) -> Result<Vec<SampleRow>, ReadSamplesError>
where
    R: io::Read,
{
    let mut reader = csv_reader(reader, options);
    let mut record = StringRecord::new();
    let mut rows = vec![];
    loop {
        let more = reader
            .read_record(&mut record)
            .map_err(|source| ReadSamplesError::Read {
                path: path.to_owned(),
                line: line_of(source.position()),
                source,
            })?;
        if !more {
            break;
        }
        if is_blank(&record) {
            continue;
        }
        let row = parse_record(&record).map_err(|source| ReadSamplesError::Row {
            path: path.to_owned(),
            line: line_of(record.position()),
            source,
        })?;
        rows.push(row);
    }
    Ok(rows)
}

/// Reads every row of a sample file into memory.
pub fn read_samples<P>(path: P, options: ReadOptions) -> Result<Vec<SampleRow>, ReadSamplesError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ReadSamplesError::Open {
        path: path.to_owned(),
        source,
    })?;
    parse_samples(file, path, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW: &str = "7,1500.0,50.0,0.5,0.1,0.012,0.001,0.2,0.5,0.5,-0.04,0.002,0.3,0.5,0.9,-0.05,0.003,0.4";

    fn record(line: &str) -> StringRecord {
        csv_reader(line.as_bytes(), ReadOptions::default())
            .records()
            .next()
            .unwrap()
            .unwrap()
    }

    fn parse(input: &str, options: ReadOptions) -> Result<Vec<SampleRow>, ReadSamplesError> {
        parse_samples(input.as_bytes(), Path::new("mc.csv"), options)
    }

    #[test]
    fn test_parse_record() {
        let row = parse_record(&record(ROW)).unwrap();
        assert_eq!(row.id, 7.0);
        assert_eq!(row.reynolds, 1500.0);
        assert_eq!(row.time, 50.0);
        assert_eq!(row.probes[0].u, 0.012);
        assert_eq!(row.probes[1].u, -0.04);
        assert_eq!(row.probes[2].v, 0.003);
    }

    #[test]
    fn test_cells_with_padding() {
        let padded = format!("{}\n", ROW.replace(',', ", "));
        let rows = parse(&padded, ReadOptions::default()).unwrap();
        assert_eq!(rows, [parse_record(&record(ROW)).unwrap()]);
    }

    #[test]
    fn test_wrong_column_count() {
        assert_eq!(
            parse_record(&record("1,2,3")),
            Err(ParseRowError::ColumnCount { found: 3 })
        );
        let long = format!("{ROW},1.0");
        assert_eq!(
            parse_record(&record(&long)),
            Err(ParseRowError::ColumnCount { found: 19 })
        );
    }

    #[test]
    fn test_non_numeric_cell() {
        let bad = ROW.replacen("1500.0", "abc", 1);
        let err = parse_record(&record(&bad)).unwrap_err();
        assert!(matches!(
            err,
            ParseRowError::InvalidNumber { column: 1, ref text, .. } if text == "abc"
        ));
        assert!(parse_record(&record(&ROW.replacen('7', "", 1))).is_err());
    }

    #[test]
    fn test_parse_samples_reports_line() {
        let input = format!("{ROW}\n\n{ROW}\n1,2\n");
        let err = parse(&input, ReadOptions::default()).unwrap_err();
        match err {
            ReadSamplesError::Row { line, ref path, .. } => {
                assert_eq!(line, 4);
                assert_eq!(path, Path::new("mc.csv"));
            }
            _ => panic!("unexpected error: {err}"),
        }
        assert_eq!(err.to_string(), "malformed row at mc.csv:4");
    }

    #[test]
    fn test_blank_lines_skipped() {
        let input = format!("\n{ROW}\n   \n\n{ROW}\n");
        let rows = parse(&input, ReadOptions::default()).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_skip_header() {
        let input = format!("ID, RE, T, X00, Y00, U00, V00, P00\n{ROW}\n{ROW}\n");
        assert!(parse(&input, ReadOptions::default()).is_err());
        let rows = parse(&input, ReadOptions { skip_header: true }).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn test_invalid_utf8() {
        let mut input = ROW.as_bytes().to_vec();
        input.extend_from_slice(b"\n\xff,\xfe\n");
        let err = parse_samples(input.as_slice(), Path::new("mc.csv"), ReadOptions::default())
            .unwrap_err();
        assert!(matches!(err, ReadSamplesError::Read { .. }), "{err}");
        assert!(err.to_string().starts_with("failed to read mc.csv:"), "{err}");
    }

    #[test]
    fn test_missing_file() {
        let err = read_samples("/nonexistent/flowprobe/mc_2000.csv", ReadOptions::default())
            .unwrap_err();
        assert!(matches!(err, ReadSamplesError::Open { .. }));
        assert!(err.to_string().contains("mc_2000.csv"));
    }
}
