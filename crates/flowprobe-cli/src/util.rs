use std::{
    fmt,
    fs::{self, File},
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)
    }

    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, &value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

/// A value in a tab-separated output line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    /// Printed in shortest round-trip form, keeping `.0` on integral values.
    Float(f64),
    Count(u64),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Float(value) => write!(f, "{value:?}"),
            Cell::Count(count) => write!(f, "{count}"),
        }
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

impl From<u64> for Cell {
    fn from(count: u64) -> Self {
        Cell::Count(count)
    }
}

impl From<usize> for Cell {
    fn from(count: usize) -> Self {
        Cell::Count(count as u64)
    }
}

/// An output file of `<key>\t<value>...` lines, built in memory.
#[derive(Debug, Clone, PartialEq)]
pub struct TsvTable {
    name: String,
    content: String,
    rows: usize,
}

impl TsvTable {
    pub fn new<S>(name: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            name: name.into(),
            content: String::new(),
            rows: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn push_row<I>(&mut self, cells: I)
    where
        I: IntoIterator<Item = Cell>,
    {
        let line = cells
            .into_iter()
            .map(|cell| cell.to_string())
            .collect::<Vec<_>>()
            .join("\t");
        self.content.push_str(&line);
        self.content.push('\n');
        self.rows += 1;
    }
}

/// Writes every table into `dir`, replacing existing files.
///
/// All tables are first written to hidden temporary files. Nothing is
/// replaced unless every write succeeded. If moving a file into place fails,
/// the tables before it have already been replaced; the remaining temporary
/// files are removed and the rest keep their previous content.
pub fn write_tables(dir: &Path, tables: &[TsvTable]) -> anyhow::Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let mut staged = vec![];
    for table in tables {
        let tmp_path = dir.join(format!(".{}.tmp", table.name()));
        let written = fs::write(&tmp_path, &table.content);
        staged.push(tmp_path);
        if let Err(e) = written {
            remove_staged(&staged);
            return Err(e).with_context(|| {
                format!(
                    "Failed to write output file: {}",
                    dir.join(table.name()).display()
                )
            });
        }
    }

    for (i, (tmp_path, table)) in staged.iter().zip(tables).enumerate() {
        let path = dir.join(table.name());
        if let Err(e) = fs::rename(tmp_path, &path) {
            remove_staged(&staged[i..]);
            return Err(e)
                .with_context(|| format!("Failed to move output into place: {}", path.display()));
        }
        eprintln!("  Wrote {} ({} lines)", path.display(), table.rows());
    }

    Ok(())
}

fn remove_staged(paths: &[PathBuf]) {
    for path in paths {
        let _ = fs::remove_file(path);
    }
}

/// Substitutes the sample count into an input path pattern such as `../CSV/eq_{n}.csv`.
pub fn dataset_path(pattern: &str, samples: usize) -> PathBuf {
    PathBuf::from(pattern.replace("{n}", &samples.to_string()))
}
