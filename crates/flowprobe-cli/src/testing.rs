use std::{
    env, fs,
    path::{Path, PathBuf},
    process,
};

/// A scratch directory removed on drop.
pub(crate) struct TempDir(PathBuf);

impl TempDir {
    pub(crate) fn new(name: &str) -> Self {
        let path = env::temp_dir().join(format!("flowprobe-{name}-{}", process::id()));
        let _ = fs::remove_dir_all(&path);
        fs::create_dir_all(&path).unwrap();
        Self(path)
    }

    pub(crate) fn path(&self) -> &Path {
        &self.0
    }

    pub(crate) fn join<P>(&self, path: P) -> PathBuf
    where
        P: AsRef<Path>,
    {
        self.0.join(path)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

/// A solver line with the given Reynolds number, time and per-probe `u`/`v`.
///
/// Every probe sits at (0.5, 0.5) with zero pressure.
pub(crate) fn sample_line(id: usize, re: f64, t: f64, u: [f64; 3], v: [f64; 3]) -> String {
    let mut cells = vec![id.to_string(), format!("{re:?}"), format!("{t:?}")];
    for (u, v) in u.iter().zip(&v) {
        cells.extend([
            "0.5".to_owned(),
            "0.5".to_owned(),
            format!("{u:?}"),
            format!("{v:?}"),
            "0.0".to_owned(),
        ]);
    }
    cells.join(", ")
}

pub(crate) fn write_lines(path: &Path, lines: &[String]) {
    let mut content = lines.join("\n");
    content.push('\n');
    fs::write(path, content).unwrap();
}

/// Reads an output file back as tab-separated cells.
pub(crate) fn read_table(path: &Path) -> Vec<Vec<String>> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| line.split('\t').map(str::to_owned).collect())
        .collect()
}

pub(crate) fn parse_column(table: &[Vec<String>], column: usize) -> Vec<f64> {
    table.iter().map(|row| row[column].parse().unwrap()).collect()
}
