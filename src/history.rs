//! Persistent log of visited working directories backing `cdh`.
//!
//! The log is a plain text file with one path per line, oldest first. It is
//! not locked: two shells sharing one file may interleave their writes.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Size-bounded, file-backed list of visited directories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryHistory {
    path: PathBuf,
    capacity: usize,
}

impl DirectoryHistory {
    pub fn new(path: PathBuf, capacity: usize) -> Self {
        Self { path, capacity }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `dir` to the log, then cut the file down to the last `capacity` lines.
    pub fn record(&self, dir: &Path) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("can't open history {}", self.path.display()))?;
        writeln!(file, "{}", dir.display())?;
        drop(file);

        let lines = self.load()?;
        let keep_from = lines.len().saturating_sub(self.capacity);
        let mut contents = String::new();
        for line in &lines[keep_from..] {
            contents.push_str(line);
            contents.push('\n');
        }
        fs::write(&self.path, contents)
            .with_context(|| format!("can't rewrite history {}", self.path.display()))?;
        tracing::debug!(dir = %dir.display(), kept = lines.len() - keep_from, "recorded directory");
        Ok(())
    }

    /// Read every stored directory, oldest first. A missing file is an empty history.
    pub fn load(&self) -> Result<Vec<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(contents.lines().map(str::to_string).collect()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => {
                Err(e).with_context(|| format!("can't read history {}", self.path.display()))
            }
        }
    }
}
