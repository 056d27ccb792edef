use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

/// Newline-delimited list of accepted raster paths.
#[derive(Debug, Clone)]
pub struct SelectionList {
    path: PathBuf,
}

impl SelectionList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Entries in file order; an absent file is an empty list.
    pub fn load(&self) -> Result<Vec<PathBuf>> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("reading selection list {:?}", self.path))?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect())
    }

    /// Appends one entry. Duplicates are kept.
    pub fn append(&self, entry: &Path) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening selection list {:?}", self.path))?;
        writeln!(file, "{}", entry.display())?;
        Ok(())
    }

    /// Rewrites the file without any line naming `entry`. No-op when the
    /// file does not exist.
    pub fn remove(&self, entry: &Path) -> Result<()> {
        if !self.exists() {
            return Ok(());
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("reading selection list {:?}", self.path))?;
        let needle = entry.display().to_string();
        let kept: String = content
            .split_inclusive('\n')
            .filter(|line| line.trim() != needle)
            .collect();
        fs::write(&self.path, kept)
            .with_context(|| format!("rewriting selection list {:?}", self.path))?;
        Ok(())
    }
}
