//! Output directory layout.
//!
//! Everything a run writes lives under `./data`:
//!
//! ```text
//! data/
//!   <table>/data_search/
//!     <table>.csv          raw SELECT * result, 0x1D-delimited, no header
//!     <table>_parsed.csv   header row + the needed-FK columns
//!   graph-info.txt         table lists and emitted \copy commands
//! ```

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Path construction and directory creation for the output tree.
#[derive(Debug, Clone)]
pub struct OutputLayout {
    base: PathBuf,
}

impl OutputLayout {
    /// Create the base output directory (normally `./data`).
    pub fn create(base: impl Into<PathBuf>) -> Result<Self> {
        let base = base.into();
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    /// The base output directory.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// `data/<table>/data_search`, created on demand per table.
    pub fn ensure_table_dir(&self, table: &str) -> Result<PathBuf> {
        let dir = self.base.join(table).join("data_search");
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// `data/<table>/data_search/<table>.csv`
    pub fn raw_csv(&self, table: &str) -> PathBuf {
        self.base
            .join(table)
            .join("data_search")
            .join(format!("{}.csv", table))
    }

    /// `data/<table>/data_search/<table>_parsed.csv`
    pub fn parsed_csv(&self, table: &str) -> PathBuf {
        self.base
            .join(table)
            .join("data_search")
            .join(format!("{}_parsed.csv", table))
    }

    /// `data/graph-info.txt`
    pub fn graph_info(&self) -> PathBuf {
        self.base.join("graph-info.txt")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_follow_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = OutputLayout::create(tmp.path().join("data")).unwrap();

        let dir = layout.ensure_table_dir("users").unwrap();
        assert!(dir.is_dir());
        assert!(layout.raw_csv("users").ends_with("users/data_search/users.csv"));
        assert!(layout
            .parsed_csv("users")
            .ends_with("users/data_search/users_parsed.csv"));
        assert!(layout.graph_info().ends_with("data/graph-info.txt"));
    }
}
