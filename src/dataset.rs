//! Bundled sample datasets.
//!
//! Two CSV files ship next to the service and can be analyzed without an
//! upload. They are resolved relative to the configured base directory.

use std::fmt;
use std::path::{Path, PathBuf};

/// File name of the clean sample dataset.
pub const CLEAN_DATASET_FILE: &str = "clean_dataset.csv";

/// File name of the dirty sample dataset.
pub const DIRTY_DATASET_FILE: &str = "dirty_dataset.csv";

/// One of the fixed sample datasets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleDataset {
    Clean,
    Dirty,
}

impl SampleDataset {
    pub fn file_name(self) -> &'static str {
        match self {
            SampleDataset::Clean => CLEAN_DATASET_FILE,
            SampleDataset::Dirty => DIRTY_DATASET_FILE,
        }
    }

    /// Full path of this dataset under `base_dir`.
    pub fn path(self, base_dir: &Path) -> PathBuf {
        base_dir.join(self.file_name())
    }
}

impl fmt::Display for SampleDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleDataset::Clean => f.write_str("clean"),
            SampleDataset::Dirty => f.write_str("dirty"),
        }
    }
}
