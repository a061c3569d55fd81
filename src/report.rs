use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use itertools::Itertools;

use crate::metadata::InvalidReason;

const HEADER_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One item left out of the quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exclusion {
    pub path: PathBuf,
    pub reason: InvalidReason,
}

/// Outcome of a validation pass over the whole catalog.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub generated_at: DateTime<Local>,
    pub checked: usize,
    pub exclusions: Vec<Exclusion>,
}

impl ValidationReport {
    pub fn new(checked: usize) -> Self {
        Self {
            generated_at: Local::now(),
            checked,
            exclusions: Vec::new(),
        }
    }

    pub fn eligible(&self) -> usize {
        self.checked - self.exclusions.len()
    }

    pub fn has_exclusions(&self) -> bool {
        !self.exclusions.is_empty()
    }

    pub fn reason_for(&self, path: &Path) -> Option<InvalidReason> {
        self.exclusions
            .iter()
            .find(|e| e.path == path)
            .map(|e| e.reason)
    }

    /// Overwrite `path` with this report.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_string())
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Sound files with missing metadata on {}",
            self.generated_at.format(HEADER_TIMESTAMP_FORMAT)
        )?;
        writeln!(
            f,
            "Note that these sound files will be excluded from the quiz.\n"
        )?;
        if self.has_exclusions() {
            let lines = self
                .exclusions
                .iter()
                .map(|e| format!("{}: {}", e.path.display(), e.reason))
                .join("\n");
            writeln!(f, "{lines}")?;
        }
        Ok(())
    }
}
