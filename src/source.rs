use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{QuizError, Result};

/// Lists the identifiers of candidate recordings. Order is not significant;
/// the catalog sorts what it receives.
pub trait CatalogSource {
    fn list(&self) -> Result<Vec<PathBuf>>;

    /// Location reported back to the user when nothing is found.
    fn location(&self) -> PathBuf;
}

/// Files with a given extension directly inside a directory.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
    extension: String,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(dir: P, extension: &str) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(&self.extension))
    }
}

impl CatalogSource for DirectorySource {
    fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Err(QuizError::SourceDirectoryMissing(self.dir.clone()));
        }

        let unreadable = |source: io::Error| QuizError::SourceUnreadable {
            path: self.dir.clone(),
            source,
        };

        let mut found = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(unreadable)? {
            let path = entry.map_err(unreadable)?.path();
            if path.is_file() && self.matches(&path) {
                found.push(path);
            }
        }
        Ok(found)
    }

    fn location(&self) -> PathBuf {
        self.dir.clone()
    }
}

/// A fixed listing, for demos and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticSource(pub Vec<PathBuf>);

impl CatalogSource for StaticSource {
    fn list(&self) -> Result<Vec<PathBuf>> {
        Ok(self.0.clone())
    }

    fn location(&self) -> PathBuf {
        PathBuf::new()
    }
}

/// Common name of the species, taken from the file name up to the first digit.
///
/// `sounds/American Robin 03 Song.mp3` becomes `American Robin`. Names
/// without any digit fall back to the whole file stem.
pub fn display_name(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    match stem.find(|c: char| c.is_ascii_digit()) {
        Some(idx) if !stem[..idx].trim().is_empty() => stem[..idx].trim().to_string(),
        _ => stem.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use tempfile::tempdir;

    #[test]
    fn display_name_stops_at_first_digit() {
        assert_eq!(
            display_name(Path::new("sounds/American Robin 03 Song.mp3")),
            "American Robin"
        );
        assert_eq!(display_name(Path::new("Blue Jay1.mp3")), "Blue Jay");
    }

    #[test]
    fn display_name_without_digit_uses_stem() {
        assert_eq!(display_name(Path::new("sounds/ Killdeer .mp3")), "Killdeer");
        assert_eq!(display_name(Path::new("sounds/042.mp3")), "042");
    }

    #[test]
    fn lists_only_matching_extension() {
        let dir = tempdir().unwrap();
        for name in ["a 01.mp3", "b 02.MP3", "notes.txt", "c 03.wav"] {
            fs::write(dir.path().join(name), b"").unwrap();
        }
        fs::create_dir(dir.path().join("nested.mp3")).unwrap();

        let mut names: Vec<String> = DirectorySource::new(dir.path(), ".mp3")
            .list()
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["a 01.mp3", "b 02.MP3"]);
    }

    #[test]
    fn missing_directory_is_reported() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("sounds");
        assert_matches!(
            DirectorySource::new(&missing, "mp3").list(),
            Err(QuizError::SourceDirectoryMissing(p)) if p == missing
        );
    }
}
