use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::selection::DEFAULT_MAX_REDRAWS;

/// Glyphs used by the terminal front end. The quiz core never reads these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DisplayLabels {
    pub correct: String,
    pub incorrect: String,
    pub remaining: String,
}

impl Default for DisplayLabels {
    fn default() -> Self {
        Self {
            correct: "😀".to_string(),
            incorrect: "😭".to_string(),
            remaining: "🐦".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub sounds_dir: PathBuf,
    pub extension: String,
    pub report_file: PathBuf,
    /// Play recordings at all; off means a silent quiz.
    pub audio: bool,
    /// Program and leading arguments used instead of the built-in decoder.
    pub player: Option<Vec<String>>,
    pub max_redraws: usize,
    pub labels: DisplayLabels,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sounds_dir: PathBuf::from("sounds"),
            extension: "mp3".to_string(),
            report_file: PathBuf::from("sounds-check.log"),
            audio: true,
            player: None,
            max_redraws: DEFAULT_MAX_REDRAWS,
            labels: DisplayLabels::default(),
        }
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> std::io::Result<()>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let path = if let Some(pd) = ProjectDirs::from("", "", "chirp") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("chirp_config.json")
        };
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        if let Ok(bytes) = fs::read(&self.path) {
            match serde_json::from_slice::<Config>(&bytes) {
                Ok(cfg) => return cfg,
                Err(err) => tracing::warn!(
                    "ignoring unreadable config {}: {err}",
                    self.path.display()
                ),
            }
        }
        Config::default()
    }

    fn save(&self, cfg: &Config) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)
    }
}
