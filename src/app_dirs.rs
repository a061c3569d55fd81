use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn state_dir() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            Some(
                PathBuf::from(home)
                    .join(".local")
                    .join("state")
                    .join("chirp"),
            )
        } else {
            ProjectDirs::from("", "", "chirp").map(|proj_dirs| proj_dirs.data_local_dir().into())
        }
    }

    /// Where the TUI writes its tracing output.
    pub fn log_path() -> Option<PathBuf> {
        Self::state_dir().map(|dir| dir.join("chirp.log"))
    }
}
