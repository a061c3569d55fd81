pub mod audio;

use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

pub use audio::AudioPlayer;

#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("could not start player: {0}")]
    Spawn(#[from] io::Error),

    #[error("could not open \"{}\": {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not decode \"{}\": {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: symphonia::core::errors::Error,
    },

    #[error("\"{}\" contains no audio", .0.display())]
    NoAudio(PathBuf),

    #[error("no audio output device available")]
    NoOutputDevice,

    #[error("audio device configuration: {0}")]
    OutputConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("could not build audio stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("could not start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("unsupported output sample format {0:?}")]
    UnsupportedSampleFormat(cpal::SampleFormat),
}

/// Plays recordings on behalf of the quiz. Starting a new recording stops
/// the previous one.
pub trait Player {
    fn play(&mut self, path: &Path) -> Result<(), PlayerError>;
    fn stop(&mut self);
}

/// Runs an external program (for example `mpg123 -q`) with the file
/// path appended as the last argument.
#[derive(Debug)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
    child: Option<Child>,
}

impl CommandPlayer {
    /// Build from an argv list; `None` when the list is empty.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
            child: None,
        })
    }

    pub fn is_playing(&mut self) -> bool {
        match self.child.as_mut().map(Child::try_wait) {
            Some(Ok(None)) => true,
            Some(Ok(Some(_))) | Some(Err(_)) | None => false,
        }
    }
}

impl Player for CommandPlayer {
    fn play(&mut self, path: &Path) -> Result<(), PlayerError> {
        self.stop();
        debug!("playing {} with {}", path.display(), self.program);
        let child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        self.child = Some(child);
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(err) = child.kill() {
                // already exited
                debug!("stopping player: {err}");
            }
            if let Err(err) = child.wait() {
                warn!("reaping player process: {err}");
            }
        }
    }
}

impl Drop for CommandPlayer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Player used when audio is disabled or no output device can be opened.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayer;

impl Player for SilentPlayer {
    fn play(&mut self, _path: &Path) -> Result<(), PlayerError> {
        Ok(())
    }

    fn stop(&mut self) {}
}

/// Which player the configuration asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerKind {
    Silent,
    Command(Vec<String>),
    Device,
}

impl PlayerKind {
    pub fn for_config(config: &Config) -> Self {
        if !config.audio {
            return Self::Silent;
        }
        match &config.player {
            Some(argv) if !argv.is_empty() => Self::Command(argv.clone()),
            _ => Self::Device,
        }
    }

    /// Build the player. A device that cannot be opened degrades to
    /// silence so the quiz stays usable.
    pub fn open(self) -> Box<dyn Player> {
        match self {
            Self::Silent => Box::new(SilentPlayer),
            Self::Command(argv) => match CommandPlayer::from_argv(&argv) {
                Some(player) => Box::new(player),
                None => Box::new(SilentPlayer),
            },
            Self::Device => match AudioPlayer::open() {
                Ok(player) => Box::new(player),
                Err(err) => {
                    warn!("audio disabled: {err}");
                    Box::new(SilentPlayer)
                }
            },
        }
    }
}

pub fn from_config(config: &Config) -> Box<dyn Player> {
    PlayerKind::for_config(config).open()
}
