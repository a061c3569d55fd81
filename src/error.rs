use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::ItemHandle;

/// Failures surfaced by the quiz core to its caller.
///
/// Per-item metadata problems never show up here: they are folded into the
/// validation report (see [`crate::metadata::MetadataError`]).
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("the folder \"{}\" is missing; it should contain the sound files used in the quiz", .0.display())]
    SourceDirectoryMissing(PathBuf),

    #[error("could not list sound files in \"{}\": {source}", path.display())]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no sound files found in \"{}\"", .0.display())]
    NoItemsFound(PathBuf),

    #[error("none of the {checked} sound files have the required metadata")]
    AllItemsInvalid { checked: usize },

    #[error("cannot select from an empty working set")]
    EmptyWorkingSet,

    #[error("unknown item handle {0:?}")]
    UnknownItem(ItemHandle),

    #[error("no item is currently selected")]
    NoCurrentItem,

    #[error("responses are only accepted once the image is revealed")]
    NotRevealed,
}

pub type Result<T, E = QuizError> = std::result::Result<T, E>;
