//! Embedded recording metadata: reading it from audio files and deciding
//! whether an item carries everything the quiz needs.
//!
//! A recording qualifies when it has an embedded picture and an English
//! comment frame holding a semicolon separated record:
//!
//! ```text
//! <latin name>; <recording place>; <recording artist>; <recording id>
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use id3::{Tag, TagLike};
use thiserror::Error;

/// Names of the annotation fields, indexed by ordinal.
pub const FIELD_NAMES: [&str; 4] = [
    "latin name",
    "recording place",
    "recording artist",
    "recording id",
];

/// Language code of the comment frame that carries the annotation record.
const ANNOTATION_LANG: &str = "eng";

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to read tags from {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: id3::Error,
    },
}

/// Embedded picture payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// What the metadata collaborator found in one file, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMetadata {
    pub image: Option<Image>,
    pub annotation: Option<String>,
}

/// The validated annotation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemDetails {
    pub latin_name: String,
    pub recording_place: String,
    pub recording_artist: String,
    pub recording_id: String,
}

impl ItemDetails {
    pub fn fields(&self) -> [&str; 4] {
        [
            &self.latin_name,
            &self.recording_place,
            &self.recording_artist,
            &self.recording_id,
        ]
    }

    /// Credits line shown once the answer is revealed.
    pub fn credits(&self) -> String {
        format!(
            "Recorded in {} by {}",
            self.recording_place, self.recording_artist
        )
    }

    /// Public catalog page for the recording, if the id carries an asset number.
    pub fn recording_url(&self) -> Option<String> {
        let digits: String = self
            .recording_id
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        if digits.is_empty() {
            None
        } else {
            Some(format!("https://macaulaylibrary.org/asset/{digits}"))
        }
    }
}

/// Why an item was excluded. Exactly one reason is recorded per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidReason {
    MissingImage,
    MissingMetadataBlock,
    /// Zero-based ordinal of the first absent annotation field.
    MissingField(usize),
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::MissingImage => write!(f, "missing image"),
            InvalidReason::MissingMetadataBlock => write!(f, "missing required metadata block"),
            InvalidReason::MissingField(ordinal) => {
                write!(f, "missing individual metadata field at ordinal {ordinal}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid(ItemDetails),
    Invalid(InvalidReason),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }
}

/// Classify one item's metadata. Pure; the caller decides what to do with
/// invalid items.
pub fn validate(raw: &RawMetadata) -> ValidationOutcome {
    if raw.image.is_none() {
        return ValidationOutcome::Invalid(InvalidReason::MissingImage);
    }
    let Some(annotation) = raw.annotation.as_deref() else {
        return ValidationOutcome::Invalid(InvalidReason::MissingMetadataBlock);
    };
    match parse_annotation(annotation) {
        Ok(details) => ValidationOutcome::Valid(details),
        Err(reason) => ValidationOutcome::Invalid(reason),
    }
}

/// Split the annotation record into its four fields. Blank fields count as
/// missing.
pub fn parse_annotation(annotation: &str) -> Result<ItemDetails, InvalidReason> {
    let parts: Vec<&str> = annotation.split(';').map(str::trim).collect();

    if let Some(ordinal) =
        (0..FIELD_NAMES.len()).find(|&i| parts.get(i).map_or(true, |p| p.is_empty()))
    {
        return Err(InvalidReason::MissingField(ordinal));
    }

    Ok(ItemDetails {
        latin_name: parts[0].to_string(),
        recording_place: parts[1].to_string(),
        recording_artist: parts[2].to_string(),
        recording_id: parts[3].to_string(),
    })
}

/// Source of embedded metadata for an item identifier.
pub trait MetadataReader {
    fn read(&self, path: &Path) -> Result<RawMetadata, MetadataError>;
}

impl<F> MetadataReader for F
where
    F: Fn(&Path) -> Result<RawMetadata, MetadataError>,
{
    fn read(&self, path: &Path) -> Result<RawMetadata, MetadataError> {
        self(path)
    }
}

/// Production reader backed by the `id3` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct Id3Reader;

impl MetadataReader for Id3Reader {
    fn read(&self, path: &Path) -> Result<RawMetadata, MetadataError> {
        let tag = match Tag::read_from_path(path) {
            Ok(tag) => tag,
            // untagged files simply have nothing to offer
            Err(err) if matches!(err.kind, id3::ErrorKind::NoTag) => {
                return Ok(RawMetadata::default())
            }
            Err(source) => {
                return Err(MetadataError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let image = tag.pictures().next().map(|picture| Image {
            mime_type: picture.mime_type.clone(),
            data: picture.data.clone(),
        });
        let annotation = tag
            .comments()
            .find(|c| c.lang.eq_ignore_ascii_case(ANNOTATION_LANG) && c.description.is_empty())
            .map(|c| c.text.clone());

        Ok(RawMetadata { image, annotation })
    }
}
