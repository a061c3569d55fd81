use std::fs;
use std::path::Path;

use id3::frame::{Comment, Picture, PictureType};
use id3::{Tag, TagLike, Version};

/// Write a fake recording carrying the given annotation and, optionally, a
/// cover picture. The audio payload is irrelevant to validation.
pub fn write_recording(path: &Path, annotation: Option<&str>, with_image: bool) {
    fs::write(path, vec![0u8; 128]).unwrap();

    if annotation.is_none() && !with_image {
        return;
    }

    let mut tag = Tag::new();
    if let Some(text) = annotation {
        tag.add_frame(Comment {
            lang: "eng".to_string(),
            description: String::new(),
            text: text.to_string(),
        });
    }
    if with_image {
        tag.add_frame(Picture {
            mime_type: "image/jpeg".to_string(),
            picture_type: PictureType::CoverFront,
            description: String::new(),
            data: vec![0xff, 0xd8, 0xff, 0xe0],
        });
    }
    tag.write_to_path(path, Version::Id3v24).unwrap();
}

pub const FULL_RECORD: &str = "Turdus migratorius; Ithaca, NY; J. Doe; ML12345";
