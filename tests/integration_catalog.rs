mod common;

use std::fs;

use assert_matches::assert_matches;
use chirp::catalog::ItemCatalog;
use chirp::metadata::{Id3Reader, InvalidReason};
use chirp::source::DirectorySource;
use chirp::QuizError;
use common::{write_recording, FULL_RECORD};
use tempfile::tempdir;

// Tagged files on disk flow through listing, id3 reading, validation and the
// report file exactly as they do in the binary.
#[test]
fn validates_tagged_directory_and_writes_report() {
    let dir = tempdir().unwrap();
    let sounds = dir.path().join("sounds");
    fs::create_dir(&sounds).unwrap();

    write_recording(&sounds.join("American Robin 01.mp3"), Some(FULL_RECORD), true);
    write_recording(&sounds.join("Blue Jay 02.mp3"), Some(FULL_RECORD), false);
    write_recording(&sounds.join("Carolina Wren 03.mp3"), None, true);
    write_recording(
        &sounds.join("Downy Woodpecker 04.mp3"),
        Some("Dryobates pubescens; Ithaca, NY"),
        true,
    );
    write_recording(
        &sounds.join("Eastern Phoebe 05.mp3"),
        Some("Sayornis phoebe; Ithaca, NY; J. Doe"),
        true,
    );
    write_recording(&sounds.join("Fox Sparrow 06.mp3"), None, false);
    fs::write(sounds.join("README.txt"), "not a recording").unwrap();

    let mut catalog = ItemCatalog::build(&DirectorySource::new(&sounds, "mp3")).unwrap();
    assert_eq!(catalog.items().len(), 6);

    let report = catalog.run_validation_pass(&Id3Reader).unwrap();
    let reasons: Vec<(String, InvalidReason)> = report
        .exclusions
        .iter()
        .map(|e| {
            (
                e.path.file_name().unwrap().to_string_lossy().into_owned(),
                e.reason,
            )
        })
        .collect();
    assert_eq!(
        reasons,
        vec![
            ("Blue Jay 02.mp3".to_string(), InvalidReason::MissingImage),
            (
                "Carolina Wren 03.mp3".to_string(),
                InvalidReason::MissingMetadataBlock
            ),
            (
                "Downy Woodpecker 04.mp3".to_string(),
                InvalidReason::MissingField(2)
            ),
            (
                "Eastern Phoebe 05.mp3".to_string(),
                InvalidReason::MissingField(3)
            ),
            ("Fox Sparrow 06.mp3".to_string(), InvalidReason::MissingImage),
        ]
    );

    assert_eq!(catalog.remaining(), 1);
    let robin = catalog.item(catalog.working_set()[0]).unwrap();
    assert_eq!(robin.name, "American Robin");
    assert_eq!(robin.details.as_ref().unwrap().latin_name, "Turdus migratorius");
    assert_eq!(robin.image.as_ref().unwrap().mime_type, "image/jpeg");

    let log = dir.path().join("sounds-check.log");
    report.write_to(&log).unwrap();
    let written = fs::read_to_string(&log).unwrap();
    assert!(written.starts_with("Sound files with missing metadata on "));
    assert_eq!(
        written
            .lines()
            .filter(|l| l.contains(".mp3: "))
            .count(),
        5
    );
}

#[test]
fn empty_directory_signals_no_items() {
    let dir = tempdir().unwrap();
    assert_matches!(
        ItemCatalog::build(&DirectorySource::new(dir.path(), "mp3")),
        Err(QuizError::NoItemsFound(_))
    );
}

#[test]
fn untagged_directory_is_all_invalid() {
    let dir = tempdir().unwrap();
    write_recording(&dir.path().join("Killdeer 01.mp3"), None, false);
    write_recording(&dir.path().join("Sora 02.mp3"), None, false);

    let mut catalog = ItemCatalog::build(&DirectorySource::new(dir.path(), "mp3")).unwrap();
    assert_matches!(
        catalog.run_validation_pass(&Id3Reader),
        Err(QuizError::AllItemsInvalid { checked: 2 })
    );
}
