//! Integration tests for the .nwb ZIP container
//!
//! These tests verify:
//! 1. The mimetype entry comes first and is stored
//! 2. Parquet datasets are stored uncompressed in the ZIP
//! 3. Backend compression settings reach the Parquet column chunks
//! 4. Sample data and timing survive a write/read cycle

use bytes::Bytes;
use chrono::DateTime;
use nwbconv::nwb::{BackendConfiguration, NwbFile, NwbIo, SeriesData, TimeSeries, Timing};
use parquet::basic::Compression;
use parquet::file::reader::{FileReader, SerializedFileReader};
use std::fs::File;
use std::io::Read;
use tempfile::tempdir;
use zip::ZipArchive;

fn build_file() -> NwbFile {
    let start = DateTime::parse_from_rfc3339("2020-10-09T21:19:09+02:00").unwrap();
    let mut nwbfile = NwbFile::new("container-test", "container layout", start);

    let values: Vec<f64> = (0..2_000).map(|i| (i % 17) as f64).collect();
    let series = TimeSeries::new(
        "Microphone",
        SeriesData::new(2, values).unwrap(),
        Timing::Rate { rate: 44_100.0, starting_time: 1.5 },
    );
    nwbfile.add_acquisition(series).unwrap();

    let cue = TimeSeries::new(
        "Cue",
        SeriesData::single_channel(vec![1.0, 0.0, 1.0]),
        Timing::Timestamps { values: vec![0.25, 0.5, 4.0] },
    );
    nwbfile.add_stimulus(cue).unwrap();
    nwbfile
}

#[test]
fn test_container_structure() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("layout.nwb");
    let nwbfile = build_file();
    NwbIo::write(&nwbfile, &path, &BackendConfiguration::from_nwbfile(&nwbfile)).unwrap();

    let mut archive = ZipArchive::new(File::open(&path).unwrap()).unwrap();

    let mut mimetype = archive.by_index(0).unwrap();
    assert_eq!(mimetype.name(), "mimetype");
    assert_eq!(mimetype.compression(), zip::CompressionMethod::Stored);
    let mut content = String::new();
    mimetype.read_to_string(&mut content).unwrap();
    assert_eq!(content, "application/x-nwb+zip");
    drop(mimetype);

    assert!(archive.by_name("nwbfile.json").is_ok());
    for entry in ["acquisition/Microphone/data.parquet", "stimulus/Cue/data.parquet"] {
        let file = archive.by_name(entry).unwrap();
        assert_eq!(file.compression(), zip::CompressionMethod::Stored, "{entry}");
    }
}

#[test]
fn test_global_compression_reaches_parquet() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gzip.nwb");
    let nwbfile = build_file();

    let mut backend = BackendConfiguration::from_nwbfile(&nwbfile);
    backend.apply_global_compression("gzip", Some(6)).unwrap();
    NwbIo::write(&nwbfile, &path, &backend).unwrap();

    let mut archive = ZipArchive::new(File::open(&path).unwrap()).unwrap();
    let mut entry = archive.by_name("acquisition/Microphone/data.parquet").unwrap();
    let mut buffer = Vec::new();
    entry.read_to_end(&mut buffer).unwrap();

    let reader = SerializedFileReader::new(Bytes::from(buffer)).unwrap();
    let column = reader.metadata().row_group(0).column(0);
    assert!(matches!(column.compression(), Compression::GZIP(_)));
}

#[test]
fn test_samples_and_timing_survive() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cycle.nwb");
    let nwbfile = build_file();
    NwbIo::write(&nwbfile, &path, &BackendConfiguration::from_nwbfile(&nwbfile)).unwrap();

    let read = NwbIo::read(&path).unwrap();
    assert_eq!(read, nwbfile);
    assert_eq!(read.acquisition["Microphone"].starting_time(), Some(1.5));
    assert_eq!(
        read.stimulus["Cue"].timing,
        Timing::Timestamps { values: vec![0.25, 0.5, 4.0] }
    );

    let hierarchy = NwbIo::read_hierarchy(&path).unwrap();
    assert_eq!(hierarchy.acquisition["Microphone"].data.num_frames, 1_000);
    assert!(hierarchy.acquisition["Microphone"].data.values.is_empty());
}
