use super::*;
use crate::metadata::MetadataDocument;
use chrono::{DateTime, FixedOffset};
use serde_json::{json, Map};
use std::io::Cursor;
use tempfile::tempdir;

fn start_time() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339("2020-11-03T10:35:10-08:00").unwrap()
}

fn sample_file() -> NwbFile {
    let mut nwbfile = NwbFile::new("file-1", "unit test session", start_time());
    nwbfile
        .add_device(Device {
            name: "Neuralynx".into(),
            description: Some("Cheetah 6.4".into()),
            manufacturer: None,
        })
        .unwrap();
    nwbfile
        .add_electrode_group(ElectrodeGroup {
            name: "tetrode1".into(),
            description: "tetrode".into(),
            location: "CA1".into(),
            device: "Neuralynx".into(),
        })
        .unwrap();
    let e0 = nwbfile.add_electrode("CSC1", "tetrode1", Map::new()).unwrap();
    let e1 = nwbfile.add_electrode("CSC2", "tetrode1", Map::new()).unwrap();

    let data = SeriesData::new(2, vec![1.0, 10.0, 2.0, 20.0, 3.0, 30.0]).unwrap();
    let series = TimeSeries::new("ElectricalSeries", data, Timing::Rate { rate: 32000.0, starting_time: 0.0 })
        .with_neurodata_type(NeurodataType::ElectricalSeries)
        .with_unit("volts")
        .with_scaling(1e-6, 0.0)
        .with_channel_conversion(vec![0.5, 0.5])
        .with_electrodes(vec![e0, e1]);
    nwbfile.add_acquisition(series).unwrap();

    let timestamps = Timing::Timestamps { values: vec![0.0, 0.1, 0.3] };
    let stimulus = TimeSeries::new("Tone", SeriesData::single_channel(vec![0.0, 1.0, -1.0]), timestamps);
    nwbfile.add_stimulus(stimulus).unwrap();

    let lfp = TimeSeries::new(
        "ElectricalSeriesLFP",
        SeriesData::single_channel(vec![5.0; 4]),
        Timing::Rate { rate: 1000.0, starting_time: 2.5 },
    );
    nwbfile
        .processing_module("ecephys", "Processed extracellular electrophysiology data.")
        .add_series("LFP", "LFP", lfp)
        .unwrap();
    nwbfile
}

#[test]
fn test_series_data_shape() {
    let data = SeriesData::new(2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
    assert_eq!(data.num_frames, 3);
    assert_eq!(data.channel(1), vec![2.0, 4.0, 6.0]);
    assert_eq!(data.truncated(2).values, vec![1.0, 2.0, 3.0, 4.0]);
    assert_eq!(data.truncated(100).num_frames, 3);

    assert!(SeriesData::new(2, vec![1.0, 2.0, 3.0]).is_err());
    assert!(SeriesData::new(0, vec![]).is_err());
}

#[test]
fn test_duplicate_names_rejected() {
    let mut nwbfile = sample_file();
    let again = TimeSeries::new(
        "ElectricalSeries",
        SeriesData::single_channel(vec![1.0]),
        Timing::Rate { rate: 1.0, starting_time: 0.0 },
    );

    let err = nwbfile.add_acquisition(again).unwrap_err();
    assert!(matches!(err, NwbError::DuplicateName { ref namespace, ref name }
        if namespace == "acquisition" && name == "ElectricalSeries"));
}

#[test]
fn test_electrode_group_requires_device() {
    let mut nwbfile = NwbFile::new("id", "desc", start_time());
    let err = nwbfile
        .add_electrode_group(ElectrodeGroup {
            name: "g".into(),
            description: "d".into(),
            location: "unknown".into(),
            device: "missing".into(),
        })
        .unwrap_err();
    assert!(err.to_string().contains("missing"));
}

#[test]
fn test_find_electrode() {
    let nwbfile = sample_file();
    assert_eq!(nwbfile.find_electrode("CSC2", "tetrode1"), Some(1));
    assert_eq!(nwbfile.find_electrode("CSC2", "other"), None);
}

#[test]
fn test_series_locations() {
    let nwbfile = sample_file();
    let locations: Vec<String> = nwbfile.series().into_iter().map(|(l, _)| l).collect();
    assert_eq!(
        locations,
        vec![
            "acquisition/ElectricalSeries",
            "stimulus/Tone",
            "processing/ecephys/LFP/ElectricalSeriesLFP",
        ]
    );
}

#[test]
fn test_validate_catches_bad_electrode_reference() {
    let mut nwbfile = sample_file();
    if let Some(series) = nwbfile.acquisition.get_mut("ElectricalSeries") {
        series.electrodes = Some(vec![0, 7]);
    }
    assert!(nwbfile.validate().is_err());
}

#[test]
fn test_from_metadata() {
    let metadata = MetadataDocument::from_value(json!({
        "NWBFile": {
            "session_start_time": "2020-11-03T10:35:10-08:00",
            "session_id": "abc",
            "keywords": ["auditory"]
        },
        "Subject": {"subject_id": "m1", "sex": "F"}
    }))
    .unwrap();

    let nwbfile = NwbFile::from_metadata(&metadata).unwrap();
    assert_eq!(nwbfile.session_description, DEFAULT_SESSION_DESCRIPTION);
    assert!(!nwbfile.identifier.is_empty());
    assert_eq!(nwbfile.session_start_time, start_time());
    assert_eq!(nwbfile.session_id.as_deref(), Some("abc"));
    assert_eq!(nwbfile.extra.get("keywords"), Some(&json!(["auditory"])));
    assert_eq!(nwbfile.subject.unwrap().get("subject_id"), Some(&json!("m1")));
}

#[test]
fn test_from_metadata_requires_start_time() {
    let metadata = MetadataDocument::from_value(json!({"NWBFile": {"identifier": "x"}})).unwrap();
    assert!(matches!(
        NwbFile::from_metadata(&metadata),
        Err(NwbError::MissingField(field)) if field == "NWBFile.session_start_time"
    ));
}

#[test]
fn test_container_roundtrip_in_memory() {
    let nwbfile = sample_file();
    let backend = BackendConfiguration::from_nwbfile(&nwbfile);

    let mut buffer = Cursor::new(Vec::new());
    NwbIo::write_to(&nwbfile, &mut buffer, &backend).unwrap();
    buffer.set_position(0);
    let read = NwbIo::read_from(buffer).unwrap();

    assert_eq!(read, nwbfile);
}

#[test]
fn test_container_layout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.nwb");
    let nwbfile = sample_file();
    NwbIo::write(&nwbfile, &path, &BackendConfiguration::from_nwbfile(&nwbfile)).unwrap();

    let mut archive = zip::ZipArchive::new(std::fs::File::open(&path).unwrap()).unwrap();
    let names: Vec<String> = archive.file_names().map(String::from).collect();
    assert!(names.contains(&"acquisition/ElectricalSeries/data.parquet".to_string()));
    assert!(names.contains(&"processing/ecephys/LFP/ElectricalSeriesLFP/data.parquet".to_string()));

    let first = archive.by_index(0).unwrap();
    assert_eq!(first.name(), "mimetype");
    assert_eq!(first.compression(), zip::CompressionMethod::Stored);
}

#[test]
fn test_read_rejects_foreign_archive() {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buffer);
        zip.start_file("mimetype", zip::write::SimpleFileOptions::default()).unwrap();
        std::io::Write::write_all(&mut zip, b"application/zip").unwrap();
        zip.finish().unwrap();
    }
    buffer.set_position(0);
    assert!(matches!(NwbIo::read_from(buffer), Err(NwbError::InvalidFormat(_))));
}

#[test]
fn test_entry_preallocation_is_capped() {
    assert_eq!(super::io::preallocation(1_024), 1_024);
    assert_eq!(super::io::preallocation(u64::MAX), 64 * 1024 * 1024);
}

#[test]
fn test_backend_defaults() {
    let nwbfile = sample_file();
    let backend = BackendConfiguration::from_nwbfile(&nwbfile);

    let configuration = backend.get("acquisition/ElectricalSeries/data").unwrap();
    assert_eq!(configuration.full_shape, [3, 2]);
    assert_eq!(configuration.chunk_frames, 3);
    assert_eq!(configuration.compression_method, CompressionMethod::Zstd);
    assert_eq!(configuration.compression_level, Some(DEFAULT_COMPRESSION_LEVEL));
    assert_eq!(backend.dataset_configurations.len(), 3);
}

#[test]
fn test_apply_global_compression() {
    let nwbfile = sample_file();
    let mut backend = BackendConfiguration::from_nwbfile(&nwbfile);

    backend.apply_global_compression("gzip", Some(4)).unwrap();
    assert!(backend
        .dataset_configurations
        .values()
        .all(|c| c.compression_method == CompressionMethod::Gzip && c.compression_level == Some(4)));

    let err = backend.apply_global_compression("blosc", None).unwrap_err();
    match err {
        NwbError::UnsupportedCompression { method, available } => {
            assert_eq!(method, "blosc");
            assert!(available.contains(&"zstd".to_string()));
        }
        other => panic!("unexpected error: {other}"),
    }

    let mut buffer = Cursor::new(Vec::new());
    NwbIo::write_to(&nwbfile, &mut buffer, &backend).unwrap();
}

#[test]
fn test_chunk_validation() {
    let nwbfile = sample_file();
    let mut backend = BackendConfiguration::from_nwbfile(&nwbfile);
    if let Some(configuration) = backend
        .dataset_configurations
        .get_mut("acquisition/ElectricalSeries/data")
    {
        configuration.chunk_frames = 50;
    }
    assert!(backend.validate().is_err());

    let mut buffer = Cursor::new(Vec::new());
    assert!(NwbIo::write_to(&nwbfile, &mut buffer, &backend).is_err());
}

#[test]
fn test_remapping_after_rebuild() {
    let original = sample_file();
    let mut backend = BackendConfiguration::from_nwbfile(&original);
    backend.apply_global_compression("snappy", None).unwrap();

    // Same layout, fresh object ids
    let rebuilt = sample_file();
    let remapped = backend.find_locations_requiring_remapping(&rebuilt).unwrap();
    assert_eq!(remapped.len(), 3);

    let updated = backend.build_remapped_backend(remapped);
    let configuration = updated.get("stimulus/Tone/data").unwrap();
    assert_eq!(configuration.object_id, rebuilt.stimulus["Tone"].object_id);
    assert_eq!(configuration.compression_method, CompressionMethod::Snappy);

    assert!(updated.find_locations_requiring_remapping(&rebuilt).unwrap().is_empty());
}

#[test]
fn test_remapping_rejects_unknown_layout() {
    let original = sample_file();
    let backend = BackendConfiguration::from_nwbfile(&original);

    let mut renamed = sample_file();
    if let Some(series) = renamed.stimulus.remove("Tone") {
        renamed.add_stimulus(TimeSeries { name: "Chirp".into(), ..series }).unwrap();
    }
    assert!(matches!(
        backend.find_locations_requiring_remapping(&renamed),
        Err(NwbError::UnknownLocation(location)) if location == "stimulus/Chirp/data"
    ));

    let empty = NwbFile::new("id", "desc", start_time());
    assert!(backend.find_locations_requiring_remapping(&empty).is_err());
}
