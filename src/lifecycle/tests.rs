use super::*;
use crate::nwb::{NwbIo, SeriesData, TimeSeries, Timing};
use serde_json::json;
use tempfile::tempdir;

fn metadata() -> MetadataDocument {
    MetadataDocument::from_value(json!({
        "NWBFile": {
            "session_start_time": "2021-06-01T09:00:00+00:00",
            "session_description": "lifecycle test",
            "identifier": "lifecycle-1",
            "notes": "first run"
        }
    }))
    .unwrap()
}

fn series(name: &str) -> TimeSeries {
    TimeSeries::new(
        name,
        SeriesData::single_channel(vec![1.0, 2.0, 3.0]),
        Timing::Rate { rate: 10.0, starting_time: 0.0 },
    )
}

#[test]
fn test_create_without_path_stays_in_memory() {
    let nwbfile = make_or_load_nwbfile::<_, NwbError>(RunOptions::in_memory(), &metadata(), |nwbfile| {
        nwbfile.add_acquisition(series("A"))
    })
    .unwrap();

    assert_eq!(nwbfile.identifier, "lifecycle-1");
    assert_eq!(nwbfile.notes.as_deref(), Some("first run"));
    assert!(nwbfile.acquisition.contains_key("A"));
}

#[test]
fn test_created_file_requires_start_time() {
    let metadata = MetadataDocument::from_value(json!({"NWBFile": {}})).unwrap();
    let result = make_or_load_nwbfile::<_, NwbError>(RunOptions::in_memory(), &metadata, |_| Ok(()));
    assert!(matches!(result, Err(NwbError::MissingField(_))));
}

#[test]
fn test_append_keeps_prior_content() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("append.nwb");

    make_or_load_nwbfile::<_, NwbError>(RunOptions::to_path(&path), &metadata(), |nwbfile| {
        nwbfile.add_acquisition(series("A"))
    })
    .unwrap();

    let mut later = metadata();
    later.set_nwbfile_field("notes", "second run");
    make_or_load_nwbfile::<_, NwbError>(RunOptions::to_path(&path), &later, |nwbfile| {
        nwbfile.add_acquisition(series("B"))
    })
    .unwrap();

    let read = NwbIo::read(&path).unwrap();
    assert!(read.acquisition.contains_key("A"));
    assert!(read.acquisition.contains_key("B"));
    // file-level fields of an opened container are not touched
    assert_eq!(read.notes.as_deref(), Some("first run"));
}

#[test]
fn test_overwrite_discards_prior_content() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("overwrite.nwb");

    make_or_load_nwbfile::<_, NwbError>(RunOptions::to_path(&path), &metadata(), |nwbfile| {
        nwbfile.add_acquisition(series("A"))
    })
    .unwrap();
    make_or_load_nwbfile::<_, NwbError>(
        RunOptions::to_path(&path).with_overwrite(true),
        &metadata(),
        |nwbfile| nwbfile.add_acquisition(series("B")),
    )
    .unwrap();

    let read = NwbIo::read(&path).unwrap();
    assert!(!read.acquisition.contains_key("A"));
    assert!(read.acquisition.contains_key("B"));
}

#[test]
fn test_failed_write_leaves_prior_file_untouched() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("failed.nwb");

    make_or_load_nwbfile::<_, NwbError>(RunOptions::to_path(&path), &metadata(), |nwbfile| {
        nwbfile.add_acquisition(series("A"))
    })
    .unwrap();
    let before = std::fs::read(&path).unwrap();

    let result = make_or_load_nwbfile::<_, NwbError>(RunOptions::to_path(&path), &metadata(), |nwbfile| {
        nwbfile.add_acquisition(series("C"))?;
        // same name again: already populated target
        nwbfile.add_acquisition(series("A"))
    });

    assert!(matches!(result, Err(NwbError::DuplicateName { .. })));
    assert_eq!(std::fs::read(&path).unwrap(), before);
    let leftovers = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(leftovers, 1);
}

#[test]
fn test_failed_new_file_is_not_created() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("never.nwb");

    let result = make_or_load_nwbfile::<_, NwbError>(RunOptions::to_path(&path), &metadata(), |_| {
        Err(NwbError::InvalidData("interface failed".into()))
    });

    assert!(result.is_err());
    assert!(!path.exists());
}

#[test]
fn test_in_memory_file_conflicts_with_existing_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("exists.nwb");
    std::fs::write(&path, b"placeholder").unwrap();

    let in_memory = NwbFile::from_metadata(&metadata()).unwrap();
    let options = RunOptions::to_path(&path).with_nwbfile(in_memory);
    assert!(NwbFileHandle::acquire(options, &metadata()).is_err());
}

#[test]
fn test_handle_state_machine() {
    let mut handle = NwbFileHandle::acquire(RunOptions::in_memory(), &metadata()).unwrap();
    assert_eq!(handle.state(), HandleState::Created);

    // content cannot be written before metadata is applied
    assert!(handle.nwbfile_mut().is_err());
    assert!(handle.mark_content_written().is_err());

    handle.apply_metadata(&metadata()).unwrap();
    assert_eq!(handle.state(), HandleState::MetadataApplied);
    handle.nwbfile_mut().unwrap().add_stimulus(series("S")).unwrap();
    handle.mark_content_written().unwrap();
    assert_eq!(handle.state(), HandleState::ContentWritten);

    let nwbfile = handle.release().unwrap();
    assert!(nwbfile.stimulus.contains_key("S"));
}

#[test]
fn test_release_requires_content_written() {
    let handle = NwbFileHandle::acquire(RunOptions::in_memory(), &metadata()).unwrap();
    assert!(handle.release().is_err());
}

#[test]
fn test_backend_configuration_is_remapped() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("remap.nwb");

    // configuration prepared against a different build of the same layout
    let mut template = NwbFile::from_metadata(&metadata()).unwrap();
    template.add_acquisition(series("A")).unwrap();
    let mut backend = crate::nwb::BackendConfiguration::from_nwbfile(&template);
    backend.apply_global_compression("snappy", None).unwrap();

    let options = RunOptions::to_path(&path).with_backend_configuration(backend);
    make_or_load_nwbfile::<_, NwbError>(options, &metadata(), |nwbfile| {
        nwbfile.add_acquisition(series("A"))
    })
    .unwrap();

    assert_eq!(NwbIo::read(&path).unwrap().acquisition["A"].data.values, vec![1.0, 2.0, 3.0]);
}
