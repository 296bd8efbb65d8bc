use super::*;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn doc(value: Value) -> MetadataDocument {
    MetadataDocument::from_value(value).unwrap()
}

#[test]
fn test_merge_with_empty_is_identity() {
    let base = doc(json!({
        "NWBFile": {"identifier": "abc", "experimenter": ["A", "B"]},
        "Ecephys": {"Device": [{"name": "Device"}]}
    }));

    assert_eq!(base.merged(&MetadataDocument::new()), base);
}

#[test]
fn test_override_wins_at_leaf() {
    let base = doc(json!({"NWBFile": {"session_description": "Auto-generated", "identifier": "abc"}}));
    let update = doc(json!({"NWBFile": {"session_description": "Mouse 42, day 3"}}));

    let merged = base.merged(&update);

    assert_eq!(merged.get_path(&["NWBFile", "session_description"]), Some(&json!("Mouse 42, day 3")));
    assert_eq!(merged.get_path(&["NWBFile", "identifier"]), Some(&json!("abc")));
}

#[test]
fn test_nested_mappings_recurse() {
    let base = doc(json!({"Ecephys": {"ElectricalSeries": {"name": "ElectricalSeries"}}}));
    let update = doc(json!({"Ecephys": {"ElectricalSeries": {"description": "raw"}, "Device": []}}));

    let merged = base.merged(&update);

    assert_eq!(
        merged.get("Ecephys"),
        Some(&json!({
            "ElectricalSeries": {"name": "ElectricalSeries", "description": "raw"},
            "Device": []
        }))
    );
}

#[test]
fn test_lists_are_replaced_wholesale() {
    let base = doc(json!({"Behavior": {"Audio": [{"name": "A"}, {"name": "B"}, {"name": "C"}]}}));
    let update = doc(json!({"Behavior": {"Audio": [{"name": "Z"}]}}));

    let merged = base.merged(&update);

    assert_eq!(merged.get_path(&["Behavior", "Audio"]), Some(&json!([{"name": "Z"}])));
}

#[test]
fn test_mapping_replaced_by_scalar() {
    let base = doc(json!({"Subject": {"subject_id": "m1"}}));
    let update = doc(json!({"Subject": "unknown"}));

    assert_eq!(base.merged(&update).get("Subject"), Some(&json!("unknown")));
}

#[test]
fn test_merge_does_not_alias_inputs() {
    let base = doc(json!({"NWBFile": {"identifier": "abc"}}));
    let update = doc(json!({"NWBFile": {"identifier": "xyz"}}));

    let merged = base.merged(&update);

    assert_eq!(base.get_path(&["NWBFile", "identifier"]), Some(&json!("abc")));
    assert_eq!(merged.get_path(&["NWBFile", "identifier"]), Some(&json!("xyz")));
}

#[test]
fn test_section_mut_creates_namespace() {
    let mut metadata = MetadataDocument::new();
    metadata.section_mut("NWBFile").insert("notes".into(), json!("n"));
    metadata.set_nwbfile_field("session_id", "s1");

    let nwbfile = metadata.nwbfile().unwrap();
    assert_eq!(nwbfile.notes.as_deref(), Some("n"));
    assert_eq!(nwbfile.session_id.as_deref(), Some("s1"));
}

#[test]
fn test_typed_sections() {
    let metadata = doc(json!({
        "NWBFile": {"identifier": "abc", "related_publications": ["doi:1"]},
        "Ecephys": {
            "Device": [{"name": "Neuralynx", "description": "Cheetah 6.4"}],
            "ElectrodeGroup": [{"name": "tetrode1", "location": "CA1", "device": "Neuralynx"}],
            "ElectricalSeries": {"name": "ElectricalSeries", "description": "raw traces"}
        },
        "Behavior": {"Audio": [{"name": "Mic", "description": "Acoustic waveform series."}]}
    }));

    let nwbfile = metadata.nwbfile().unwrap();
    assert_eq!(nwbfile.identifier.as_deref(), Some("abc"));
    assert_eq!(nwbfile.extra.get("related_publications"), Some(&json!(["doi:1"])));

    let devices = metadata.ecephys_devices().unwrap();
    assert_eq!(devices[0].name, "Neuralynx");
    assert_eq!(devices[0].description.as_deref(), Some("Cheetah 6.4"));

    let groups = metadata.ecephys_electrode_groups().unwrap();
    assert_eq!(groups[0].device.as_deref(), Some("Neuralynx"));

    let series = metadata.electrical_series("ElectricalSeries").unwrap().unwrap();
    assert_eq!(series.description.as_deref(), Some("raw traces"));

    assert_eq!(metadata.audio_series().unwrap()[0].name, "Mic");
}

#[test]
fn test_invalid_section_names_path() {
    let metadata = doc(json!({"Ecephys": {"Device": [{"description": "no name"}]}}));

    let err = metadata.ecephys_devices().unwrap_err();
    assert!(err.to_string().contains("Ecephys.Device"));
}

#[test]
fn test_top_level_must_be_mapping() {
    assert!(matches!(
        MetadataDocument::from_value(json!([1, 2])),
        Err(MetadataError::NotAMapping(_))
    ));
}

#[test]
fn test_intersection_examples() {
    let a: Map<String, Value> = serde_json::from_value(json!({"x": 1, "y": 2})).unwrap();
    let b: Map<String, Value> = serde_json::from_value(json!({"x": 1, "y": 3})).unwrap();

    assert_eq!(Value::Object(dict_intersection(&[a.clone(), b])), json!({"x": 1}));

    let single: Map<String, Value> = serde_json::from_value(json!({"x": 1})).unwrap();
    assert_eq!(dict_intersection(&[single.clone()]), single);

    assert!(dict_intersection(&[]).is_empty());
}

#[test]
fn test_intersection_requires_presence_in_all() {
    let a: Map<String, Value> = serde_json::from_value(json!({"x": 1, "only_a": true})).unwrap();
    let b: Map<String, Value> = serde_json::from_value(json!({"x": 1})).unwrap();
    let c: Map<String, Value> = serde_json::from_value(json!({"x": 1, "only_a": true})).unwrap();

    assert_eq!(Value::Object(dict_intersection(&[a, b, c])), json!({"x": 1}));
}

#[test]
fn test_load_json_and_toml() {
    let json_doc = load_dict_from_str(
        r#"{"NWBFile": {"session_description": "from json"}}"#,
        MetadataFileFormat::Json,
    )
    .unwrap();
    assert_eq!(json_doc.nwbfile().unwrap().session_description.as_deref(), Some("from json"));

    let toml_doc = load_dict_from_str(
        r#"
            [NWBFile]
            session_description = "from toml"
            session_start_time = 2020-11-03T10:35:10Z
            experimenter = ["Doe, Jane"]
        "#,
        MetadataFileFormat::Toml,
    )
    .unwrap();
    let nwbfile = toml_doc.nwbfile().unwrap();
    assert_eq!(nwbfile.session_start_time.as_deref(), Some("2020-11-03T10:35:10Z"));
    assert_eq!(nwbfile.experimenter, Some(vec!["Doe, Jane".to_string()]));
}

#[test]
fn test_unsupported_extension() {
    let err = MetadataFileFormat::from_path(std::path::Path::new("metadata.yml")).unwrap_err();
    assert!(matches!(err, MetadataError::UnsupportedExtension(ext) if ext == "yml"));
}

#[test]
fn test_parse_datetime_variants() {
    let with_offset = parse_datetime("t", "2020-11-03T10:35:10-08:00").unwrap();
    assert_eq!(with_offset.offset().local_minus_utc(), -8 * 3600);

    let naive = parse_datetime("t", "2017/02/16 17:56:04").unwrap();
    assert_eq!(naive.to_rfc3339(), "2017-02-16T17:56:04+00:00");

    assert!(parse_datetime("t", "yesterday").is_err());
}

fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        any::<bool>().prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        "[a-z]{0,6}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..3).prop_map(Value::from),
            prop::collection::btree_map("[a-c]", inner, 0..3)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

fn arb_document() -> impl Strategy<Value = MetadataDocument> {
    prop::collection::btree_map("[a-d]", arb_json(), 0..4)
        .prop_map(|m| MetadataDocument::from(m.into_iter().collect::<Map<String, Value>>()))
}

proptest! {
    #[test]
    fn prop_merge_empty_identity(a in arb_document()) {
        prop_assert_eq!(a.merged(&MetadataDocument::new()), a);
    }

    #[test]
    fn prop_merge_deterministic(a in arb_document(), b in arb_document()) {
        prop_assert_eq!(a.merged(&b), a.merged(&b));
    }

    #[test]
    fn prop_override_leaves_win(a in arb_document(), b in arb_document()) {
        let merged = a.merged(&b);
        for (key, value) in b.as_map() {
            if !value.is_object() {
                prop_assert_eq!(merged.get(key), Some(value));
            }
        }
        for key in a.as_map().keys() {
            prop_assert!(merged.get(key).is_some());
        }
    }

    #[test]
    fn prop_intersection_subset_of_each(maps in prop::collection::vec(
        prop::collection::btree_map("[a-c]", 0i32..3, 0..4)
            .prop_map(|m| m.into_iter().map(|(k, v)| (k, Value::from(v))).collect::<Map<String, Value>>()),
        1..4,
    )) {
        let common = dict_intersection(&maps);
        for (key, value) in &common {
            for map in &maps {
                prop_assert_eq!(map.get(key), Some(value));
            }
        }
    }
}
