use serde_json::{Map, Value};

/// Keep only the key/value pairs that are present and identical in every mapping.
///
/// An empty slice yields an empty mapping and a single mapping is returned
/// unchanged. Runs in O(N·K) for N mappings of K keys; key order follows the
/// first mapping.
pub fn dict_intersection(dictionaries: &[Map<String, Value>]) -> Map<String, Value> {
    match dictionaries {
        [] => Map::new(),
        [single] => single.clone(),
        [first, rest @ ..] => first
            .iter()
            .filter(|(key, value)| rest.iter().all(|other| other.get(key.as_str()) == Some(*value)))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    }
}
