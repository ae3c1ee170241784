//! Golden dataset loader shared by the integration tests of every crate.
//!
//! Fixtures live under `crates/test-fixtures/golden/` and are plain JSON.
//! [`mocks`] holds in-process stand-ins for the external collaborators.

pub mod mocks;

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::de::DeserializeOwned;

/// `crates/test-fixtures`, found by walking up from the running crate.
fn fixtures_root() -> &'static Path {
    static ROOT: OnceLock<PathBuf> = OnceLock::new();
    ROOT.get_or_init(|| {
        let start = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        start
            .ancestors()
            .map(|dir| dir.join("test-fixtures"))
            .chain(std::iter::once(start.clone()))
            .find(|dir| dir.join("golden").is_dir())
            .unwrap_or_else(|| panic!("no golden/ directory above {}", start.display()))
    })
}

fn read(relative_path: &str) -> (PathBuf, String) {
    let path = fixtures_root().join(relative_path);
    match std::fs::read_to_string(&path) {
        Ok(content) => (path, content),
        Err(e) => panic!("cannot read fixture {}: {e}", path.display()),
    }
}

/// Deserialize a golden JSON file, e.g. `load_fixture("golden/dedup/near_duplicates.json")`.
///
/// # Panics
/// On a missing or malformed file.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let (path, content) = read(relative_path);
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("cannot parse fixture {}: {e}", path.display()))
}

pub fn load_fixture_value(relative_path: &str) -> serde_json::Value {
    load_fixture(relative_path)
}

pub fn fixture_exists(relative_path: &str) -> bool {
    fixtures_root().join(relative_path).is_file()
}

/// JSON files directly under `subdir`, sorted by name.
pub fn list_fixtures(subdir: &str) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(fixtures_root().join(subdir)) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}

/// Parse a JSON array of numbers into an embedding vector.
///
/// # Panics
/// Panics if the value is not an array of numbers.
pub fn vector(value: &serde_json::Value) -> Vec<f32> {
    value
        .as_array()
        .unwrap_or_else(|| panic!("expected an array, got {value}"))
        .iter()
        .map(|v| v.as_f64().unwrap_or_else(|| panic!("expected a number, got {v}")) as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_golden_file_parses() {
        let dirs = ["golden/dedup", "golden/delivery", "golden/entity", "golden/retrieval"];
        let files: Vec<PathBuf> = dirs.iter().flat_map(|d| list_fixtures(d)).collect();
        assert_eq!(files.len(), 4);
        for file in files {
            let relative = file.strip_prefix(fixtures_root()).unwrap();
            let _: serde_json::Value = load_fixture(relative.to_str().unwrap());
        }
        assert!(fixture_exists("golden/retrieval/rrf_lists.json"));
        assert!(!fixture_exists("golden/retrieval"));
    }

    #[test]
    fn vector_helper_reads_numbers() {
        let v = vector(&serde_json::json!([1.0, 0.5, -2]));
        assert_eq!(v, vec![1.0, 0.5, -2.0]);
    }
}
