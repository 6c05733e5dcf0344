//! Shared fixtures for tests across the workspace.
use std::{fs, path::PathBuf};

/// Reads a `.qsfc` fixture from `resources/test`.
pub fn read_shared_resource(name: &'static str) -> String {
    fs::read_to_string(shared_resource_path(name)).expect("Unable to read file")
}

/// Path to a fixture in `resources/test`.
pub fn shared_resource_path(name: &'static str) -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("..");
    path.push("resources");
    path.push("test");
    path.push(name);
    path
}
