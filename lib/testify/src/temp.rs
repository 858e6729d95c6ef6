use std::path::PathBuf;

use crate::random::random_string;

/// Create an empty directory under the system temp dir, every call returns
/// a new one.
pub fn temp_dir() -> PathBuf {
    let path = std::env::temp_dir().join(format!("testify-{}", random_string(16)));
    std::fs::create_dir_all(&path).unwrap();
    path
}

/// A path in a fresh temp directory, the file itself is not created.
pub fn temp_file(name: &str) -> PathBuf {
    temp_dir().join(name)
}
