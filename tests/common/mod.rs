#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use bizdash::{
    config::DashboardOptions,
    dashboard::{Dashboard, build_dashboard},
    dataset::{Table, read_csv, read_csv_from},
};
use encoding_rs::UTF_8;
use tempfile::{TempDir, tempdir};

/// Returns the absolute path to a fixture under `tests/data`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

/// Parses CSV text the way the binary reads a UTF-8 comma-separated file.
pub fn load_table(csv: &str) -> Table {
    read_csv_from(csv.as_bytes(), b',', UTF_8).expect("parse csv")
}

pub fn load_fixture(name: &str) -> Table {
    read_csv(&fixture_path(name), b',', UTF_8).expect("read fixture")
}

/// Runs the full dashboard build with default options.
pub fn dashboard_for(csv: &str) -> Dashboard {
    build_dashboard(load_table(csv), &DashboardOptions::default())
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    /// Returns the root path for all files owned by this workspace.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }
}
