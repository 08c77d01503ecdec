mod case;
mod runner;
mod source;

pub use case::{TestCase, TESTCASE_SCHEMA_V1};
pub use runner::{assert_case, run_case, CASE_HEADER_DATE};
pub use source::{read_fixture_sources, read_test_case, FixtureSources, CONFIG_FILE, SCENE_FILE};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DlgToolError {
    #[error("Failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse testcase {path}: {source}")]
    ParseCase {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid testcase schema version \"{found}\", expected \"{expected}\".")]
    InvalidSchemaVersion { expected: String, found: String },
    #[error("Compile error: {0}")]
    Compile(#[from] dlg_core::DialogueError),
    #[error("Expected error code {expected}, but the scene compiled.")]
    UnexpectedSuccess { expected: String },
    #[error("Expected error code {expected}, got {actual}: {message}")]
    ErrorCodeMismatch {
        expected: String,
        actual: String,
        message: String,
    },
    #[error("Fragment {index} not found in order: {fragment:?}\n--- output ---\n{output}")]
    FragmentMissing {
        index: usize,
        fragment: String,
        output: String,
    },
    #[error("Status groups mismatch. expected={expected} actual={actual}")]
    StatusGroupsMismatch { expected: String, actual: String },
    #[error("Dependencies mismatch. expected={expected:?} actual={actual:?}")]
    DependenciesMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },
}
