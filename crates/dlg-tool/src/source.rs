use std::fs;
use std::path::Path;

use crate::{DlgToolError, TestCase, TESTCASE_SCHEMA_V1};

pub const CONFIG_FILE: &str = "config.xml";
pub const SCENE_FILE: &str = "scene.xml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureSources {
    pub config: String,
    pub scene: String,
}

fn read_file(path: &Path) -> Result<String, DlgToolError> {
    fs::read_to_string(path).map_err(|source| DlgToolError::ReadFile {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_fixture_sources(fixture_dir: &Path) -> Result<FixtureSources, DlgToolError> {
    Ok(FixtureSources {
        config: read_file(&fixture_dir.join(CONFIG_FILE))?,
        scene: read_file(&fixture_dir.join(SCENE_FILE))?,
    })
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, DlgToolError> {
    let raw = read_file(case_path)?;
    let parsed: TestCase =
        serde_json::from_str(&raw).map_err(|source| DlgToolError::ParseCase {
            path: case_path.to_path_buf(),
            source,
        })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(DlgToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}
