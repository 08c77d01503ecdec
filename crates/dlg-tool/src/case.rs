use dlg_core::StatusContext;
use serde::{Deserialize, Serialize};

pub const TESTCASE_SCHEMA_V1: &str = "dlg-tool-case.v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    /// Fragments that must appear in the generated script, in this order.
    #[serde(default)]
    pub expect_contains: Vec<String>,
    #[serde(default)]
    pub expect_status_groups: Option<Vec<StatusContext>>,
    #[serde(default)]
    pub expect_dependencies: Option<Vec<String>>,
    /// When set the scene must fail to compile with this code.
    #[serde(default)]
    pub expect_error: Option<String>,
}
