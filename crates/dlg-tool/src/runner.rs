use std::path::Path;

use dlg_compiler::{CompileOptions, DialogueCompiler};
use dlg_core::{CompiledScene, StatusContext};

use crate::source::{read_fixture_sources, read_test_case};
use crate::{DlgToolError, TestCase};

/// Fixed header date so fixture output is reproducible.
pub const CASE_HEADER_DATE: &str = "2000-01-01";

pub fn run_case(fixture_dir: &Path) -> Result<CompiledScene, DlgToolError> {
    let sources = read_fixture_sources(fixture_dir)?;
    let compiler = DialogueCompiler::from_config_source(&sources.config)?;
    let scene = compiler.compile_source(
        &sources.scene,
        &CompileOptions::with_header_date(CASE_HEADER_DATE),
    )?;
    Ok(scene)
}

pub fn assert_case(fixture_dir: &Path, case_path: &Path) -> Result<(), DlgToolError> {
    let case = read_test_case(case_path)?;
    let result = run_case(fixture_dir);

    if let Some(expected) = &case.expect_error {
        return match result {
            Ok(_) => Err(DlgToolError::UnexpectedSuccess {
                expected: expected.clone(),
            }),
            Err(DlgToolError::Compile(error)) if &error.code == expected => Ok(()),
            Err(DlgToolError::Compile(error)) => Err(DlgToolError::ErrorCodeMismatch {
                expected: expected.clone(),
                actual: error.code,
                message: error.message,
            }),
            Err(other) => Err(other),
        };
    }

    check_scene(&case, &result?)
}

fn check_scene(case: &TestCase, scene: &CompiledScene) -> Result<(), DlgToolError> {
    let mut cursor = 0usize;
    for (index, fragment) in case.expect_contains.iter().enumerate() {
        match scene.source[cursor..].find(fragment.as_str()) {
            Some(offset) => cursor += offset + fragment.len(),
            None => {
                return Err(DlgToolError::FragmentMissing {
                    index,
                    fragment: fragment.clone(),
                    output: scene.source.clone(),
                })
            }
        }
    }

    if let Some(expected) = &case.expect_status_groups {
        if expected != &scene.status_groups {
            return Err(DlgToolError::StatusGroupsMismatch {
                expected: render_groups(expected),
                actual: render_groups(&scene.status_groups),
            });
        }
    }

    if let Some(expected) = &case.expect_dependencies {
        if expected != &scene.dependencies {
            return Err(DlgToolError::DependenciesMismatch {
                expected: expected.clone(),
                actual: scene.dependencies.clone(),
            });
        }
    }

    Ok(())
}

fn render_groups(groups: &[StatusContext]) -> String {
    groups
        .iter()
        .map(StatusContext::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod runner_tests {
    use super::*;

    use std::fs;

    const CONFIG: &str = r#"<features>
  <featureDefinition name="dlg_Ok" js="$.sendOk($x);"/>
  <featureDefinition name="special_End" js="$.dispose();"/>
  <featureDefinition name="warp" js="$.warp($x);" dependsOn="Packages.server.maps"/>
</features>"#;

    fn fixture(scene: &str, case: &str) -> tempfile::TempDir {
        let root = tempfile::tempdir().expect("temp dir");
        fs::write(root.path().join("config.xml"), CONFIG).expect("config");
        fs::write(root.path().join("scene.xml"), scene).expect("scene");
        fs::write(root.path().join("case.json"), case).expect("case");
        root
    }

    fn assert_fixture(root: &tempfile::TempDir) -> Result<(), DlgToolError> {
        assert_case(root.path(), &root.path().join("case.json"))
    }

    #[test]
    fn run_case_uses_the_fixed_header_date() {
        let root = fixture(
            r#"<scene><message style="ok" text="hi"/></scene>"#,
            r#"{"schemaVersion":"dlg-tool-case.v1"}"#,
        );
        let scene = run_case(root.path()).expect("compiles");
        assert!(scene.source.starts_with(
            "/* This script was automatically generated by dlgc on 2000-01-01 */\n"
        ));
    }

    #[test]
    fn assert_case_checks_fragments_in_order() {
        let root = fixture(
            r#"<scene><message style="ok" text="hi"/></scene>"#,
            r#"{
  "schemaVersion":"dlg-tool-case.v1",
  "expectContains":["status = 0;", "cm.sendOk(\"hi\");", "return;"],
  "expectStatusGroups":[[-1],[0]],
  "expectDependencies":[]
}"#,
        );
        assert_fixture(&root).expect("case should pass");

        let reversed = fixture(
            r#"<scene><message style="ok" text="hi"/></scene>"#,
            r#"{
  "schemaVersion":"dlg-tool-case.v1",
  "expectContains":["return;", "status = 0;"]
}"#,
        );
        let error = assert_fixture(&reversed).expect_err("order matters");
        assert!(matches!(error, DlgToolError::FragmentMissing { index: 1, .. }));
    }

    #[test]
    fn assert_case_reports_group_and_dependency_mismatches() {
        let root = fixture(
            r#"<scene><warp x="100"/></scene>"#,
            r#"{"schemaVersion":"dlg-tool-case.v1","expectStatusGroups":[[-1],[0]]}"#,
        );
        let error = assert_fixture(&root).expect_err("groups differ");
        assert!(matches!(error, DlgToolError::StatusGroupsMismatch { .. }));

        let root = fixture(
            r#"<scene><warp x="100"/></scene>"#,
            r#"{"schemaVersion":"dlg-tool-case.v1","expectDependencies":[]}"#,
        );
        let error = assert_fixture(&root).expect_err("dependencies differ");
        assert!(matches!(
            error,
            DlgToolError::DependenciesMismatch { ref actual, .. } if actual == &vec!["Packages.server.maps".to_string()]
        ));
    }

    #[test]
    fn assert_case_matches_expected_error_codes() {
        let scene = r#"<scene><teleport/></scene>"#;
        let root = fixture(
            scene,
            r#"{"schemaVersion":"dlg-tool-case.v1","expectError":"TAG_UNKNOWN"}"#,
        );
        assert_fixture(&root).expect("expected error matches");

        let root = fixture(
            scene,
            r#"{"schemaVersion":"dlg-tool-case.v1","expectError":"FEATURE_UNKNOWN"}"#,
        );
        let error = assert_fixture(&root).expect_err("different code");
        assert!(matches!(error, DlgToolError::ErrorCodeMismatch { ref actual, .. } if actual == "TAG_UNKNOWN"));

        let root = fixture(
            r#"<scene><warp x="1"/></scene>"#,
            r#"{"schemaVersion":"dlg-tool-case.v1","expectError":"TAG_UNKNOWN"}"#,
        );
        let error = assert_fixture(&root).expect_err("scene compiles");
        assert!(matches!(error, DlgToolError::UnexpectedSuccess { .. }));
    }
}
