use std::fs;
use std::path::PathBuf;

pub const CASE_FILE: &str = "case.json";

pub fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

pub fn fixtures_root() -> PathBuf {
    workspace_root().join("fixtures").join("scenes")
}

pub fn fixture_dir(name: &str) -> PathBuf {
    fixtures_root().join(name)
}

pub fn case_path(name: &str) -> PathBuf {
    fixture_dir(name).join(CASE_FILE)
}

/// Every fixture directory, sorted by name.
pub fn fixture_dirs() -> std::io::Result<Vec<PathBuf>> {
    let mut dirs = fs::read_dir(fixtures_root())?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect::<Vec<_>>();
    dirs.sort();
    Ok(dirs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_root_points_to_workspace() {
        assert!(workspace_root().join("Cargo.toml").exists());
    }

    #[test]
    fn fixtures_root_points_to_scene_fixtures() {
        assert!(fixtures_root().is_dir());
    }

    #[test]
    fn fixture_dir_and_case_path_join_names() {
        assert!(fixture_dir("01-ok-message").is_dir());
        assert!(case_path("01-ok-message").ends_with("01-ok-message/case.json"));
    }

    #[test]
    fn every_fixture_passes_its_case() {
        let dirs = fixture_dirs().expect("fixtures root should be readable");
        assert!(!dirs.is_empty(), "expected scene fixtures");

        for dir in dirs {
            if let Err(error) = dlg_tool::assert_case(&dir, &dir.join(CASE_FILE)) {
                panic!("fixture {} failed: {}", dir.display(), error);
            }
        }
    }
}
