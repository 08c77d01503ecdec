use std::path::{Path, PathBuf};

use dlg_api::list_scene_files;
use dlg_core::DialogueError;

use crate::map_cli_source_path;

pub(crate) fn resolve_path(raw: &str) -> Result<PathBuf, DialogueError> {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        return Ok(path);
    }
    Ok(std::env::current_dir()
        .map_err(map_cli_source_path)?
        .join(path))
}

pub(crate) fn resolve_file(raw: &str, label: &str) -> Result<PathBuf, DialogueError> {
    let absolute = resolve_path(raw)?;
    if !absolute.is_file() {
        return Err(DialogueError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("{} does not exist: {}", label, absolute.display()),
        ));
    }
    Ok(absolute)
}

pub(crate) fn resolve_scene_dir(raw: &str) -> Result<PathBuf, DialogueError> {
    let absolute = resolve_path(raw)?;

    if !absolute.exists() {
        return Err(DialogueError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("dir does not exist: {}", absolute.display()),
        ));
    }

    if !absolute.is_dir() {
        return Err(DialogueError::new(
            "CLI_SOURCE_NOT_DIR",
            format!("dir is not a directory: {}", absolute.display()),
        ));
    }

    Ok(absolute)
}

pub(crate) fn require_scene_files(dir: &Path) -> Result<(), DialogueError> {
    if list_scene_files(dir)?.is_empty() {
        return Err(DialogueError::new(
            "CLI_SOURCE_EMPTY",
            format!("No .xml scene files under {}", dir.display()),
        ));
    }
    Ok(())
}
