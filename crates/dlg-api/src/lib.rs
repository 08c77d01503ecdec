use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use dlg_compiler::{CompileOptions, DialogueCompiler};
use dlg_core::{CompiledScene, DialogueError};
use tracing::{info, warn};
use walkdir::WalkDir;

pub const SCENE_EXTENSION: &str = "xml";
pub const OUTPUT_EXTENSION: &str = "js";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledFile {
    pub input: PathBuf,
    pub output: PathBuf,
    pub scene: CompiledScene,
}

const API_CODE_PREFIX: &str = "API_";

fn io_error(code: &'static str, path: &Path, error: impl Display) -> DialogueError {
    DialogueError::new(code, error.to_string()).prefixed(path.display())
}

// IO failures already name their path.
fn batch_error(input: &Path, error: DialogueError) -> DialogueError {
    if error.code.starts_with(API_CODE_PREFIX) {
        error
    } else {
        error.prefixed(input.display())
    }
}

pub fn load_compiler_from_config_file(path: &Path) -> Result<DialogueCompiler, DialogueError> {
    let source =
        fs::read_to_string(path).map_err(|error| io_error("API_CONFIG_READ", path, error))?;
    let compiler = DialogueCompiler::from_config_source(&source)?;
    info!(
        config = %path.display(),
        features = compiler.registry().len(),
        "loaded feature configuration"
    );
    Ok(compiler)
}

/// `<stem>.js` next to the scene file.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension(OUTPUT_EXTENSION)
}

/// Compiles one scene file and writes the script. Nothing is written when
/// compilation fails.
pub fn compile_scene_file(
    compiler: &DialogueCompiler,
    input: &Path,
    output: Option<&Path>,
    options: &CompileOptions,
) -> Result<CompiledFile, DialogueError> {
    let source =
        fs::read_to_string(input).map_err(|error| io_error("API_SOURCE_READ", input, error))?;
    let scene = compiler.compile_source(&source, options)?;

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| default_output_path(input));
    fs::write(&output, &scene.source)
        .map_err(|error| io_error("API_OUTPUT_WRITE", &output, error))?;

    info!(
        input = %input.display(),
        output = %output.display(),
        statuses = scene.status_count,
        groups = scene.status_groups.len(),
        "compiled scene"
    );
    Ok(CompiledFile {
        input: input.to_path_buf(),
        output,
        scene,
    })
}

/// Scene files directly inside `dir`, sorted by path.
pub fn list_scene_files(dir: &Path) -> Result<Vec<PathBuf>, DialogueError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(false) {
        let entry = entry.map_err(|error| io_error("API_SOURCE_SCAN", dir, error))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some(SCENE_EXTENSION) {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Compiles every scene in `dir` with one configuration, stopping at the
/// first failure.
pub fn compile_scene_directory(
    compiler: &DialogueCompiler,
    dir: &Path,
    options: &CompileOptions,
) -> Result<Vec<CompiledFile>, DialogueError> {
    let mut compiled = Vec::new();
    for input in list_scene_files(dir)? {
        match compile_scene_file(compiler, &input, None, options) {
            Ok(file) => compiled.push(file),
            Err(error) => {
                warn!(
                    input = %input.display(),
                    code = error.code.as_str(),
                    "batch compilation stopped"
                );
                return Err(batch_error(&input, error));
            }
        }
    }
    Ok(compiled)
}
