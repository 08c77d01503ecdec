use std::ffi::OsString;
use std::path::Path;

use clap::Parser;
use dlg_api::{compile_scene_directory, compile_scene_file, load_compiler_from_config_file};
use dlg_compiler::{CompileOptions, DialogueCompiler};
use dlg_core::DialogueError;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

mod cli_args;
mod error_map;
mod source_loader;

pub(crate) use cli_args::{BatchArgs, Cli, CompileArgs, Mode};
pub(crate) use error_map::{emit_error, map_cli_source_path};
pub(crate) use source_loader::{resolve_file, resolve_path, resolve_scene_dir, require_scene_files};

/// Installs the stderr subscriber; `RUST_LOG` overrides the `warn` default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, DialogueError> {
    match cli.command {
        Mode::Compile(args) => run_compile(args),
        Mode::Batch(args) => run_batch(args),
    }
}

fn compile_options(header_date: Option<String>) -> CompileOptions {
    CompileOptions { header_date }
}

fn load_config(path: &Path) -> Result<DialogueCompiler, DialogueError> {
    let compiler = load_compiler_from_config_file(path)?;
    debug!(
        features = ?compiler.registry().names().collect::<Vec<_>>(),
        manager = compiler.registry().manager(),
        "configuration loaded"
    );
    Ok(compiler)
}

fn run_compile(args: CompileArgs) -> Result<i32, DialogueError> {
    let config = resolve_file(&args.config, "config")?;
    let input = resolve_file(&args.input, "input")?;
    let output = args.output.as_deref().map(resolve_path).transpose()?;
    debug!(config = %config.display(), input = %input.display(), "compile requested");

    let compiler = load_config(&config)?;
    let compiled = compile_scene_file(
        &compiler,
        &input,
        output.as_deref(),
        &compile_options(args.header_date),
    )?;

    println!("RESULT:OK");
    println!("OUTPUT:{}", compiled.output.display());
    println!("STATUS_GROUPS:{}", compiled.scene.status_groups.len());
    println!(
        "DEPENDENCIES_JSON:{}",
        serde_json::to_string(&compiled.scene.dependencies).unwrap_or_else(|_| "[]".to_string())
    );
    Ok(0)
}

fn run_batch(args: BatchArgs) -> Result<i32, DialogueError> {
    let config = resolve_file(&args.config, "config")?;
    let dir = resolve_scene_dir(&args.dir)?;
    require_scene_files(&dir)?;
    debug!(config = %config.display(), dir = %dir.display(), "batch requested");

    let compiler = load_config(&config)?;
    let compiled = compile_scene_directory(&compiler, &dir, &compile_options(args.header_date))?;

    println!("RESULT:OK");
    for file in &compiled {
        println!("OUTPUT:{}", file.output.display());
    }
    println!("COMPILED:{}", compiled.len());
    Ok(0)
}
