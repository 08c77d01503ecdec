use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "dlgc")]
#[command(about = "Compiles dialogue scenes into dispatch scripts")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Compile(CompileArgs),
    Batch(BatchArgs),
}

#[derive(Debug, Args)]
pub(crate) struct CompileArgs {
    #[arg(long = "config")]
    pub(crate) config: String,
    #[arg(long = "input")]
    pub(crate) input: String,
    #[arg(long = "output")]
    pub(crate) output: Option<String>,
    #[arg(long = "header-date")]
    pub(crate) header_date: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct BatchArgs {
    #[arg(long = "config")]
    pub(crate) config: String,
    #[arg(long = "dir")]
    pub(crate) dir: String,
    #[arg(long = "header-date")]
    pub(crate) header_date: Option<String>,
}
