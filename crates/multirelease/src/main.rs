mod error;
mod logging;
mod release;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use crate::error::CliError;
use crate::release::ReleaseArgs;

#[derive(Parser)]
#[command(name = "multi-release")]
#[command(version = env!("MULTI_RELEASE_VERSION"))]
#[command(about = "Release every package of a monorepo, semantically", long_about = None)]
struct Cli {
    /// Workspace root to release from (default: current directory)
    #[arg(long = "path", short = 'C')]
    path: Option<PathBuf>,

    #[command(flatten)]
    release: ReleaseArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let cwd = match resolve_start_path(cli.path) {
        Ok(path) => path,
        Err(e) => {
            print_error(&e);
            return ExitCode::FAILURE;
        }
    };
    logging::init(cli.release.wants_debug(&cwd));

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            print_error(&CliError::Runtime(e));
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(cli.release.execute(&cwd)) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn resolve_start_path(path: Option<PathBuf>) -> Result<PathBuf, CliError> {
    let path = match path {
        Some(p) => p,
        None => std::env::current_dir().map_err(CliError::CurrentDir)?,
    };
    if !path.is_dir() {
        return Err(CliError::NotADirectory(path));
    }
    Ok(path)
}

fn print_error(error: &CliError) {
    eprintln!("error: {error}");

    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        eprintln!("caused by: {cause}");
        source = std::error::Error::source(cause);
    }
}
