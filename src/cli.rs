use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::deps::DependencyOverrides;
use crate::file_tree::DEFAULT_EXCLUDED_DIR;
use crate::generator::{repo_path_from_program, GenerationSummary, TargetsGenerator};

/// Environment variable holding the log filter, checked before `RUST_LOG`.
pub const LOG_ENV: &str = "BUCKIFY_LOG";

#[derive(Parser, Debug)]
#[command(name = "buckify")]
#[command(about = "Generate a Buck TARGETS file from src.mk and the Makefile test list")]
#[command(version)]
pub struct Cli {
    /// Extra dependencies per target alias as a JSON object, e.g.
    /// '{"fake": {"extra_deps": [":test_dep"], "extra_compiler_flags": ["-Os"]}}'
    pub extra_deps: Option<String>,

    /// Repository root (defaults to the parent of the directory holding this binary)
    #[arg(long)]
    pub repo_path: Option<PathBuf>,

    /// Directory name excluded from the source scan
    #[arg(long, default_value = DEFAULT_EXCLUDED_DIR)]
    pub exclude: String,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli).map(|_| ())
}

pub fn run(cli: Cli) -> Result<GenerationSummary> {
    let deps = DependencyOverrides::parse(cli.extra_deps.as_deref())
        .context("Failed to parse extra dependencies")?;

    let repo_path = match cli.repo_path {
        Some(path) => path,
        None => {
            let program = std::env::args_os()
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("Could not determine program path"))?;
            repo_path_from_program(&program)
                .ok_or_else(|| anyhow!("Could not derive repository path from {}", program.display()))?
        }
    };

    TargetsGenerator::new(&repo_path)
        .excluded_dir(cli.exclude)
        .generate(&deps)
        .context("Failed to generate TARGETS files")
}

fn init_logging(verbose: bool) {
    let default_directive = if verbose { "buckify=debug" } else { "buckify=warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    // A subscriber may already be installed when embedded in another tool.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .try_init();
}
