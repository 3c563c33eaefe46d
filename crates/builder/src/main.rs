//! # build-toolchain
//!
//! Build the RISC-V embedded cross toolchain from sibling checkouts.
//!
//! ## Usage
//!
//! ```bash
//! build-toolchain --all                       # Everything, release mode
//! build-toolchain --with-ldc --mode=debug     # LDC plus binutils and LLVM
//! build-toolchain --with-compiler-rt --clean  # Fresh compiler-rt for every multilib
//! PARALLEL_JOBS=4 build-toolchain --with-llvm --strip
//! ```
//!
//! ## Environment
//!
//! - `PARALLEL_JOBS` - job count (default: CPU count)
//! - `DMD` - D compiler for DUB (default: installed `ldmd2`, builds LDC)
//! - `EXTRA_OPTS`, `EXTRA_<COMPONENT>_OPTS` - extra configure arguments
//! - `TOOLCHAIN_ROOT` - repository root override
//! - `RUST_LOG` - log filter, e.g. `debug` or `rv_toolchain=trace` (`info` by default)

use anyhow::Result;
use rv_toolchain::builder::{self, branches, preflight, runner::SystemRunner, logs::LogDir};
use rv_toolchain::cli::{self, Cli};
use rv_toolchain::config::{BuildConfig, EnvVars, Layout, ToolchainFile};
use std::process::ExitCode;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> ExitCode {
    let cli = match cli::parse(std::env::args_os()) {
        Ok(cli) => cli,
        Err(exit) => {
            exit.print();
            return ExitCode::from(exit.code);
        }
    };

    let env = EnvVars::from_process();
    init_tracing(&env);

    match run(&cli, &env) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("\nerror: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(env: &EnvVars) {
    let filter = log_filter(env.get("RUST_LOG"));
    let verbose = filter
        .max_level_hint()
        .is_some_and(|level| level >= LevelFilter::DEBUG);

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_file(verbose)
        .with_line_number(verbose)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("warning: tracing subscriber already set");
    }
}

/// `RUST_LOG` directives, `info` when unset or invalid.
fn log_filter(directives: Option<&str>) -> EnvFilter {
    let Some(directives) = directives else {
        return EnvFilter::new("info");
    };
    EnvFilter::try_new(directives).unwrap_or_else(|err| {
        eprintln!("warning: ignoring RUST_LOG={directives:?}: {err}");
        EnvFilter::new("info")
    })
}

fn run(cli: &Cli, env: &EnvVars) -> Result<()> {
    let layout = Layout::discover(env)?;
    let toolchain = ToolchainFile::load(&layout.toolchain_file())?;
    let config = BuildConfig::resolve(cli, env, layout, &toolchain)?;
    let runner = SystemRunner;

    branches::validate(&config.layout, &toolchain.branches, &runner);
    preflight::check(&config)?;

    let logs = LogDir::create(&config.layout.logs(), chrono::Local::now())?;
    builder::build_all(&config, &runner, &logs)?;

    println!(
        "=== Toolchain installed to {} ===",
        config.layout.install().display()
    );
    Ok(())
}
