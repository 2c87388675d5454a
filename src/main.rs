use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use git_authors::site::{BuildOptions, build};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Annotate documentation pages with their git authors.
#[derive(Parser, Debug)]
#[command(name = "git-authors", version)]
struct Cli {
    /// Log level (error, warn, info, debug, trace). Overrides RUST_LOG.
    #[arg(long, global = true, value_parser = ["error", "warn", "info", "debug", "trace"])]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the site, attributing every page to its git authors
    Build {
        /// Site configuration file
        #[arg(short = 'f', long, default_value = "mkdocs.yml", env = "GIT_AUTHORS_CONFIG")]
        config_file: PathBuf,

        /// Directory the HTML pages are written to
        #[arg(short = 'd', long, default_value = "site")]
        site_dir: PathBuf,

        /// Also write a JSON report of every page's authorship
        #[arg(long)]
        report: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    match cli.command {
        Commands::Build {
            config_file,
            site_dir,
            report,
        } => run_build(config_file, site_dir, report),
    }
}

/// Log lines go to stdout, where build warnings are expected.
fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stdout)
                .with_target(false)
                .with_ansi(false)
                .without_time(),
        )
        .with(filter)
        .init();
}

fn run_build(config_file: PathBuf, site_dir: PathBuf, report_path: Option<PathBuf>) {
    let options = BuildOptions::new(config_file, site_dir);

    let report = build(&options).unwrap_or_else(|e| {
        eprintln!("git-authors: {e}");
        process::exit(1);
    });

    if let Some(path) = report_path {
        report.save(&path).unwrap_or_else(|e| {
            eprintln!("git-authors: {e}");
            process::exit(1);
        });
    }
}
