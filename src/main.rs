use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};
use docsync::commands::{self, FixFlags};
use docsync::{diagnostics, error, watch};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

/// Command-line arguments.
#[derive(Parser)]
#[command(name = "docsync", version, about = "Keep anchored markdown sections in sync with code signatures")]
struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(short = 'C', long = "dir", global = true, value_name = "DIR")]
    dir: Option<PathBuf>,
    /// Raise log verbosity (-v info, -vv debug); DOCSYNC_LOG overrides
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

/// Subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Scaffold .docsync.toml and the anchor map, tracking anchors found in markdown
    Init,
    /// Report drifted and missing anchors (exit 1 if any)
    Check,
    /// List every tracked anchor as FRESH, DRIFT, or MISSING
    Status,
    /// Regenerate drifted sections
    Fix {
        /// Preview changes without writing docs or the map
        #[arg(long)]
        dry_run: bool,
        /// Write placeholders instead of calling the configured generator
        #[arg(long)]
        no_ai: bool,
        /// Commit changed docs and the map afterwards
        #[arg(long)]
        auto_commit: bool,
        /// Push after committing (implies --auto-commit)
        #[arg(long)]
        push: bool,
    },
    /// Start documenting a symbol: append a placeholder block to DOC
    Track {
        /// Markdown file to append to
        doc: PathBuf,
        /// Code reference (e.g. src/lib.rs#add, src/api.ts#Client.send)
        code_ref: String,
    },
    /// Drop entries whose code, symbol, or anchor is gone
    Prune {
        /// Show what would be removed without changing the map
        #[arg(long)]
        dry_run: bool,
    },
    /// Run check, then re-run whenever tracked files change
    Watch,
}

/// Install the stderr log subscriber. `DOCSYNC_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("DOCSYNC_LOG").unwrap_or_else(|_| return EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let root = cli.dir.unwrap_or_else(|| return PathBuf::from("."));

    let result: Result<ExitCode, error::Error> = match cli.command {
        Commands::Init => commands::init(&root),
        Commands::Check => commands::check(&root),
        Commands::Status => commands::status(&root),
        Commands::Fix { dry_run, no_ai, auto_commit, push } => commands::fix(&root, FixFlags {
            auto_commit: auto_commit || push,
            dry_run,
            no_ai,
            push,
        }),
        Commands::Track { doc, code_ref } => commands::track(&root, &doc, &code_ref),
        Commands::Prune { dry_run } => commands::prune(&root, dry_run),
        Commands::Watch => watch::run(&root),
    };

    return match result {
        Ok(code) => code,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::FAILURE
        },
    };
}
