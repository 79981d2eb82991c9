//! `jera-audit` command line.
//!
//! Exit codes:
//! - 0: schema validation and drift detection pass
//! - 1: schema or drift findings
//! - 2: the audit could not run (manifest missing or unparsable, `--fix` write failed)

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use jera_audit::{AuditConfig, Palette, TextOptions, find_root, render_json, render_text};
use tracing_subscriber::EnvFilter;

const TOOL_FAILURE: u8 = 2;

#[derive(Parser)]
#[command(name = "jera-audit")]
#[command(about = "Validate components.json against the filesystem, docs site, and llms.txt")]
struct Cli {
    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// List every advisory finding instead of a count
    #[arg(long)]
    verbose: bool,

    /// Regenerate the component sections of llms.txt
    #[arg(long)]
    fix: bool,

    /// Repository root (default: nearest ancestor containing components.json)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Docs root holding one directory per component page
    #[arg(long)]
    docs_dir: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(TOOL_FAILURE)
        }
    }
}

fn run(cli: Cli) -> Result<u8> {
    let mut config = AuditConfig::jera();
    if let Some(dir) = cli.docs_dir {
        config.docs_dir = dir;
    }
    let root = match cli.root {
        Some(root) => root,
        None => find_root(&config),
    };

    let report = jera_audit::run(&config, &root, cli.fix)?;

    if cli.json {
        println!("{}", render_json(&report)?);
    } else {
        let palette = if use_color() {
            Palette::ansi()
        } else {
            Palette::plain()
        };
        let options = TextOptions {
            verbose: cli.verbose,
            palette,
        };
        print!("{}", render_text(&report, &options));
    }

    Ok(report.exit_code)
}

fn use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal()
}
