//! Powertree - Power Distribution Tree Calculator
//!
//! Loads a saved power tree (or the built-in example), recomputes it and
//! prints every node with its voltages, currents and power.
//!
//! # Usage
//!
//! ```bash
//! powertree board.json
//! powertree --share 'https://example.com/powertree/?s=%5B0.1%2C...' --json
//! powertree board.json --link https://example.com/powertree/ --export ./out
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use power_tree_core::{error::Result, Session};
use tracing_subscriber::EnvFilter;

/// Power distribution tree calculator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a saved tree (.json); the example tree is shown if omitted
    #[arg(value_name = "TREE_FILE", conflicts_with = "share")]
    tree_file: Option<PathBuf>,

    /// Load the tree carried by a share link
    #[arg(short, long, value_name = "URL")]
    share: Option<String>,

    /// Print a share link for the loaded tree against this base URL
    #[arg(short, long, value_name = "BASE_URL")]
    link: Option<String>,

    /// Write a timestamped export into this directory
    #[arg(short, long, value_name = "DIR")]
    export: Option<PathBuf>,

    /// Print the tree in its saved JSON form instead of the table
    #[arg(long)]
    json: bool,

    /// Increase log verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

fn print_tree(session: &Session) {
    for node in session.view() {
        let indent = "  ".repeat(node.depth);
        let disabled = if node.disabled { " (disabled)" } else { "" };
        println!("{indent}{} [{}]{disabled}", node.name, node.node_type);
        for field in &node.fields {
            println!("{indent}    {}", field.text);
        }
    }
    for warning in session.warnings() {
        eprintln!("warning: {warning}");
    }
}

fn run(args: &Args) -> Result<()> {
    let mut session = Session::new();
    if let Some(path) = &args.tree_file {
        session.load_file(path)?;
    } else if let Some(url) = &args.share {
        session.load_share_link(url)?;
    }

    if args.json {
        println!("{}", session.to_json()?);
    } else {
        print_tree(&session);
    }

    if let Some(base_url) = &args.link {
        println!("{}", session.share_link(base_url)?);
    }

    if let Some(dir) = &args.export {
        let path = session.export(dir)?;
        eprintln!("exported to {}", path.display());
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
