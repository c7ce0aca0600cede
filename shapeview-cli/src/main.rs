use std::path::PathBuf;

use clap::Parser;
use tracing::Level;

mod commands;
mod progress;

use commands::{Commands, Context};

#[derive(Parser)]
#[command(name = "shapeview")]
#[command(about = "Inspect Darkstar shapes, volumes and textures", long_about = None)]
struct Cli {
    /// Search root: a directory or a .vol file (repeatable, earliest wins)
    #[arg(short, long = "root", global = true)]
    roots: Vec<PathBuf>,

    /// Palette name, resolved through the search roots
    #[arg(short, long, global = true)]
    palette: Option<String>,

    /// Config file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log decode progress
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .init();

    let context = Context {
        roots: cli.roots,
        palette: cli.palette,
        config: cli.config,
    };
    cli.command.execute(&context)?;

    Ok(())
}
