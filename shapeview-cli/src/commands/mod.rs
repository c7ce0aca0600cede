use std::path::PathBuf;

use anyhow::Context as _;
use clap::Subcommand;
use darkstar::vfs::AssetLocator;
use shapeview::config::{ConfigOverrides, ViewerConfig};
use shapeview::session::Session;

pub mod extract;
pub mod info;
pub mod list;
pub mod play;
pub mod pose;
pub mod scan;
pub mod textures;

/// Global options shared by every command
pub struct Context {
    pub roots: Vec<PathBuf>,
    pub palette: Option<String>,
    pub config: Option<PathBuf>,
}

impl Context {
    /// The config file with command-line values applied over it.
    pub fn config(&self, model: Option<&str>) -> anyhow::Result<ViewerConfig> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ViewerConfig::load_default()?,
        };
        config.apply(ConfigOverrides {
            search_roots: self.roots.clone(),
            palette: self.palette.clone(),
            model: model.map(str::to_string),
        });
        Ok(config)
    }

    /// Mount the search roots without loading a palette.
    pub fn locator(&self) -> anyhow::Result<AssetLocator> {
        let config = self.config(None)?;
        if config.search_roots.is_empty() {
            anyhow::bail!("No search roots; pass --root or set search_roots in the config");
        }
        Ok(AssetLocator::from_roots(&config.search_roots)?)
    }

    /// A full session with `model` as the initial shape.
    pub fn session(&self, model: &str) -> anyhow::Result<Session> {
        let config = self.config(Some(model))?;
        Session::start(config).with_context(|| format!("Failed to open {model}"))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Summarize a shape's tables
    Info {
        /// Shape name, resolved through the search roots
        model: String,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every name in the mounted namespace
    List {
        /// Only list names with this extension (e.g. "dts")
        #[arg(short, long)]
        ext: Option<String>,
    },

    /// Print node world positions and visibility at one instant
    Pose {
        /// Shape name
        model: String,

        /// Sequence to sample (the rest pose when omitted)
        #[arg(short, long)]
        sequence: Option<String>,

        /// Seconds into the sequence
        #[arg(short, long, default_value_t = 0.0)]
        time: f32,
    },

    /// Simulate playback at a fixed frame rate
    Play {
        /// Shape name
        model: String,

        /// Sequence to play
        #[arg(short, long)]
        sequence: String,

        /// Seconds to simulate
        #[arg(long, default_value_t = 2.0)]
        seconds: f32,

        /// Ticks per second
        #[arg(long, default_value_t = 30)]
        fps: u32,
    },

    /// Export a shape's resolved textures as PNG
    Textures {
        /// Shape name
        model: String,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Decode every shape in the namespace and report failures
    Scan {
        /// Extension to scan
        #[arg(short, long, default_value = "dts")]
        ext: String,

        /// Suppress progress bar
        #[arg(short, long)]
        quiet: bool,
    },

    /// Write one entry of a volume file to disk
    Extract {
        /// Volume file
        volume: PathBuf,

        /// Entry name
        name: String,

        /// Destination file
        #[arg(short, long)]
        output: PathBuf,
    },
}

impl Commands {
    pub fn execute(&self, context: &Context) -> anyhow::Result<()> {
        match self {
            Commands::Info { model, json } => info::execute(context, model, *json),
            Commands::List { ext } => list::execute(context, ext.as_deref()),
            Commands::Pose {
                model,
                sequence,
                time,
            } => pose::execute(context, model, sequence.as_deref(), *time),
            Commands::Play {
                model,
                sequence,
                seconds,
                fps,
            } => play::execute(context, model, sequence, *seconds, *fps),
            Commands::Textures { model, output } => textures::execute(context, model, output),
            Commands::Scan { ext, quiet } => scan::execute(context, ext, *quiet),
            Commands::Extract {
                volume,
                name,
                output,
            } => extract::execute(volume, name, output),
        }
    }
}

/// Decode `model` through the context's search roots.
fn load_shape(context: &Context, model: &str) -> anyhow::Result<darkstar::shape::Shape> {
    let locator = context.locator()?;
    let bytes = locator.resolve(model)?;
    darkstar::shape::ShapeDecoder::decode(&bytes).with_context(|| format!("Failed to decode {model}"))
}
