//! # Vantage
//!
//! Populates a scene with seeded, collision-free vehicles and props and
//! writes ground-truth annotations for every frame.
//!
//! ## Usage
//!
//! ```bash
//! # Five frames of parked and lane traffic, annotations on stdout
//! vantage generate --scene demos/street.json --config demos/spawn.json \
//!     --vehicle /Game/Vehicles/Sedan=Sedan --vehicle /Game/Vehicles/Van=Van \
//!     --lane-vehicles 2 --frames 5
//!
//! # Scatter props too and write one file pair per frame
//! vantage generate --scene demos/street.json --config demos/spawn.json \
//!     --prop /Game/Props/Cone=Cone --prop-count 12 --output out/
//!
//! # Drive a session with JSON requests, one per line
//! echo '"ResolveAnchors"' | vantage serve --scene demos/street.json
//! ```

mod generate;
mod serve;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vantage_core::{SceneSession, SessionConfig, SpawnRequest};
use vantage_world::SceneWorld;

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "vantage")]
#[command(about = "Deterministic scene population and annotation generator")]
#[command(version)]
struct Args {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Populate the scene and write annotations for each frame
    Generate(generate::GenerateArgs),

    /// Answer protocol requests read from stdin
    Serve(serve::ServeArgs),
}

#[derive(clap::Args, Debug)]
pub struct SceneArgs {
    /// Scene description (JSON)
    #[arg(short, long)]
    pub scene: PathBuf,

    /// Spawn, visibility and annotation configuration (JSON)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Seed for the first frame
    #[arg(long, default_value = "42")]
    pub seed: u32,
}

impl SceneArgs {
    fn load(&self) -> anyhow::Result<(SceneWorld, SceneSession)> {
        let world = SceneWorld::load_json(&self.scene)
            .with_context(|| format!("loading scene {}", self.scene.display()))?;

        let config = match &self.config {
            Some(path) => {
                SessionConfig::from_json_file(path).with_context(|| format!("loading config {}", path.display()))?
            }
            None => SessionConfig::default(),
        };

        let session = SceneSession::new(config, self.seed).context("invalid session config")?;
        Ok((world, session))
    }
}

/// Parses `ASSET[=CLASS]`. The class defaults to the last path segment.
fn parse_request(value: &str) -> Result<SpawnRequest, String> {
    let (asset_ref, class_tag) = match value.split_once('=') {
        Some((asset_ref, class_tag)) => (asset_ref.trim(), class_tag.trim().to_string()),
        None => {
            let asset_ref = value.trim();
            let class_tag = asset_ref.rsplit('/').next().unwrap_or(asset_ref);
            let class_tag = class_tag.split('.').next().unwrap_or(class_tag);
            (asset_ref, class_tag.to_string())
        }
    };
    if asset_ref.is_empty() {
        return Err(format!("'{value}' has no asset reference"));
    }
    Ok(SpawnRequest::new(asset_ref, class_tag))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let directive = if args.verbose { "vantage=debug" } else { "vantage=info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .init();

    match args.command {
        Command::Generate(generate_args) => generate::run(generate_args),
        Command::Serve(serve_args) => serve::run(serve_args),
    }
}
