//! rig-export - skinned mesh and animation export tool
//!
//! Reads a JSON scene and writes an armature, its skinned meshes and the
//! selected clips to a chunked binary asset.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use rig_export::{
    ErrorKind, ExportConfig, SceneDocument, export_scene, inspect_asset, write_asset_file,
};

const CLIP_HELP: &str = "\
<CLIPS> is a ';'-separated list of clip selectors:
  Walk              the whole frame range of action 'Walk'
  Walk+1-2          offset the first frame by +1 and the last by -2
  Jog=Run           export action 'Run' under the name 'Jog'
  [100,150]Idle     frames 100 to 150 of the timeline, named 'Idle'
  Walk!first        root motion mode: local (default), global, or first";

#[derive(Parser)]
#[command(name = "rig-export")]
#[command(about = "Skinned mesh and animation export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Export an armature (or a mesh and its armature) with animation clips
    #[command(after_help = CLIP_HELP)]
    Export {
        /// Input scene file (JSON)
        infile: PathBuf,

        /// Armature or mesh object to export
        object: String,

        /// Clip selectors, separated by ';'
        clips: String,

        /// Output asset file
        outfile: PathBuf,

        /// Export configuration (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Decode an asset and print a summary
    Inspect {
        /// Asset file to inspect
        asset: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // help and version go to stdout and are not failures
            let _ = err.print();
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    // Initialize logging
    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Export {
            infile,
            object,
            clips,
            outfile,
            config,
        } => {
            let config = match config {
                Some(path) => ExportConfig::load(&path)?,
                None => ExportConfig::default(),
            };

            tracing::info!(
                "Will read {:?} and export object '{}' with clips '{}'",
                infile,
                object,
                clips
            );
            let mut scene = SceneDocument::load(&infile)?;

            let output = export_scene(&mut scene, &object, &clips, &config).inspect_err(|err| {
                if err.kind() == ErrorKind::Configuration {
                    tracing::error!("{}", CLIP_HELP);
                }
            })?;
            if !output.warnings.is_empty() {
                tracing::warn!("{} data warnings", output.warnings.len());
            }

            write_asset_file(&output.asset, &outfile)?;
            tracing::info!("Done!");
        }

        Commands::Inspect { asset } => {
            inspect_asset(&asset)?;
        }
    }

    Ok(())
}
