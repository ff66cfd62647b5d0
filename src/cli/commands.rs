//! Command-line interface structure

use clap::{Parser, Subcommand};

use crate::cli::args::{InspectArgs, RenderArgs, ValidateArgs};

/// Song-edit assembly and rendering pipeline
#[derive(Parser, Debug)]
#[command(name = "songcut", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a plan into a finished video
    Render(RenderArgs),
    /// Validate a plan's frame coverage without rendering
    Validate(ValidateArgs),
    /// Probe a local media file
    Inspect(InspectArgs),
}
