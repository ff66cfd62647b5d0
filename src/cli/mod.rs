// CLI layer

pub mod args;
pub mod commands;

pub use args::{InspectArgs, RenderArgs, ValidateArgs};
pub use commands::{Cli, Commands};
