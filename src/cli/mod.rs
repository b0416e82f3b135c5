//! Command-line interface definitions and handlers.

mod args;
mod commands;

pub use args::{Args, Command};
pub use commands::{
    load_config, publish_once, run, run_dry, run_live, validate_capture_dir, CliError,
};
