//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Watches a camera for motion and posts what it sees
#[derive(Parser, Debug)]
#[command(name = "motion-tweet")]
#[command(version, about = "Motion-triggered camera that posts captures", long_about = None)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
#[command(after_help = "EXAMPLES:
    # Watch the camera, saving captures under /var/lib/motion
    motion-tweet /var/lib/motion

    # Try the pipeline without a camera or network
    motion-tweet --dry-run --iterations 20 /tmp/motion

    # Post one existing image
    motion-tweet publish photo.jpg")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Directory to save captures in (must exist)
    #[arg(required = true, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Simulate the camera and publishing, then stop
    #[arg(long)]
    pub dry_run: bool,

    /// Number of comparisons in a dry run (default from config)
    #[arg(long, value_name = "N", requires = "dry_run")]
    pub iterations: Option<u64>,

    /// Config file path
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Secrets file with API key, API secret, access token and access token
    /// secret on its first four lines
    #[arg(long, value_name = "PATH")]
    pub auth_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Publish one image now, without retrying
    Publish {
        /// Image to post
        image: PathBuf,

        /// Secrets file (see the main command)
        #[arg(long, value_name = "PATH")]
        auth_file: Option<PathBuf>,
    },
}
