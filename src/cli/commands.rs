//! Handlers for the watch loop and the publish subcommand.

use std::path::{Path, PathBuf};

use super::args::{Args, Command};
use crate::camera::{StillCamera, StillSettings};
use crate::config::{default_auth_path, Config, ConfigError};
use crate::motion::MotionDetector;
use crate::motion_loop::{LoopReport, LoopSettings, MotionLoop};
use crate::persist::CapturePersister;
use crate::shutdown::Shutdown;
use crate::social::{
    CredentialError, Credentials, MediaPublisher, PostRecord, PublishError, Publisher,
    SocialError, TwitterClient,
};
use crate::storage::DiskBudgetKeeper;

/// Errors that end the program before or instead of the loop.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("capture directory {} does not exist", .0.display())]
    MissingDirectory(PathBuf),

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Credentials(#[from] CredentialError),

    #[error(transparent)]
    Social(#[from] SocialError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// Check that captures can go into `dir`.
pub fn validate_capture_dir(dir: &Path) -> Result<(), CliError> {
    if !dir.exists() {
        return Err(CliError::MissingDirectory(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(CliError::NotADirectory(dir.to_path_buf()));
    }
    Ok(())
}

/// Load the config named on the command line, or the default one.
///
/// A missing default file means built-in defaults; a missing explicit file is
/// an error.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::load_from_explicit(path.to_path_buf()),
        None => Config::load(None),
    }
}

/// Dispatch parsed arguments.
pub async fn run(args: Args, shutdown: Shutdown) -> Result<(), CliError> {
    match args.command {
        Some(Command::Publish { image, auth_file }) => {
            let auth_file = auth_file.unwrap_or_else(default_auth_path);
            let post = publish_once(&image, &auth_file).await?;
            println!("Posted {}: {}", post.id, post.text);
            Ok(())
        }
        None => {
            // clap guarantees DIR when no subcommand is given
            let dir = args.dir.unwrap_or_default();
            validate_capture_dir(&dir)?;
            let config = load_config(args.config.as_deref())?;

            let report = if args.dry_run {
                let iterations = args.iterations.unwrap_or(config.dry_run.iterations);
                run_dry(&config, &dir, iterations, shutdown).await
            } else {
                let auth_file = args.auth_file.unwrap_or_else(default_auth_path);
                run_live(&config, &dir, &auth_file, shutdown).await?
            };
            log::debug!("{:?}", report);
            Ok(())
        }
    }
}

/// Watch the real camera and post to the real account until shutdown.
pub async fn run_live(
    config: &Config,
    dir: &Path,
    auth_file: &Path,
    shutdown: Shutdown,
) -> Result<LoopReport, CliError> {
    let credentials = Credentials::resolve(auth_file)?;
    let publisher = MediaPublisher::new(TwitterClient::new(credentials)?);

    let camera = StillCamera::new(StillSettings::from(&config.camera));
    let persister = CapturePersister::new(
        dir,
        config.camera.save_resolution(),
        config.camera.save_timeout(),
        config.storage.reserve_bytes,
        DiskBudgetKeeper::default(),
    );

    log::info!(
        "Watching with {} at {} (threshold {}, sensitivity {}), saving to {}",
        config.camera.command,
        config.motion.test_resolution(),
        config.motion.threshold,
        config.motion.sensitivity,
        dir.display()
    );

    let mut motion_loop = MotionLoop::new(
        LoopSettings::from(config),
        MotionDetector::from(&config.motion),
        camera,
        persister,
        publisher,
        shutdown,
    );
    Ok(motion_loop.run(None).await)
}

/// Run `iterations` comparisons against a simulated camera.
pub async fn run_dry(config: &Config, dir: &Path, iterations: u64, shutdown: Shutdown) -> LoopReport {
    log::info!("[dry-run] {} iterations, nothing will be captured or posted", iterations);
    MotionLoop::dry_run(config, dir, shutdown)
        .run(Some(iterations))
        .await
}

/// Post one image, once.
pub async fn publish_once(image: &Path, auth_file: &Path) -> Result<PostRecord, CliError> {
    let credentials = Credentials::resolve(auth_file)?;
    let publisher = MediaPublisher::new(TwitterClient::new(credentials)?);
    Ok(publisher.publish(image).await?)
}
