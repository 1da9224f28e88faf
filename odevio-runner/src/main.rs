//! Odevio Build
//!
//! Builds a Flutter iOS application on Odevio from a CI job.
//!
//! Architecture:
//! - Parameters: action inputs merged over the project's `.odevio` file
//! - Archive: the project sources zipped minus ignored entries
//! - Repository: HTTP communication with Odevio
//! - Scheduler: waiting for the remote build to finish
//! - Service: the pipeline chaining the stages together
//!
//! The IPA URL of an ad-hoc build is published as the `ipa` step output.

mod archive;
mod config;
mod dotfile;
mod error;
mod host;
mod ignore;
mod params;
mod repository;
mod scheduler;
mod service;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use odevio_client::{DEFAULT_API_URL, OdevioClient};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::dotfile::CONFIG_FILE;
use crate::error::RunnerError;
use crate::host::ActionHost;
use crate::params::{ConfigFile, Inputs, ParameterResolver};
use crate::repository::HttpBuildRepository;
use crate::service::{BuildOutcome, BuildPipeline};

#[derive(Parser)]
#[command(name = "odevio-build")]
#[command(about = "Build a Flutter iOS application on Odevio", long_about = None)]
struct Cli {
    /// Odevio API key
    #[arg(long, env = "INPUT_API-KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Key of the application on Odevio
    #[arg(long, env = "INPUT_APP-KEY")]
    app_key: Option<String>,

    /// Directory of the Flutter project
    #[arg(long, env = "INPUT_DIRECTORY")]
    directory: Option<String>,

    /// One of publication, ad-hoc or validation
    #[arg(long, env = "INPUT_BUILD-TYPE")]
    build_type: Option<String>,

    /// Flutter version to build with
    #[arg(long, env = "INPUT_FLUTTER")]
    flutter: Option<String>,

    #[arg(long, env = "INPUT_MINIMAL-IOS-VERSION")]
    minimal_ios_version: Option<String>,

    #[arg(long, env = "INPUT_APP-VERSION")]
    app_version: Option<String>,

    /// Integer build number
    #[arg(long, env = "INPUT_BUILD-NUMBER")]
    build_number: Option<String>,

    #[arg(long, env = "INPUT_MODE")]
    mode: Option<String>,

    #[arg(long, env = "INPUT_TARGET")]
    target: Option<String>,

    #[arg(long, env = "INPUT_FLAVOR")]
    flavor: Option<String>,

    /// Command run on the build machine once the build is done
    #[arg(long, env = "INPUT_POST-BUILD-COMMAND")]
    post_build_command: Option<String>,

    /// Odevio API root
    #[arg(long, env = "ODEVIO_API_URL", default_value = DEFAULT_API_URL, hide = true)]
    api_url: String,

    /// Seconds between two status requests
    #[arg(long, default_value_t = 5)]
    poll_interval: u64,

    /// Give up waiting for the build after this many seconds
    #[arg(long)]
    poll_timeout: Option<u64>,
}

impl Cli {
    fn inputs(&self) -> Inputs {
        Inputs::new()
            .with(params::APP_KEY, self.app_key.clone())
            .with(params::DIRECTORY, self.directory.clone())
            .with(params::BUILD_TYPE, self.build_type.clone())
            .with(params::FLUTTER, self.flutter.clone())
            .with(params::MINIMAL_IOS_VERSION, self.minimal_ios_version.clone())
            .with(params::APP_VERSION, self.app_version.clone())
            .with(params::BUILD_NUMBER, self.build_number.clone())
            .with(params::MODE, self.mode.clone())
            .with(params::TARGET, self.target.clone())
            .with(params::FLAVOR, self.flavor.clone())
            .with(params::POST_BUILD_COMMAND, self.post_build_command.clone())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "odevio_runner=info,odevio_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let host = ActionHost::from_env();

    match run(cli, &host).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            host.fail(&failure_message(&e));
            ExitCode::FAILURE
        }
    }
}

/// Runner errors already carry their cause in their message
fn failure_message(e: &anyhow::Error) -> String {
    match e.downcast_ref::<RunnerError>() {
        Some(err) => {
            if err.is_configuration_error() {
                warn!("Nothing was sent to Odevio; check the action inputs and {}", CONFIG_FILE);
            }
            err.to_string()
        }
        None => format!("{:#}", e),
    }
}

/// Resolves once `signal` fires
///
/// When the handler cannot be installed the run goes on uninterruptible.
async fn interrupted(signal: impl Future<Output = io::Result<()>>) {
    if let Err(e) = signal.await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Sets the step outputs of a successful run
fn publish_outputs(host: &ActionHost, outcome: &BuildOutcome) -> Result<()> {
    if let Some(ipa) = &outcome.artifact {
        host.set_output("ipa", &ipa.url)
            .context("Failed to set the ipa output")?;
    }
    Ok(())
}

async fn run(cli: Cli, host: &ActionHost) -> Result<()> {
    let working_dir = std::env::current_dir().context("Failed to resolve working directory")?;
    let inputs = cli.inputs();

    let raw = dotfile::read(
        CONFIG_FILE,
        inputs.get(params::DIRECTORY).map(std::path::Path::new),
        &working_dir,
    )?;
    let file = raw.as_deref().map(ConfigFile::parse);
    let request = ParameterResolver::new(&inputs, file.as_ref()).resolve()?;

    let api_key = cli.api_key.as_deref().map(str::trim).unwrap_or_default().to_string();
    let config = Config::new(api_key, working_dir)
        .with_api_url(cli.api_url)
        .with_poll_interval(Duration::from_secs(cli.poll_interval))
        .with_poll_timeout(cli.poll_timeout.map(Duration::from_secs));
    config.validate()?;

    let client = OdevioClient::new(config.api_url.clone(), config.api_key.clone());
    let repository = Arc::new(HttpBuildRepository::new(client));
    let pipeline = BuildPipeline::new(config, repository);

    let outcome = tokio::select! {
        outcome = pipeline.run(&request) => outcome?,
        _ = interrupted(tokio::signal::ctrl_c()) => {
            warn!("Interrupted; a build already submitted keeps running on Odevio");
            anyhow::bail!("Interrupted");
        }
    };

    publish_outputs(host, &outcome)?;

    info!("Build {} finished", outcome.job.key);
    println!(
        "{} {} succeeded",
        "✓".green().bold(),
        request.build_type.as_str()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use odevio_core::domain::artifact::ArtifactDescriptor;
    use odevio_core::domain::job::BuildJob;
    use tokio::time;

    fn outcome(artifact: Option<&str>) -> BuildOutcome {
        BuildOutcome {
            job: BuildJob {
                key: "b-42".to_string(),
                status_code: Some("succeeded".to_string()),
                error_message: None,
            },
            artifact: artifact.map(|url| ArtifactDescriptor {
                url: url.to_string(),
            }),
        }
    }

    #[test]
    fn test_ad_hoc_outcome_sets_ipa_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("github_output");
        let host = ActionHost::with_output_file(Some(path.clone()));

        publish_outputs(&host, &outcome(Some("https://x/y.ipa"))).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "ipa=https://x/y.ipa\n");
    }

    #[test]
    fn test_outcome_without_artifact_sets_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("github_output");
        let host = ActionHost::with_output_file(Some(path.clone()));

        publish_outputs(&host, &outcome(None)).unwrap();

        assert!(!path.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_interrupts() {
        let fired = time::timeout(
            Duration::from_secs(1),
            interrupted(async { Ok::<(), io::Error>(()) }),
        )
        .await;
        assert!(fired.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_signal_setup_failure_never_interrupts() {
        let fired = time::timeout(
            Duration::from_secs(60),
            interrupted(async { Err::<(), _>(io::Error::other("no signal handler")) }),
        )
        .await;
        assert!(fired.is_err());
    }
}
