//! Enclave Launcher - Main Entry Point
//! Launches one isolated Fargate task per study and checks the tag index.

mod logging;
mod output;
mod settings;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use tracing::{info, warn};

use enclave_core::application::{cancel_channel, LaunchDecision, StudyLaunch, StudyService};
use enclave_infra_aws::{load_sdk_config, EcsOrchestrator, TaggingIndex};
use settings::{LauncherConfig, Overrides};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "enclave-launcher")]
#[command(about = "Launch and probe per-study research tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (default: ~/.enclave/launcher.toml, optional)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    overrides: OverrideArgs,
}

#[derive(Args)]
struct OverrideArgs {
    /// Cluster to run the study task on
    #[arg(long, global = true)]
    cluster: Option<String>,

    /// Base task definition (family, family:revision or ARN)
    #[arg(long, global = true)]
    base_task_definition: Option<String>,

    /// Subnet for the task network interface
    #[arg(long, global = true)]
    subnet: Option<String>,

    /// Security group for the task network interface
    #[arg(long, global = true)]
    security_group: Option<String>,

    /// Study identifier
    #[arg(long, global = true)]
    study_id: Option<String>,

    /// Container image every container of the study runs
    #[arg(long, global = true)]
    study_image: Option<String>,

    /// AWS region
    #[arg(long, global = true)]
    region: Option<String>,

    /// Per-operation deadline in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
}

impl From<OverrideArgs> for Overrides {
    fn from(args: OverrideArgs) -> Self {
        Overrides {
            cluster: args.cluster,
            base_task_definition: args.base_task_definition,
            subnet: args.subnet,
            security_group: args.security_group,
            study_id: args.study_id,
            study_image: args.study_image,
            region: args.region,
            timeout_secs: args.timeout_secs,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Derive the study task definition and run one task from it
    Launch {
        /// Probe the tag index first and skip if the study already has resources
        #[arg(long)]
        skip_if_exists: bool,

        /// Probe the tag index after launching (informational; the index may lag)
        #[arg(long)]
        verify: bool,
    },

    /// Check whether any task or task definition is tagged with the study
    Probe,
}

/// Exit non-zero unless every requested task was placed
fn ensure_placed(launch: &StudyLaunch) -> Result<()> {
    if !launch.task.is_success() {
        bail!(
            "Study {} launch not fully placed: {} (reasons: {})",
            launch.task.study_id,
            launch.task.status(),
            launch.task.failure_reasons().join(", ")
        );
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Initialize logging
    logging::init()?;
    info!("Enclave launcher v{} starting...", VERSION);

    // 2. Load configuration (once, passed down by reference)
    let overrides = Overrides::from(cli.overrides);
    let config = LauncherConfig::load(cli.config.as_deref(), &overrides)?;

    // 3. Setup dependencies (DI wiring)
    let sdk_config = load_sdk_config(config.region.clone()).await;
    let service = StudyService::new(
        Arc::new(EcsOrchestrator::new(&sdk_config)),
        Arc::new(TaggingIndex::new(&sdk_config)),
    );

    // 4. Ctrl+C aborts outstanding platform calls
    let (cancel_tx, cancel_token) = cancel_channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling outstanding calls");
            cancel_tx.cancel();
        }
    });
    let options = config.call_options().with_cancel(cancel_token);

    // 5. Run command
    match cli.command {
        Commands::Launch {
            skip_if_exists,
            verify,
        } => {
            let request = config
                .to_request()
                .context("Launch requires cluster, base task definition, subnet, security group, study id and image")?;

            let launch = if skip_if_exists {
                let decision = service.launch_if_absent(&request, &options).await?;
                output::print_decision(&decision, cli.json)?;
                match decision {
                    LaunchDecision::Launched(launch) => launch,
                    LaunchDecision::Skipped { .. } => return Ok(()),
                }
            } else {
                let launch = service.launch_study(&request, &options).await?;
                output::print_launch(&launch, cli.json)?;
                launch
            };

            if verify {
                let report = service.probe(&request.study_id, &options).await?;
                output::print_probe(&report, cli.json)?;
            }

            ensure_placed(&launch)?;
        }
        Commands::Probe => {
            let study_id = config.study_id().context("Probe requires a study id")?;
            let report = service.probe(&study_id, &options).await?;
            output::print_probe(&report, cli.json)?;
        }
    }

    info!("Done.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_accepts_verify_and_skip_flags() {
        let cli = Cli::try_parse_from([
            "enclave-launcher",
            "launch",
            "--verify",
            "--skip-if-exists",
            "--study-id",
            "s1",
        ])
        .unwrap();

        assert!(matches!(
            cli.command,
            Commands::Launch {
                skip_if_exists: true,
                verify: true
            }
        ));
        assert_eq!(cli.overrides.study_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_launch_defaults_to_no_verify() {
        let cli = Cli::try_parse_from(["enclave-launcher", "launch"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Launch {
                skip_if_exists: false,
                verify: false
            }
        ));
    }
}
