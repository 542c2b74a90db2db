use crate::client::{ClusterConfig, KubeClient};
use crate::runner::{Runner, RunnerConfig};
use anyhow::{Context as _, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "globsync", version, about = "Replicates annotated ConfigMaps and Secrets to every namespace")]
struct Flags {
    /// Kubeconfig used when not running in-cluster (default: ~/.kube/config).
    #[arg(long, value_name = "PATH")]
    kubeconfig: Option<PathBuf>,

    /// Seconds between sync cycles.
    #[arg(long = "run-interval", value_name = "SECONDS", default_value_t = 60)]
    run_interval: u64,

    /// Run a single sync cycle and exit.
    #[arg(long = "run-once")]
    run_once: bool,

    /// Enable debug logging.
    #[arg(long)]
    debug: bool,
}

/// Application entrypoint: parse flags, wire the client, run the loop.
pub fn run() -> Result<()> {
    let flags = Flags::parse();
    init_tracing(flags.debug);
    debug!(?flags, "parsed flags");

    let kubeconfig = flags.kubeconfig.clone().or_else(default_kubeconfig);
    let config = ClusterConfig::resolve(kubeconfig.as_deref())
        .context("resolving cluster configuration")?;
    let client = KubeClient::connect(&config).context("building cluster client")?;

    let runner = Runner::new(
        client,
        RunnerConfig {
            interval: Duration::from_secs(flags.run_interval),
            once: flags.run_once,
        },
    );
    runner.init().context("startup permission check failed")?;
    runner.start().context("sync loop failed")?;
    Ok(())
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn default_kubeconfig() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".kube").join("config"))
}
