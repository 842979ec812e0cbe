//! edgekit - add-on manager for edge Kubernetes clusters

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, CommandFactory, FromArgMatches, Parser, Subcommand};
use kube::Client;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use edgekit::addons;
use edgekit::client::KubeResourceClient;
use edgekit::flags;
use edgekit::config::{AddonConfig, ClusterConfig, NetworkingConfig};
use edgekit::phases::{PhaseRunner, RunContext};

/// edgekit - install and remove edge add-ons on an existing cluster
#[derive(Parser, Debug)]
#[command(name = "edgekit", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Addon edge apps to a Kubernetes cluster
    Addon {
        #[command(subcommand)]
        target: AddonTarget,
    },

    /// Delete edge apps from a Kubernetes cluster
    Detach {
        #[command(subcommand)]
        target: AddonTarget,
    },
}

#[derive(Subcommand, Debug)]
enum AddonTarget {
    /// The edge apps: flannel CNI, cloud/edge tunnel, edge-health
    EdgeApps(EdgeAppsArgs),
}

/// Flags shared by `addon edge-apps` and `detach edge-apps`
#[derive(Args, Debug)]
struct EdgeAppsArgs {
    /// Manifests document of edge kubernetes cluster
    #[arg(long = flags::MANIFEST_DIR)]
    manifest_dir: Option<PathBuf>,

    /// The root certificate file for cluster
    #[arg(long = flags::CA_CERT, default_value = edgekit::DEFAULT_CA_CERT_PATH)]
    ca_cert_file: PathBuf,

    /// The root certificate key file for cluster
    #[arg(long = flags::CA_KEY, default_value = edgekit::DEFAULT_CA_KEY_PATH)]
    ca_key_file: PathBuf,

    /// The public IP for control plane
    #[arg(long = flags::MASTER_PUBLIC_ADDR, default_value = "")]
    master_public_addr: String,

    /// The cert SAN
    #[arg(long = flags::CERT_SANS)]
    cert_sans: Vec<String>,

    /// Edge related images registry, separated from the default
    /// --image-repository
    #[arg(
        long = flags::EDGE_IMAGE_REPOSITORY,
        env = "EDGEKIT_IMAGE_REPOSITORY",
        default_value = edgekit::DEFAULT_IMAGE_REPOSITORY
    )]
    image_repository: String,

    /// Edge related images' version
    #[arg(long = flags::EDGE_VERSION, default_value = edgekit::DEFAULT_VERSION)]
    version: String,

    /// Virtual address for edge nodes to reach cluster services
    #[arg(long = flags::EDGE_VIRTUAL_ADDR, default_value = edgekit::DEFAULT_VIRTUAL_ADDR)]
    virtual_addr: String,

    /// CIDR of the pod network
    #[arg(long = flags::POD_NETWORK_CIDR, default_value = "10.244.0.0/16")]
    pod_network_cidr: String,

    /// CIDR of cluster services
    #[arg(long = flags::SERVICE_CIDR, default_value = "10.96.0.0/12")]
    service_cidr: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    // Compose the phase list and inherited flags into the edge-apps help.
    // The association is static; it never affects execution.
    let runner = PhaseRunner::new(addons::install_phases())
        .map_err(|e| anyhow::anyhow!("invalid install phase tree: {e}"))?;
    let phase_help = phase_after_help(&runner);

    let cmd = Cli::command().mut_subcommand("addon", |addon| {
        addon.mut_subcommand("edge-apps", |edge| edge.after_help(phase_help))
    });
    let matches = cmd.get_matches();
    let cli = Cli::from_arg_matches(&matches)?;

    match cli.command {
        Commands::Addon {
            target: AddonTarget::EdgeApps(args),
        } => run_edge_apps(args, Operation::Install).await,
        Commands::Detach {
            target: AddonTarget::EdgeApps(args),
        } => run_edge_apps(args, Operation::Detach).await,
    }
}

/// Which way the reconciler is driven
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Install,
    Detach,
}

/// Build the run-context once, then hand off to the add-on entry points
async fn run_edge_apps(args: EdgeAppsArgs, op: Operation) -> anyhow::Result<()> {
    let client = Client::try_default().await?;

    let ctx = Arc::new(RunContext {
        cluster: ClusterConfig {
            networking: NetworkingConfig {
                pod_subnet: args.pod_network_cidr,
                service_subnet: args.service_cidr,
            },
        },
        config: AddonConfig {
            manifest_dir: args.manifest_dir,
            ca_cert_file: args.ca_cert_file,
            ca_key_file: args.ca_key_file,
            master_public_addr: args.master_public_addr,
            cert_sans: args.cert_sans,
            image_repository: args.image_repository,
            version: args.version,
            virtual_addr: args.virtual_addr,
        },
        client: Arc::new(KubeResourceClient::new(client)),
    });

    match op {
        Operation::Install => addons::install(&ctx).await?,
        Operation::Detach => addons::detach(&ctx).await?,
    }

    info!("Operation complete");
    Ok(())
}

/// Render the phase tree and its consumed flags for `--help`
fn phase_after_help(runner: &PhaseRunner) -> String {
    let mut out = String::from("Phases:\n");
    runner.walk(|depth, phase| {
        out.push_str(&format!(
            "{:indent$}{:<14} {}\n",
            "",
            phase.name,
            phase.short,
            indent = depth * 2 + 2
        ));
    });
    out.push_str("\nFlags consumed by phases: ");
    out.push_str(&runner.inherited_flags().join(", "));
    out
}
