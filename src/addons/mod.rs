//! Per-add-on wiring and the install/detach entry points
//!
//! Install walks a phase tree: a `cni` group for the network plugin, then an
//! `edge-apps` group for the edge workloads, fail-fast in declaration order.
//!
//! Detach deliberately does not mirror that tree. Teardown ordering
//! constraints are looser, so it runs flat over the add-ons in reverse
//! install order, best-effort: per-document failures are collected across
//! add-ons and reported together, and teardown keeps going to maximize
//! cleanup.

pub mod edge_health;
pub mod flannel;
pub mod tunnel;

use std::sync::Arc;

use tracing::info;

use crate::error::Error;
use crate::phases::{Phase, PhaseRunner, RunContext};
use crate::Result;

/// The install phase tree for the current operation
pub fn install_phases() -> Vec<Phase> {
    vec![
        Phase::group(
            "cni",
            "Install network designed for Kubernetes",
            vec![flannel::phase()],
        ),
        Phase::group(
            "edge-apps",
            "Install edge workloads to the cluster",
            vec![tunnel::phase(), edge_health::phase()],
        ),
    ]
}

/// Install all edge add-ons to the cluster.
///
/// Halts on the first failing phase; earlier phases stay applied and the
/// whole operation is safe to re-run.
pub async fn install(ctx: &Arc<RunContext>) -> Result<()> {
    info!("Start install addon apps to your cluster");
    PhaseRunner::new(install_phases())?.run(ctx).await?;
    info!("All edge add-ons deployed");
    Ok(())
}

/// Remove all edge add-ons from the cluster, best-effort.
///
/// Add-ons are torn down in reverse install order. All failures are merged
/// across add-ons into one [`Error::ResourceDeleteFailed`]: per-document
/// deletion failures by identity, and add-ons that could not render their
/// document set (a missing parameter, say) as a single entry. The reported
/// total counts every document walked, succeeded or not.
pub async fn detach(ctx: &RunContext) -> Result<()> {
    info!("Start uninstall addon apps from your cluster");

    let results = [
        edge_health::remove(ctx).await,
        tunnel::remove(ctx).await,
        flannel::remove(ctx).await,
    ];

    let mut failures = Vec::new();
    let mut total = 0;
    for result in results {
        match result {
            Ok(count) => total += count,
            Err(Error::ResourceDeleteFailed {
                total: t,
                failures: f,
                ..
            }) => {
                total += t;
                failures.extend(f);
            }
            // No document set to walk for this add-on; report it with the
            // rest instead of dropping what earlier add-ons collected.
            Err(other) => failures.push(other.to_string()),
        }
    }

    if failures.is_empty() {
        info!("All edge add-ons removed");
        Ok(())
    } else {
        Err(Error::ResourceDeleteFailed {
            failed: failures.len(),
            total,
            failures,
        })
    }
}
