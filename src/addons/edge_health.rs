//! Edge-health add-on
//!
//! A per-node daemon that probes edge node health over the virtual address
//! and reports it back, so the control plane can distinguish an unreachable
//! edge site from a dead node.

use std::collections::BTreeMap;

use tracing::info;

use crate::config::{AddonConfig, ClusterConfig};
use crate::error::Error;
use crate::manifests::{ManifestRegistry, Resolver, EDGE_HEALTH};
use crate::phases::{Phase, RunContext};
use crate::template::{ResourceDocument, TemplateEngine};
use crate::{flags, reconcile, Result};

/// Install phase for the edge-health add-on
pub fn phase() -> Phase {
    Phase::action(
        "edge-health",
        "Install the edge-health add-on to the cluster",
        |ctx| Box::pin(async move { install(&ctx).await }),
    )
    .with_long("Install the distributed health checker for edge nodes.")
    .with_inherit_flags([
        flags::EDGE_VIRTUAL_ADDR,
        flags::EDGE_IMAGE_REPOSITORY,
        flags::EDGE_VERSION,
        flags::MANIFEST_DIR,
    ])
}

/// Substitution context for the edge-health manifest
pub fn build_params(
    _cluster: &ClusterConfig,
    config: &AddonConfig,
) -> Result<BTreeMap<String, String>> {
    if config.virtual_addr.is_empty() {
        return Err(Error::missing_parameter(
            EDGE_HEALTH,
            flags::EDGE_VIRTUAL_ADDR,
        ));
    }

    let mut params = BTreeMap::new();
    params.insert(
        "edge_health_image".to_string(),
        config.image("edge-health"),
    );
    params.insert("virtual_addr".to_string(), config.virtual_addr.clone());
    Ok(params)
}

fn rendered_documents(ctx: &RunContext) -> Result<Vec<ResourceDocument>> {
    let params = build_params(&ctx.cluster, &ctx.config)?;
    let resolver = Resolver::new(ManifestRegistry::builtin(), ctx.config.manifest_dir.clone());
    let text = resolver.resolve(EDGE_HEALTH)?;
    TemplateEngine::new().render(EDGE_HEALTH, &text, &params)
}

/// Render and apply the edge-health manifest
pub async fn install(ctx: &RunContext) -> Result<()> {
    let docs = rendered_documents(ctx)?;
    reconcile::apply(ctx.client.as_ref(), &docs).await?;
    info!(addon = EDGE_HEALTH, "add-on deployed");
    Ok(())
}

/// Render and delete the edge-health manifest, best-effort. Returns the
/// number of documents in the teardown set.
pub async fn remove(ctx: &RunContext) -> Result<usize> {
    let docs = rendered_documents(ctx)?;
    reconcile::delete(ctx.client.as_ref(), &docs).await?;
    info!(addon = EDGE_HEALTH, "add-on removed");
    Ok(docs.len())
}
