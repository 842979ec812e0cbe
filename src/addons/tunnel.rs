//! Cloud/edge tunnel add-on
//!
//! The tunnel carries apiserver traffic between the cloud control plane and
//! edge nodes that sit behind NAT. The cloud side terminates connections on a
//! NodePort; the edge daemon dials out to the control plane's public address.

use std::collections::BTreeMap;

use tracing::info;

use crate::config::{AddonConfig, ClusterConfig};
use crate::error::Error;
use crate::manifests::{ManifestRegistry, Resolver, TUNNEL_EDGE};
use crate::phases::{Phase, RunContext};
use crate::template::{ResourceDocument, TemplateEngine};
use crate::{flags, reconcile, Result};

/// Install phase for the tunnel add-on
pub fn phase() -> Phase {
    Phase::action(
        "tunnel",
        "Install the cloud/edge tunnel add-on to the cluster",
        |ctx| Box::pin(async move { install(&ctx).await }),
    )
    .with_long(
        "Install the tunnel connecting the cloud control plane with edge nodes behind NAT.",
    )
    .with_inherit_flags([
        flags::MASTER_PUBLIC_ADDR,
        flags::EDGE_VIRTUAL_ADDR,
        flags::EDGE_IMAGE_REPOSITORY,
        flags::EDGE_VERSION,
        flags::MANIFEST_DIR,
    ])
}

/// Substitution context for the tunnel manifest.
///
/// Requires the control plane's public address (edge nodes dial it) and the
/// virtual address; cert material in the config is carried by an external
/// collaborator and not rendered here.
pub fn build_params(
    _cluster: &ClusterConfig,
    config: &AddonConfig,
) -> Result<BTreeMap<String, String>> {
    if config.master_public_addr.is_empty() {
        return Err(Error::missing_parameter(
            TUNNEL_EDGE,
            flags::MASTER_PUBLIC_ADDR,
        ));
    }
    if config.virtual_addr.is_empty() {
        return Err(Error::missing_parameter(
            TUNNEL_EDGE,
            flags::EDGE_VIRTUAL_ADDR,
        ));
    }

    let mut params = BTreeMap::new();
    params.insert(
        "tunnel_cloud_image".to_string(),
        config.image("tunnel-cloud"),
    );
    params.insert("tunnel_edge_image".to_string(), config.image("tunnel-edge"));
    params.insert(
        "master_public_addr".to_string(),
        config.master_public_addr.clone(),
    );
    params.insert("virtual_addr".to_string(), config.virtual_addr.clone());
    Ok(params)
}

fn rendered_documents(ctx: &RunContext) -> Result<Vec<ResourceDocument>> {
    let params = build_params(&ctx.cluster, &ctx.config)?;
    let resolver = Resolver::new(ManifestRegistry::builtin(), ctx.config.manifest_dir.clone());
    let text = resolver.resolve(TUNNEL_EDGE)?;
    TemplateEngine::new().render(TUNNEL_EDGE, &text, &params)
}

/// Render and apply the tunnel manifest
pub async fn install(ctx: &RunContext) -> Result<()> {
    let docs = rendered_documents(ctx)?;
    reconcile::apply(ctx.client.as_ref(), &docs).await?;
    info!(addon = TUNNEL_EDGE, "add-on deployed");
    Ok(())
}

/// Render and delete the tunnel manifest, best-effort. Returns the number
/// of documents in the teardown set.
pub async fn remove(ctx: &RunContext) -> Result<usize> {
    let docs = rendered_documents(ctx)?;
    reconcile::delete(ctx.client.as_ref(), &docs).await?;
    info!(addon = TUNNEL_EDGE, "add-on removed");
    Ok(docs.len())
}
