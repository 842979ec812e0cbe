//! Flannel CNI add-on

use std::collections::BTreeMap;

use tracing::info;

use crate::config::{AddonConfig, ClusterConfig};
use crate::error::Error;
use crate::manifests::{ManifestRegistry, Resolver, KUBE_FLANNEL};
use crate::phases::{Phase, RunContext};
use crate::template::{ResourceDocument, TemplateEngine};
use crate::{flags, reconcile, Result};

/// Install phase for the flannel add-on
pub fn phase() -> Phase {
    Phase::action(
        "flannel",
        "Install the flannel add-on to the cluster",
        |ctx| Box::pin(async move { install(&ctx).await }),
    )
    .with_long("Install the flannel network plugin designed for Kubernetes.")
    .with_inherit_flags([
        flags::POD_NETWORK_CIDR,
        flags::EDGE_IMAGE_REPOSITORY,
        flags::EDGE_VERSION,
        flags::MANIFEST_DIR,
    ])
}

/// Substitution context for the flannel manifest.
///
/// Requires a non-empty pod network CIDR; everything else the config carries
/// is ignored here.
pub fn build_params(
    cluster: &ClusterConfig,
    config: &AddonConfig,
) -> Result<BTreeMap<String, String>> {
    if cluster.networking.pod_subnet.is_empty() {
        return Err(Error::missing_parameter(
            KUBE_FLANNEL,
            flags::POD_NETWORK_CIDR,
        ));
    }

    let mut params = BTreeMap::new();
    params.insert(
        "pod_network_cidr".to_string(),
        cluster.networking.pod_subnet.clone(),
    );
    params.insert("flannel_image".to_string(), config.image("flannel"));
    Ok(params)
}

fn rendered_documents(ctx: &RunContext) -> Result<Vec<ResourceDocument>> {
    let params = build_params(&ctx.cluster, &ctx.config)?;
    let resolver = Resolver::new(ManifestRegistry::builtin(), ctx.config.manifest_dir.clone());
    let text = resolver.resolve(KUBE_FLANNEL)?;
    TemplateEngine::new().render(KUBE_FLANNEL, &text, &params)
}

/// Render and apply the flannel manifest
pub async fn install(ctx: &RunContext) -> Result<()> {
    let docs = rendered_documents(ctx)?;
    reconcile::apply(ctx.client.as_ref(), &docs).await?;
    info!(addon = KUBE_FLANNEL, "add-on deployed");
    Ok(())
}

/// Render and delete the flannel manifest, best-effort. Returns the number
/// of documents in the teardown set.
pub async fn remove(ctx: &RunContext) -> Result<usize> {
    let docs = rendered_documents(ctx)?;
    reconcile::delete(ctx.client.as_ref(), &docs).await?;
    info!(addon = KUBE_FLANNEL, "add-on removed");
    Ok(docs.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::FakeCluster;
    use crate::client::build_api_resource;
    use std::io::Write;
    use std::sync::Arc;

    fn context_with(cluster: Arc<FakeCluster>, pod_subnet: &str) -> Arc<RunContext> {
        Arc::new(RunContext {
            cluster: ClusterConfig {
                networking: crate::config::NetworkingConfig {
                    pod_subnet: pod_subnet.to_string(),
                    service_subnet: "10.96.0.0/12".to_string(),
                },
            },
            config: AddonConfig {
                image_repository: crate::DEFAULT_IMAGE_REPOSITORY.to_string(),
                version: crate::DEFAULT_VERSION.to_string(),
                virtual_addr: crate::DEFAULT_VIRTUAL_ADDR.to_string(),
                ..Default::default()
            },
            client: cluster,
        })
    }

    #[test]
    fn build_params_requires_pod_subnet() {
        let err = build_params(&ClusterConfig::default(), &AddonConfig::default()).unwrap_err();
        match err {
            Error::MissingParameter { addon, flag } => {
                assert_eq!(addon, KUBE_FLANNEL);
                assert_eq!(flag, flags::POD_NETWORK_CIDR);
            }
            other => panic!("expected MissingParameter, got {other}"),
        }
    }

    #[tokio::test]
    async fn install_renders_subnet_into_default_template() {
        let ctx = context_with(Arc::new(FakeCluster::new()), "10.244.0.0/16");
        install(&ctx).await.unwrap();

        // One create per document in the default template.
        let docs = rendered_documents(&ctx).unwrap();
        assert_eq!(docs.len(), 5);

        let ar = build_api_resource("v1", "ConfigMap");
        let cfg = ctx
            .client
            .get(&ar, Some("kube-system"), "kube-flannel-cfg")
            .await
            .unwrap()
            .unwrap();
        let net_conf = cfg.data["data"]["net-conf.json"].as_str().unwrap();
        assert!(net_conf.contains("10.244.0.0/16"));
        assert!(!net_conf.contains("{{"));
    }

    #[tokio::test]
    async fn missing_subnet_fails_before_any_cluster_call() {
        let cluster = Arc::new(FakeCluster::new());
        let ctx = Arc::new(RunContext {
            cluster: ClusterConfig::default(),
            config: AddonConfig::default(),
            client: cluster.clone(),
        });

        let err = install(&ctx).await.unwrap_err();
        assert!(matches!(err, Error::MissingParameter { .. }));
        assert_eq!(cluster.counts().creates, 0);
    }

    #[tokio::test]
    async fn override_manifest_is_rendered_instead_of_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(format!("{KUBE_FLANNEL}.yaml"));
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: my-flannel\n  namespace: kube-system\ndata:\n  cidr: {}\n",
            "\"{{ pod_network_cidr }}\""
        )
        .unwrap();

        let mut ctx = context_with(Arc::new(FakeCluster::new()), "10.244.0.0/16");
        Arc::get_mut(&mut ctx).unwrap().config.manifest_dir = Some(dir.path().to_path_buf());

        install(&ctx).await.unwrap();

        let ar = build_api_resource("v1", "ConfigMap");
        assert!(ctx
            .client
            .get(&ar, Some("kube-system"), "my-flannel")
            .await
            .unwrap()
            .is_some());
        // The built-in template's DaemonSet was never applied.
        let ds = build_api_resource("apps/v1", "DaemonSet");
        assert!(ctx
            .client
            .get(&ds, Some("kube-system"), "kube-flannel-ds")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn remove_succeeds_when_nothing_installed() {
        let ctx = context_with(Arc::new(FakeCluster::new()), "10.244.0.0/16");
        // Reports the full document set even when every delete was a no-op.
        assert_eq!(remove(&ctx).await.unwrap(), 5);
    }
}
