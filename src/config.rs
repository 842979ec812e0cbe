//! Add-on and cluster configuration
//!
//! Both structs are immutable once constructed for an invocation: the CLI
//! layer validates flags, builds them, and passes them by reference into every
//! downstream call. Parameter builders in [`crate::addons`] read from them;
//! nothing in the core mutates them.

use std::path::PathBuf;

/// Cluster-facing parameters required for rendering add-on manifests.
///
/// Mirrors the command surface: manifest override directory, certificate
/// material, addressing, and image coordinates. Certificate files are carried
/// as paths only; loading them is the caller's concern.
#[derive(Debug, Clone, Default)]
pub struct AddonConfig {
    /// Directory of user-supplied manifest overrides, if any
    pub manifest_dir: Option<PathBuf>,
    /// Cluster root CA certificate file
    pub ca_cert_file: PathBuf,
    /// Cluster root CA key file
    pub ca_key_file: PathBuf,
    /// Public address of the control plane, reachable from edge nodes
    pub master_public_addr: String,
    /// Additional subject alternative names for generated certificates
    pub cert_sans: Vec<String>,
    /// Registry for edge component images
    pub image_repository: String,
    /// Version tag for edge component images
    pub version: String,
    /// Virtual address used by edge nodes to reach cluster services
    pub virtual_addr: String,
}

impl AddonConfig {
    /// Full image reference for an edge component, e.g. `flannel` ->
    /// `superedge.tencentcloudcr.com/superedge/flannel:v0.9.0`.
    pub fn image(&self, component: &str) -> String {
        format!(
            "{}/{}:{}",
            self.image_repository.trim_end_matches('/'),
            component,
            self.version
        )
    }
}

/// Networking section of the cluster configuration
#[derive(Debug, Clone, Default)]
pub struct NetworkingConfig {
    /// CIDR assigned to the pod network
    pub pod_subnet: String,
    /// CIDR assigned to cluster services
    pub service_subnet: String,
}

/// The subset of cluster configuration add-ons render against.
///
/// Resolved once per invocation by the CLI layer (kubeadm-style); add-ons
/// consume only the fields they declare and ignore the rest.
#[derive(Debug, Clone, Default)]
pub struct ClusterConfig {
    /// Cluster networking parameters
    pub networking: NetworkingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_joins_repository_component_and_tag() {
        let cfg = AddonConfig {
            image_repository: "registry.local/edge".to_string(),
            version: "v1.2.3".to_string(),
            ..Default::default()
        };
        assert_eq!(cfg.image("flannel"), "registry.local/edge/flannel:v1.2.3");
    }

    #[test]
    fn image_tolerates_trailing_slash_in_repository() {
        let cfg = AddonConfig {
            image_repository: "registry.local/edge/".to_string(),
            version: "v1.2.3".to_string(),
            ..Default::default()
        };
        assert_eq!(
            cfg.image("tunnel-cloud"),
            "registry.local/edge/tunnel-cloud:v1.2.3"
        );
    }
}
