//! Flag identifiers shared between phase declarations and the CLI
//!
//! Each phase declares which of these it consumes via
//! [`Phase::with_inherit_flags`](crate::phases::Phase::with_inherit_flags).
//! The association is static and only composes help text; it never affects
//! execution order.

/// Pod network CIDR handed to the CNI add-on
pub const POD_NETWORK_CIDR: &str = "pod-network-cidr";

/// Cluster service CIDR
pub const SERVICE_CIDR: &str = "service-cidr";

/// Registry for edge component images
pub const EDGE_IMAGE_REPOSITORY: &str = "edge-image-repository";

/// Version tag for edge component images
pub const EDGE_VERSION: &str = "edge-version";

/// Virtual address used by edge nodes to reach cluster services
pub const EDGE_VIRTUAL_ADDR: &str = "edge-virtual-addr";

/// Public address of the control plane, reachable from edge nodes
pub const MASTER_PUBLIC_ADDR: &str = "master-public-addr";

/// Directory of user-supplied manifest overrides
pub const MANIFEST_DIR: &str = "manifest-dir";

/// Cluster root CA certificate file
pub const CA_CERT: &str = "ca.cert";

/// Cluster root CA key file
pub const CA_KEY: &str = "ca.key";

/// Additional subject alternative names for generated certificates
pub const CERT_SANS: &str = "certSANs";
