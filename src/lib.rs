//! edgekit - add-on manager for edge Kubernetes clusters
//!
//! edgekit installs and removes optional cluster components (the flannel CNI
//! and edge-specific workloads) on an existing cluster. Each add-on is a named
//! manifest template; installing one renders the template with parameters from
//! the active configuration and reconciles the resulting resource documents
//! against the cluster API.
//!
//! # Architecture
//!
//! Install walks a tree of named phases in declaration order; each leaf phase
//! resolves its manifest (user override wins over the built-in default),
//! builds the substitution context, renders, and applies the documents with
//! create-or-update semantics. Detach reuses the same leaf components but
//! drives deletion flat and best-effort: not-found is success and per-document
//! failures never stop the remaining teardown.
//!
//! # Modules
//!
//! - [`addons`] - Per-add-on wiring (flannel, tunnel, edge-health) and the
//!   install/detach entry points
//! - [`client`] - Capability-typed cluster API client
//! - [`config`] - Add-on and cluster configuration
//! - [`flags`] - Flag identifiers shared between phases and the CLI
//! - [`manifests`] - Built-in template registry and override resolver
//! - [`phases`] - Phase workflow engine and shared run-context
//! - [`reconcile`] - Resource apply/delete reconciliation
//! - [`template`] - Manifest template rendering
//! - [`error`] - Error types

#![cfg_attr(not(test), deny(missing_docs))]

pub mod addons;
pub mod client;
pub mod config;
pub mod error;
pub mod flags;
pub mod manifests;
pub mod phases;
pub mod reconcile;
pub mod template;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Default Configuration Constants
// =============================================================================
// Defaults shared by the CLI flag definitions and test fixtures.

/// Default registry for edge component images
pub const DEFAULT_IMAGE_REPOSITORY: &str = "superedge.tencentcloudcr.com/superedge";

/// Default version tag for edge component images
pub const DEFAULT_VERSION: &str = "v0.9.0";

/// Default virtual address used by edge nodes to reach cluster services
pub const DEFAULT_VIRTUAL_ADDR: &str = "169.254.20.11";

/// Default path of the cluster root CA certificate
pub const DEFAULT_CA_CERT_PATH: &str = "/etc/kubernetes/pki/ca.crt";

/// Default path of the cluster root CA key
pub const DEFAULT_CA_KEY_PATH: &str = "/etc/kubernetes/pki/ca.key";
