//! Error types for edgekit add-on operations

use thiserror::Error;

/// Main error type for add-on install and detach operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// No manifest template exists for the requested add-on name
    #[error("manifest not found: no override or built-in template named {0:?}")]
    ManifestNotFound(String),

    /// A required configuration value is absent for an add-on
    #[error("missing parameter for add-on {addon}: {flag} must not be empty")]
    MissingParameter {
        /// The add-on whose parameter set could not be built
        addon: String,
        /// The flag identifier of the missing value
        flag: String,
    },

    /// A template references a placeholder with no corresponding parameter
    #[error("unresolved placeholder {placeholder:?} in manifest {manifest}")]
    UnresolvedPlaceholder {
        /// The manifest being rendered
        manifest: String,
        /// The placeholder that had no matching parameter key
        placeholder: String,
    },

    /// Template rendering failed for a reason other than a missing placeholder
    #[error("failed to render manifest {manifest}: {source}")]
    Template {
        /// The manifest being rendered
        manifest: String,
        /// The underlying template engine error
        #[source]
        source: minijinja::Error,
    },

    /// A rendered document is not a usable cluster resource
    #[error("invalid resource document: {0}")]
    InvalidManifest(String),

    /// The cluster API rejected a create or update for a resource
    #[error("failed to apply {kind}/{name}: {source}")]
    ResourceApplyFailed {
        /// Kind of the offending resource
        kind: String,
        /// Name of the offending resource
        name: String,
        /// The underlying client error
        #[source]
        source: kube::Error,
    },

    /// One or more deletions failed during teardown
    #[error("failed to delete {failed} of {total} resources: {details}", details = .failures.join("; "))]
    ResourceDeleteFailed {
        /// Number of documents that could not be deleted
        failed: usize,
        /// Total number of documents in the teardown set
        total: usize,
        /// Per-document failure descriptions (`kind/name: cause`)
        failures: Vec<String>,
    },

    /// Two sibling phases share a name
    #[error("duplicate phase name {0:?} among siblings")]
    DuplicatePhase(String),

    /// Kubernetes API error outside the apply/delete paths
    #[error("kubernetes error: {0}")]
    Kube(#[from] kube::Error),

    /// I/O error reading a manifest override
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a missing-parameter error for the given add-on and flag
    pub fn missing_parameter(addon: impl Into<String>, flag: impl Into<String>) -> Self {
        Self::MissingParameter {
            addon: addon.into(),
            flag: flag.into(),
        }
    }

    /// Create an invalid-manifest error with the given reason
    pub fn invalid_manifest(reason: impl Into<String>) -> Self {
        Self::InvalidManifest(reason.into())
    }
}
