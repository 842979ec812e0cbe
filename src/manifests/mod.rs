//! Built-in manifest templates and the override resolver
//!
//! Every add-on has a logical manifest name and a compiled-in default
//! template. Operators may override any of them by dropping a file named
//! `<name>.yaml` into the configured manifest directory; an override wins
//! unconditionally and is returned verbatim. There is no merging of partial
//! overrides and no remote fetch.

mod edge_health;
mod flannel;
mod tunnel;

pub use edge_health::{EDGE_HEALTH, EDGE_HEALTH_YAML};
pub use flannel::{KUBE_FLANNEL, KUBE_FLANNEL_YAML};
pub use tunnel::{TUNNEL_EDGE, TUNNEL_EDGE_YAML};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Error;
use crate::Result;

/// Read-only mapping from add-on name to built-in template text.
///
/// Populated once at construction from embedded resources and queried
/// read-only thereafter; passed into the [`Resolver`] rather than living in
/// a mutable global.
#[derive(Debug, Clone)]
pub struct ManifestRegistry {
    templates: BTreeMap<&'static str, &'static str>,
}

impl ManifestRegistry {
    /// Registry of all built-in add-on templates
    pub fn builtin() -> Self {
        let mut templates = BTreeMap::new();
        templates.insert(KUBE_FLANNEL, KUBE_FLANNEL_YAML);
        templates.insert(TUNNEL_EDGE, TUNNEL_EDGE_YAML);
        templates.insert(EDGE_HEALTH, EDGE_HEALTH_YAML);
        Self { templates }
    }

    /// Built-in template text for `name`, if registered
    pub fn get(&self, name: &str) -> Option<&'static str> {
        self.templates.get(name).copied()
    }

    /// Registered template names, in deterministic order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.templates.keys().copied()
    }
}

/// Resolves an add-on name to its manifest source: on-disk override if
/// present, else the built-in default.
#[derive(Debug, Clone)]
pub struct Resolver {
    registry: ManifestRegistry,
    override_dir: Option<PathBuf>,
}

impl Resolver {
    /// Create a resolver over the given registry and optional override
    /// directory
    pub fn new(registry: ManifestRegistry, override_dir: Option<PathBuf>) -> Self {
        Self {
            registry,
            override_dir,
        }
    }

    /// Return the template text for `name`.
    ///
    /// Fails with [`Error::ManifestNotFound`] only when neither an override
    /// file nor a built-in template exists; for built-in names that indicates
    /// a packaging defect.
    pub fn resolve(&self, name: &str) -> Result<String> {
        if let Some(dir) = &self.override_dir {
            let path = override_path(dir, name);
            if path.is_file() {
                debug!(manifest = %name, path = %path.display(), "using manifest override");
                return Ok(std::fs::read_to_string(&path)?);
            }
        }

        match self.registry.get(name) {
            Some(text) => Ok(text.to_string()),
            None => Err(Error::ManifestNotFound(name.to_string())),
        }
    }
}

/// Conventional override file path for an add-on manifest
fn override_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.yaml"))
}
