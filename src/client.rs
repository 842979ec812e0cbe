//! Capability-typed cluster API client
//!
//! The reconciler only ever talks to the cluster through [`ResourceClient`]:
//! four synchronous-in-effect operations over dynamic resource documents.
//! Transport, authentication, and retry all live behind the kube-rs client;
//! nothing here embeds them. The trait boundary is also what makes the
//! reconciler testable without a cluster.

use async_trait::async_trait;
use kube::api::{Api, DeleteParams, PostParams};
use kube::core::DynamicObject;
use kube::discovery::ApiResource;
use kube::Client;

/// Cluster operations the reconciler needs, and nothing more.
///
/// Every method identifies the target resource by its `ApiResource` (built
/// from the manifest's apiVersion and kind) plus namespace and name. The
/// client is shared and read-mostly; callers issue sequential calls only.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Fetch a resource, returning `None` when it does not exist
    async fn get(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<DynamicObject>, kube::Error>;

    /// Create a resource that does not exist yet
    async fn create(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        object: &DynamicObject,
    ) -> Result<(), kube::Error>;

    /// Replace an existing resource with the given object.
    ///
    /// The object must carry the resourceVersion of the live resource.
    async fn update(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        object: &DynamicObject,
    ) -> Result<(), kube::Error>;

    /// Delete a resource. Errors with a not-found status when absent;
    /// callers decide whether that matters.
    async fn delete(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<(), kube::Error>;
}

/// Production [`ResourceClient`] backed by a kube-rs [`Client`]
#[derive(Clone)]
pub struct KubeResourceClient {
    client: Client,
}

impl KubeResourceClient {
    /// Wrap an already-configured kube client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, resource: &ApiResource, namespace: Option<&str>) -> Api<DynamicObject> {
        match namespace {
            Some(ns) => Api::namespaced_with(self.client.clone(), ns, resource),
            None => Api::all_with(self.client.clone(), resource),
        }
    }
}

#[async_trait]
impl ResourceClient for KubeResourceClient {
    async fn get(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<Option<DynamicObject>, kube::Error> {
        self.api(resource, namespace).get_opt(name).await
    }

    async fn create(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        object: &DynamicObject,
    ) -> Result<(), kube::Error> {
        self.api(resource, namespace)
            .create(&PostParams::default(), object)
            .await?;
        Ok(())
    }

    async fn update(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        object: &DynamicObject,
    ) -> Result<(), kube::Error> {
        let name = object.metadata.name.as_deref().unwrap_or_default();
        self.api(resource, namespace)
            .replace(name, &PostParams::default(), object)
            .await?;
        Ok(())
    }

    async fn delete(
        &self,
        resource: &ApiResource,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<(), kube::Error> {
        self.api(resource, namespace)
            .delete(name, &DeleteParams::default())
            .await?;
        Ok(())
    }
}

/// Whether an API error means the resource already exists
pub fn is_conflict(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 409)
}

/// Whether an API error means the resource does not exist
pub fn is_not_found(err: &kube::Error) -> bool {
    matches!(err, kube::Error::Api(ae) if ae.code == 404)
}

/// Build an `ApiResource` from a manifest's apiVersion and kind.
///
/// The version is used exactly as given; the plural comes from a small table
/// of known irregulars with a naive fallback. Good enough for the resource
/// kinds add-on manifests declare, without an API discovery round-trip.
pub fn build_api_resource(api_version: &str, kind: &str) -> ApiResource {
    let (group, version) = parse_api_version(api_version);
    ApiResource {
        group,
        version,
        kind: kind.to_string(),
        api_version: api_version.to_string(),
        plural: pluralize_kind(kind),
    }
}

/// Split an apiVersion like `apps/v1` into (group, version). Core resources
/// (`v1`) have an empty group.
pub fn parse_api_version(api_version: &str) -> (String, String) {
    match api_version.split_once('/') {
        Some((group, version)) => (group.to_string(), version.to_string()),
        None => (String::new(), api_version.to_string()),
    }
}

/// Kinds whose lowercase plural is not just `+s`
const KIND_PLURALS: &[(&str, &str)] = &[
    ("endpoints", "endpoints"),
    ("ingress", "ingresses"),
    ("networkpolicy", "networkpolicies"),
    ("priorityclass", "priorityclasses"),
    ("storageclass", "storageclasses"),
];

/// Lowercase-pluralize a resource kind for URL path construction
pub fn pluralize_kind(kind: &str) -> String {
    let lower = kind.to_lowercase();

    for (singular, plural) in KIND_PLURALS {
        if *singular == lower {
            return (*plural).to_string();
        }
    }

    if lower.ends_with('s') || lower.ends_with("ch") || lower.ends_with("sh") {
        format!("{}es", lower)
    } else if lower.ends_with('y') && !lower.ends_with("ay") && !lower.ends_with("ey") {
        format!("{}ies", &lower[..lower.len() - 1])
    } else {
        format!("{}s", lower)
    }
}
