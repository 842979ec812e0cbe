//! Resource reconciliation: converging cluster state to rendered documents
//!
//! Install and detach are deliberately asymmetric:
//!
//! - [`apply`] is fail-fast. Documents are submitted in order with
//!   create-if-absent / update-if-present semantics; the first unrecoverable
//!   error stops the walk and names the offending document. Earlier documents
//!   are not rolled back - partial application is a reported outcome, and
//!   re-running the whole install is always safe.
//! - [`delete`] is best-effort. Not-found counts as success so teardown can
//!   run against a cluster where the add-on was never installed; other
//!   failures are collected per document and deletion continues, maximizing
//!   cleanup.
//!
//! Neither path retries. Idempotency is the substitute for retry.

use kube::core::DynamicObject;
use kube::discovery::ApiResource;
use tracing::{debug, info, warn};

use crate::client::{build_api_resource, is_conflict, is_not_found, ResourceClient};
use crate::error::Error;
use crate::template::ResourceDocument;
use crate::Result;

/// A parsed resource document with the identity the cluster API needs
struct ParsedDocument {
    resource: ApiResource,
    namespace: Option<String>,
    name: String,
    kind: String,
    object: DynamicObject,
}

/// Parse a rendered document into a [`DynamicObject`] plus its identity.
///
/// apiVersion, kind, and metadata.name are mandatory; namespace is optional
/// (cluster-scoped kinds carry none).
fn parse_document(doc: &ResourceDocument) -> Result<ParsedDocument> {
    let value: serde_json::Value = serde_yaml::from_str(doc.as_str())
        .map_err(|e| Error::invalid_manifest(format!("not valid YAML: {e}")))?;

    let api_version = value["apiVersion"]
        .as_str()
        .ok_or_else(|| Error::invalid_manifest("missing apiVersion"))?
        .to_string();
    let kind = value["kind"]
        .as_str()
        .ok_or_else(|| Error::invalid_manifest("missing kind"))?
        .to_string();
    let name = value["metadata"]["name"]
        .as_str()
        .ok_or_else(|| Error::invalid_manifest(format!("missing metadata.name for {kind}")))?
        .to_string();
    let namespace = value["metadata"]["namespace"]
        .as_str()
        .map(|s| s.to_string());

    let resource = build_api_resource(&api_version, &kind);
    let object: DynamicObject = serde_json::from_value(value)
        .map_err(|e| Error::invalid_manifest(format!("{kind}/{name}: {e}")))?;

    Ok(ParsedDocument {
        resource,
        namespace,
        name,
        kind,
        object,
    })
}

/// Apply rendered documents in order with create-or-update semantics.
///
/// Stops on the first unrecoverable error, wrapping it in
/// [`Error::ResourceApplyFailed`] with the offending document's identity.
pub async fn apply(client: &dyn ResourceClient, docs: &[ResourceDocument]) -> Result<()> {
    for doc in docs {
        let parsed = parse_document(doc)?;
        apply_one(client, &parsed).await.map_err(|source| {
            Error::ResourceApplyFailed {
                kind: parsed.kind.clone(),
                name: parsed.name.clone(),
                source,
            }
        })?;
    }
    Ok(())
}

async fn apply_one(client: &dyn ResourceClient, parsed: &ParsedDocument) -> kube::Result<()> {
    let ns = parsed.namespace.as_deref();

    match client.create(&parsed.resource, ns, &parsed.object).await {
        Ok(()) => {
            info!(kind = %parsed.kind, name = %parsed.name, "created resource");
            Ok(())
        }
        Err(e) if is_conflict(&e) => {
            // Replace the live spec with the rendered one. The live
            // resourceVersion is required for the update to be accepted.
            let existing = client.get(&parsed.resource, ns, &parsed.name).await?;
            let mut desired = parsed.object.clone();
            if let Some(existing) = existing {
                desired.metadata.resource_version = existing.metadata.resource_version;
            }
            client.update(&parsed.resource, ns, &desired).await?;
            info!(kind = %parsed.kind, name = %parsed.name, "updated existing resource");
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Delete rendered documents in order, treating not-found as success.
///
/// Failures are collected into [`Error::ResourceDeleteFailed`] but never stop
/// the walk; every document gets a deletion attempt.
pub async fn delete(client: &dyn ResourceClient, docs: &[ResourceDocument]) -> Result<()> {
    let mut failures = Vec::new();

    for doc in docs {
        let parsed = match parse_document(doc) {
            Ok(parsed) => parsed,
            Err(e) => {
                failures.push(e.to_string());
                continue;
            }
        };
        let ns = parsed.namespace.as_deref();

        match client.delete(&parsed.resource, ns, &parsed.name).await {
            Ok(()) => {
                info!(kind = %parsed.kind, name = %parsed.name, "deleted resource");
            }
            Err(e) if is_not_found(&e) => {
                debug!(kind = %parsed.kind, name = %parsed.name, "resource already absent");
            }
            Err(e) => {
                warn!(kind = %parsed.kind, name = %parsed.name, error = %e, "failed to delete resource");
                failures.push(format!("{}/{}: {}", parsed.kind, parsed.name, e));
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(Error::ResourceDeleteFailed {
            failed: failures.len(),
            total: docs.len(),
            failures,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::fake::{api_error, FakeCluster};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Client whose every create is rejected; any other call is a test
    /// failure. Counts creates so tests can assert nothing was submitted
    /// after the rejection.
    #[derive(Default)]
    struct RejectingClient {
        creates: Mutex<usize>,
    }

    #[async_trait]
    impl ResourceClient for RejectingClient {
        async fn get(
            &self,
            _resource: &ApiResource,
            _namespace: Option<&str>,
            _name: &str,
        ) -> std::result::Result<Option<DynamicObject>, kube::Error> {
            panic!("unexpected get after rejected create");
        }

        async fn create(
            &self,
            _resource: &ApiResource,
            _namespace: Option<&str>,
            _object: &DynamicObject,
        ) -> std::result::Result<(), kube::Error> {
            *self.creates.lock().unwrap() += 1;
            Err(api_error(403, "Forbidden", "denied"))
        }

        async fn update(
            &self,
            _resource: &ApiResource,
            _namespace: Option<&str>,
            _object: &DynamicObject,
        ) -> std::result::Result<(), kube::Error> {
            panic!("unexpected update after rejected create");
        }

        async fn delete(
            &self,
            _resource: &ApiResource,
            _namespace: Option<&str>,
            _name: &str,
        ) -> std::result::Result<(), kube::Error> {
            panic!("unexpected delete after rejected create");
        }
    }

    fn configmap(name: &str, value: &str) -> ResourceDocument {
        ResourceDocument::new(format!(
            "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: {name}\n  namespace: kube-system\ndata:\n  key: {value}\n"
        ))
    }

    fn clusterrole(name: &str) -> ResourceDocument {
        ResourceDocument::new(format!(
            "apiVersion: rbac.authorization.k8s.io/v1\nkind: ClusterRole\nmetadata:\n  name: {name}\nrules: []\n"
        ))
    }

    // =========================================================================
    // Install path: create-or-update, fail-fast
    // =========================================================================

    #[tokio::test]
    async fn apply_creates_absent_resources() {
        let cluster = FakeCluster::new();
        let docs = vec![configmap("a", "1"), clusterrole("b")];

        apply(&cluster, &docs).await.unwrap();

        assert_eq!(cluster.counts().creates, 2);
        assert_eq!(cluster.counts().updates, 0);
        assert_eq!(cluster.len(), 2);
    }

    #[tokio::test]
    async fn apply_twice_is_idempotent() {
        let cluster = FakeCluster::new();
        let docs = vec![configmap("a", "1"), clusterrole("b")];

        apply(&cluster, &docs).await.unwrap();
        apply(&cluster, &docs).await.unwrap();

        // Second pass converges via update; no duplicates, no error.
        assert_eq!(cluster.counts().creates, 2);
        assert_eq!(cluster.counts().updates, 2);
        assert_eq!(cluster.len(), 2);
    }

    #[tokio::test]
    async fn apply_converges_to_changed_template() {
        let cluster = FakeCluster::new();
        apply(&cluster, &[configmap("a", "old")]).await.unwrap();
        apply(&cluster, &[configmap("a", "new")]).await.unwrap();

        let ar = build_api_resource("v1", "ConfigMap");
        let obj = cluster
            .get(&ar, Some("kube-system"), "a")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(obj.data["data"]["key"], "new");
    }

    #[tokio::test]
    async fn apply_stops_at_first_failing_document() {
        let cluster = FakeCluster::failing_on(&["ConfigMap/bad"]);
        let docs = vec![configmap("ok", "1"), configmap("bad", "2"), configmap("later", "3")];

        let err = apply(&cluster, &docs).await.unwrap_err();

        match err {
            Error::ResourceApplyFailed { kind, name, .. } => {
                assert_eq!(kind, "ConfigMap");
                assert_eq!(name, "bad");
            }
            other => panic!("expected ResourceApplyFailed, got {other}"),
        }
        // The first document stays applied; the third was never submitted.
        assert_eq!(cluster.counts().creates, 1);
        let ar = build_api_resource("v1", "ConfigMap");
        assert!(cluster.contains(&ar, Some("kube-system"), "ok"));
        assert!(!cluster.contains(&ar, Some("kube-system"), "later"));
    }

    #[tokio::test]
    async fn apply_never_submits_after_client_rejection() {
        let client = RejectingClient::default();

        let docs = vec![configmap("first", "1"), configmap("second", "2")];
        let err = apply(&client, &docs).await.unwrap_err();

        assert!(matches!(err, Error::ResourceApplyFailed { name, .. } if name == "first"));
        // The second document never reached the client.
        assert_eq!(*client.creates.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn apply_rejects_document_without_identity() {
        let cluster = FakeCluster::new();
        let doc = ResourceDocument::new("apiVersion: v1\nkind: ConfigMap\n");
        let err = apply(&cluster, &[doc]).await.unwrap_err();
        assert!(matches!(err, Error::InvalidManifest(_)));
        assert_eq!(cluster.len(), 0);
    }

    // =========================================================================
    // Detach path: best-effort, not-found is success
    // =========================================================================

    #[tokio::test]
    async fn delete_removes_existing_resources() {
        let cluster = FakeCluster::new();
        let docs = vec![configmap("a", "1"), clusterrole("b")];
        apply(&cluster, &docs).await.unwrap();

        delete(&cluster, &docs).await.unwrap();

        assert_eq!(cluster.len(), 0);
        assert_eq!(cluster.counts().deletes, 2);
    }

    #[tokio::test]
    async fn delete_is_idempotent_against_empty_cluster() {
        let cluster = FakeCluster::new();
        let docs = vec![configmap("a", "1"), clusterrole("b")];

        // Nothing was ever installed; every document reports success.
        delete(&cluster, &docs).await.unwrap();

        assert_eq!(cluster.counts().deletes, 0);
        assert_eq!(cluster.counts().not_found_deletes, 2);
    }

    #[tokio::test]
    async fn delete_continues_past_failures_and_reports_them() {
        let cluster = FakeCluster::failing_on(&["ConfigMap/stuck"]);
        let docs = vec![configmap("a", "1"), configmap("stuck", "2"), configmap("b", "3")];
        // Install only the deletable ones; "stuck" exists conceptually but
        // refuses deletion via the fail set.
        apply(&cluster, &[configmap("a", "1"), configmap("b", "3")])
            .await
            .unwrap();

        let err = delete(&cluster, &docs).await.unwrap_err();

        match err {
            Error::ResourceDeleteFailed {
                failed,
                total,
                failures,
            } => {
                assert_eq!(failed, 1);
                assert_eq!(total, 3);
                assert!(failures[0].contains("ConfigMap/stuck"));
            }
            other => panic!("expected ResourceDeleteFailed, got {other}"),
        }
        // Both deletable documents were still removed.
        assert_eq!(cluster.len(), 0);
    }
}
