//! Manifest template rendering
//!
//! Add-on manifests are minijinja templates with `{{ placeholder }}` tokens.
//! Rendering is strict and fail-closed: every placeholder in the template must
//! have a matching parameter key, otherwise [`Error::UnresolvedPlaceholder`]
//! is returned before any output is produced. A silently emitted token would
//! make a syntactically valid but semantically wrong resource.
//!
//! Rendering has no side effects and is deterministic: parameters are an
//! ordered map and the same inputs always produce byte-identical output.

use std::collections::BTreeMap;

use minijinja::{Environment, UndefinedBehavior};

use crate::error::Error;
use crate::Result;

/// One concrete resource document, ready for submission to the cluster API.
///
/// Produced and consumed within a single install/detach call; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDocument {
    yaml: String,
}

impl ResourceDocument {
    /// Wrap a rendered YAML document
    pub fn new(yaml: impl Into<String>) -> Self {
        Self { yaml: yaml.into() }
    }

    /// The document text
    pub fn as_str(&self) -> &str {
        &self.yaml
    }
}

/// Strict template engine over add-on manifests
#[derive(Debug, Default)]
pub struct TemplateEngine;

impl TemplateEngine {
    /// Create a new template engine
    pub fn new() -> Self {
        Self
    }

    /// Render `text` with `params`, splitting the output into one
    /// [`ResourceDocument`] per `---` boundary.
    ///
    /// `manifest` names the template in errors. Placeholders are checked
    /// against the parameter keys up front so the error identifies the
    /// missing token; placeholders are reported in lexicographic order.
    pub fn render(
        &self,
        manifest: &str,
        text: &str,
        params: &BTreeMap<String, String>,
    ) -> Result<Vec<ResourceDocument>> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        let template = env.template_from_str(text).map_err(|source| Error::Template {
            manifest: manifest.to_string(),
            source,
        })?;

        let mut missing: Vec<String> = template
            .undeclared_variables(false)
            .into_iter()
            .filter(|v| !params.contains_key(v))
            .collect();
        missing.sort();
        if let Some(placeholder) = missing.into_iter().next() {
            return Err(Error::UnresolvedPlaceholder {
                manifest: manifest.to_string(),
                placeholder,
            });
        }

        let rendered = template.render(params).map_err(|source| Error::Template {
            manifest: manifest.to_string(),
            source,
        })?;

        Ok(split_documents(&rendered))
    }
}

/// Split rendered output on YAML document boundaries, dropping empty
/// documents (a template may start with `---` or leave trailing separators).
fn split_documents(rendered: &str) -> Vec<ResourceDocument> {
    rendered
        .split("\n---")
        .map(|doc| {
            let doc = doc.trim();
            doc.strip_prefix("---").map(str::trim).unwrap_or(doc)
        })
        .filter(|doc| !doc.is_empty())
        .map(ResourceDocument::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn render_substitutes_placeholders() {
        let engine = TemplateEngine::new();
        let docs = engine
            .render(
                "demo",
                "cidr: {{ pod_network_cidr }}",
                &params(&[("pod_network_cidr", "10.244.0.0/16")]),
            )
            .unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].as_str(), "cidr: 10.244.0.0/16");
    }

    #[test]
    fn render_is_deterministic() {
        let engine = TemplateEngine::new();
        let text = "a: {{ one }}\nb: {{ two }}\n---\nc: {{ one }}";
        let p = params(&[("one", "x"), ("two", "y")]);

        let first = engine.render("demo", text, &p).unwrap();
        let second = engine.render("demo", text, &p).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn render_fails_closed_on_unresolved_placeholder() {
        let engine = TemplateEngine::new();
        let err = engine
            .render("kube-flannel", "cidr: {{ pod_network_cidr }}", &params(&[]))
            .unwrap_err();
        match err {
            Error::UnresolvedPlaceholder {
                manifest,
                placeholder,
            } => {
                assert_eq!(manifest, "kube-flannel");
                assert_eq!(placeholder, "pod_network_cidr");
            }
            other => panic!("expected UnresolvedPlaceholder, got {other}"),
        }
    }

    #[test]
    fn unresolved_placeholders_reported_in_lexicographic_order() {
        let engine = TemplateEngine::new();
        let err = engine
            .render("demo", "{{ zeta }} {{ alpha }}", &params(&[]))
            .unwrap_err();
        match err {
            Error::UnresolvedPlaceholder { placeholder, .. } => {
                assert_eq!(placeholder, "alpha");
            }
            other => panic!("expected UnresolvedPlaceholder, got {other}"),
        }
    }

    #[test]
    fn extra_parameters_are_ignored() {
        let engine = TemplateEngine::new();
        let docs = engine
            .render(
                "demo",
                "image: {{ image }}",
                &params(&[("image", "flannel:v1"), ("unused", "whatever")]),
            )
            .unwrap();
        assert_eq!(docs[0].as_str(), "image: flannel:v1");
    }

    #[test]
    fn multi_document_templates_split_at_boundaries() {
        let engine = TemplateEngine::new();
        let text = "---\nkind: ServiceAccount\n---\nkind: ConfigMap\n---\nkind: DaemonSet\n";
        let docs = engine.render("demo", text, &params(&[])).unwrap();
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[0].as_str(), "kind: ServiceAccount");
        assert_eq!(docs[2].as_str(), "kind: DaemonSet");
    }

    #[test]
    fn empty_documents_are_dropped() {
        let engine = TemplateEngine::new();
        let text = "kind: ConfigMap\n---\n---\nkind: DaemonSet\n---\n";
        let docs = engine.render("demo", text, &params(&[])).unwrap();
        assert_eq!(docs.len(), 2);
    }
}
