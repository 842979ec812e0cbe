//! Phase workflow engine
//!
//! Install steps are organized into a tree of named phases. Traversal is a
//! pre-order walk in declaration order - deterministic and repeatable - and
//! halts on the first failing action: a phase that could not complete its own
//! prerequisites must not let dependent phases proceed.
//!
//! A phase is either a pure grouping node or carries an action; the tagged
//! variant keeps traversal uniform and testable independent of what actions
//! do. Every action receives the same shared [`RunContext`], resolved once
//! before traversal begins and read-only from the actions' perspective:
//! phases order themselves through declared tree position, never through
//! observable context mutation.
//!
//! Each phase also declares which global flags it consumes. That association
//! is static and only feeds help composition; it never affects execution.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::BoxFuture;
use tracing::info;

use crate::client::ResourceClient;
use crate::config::{AddonConfig, ClusterConfig};
use crate::error::Error;
use crate::Result;

/// Shared state passed to every phase action.
///
/// Created once per invocation; actions read it and talk to the cluster
/// through the client handle, nothing more.
pub struct RunContext {
    /// Resolved cluster configuration
    pub cluster: ClusterConfig,
    /// Active add-on configuration
    pub config: AddonConfig,
    /// Handle to the cluster API client
    pub client: Arc<dyn ResourceClient>,
}

/// A phase action: borrows nothing from the tree, owns a clone of the shared
/// context handle for the duration of the call.
pub type PhaseAction =
    Arc<dyn Fn(Arc<RunContext>) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// What a phase does when visited
pub enum PhaseRun {
    /// Pure grouping node; visiting it visits its children in order
    Group(Vec<Phase>),
    /// Leaf node carrying the work
    Action(PhaseAction),
}

/// A node in the workflow tree
pub struct Phase {
    /// Phase name, unique among its siblings
    pub name: String,
    /// One-line description for help text
    pub short: String,
    /// Optional longer description for help text
    pub long: Option<String>,
    /// Global flags this phase consumes (help composition only)
    pub inherit_flags: Vec<&'static str>,
    /// Grouping or action
    pub run: PhaseRun,
}

impl Phase {
    /// Create a grouping phase with the given children
    pub fn group(name: impl Into<String>, short: impl Into<String>, children: Vec<Phase>) -> Self {
        Self {
            name: name.into(),
            short: short.into(),
            long: None,
            inherit_flags: Vec::new(),
            run: PhaseRun::Group(children),
        }
    }

    /// Create an action phase
    pub fn action<F>(name: impl Into<String>, short: impl Into<String>, action: F) -> Self
    where
        F: Fn(Arc<RunContext>) -> BoxFuture<'static, Result<()>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            short: short.into(),
            long: None,
            inherit_flags: Vec::new(),
            run: PhaseRun::Action(Arc::new(action)),
        }
    }

    /// Attach a longer description
    pub fn with_long(mut self, long: impl Into<String>) -> Self {
        self.long = Some(long.into());
        self
    }

    /// Declare the global flags this phase consumes
    pub fn with_inherit_flags(mut self, flags: impl IntoIterator<Item = &'static str>) -> Self {
        self.inherit_flags = flags.into_iter().collect();
        self
    }
}

/// Walks a phase tree for one operation
pub struct PhaseRunner {
    phases: Vec<Phase>,
}

impl PhaseRunner {
    /// Build a runner over root phases, verifying that every set of siblings
    /// has unique names
    pub fn new(phases: Vec<Phase>) -> Result<Self> {
        validate_sibling_names(&phases)?;
        Ok(Self { phases })
    }

    /// Pre-order walk in declaration order; halts on the first failing
    /// action and surfaces its error unchanged.
    pub async fn run(&self, ctx: &Arc<RunContext>) -> Result<()> {
        for phase in &self.phases {
            run_phase(phase, ctx).await?;
        }
        Ok(())
    }

    /// All flags consumed anywhere in the tree, in declaration order,
    /// deduplicated. Used to compose command help.
    pub fn inherited_flags(&self) -> Vec<&'static str> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        collect_flags(&self.phases, &mut seen, &mut out);
        out
    }

    /// Visit every phase pre-order, yielding (depth, phase). Used to compose
    /// command help.
    pub fn walk(&self, mut visit: impl FnMut(usize, &Phase)) {
        fn inner(phases: &[Phase], depth: usize, visit: &mut impl FnMut(usize, &Phase)) {
            for phase in phases {
                visit(depth, phase);
                if let PhaseRun::Group(children) = &phase.run {
                    inner(children, depth + 1, visit);
                }
            }
        }
        inner(&self.phases, 0, &mut visit);
    }
}

fn run_phase<'a>(phase: &'a Phase, ctx: &'a Arc<RunContext>) -> BoxFuture<'a, Result<()>> {
    Box::pin(async move {
        match &phase.run {
            PhaseRun::Group(children) => {
                for child in children {
                    run_phase(child, ctx).await?;
                }
                Ok(())
            }
            PhaseRun::Action(action) => {
                info!(phase = %phase.name, "running phase");
                action(Arc::clone(ctx)).await
            }
        }
    })
}

fn validate_sibling_names(phases: &[Phase]) -> Result<()> {
    let mut names = HashSet::new();
    for phase in phases {
        if !names.insert(phase.name.as_str()) {
            return Err(Error::DuplicatePhase(phase.name.clone()));
        }
        if let PhaseRun::Group(children) = &phase.run {
            validate_sibling_names(children)?;
        }
    }
    Ok(())
}

fn collect_flags(phases: &[Phase], seen: &mut HashSet<&'static str>, out: &mut Vec<&'static str>) {
    for phase in phases {
        for flag in &phase.inherit_flags {
            if seen.insert(flag) {
                out.push(flag);
            }
        }
        if let PhaseRun::Group(children) = &phase.run {
            collect_flags(children, seen, out);
        }
    }
}
