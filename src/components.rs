//! The component capability contract and its supporting types.
//!
//! A processing component is anything the binder can instantiate, prepare,
//! wire and invoke: the [`Component`] trait is the whole of the contract the
//! execution core depends on. Concrete components live outside this crate
//! and are handed in through a [`ComponentRegistry`] — a typed mapping from
//! component-type name to factory, resolved once at bind time.
//!
//! # Work items
//!
//! An invocation receives a [`Batch`] of record depths and returns a finite
//! sequence of [`WorkItem`]s: fan out to several downstream branches,
//! forward everything on one port, or return nothing to terminate the
//! branch. Items carry no ordering guarantee among themselves.
//!
//! # Examples
//!
//! A pass-through component that stamps an attribute on every record:
//!
//! ```
//! use async_trait::async_trait;
//! use coreflow::attributes::AttrValue;
//! use coreflow::components::{
//!     Batch, Component, ComponentError, Ports, SlotId, WorkItem,
//! };
//! use coreflow::samples::VirtualCore;
//!
//! #[derive(Default)]
//! struct StampSeen {
//!     ports: Ports,
//! }
//!
//! #[async_trait]
//! impl Component for StampSeen {
//!     fn connect(&mut self, target: SlotId, port: &str) {
//!         self.ports.connect(port, target);
//!     }
//!
//!     async fn process(
//!         &mut self,
//!         view: &mut VirtualCore<'_>,
//!         batch: &Batch,
//!     ) -> Result<Vec<WorkItem>, ComponentError> {
//!         for depth in batch.iter() {
//!             if let Some(mut sample) = view.sample(depth) {
//!                 sample.set("seen", AttrValue::Boolean(true));
//!             }
//!         }
//!         Ok(self.ports.forward(batch.clone()))
//!     }
//! }
//! ```

use async_trait::async_trait;
use miette::Diagnostic;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::plans::ComputationPlan;
use crate::reference::ReferenceStore;
use crate::samples::{Depth, VirtualCore};
use crate::workflows::{ConfigurationError, WorkflowGraph};

/// Identifier of a live component instance within a bound network.
///
/// Instances are keyed by the concrete slot name that produced them, so the
/// id is meaningful in logs and stable across a run.
pub type SlotId = String;

/// The port name used when none is given.
pub const DEFAULT_PORT: &str = "output";

/// A canonical handle to a set of records: sorted, deduplicated depths.
///
/// Canonical form is what makes work-item deduplication by value equality
/// sound — two components that select the same records in different orders
/// produce the same batch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Batch {
    depths: Vec<Depth>,
}

impl Batch {
    pub fn from_depths(depths: impl IntoIterator<Item = Depth>) -> Self {
        let mut depths: Vec<Depth> = depths.into_iter().collect();
        depths.sort_unstable();
        depths.dedup();
        Self { depths }
    }

    pub fn iter(&self) -> impl Iterator<Item = Depth> + '_ {
        self.depths.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.depths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.depths.is_empty()
    }

    pub fn contains(&self, depth: Depth) -> bool {
        self.depths.binary_search(&depth).is_ok()
    }

    /// Split into the depths satisfying the predicate and the rest. Both
    /// halves stay canonical.
    pub fn partition(&self, mut pred: impl FnMut(Depth) -> bool) -> (Batch, Batch) {
        let (yes, no): (Vec<Depth>, Vec<Depth>) =
            self.depths.iter().copied().partition(|d| pred(*d));
        (Batch { depths: yes }, Batch { depths: no })
    }
}

impl FromIterator<Depth> for Batch {
    fn from_iter<T: IntoIterator<Item = Depth>>(iter: T) -> Self {
        Self::from_depths(iter)
    }
}

/// One unit of pending propagation work: the components to invoke and the
/// batch to hand them.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct WorkItem {
    pub components: Vec<SlotId>,
    pub batch: Batch,
}

impl WorkItem {
    pub fn new(components: Vec<SlotId>, batch: Batch) -> Self {
        Self { components, batch }
    }

    pub fn single(component: impl Into<SlotId>, batch: Batch) -> Self {
        Self {
            components: vec![component.into()],
            batch,
        }
    }
}

/// Port table for component implementors.
///
/// Components are free to track their downstream wiring however they like;
/// this is the common case — a named-port map with routing helpers.
#[derive(Clone, Debug, Default)]
pub struct Ports {
    targets: FxHashMap<String, SlotId>,
}

impl Ports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&mut self, port: impl Into<String>, target: SlotId) {
        self.targets.insert(port.into(), target);
    }

    pub fn target(&self, port: &str) -> Option<&str> {
        self.targets.get(port).map(String::as_str)
    }

    /// A work item routing the batch out of the named port, or `None` when
    /// the port is unconnected (the branch simply ends there).
    pub fn route(&self, port: &str, batch: Batch) -> Option<WorkItem> {
        self.target(port)
            .map(|target| WorkItem::single(target, batch))
    }

    /// Route the batch out of the default port.
    pub fn forward(&self, batch: Batch) -> Vec<WorkItem> {
        self.route(DEFAULT_PORT, batch).into_iter().collect()
    }
}

/// Everything a component may consult while preparing itself.
pub struct PrepareContext<'a> {
    /// Reference tables (calibration curves etc.); the core never reads
    /// these itself.
    pub reference: &'a ReferenceStore,
    pub workflow: &'a WorkflowGraph,
    pub plan: &'a ComputationPlan,
}

/// A component invocation failed.
///
/// Failures are typed; the scheduler's failure policy decides whether one
/// aborts the run or only drops that invocation's work items.
#[derive(Debug, Error, Diagnostic)]
pub enum ComponentError {
    #[error("missing expected attribute: {what}")]
    #[diagnostic(
        code(coreflow::components::missing_attribute),
        help("check that an upstream component produced the attribute")
    )]
    MissingAttribute { what: String },

    #[error("reference table {table:?}: {message}")]
    #[diagnostic(code(coreflow::components::reference))]
    Reference { table: String, message: String },

    #[error("component failed: {0}")]
    #[diagnostic(code(coreflow::components::failed))]
    Failed(String),
}

/// A unit of processing in a calculation workflow.
///
/// Components may be stateful (accumulate partial results across
/// invocations) but must not retain the record view beyond a call.
#[async_trait]
pub trait Component: Send + Sync {
    /// Idempotent setup: pull parameters from the plan, fetch reference
    /// tables. Failures abort binding before any record is processed.
    async fn prepare(&mut self, ctx: &PrepareContext<'_>) -> Result<(), ConfigurationError> {
        let _ = ctx;
        Ok(())
    }

    /// Wire an output port to a downstream instance.
    fn connect(&mut self, target: SlotId, port: &str);

    /// Process a batch of records through the per-run view and say what
    /// runs next.
    async fn process(
        &mut self,
        view: &mut VirtualCore<'_>,
        batch: &Batch,
    ) -> Result<Vec<WorkItem>, ComponentError>;
}

type Factory = Box<dyn Fn() -> Box<dyn Component> + Send + Sync>;

struct ComponentSpec {
    params: Vec<String>,
    factory: Factory,
}

/// Typed mapping from component-type name to constructor.
///
/// The binder resolves every slot through this registry exactly once, at
/// bind time; an unknown name is a [`ConfigurationError`], not a runtime
/// surprise.
#[derive(Default)]
pub struct ComponentRegistry {
    specs: FxHashMap<String, ComponentSpec>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component type with no declared parameters.
    pub fn register<C, F>(&mut self, name: impl Into<String>, factory: F)
    where
        C: Component + 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        self.register_with_params(name, &[], factory);
    }

    /// Register a component type that declares required plan parameters.
    ///
    /// Declared parameters feed
    /// [`WorkflowGraph::required_parameters`](crate::workflows::WorkflowGraph::required_parameters)
    /// and are validated up front when a workflow binds.
    pub fn register_with_params<C, F>(&mut self, name: impl Into<String>, params: &[&str], factory: F)
    where
        C: Component + 'static,
        F: Fn() -> C + Send + Sync + 'static,
    {
        self.specs.insert(
            name.into(),
            ComponentSpec {
                params: params.iter().map(|p| (*p).to_owned()).collect(),
                factory: Box::new(move || Box::new(factory())),
            },
        );
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    /// Construct a fresh instance of the named component type.
    pub fn instantiate(&self, name: &str) -> Result<Box<dyn Component>, ConfigurationError> {
        let spec = self
            .specs
            .get(name)
            .ok_or_else(|| ConfigurationError::UnknownComponent {
                name: name.to_owned(),
            })?;
        Ok((spec.factory)())
    }

    /// The plan parameters the named component type declares it needs.
    pub fn declared_params(&self, name: &str) -> Result<&[String], ConfigurationError> {
        self.specs
            .get(name)
            .map(|spec| spec.params.as_slice())
            .ok_or_else(|| ConfigurationError::UnknownComponent {
                name: name.to_owned(),
            })
    }
}
