//! Workflow definition and runtime binding.
//!
//! A [`WorkflowGraph`] is the declarative topology: named component slots
//! and the output-port connections between them, with `Factor<...>`
//! placeholders marking points of variability. A [`Selector`] maps each
//! factor's modes to concrete component sub-chains. The [`RunBinder`]
//! combines a graph with a [`ComputationPlan`](crate::plans::ComputationPlan)
//! to produce a [`BoundNetwork`] of live, wired instances — which the
//! [`scheduler`](crate::scheduler) then drives over a record collection.

mod binder;
mod errors;
mod graph;
mod selector;

pub use binder::{BoundNetwork, RunBinder};
pub use errors::ConfigurationError;
pub use graph::{FACTOR_PREFIX, Slot, WorkflowGraph};
pub use selector::Selector;
