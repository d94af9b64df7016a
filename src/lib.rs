//! # Coreflow: workflow execution over layered sample records
//!
//! Coreflow is the execution core of a scientific-sample processing
//! application. An operator assembles reusable processing components into a
//! directed calculation graph (a *workflow*), parameterizes it per run
//! through pluggable alternate sub-chains (*factors* resolved by
//! *selectors*), and drives a batch of physical-sample records through the
//! resulting network until every record has been fully processed — while
//! each run's derived results stay segregated from the canonical input data
//! and from other runs' results on the same records.
//!
//! ## Core Concepts
//!
//! - **Samples**: depth-keyed records carrying a mandatory `input` layer
//!   plus one independent overlay per run ([`samples`])
//! - **Attributes**: typed metadata deciding which derived values outlive a
//!   run ([`attributes`])
//! - **Workflows**: declarative slot-and-port topology with factor
//!   placeholders ([`workflows`])
//! - **Components**: the processing units behind each slot, resolved
//!   through a typed registry ([`components`])
//! - **Scheduler**: FIFO propagation of record batches to a fixed point,
//!   with cooperative cancellation ([`scheduler`])
//!
//! ## Quick Start
//!
//! Bind a one-slot workflow and run it over a single record:
//!
//! ```
//! use async_trait::async_trait;
//! use rustc_hash::FxHashMap;
//!
//! use coreflow::attributes::{AttrType, AttrValue, Attribute, AttributeRegistry};
//! use coreflow::components::{
//!     Batch, Component, ComponentError, ComponentRegistry, Ports, SlotId, WorkItem,
//! };
//! use coreflow::plans::ComputationPlan;
//! use coreflow::reference::ReferenceStore;
//! use coreflow::samples::{AttrMap, Core, Depth, Sample, VirtualCore};
//! use coreflow::scheduler::PropagationScheduler;
//! use coreflow::workflows::{RunBinder, WorkflowGraph};
//!
//! // A component that derives an age from each record's depth.
//! #[derive(Default)]
//! struct MarkAge {
//!     ports: Ports,
//! }
//!
//! #[async_trait]
//! impl Component for MarkAge {
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
//!                 sample.set("age", AttrValue::Float(depth.value() * 10.0));
//!             }
//!         }
//!         Ok(self.ports.forward(batch.clone()))
//!     }
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut components = ComponentRegistry::new();
//!     components.register("mark age", MarkAge::default);
//!
//!     let mut graph = WorkflowGraph::new("age model");
//!     graph.add_slot("mark age");
//!
//!     let mut attributes = AttributeRegistry::default();
//!     attributes.register(Attribute::new("age", AttrType::Float, true));
//!
//!     let mut core = Core::new("demo core");
//!     let mut input = AttrMap::default();
//!     input.insert("depth".to_owned(), AttrValue::Float(10.0));
//!     core.add(Sample::from_input(input))?;
//!
//!     let plan = ComputationPlan::new("demo run");
//!     let selectors = FxHashMap::default();
//!     let reference = ReferenceStore::default();
//!     let binder = RunBinder::new(&components, &selectors, &reference);
//!
//!     let runtime = tokio::runtime::Runtime::new()?;
//!     runtime.block_on(async {
//!         let mut network = binder.instantiate(&graph, &plan).await?;
//!         let mut view = core.new_computation(plan.name())?;
//!         let status = PropagationScheduler::new()
//!             .run(&mut network, &mut view, &attributes, || false)
//!             .await?;
//!         assert!(status.is_completed());
//!         Ok::<_, Box<dyn std::error::Error>>(())
//!     })?;
//!
//!     let sample = core.get(Depth::new(10.0)).ok_or("missing sample")?;
//!     assert_eq!(
//!         sample.layer("demo run").and_then(|l| l.get("age")),
//!         Some(&AttrValue::Float(100.0)),
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Module Guide
//!
//! - [`attributes`] - Attribute metadata and typed values
//! - [`samples`] - Cores, layered samples, and per-run views
//! - [`plans`] - Computation plans (per-run configuration)
//! - [`workflows`] - Graph topology, selectors, and runtime binding
//! - [`components`] - The component contract and registry
//! - [`scheduler`] - Batch propagation and the end-of-run purge
//! - [`reference`] - Reference tables components query while preparing
//! - [`telemetry`] - Console tracing setup

pub mod attributes;
pub mod components;
pub mod plans;
pub mod reference;
pub mod samples;
pub mod scheduler;
pub mod telemetry;
pub mod workflows;
