//! Turning a declarative workflow plus a computation plan into a live,
//! wired component network.
//!
//! Binding is a one-shot, pure construction step: it touches no records and
//! has no effect on any core. Every failure surfaces as a
//! [`ConfigurationError`] before propagation can begin.

use rustc_hash::FxHashMap;
use tracing::instrument;

use super::{ConfigurationError, Selector, Slot, WorkflowGraph};
use crate::components::{Component, ComponentRegistry, PrepareContext, SlotId};
use crate::plans::ComputationPlan;
use crate::reference::ReferenceStore;

/// A live, wired network of component instances, ready for propagation.
pub struct BoundNetwork {
    components: FxHashMap<SlotId, Box<dyn Component>>,
    first: SlotId,
}

impl BoundNetwork {
    /// Instance id of the network's entry point.
    pub fn first(&self) -> &str {
        &self.first
    }

    pub fn component_mut(&mut self, id: &str) -> Option<&mut (dyn Component + 'static)> {
        self.components.get_mut(id).map(Box::as_mut)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.components.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Instance ids, sorted for stable presentation.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.components.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Binds workflows against a component registry, a selector set, and a
/// reference-table store.
pub struct RunBinder<'a> {
    registry: &'a ComponentRegistry,
    selectors: &'a FxHashMap<String, Selector>,
    reference: &'a ReferenceStore,
}

impl<'a> RunBinder<'a> {
    pub fn new(
        registry: &'a ComponentRegistry,
        selectors: &'a FxHashMap<String, Selector>,
        reference: &'a ReferenceStore,
    ) -> Self {
        Self {
            registry,
            selectors,
            reference,
        }
    }

    /// Instantiate one live component per slot and wire the declared
    /// connections.
    ///
    /// Factor placeholders delegate to the matching selector, which binds
    /// its whole chain; edges into a placeholder land on the chain's entry
    /// instance and edges out of it leave from the chain's exit instance.
    /// Ordinary slots are constructed through the registry and prepared
    /// against `{reference store, graph, plan}` — the hook through which a
    /// component pulls whatever auxiliary data it needs.
    ///
    /// A graph without a unique first slot fails before any instance is
    /// constructed, and every plan parameter the graph's component types
    /// declare must resolve up front.
    #[instrument(skip_all, fields(workflow = graph.name(), plan = plan.name()))]
    pub async fn instantiate(
        &self,
        graph: &WorkflowGraph,
        plan: &ComputationPlan,
    ) -> Result<BoundNetwork, ConfigurationError> {
        let first = graph.first_slot()?.to_owned();
        for key in graph.required_parameters(self.registry)? {
            plan.get(&key)?;
        }

        let ctx = PrepareContext {
            reference: self.reference,
            workflow: graph,
            plan,
        };
        let mut instances: FxHashMap<SlotId, Box<dyn Component>> = FxHashMap::default();
        // placeholder slot name -> (entry, exit) instance ids of its chain
        let mut aliases: FxHashMap<String, (SlotId, SlotId)> = FxHashMap::default();

        let mut slots: Vec<&str> = graph.slots().collect();
        slots.sort_unstable();
        for slot in slots {
            match Slot::factor_of(slot) {
                Some(factor) => {
                    let selector = self.selectors.get(factor).ok_or_else(|| {
                        ConfigurationError::UnknownSelector {
                            factor: factor.to_owned(),
                        }
                    })?;
                    let handles = selector.bind(self.registry, &ctx, &mut instances).await?;
                    aliases.insert(slot.to_owned(), handles);
                }
                None => {
                    let mut component = self.registry.instantiate(slot)?;
                    component.prepare(&ctx).await?;
                    tracing::debug!(slot, "prepared component");
                    instances.insert(slot.to_owned(), component);
                }
            }
        }

        for (from, port, to) in graph.edges() {
            let source = aliases
                .get(from)
                .map(|(_, exit)| exit.as_str())
                .unwrap_or(from);
            let target = aliases
                .get(to)
                .map(|(entry, _)| entry.as_str())
                .unwrap_or(to);
            let component = instances.get_mut(source).ok_or_else(|| {
                ConfigurationError::UnknownComponent {
                    name: source.to_owned(),
                }
            })?;
            component.connect(target.to_owned(), port);
            tracing::debug!(from = source, to = target, port, "connected");
        }

        let first = aliases
            .get(&first)
            .map(|(entry, _)| entry.clone())
            .unwrap_or(first);
        Ok(BoundNetwork {
            components: instances,
            first,
        })
    }
}
