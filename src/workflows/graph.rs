//! Declarative workflow topology.
//!
//! A [`WorkflowGraph`] names component slots and records the output-port
//! connections between them:
//!
//! ```text
//! { "source slot": { "output port": "destination slot", ... }, ... }
//! ```
//!
//! A slot whose name has the shape `Factor<x>` is a placeholder for factor
//! `x`; its true identity is resolved at bind time through the selector
//! registered under that factor name.
//!
//! # Examples
//!
//! ```
//! use coreflow::workflows::{Slot, WorkflowGraph};
//!
//! let mut graph = WorkflowGraph::new("age model");
//! graph.connect("load measurements", "Factor<calibration>");
//! graph.connect("Factor<calibration>", "interpolate ages");
//!
//! assert_eq!(graph.first_slot().unwrap(), "load measurements");
//! assert!(graph.factor_names().contains("calibration"));
//! assert_eq!(
//!     Slot::parse("Factor<calibration>"),
//!     Slot::Factor("calibration".to_owned()),
//! );
//! ```

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::ConfigurationError;
use crate::components::{ComponentRegistry, DEFAULT_PORT};

/// Marker prefix that makes a slot name a factor placeholder.
pub const FACTOR_PREFIX: &str = "Factor";

/// Typed identity of a slot name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Slot {
    /// An ordinary slot, resolved through the component registry.
    Component(String),
    /// A factor placeholder, resolved through the named selector.
    Factor(String),
}

impl Slot {
    pub fn parse(name: &str) -> Self {
        match Self::factor_of(name) {
            Some(factor) => Self::Factor(factor.to_owned()),
            None => Self::Component(name.to_owned()),
        }
    }

    /// The factor id inside a `Factor<...>` slot name, if it is one.
    pub fn factor_of(name: &str) -> Option<&str> {
        name.strip_prefix(FACTOR_PREFIX)?
            .strip_prefix('<')?
            .strip_suffix('>')
    }
}

/// A linkage between components, used to perform a series of calculations
/// on a group of samples.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WorkflowGraph {
    name: String,
    connections: FxHashMap<String, FxHashMap<String, String>>,
}

impl WorkflowGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connections: FxHashMap::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ensure a slot exists. Idempotent; an existing slot keeps its
    /// connections.
    pub fn add_slot(&mut self, name: impl Into<String>) {
        self.connections.entry(name.into()).or_default();
    }

    /// Connect two slots on the default port. Both slots are added if
    /// absent; a prior edge from `from` on the port is overwritten.
    pub fn connect(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.connect_on(from, DEFAULT_PORT, to);
    }

    /// Connect two slots on a named output port.
    pub fn connect_on(
        &mut self,
        from: impl Into<String>,
        port: impl Into<String>,
        to: impl Into<String>,
    ) {
        let from = from.into();
        let to = to.into();
        self.add_slot(to.clone());
        self.connections
            .entry(from)
            .or_default()
            .insert(port.into(), to);
    }

    pub fn contains_slot(&self, name: &str) -> bool {
        self.connections.contains_key(name)
    }

    pub fn slots(&self) -> impl Iterator<Item = &str> {
        self.connections.keys().map(String::as_str)
    }

    /// Every declared edge as `(from, port, to)`.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &str)> {
        self.connections.iter().flat_map(|(from, ports)| {
            ports
                .iter()
                .map(move |(port, to)| (from.as_str(), port.as_str(), to.as_str()))
        })
    }

    /// Distinct factor ids found in slot names.
    pub fn factor_names(&self) -> BTreeSet<String> {
        self.connections
            .keys()
            .filter_map(|name| Slot::factor_of(name))
            .map(str::to_owned)
            .collect()
    }

    /// The unique slot with no incoming connection.
    ///
    /// Anything else — no such slot, or several — is a configuration error:
    /// propagation would not know where to start, or would silently skip a
    /// disconnected chain.
    pub fn first_slot(&self) -> Result<&str, ConfigurationError> {
        let mut candidates: BTreeSet<&str> = self.slots().collect();
        for (_, _, to) in self.edges() {
            candidates.remove(to);
        }
        if candidates.len() == 1 {
            // just checked that exactly one candidate is present
            Ok(candidates.into_iter().next().unwrap_or_default())
        } else {
            Err(ConfigurationError::NoFirstSlot {
                workflow: self.name.clone(),
                candidates: candidates.len(),
            })
        }
    }

    /// Union, over every non-factor slot, of the plan parameters the slot's
    /// registered component type declares it needs.
    pub fn required_parameters(
        &self,
        registry: &ComponentRegistry,
    ) -> Result<BTreeSet<String>, ConfigurationError> {
        let mut params = BTreeSet::new();
        for slot in self.slots() {
            if Slot::factor_of(slot).is_some() {
                continue;
            }
            params.extend(registry.declared_params(slot)?.iter().cloned());
        }
        Ok(params)
    }
}
