//! The layered record type.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use super::{INPUT_PLAN, SampleError};
use crate::attributes::{AttrValue, DEPTH_ATTRIBUTE};

/// One layer of a sample: attribute name to value.
pub type AttrMap = FxHashMap<String, AttrValue>;

/// A set of data associated with a specific physical entity, for example a
/// single locus on a sediment core.
///
/// Data is organized by its source: the mandatory `input` layer holds the
/// canonical measured values, and each run of a workflow ("computation
/// plan") lays its derived values in an independent overlay. Layers never
/// mix; merged reading happens through
/// [`VirtualSample`](super::VirtualSample).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    input: AttrMap,
    runs: FxHashMap<String, AttrMap>,
}

impl Sample {
    /// A sample with an empty `input` layer.
    pub fn new() -> Self {
        Self::default()
    }

    /// A sample whose `input` layer holds the given data.
    pub fn from_input(input: AttrMap) -> Self {
        Self {
            input,
            runs: FxHashMap::default(),
        }
    }

    /// Display identity, derived from the input layer's `core` and `depth`.
    pub fn name(&self) -> String {
        let part = |key: &str| {
            self.input
                .get(key)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "?".to_owned())
        };
        format!("{}:{}", part("core"), part(DEPTH_ATTRIBUTE))
    }

    pub fn input(&self) -> &AttrMap {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut AttrMap {
        &mut self.input
    }

    pub fn layer(&self, plan: &str) -> Option<&AttrMap> {
        if plan == INPUT_PLAN {
            Some(&self.input)
        } else {
            self.runs.get(plan)
        }
    }

    pub fn layer_mut(&mut self, plan: &str) -> Option<&mut AttrMap> {
        if plan == INPUT_PLAN {
            Some(&mut self.input)
        } else {
            self.runs.get_mut(plan)
        }
    }

    /// The named layer, created empty if absent. Run layers come into being
    /// lazily the first time a view touches them.
    pub(crate) fn ensure_layer(&mut self, plan: &str) -> &mut AttrMap {
        if plan == INPUT_PLAN {
            &mut self.input
        } else {
            self.runs.entry(plan.to_owned()).or_default()
        }
    }

    /// Remove a run's layer. `Ok(None)` when the sample never carried the
    /// plan; removing `input` is refused.
    pub fn remove_layer(&mut self, plan: &str) -> Result<Option<AttrMap>, SampleError> {
        if plan == INPUT_PLAN {
            return Err(SampleError::CannotStripInput);
        }
        Ok(self.runs.remove(plan))
    }

    /// Run identifiers present on this sample, `input` included.
    pub fn plans(&self) -> impl Iterator<Item = &str> {
        std::iter::once(INPUT_PLAN).chain(self.runs.keys().map(String::as_str))
    }

    /// Whether any layer beyond `input` exists.
    pub fn has_run_layers(&self) -> bool {
        !self.runs.is_empty()
    }

    /// Union of attribute names across every layer.
    pub fn all_properties(&self) -> FxHashSet<String> {
        let mut props: FxHashSet<String> = self.input.keys().cloned().collect();
        for layer in self.runs.values() {
            props.extend(layer.keys().cloned());
        }
        props
    }
}
