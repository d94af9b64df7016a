//! Per-run views over samples and cores.
//!
//! A [`VirtualSample`] is a read/write view of one [`Sample`] fixed to one
//! computation plan: reads merge the run layer over the `input` layer and
//! yield "no value" (never an error) when a key is absent from both; writes
//! always land in the run layer. A [`VirtualCore`] is the same idea lifted
//! to a whole [`Core`] — a `(core, plan)` binding that owns no records.

use rustc_hash::FxHashSet;

use super::{Core, Depth, INPUT_PLAN, Sample, SampleError};
use crate::attributes::{AttrValue, AttributeRegistry, PLAN_ATTRIBUTE};

/// Read/write view of one sample fixed to one computation plan.
pub struct VirtualSample<'a> {
    sample: &'a mut Sample,
    plan: &'a str,
}

impl<'a> VirtualSample<'a> {
    /// Attach a view to a sample, creating the run layer lazily.
    ///
    /// Viewing `input` on a sample that already carries run layers is
    /// rejected: writes through such a view would corrupt the canonical
    /// data.
    pub fn new(sample: &'a mut Sample, plan: &'a str) -> Result<Self, SampleError> {
        if plan == INPUT_PLAN && sample.has_run_layers() {
            return Err(SampleError::InputViewRejected);
        }
        Ok(Self::attach(sample, plan))
    }

    pub(crate) fn attach(sample: &'a mut Sample, plan: &'a str) -> Self {
        sample.ensure_layer(plan);
        Self { sample, plan }
    }

    /// The computation plan this view is fixed to.
    pub fn plan(&self) -> &str {
        self.plan
    }

    /// Display identity of the underlying sample.
    pub fn name(&self) -> String {
        self.sample.name()
    }

    /// Merged read: the run layer first, then `input`, then no value.
    ///
    /// The synthetic key `computation plan` reads back the plan id itself.
    pub fn get(&self, key: &str) -> Option<AttrValue> {
        if key == PLAN_ATTRIBUTE {
            return Some(AttrValue::String(self.plan.to_owned()));
        }
        self.sample
            .layer(self.plan)
            .and_then(|layer| layer.get(key))
            .or_else(|| self.sample.input().get(key))
            .cloned()
    }

    /// Write into the run layer.
    pub fn set(&mut self, key: impl Into<String>, value: AttrValue) {
        self.sample.ensure_layer(self.plan).insert(key.into(), value);
    }

    /// Remove a key from the run layer. Input values are untouched and keep
    /// shining through on subsequent reads.
    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.sample
            .layer_mut(self.plan)
            .and_then(|layer| layer.remove(key))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys().contains(key)
    }

    /// Union of the run layer's and the input layer's keys.
    pub fn keys(&self) -> FxHashSet<String> {
        let mut keys: FxHashSet<String> = self
            .sample
            .layer(self.plan)
            .map(|layer| layer.keys().cloned().collect())
            .unwrap_or_default();
        keys.extend(self.sample.input().keys().cloned());
        keys
    }

    /// Drop every run-layer attribute the registry does not mark as output.
    ///
    /// Idempotent: once the transients are gone there is nothing left to
    /// remove. The input layer is never touched.
    pub fn purge_intermediates(&mut self, registry: &AttributeRegistry) {
        if let Some(layer) = self.sample.layer_mut(self.plan) {
            layer.retain(|key, _| registry.is_output(key));
        }
    }
}

/// View of a [`Core`] fixed to one computation plan.
///
/// Never owns records — only the `(core, plan)` binding. Iteration yields
/// [`VirtualSample`]s in ascending depth order.
pub struct VirtualCore<'c> {
    core: &'c mut Core,
    plan: String,
}

impl<'c> VirtualCore<'c> {
    pub(crate) fn attach(core: &'c mut Core, plan: &str) -> Self {
        Self {
            core,
            plan: plan.to_owned(),
        }
    }

    pub fn plan(&self) -> &str {
        &self.plan
    }

    pub fn core_name(&self) -> &str {
        self.core.name()
    }

    pub fn len(&self) -> usize {
        self.core.len()
    }

    pub fn is_empty(&self) -> bool {
        self.core.is_empty()
    }

    /// Depths in ascending order.
    pub fn depths(&self) -> Vec<Depth> {
        self.core.depths()
    }

    /// View the record at one depth.
    pub fn sample(&mut self, depth: Depth) -> Option<VirtualSample<'_>> {
        let Self { core, plan } = self;
        let plan: &str = plan.as_str();
        core.get_mut(depth)
            .map(|sample| VirtualSample::attach(sample, plan))
    }

    /// Views over every record, ascending by depth.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = VirtualSample<'_>> {
        let Self { core, plan } = self;
        let plan: &str = plan.as_str();
        core.samples_mut()
            .map(move |sample| VirtualSample::attach(sample, plan))
    }

    /// Remove this plan's data from the underlying core, consuming the view.
    pub fn strip(self) -> Result<(), SampleError> {
        self.core.strip_plan(&self.plan)
    }
}
