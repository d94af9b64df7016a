//! The keyed record collection.

use miette::Diagnostic;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use super::{Depth, INPUT_PLAN, Sample, VirtualCore};
use crate::attributes::{AttrValue, DEPTH_ATTRIBUTE};

/// Errors from the record model.
#[derive(Debug, Error, Diagnostic)]
pub enum SampleError {
    /// A computation plan already present on a core cannot be started again.
    #[error("computation plan {plan:?} already exists on this core")]
    #[diagnostic(
        code(coreflow::samples::plan_exists),
        help("strip the plan first, or pick a fresh run name")
    )]
    PlanExists { plan: String },

    #[error("computation plan {plan:?} is not present on this core")]
    #[diagnostic(code(coreflow::samples::unknown_plan))]
    UnknownPlan { plan: String },

    /// The canonical input layer is never removable.
    #[error("the input layer cannot be stripped")]
    #[diagnostic(code(coreflow::samples::strip_input))]
    CannotStripInput,

    /// An `input` view over a core that already carries run layers would
    /// alias derived data into the canonical layer.
    #[error("cannot view the input layer of a core that has run layers")]
    #[diagnostic(code(coreflow::samples::input_view))]
    InputViewRejected,

    #[error("sample has no numeric depth in its input layer")]
    #[diagnostic(
        code(coreflow::samples::missing_depth),
        help("records are keyed by depth; populate it before adding the sample")
    )]
    MissingDepth,
}

/// A collection of [`Sample`]s keyed by depth, owned exclusively.
///
/// The core tracks the set of run identifiers ("computation plans") present
/// anywhere in its records. The set always contains `input` and is
/// maintained eagerly on insertion — it is never recomputed lazily.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Core {
    name: String,
    samples: BTreeMap<Depth, Sample>,
    cplans: FxHashSet<String>,
}

impl Core {
    pub fn new(name: impl Into<String>) -> Self {
        let mut cplans = FxHashSet::default();
        cplans.insert(INPUT_PLAN.to_owned());
        Self {
            name: name.into(),
            samples: BTreeMap::new(),
            cplans,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Run identifiers present anywhere in this core, `input` included.
    pub fn plans(&self) -> &FxHashSet<String> {
        &self.cplans
    }

    /// Insert a sample at an explicit depth, replacing any previous record
    /// there and folding the sample's layer names into the plan set.
    pub fn insert(&mut self, depth: Depth, sample: Sample) {
        self.cplans.extend(sample.plans().map(str::to_owned));
        self.samples.insert(depth, sample);
    }

    /// Add a sample keyed by its own input-layer depth, stamping the core's
    /// name into the input layer on the way in.
    pub fn add(&mut self, mut sample: Sample) -> Result<Depth, SampleError> {
        let depth = sample
            .input()
            .get(DEPTH_ATTRIBUTE)
            .and_then(AttrValue::as_f64)
            .map(Depth::new)
            .ok_or(SampleError::MissingDepth)?;
        sample
            .input_mut()
            .insert("core".to_owned(), AttrValue::String(self.name.clone()));
        self.insert(depth, sample);
        Ok(depth)
    }

    pub fn get(&self, depth: Depth) -> Option<&Sample> {
        self.samples.get(&depth)
    }

    pub(crate) fn get_mut(&mut self, depth: Depth) -> Option<&mut Sample> {
        self.samples.get_mut(&depth)
    }

    /// Depths in ascending order.
    pub fn depths(&self) -> Vec<Depth> {
        self.samples.keys().copied().collect()
    }

    /// Records in ascending depth order.
    pub fn iter(&self) -> impl Iterator<Item = (Depth, &Sample)> {
        self.samples.iter().map(|(d, s)| (*d, s))
    }

    pub(crate) fn samples_mut(&mut self) -> impl Iterator<Item = &mut Sample> {
        self.samples.values_mut()
    }

    /// Register a new computation plan and return the live view over it.
    ///
    /// A plan already represented on this core is refused, and the failed
    /// call leaves both the plan set and every record untouched.
    pub fn new_computation(&mut self, plan: &str) -> Result<VirtualCore<'_>, SampleError> {
        if self.cplans.contains(plan) {
            return Err(SampleError::PlanExists {
                plan: plan.to_owned(),
            });
        }
        self.cplans.insert(plan.to_owned());
        Ok(VirtualCore::attach(self, plan))
    }

    /// View an existing plan. Viewing `input` is only allowed while it is
    /// the sole plan on the core.
    pub fn view(&mut self, plan: &str) -> Result<VirtualCore<'_>, SampleError> {
        if !self.cplans.contains(plan) {
            return Err(SampleError::UnknownPlan {
                plan: plan.to_owned(),
            });
        }
        if plan == INPUT_PLAN && self.cplans.len() > 1 {
            return Err(SampleError::InputViewRejected);
        }
        Ok(VirtualCore::attach(self, plan))
    }

    /// The plan names a front end would present, sorted: `input` alone when
    /// it is the only plan, otherwise every non-input plan.
    pub fn virtualize(&self) -> Vec<String> {
        if self.cplans.len() == 1 {
            vec![INPUT_PLAN.to_owned()]
        } else {
            let mut plans: Vec<String> = self
                .cplans
                .iter()
                .filter(|p| p.as_str() != INPUT_PLAN)
                .cloned()
                .collect();
            plans.sort_unstable();
            plans
        }
    }

    /// Bulk-remove a run's layer from every record and retire the plan id.
    pub fn strip_plan(&mut self, plan: &str) -> Result<(), SampleError> {
        if plan == INPUT_PLAN {
            return Err(SampleError::CannotStripInput);
        }
        if !self.cplans.contains(plan) {
            return Err(SampleError::UnknownPlan {
                plan: plan.to_owned(),
            });
        }
        for sample in self.samples.values_mut() {
            sample.remove_layer(plan)?;
        }
        self.cplans.remove(plan);
        Ok(())
    }
}
