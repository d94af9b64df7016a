//! Factor selectors: swappable sub-chains behind a workflow placeholder.
//!
//! A [`Selector`] is the lookup table for one factor: each *mode* names an
//! ordered sequence of concrete component slots. The computation plan picks
//! the mode (under the selector's own name), and at bind time the chosen
//! chain is instantiated, wired head-to-tail on the default port, and
//! exposed through its first and last instances — so from the outside the
//! whole sub-chain behaves as a single component. This lets the same
//! workflow run different code (say, a different interpolation scheme) as
//! long as it produces the same outputs from the same inputs.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::ConfigurationError;
use crate::components::{Component, ComponentRegistry, DEFAULT_PORT, PrepareContext, SlotId};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Selector {
    name: String,
    modes: FxHashMap<String, Vec<String>>,
}

impl Selector {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            modes: FxHashMap::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Define (or redefine) a mode as an ordered chain of slot names.
    pub fn add_mode(&mut self, mode: impl Into<String>, chain: Vec<String>) {
        self.modes.insert(mode.into(), chain);
    }

    pub fn modes(&self) -> impl Iterator<Item = &str> {
        self.modes.keys().map(String::as_str)
    }

    pub fn chain(&self, mode: &str) -> Option<&[String]> {
        self.modes.get(mode).map(Vec::as_slice)
    }

    /// Instantiate the chain the plan's mode selects.
    ///
    /// Each chain slot is constructed through the registry, prepared, and
    /// stored in `instances`; consecutive slots are connected on the
    /// default port. Returns the `(entry, exit)` instance ids — equal for a
    /// chain of length one.
    pub(crate) async fn bind(
        &self,
        registry: &ComponentRegistry,
        ctx: &PrepareContext<'_>,
        instances: &mut FxHashMap<SlotId, Box<dyn Component>>,
    ) -> Result<(SlotId, SlotId), ConfigurationError> {
        let mode = ctx.plan.get_str(&self.name)?;
        let chain = self
            .modes
            .get(mode)
            .ok_or_else(|| ConfigurationError::UnknownMode {
                selector: self.name.clone(),
                mode: mode.to_owned(),
            })?;
        let (Some(entry), Some(exit)) = (chain.first(), chain.last()) else {
            return Err(ConfigurationError::EmptyFactorChain {
                selector: self.name.clone(),
                mode: mode.to_owned(),
            });
        };
        tracing::debug!(selector = %self.name, mode, chain = ?chain, "binding factor chain");
        for slot in chain {
            let mut component = registry.instantiate(slot)?;
            component.prepare(ctx).await?;
            instances.insert(slot.clone(), component);
        }
        for pair in chain.windows(2) {
            if let Some(component) = instances.get_mut(&pair[0]) {
                component.connect(pair[1].clone(), DEFAULT_PORT);
            }
        }
        Ok((entry.clone(), exit.clone()))
    }
}
