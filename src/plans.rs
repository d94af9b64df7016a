//! Computation plans: the per-run configuration.
//!
//! A [`ComputationPlan`] is an opaque named bag of parameter values — factor
//! modes, calibration choices, tuning knobs — that a workflow binding reads
//! by key. The plan's name doubles as the run identifier written into each
//! record's layer, so "which parameters" and "whose derived data" stay one
//! and the same thing.
//!
//! Lookup of an unknown key is a [`ConfigurationError`], never a silent
//! default.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::workflows::ConfigurationError;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ComputationPlan {
    name: String,
    params: FxHashMap<String, Value>,
}

impl ComputationPlan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: FxHashMap::default(),
        }
    }

    /// The plan's name, which is also its run identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.params.insert(key.into(), value.into());
    }

    pub fn try_get(&self, key: &str) -> Option<&Value> {
        self.params.get(key)
    }

    /// Checked lookup: an absent key is a configuration error.
    pub fn get(&self, key: &str) -> Result<&Value, ConfigurationError> {
        self.params
            .get(key)
            .ok_or_else(|| ConfigurationError::MissingParameter {
                plan: self.name.clone(),
                key: key.to_owned(),
            })
    }

    /// Checked string lookup, for factor modes and similar choices.
    pub fn get_str(&self, key: &str) -> Result<&str, ConfigurationError> {
        self.get(key)?
            .as_str()
            .ok_or_else(|| ConfigurationError::ParameterType {
                key: key.to_owned(),
                expected: "string",
            })
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}
