//! The layered record model.
//!
//! A [`Core`] owns a depth-keyed collection of [`Sample`]s. Each sample
//! carries a mandatory `input` layer of canonical measured data plus zero or
//! more run layers, one per computation plan that has processed it. The
//! [`VirtualSample`] and [`VirtualCore`] views fix a sample or a whole core
//! to one plan and present that plan's layer merged over the input layer, so
//! independent runs never see — or damage — each other's derived values.
//!
//! # Lifecycle
//!
//! A sample is created with only its `input` layer populated. A run layer
//! appears lazily the first time a view for that plan touches the sample. A
//! run's data across all records disappears in bulk when the plan is
//! retired ([`Core::strip_plan`]) or is narrowed to its output attributes by
//! the scheduler's end-of-run purge
//! ([`VirtualSample::purge_intermediates`]).

mod core;
mod depth;
mod sample;
mod views;

pub use self::core::{Core, SampleError};
pub use depth::Depth;
pub use sample::{AttrMap, Sample};
pub use views::{VirtualCore, VirtualSample};

/// The distinguished run identifier of the canonical input layer.
pub const INPUT_PLAN: &str = "input";
