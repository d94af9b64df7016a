//! Configuration errors surfaced while turning a declarative workflow plus
//! a computation plan into a live component network.
//!
//! Every variant is fatal to binding and is reported before any record
//! processing begins; none of them is ever silently recovered.

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigurationError {
    /// Zero or several slots have no incoming connection.
    #[error("workflow {workflow:?} does not have a unique first slot ({candidates} candidates)")]
    #[diagnostic(
        code(coreflow::workflows::first_slot),
        help("exactly one slot must appear in no connection's destination")
    )]
    NoFirstSlot { workflow: String, candidates: usize },

    #[error("unknown component type: {name:?}")]
    #[diagnostic(
        code(coreflow::workflows::unknown_component),
        help("register the component type before binding the workflow")
    )]
    UnknownComponent { name: String },

    #[error("no selector registered for factor {factor:?}")]
    #[diagnostic(code(coreflow::workflows::unknown_selector))]
    UnknownSelector { factor: String },

    #[error("selector {selector:?} has no mode {mode:?}")]
    #[diagnostic(
        code(coreflow::workflows::unknown_mode),
        help("the computation plan selects a mode this selector does not define")
    )]
    UnknownMode { selector: String, mode: String },

    /// A selector mode must list at least one component.
    #[error("selector {selector:?} mode {mode:?} lists no components")]
    #[diagnostic(code(coreflow::workflows::empty_factor_chain))]
    EmptyFactorChain { selector: String, mode: String },

    #[error("computation plan {plan:?} is missing parameter {key:?}")]
    #[diagnostic(
        code(coreflow::plans::missing_parameter),
        help("add the parameter to the computation plan; unknown keys are never defaulted")
    )]
    MissingParameter { plan: String, key: String },

    #[error("parameter {key:?} is not a {expected}")]
    #[diagnostic(code(coreflow::plans::parameter_type))]
    ParameterType { key: String, expected: &'static str },

    /// A component asked for a reference table the store does not hold.
    #[error("unknown reference table: {table:?}")]
    #[diagnostic(
        code(coreflow::reference::unknown_table),
        help("load the reference table into the store before binding")
    )]
    UnknownReference { table: String },
}
