//! Template model and compiler

pub mod compiler;
pub mod types;

pub use compiler::compile;
pub use types::{
    Action, Modifiers, Rule, TemplateDefinition, VariableSpec, EOF_STATE, START_STATE,
};
