//! Compiled template model
//!
//! A [`TemplateDefinition`] is the immutable, executable form of a template:
//! the declared variables in declaration order plus a state table of ordered
//! match rules. Definitions are produced once by the compiler and shared
//! read-only between parse runs.

use bitflags::bitflags;
use indexmap::IndexMap;
use regex::Regex;

/// Entry state every template must declare.
pub const START_STATE: &str = "Start";

/// Implicit terminal state; a transition target but never declared.
pub const EOF_STATE: &str = "EOF";

bitflags! {
    /// Behavior flags attached to a variable declaration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Modifiers: u8 {
        /// Suppress any record in which this variable has no value.
        const REQUIRED = 0b0001;
        /// Value survives record emission and `Clear`; only `Clearall` resets it.
        const FILLDOWN = 0b0010;
        /// Captures accumulate into an ordered list instead of overwriting.
        const LIST = 0b0100;
        /// Variable is part of the row identity for downstream consumers.
        const KEY = 0b1000;
    }
}

/// One declared variable: name, modifiers, and the regex fragment substituted
/// for `${NAME}` references in rule patterns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSpec {
    pub name: String,
    pub modifiers: Modifiers,
    pub pattern: String,
}

impl VariableSpec {
    pub fn is_required(&self) -> bool {
        self.modifiers.contains(Modifiers::REQUIRED)
    }

    pub fn is_filldown(&self) -> bool {
        self.modifiers.contains(Modifiers::FILLDOWN)
    }

    pub fn is_list(&self) -> bool {
        self.modifiers.contains(Modifiers::LIST)
    }
}

/// An action executed when a rule matches, in listed order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Snapshot current bindings into a new immutable record.
    Record,
    /// Reset all non-Filldown variables.
    Clear,
    /// Reset every variable, Filldown included.
    Clearall,
    /// Keep testing the remaining rules of this state against the same line.
    Continue,
    /// Abort the parse with the given message (or a generic one).
    Error(Option<String>),
}

/// One match rule inside a state.
///
/// `raw_pattern` is the pre-substitution pattern text, kept alongside the
/// compiled regex for diagnostics.
#[derive(Debug, Clone)]
pub struct Rule {
    pub raw_pattern: String,
    pub regex: Regex,
    pub actions: Vec<Action>,
    pub next_state: Option<String>,
    /// 1-based source line of this rule.
    pub line: usize,
}

// Structural equality ignores the compiled regex: it is a pure function of
// `raw_pattern` plus the variable table, which are both compared.
impl PartialEq for Rule {
    fn eq(&self, other: &Self) -> bool {
        self.raw_pattern == other.raw_pattern
            && self.actions == other.actions
            && self.next_state == other.next_state
            && self.line == other.line
    }
}

impl Eq for Rule {}

/// Immutable, executable form of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDefinition {
    pub(crate) variables: Vec<VariableSpec>,
    pub(crate) states: IndexMap<String, Vec<Rule>>,
}

impl TemplateDefinition {
    /// Declared variables, in declaration order.
    pub fn variables(&self) -> &[VariableSpec] {
        &self.variables
    }

    /// Look up a variable by name.
    pub fn variable(&self, name: &str) -> Option<&VariableSpec> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Rules of a declared state, in declaration order.
    pub fn state(&self, name: &str) -> Option<&[Rule]> {
        self.states.get(name).map(|rules| rules.as_slice())
    }

    /// Declared state names, in declaration order.
    pub fn state_names(&self) -> impl Iterator<Item = &str> {
        self.states.keys().map(|s| s.as_str())
    }
}
