//! Finite-state parser engine
//!
//! Takes a compiled template definition and raw command output, and produces
//! structured records. All state for a run lives in the run itself; the
//! definition is shared read-only.

mod context;
pub mod error;
mod machine;
mod project;

pub use error::ParseError;
pub use machine::run;
