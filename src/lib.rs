//! Tabula - template-driven parsing of device command output
//!
//! This library turns unstructured, line-oriented text (typically the output
//! of a command run on a network device) into structured records, driven by
//! a declarative template that describes how to recognize and extract
//! fields.
//!
//! The pieces compose left to right: an [`IndexStore`] picks a template for
//! a `(platform, command)` pair, the template [`compile`]r produces an
//! immutable [`TemplateDefinition`], the [`engine`] runs it against raw text
//! as a finite-state machine, and the [`Orchestrator`] wires all of that
//! behind one `run` call with a compiled-definition cache.
//!
//! # Example
//!
//! ```rust
//! let template = "\
//! Value Required VLAN_ID (\\d+)
//! Value VLAN_NAME (\\S+)
//!
//! Start
//!   ^${VLAN_ID}\\s+${VLAN_NAME} [Record]
//! ";
//!
//! let records = tabula::parse(template, "1 default\n10 finance\n").unwrap();
//! assert_eq!(records.len(), 2);
//! assert_eq!(records[0].get("vlan_name"), Some(&tabula::Value::from("default")));
//! ```

pub mod engine;
pub mod error;
pub mod index;
pub mod orchestrator;
pub mod record;
pub mod settings;
pub mod template;
pub mod transport;

pub use engine::ParseError;
pub use error::TemplateError;
pub use index::{IndexError, IndexStore, NoTemplateMatch};
pub use orchestrator::{ConfigError, Orchestrator};
pub use record::{Record, Value};
pub use template::{compile, TemplateDefinition};
pub use transport::{FetchOptions, FileTransport, Transport, TransportError};

use thiserror::Error;

/// Errors that can surface from the parse pipeline
#[derive(Debug, Error)]
pub enum EngineError {
    /// Index or template source missing or malformed
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// No index rule matched the platform/command pair
    #[error(transparent)]
    NoTemplateMatch(#[from] NoTemplateMatch),

    /// Template failed to compile
    #[error("{0}")]
    Template(#[from] TemplateError),

    /// The engine aborted at runtime
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// Opaque failure from a transport collaborator, passed through unchanged
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Compile a template and run it against raw text in one step.
///
/// This is the entry point for callers that already hold template source and
/// don't need index resolution; use [`Orchestrator::run`] for the full
/// resolve-compile-parse pipeline.
pub fn parse(template_source: &str, raw_text: &str) -> Result<Vec<Record>, EngineError> {
    let definition = template::compile(template_source)?;
    Ok(engine::run(&definition, raw_text)?)
}
