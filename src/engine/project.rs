//! Binding projection
//!
//! Turns current bindings into an immutable [`Record`]. Projection happens at
//! emission time so records carry their own values and cannot be changed by
//! later mutation of the run's bindings.

use crate::engine::context::Bindings;
use crate::record::Record;
use crate::template::TemplateDefinition;

/// Snapshot current bindings into a record.
///
/// Field order follows variable declaration order; names are lower-cased by
/// [`Record::insert`]. Variables with no value are omitted. Returns `None`
/// when a `Required` variable is empty, or when no variable holds a value at
/// all (an all-empty snapshot carries no information).
pub(crate) fn snapshot(def: &TemplateDefinition, bindings: &Bindings) -> Option<Record> {
    let mut record = Record::new();
    let mut any_value = false;
    for var in def.variables() {
        match bindings.get(&var.name) {
            Some(value) if !value.is_empty() => {
                record.insert(&var.name, value.clone());
                any_value = true;
            }
            _ if var.is_required() => return None,
            _ => {}
        }
    }
    if !any_value {
        return None;
    }
    Some(record)
}
