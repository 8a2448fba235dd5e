//! Per-run binding state
//!
//! Bindings are held in two tiers rather than per-variable flags: Filldown
//! variables live in the persistent tier, which only `Clearall` resets;
//! everything else lives in the transient tier, reset by `Clear`, `Clearall`,
//! or record emission.

use std::collections::HashMap;

use crate::record::Value;
use crate::template::VariableSpec;

/// Mutable variable bindings for one parse run.
#[derive(Debug, Default)]
pub(crate) struct Bindings {
    transient: HashMap<String, Value>,
    persistent: HashMap<String, Value>,
}

impl Bindings {
    /// Bind a captured value. List variables append; plain variables
    /// overwrite.
    pub fn bind(&mut self, var: &VariableSpec, text: &str) {
        let tier = if var.is_filldown() {
            &mut self.persistent
        } else {
            &mut self.transient
        };
        if var.is_list() {
            let slot = tier
                .entry(var.name.clone())
                .or_insert_with(|| Value::List(Vec::new()));
            match slot {
                Value::List(items) => items.push(text.to_string()),
                Value::Single(_) => *slot = Value::List(vec![text.to_string()]),
            }
        } else {
            tier.insert(var.name.clone(), Value::Single(text.to_string()));
        }
    }

    /// Current value of a variable, whichever tier it lives in.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.persistent.get(name).or_else(|| self.transient.get(name))
    }

    /// Reset the transient tier. Filldown values persist.
    pub fn clear(&mut self) {
        self.transient.clear();
    }

    /// Reset both tiers.
    pub fn clear_all(&mut self) {
        self.transient.clear();
        self.persistent.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Modifiers;

    fn var(name: &str, modifiers: Modifiers) -> VariableSpec {
        VariableSpec {
            name: name.to_string(),
            modifiers,
            pattern: r"\S+".to_string(),
        }
    }

    #[test]
    fn test_plain_bind_overwrites() {
        let mut bindings = Bindings::default();
        let v = var("NAME", Modifiers::empty());
        bindings.bind(&v, "first");
        bindings.bind(&v, "second");
        assert_eq!(bindings.get("NAME"), Some(&Value::from("second")));
    }

    #[test]
    fn test_list_bind_appends() {
        let mut bindings = Bindings::default();
        let v = var("PORTS", Modifiers::LIST);
        bindings.bind(&v, "Gi1/1");
        bindings.bind(&v, "Gi1/2");
        assert_eq!(
            bindings.get("PORTS"),
            Some(&Value::List(vec!["Gi1/1".to_string(), "Gi1/2".to_string()]))
        );
    }

    #[test]
    fn test_clear_keeps_filldown() {
        let mut bindings = Bindings::default();
        bindings.bind(&var("STICKY", Modifiers::FILLDOWN), "kept");
        bindings.bind(&var("PLAIN", Modifiers::empty()), "dropped");
        bindings.clear();
        assert_eq!(bindings.get("STICKY"), Some(&Value::from("kept")));
        assert_eq!(bindings.get("PLAIN"), None);
    }

    #[test]
    fn test_clear_all_resets_everything() {
        let mut bindings = Bindings::default();
        bindings.bind(&var("STICKY", Modifiers::FILLDOWN), "kept");
        bindings.clear_all();
        assert_eq!(bindings.get("STICKY"), None);
    }
}
