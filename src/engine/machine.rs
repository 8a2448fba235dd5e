//! Finite-state parsing machine
//!
//! Executes a compiled [`TemplateDefinition`] against raw text, line by line.
//! In the current state, rules are tested in declaration order and the first
//! match wins; a line matching no rule is skipped. Matched named groups bind
//! into the run's [`Bindings`] before the rule's listed actions execute.

use log::{debug, trace};

use crate::engine::context::Bindings;
use crate::engine::error::ParseError;
use crate::engine::project::snapshot;
use crate::record::Record;
use crate::template::{Action, Rule, TemplateDefinition, EOF_STATE, START_STATE};

/// Run a compiled definition against raw text and return the emitted records.
///
/// Empty input yields zero records. Non-empty input that emits no records at
/// all fails with `"no lines matched"`; an unmatched line in an otherwise
/// productive run is not an error.
pub fn run(def: &TemplateDefinition, text: &str) -> Result<Vec<Record>, ParseError> {
    let mut bindings = Bindings::default();
    let mut records: Vec<Record> = Vec::new();
    let mut state = START_STATE.to_string();
    let mut lines_seen = 0usize;

    'input: for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;
        lines_seen = line_no;

        let Some(rules) = def.state(&state) else {
            return Err(ParseError {
                message: format!("undefined state '{state}'"),
                line: line_no,
                state,
            });
        };

        let mut next_rule = 0;
        while let Some((matched_idx, rule, caps)) = first_match(rules, next_rule, line) {
            trace!(
                "line {line_no}: state '{state}' rule {} matched: {}",
                matched_idx,
                rule.raw_pattern
            );
            bind_captures(def, &mut bindings, rule, &caps);

            let mut continue_line = false;
            for action in &rule.actions {
                match action {
                    Action::Record => {
                        if let Some(record) = snapshot(def, &bindings) {
                            records.push(record);
                            bindings.clear();
                        }
                    }
                    Action::Clear => bindings.clear(),
                    Action::Clearall => bindings.clear_all(),
                    Action::Continue => continue_line = true,
                    Action::Error(message) => {
                        let message = message.clone().unwrap_or_else(|| {
                            format!("error raised by template rule on line {}", rule.line)
                        });
                        return Err(ParseError {
                            message,
                            line: line_no,
                            state,
                        });
                    }
                }
            }

            if let Some(next) = &rule.next_state {
                if next == EOF_STATE {
                    trace!("line {line_no}: transition to {EOF_STATE}, input abandoned");
                    break 'input;
                }
                trace!("line {line_no}: transition '{state}' -> '{next}'");
                state = next.clone();
                break;
            }

            if !continue_line {
                break;
            }
            next_rule = matched_idx + 1;
        }
    }

    // One final implicit record, suppressed exactly like an explicit one
    // when a Required variable is still empty.
    if let Some(record) = snapshot(def, &bindings) {
        records.push(record);
    }

    if lines_seen > 0 && records.is_empty() {
        return Err(ParseError {
            message: "no lines matched".to_string(),
            line: lines_seen,
            state,
        });
    }

    debug!("parse finished: {} lines, {} records", lines_seen, records.len());
    Ok(records)
}

/// First rule at or after `from` whose pattern matches the line.
fn first_match<'d, 'l>(
    rules: &'d [Rule],
    from: usize,
    line: &'l str,
) -> Option<(usize, &'d Rule, regex::Captures<'l>)> {
    rules
        .iter()
        .enumerate()
        .skip(from)
        .find_map(|(i, rule)| rule.regex.captures(line).map(|caps| (i, rule, caps)))
}

/// Bind every named group that participated in the match.
fn bind_captures(
    def: &TemplateDefinition,
    bindings: &mut Bindings,
    rule: &Rule,
    caps: &regex::Captures<'_>,
) {
    for name in rule.regex.capture_names().flatten() {
        if let Some(m) = caps.name(name) {
            if let Some(var) = def.variable(name) {
                bindings.bind(var, m.as_str());
            }
        }
    }
}
