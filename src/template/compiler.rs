//! Template compiler
//!
//! Turns template source into an immutable [`TemplateDefinition`] in two
//! passes. The first pass reads variable declarations and state blocks into
//! raw rules. The second pass substitutes `${NAME}` references with named
//! capture groups, compiles each assembled pattern, and validates every
//! cross reference (capture names, transition targets, the `Start` state).
//!
//! Compilation is pure and deterministic: identical source always yields a
//! structurally identical definition, so callers may cache definitions by
//! content hash.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Span, TemplateError};
use crate::template::types::{
    Action, Modifiers, Rule, TemplateDefinition, VariableSpec, EOF_STATE, START_STATE,
};

static VALUE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^Value(?:\s+([A-Za-z][A-Za-z,]*))?\s+([A-Za-z_]\w*)\s+\((.*)\)$")
        .expect("hardcoded regex")
});

static STATE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z_]\w*)\s*$").expect("hardcoded regex"));

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{(\w+)\}").expect("hardcoded regex"));

static ERROR_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^Error\("(.*)"\)$"#).expect("hardcoded regex"));

static IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_]\w*$").expect("hardcoded regex"));

/// A rule as parsed in pass one, before substitution and validation.
struct RawRule {
    pattern: String,
    actions: Vec<Action>,
    next_state: Option<String>,
    line: usize,
    span: Span,
}

/// Compile template source into a [`TemplateDefinition`].
pub fn compile(source: &str) -> Result<TemplateDefinition, TemplateError> {
    let (variables, raw_states) = parse_sections(source)?;

    if !raw_states.contains_key(START_STATE) {
        return Err(syntax(1, 0..0, format!("missing required state '{START_STATE}'")));
    }

    let mut states: IndexMap<String, Vec<Rule>> = IndexMap::new();
    for (name, raw_rules) in &raw_states {
        let mut rules = Vec::with_capacity(raw_rules.len());
        for raw in raw_rules {
            rules.push(assemble_rule(raw, &variables, &raw_states)?);
        }
        states.insert(name.clone(), rules);
    }

    Ok(TemplateDefinition { variables, states })
}

/// Pass one: split the source into variable declarations and raw state blocks.
fn parse_sections(
    source: &str,
) -> Result<(Vec<VariableSpec>, IndexMap<String, Vec<RawRule>>), TemplateError> {
    let mut variables: Vec<VariableSpec> = Vec::new();
    let mut states: IndexMap<String, Vec<RawRule>> = IndexMap::new();
    let mut current_state: Option<String> = None;

    let mut offset = 0usize;
    for (idx, raw_line) in source.lines().enumerate() {
        let line_no = idx + 1;
        let span = offset..offset + raw_line.len();
        offset += raw_line.len() + 1;

        let line = raw_line.trim_end();
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        if line.starts_with(char::is_whitespace) {
            // Indented: a rule line inside the current state block.
            let Some(state) = &current_state else {
                return Err(syntax(line_no, span, "rule line outside of a state block"));
            };
            let rule = parse_rule_line(line.trim(), line_no, span)?;
            if let Some(rules) = states.get_mut(state) {
                rules.push(rule);
            }
        } else if is_value_decl(line) {
            if current_state.is_some() {
                return Err(syntax(
                    line_no,
                    span,
                    "variable declarations must precede state blocks",
                ));
            }
            let var = parse_value_line(line, line_no, &span)?;
            if variables.iter().any(|v| v.name == var.name) {
                return Err(syntax(
                    line_no,
                    span,
                    format!("duplicate variable '{}'", var.name),
                ));
            }
            variables.push(var);
        } else if let Some(caps) = STATE_LINE.captures(line) {
            let name = caps[1].to_string();
            if name == EOF_STATE {
                return Err(syntax(
                    line_no,
                    span,
                    format!("state '{EOF_STATE}' is implicit and cannot be declared"),
                ));
            }
            if states.contains_key(&name) {
                return Err(syntax(line_no, span, format!("duplicate state '{name}'")));
            }
            states.insert(name.clone(), Vec::new());
            current_state = Some(name);
        } else {
            return Err(syntax(
                line_no,
                span,
                "expected a Value declaration or a state header",
            ));
        }
    }

    Ok((variables, states))
}

fn is_value_decl(line: &str) -> bool {
    line == "Value" || line.strip_prefix("Value").is_some_and(|rest| rest.starts_with(char::is_whitespace))
}

fn parse_value_line(line: &str, line_no: usize, span: &Span) -> Result<VariableSpec, TemplateError> {
    let caps = VALUE_LINE
        .captures(line)
        .ok_or_else(|| syntax(line_no, span.clone(), "malformed Value declaration"))?;

    let mut modifiers = Modifiers::empty();
    if let Some(list) = caps.get(1) {
        for token in list.as_str().split(',') {
            modifiers |= match token {
                "Required" => Modifiers::REQUIRED,
                "Filldown" => Modifiers::FILLDOWN,
                "List" => Modifiers::LIST,
                "Key" => Modifiers::KEY,
                other => {
                    return Err(syntax(
                        line_no,
                        span.clone(),
                        format!("unknown modifier '{other}'"),
                    ))
                }
            };
        }
    }

    Ok(VariableSpec {
        name: caps[2].to_string(),
        modifiers,
        pattern: caps[3].to_string(),
    })
}

/// Parse one indented rule line: a match pattern plus an optional trailing
/// bracketed action list.
fn parse_rule_line(text: &str, line_no: usize, span: Span) -> Result<RawRule, TemplateError> {
    let (pattern, items) = split_action_list(text);

    let mut actions = Vec::new();
    let mut next_state: Option<String> = None;
    for item in items {
        match item {
            ActionItem::Action(action) => actions.push(action),
            ActionItem::Transition(target) => {
                if next_state.is_some() {
                    return Err(syntax(
                        line_no,
                        span.clone(),
                        "a rule may name at most one transition target",
                    ));
                }
                next_state = Some(target);
            }
        }
    }

    if actions.contains(&Action::Continue) && next_state.is_some() {
        return Err(syntax(
            line_no,
            span,
            "'Continue' cannot be combined with a state transition",
        ));
    }

    if pattern.is_empty() {
        return Err(syntax(line_no, span, "rule has an empty match pattern"));
    }

    Ok(RawRule {
        pattern,
        actions,
        next_state,
        line: line_no,
        span,
    })
}

enum ActionItem {
    Action(Action),
    Transition(String),
}

/// Split a rule line into its pattern and action items.
///
/// The action list is a trailing ` [ ... ]` whose comma-separated items all
/// parse as actions or state names. Trailing brackets that do not parse that
/// way (a regex character class, say) are left as pattern text.
fn split_action_list(text: &str) -> (String, Vec<ActionItem>) {
    if text.ends_with(']') {
        if let Some(idx) = text.rfind(" [") {
            let body = &text[idx + 2..text.len() - 1];
            if let Some(items) = try_parse_items(body) {
                return (text[..idx].trim_end().to_string(), items);
            }
        }
    }
    (text.to_string(), Vec::new())
}

fn try_parse_items(body: &str) -> Option<Vec<ActionItem>> {
    let mut items = Vec::new();
    for segment in split_outside_quotes(body) {
        let segment = segment.trim();
        let item = match segment {
            "Record" => ActionItem::Action(Action::Record),
            "Clear" => ActionItem::Action(Action::Clear),
            "Clearall" => ActionItem::Action(Action::Clearall),
            "Continue" => ActionItem::Action(Action::Continue),
            "Error" => ActionItem::Action(Action::Error(None)),
            other => {
                if let Some(caps) = ERROR_ITEM.captures(other) {
                    ActionItem::Action(Action::Error(Some(caps[1].to_string())))
                } else if IDENT.is_match(other) {
                    ActionItem::Transition(other.to_string())
                } else {
                    return None;
                }
            }
        };
        items.push(item);
    }
    if items.is_empty() {
        return None;
    }
    Some(items)
}

/// Split on commas that sit outside double quotes, so
/// `Error("a, b"), Record` yields two segments.
fn split_outside_quotes(s: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                segments.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(&s[start..]);
    segments
}

/// Pass two: substitute placeholders, compile the pattern, and validate
/// capture names and the transition target.
fn assemble_rule(
    raw: &RawRule,
    variables: &[VariableSpec],
    states: &IndexMap<String, Vec<RawRule>>,
) -> Result<Rule, TemplateError> {
    let mut undeclared: Option<String> = None;
    let assembled = PLACEHOLDER.replace_all(&raw.pattern, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        match variables.iter().find(|v| v.name == name) {
            Some(var) => format!("(?P<{}>{})", var.name, var.pattern),
            None => {
                undeclared.get_or_insert_with(|| name.to_string());
                String::new()
            }
        }
    });
    if let Some(name) = undeclared {
        return Err(syntax(
            raw.line,
            raw.span.clone(),
            format!("reference to undeclared variable '{name}'"),
        ));
    }

    let regex = Regex::new(&assembled).map_err(|e| {
        syntax(raw.line, raw.span.clone(), format!("invalid match pattern: {e}"))
    })?;

    for capture in regex.capture_names().flatten() {
        if !variables.iter().any(|v| v.name == capture) {
            return Err(syntax(
                raw.line,
                raw.span.clone(),
                format!("capture group '{capture}' does not name a declared variable"),
            ));
        }
    }

    if let Some(target) = &raw.next_state {
        if target != EOF_STATE && !states.contains_key(target) {
            return Err(syntax(
                raw.line,
                raw.span.clone(),
                format!("unknown state '{target}'"),
            ));
        }
    }

    Ok(Rule {
        raw_pattern: raw.pattern.clone(),
        regex,
        actions: raw.actions.clone(),
        next_state: raw.next_state.clone(),
        line: raw.line,
    })
}

fn syntax(line: usize, span: Span, reason: impl Into<String>) -> TemplateError {
    TemplateError::Syntax {
        line,
        span,
        reason: reason.into(),
    }
}
