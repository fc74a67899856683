use crate::error::SchemaError;
use crate::path::{ValuePath, join_index, join_key};
use crate::schema::{Concrete, Expansion, Resolver, SchemaNode};
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use serde_json::{Map, Value};
use std::borrow::Cow;

const REQUIRED_MESSAGE: &str = "Required.";

/// A structural validator mirroring the shape of an input schema.
#[derive(Debug, Clone)]
pub enum Validator {
    Object {
        fields: IndexMap<String, Validator>,
    },
    Array {
        item: Box<Validator>,
        min_items: Option<u64>,
        /// `maxItems` is checked as a second lower bound, not an upper one.
        max_items_as_min: Option<u64>,
    },
    Boolean {
        required: bool,
    },
    Number {
        required: bool,
    },
    String {
        required: bool,
        max_length: Option<u64>,
        pattern: Option<Pattern>,
    },
}

/// A compiled `pattern` keyword together with its source text.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub source: String,
    regex: Regex,
}

impl Pattern {
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

/// Synthesizes the validator for a root schema node.
pub fn build_validator<'a>(resolver: &Resolver<'a>, node: &'a SchemaNode) -> Result<Validator, SchemaError> {
    build(resolver, node, &IndexSet::new(), "", "", &mut Expansion::new())
}

fn build<'a>(
    resolver: &Resolver<'a>,
    node: &'a SchemaNode,
    required_at_parent: &IndexSet<String>,
    key_at_parent: &str,
    key_path: &str,
    expansion: &mut Expansion<'a>,
) -> Result<Validator, SchemaError> {
    let required = required_at_parent.contains(key_at_parent);
    let (concrete, mark) = expansion.enter(resolver, node)?;
    let validator = match concrete {
        Concrete::Object(object) => {
            let mut fields = IndexMap::with_capacity(object.properties.len());
            for (name, property) in &object.properties {
                let child = build(
                    resolver,
                    property,
                    &object.required,
                    name,
                    &join_key(key_path, name),
                    expansion,
                )?;
                fields.insert(name.clone(), child);
            }
            Validator::Object { fields }
        }
        Concrete::Array(array) => Validator::Array {
            // Item validators never see a parent `required` set.
            item: Box::new(build(
                resolver,
                array.items.item(),
                &IndexSet::new(),
                "",
                &join_index(key_path, 0),
                expansion,
            )?),
            min_items: array.min_items.filter(|n| *n > 0),
            max_items_as_min: array.max_items.filter(|n| *n > 0),
        },
        Concrete::Boolean(_) => Validator::Boolean { required },
        Concrete::Number(_) => Validator::Number { required },
        Concrete::String(string) => {
            let pattern = match &string.pattern {
                Some(source) if !source.is_empty() => {
                    let regex = Regex::new(source).map_err(|e| SchemaError::InvalidPattern {
                        path: key_path.to_string(),
                        pattern: source.clone(),
                        message: e.to_string(),
                    })?;
                    Some(Pattern {
                        source: source.clone(),
                        regex,
                    })
                }
                _ => None,
            };
            Validator::String {
                required,
                max_length: string.max_length.filter(|n| *n > 0),
                pattern,
            }
        }
    };
    expansion.leave(mark);
    Ok(validator)
}

impl Validator {
    /// Validates a value tree, collecting one message per failing field.
    pub fn validate(&self, value: &Value) -> FormErrors {
        let mut failures = Vec::new();
        self.check(Some(value), &ValuePath::root(), &mut failures);

        let mut errors = FormErrors::default();
        for (path, message) in failures {
            errors.insert_first(&path, message);
        }
        errors
    }

    fn check(&self, value: Option<&Value>, path: &ValuePath, failures: &mut Vec<(ValuePath, String)>) {
        let value = value.filter(|v| !v.is_null());
        match self {
            Validator::Object { fields } => {
                let record = match value {
                    None => None,
                    Some(Value::Object(record)) => Some(record),
                    Some(_) => {
                        failures.push((path.clone(), type_error(path, "object")));
                        return;
                    }
                };
                for (name, field) in fields {
                    field.check(record.and_then(|r| r.get(name)), &path.key(name), failures);
                }
            }
            Validator::Array {
                item,
                min_items,
                max_items_as_min,
            } => {
                let items = match value {
                    None => return,
                    Some(Value::Array(items)) => items,
                    Some(_) => {
                        failures.push((path.clone(), type_error(path, "array")));
                        return;
                    }
                };
                for bound in [min_items, max_items_as_min].into_iter().flatten() {
                    if (items.len() as u64) < *bound {
                        failures.push((
                            path.clone(),
                            format!("{} field must have at least {} items", label(path), bound),
                        ));
                    }
                }
                for (index, element) in items.iter().enumerate() {
                    item.check(Some(element), &path.index(index), failures);
                }
            }
            Validator::Boolean { required } => match value {
                None if *required => failures.push((path.clone(), REQUIRED_MESSAGE.to_string())),
                None | Some(Value::Bool(_)) => {}
                Some(Value::String(s)) if coerce_bool(s).is_some() => {}
                Some(Value::Number(n)) if n.as_f64() == Some(0.0) || n.as_f64() == Some(1.0) => {}
                Some(_) => failures.push((path.clone(), type_error(path, "boolean"))),
            },
            Validator::Number { required } => match value {
                None if *required => failures.push((path.clone(), REQUIRED_MESSAGE.to_string())),
                None | Some(Value::Number(_)) => {}
                Some(Value::String(s)) if coerce_number(s).is_some() => {}
                Some(_) => failures.push((path.clone(), type_error(path, "number"))),
            },
            Validator::String {
                required,
                max_length,
                pattern,
            } => {
                let text = match value {
                    None => String::new(),
                    Some(Value::String(s)) => s.clone(),
                    Some(Value::Number(n)) => n.to_string(),
                    Some(Value::Bool(b)) => b.to_string(),
                    Some(_) => {
                        failures.push((path.clone(), type_error(path, "string")));
                        return;
                    }
                };
                if *required && text.is_empty() {
                    failures.push((path.clone(), REQUIRED_MESSAGE.to_string()));
                }
                if let Some(max) = max_length {
                    if text.chars().count() as u64 > *max {
                        failures.push((
                            path.clone(),
                            format!("Cannot be more than {} characters", max),
                        ));
                    }
                }
                if let Some(pattern) = pattern {
                    if !pattern.is_match(&text) {
                        failures.push((
                            path.clone(),
                            format!("Invalid value. Not matching {}", pattern.source),
                        ));
                    }
                }
            }
        }
    }
}

fn label(path: &ValuePath) -> String {
    if path.is_root() {
        "this".to_string()
    } else {
        path.to_string()
    }
}

fn type_error(path: &ValuePath, kind: &str) -> String {
    format!("{} must be a `{}` type", label(path), kind)
}

/// Parses what a numeric input may hold. Whitespace is ignored and the empty
/// string is not a number.
pub fn coerce_number(text: &str) -> Option<f64> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }
    compact.parse::<f64>().ok().filter(|n| !n.is_nan())
}

/// Parses what a toggle may hold when it arrives as text.
pub fn coerce_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Validation messages arranged in a tree shaped like the value tree.
///
/// Only the first message per path is kept, and a message is not recorded
/// when something truthy already sits at its path. An array-level message is a
/// plain string at the array's path, so looking up one of its elements reads
/// a single character of that string (see [`FormErrors::get`]).
#[derive(Debug, Clone, PartialEq)]
pub struct FormErrors {
    tree: Value,
}

impl Default for FormErrors {
    fn default() -> Self {
        Self {
            tree: Value::Object(Map::new()),
        }
    }
}

impl FormErrors {
    fn insert_first(&mut self, path: &ValuePath, message: String) {
        if lookup(&self.tree, path).is_some_and(|v| is_truthy(&v)) {
            return;
        }
        if path.is_root() {
            self.tree = Value::String(message);
        } else {
            path.set(&mut self.tree, Value::String(message));
        }
    }

    /// The message recorded at `path`, if the entry there is a string.
    pub fn get(&self, path: &str) -> Option<String> {
        match lookup(&self.tree, &ValuePath::parse(path))? {
            Cow::Borrowed(Value::String(message)) => Some(message.clone()),
            Cow::Owned(Value::String(message)) => Some(message),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.tree {
            Value::Object(map) => map.is_empty(),
            _ => false,
        }
    }

    /// Every recorded message with its path, in tree order.
    pub fn messages(&self) -> Vec<(String, String)> {
        let mut out = Vec::new();
        collect_messages(&self.tree, &ValuePath::root(), &mut out);
        out
    }
}

// Walks the error tree the way a property lookup on plain JSON would: indexing
// into a string yields the character at that position.
fn lookup<'v>(tree: &'v Value, path: &ValuePath) -> Option<Cow<'v, Value>> {
    use crate::path::Segment;

    let mut current = tree;
    let mut segments = path.segments().iter();
    while let Some(segment) = segments.next() {
        current = match (segment, current) {
            (Segment::Key(key), Value::Object(map)) => map.get(key)?,
            (Segment::Index(index), Value::Object(map)) => map.get(&index.to_string())?,
            (Segment::Index(index), Value::Array(items)) => items.get(*index)?,
            (Segment::Index(index), Value::String(text)) => {
                let character = text.chars().nth(*index)?.to_string();
                // A single character only indexes into itself at 0.
                return segments
                    .all(|rest| matches!(rest, Segment::Index(0)))
                    .then(|| Cow::Owned(Value::String(character)));
            }
            _ => return None,
        };
    }
    Some(Cow::Borrowed(current))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn collect_messages(value: &Value, path: &ValuePath, out: &mut Vec<(String, String)>) {
    match value {
        Value::String(message) => out.push((path.to_string(), message.clone())),
        Value::Object(map) => {
            for (key, child) in map {
                collect_messages(child, &path.key(key), out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                collect_messages(child, &path.index(index), out);
            }
        }
        _ => {}
    }
}
