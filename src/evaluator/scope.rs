use crate::ast::Number;
use crate::output::ChartKey;
use crate::path::{Segment, ValuePath};
use indexmap::IndexMap;
use serde_json::Value;

/// The name the selected y-axis value is bound to.
pub const SELECTED_VALUE: &str = "val";

/// A value bound in an evaluation scope.
#[derive(Debug, Clone, PartialEq)]
pub enum ScopeValue {
    Number(Number),
    List(Vec<ScopeValue>),
    Record(IndexMap<String, ScopeValue>),
    /// A hole left when a list is padded up to a written index.
    Missing,
}

impl ScopeValue {
    pub(crate) fn describe(&self) -> &'static str {
        match self {
            ScopeValue::Number(_) => "a number",
            ScopeValue::List(_) => "a list",
            ScopeValue::Record(_) => "an object",
            ScopeValue::Missing => "an undefined value",
        }
    }
}

/// Variables visible to a transform expression.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    variables: IndexMap<String, ScopeValue>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ScopeValue> {
        self.variables.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ScopeValue) {
        self.variables.insert(name.into(), value);
    }

    /// Writes `value` at a dotted/bracketed path, creating intermediate
    /// objects and lists as the next segment requires.
    pub fn set(&mut self, path: &str, value: Number) {
        let path = ValuePath::parse(path);
        let Some((first, rest)) = path.segments().split_first() else {
            return;
        };
        let name = match first {
            Segment::Key(key) => key.clone(),
            Segment::Index(index) => index.to_string(),
        };
        let slot = self
            .variables
            .entry(name)
            .or_insert_with(|| placeholder(rest.first()));
        write_at(slot, rest, value);
    }

    /// The scope a transform is checked against: `val` and every key's
    /// relative path set to zero.
    pub fn trial(keys: &[ChartKey]) -> Self {
        let mut scope = Self::new();
        scope.insert(SELECTED_VALUE, ScopeValue::Number(Number::zero()));
        for key in keys {
            scope.set(&key.relative_path, Number::zero());
        }
        scope
    }

    /// The scope for one series element: every key's value read from the
    /// element's `output` (missing values read as zero), and `val` bound to
    /// the selected key's value.
    pub fn from_series_output(keys: &[ChartKey], output: &Value, selected: Option<&ChartKey>) -> Self {
        let mut scope = Self::new();
        let selected_value = selected
            .map(|key| read_number(output, &key.relative_path))
            .unwrap_or_else(Number::zero);
        scope.insert(SELECTED_VALUE, ScopeValue::Number(selected_value));
        for key in keys {
            scope.set(&key.relative_path, read_number(output, &key.relative_path));
        }
        scope
    }
}

/// Reads a numeric value out of an output object. Missing or null values read
/// as zero; values that cannot be read as numbers are NaN.
pub fn read_number(output: &Value, relative_path: &str) -> Number {
    match ValuePath::parse(relative_path).get(output) {
        None | Some(Value::Null) => Number::zero(),
        Some(Value::Number(n)) => Number::parse(&n.to_string()).unwrap_or(Number::NaN),
        Some(Value::String(s)) if s.trim().is_empty() => Number::zero(),
        Some(Value::String(s)) => Number::parse(s).unwrap_or(Number::NaN),
        Some(Value::Bool(true)) => Number::from_f64(1.0),
        Some(Value::Bool(false)) => Number::zero(),
        Some(_) => Number::NaN,
    }
}

fn placeholder(next: Option<&Segment>) -> ScopeValue {
    match next {
        Some(Segment::Index(_)) => ScopeValue::List(Vec::new()),
        Some(Segment::Key(_)) => ScopeValue::Record(IndexMap::new()),
        None => ScopeValue::Missing,
    }
}

fn write_at(slot: &mut ScopeValue, segments: &[Segment], value: Number) {
    let Some((segment, rest)) = segments.split_first() else {
        *slot = ScopeValue::Number(value);
        return;
    };
    match segment {
        Segment::Key(key) => {
            if !matches!(slot, ScopeValue::Record(_)) {
                *slot = ScopeValue::Record(IndexMap::new());
            }
            if let ScopeValue::Record(fields) = slot {
                let child = fields
                    .entry(key.clone())
                    .or_insert_with(|| placeholder(rest.first()));
                write_at(child, rest, value);
            }
        }
        Segment::Index(index) => {
            if !matches!(slot, ScopeValue::List(_)) {
                *slot = ScopeValue::List(Vec::new());
            }
            if let ScopeValue::List(items) = slot {
                if items.len() <= *index {
                    items.resize(*index + 1, ScopeValue::Missing);
                }
                if matches!(items[*index], ScopeValue::Missing) {
                    items[*index] = placeholder(rest.first());
                }
                write_at(&mut items[*index], rest, value);
            }
        }
    }
}
