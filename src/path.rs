//! Dotted / bracketed paths into JSON value trees, e.g. `series[0].output.price`.

use serde_json::{Map, Value};
use std::fmt;

/// One step of a [`ValuePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// A parsed path. The empty path addresses the root value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ValuePath {
    segments: Vec<Segment>,
}

impl ValuePath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses `a.b[0].c` style paths.
    ///
    /// Bracketed segments holding a non-negative integer become indexes, any other
    /// bracketed text is treated as a key. Empty keys (`a..b`) are skipped.
    pub fn parse(path: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = path.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if !current.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut current)));
                    }
                }
                '[' => {
                    if !current.is_empty() {
                        segments.push(Segment::Key(std::mem::take(&mut current)));
                    }
                    let mut inner = String::new();
                    for c in chars.by_ref() {
                        if c == ']' {
                            break;
                        }
                        inner.push(c);
                    }
                    let inner = inner.trim_matches(|c| c == '"' || c == '\'');
                    match inner.parse::<usize>() {
                        Ok(index) => segments.push(Segment::Index(index)),
                        Err(_) if !inner.is_empty() => segments.push(Segment::Key(inner.to_string())),
                        Err(_) => {}
                    }
                }
                _ => current.push(c),
            }
        }
        if !current.is_empty() {
            segments.push(Segment::Key(current));
        }

        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Looks up the value at this path. Missing steps yield `None`.
    pub fn get<'v>(&self, root: &'v Value) -> Option<&'v Value> {
        self.segments
            .iter()
            .try_fold(root, |value, segment| match (segment, value) {
                (Segment::Key(key), Value::Object(map)) => map.get(key),
                (Segment::Index(index), Value::Array(items)) => items.get(*index),
                (Segment::Index(index), Value::Object(map)) => map.get(&index.to_string()),
                _ => None,
            })
    }

    /// Writes `new_value` at this path, creating intermediate objects and arrays.
    ///
    /// A missing step is created as an array when the following segment is an
    /// index and as an object otherwise. Writing past the end of an array pads
    /// it with `null`. A scalar standing in the way is replaced.
    pub fn set(&self, root: &mut Value, new_value: Value) {
        let mut value = root;
        for (position, segment) in self.segments.iter().enumerate() {
            let next_is_index = matches!(self.segments.get(position + 1), Some(Segment::Index(_)));
            let is_last = position + 1 == self.segments.len();
            let placeholder = || {
                if next_is_index {
                    Value::Array(Vec::new())
                } else {
                    Value::Object(Map::new())
                }
            };

            value = match segment {
                Segment::Key(key) => {
                    if !value.is_object() {
                        *value = Value::Object(Map::new());
                    }
                    let Value::Object(map) = value else {
                        unreachable!("value was just made an object")
                    };
                    let slot = map.entry(key.clone()).or_insert(Value::Null);
                    if !is_last && !slot.is_object() && !slot.is_array() {
                        *slot = placeholder();
                    }
                    slot
                }
                Segment::Index(index) => {
                    if value.is_object() {
                        let Value::Object(map) = value else {
                            unreachable!("value was checked to be an object")
                        };
                        let slot = map.entry(index.to_string()).or_insert(Value::Null);
                        if !is_last && !slot.is_object() && !slot.is_array() {
                            *slot = placeholder();
                        }
                        slot
                    } else {
                        if !value.is_array() {
                            *value = Value::Array(Vec::new());
                        }
                        let Value::Array(items) = value else {
                            unreachable!("value was just made an array")
                        };
                        if items.len() <= *index {
                            items.resize(*index + 1, Value::Null);
                        }
                        let slot = &mut items[*index];
                        if !is_last && !slot.is_object() && !slot.is_array() {
                            *slot = placeholder();
                        }
                        slot
                    }
                }
            };
        }
        *value = new_value;
    }

    /// Appends a key segment.
    pub fn key(&self, key: &str) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Key(key.to_string()));
        Self { segments }
    }

    /// Appends an index segment.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Self { segments }
    }
}

impl fmt::Display for ValuePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if position == 0 => write!(f, "{}", key)?,
                Segment::Key(key) => write!(f, ".{}", key)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

impl From<&str> for ValuePath {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

/// Joins a parent key path and a property name the way field names are built:
/// `parent.name`, or just `name` at the root.
pub fn join_key(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", parent, name)
    }
}

/// Appends an index to a key path: `parent[index]`.
pub fn join_index(parent: &str, index: usize) -> String {
    format!("{}[{}]", parent, index)
}
