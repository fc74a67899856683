use crate::error::SchemaError;
use crate::path::{ValuePath, join_index, join_key};
use crate::schema::{Concrete, Expansion, ObjectSchema, Resolver, SchemaNode};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Where one series element's output lives in a run result.
pub const SERIES_OUTPUT_PATH: &str = "series[0].output";

// `SERIES_OUTPUT_PATH` plus the following dot.
const SERIES_PREFIX_LEN: usize = 17;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NumericKind {
    Integer,
    Number,
}

/// A numeric leaf of a series element's output, usable as a chart y-axis and
/// as a variable in transform expressions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartKey {
    /// Path into the full result, e.g. `series[0].output.price`.
    pub absolute_path: String,
    /// Path inside one element's `output`, e.g. `price`.
    pub relative_path: String,
    pub base_path: String,
    /// `relative_path` with list indexes counted from 1, as written in expressions.
    pub math_path: String,
    #[serde(rename = "type")]
    pub kind: NumericKind,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl ChartKey {
    /// The text a key is listed under: its title, or its math path.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.math_path)
    }

    /// Case-insensitive match of a trimmed search query against the label or
    /// description.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.label().to_lowercase().contains(&query)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&query))
    }
}

/// Enumerates the chart keys of a run result.
///
/// Lists under `series[0].output` are enumerated element by element using
/// their actual length in `result`; every other list is descended once,
/// through its first element, purely to reach nested series.
pub fn discover(output_schema: &ObjectSchema, result: &Value) -> Result<Vec<ChartKey>, SchemaError> {
    let walker = KeyWalker {
        resolver: output_schema.resolver(),
        result,
    };
    let mut keys = Vec::new();
    walker.walk_object(output_schema, "", "", &mut Expansion::new(), &mut keys)?;
    debug!(count = keys.len(), "discovered chart keys");
    Ok(keys)
}

struct KeyWalker<'a> {
    resolver: Resolver<'a>,
    result: &'a Value,
}

impl<'a> KeyWalker<'a> {
    fn walk_object(
        &self,
        object: &'a ObjectSchema,
        path: &str,
        math_path: &str,
        expansion: &mut Expansion<'a>,
        keys: &mut Vec<ChartKey>,
    ) -> Result<(), SchemaError> {
        for (name, property) in &object.properties {
            self.walk(
                property,
                &join_key(path, name),
                &join_key(math_path, name),
                expansion,
                keys,
            )?;
        }
        Ok(())
    }

    fn walk(
        &self,
        node: &'a SchemaNode,
        path: &str,
        math_path: &str,
        expansion: &mut Expansion<'a>,
        keys: &mut Vec<ChartKey>,
    ) -> Result<(), SchemaError> {
        let in_series = path.starts_with(SERIES_OUTPUT_PATH);
        let (concrete, mark) = expansion.enter(&self.resolver, node)?;
        match concrete {
            Concrete::Object(object) => self.walk_object(object, path, math_path, expansion, keys)?,
            Concrete::Array(array) if in_series => {
                let length = match ValuePath::parse(path).get(self.result) {
                    Some(Value::Array(items)) => items.len(),
                    _ => 0,
                };
                for i in 0..length {
                    self.walk(
                        array.items.item(),
                        &join_index(path, i),
                        &join_index(math_path, i + 1),
                        expansion,
                        keys,
                    )?;
                }
            }
            Concrete::Array(array) => {
                // Outside the series prefix the math path tracks the path.
                let first = join_index(path, 0);
                self.walk(array.items.item(), &first, &first, expansion, keys)?;
            }
            concrete @ Concrete::Number(number) if in_series => keys.push(ChartKey {
                absolute_path: path.to_string(),
                relative_path: strip_series_prefix(path),
                base_path: SERIES_OUTPUT_PATH.to_string(),
                math_path: strip_series_prefix(math_path),
                kind: if number.is_integer {
                    NumericKind::Integer
                } else {
                    NumericKind::Number
                },
                title: concrete.title().map(str::to_string),
                description: concrete.description().map(str::to_string),
            }),
            Concrete::Number(_) | Concrete::String(_) | Concrete::Boolean(_) => {}
        }
        expansion.leave(mark);
        Ok(())
    }
}

fn strip_series_prefix(path: &str) -> String {
    path.chars().skip(SERIES_PREFIX_LEN).collect()
}
