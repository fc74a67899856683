use crate::error::SchemaError;
use crate::schema::{Concrete, Expansion, Resolver, SchemaNode};
use serde_json::{Map, Value};

/// Builds the default-populated value tree for a schema node.
///
/// Every declared object property receives an entry. Arrays always start
/// empty; items are only added through explicit array actions.
pub fn initial_value<'a>(resolver: &Resolver<'a>, node: &'a SchemaNode) -> Result<Value, SchemaError> {
    fill(resolver, node, &mut Expansion::new())
}

fn fill<'a>(
    resolver: &Resolver<'a>,
    node: &'a SchemaNode,
    expansion: &mut Expansion<'a>,
) -> Result<Value, SchemaError> {
    let (concrete, mark) = expansion.enter(resolver, node)?;
    let value = match concrete {
        Concrete::Object(object) => {
            let mut record = Map::with_capacity(object.properties.len());
            for (name, property) in &object.properties {
                record.insert(name.clone(), fill(resolver, property, expansion)?);
            }
            Value::Object(record)
        }
        Concrete::Array(_) => Value::Array(Vec::new()),
        Concrete::Boolean(boolean) => Value::Bool(boolean.default.unwrap_or(false)),
        Concrete::Number(number) => number
            .default
            .clone()
            .map(Value::Number)
            .unwrap_or_else(|| Value::from(0)),
        Concrete::String(string) => Value::String(string.default.clone().unwrap_or_default()),
    };
    expansion.leave(mark);
    Ok(value)
}
