use super::{
    ArrayItems, ArraySchema, BooleanSchema, Definitions, NumberSchema, ObjectSchema, SchemaNode,
    StringSchema,
};
use crate::error::SchemaConversionError;
use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;
use serde_json::Value;

// Mirrors the metadata exactly as the gateway publishes it. Every keyword is
// optional; which ones matter is decided while converting into `SchemaNode`.
#[derive(Deserialize, Debug)]
pub(super) struct RawSchema {
    #[serde(rename = "$ref")]
    reference: Option<String>,
    #[serde(rename = "allOf")]
    all_of: Option<Vec<RawSchema>>,
    #[serde(rename = "type")]
    kind: Option<Value>,
    title: Option<String>,
    description: Option<String>,
    properties: Option<IndexMap<String, RawSchema>>,
    required: Option<IndexSet<String>>,
    definitions: Option<IndexMap<String, RawSchema>>,
    items: Option<RawItems>,
    default: Option<Value>,
    #[serde(rename = "minItems")]
    min_items: Option<u64>,
    #[serde(rename = "maxItems")]
    max_items: Option<u64>,
    pattern: Option<String>,
    format: Option<String>,
    #[serde(rename = "maxLength")]
    max_length: Option<u64>,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum RawItems {
    Tuple(Vec<RawSchema>),
    Single(Box<RawSchema>),
}

impl TryFrom<RawSchema> for SchemaNode {
    type Error = SchemaConversionError;

    fn try_from(raw: RawSchema) -> Result<Self, Self::Error> {
        if let Some(target) = raw.reference {
            return Ok(SchemaNode::Reference { target });
        }

        if let Some(parts) = raw.all_of {
            if parts.is_empty() {
                return Err(SchemaConversionError::EmptyComposition);
            }
            let parts = parts
                .into_iter()
                .map(SchemaNode::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(SchemaNode::Composition { parts });
        }

        let kind = raw.kind.as_ref().and_then(Value::as_str).unwrap_or_default();
        let node = match kind {
            "object" => SchemaNode::Object(ObjectSchema {
                title: raw.title,
                description: raw.description,
                properties: convert_map(raw.properties)?,
                required: raw.required.unwrap_or_default(),
                definitions: convert_map(raw.definitions)?,
            }),
            "array" => {
                let items = match raw.items {
                    Some(RawItems::Single(item)) => {
                        ArrayItems::Single(Box::new(SchemaNode::try_from(*item)?))
                    }
                    Some(RawItems::Tuple(items)) => {
                        if items.is_empty() {
                            return Err(SchemaConversionError::EmptyTuple);
                        }
                        ArrayItems::Tuple(
                            items
                                .into_iter()
                                .map(SchemaNode::try_from)
                                .collect::<Result<Vec<_>, _>>()?,
                        )
                    }
                    // An untyped item falls into the string branch like any other untyped node.
                    None => ArrayItems::Single(Box::new(SchemaNode::String(StringSchema::default()))),
                };
                SchemaNode::Array(ArraySchema {
                    title: raw.title,
                    description: raw.description,
                    items,
                    default: match raw.default {
                        Some(Value::Array(values)) => Some(values),
                        _ => None,
                    },
                    min_items: raw.min_items,
                    max_items: raw.max_items,
                })
            }
            "integer" | "number" => SchemaNode::Number(NumberSchema {
                title: raw.title,
                description: raw.description,
                default: match raw.default {
                    Some(Value::Number(n)) => Some(n),
                    _ => None,
                },
                is_integer: kind == "integer",
            }),
            "boolean" => SchemaNode::Boolean(BooleanSchema {
                title: raw.title,
                description: raw.description,
                default: raw.default.as_ref().and_then(Value::as_bool),
            }),
            _ => SchemaNode::String(StringSchema {
                title: raw.title,
                description: raw.description,
                pattern: raw.pattern,
                format: raw.format,
                default: match raw.default {
                    Some(Value::String(s)) => Some(s),
                    _ => None,
                },
                max_length: raw.max_length,
            }),
        };
        Ok(node)
    }
}

fn convert_map(
    raw: Option<IndexMap<String, RawSchema>>,
) -> Result<Definitions, SchemaConversionError> {
    raw.unwrap_or_default()
        .into_iter()
        .map(|(name, schema)| Ok((name, SchemaNode::try_from(schema)?)))
        .collect()
}
