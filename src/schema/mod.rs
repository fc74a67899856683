//! The constrained JSON-Schema subset used to describe model inputs and outputs.
//!
//! Raw metadata is deserialized into [`SchemaNode`], an explicit tagged union.
//! Before any code dispatches on a node's kind it must go through the
//! [`Resolver`], which follows `$ref` and `allOf` indirections and hands back a
//! [`Concrete`] view that only has the five concrete kinds.

use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;

mod conversion;
pub mod resolver;

pub use resolver::{Concrete, Expansion, Resolver};

/// Named definitions a `$ref` can point at.
pub type Definitions = IndexMap<String, SchemaNode>;

/// One unit of a model's input or output description.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "conversion::RawSchema")]
pub enum SchemaNode {
    /// `{"$ref": "#/definitions/Name"}`
    Reference { target: String },
    /// `{"allOf": [...]}`. Only the first part is honoured.
    Composition { parts: Vec<SchemaNode> },
    Object(ObjectSchema),
    Array(ArraySchema),
    String(StringSchema),
    Number(NumberSchema),
    Boolean(BooleanSchema),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectSchema {
    pub title: Option<String>,
    pub description: Option<String>,
    /// Declaration order is display order.
    pub properties: IndexMap<String, SchemaNode>,
    pub required: IndexSet<String>,
    /// Only meaningful at the schema root.
    pub definitions: Definitions,
}

/// The `items` keyword of an array schema.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayItems {
    Single(Box<SchemaNode>),
    /// Tuple form. Only the first entry is used.
    Tuple(Vec<SchemaNode>),
}

impl ArrayItems {
    /// The schema every element of the array is treated as.
    pub fn item(&self) -> &SchemaNode {
        match self {
            ArrayItems::Single(node) => node,
            // Conversion rejects empty tuples; hand-built ones read as strings.
            ArrayItems::Tuple(nodes) => nodes.first().unwrap_or(&EMPTY_ITEM),
        }
    }
}

static EMPTY_ITEM: SchemaNode = SchemaNode::String(StringSchema {
    title: None,
    description: None,
    pattern: None,
    format: None,
    default: None,
    max_length: None,
});

#[derive(Debug, Clone, PartialEq)]
pub struct ArraySchema {
    pub title: Option<String>,
    pub description: Option<String>,
    pub items: ArrayItems,
    pub default: Option<Vec<serde_json::Value>>,
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StringSchema {
    pub title: Option<String>,
    pub description: Option<String>,
    pub pattern: Option<String>,
    pub format: Option<String>,
    pub default: Option<String>,
    pub max_length: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NumberSchema {
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<serde_json::Number>,
    pub is_integer: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BooleanSchema {
    pub title: Option<String>,
    pub description: Option<String>,
    pub default: Option<bool>,
}

impl SchemaNode {
    /// Parses a schema node from a JSON value.
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}

impl ObjectSchema {
    /// Parses a root object schema (for example a model's `input`) from a JSON value.
    ///
    /// A root that is not an object is rejected, since every walker starts from
    /// an object and looks up definitions on it.
    pub fn from_json(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        use serde::de::Error;
        match SchemaNode::from_json(value)? {
            SchemaNode::Object(object) => Ok(object),
            _ => Err(serde_json::Error::custom("root schema must be of type 'object'")),
        }
    }

    /// A resolver scoped to this object's definitions.
    pub fn resolver(&self) -> Resolver<'_> {
        Resolver::new(&self.definitions)
    }
}

impl<'de> Deserialize<'de> for ObjectSchema {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;
        match SchemaNode::deserialize(deserializer)? {
            SchemaNode::Object(object) => Ok(object),
            _ => Err(D::Error::custom("expected a schema of type 'object'")),
        }
    }
}
