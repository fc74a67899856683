use super::{
    ArraySchema, BooleanSchema, Definitions, NumberSchema, ObjectSchema, SchemaNode, StringSchema,
};
use crate::error::SchemaError;
use ahash::AHashSet;

/// A schema node after `$ref` and `allOf` have been followed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Concrete<'a> {
    Object(&'a ObjectSchema),
    Array(&'a ArraySchema),
    String(&'a StringSchema),
    Number(&'a NumberSchema),
    Boolean(&'a BooleanSchema),
}

impl<'a> Concrete<'a> {
    pub fn title(&self) -> Option<&'a str> {
        match self {
            Concrete::Object(s) => s.title.as_deref(),
            Concrete::Array(s) => s.title.as_deref(),
            Concrete::String(s) => s.title.as_deref(),
            Concrete::Number(s) => s.title.as_deref(),
            Concrete::Boolean(s) => s.title.as_deref(),
        }
    }

    pub fn description(&self) -> Option<&'a str> {
        match self {
            Concrete::Object(s) => s.description.as_deref(),
            Concrete::Array(s) => s.description.as_deref(),
            Concrete::String(s) => s.description.as_deref(),
            Concrete::Number(s) => s.description.as_deref(),
            Concrete::Boolean(s) => s.description.as_deref(),
        }
    }
}

/// Resolves schema nodes against the definitions of a root object schema.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    definitions: &'a Definitions,
}

impl<'a> Resolver<'a> {
    pub fn new(definitions: &'a Definitions) -> Self {
        Self { definitions }
    }

    /// Follows references and compositions until a concrete node is reached.
    ///
    /// A reference is matched on the last `/` segment of its target. Reference
    /// chains are followed, and a chain that revisits a definition fails with
    /// [`SchemaError::ReferenceCycle`] instead of looping.
    pub fn resolve(&self, node: &'a SchemaNode) -> Result<Concrete<'a>, SchemaError> {
        self.resolve_followed(node).map(|(concrete, _)| concrete)
    }

    /// Like [`Resolver::resolve`], also returning the definitions followed on
    /// the way in order, each as its name and the reference target that led to it.
    pub fn resolve_followed(
        &self,
        node: &'a SchemaNode,
    ) -> Result<(Concrete<'a>, Vec<(&'a str, &'a str)>), SchemaError> {
        let mut followed = Vec::new();
        let concrete = self.resolve_recursive(node, &mut followed)?;
        Ok((concrete, followed))
    }

    fn resolve_recursive(
        &self,
        node: &'a SchemaNode,
        followed: &mut Vec<(&'a str, &'a str)>,
    ) -> Result<Concrete<'a>, SchemaError> {
        match node {
            SchemaNode::Reference { target } => {
                let name = target.rsplit('/').next().unwrap_or(target);
                let (key, definition) = self.definitions.get_key_value(name).ok_or_else(|| {
                    SchemaError::InvalidReference {
                        target: target.clone(),
                    }
                })?;
                if followed.iter().any(|(seen, _)| *seen == key.as_str()) {
                    return Err(SchemaError::ReferenceCycle {
                        target: target.clone(),
                    });
                }
                followed.push((key.as_str(), target.as_str()));
                self.resolve_recursive(definition, followed)
            }
            SchemaNode::Composition { parts } => match parts.first() {
                Some(first) => self.resolve_recursive(first, followed),
                // Only reachable for nodes built by hand; conversion rejects empty `allOf`.
                None => Ok(Concrete::String(empty_string_schema())),
            },
            SchemaNode::Object(s) => Ok(Concrete::Object(s)),
            SchemaNode::Array(s) => Ok(Concrete::Array(s)),
            SchemaNode::String(s) => Ok(Concrete::String(s)),
            SchemaNode::Number(s) => Ok(Concrete::Number(s)),
            SchemaNode::Boolean(s) => Ok(Concrete::Boolean(s)),
        }
    }
}

/// The definitions a recursive walk over a schema is currently inside of.
///
/// Walks that expand every property and item eagerly would never finish on a
/// definition that contains itself, so re-entering a definition that is still
/// being expanded fails with [`SchemaError::ReferenceCycle`].
#[derive(Debug, Default)]
pub struct Expansion<'a> {
    active: AHashSet<&'a str>,
    stack: Vec<&'a str>,
}

impl<'a> Expansion<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves `node` and enters every definition it passes through.
    ///
    /// The returned mark is handed back to [`Expansion::leave`] once the
    /// children of the node have been walked.
    pub fn enter(
        &mut self,
        resolver: &Resolver<'a>,
        node: &'a SchemaNode,
    ) -> Result<(Concrete<'a>, usize), SchemaError> {
        let (concrete, followed) = resolver.resolve_followed(node)?;
        let mark = self.stack.len();
        for (name, target) in followed {
            if !self.active.insert(name) {
                self.leave(mark);
                return Err(SchemaError::ReferenceCycle {
                    target: target.to_string(),
                });
            }
            self.stack.push(name);
        }
        Ok((concrete, mark))
    }

    pub fn leave(&mut self, mark: usize) {
        for name in self.stack.drain(mark..) {
            self.active.remove(name);
        }
    }
}

fn empty_string_schema() -> &'static StringSchema {
    static EMPTY: StringSchema = StringSchema {
        title: None,
        description: None,
        pattern: None,
        format: None,
        default: None,
        max_length: None,
    };
    &EMPTY
}
