use super::initial::initial_value;
use super::validation::{FormErrors, Validator, build_validator};
use crate::error::SchemaError;
use crate::path::ValuePath;
use crate::schema::{Concrete, ObjectSchema, SchemaNode};
use ahash::AHashSet;
use serde_json::Value;
use tracing::debug;

/// The live, user-editable state of one model's input form.
///
/// Every edit is written into the value tree immediately; there is no
/// separate "apply" step.
#[derive(Debug, Clone)]
pub struct FormState {
    /// Always an object node.
    root: SchemaNode,
    validator: Validator,
    values: Value,
    touched: AHashSet<String>,
    submit_attempted: bool,
}

/// An edit to an array field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayAction {
    /// Append one default item (offered when the array is empty).
    Push,
    /// Insert one default item before `index`.
    InsertBefore(usize),
    /// Delete exactly the item at `index`.
    Remove(usize),
}

impl FormState {
    /// Builds the form for an input schema: default values plus its validator.
    pub fn new(schema: ObjectSchema) -> Result<Self, SchemaError> {
        let root = SchemaNode::Object(schema);
        let resolver = root_object(&root).resolver();
        let values = initial_value(&resolver, &root)?;
        let validator = build_validator(&resolver, &root)?;

        Ok(Self {
            root,
            validator,
            values,
            touched: AHashSet::new(),
            submit_attempted: false,
        })
    }

    pub fn schema(&self) -> &ObjectSchema {
        root_object(&self.root)
    }

    /// The root schema as a node, ready to hand to the field renderer.
    pub fn root(&self) -> &SchemaNode {
        &self.root
    }

    pub fn values(&self) -> &Value {
        &self.values
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// The value currently stored at `key_path`.
    pub fn value(&self, key_path: &str) -> Option<&Value> {
        ValuePath::parse(key_path).get(&self.values)
    }

    /// Writes a field value and marks the field as interacted with.
    pub fn set_value(&mut self, key_path: &str, value: Value) {
        let path = ValuePath::parse(key_path);
        if path.is_root() {
            self.values = value;
        } else {
            path.set(&mut self.values, value);
        }
        self.touch(key_path);
    }

    /// Flips a boolean field. A missing or non-boolean value counts as `false`.
    pub fn toggle(&mut self, key_path: &str) {
        let current = self.value(key_path).and_then(Value::as_bool).unwrap_or(false);
        self.set_value(key_path, Value::Bool(!current));
    }

    /// Marks a field as interacted with, so its validation message may show.
    pub fn touch(&mut self, key_path: &str) {
        self.touched.insert(key_path.to_string());
    }

    pub fn is_touched(&self, key_path: &str) -> bool {
        self.submit_attempted || self.touched.contains(key_path)
    }

    /// Applies an action to the array at `key_path`. Item defaults come from the
    /// array's item schema. Out-of-range indexes are clamped for inserts and
    /// ignored for removals.
    pub fn edit_array(&mut self, key_path: &str, action: ArrayAction) -> Result<(), SchemaError> {
        let path = ValuePath::parse(key_path);
        let mut items = match path.get(&self.values) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };

        match action {
            ArrayAction::Push => items.push(self.default_item(key_path)?),
            ArrayAction::InsertBefore(index) => {
                let item = self.default_item(key_path)?;
                items.insert(index.min(items.len()), item);
            }
            ArrayAction::Remove(index) => {
                if index < items.len() {
                    items.remove(index);
                }
            }
        }
        debug!(path = key_path, ?action, len = items.len(), "array edited");

        if path.is_root() {
            self.values = Value::Array(items);
        } else {
            path.set(&mut self.values, Value::Array(items));
        }
        self.touch(key_path);
        Ok(())
    }

    /// Runs the validator over the current values.
    pub fn errors(&self) -> FormErrors {
        self.validator.validate(&self.values)
    }

    /// Marks the form as submitted and returns a snapshot of the values when
    /// they pass validation, or the collected errors otherwise.
    pub fn submit(&mut self) -> Result<Value, FormErrors> {
        self.submit_attempted = true;
        let errors = self.errors();
        if errors.is_empty() {
            Ok(self.values.clone())
        } else {
            Err(errors)
        }
    }

    // Walks the schema along `key_path` to find the array's item schema.
    fn default_item(&self, key_path: &str) -> Result<Value, SchemaError> {
        use crate::path::Segment;

        let resolver = self.schema().resolver();
        let mut node = &self.root;
        for segment in ValuePath::parse(key_path).segments() {
            let next = match (segment, resolver.resolve(node)?) {
                (Segment::Key(key), Concrete::Object(object)) => object.properties.get(key),
                (Segment::Index(_), Concrete::Array(array)) => Some(array.items.item()),
                _ => None,
            };
            match next {
                Some(found) => node = found,
                None => return Ok(Value::Null),
            }
        }

        match resolver.resolve(node)? {
            Concrete::Array(array) => initial_value(&resolver, array.items.item()),
            _ => Ok(Value::Null),
        }
    }
}

fn root_object(root: &SchemaNode) -> &ObjectSchema {
    match root {
        SchemaNode::Object(object) => object,
        _ => unreachable!("form roots are always object schemas"),
    }
}
