use super::state::{ArrayAction, FormState};
use super::validation::FormErrors;
use crate::error::SchemaError;
use crate::path::{join_index, join_key};
use crate::schema::{Concrete, Expansion, Resolver, SchemaNode};
use serde_json::Value;
use std::fmt;

/// How a scalar input is presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Toggle,
    Numeric,
    Text,
}

/// One rendered element of an input form.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    /// The root object declares no properties.
    NoInputRequired,
    Group {
        key_path: String,
        label: String,
        description: Option<String>,
        children: Vec<Field>,
    },
    List {
        key_path: String,
        label: String,
        description: Option<String>,
        items: Vec<ListItem>,
        /// Offered only when the list is empty.
        push: Option<ArrayAction>,
        error: Option<String>,
    },
    Input {
        key_path: String,
        label: String,
        kind: InputKind,
        value: Value,
        error: Option<String>,
        help: Option<String>,
    },
}

/// One existing element of a list field together with its actions.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub index: usize,
    pub field: Field,
    pub remove: ArrayAction,
    pub insert_before: ArrayAction,
}

impl Field {
    pub fn key_path(&self) -> &str {
        match self {
            Field::NoInputRequired => "",
            Field::Group { key_path, .. }
            | Field::List { key_path, .. }
            | Field::Input { key_path, .. } => key_path,
        }
    }

    /// Finds the field rendered for `key_path`, searching depth first.
    pub fn find(&self, key_path: &str) -> Option<&Field> {
        if self.key_path() == key_path && !matches!(self, Field::NoInputRequired) {
            return Some(self);
        }
        match self {
            Field::Group { children, .. } => children.iter().find_map(|c| c.find(key_path)),
            Field::List { items, .. } => items.iter().find_map(|i| i.field.find(key_path)),
            Field::Input { .. } | Field::NoInputRequired => None,
        }
    }
}

/// Renders the editable field tree for the current state of a form.
pub fn render_form(form: &FormState) -> Result<Field, SchemaError> {
    if form.schema().properties.is_empty() {
        return Ok(Field::NoInputRequired);
    }
    let renderer = FieldRenderer {
        resolver: form.schema().resolver(),
        form,
        errors: form.errors(),
    };
    renderer.render(form.root(), "", &mut Expansion::new())
}

struct FieldRenderer<'a> {
    resolver: Resolver<'a>,
    form: &'a FormState,
    errors: FormErrors,
}

impl<'a> FieldRenderer<'a> {
    fn render(
        &self,
        node: &'a SchemaNode,
        key_path: &str,
        expansion: &mut Expansion<'a>,
    ) -> Result<Field, SchemaError> {
        let (concrete, mark) = expansion.enter(&self.resolver, node)?;
        let field = match concrete {
            Concrete::Object(object) => {
                let children = object
                    .properties
                    .iter()
                    .map(|(name, property)| self.render(property, &join_key(key_path, name), expansion))
                    .collect::<Result<Vec<_>, _>>()?;
                Field::Group {
                    key_path: key_path.to_string(),
                    label: container_label(key_path, concrete.title()),
                    description: concrete.description().map(str::to_string),
                    children,
                }
            }
            Concrete::Array(array) => {
                let count = match self.form.value(key_path) {
                    Some(Value::Array(items)) => items.len(),
                    _ => 0,
                };
                let items = (0..count)
                    .map(|index| {
                        Ok(ListItem {
                            index,
                            field: self.render(array.items.item(), &join_index(key_path, index), expansion)?,
                            remove: ArrayAction::Remove(index),
                            insert_before: ArrayAction::InsertBefore(index),
                        })
                    })
                    .collect::<Result<Vec<_>, SchemaError>>()?;
                Field::List {
                    key_path: key_path.to_string(),
                    label: container_label(key_path, concrete.title()),
                    description: concrete.description().map(str::to_string),
                    push: items.is_empty().then_some(ArrayAction::Push),
                    items,
                    error: self.errors.get(key_path),
                }
            }
            Concrete::Boolean(_) | Concrete::Number(_) | Concrete::String(_) => {
                let kind = match concrete {
                    Concrete::Boolean(_) => InputKind::Toggle,
                    Concrete::Number(_) => InputKind::Numeric,
                    _ => InputKind::Text,
                };
                Field::Input {
                    key_path: key_path.to_string(),
                    label: match concrete.title() {
                        Some(title) => format!("{}: {}", key_path, title),
                        None => key_path.to_string(),
                    },
                    kind,
                    value: self.form.value(key_path).cloned().unwrap_or(Value::Null),
                    error: self.scalar_error(key_path),
                    help: concrete.description().map(str::to_string),
                }
            }
        };
        expansion.leave(mark);
        Ok(field)
    }

    // A one-character "message" is what an element lookup reads out of an
    // array-level error string, so it is not shown.
    fn scalar_error(&self, key_path: &str) -> Option<String> {
        let error = self.errors.get(key_path)?;
        if error.chars().count() <= 1 || !self.form.is_touched(key_path) {
            return None;
        }
        Some(error)
    }
}

fn container_label(key_path: &str, title: Option<&str>) -> String {
    match title {
        Some(title) if !key_path.is_empty() => format!("{}: {}", key_path, title),
        Some(title) => title.to_string(),
        None => key_path.to_string(),
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_indented(f, 0)
    }
}

impl Field {
    fn fmt_indented(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let pad = "  ".repeat(depth);
        match self {
            Field::NoInputRequired => writeln!(f, "{}No input required", pad)?,
            Field::Group {
                label,
                description,
                children,
                ..
            } => {
                if !label.is_empty() {
                    writeln!(f, "{}{}", pad, label)?;
                }
                if let Some(description) = description {
                    writeln!(f, "{}  {}", pad, description)?;
                }
                let child_depth = if label.is_empty() { depth } else { depth + 1 };
                for child in children {
                    child.fmt_indented(f, child_depth)?;
                }
            }
            Field::List {
                label,
                description,
                items,
                error,
                ..
            } => {
                writeln!(f, "{}{} ({} items)", pad, label, items.len())?;
                if let Some(description) = description {
                    writeln!(f, "{}  {}", pad, description)?;
                }
                if items.is_empty() {
                    writeln!(f, "{}  [add]", pad)?;
                }
                for item in items {
                    item.field.fmt_indented(f, depth + 1)?;
                    writeln!(f, "{}  [remove #{}] [add before #{}]", pad, item.index, item.index)?;
                }
                if let Some(error) = error {
                    writeln!(f, "{}  ! {}", pad, error)?;
                }
            }
            Field::Input {
                label,
                kind,
                value,
                error,
                help,
                ..
            } => {
                let shown = match (kind, value) {
                    (InputKind::Toggle, Value::Bool(true)) => "on".to_string(),
                    (InputKind::Toggle, _) => "off".to_string(),
                    (_, Value::String(s)) => s.clone(),
                    (_, Value::Null) => String::new(),
                    (_, other) => other.to_string(),
                };
                writeln!(f, "{}{} = {}", pad, label, shown)?;
                if let Some(error) = error {
                    writeln!(f, "{}  ! {}", pad, error)?;
                }
                if let Some(help) = help {
                    writeln!(f, "{}  {}", pad, help)?;
                }
            }
        }
        Ok(())
    }
}
