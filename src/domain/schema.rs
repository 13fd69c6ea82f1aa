//! Request schemas: ordered, typed field declarations and the requests built from them

use std::collections::{BTreeMap, HashSet};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::types::TypeSpec;
use crate::domain::value::Value;

/// One named, typed field of a request schema.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub type_spec: TypeSpec,
    pub default: Option<Value>,
    pub required: bool,
    pub description: String,
}

impl FieldDecl {
    /// New optional field without default or description.
    pub fn new(name: impl Into<String>, type_spec: TypeSpec) -> Self {
        Self {
            name: name.into(),
            type_spec,
            default: None,
            required: false,
            description: String::new(),
        }
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The flag must be given: no default to fall back on and the field is required.
    pub fn is_mandatory(&self) -> bool {
        self.required && self.default.is_none()
    }

    /// Long flag name: word separators become hyphens.
    pub fn flag_name(&self) -> String {
        flag_name(&self.name)
    }

    /// Value used when the flag is not given and the field is not mandatory.
    ///
    /// Unset optional fields are `Null`; unset lists are empty.
    pub fn fallback(&self) -> Option<Value> {
        if let Some(default) = &self.default {
            return Some(default.clone());
        }
        match &self.type_spec {
            TypeSpec::Optional(_) => Some(Value::Null),
            TypeSpec::List(_) => Some(Value::List(Vec::new())),
            _ => None,
        }
    }
}

/// Internal field name to command-line flag name.
pub fn flag_name(field: &str) -> String {
    field.replace('_', "-")
}

/// Ordered set of uniquely named field declarations describing one request shape.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    name: String,
    fields: Vec<FieldDecl>,
}

impl Schema {
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in display order.
    pub fn fields(&self) -> &[FieldDecl] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Build a request from exactly the given field values.
    ///
    /// Missing fields take their default (or `Null`/empty for optional and
    /// list fields). Fails if a mandatory field is missing, a value does not
    /// conform to its field type, or a name is not a field of this schema.
    pub fn construct(&self, mut values: BTreeMap<String, Value>) -> DomainResult<Request> {
        let mut resolved = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = match values.remove(&field.name) {
                Some(value) => value.widen_to(&field.type_spec),
                None => field.fallback().ok_or_else(|| {
                    self.construction_err(format!("missing required field '{}'", field.name))
                })?,
            };
            if !value.conforms_to(&field.type_spec) {
                return Err(self.construction_err(format!(
                    "field '{}' expects {}, got {:?}",
                    field.name, field.type_spec, value
                )));
            }
            resolved.push((field.name.clone(), value));
        }
        if let Some(unknown) = values.keys().next() {
            return Err(self.construction_err(format!("unknown field '{unknown}'")));
        }
        Ok(Request {
            schema: self.name.clone(),
            values: resolved,
        })
    }

    /// Request with every field at its default.
    pub fn default_request(&self) -> DomainResult<Request> {
        self.construct(BTreeMap::new())
    }

    fn construction_err(&self, message: String) -> DomainError {
        DomainError::SchemaConstruction {
            schema: self.name.clone(),
            message,
        }
    }
}

/// Collects field declarations and validates them into a [`Schema`].
#[derive(Debug)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<FieldDecl>,
}

impl SchemaBuilder {
    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> DomainResult<Schema> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !is_valid_field_name(&field.name) {
                return Err(self.invalid(format!("invalid field name '{}'", field.name)));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(self.invalid(format!("duplicate field '{}'", field.name)));
            }
            if let Some(default) = &field.default {
                if !default.conforms_to(&field.type_spec) {
                    return Err(self.invalid(format!(
                        "default of '{}' does not conform to {}",
                        field.name, field.type_spec
                    )));
                }
            }
            if !field.required && field.fallback().is_none() {
                return Err(self.invalid(format!(
                    "'{}' is optional but has neither a default nor a nullable type",
                    field.name
                )));
            }
        }
        let fields = self
            .fields
            .into_iter()
            .map(|mut field| {
                field.default = field.default.take().map(|d| d.widen_to(&field.type_spec));
                field
            })
            .collect();
        Ok(Schema {
            name: self.name,
            fields,
        })
    }

    fn invalid(&self, message: String) -> DomainError {
        DomainError::InvalidSchema {
            schema: self.name.clone(),
            message,
        }
    }
}

/// `[a-z][a-z0-9_]*`
fn is_valid_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// A schema-conformant set of field values for one dispatch.
///
/// Immutable once constructed; values are kept in schema field order.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    schema: String,
    values: Vec<(String, Value)>,
}

impl Request {
    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// All fields in schema order, including nulls.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }
}
