// SPDX-License-Identifier: Apache-2.0
//! User-declared entity subtypes and payload validation.
//!
//! A [`TypeSchema`] declares a subtype of one of the closed entity kinds
//! (node or edge): a stable tag, an optional field schema, and — for edges —
//! optional binding constraints naming the vertex types an edge of this
//! subtype may connect. Records carry their subtype tag in
//! `metadata.type_tag`; dispatch is a single string comparison.
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreError;
use crate::metadata::EntityKind;
use crate::record::DataMap;

/// The type a schema field must hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    /// A JSON string.
    String,
    /// An integer (no fractional part).
    Integer,
    /// Any JSON number.
    Float,
    /// A JSON boolean.
    Boolean,
    /// A JSON array.
    List,
    /// A JSON object.
    Map,
    /// Any value at all; only presence is checked.
    Any,
}

impl FieldType {
    /// Whether a payload value satisfies this type.
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Float => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::List => value.is_array(),
            Self::Map => value.is_object(),
            Self::Any => true,
        }
    }

    /// Lowercase label for error messages.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::List => "list",
            Self::Map => "map",
            Self::Any => "any",
        }
    }
}

/// One declared payload field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Payload key the field lives under.
    pub name: String,
    /// Required value type.
    pub field_type: FieldType,
    /// Whether inserts must supply the field.
    pub required: bool,
}

impl FieldSpec {
    /// A required field.
    pub fn required(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: true,
        }
    }

    /// An optional field (validated only when present).
    pub fn optional(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            required: false,
        }
    }
}

/// A user-declared entity subtype.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSchema {
    /// Stable subtype tag stored in `metadata.type_tag`.
    pub tag: String,
    /// Which entity kind the subtype belongs to (`Node` or `Edge`).
    pub entity: EntityKind,
    /// Declared payload fields. Empty means any payload is accepted.
    pub fields: Vec<FieldSpec>,
    /// Edge-only: vertex types allowed as the source. Empty = unconstrained.
    pub source_types: Vec<String>,
    /// Edge-only: vertex types allowed as the target. Empty = unconstrained.
    pub target_types: Vec<String>,
}

impl TypeSchema {
    /// A node subtype with the given fields.
    pub fn node(tag: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            tag: tag.into(),
            entity: EntityKind::Node,
            fields,
            source_types: Vec::new(),
            target_types: Vec::new(),
        }
    }

    /// An edge subtype with the given fields.
    pub fn edge(tag: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            tag: tag.into(),
            entity: EntityKind::Edge,
            fields,
            source_types: Vec::new(),
            target_types: Vec::new(),
        }
    }

    /// Constrains the vertex types an edge of this subtype may leave from.
    pub fn from_types(mut self, types: impl Into<Vec<String>>) -> Self {
        self.source_types = types.into();
        self
    }

    /// Constrains the vertex types an edge of this subtype may point at.
    pub fn to_types(mut self, types: impl Into<Vec<String>>) -> Self {
        self.target_types = types.into();
        self
    }

    /// Validates a payload map against the declared fields.
    pub fn validate(&self, data: &DataMap) -> Result<(), StoreError> {
        for field in &self.fields {
            match data.get(&field.name) {
                None => {
                    if field.required {
                        return Err(self.violation(format!(
                            "required field `{}` is missing",
                            field.name
                        )));
                    }
                }
                Some(value) => {
                    if !field.field_type.matches(value) {
                        return Err(self.violation(format!(
                            "field `{}` is not a {}",
                            field.name,
                            field.field_type.as_str()
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Validates an edge endpoint's vertex type against the binding
    /// constraints. `node_type` is `None` when the endpoint node does not
    /// exist or carries no type — both pass, since dangling endpoints are
    /// legal and constraints are best-effort.
    pub fn validate_binding(
        &self,
        end: BindingEnd,
        node_type: Option<&str>,
    ) -> Result<(), StoreError> {
        let allowed = match end {
            BindingEnd::Source => &self.source_types,
            BindingEnd::Target => &self.target_types,
        };
        if allowed.is_empty() {
            return Ok(());
        }
        match node_type {
            None => Ok(()),
            Some(t) if allowed.iter().any(|a| a == t) => Ok(()),
            Some(t) => Err(self.violation(format!(
                "{} node type `{t}` is not allowed (expected one of {allowed:?})",
                end.as_str()
            ))),
        }
    }

    fn violation(&self, detail: String) -> StoreError {
        StoreError::SchemaViolation {
            type_tag: self.tag.clone(),
            detail,
        }
    }
}

/// Which end of an edge a binding constraint applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingEnd {
    /// The edge's source endpoint.
    Source,
    /// The edge's target endpoint.
    Target,
}

impl BindingEnd {
    fn as_str(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Target => "target",
        }
    }
}
