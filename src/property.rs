//! Property simplification
//!
//! A schema property is reduced to one of three descriptors:
//! - `Ref`: the property is a `$ref` to another schema
//! - `Array`: the property is an array; only `items` is inspected
//! - `Primitive`: anything else, kept as its `type` and `format`
//!
//! The reduction is one level deep on purpose. Nested object properties and
//! arrays of arrays collapse to a best-effort type name (often `"unknown"` or
//! `"array"`) instead of being modeled recursively.

use crate::reference::resolve_ref;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type name used when a definition carries no `type`
pub const UNKNOWN_TYPE: &str = "unknown";

/// Simplified, storage-friendly shape of one schema property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyDescriptor {
    /// Property value is a `$ref` to the named schema
    Ref { target: String },
    /// Array whose items are either a schema name or a primitive type name
    Array { items: String },
    /// Scalar or opaque object
    Primitive { type_name: String, format: String },
}

impl PropertyDescriptor {
    /// Short label used when rendering a schema: `→ Tag`, `array<Tag>`, `string (date-time)`
    pub fn type_label(&self) -> String {
        match self {
            PropertyDescriptor::Ref { target } => format!("→ {}", target),
            PropertyDescriptor::Array { items } => format!("array<{}>", items),
            PropertyDescriptor::Primitive { type_name, format } if format.is_empty() => {
                type_name.clone()
            }
            PropertyDescriptor::Primitive { type_name, format } => {
                format!("{} ({})", type_name, format)
            }
        }
    }

    /// Name of the schema this property points at, if any
    pub fn referenced_schema(&self) -> Option<&str> {
        match self {
            PropertyDescriptor::Ref { target } => Some(target),
            _ => None,
        }
    }
}

/// A descriptor together with the property's description.
///
/// Serializes to the flat JSON object stored in the `schemas.properties` column:
/// `{"type":"ref","ref":..}`, `{"type":"array","items":..}` or
/// `{"type":..,"format":..}`, each with a `description`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "StoredProperty", from = "StoredProperty")]
pub struct Property {
    pub descriptor: PropertyDescriptor,
    pub description: String,
}

impl Property {
    pub fn new(descriptor: PropertyDescriptor, description: impl Into<String>) -> Self {
        Self {
            descriptor,
            description: description.into(),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct StoredProperty {
    #[serde(rename = "type", default = "unknown_type")]
    type_name: String,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    items: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    #[serde(default)]
    description: String,
}

fn unknown_type() -> String {
    UNKNOWN_TYPE.to_string()
}

impl From<Property> for StoredProperty {
    fn from(property: Property) -> Self {
        let description = property.description;
        match property.descriptor {
            PropertyDescriptor::Ref { target } => StoredProperty {
                type_name: "ref".to_string(),
                target: Some(target),
                items: None,
                format: None,
                description,
            },
            PropertyDescriptor::Array { items } => StoredProperty {
                type_name: "array".to_string(),
                target: None,
                items: Some(items),
                format: None,
                description,
            },
            PropertyDescriptor::Primitive { type_name, format } => StoredProperty {
                type_name,
                target: None,
                items: None,
                format: Some(format),
                description,
            },
        }
    }
}

impl From<StoredProperty> for Property {
    fn from(stored: StoredProperty) -> Self {
        let descriptor = match (stored.type_name.as_str(), stored.target, stored.items) {
            ("ref", Some(target), _) => PropertyDescriptor::Ref { target },
            ("array", _, Some(items)) => PropertyDescriptor::Array { items },
            _ => PropertyDescriptor::Primitive {
                type_name: stored.type_name,
                format: stored.format.unwrap_or_default(),
            },
        };
        Property::new(descriptor, stored.description)
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Simplify one raw OpenAPI property definition.
///
/// Checked in order: `$ref`, then `type == "array"`, then everything else.
pub fn simplify(definition: &Value) -> Property {
    let description = str_field(definition, "description").unwrap_or_default();

    if let Some(reference) = str_field(definition, "$ref") {
        let descriptor = PropertyDescriptor::Ref {
            target: resolve_ref(reference).to_string(),
        };
        return Property::new(descriptor, description);
    }

    let type_name = str_field(definition, "type");
    if type_name == Some("array") {
        let items = definition.get("items").unwrap_or(&Value::Null);
        let item_name = match str_field(items, "$ref") {
            Some(reference) => resolve_ref(reference),
            None => str_field(items, "type").unwrap_or(UNKNOWN_TYPE),
        };
        let descriptor = PropertyDescriptor::Array {
            items: item_name.to_string(),
        };
        return Property::new(descriptor, description);
    }

    let descriptor = PropertyDescriptor::Primitive {
        type_name: type_name.unwrap_or(UNKNOWN_TYPE).to_string(),
        format: str_field(definition, "format").unwrap_or_default().to_string(),
    };
    Property::new(descriptor, description)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ref_property() {
        let property = simplify(&json!({"$ref": "#/components/schemas/Tag"}));
        assert_eq!(
            property.descriptor,
            PropertyDescriptor::Ref { target: "Tag".into() }
        );
        assert_eq!(property.description, "");
    }

    #[test]
    fn test_ref_wins_over_type() {
        let property = simplify(&json!({"$ref": "#/components/schemas/Tag", "type": "array"}));
        assert_eq!(property.descriptor.referenced_schema(), Some("Tag"));
    }

    #[test]
    fn test_array_of_refs() {
        let property = simplify(&json!({
            "type": "array",
            "items": {"$ref": "#/components/schemas/Tag"},
            "description": "All tags"
        }));
        assert_eq!(property.descriptor, PropertyDescriptor::Array { items: "Tag".into() });
        assert_eq!(property.description, "All tags");
    }

    #[test]
    fn test_array_of_primitives() {
        let property = simplify(&json!({"type": "array", "items": {"type": "integer"}}));
        assert_eq!(property.descriptor, PropertyDescriptor::Array { items: "integer".into() });
    }

    #[test]
    fn test_array_without_items_is_unknown() {
        let property = simplify(&json!({"type": "array"}));
        assert_eq!(property.descriptor, PropertyDescriptor::Array { items: "unknown".into() });
    }

    #[test]
    fn test_nested_array_is_flattened() {
        let property = simplify(&json!({
            "type": "array",
            "items": {"type": "array", "items": {"type": "string"}}
        }));
        assert_eq!(property.descriptor, PropertyDescriptor::Array { items: "array".into() });
    }

    #[test]
    fn test_primitive_with_format() {
        let property = simplify(&json!({"type": "string", "format": "date-time"}));
        assert_eq!(
            property.descriptor,
            PropertyDescriptor::Primitive {
                type_name: "string".into(),
                format: "date-time".into()
            }
        );
    }

    #[test]
    fn test_untyped_property_is_unknown() {
        let property = simplify(&json!({"description": "free-form"}));
        assert_eq!(
            property.descriptor,
            PropertyDescriptor::Primitive {
                type_name: "unknown".into(),
                format: String::new()
            }
        );
        assert_eq!(property.description, "free-form");
    }

    #[test]
    fn test_stored_shape() {
        let stored = serde_json::to_value(simplify(&json!({"$ref": "#/components/schemas/Tag"}))).unwrap();
        assert_eq!(stored, json!({"type": "ref", "ref": "Tag", "description": ""}));

        let stored = serde_json::to_value(simplify(&json!({"type": "string"}))).unwrap();
        assert_eq!(stored, json!({"type": "string", "format": "", "description": ""}));
    }

    #[test]
    fn test_decode_primitive_named_ref_without_target() {
        // A document can legitimately declare `type: ref` with no `$ref`
        let property: Property = serde_json::from_value(json!({"type": "ref", "format": ""})).unwrap();
        assert_eq!(
            property.descriptor,
            PropertyDescriptor::Primitive {
                type_name: "ref".into(),
                format: String::new()
            }
        );
    }

    #[test]
    fn test_type_labels() {
        assert_eq!(PropertyDescriptor::Ref { target: "Tag".into() }.type_label(), "→ Tag");
        assert_eq!(PropertyDescriptor::Array { items: "Tag".into() }.type_label(), "array<Tag>");
        let primitive = PropertyDescriptor::Primitive {
            type_name: "string".into(),
            format: "uuid".into(),
        };
        assert_eq!(primitive.type_label(), "string (uuid)");
    }
}
