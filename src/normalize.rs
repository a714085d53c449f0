//! Document normalizer
//!
//! Walks one OpenAPI document and flattens it into the entities of a single
//! version:
//! - `info` / `servers` → `NewVersion`
//! - `components.schemas` → `NewSchema` (properties simplified one level deep)
//! - `paths` × recognized verbs → `NewEndpoint`, each carrying its parameters
//!   plus one synthetic `requestBody` parameter per `$ref`'d media type
//!
//! Missing optional fields fall back to defaults. Only a document that is not
//! a JSON object is rejected.

use indexmap::IndexMap;
use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::{HttpMethod, NewEndpoint, NewParameter, NewSchema, NewVersion, ParamLocation};
use crate::property::simplify;
use crate::reference::resolve_ref;
use crate::{Error, Result};

pub const DEFAULT_TITLE: &str = "Unknown API";
pub const DEFAULT_VERSION: &str = "1.0.0";
pub const DEFAULT_SCHEMA_TYPE: &str = "object";
pub const DEFAULT_PARAM_TYPE: &str = "string";
pub const REQUEST_BODY_PARAM: &str = "requestBody";

/// All entities derived from one document, ready for a full replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedBatch {
    pub version: NewVersion,
    pub schemas: Vec<NewSchema>,
    pub endpoints: Vec<NewEndpoint>,
}

impl NormalizedBatch {
    pub fn endpoint_count(&self) -> usize {
        self.endpoints.len()
    }

    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    pub fn parameter_count(&self) -> usize {
        self.endpoints.iter().map(|e| e.parameters.len()).sum()
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn string_or(value: &Value, key: &str, default: &str) -> String {
    str_field(value, key).unwrap_or(default).to_string()
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Normalize a whole document.
///
/// The effective version is `version_override` when given (and non-empty),
/// else `info.version`, else `"1.0.0"`.
pub fn normalize(doc: &Value, version_override: Option<&str>) -> Result<NormalizedBatch> {
    let root = doc.as_object().ok_or_else(|| {
        Error::Normalize(format!(
            "expected a JSON object at the top level, found {}",
            json_kind(doc)
        ))
    })?;

    let version = extract_version(root, version_override);
    let schemas = extract_schemas(root);
    let endpoints = extract_endpoints(root);

    tracing::debug!(
        "Normalized '{}' v{}: {} endpoints, {} schemas",
        version.title,
        version.version,
        endpoints.len(),
        schemas.len()
    );

    Ok(NormalizedBatch {
        version,
        schemas,
        endpoints,
    })
}

fn extract_version(root: &Map<String, Value>, version_override: Option<&str>) -> NewVersion {
    let info = root.get("info").unwrap_or(&Value::Null);

    let version = match version_override.filter(|v| !v.is_empty()) {
        Some(v) => v.to_string(),
        None => match info.get("version") {
            Some(Value::String(v)) => v.clone(),
            // Some generators emit `version: 2.0` unquoted
            Some(Value::Number(n)) => n.to_string(),
            _ => DEFAULT_VERSION.to_string(),
        },
    };

    let base_url = root
        .get("servers")
        .and_then(Value::as_array)
        .and_then(|servers| servers.first())
        .and_then(|server| str_field(server, "url"))
        .unwrap_or_default()
        .to_string();

    NewVersion {
        version,
        title: string_or(info, "title", DEFAULT_TITLE),
        description: string_or(info, "description", ""),
        base_url,
    }
}

fn extract_schemas(root: &Map<String, Value>) -> Vec<NewSchema> {
    let Some(schemas) = root
        .get("components")
        .and_then(|c| c.get("schemas"))
        .and_then(Value::as_object)
    else {
        return Vec::new();
    };

    schemas
        .iter()
        .map(|(name, definition)| build_schema(name, definition))
        .collect()
}

fn build_schema(name: &str, definition: &Value) -> NewSchema {
    let properties: IndexMap<_, _> = definition
        .get("properties")
        .and_then(Value::as_object)
        .map(|props| {
            props
                .iter()
                .map(|(prop_name, prop_def)| (prop_name.clone(), simplify(prop_def)))
                .collect()
        })
        .unwrap_or_default();

    NewSchema {
        name: name.to_string(),
        type_name: string_or(definition, "type", DEFAULT_SCHEMA_TYPE),
        properties,
        required_fields: string_list(definition, "required"),
        description: string_or(definition, "description", ""),
    }
}

fn extract_endpoints(root: &Map<String, Value>) -> Vec<NewEndpoint> {
    let Some(paths) = root.get("paths").and_then(Value::as_object) else {
        return Vec::new();
    };

    let mut endpoints: Vec<NewEndpoint> = Vec::new();
    let mut positions: HashMap<(String, HttpMethod), usize> = HashMap::new();

    for (path, item) in paths {
        let Some(item) = item.as_object() else {
            tracing::warn!("Skipping path '{}': path item is {}", path, json_kind(item));
            continue;
        };

        for (key, operation) in item {
            // Path-level keys such as `parameters`, `summary` or `servers` are not operations
            let Ok(method) = key.parse::<HttpMethod>() else {
                continue;
            };
            if !operation.is_object() {
                tracing::warn!(
                    "Skipping {} {}: operation is {}",
                    method,
                    path,
                    json_kind(operation)
                );
                continue;
            }

            let endpoint = build_endpoint(path, method, operation);
            match positions.get(&(path.clone(), method)) {
                Some(&index) => {
                    tracing::warn!("Duplicate operation {} {}; keeping the later one", method, path);
                    endpoints[index] = endpoint;
                }
                None => {
                    positions.insert((path.clone(), method), endpoints.len());
                    endpoints.push(endpoint);
                }
            }
        }
    }

    endpoints
}

fn build_endpoint(path: &str, method: HttpMethod, operation: &Value) -> NewEndpoint {
    let mut parameters: Vec<NewParameter> = operation
        .get("parameters")
        .and_then(Value::as_array)
        .map(|params| {
            params
                .iter()
                .filter(|param| {
                    let keep = param.is_object();
                    if !keep {
                        tracing::warn!("Skipping parameter of {} {}: not an object", method, path);
                    }
                    keep
                })
                .map(build_parameter)
                .collect()
        })
        .unwrap_or_default();

    if let Some(body) = operation.get("requestBody").filter(|b| b.is_object()) {
        parameters.extend(build_body_parameters(body));
    }

    NewEndpoint {
        path: path.to_string(),
        method,
        summary: string_or(operation, "summary", ""),
        description: string_or(operation, "description", ""),
        operation_id: string_or(operation, "operationId", ""),
        tags: string_list(operation, "tags"),
        deprecated: operation
            .get("deprecated")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        parameters,
    }
}

fn build_parameter(param: &Value) -> NewParameter {
    let schema = param.get("schema").unwrap_or(&Value::Null);

    NewParameter {
        name: string_or(param, "name", ""),
        location: ParamLocation::from(str_field(param, "in").unwrap_or_default()),
        required: param.get("required").and_then(Value::as_bool).unwrap_or(false),
        type_name: string_or(schema, "type", DEFAULT_PARAM_TYPE),
        description: string_or(param, "description", ""),
        schema_ref: str_field(schema, "$ref").map(|r| resolve_ref(r).to_string()),
    }
}

/// One synthetic parameter per media type whose schema is a `$ref`.
///
/// Inline body schemas are not recorded.
fn build_body_parameters(body: &Value) -> Vec<NewParameter> {
    let Some(content) = body.get("content").and_then(Value::as_object) else {
        return Vec::new();
    };

    let required = body.get("required").and_then(Value::as_bool).unwrap_or(false);
    let description = string_or(body, "description", "");

    content
        .iter()
        .filter_map(|(media_type, media)| {
            let reference = media
                .get("schema")
                .and_then(|schema| str_field(schema, "$ref"))?;
            Some(NewParameter {
                name: REQUEST_BODY_PARAM.to_string(),
                location: ParamLocation::Body,
                required,
                type_name: media_type.clone(),
                description: description.clone(),
                schema_ref: Some(resolve_ref(reference).to_string()),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyDescriptor;
    use serde_json::json;

    fn petstore() -> Value {
        json!({
            "openapi": "3.0.1",
            "info": {"title": "Petstore", "version": "2.0"},
            "paths": {
                "/pets": {
                    "get": {
                        "tags": ["pets"],
                        "parameters": [
                            {"name": "limit", "in": "query", "schema": {"type": "integer"}}
                        ]
                    }
                }
            },
            "components": {
                "schemas": {
                    "Pet": {
                        "type": "object",
                        "properties": {"name": {"type": "string"}},
                        "required": ["name"]
                    }
                }
            }
        })
    }

    #[test]
    fn test_petstore_scenario() {
        let batch = normalize(&petstore(), None).unwrap();

        assert_eq!(batch.version.version, "2.0");
        assert_eq!(batch.version.title, "Petstore");
        assert_eq!(batch.endpoint_count(), 1);
        assert_eq!(batch.schema_count(), 1);

        let endpoint = &batch.endpoints[0];
        assert_eq!(endpoint.path, "/pets");
        assert_eq!(endpoint.method, HttpMethod::Get);
        assert_eq!(endpoint.tags, vec!["pets"]);
        assert!(!endpoint.deprecated);

        let param = &endpoint.parameters[0];
        assert_eq!(param.name, "limit");
        assert_eq!(param.location, ParamLocation::Query);
        assert!(!param.required);
        assert_eq!(param.type_name, "integer");
        assert_eq!(param.schema_ref, None);

        let schema = &batch.schemas[0];
        assert_eq!(schema.name, "Pet");
        assert_eq!(schema.required_fields, vec!["name"]);
        assert_eq!(
            schema.properties["name"].descriptor,
            PropertyDescriptor::Primitive {
                type_name: "string".into(),
                format: String::new()
            }
        );
    }

    #[test]
    fn test_version_resolution() {
        let batch = normalize(&petstore(), Some("custom")).unwrap();
        assert_eq!(batch.version.version, "custom");

        let batch = normalize(&petstore(), Some("")).unwrap();
        assert_eq!(batch.version.version, "2.0");

        let batch = normalize(&json!({}), None).unwrap();
        assert_eq!(batch.version.version, DEFAULT_VERSION);
        assert_eq!(batch.version.title, DEFAULT_TITLE);
        assert_eq!(batch.version.description, "");

        let batch = normalize(&json!({"info": {"version": 3}}), None).unwrap();
        assert_eq!(batch.version.version, "3");
    }

    #[test]
    fn test_base_url_from_first_server() {
        let doc = json!({
            "servers": [{"url": "https://api.example.com/v1"}, {"url": "https://backup.example.com"}]
        });
        let batch = normalize(&doc, None).unwrap();
        assert_eq!(batch.version.base_url, "https://api.example.com/v1");

        let batch = normalize(&json!({"servers": []}), None).unwrap();
        assert_eq!(batch.version.base_url, "");
    }

    #[test]
    fn test_empty_document_is_tolerated() {
        let batch = normalize(&json!({"openapi": "3.0.0"}), None).unwrap();
        assert!(batch.endpoints.is_empty());
        assert!(batch.schemas.is_empty());
    }

    #[test]
    fn test_non_object_document_is_rejected() {
        for doc in [json!([1, 2]), json!("swagger"), json!(null), json!(42)] {
            let err = normalize(&doc, None).unwrap_err();
            assert!(matches!(err, Error::Normalize(_)), "unexpected error for {doc}");
        }
    }

    #[test]
    fn test_only_recognized_verbs_become_endpoints() {
        let doc = json!({
            "paths": {
                "/items/{id}": {
                    "parameters": [{"name": "id", "in": "path"}],
                    "summary": "Item",
                    "GET": {"operationId": "getItem"},
                    "delete": {},
                    "trace": {},
                    "x-internal": {}
                }
            }
        });
        let batch = normalize(&doc, None).unwrap();
        let methods: Vec<_> = batch.endpoints.iter().map(|e| e.method).collect();
        assert_eq!(methods, vec![HttpMethod::Get, HttpMethod::Delete]);
        assert_eq!(batch.endpoints[0].operation_id, "getItem");
        // Path-level parameters are not copied onto operations
        assert!(batch.endpoints[0].parameters.is_empty());
    }

    #[test]
    fn test_duplicate_verbs_collapse() {
        let doc = json!({
            "paths": {
                "/pets": {
                    "get": {"summary": "first"},
                    "GET": {"summary": "second"}
                }
            }
        });
        let batch = normalize(&doc, None).unwrap();
        assert_eq!(batch.endpoint_count(), 1);
        assert_eq!(batch.endpoints[0].summary, "second");
    }

    #[test]
    fn test_operation_defaults() {
        let doc = json!({"paths": {"/ping": {"head": {}}}});
        let endpoint = &normalize(&doc, None).unwrap().endpoints[0];
        assert_eq!(endpoint.summary, "");
        assert_eq!(endpoint.description, "");
        assert_eq!(endpoint.operation_id, "");
        assert!(endpoint.tags.is_empty());
        assert!(!endpoint.deprecated);
    }

    #[test]
    fn test_parameter_defaults_and_refs() {
        let doc = json!({
            "paths": {
                "/search": {
                    "get": {
                        "deprecated": true,
                        "parameters": [
                            {"name": "q", "in": "query", "required": true},
                            {"name": "filter", "in": "query", "schema": {"$ref": "#/components/schemas/Filter"}},
                            {"name": "file", "in": "formData", "schema": {"type": "file"}},
                            "garbage"
                        ]
                    }
                }
            }
        });
        let endpoint = &normalize(&doc, None).unwrap().endpoints[0];
        assert!(endpoint.deprecated);
        assert_eq!(endpoint.parameters.len(), 3);

        let q = &endpoint.parameters[0];
        assert!(q.required);
        assert_eq!(q.type_name, DEFAULT_PARAM_TYPE);

        let filter = &endpoint.parameters[1];
        assert_eq!(filter.schema_ref.as_deref(), Some("Filter"));
        assert_eq!(filter.type_name, DEFAULT_PARAM_TYPE);

        let file = &endpoint.parameters[2];
        assert_eq!(file.location, ParamLocation::Other("formData".into()));
    }

    #[test]
    fn test_request_body_refs_become_body_parameters() {
        let doc = json!({
            "paths": {
                "/pets": {
                    "post": {
                        "requestBody": {
                            "description": "Pet to add",
                            "required": true,
                            "content": {
                                "application/json": {"schema": {"$ref": "#/components/schemas/Pet"}},
                                "application/xml": {"schema": {"$ref": "#/components/schemas/Pet"}},
                                "text/plain": {"schema": {"type": "string"}}
                            }
                        }
                    }
                }
            }
        });
        let endpoint = &normalize(&doc, None).unwrap().endpoints[0];
        assert_eq!(endpoint.parameters.len(), 2);

        let body = &endpoint.parameters[0];
        assert_eq!(body.name, REQUEST_BODY_PARAM);
        assert_eq!(body.location, ParamLocation::Body);
        assert_eq!(body.type_name, "application/json");
        assert_eq!(body.schema_ref.as_deref(), Some("Pet"));
        assert!(body.required);
        assert_eq!(body.description, "Pet to add");
        assert_eq!(endpoint.parameters[1].type_name, "application/xml");
    }

    #[test]
    fn test_schema_defaults() {
        let doc = json!({"components": {"schemas": {"Opaque": {}, "Status": {"type": "string", "description": "State"}}}});
        let batch = normalize(&doc, None).unwrap();

        let opaque = &batch.schemas[0];
        assert_eq!(opaque.type_name, DEFAULT_SCHEMA_TYPE);
        assert!(opaque.properties.is_empty());
        assert!(opaque.required_fields.is_empty());

        let status = &batch.schemas[1];
        assert_eq!(status.type_name, "string");
        assert_eq!(status.description, "State");
    }

    #[test]
    fn test_schema_properties_keep_document_order() {
        let doc = json!({"components": {"schemas": {"Order": {"properties": {
            "zone": {"type": "string"},
            "id": {"type": "integer"},
            "amount": {"type": "number"}
        }}}}});
        let batch = normalize(&doc, None).unwrap();

        let names: Vec<_> = batch.schemas[0].properties.keys().map(String::as_str).collect();
        assert_eq!(names, ["zone", "id", "amount"]);
    }

    #[test]
    fn test_malformed_path_items_are_skipped() {
        let doc = json!({"paths": {"/broken": "nope", "/ok": {"get": {}, "post": null}}});
        let batch = normalize(&doc, None).unwrap();
        assert_eq!(batch.endpoint_count(), 1);
        assert_eq!(batch.endpoints[0].path, "/ok");
    }
}
