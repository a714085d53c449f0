#![allow(dead_code)]

use serde_json::{json, Value};

/// Petstore-shaped document exercising refs, arrays, bodies and tags
pub fn petstore() -> Value {
    json!({
        "openapi": "3.0.1",
        "info": {
            "title": "Petstore",
            "version": "2.0",
            "description": "Sample pet store"
        },
        "servers": [{"url": "https://petstore.example.com/v2"}],
        "paths": {
            "/pets": {
                "get": {
                    "summary": "List pets",
                    "operationId": "listPets",
                    "tags": ["pets"],
                    "parameters": [
                        {"name": "limit", "in": "query", "schema": {"type": "integer"}}
                    ]
                },
                "post": {
                    "summary": "Create a pet",
                    "operationId": "createPet",
                    "tags": ["pets"],
                    "requestBody": {
                        "required": true,
                        "content": {
                            "application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}
                        }
                    }
                }
            },
            "/pets/{petId}": {
                "get": {
                    "summary": "Find a pet",
                    "tags": ["pets", "lookup"],
                    "parameters": [
                        {"name": "petId", "in": "path", "required": true, "schema": {"type": "string"}}
                    ]
                },
                "delete": {
                    "summary": "Remove a pet",
                    "deprecated": true,
                    "tags": ["admin"]
                }
            },
            "/categories": {
                "get": {
                    "summary": "List categories",
                    "tags": ["category"]
                }
            }
        },
        "components": {
            "schemas": {
                "Pet": {
                    "type": "object",
                    "required": ["name"],
                    "properties": {
                        "name": {"type": "string", "description": "Pet name"},
                        "category": {"$ref": "#/components/schemas/Category"},
                        "tags": {"type": "array", "items": {"$ref": "#/components/schemas/Tag"}},
                        "birthday": {"type": "string", "format": "date"}
                    }
                },
                "Category": {
                    "type": "object",
                    "properties": {"id": {"type": "integer", "format": "int64"}}
                },
                "Tag": {
                    "type": "object",
                    "properties": {"label": {"type": "string"}}
                }
            }
        }
    })
}
