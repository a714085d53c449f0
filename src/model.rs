//! Relational entities
//!
//! Everything is partitioned by `Version`:
//! - `Version` owns many `Endpoint`s and many `Schema`s
//! - `Endpoint` owns many `Parameter`s
//!
//! `New*` types are what the normalizer produces and the store inserts;
//! the plain types are rows read back with their generated ids.

use crate::property::Property;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// HTTP verbs recognized as operations under a path item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Options,
    Head,
}

impl HttpMethod {
    /// Uppercase wire name, as stored in `endpoints.method`
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Head => "HEAD",
        }
    }

    /// Get all methods
    pub fn all() -> &'static [HttpMethod] {
        &[
            HttpMethod::Get,
            HttpMethod::Post,
            HttpMethod::Put,
            HttpMethod::Delete,
            HttpMethod::Patch,
            HttpMethod::Options,
            HttpMethod::Head,
        ]
    }
}

impl FromStr for HttpMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "get" => Ok(HttpMethod::Get),
            "post" => Ok(HttpMethod::Post),
            "put" => Ok(HttpMethod::Put),
            "delete" => Ok(HttpMethod::Delete),
            "patch" => Ok(HttpMethod::Patch),
            "options" => Ok(HttpMethod::Options),
            "head" => Ok(HttpMethod::Head),
            _ => Err(Error::InvalidMethod(s.to_string())),
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where a parameter is carried.
///
/// `Body` is only produced for the synthetic request-body parameter.
/// Locations outside OpenAPI 3 (Swagger 2 `formData`, typos) are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ParamLocation {
    Query,
    Path,
    Header,
    Cookie,
    Body,
    Other(String),
}

impl ParamLocation {
    pub fn as_str(&self) -> &str {
        match self {
            ParamLocation::Query => "query",
            ParamLocation::Path => "path",
            ParamLocation::Header => "header",
            ParamLocation::Cookie => "cookie",
            ParamLocation::Body => "body",
            ParamLocation::Other(other) => other,
        }
    }
}

impl From<&str> for ParamLocation {
    fn from(s: &str) -> Self {
        match s {
            "query" => ParamLocation::Query,
            "path" => ParamLocation::Path,
            "header" => ParamLocation::Header,
            "cookie" => ParamLocation::Cookie,
            "body" => ParamLocation::Body,
            other => ParamLocation::Other(other.to_string()),
        }
    }
}

impl From<String> for ParamLocation {
    fn from(s: String) -> Self {
        ParamLocation::from(s.as_str())
    }
}

impl From<ParamLocation> for String {
    fn from(location: ParamLocation) -> Self {
        location.as_str().to_string()
    }
}

impl std::fmt::Display for ParamLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ========== Insertable entities ==========

/// Version header extracted from a document's `info` and `servers` blocks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewVersion {
    pub version: String,
    pub title: String,
    pub description: String,
    pub base_url: String,
}

/// One operation under one path, with its parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEndpoint {
    pub path: String,
    pub method: HttpMethod,
    pub summary: String,
    pub description: String,
    pub operation_id: String,
    pub tags: Vec<String>,
    pub deprecated: bool,
    pub parameters: Vec<NewParameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewParameter {
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    /// Schema type, or the media type for a request body
    pub type_name: String,
    pub description: String,
    pub schema_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSchema {
    pub name: String,
    pub type_name: String,
    pub properties: IndexMap<String, Property>,
    pub required_fields: Vec<String>,
    pub description: String,
}

// ========== Stored rows ==========

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    pub id: i64,
    pub version: String,
    pub title: String,
    pub description: String,
    pub base_url: String,
    pub synced_at: DateTime<Utc>,
}

/// Endpoint row joined with its version string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: i64,
    pub version_id: i64,
    pub version: String,
    pub path: String,
    pub method: HttpMethod,
    pub summary: String,
    pub description: String,
    pub operation_id: String,
    pub tags: Vec<String>,
    pub deprecated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub id: i64,
    pub endpoint_id: i64,
    pub name: String,
    pub location: ParamLocation,
    pub required: bool,
    pub type_name: String,
    pub description: String,
    pub schema_ref: Option<String>,
}

/// Endpoint with all of its parameters, in insertion order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointDetails {
    #[serde(flatten)]
    pub endpoint: Endpoint,
    pub parameters: Vec<Parameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub id: i64,
    pub version_id: i64,
    pub name: String,
    pub type_name: String,
    pub properties: IndexMap<String, Property>,
    pub required_fields: Vec<String>,
    pub description: String,
}

impl Schema {
    pub fn is_required(&self, property: &str) -> bool {
        self.required_fields.iter().any(|f| f == property)
    }
}

/// Conjunctive endpoint filter.
///
/// `path` and `tag` are case-sensitive substring checks; `tag` runs against
/// the serialized tag list, so `"cat"` also matches a `"category"` tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointFilter {
    pub version: Option<String>,
    pub path: Option<String>,
    pub method: Option<HttpMethod>,
    pub tag: Option<String>,
}

impl EndpointFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_method(mut self, method: HttpMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Build a filter from loose string inputs (tool arguments, query strings).
    ///
    /// Empty strings are treated as absent.
    pub fn from_parts(
        version: Option<String>,
        path: Option<String>,
        method: Option<&str>,
        tag: Option<String>,
    ) -> Result<Self> {
        let non_empty = |s: Option<String>| s.filter(|s| !s.is_empty());
        let method = match method.filter(|m| !m.is_empty()) {
            Some(m) => Some(m.parse()?),
            None => None,
        };
        Ok(Self {
            version: non_empty(version),
            path: non_empty(path),
            method,
            tag: non_empty(tag),
        })
    }
}
