//! Plain-text rendering of query results
//!
//! Shared by the MCP tools and the CLI's text mode. Output is stable,
//! line-oriented and free of color codes.

use std::fmt::Write;

use crate::ingest::SyncSummary;
use crate::model::{Endpoint, EndpointDetails, Schema, Version};

const MISSING: &str = "N/A";

fn or_missing(value: &str) -> &str {
    if value.is_empty() { MISSING } else { value }
}

fn tag_list(tags: &[String]) -> String {
    if tags.is_empty() {
        MISSING.to_string()
    } else {
        tags.join(", ")
    }
}

pub fn sync_summary(summary: &SyncSummary) -> String {
    format!(
        "Swagger sync complete\n\n\
         Version: {}\n\
         Title: {}\n\
         Endpoints: {}\n\
         Schemas: {}",
        summary.version, summary.title, summary.endpoint_count, summary.schema_count
    )
}

pub fn endpoint_list(endpoints: &[Endpoint]) -> String {
    if endpoints.is_empty() {
        return "No endpoints found.".to_string();
    }

    let mut out = format!("Found {} endpoint(s).\n", endpoints.len());
    for ep in endpoints {
        let _ = write!(
            out,
            "\n[{}] {} {}{}\n  - Summary: {}\n  - Tags: {}\n  - Version: {}\n",
            ep.id,
            ep.method,
            ep.path,
            if ep.deprecated { " (deprecated)" } else { "" },
            or_missing(&ep.summary),
            tag_list(&ep.tags),
            ep.version,
        );
    }
    out
}

pub fn endpoint_not_found(id: i64) -> String {
    format!("Endpoint with ID {} not found.", id)
}

pub fn endpoint_details(details: &EndpointDetails) -> String {
    let ep = &details.endpoint;
    let mut out = String::from("Endpoint details\n\n");
    let _ = writeln!(out, "Path: {}", ep.path);
    let _ = writeln!(out, "Method: {}", ep.method);
    let _ = writeln!(out, "Summary: {}", or_missing(&ep.summary));
    let _ = writeln!(out, "Description: {}", or_missing(&ep.description));
    let _ = writeln!(out, "Operation ID: {}", or_missing(&ep.operation_id));
    let _ = writeln!(out, "Tags: {}", tag_list(&ep.tags));
    if ep.deprecated {
        out.push_str("Deprecated: yes\n");
    }
    let _ = writeln!(out, "Version: {}", ep.version);

    out.push_str("\nParameters:\n");
    if details.parameters.is_empty() {
        out.push_str("  none");
        return out;
    }

    let lines: Vec<String> = details
        .parameters
        .iter()
        .map(|p| {
            let schema = match &p.schema_ref {
                Some(target) => format!(" (schema: {})", target),
                None => String::new(),
            };
            format!(
                "  - {} ({}, {}): {}{}\n    Description: {}",
                p.name,
                p.location,
                if p.required { "required" } else { "optional" },
                p.type_name,
                schema,
                or_missing(&p.description),
            )
        })
        .collect();
    out.push_str(&lines.join("\n"));
    out
}

pub fn schema_not_found(version: &str, name: &str) -> String {
    format!("Schema '{}' (version: {}) not found.", name, version)
}

pub fn schema(schema: &Schema) -> String {
    let mut out = format!("Schema: {}\n\n", schema.name);
    let _ = writeln!(out, "Type: {}", schema.type_name);
    let _ = writeln!(out, "Description: {}", or_missing(&schema.description));
    out.push_str("\nProperties ([✓] = required):");

    if schema.properties.is_empty() {
        out.push_str("\n  none");
    }
    for (name, property) in &schema.properties {
        let mark = if schema.is_required(name) { "✓" } else { " " };
        let _ = write!(
            out,
            "\n  [{}] {}: {}\n      {}",
            mark,
            name,
            property.descriptor.type_label(),
            property.description
        );
    }
    out
}

pub fn version_list(versions: &[Version]) -> String {
    if versions.is_empty() {
        return "No API versions stored.".to_string();
    }

    let mut out = format!("{} version(s) stored.\n", versions.len());
    for v in versions {
        let _ = write!(
            out,
            "\nVersion: {}\n  - Title: {}\n  - Synced at: {}\n  - Base URL: {}\n",
            v.version,
            or_missing(&v.title),
            v.synced_at.to_rfc3339(),
            or_missing(&v.base_url),
        );
    }
    out
}
