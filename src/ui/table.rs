use tabled::{settings::Style, Table, Tabled};

use crate::model::{Endpoint, Schema, Version};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

#[derive(Tabled)]
struct EndpointRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Method")]
    method: String,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Summary")]
    summary: String,
    #[tabled(rename = "Tags")]
    tags: String,
    #[tabled(rename = "Version")]
    version: String,
}

pub fn endpoint_table(endpoints: &[Endpoint]) -> String {
    let rows: Vec<EndpointRow> = endpoints
        .iter()
        .map(|ep| EndpointRow {
            id: ep.id,
            method: ep.method.to_string(),
            path: if ep.deprecated {
                format!("{} (deprecated)", ep.path)
            } else {
                ep.path.clone()
            },
            summary: ep.summary.clone(),
            tags: ep.tags.join(", "),
            version: ep.version.clone(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct VersionRow {
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Synced")]
    synced_at: String,
    #[tabled(rename = "Base URL")]
    base_url: String,
}

pub fn version_table(versions: &[Version]) -> String {
    let rows: Vec<VersionRow> = versions
        .iter()
        .map(|v| VersionRow {
            version: v.version.clone(),
            title: v.title.clone(),
            synced_at: v.synced_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            base_url: v.base_url.clone(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

#[derive(Tabled)]
struct PropertyRow {
    #[tabled(rename = "Req")]
    required: String,
    #[tabled(rename = "Property")]
    name: String,
    #[tabled(rename = "Type")]
    type_label: String,
    #[tabled(rename = "Description")]
    description: String,
}

pub fn property_table(schema: &Schema) -> String {
    let rows: Vec<PropertyRow> = schema
        .properties
        .iter()
        .map(|(name, property)| PropertyRow {
            required: if schema.is_required(name) { "✓".into() } else { String::new() },
            name: name.clone(),
            type_label: property.descriptor.type_label(),
            description: property.description.clone(),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}
