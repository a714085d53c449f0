//! Database schema definitions

/// SQL to create the versions table
pub const CREATE_VERSIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS versions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    version TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    base_url TEXT NOT NULL DEFAULT '',
    synced_at TEXT NOT NULL
)
"#;

/// SQL to create the endpoints table
/// `tags` holds the JSON-encoded tag list
pub const CREATE_ENDPOINTS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS endpoints (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    version_id INTEGER NOT NULL REFERENCES versions (id),
    path TEXT NOT NULL,
    method TEXT NOT NULL,
    summary TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    operation_id TEXT NOT NULL DEFAULT '',
    tags TEXT NOT NULL DEFAULT '[]',
    deprecated INTEGER NOT NULL DEFAULT 0,
    UNIQUE(version_id, path, method)
)
"#;

/// SQL to create the parameters table
pub const CREATE_PARAMETERS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS parameters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    endpoint_id INTEGER NOT NULL REFERENCES endpoints (id),
    name TEXT NOT NULL,
    in_type TEXT NOT NULL,
    required INTEGER NOT NULL DEFAULT 0,
    type TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    schema_ref TEXT
)
"#;

/// SQL to create the schemas table
/// `properties` and `required_fields` hold JSON text
pub const CREATE_SCHEMAS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schemas (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    version_id INTEGER NOT NULL REFERENCES versions (id),
    name TEXT NOT NULL,
    type TEXT NOT NULL DEFAULT 'object',
    properties TEXT NOT NULL DEFAULT '{}',
    required_fields TEXT NOT NULL DEFAULT '[]',
    description TEXT NOT NULL DEFAULT '',
    UNIQUE(version_id, name)
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_endpoints_version ON endpoints(version_id)",
    "CREATE INDEX IF NOT EXISTS idx_endpoints_path ON endpoints(path)",
    "CREATE INDEX IF NOT EXISTS idx_parameters_endpoint ON parameters(endpoint_id)",
    "CREATE INDEX IF NOT EXISTS idx_schemas_version ON schemas(version_id)",
];

/// All schema creation statements, safe to run on every open
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_VERSIONS_TABLE,
        CREATE_ENDPOINTS_TABLE,
        CREATE_PARAMETERS_TABLE,
        CREATE_SCHEMAS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
