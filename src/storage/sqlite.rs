//! SQLite storage implementation

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde::Serialize;

use super::schema;
use crate::Result;
use crate::model::{
    Endpoint, EndpointDetails, EndpointFilter, HttpMethod, NewEndpoint, NewSchema, NewVersion,
    Parameter, ParamLocation, Schema, Version,
};
use crate::normalize::NormalizedBatch;

const ENDPOINT_COLUMNS: &str = "e.id, e.version_id, v.version, e.path, e.method, e.summary, e.description, e.operation_id, e.tags, e.deprecated";
const PARAMETER_COLUMNS: &str = "id, endpoint_id, name, in_type, required, type, description, schema_ref";
const SCHEMA_COLUMNS: &str = "s.id, s.version_id, s.name, s.type, s.properties, s.required_fields, s.description";
const VERSION_COLUMNS: &str = "id, version, title, description, base_url, synced_at";

/// SQLite-backed storage for normalized documents.
///
/// One connection, serialized behind a mutex. Every multi-statement write
/// runs in a single transaction, so readers never see a half-replaced version.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create tables and indexes if they do not exist yet
    fn initialize_schema(conn: &Connection) -> Result<()> {
        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, [])?;
        }
        Ok(())
    }

    // ========== Version Operations ==========

    /// Insert or update a version by its unique version string.
    ///
    /// The returned id is stable across repeated upserts of the same version.
    pub fn upsert_version(&self, version: &NewVersion) -> Result<i64> {
        let conn = self.conn.lock();
        upsert_version(&conn, version)
    }

    /// Get a version by its version string
    pub fn get_version(&self, version: &str) -> Result<Option<Version>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!("SELECT {VERSION_COLUMNS} FROM versions WHERE version = ?1"),
            [version],
            row_to_version,
        )
        .optional()
        .map_err(Into::into)
    }

    /// All versions, most recently synced first
    pub fn list_versions(&self) -> Result<Vec<Version>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {VERSION_COLUMNS} FROM versions ORDER BY synced_at DESC, id DESC"
        ))?;

        let versions = stmt
            .query_map([], row_to_version)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(versions)
    }

    /// Delete a version and everything it owns.
    ///
    /// Returns `false` without touching anything when the version is unknown.
    pub fn delete_version(&self, version: &str) -> Result<bool> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        let Some(version_id) = version_id(&tx, version)? else {
            return Ok(false);
        };
        delete_subtree(&tx, version_id)?;
        tx.execute("DELETE FROM versions WHERE id = ?1", [version_id])?;
        tx.commit()?;

        tracing::debug!("Deleted version {} (id {})", version, version_id);
        Ok(true)
    }

    // ========== Bulk Operations ==========

    /// Replace every endpoint, parameter and schema owned by `version_id`.
    ///
    /// Runs as one transaction: on failure the previous rows stay in place.
    pub fn replace_version_subtree(
        &self,
        version_id: i64,
        endpoints: &[NewEndpoint],
        schemas: &[NewSchema],
    ) -> Result<()> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        delete_subtree(&tx, version_id)?;
        insert_schemas(&tx, version_id, schemas)?;
        insert_endpoints(&tx, version_id, endpoints)?;
        tx.commit()?;
        Ok(())
    }

    /// Upsert the version header and replace its whole subtree atomically
    pub fn replace_version(&self, batch: &NormalizedBatch) -> Result<i64> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let version_id = upsert_version(&tx, &batch.version)?;
        delete_subtree(&tx, version_id)?;
        insert_schemas(&tx, version_id, &batch.schemas)?;
        insert_endpoints(&tx, version_id, &batch.endpoints)?;
        tx.commit()?;

        tracing::debug!(
            "Replaced version {} (id {}): {} endpoints, {} parameters, {} schemas",
            batch.version.version,
            version_id,
            batch.endpoint_count(),
            batch.parameter_count(),
            batch.schema_count()
        );
        Ok(version_id)
    }

    // ========== Endpoint Operations ==========

    /// List endpoints matching every set field of `filter`, in insertion order
    pub fn list_endpoints(&self, filter: &EndpointFilter) -> Result<Vec<Endpoint>> {
        let mut sql = format!(
            "SELECT {ENDPOINT_COLUMNS} FROM endpoints e JOIN versions v ON e.version_id = v.id WHERE 1=1"
        );
        let mut values: Vec<String> = Vec::new();

        if let Some(version) = &filter.version {
            values.push(version.clone());
            sql.push_str(&format!(" AND v.version = ?{}", values.len()));
        }
        // instr() is case-sensitive, unlike LIKE
        if let Some(path) = &filter.path {
            values.push(path.clone());
            sql.push_str(&format!(" AND instr(e.path, ?{}) > 0", values.len()));
        }
        if let Some(method) = filter.method {
            values.push(method.as_str().to_string());
            sql.push_str(&format!(" AND e.method = ?{}", values.len()));
        }
        if let Some(tag) = &filter.tag {
            values.push(tag.clone());
            sql.push_str(&format!(" AND instr(e.tags, ?{}) > 0", values.len()));
        }
        sql.push_str(" ORDER BY e.id");

        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&sql)?;
        let endpoints = stmt
            .query_map(params_from_iter(values.iter()), row_to_endpoint)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(endpoints)
    }

    /// Get an endpoint by id
    pub fn get_endpoint(&self, id: i64) -> Result<Option<Endpoint>> {
        let conn = self.conn.lock();
        query_endpoint(&conn, id)
    }

    /// Parameters of an endpoint, in insertion order
    pub fn get_parameters(&self, endpoint_id: i64) -> Result<Vec<Parameter>> {
        let conn = self.conn.lock();
        query_parameters(&conn, endpoint_id)
    }

    /// Endpoint with its parameters, or `None` if the id is unknown.
    ///
    /// Both reads happen under one lock, so a concurrent resync is seen
    /// either entirely or not at all.
    pub fn get_endpoint_details(&self, id: i64) -> Result<Option<EndpointDetails>> {
        let conn = self.conn.lock();
        let Some(endpoint) = query_endpoint(&conn, id)? else {
            return Ok(None);
        };
        let parameters = query_parameters(&conn, id)?;
        Ok(Some(EndpointDetails {
            endpoint,
            parameters,
        }))
    }

    // ========== Schema Operations ==========

    /// Get a schema by version string and name
    pub fn get_schema(&self, version: &str, name: &str) -> Result<Option<Schema>> {
        let conn = self.conn.lock();
        conn.query_row(
            &format!(
                "SELECT {SCHEMA_COLUMNS} FROM schemas s JOIN versions v ON s.version_id = v.id WHERE v.version = ?1 AND s.name = ?2"
            ),
            [version, name],
            row_to_schema,
        )
        .optional()
        .map_err(Into::into)
    }

    /// All schemas of a version, by name
    pub fn list_schemas(&self, version: &str) -> Result<Vec<Schema>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {SCHEMA_COLUMNS} FROM schemas s JOIN versions v ON s.version_id = v.id WHERE v.version = ?1 ORDER BY s.name"
        ))?;

        let schemas = stmt
            .query_map([version], row_to_schema)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(schemas)
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn.lock();
        let count = |table: &str| -> Result<usize> {
            let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(n as usize)
        };

        Ok(StoreStats {
            versions: count("versions")?,
            endpoints: count("endpoints")?,
            parameters: count("parameters")?,
            schemas: count("schemas")?,
        })
    }
}

// ========== Statement helpers ==========
//
// These take a plain `&Connection` so they compose inside a caller's
// transaction (`Transaction` derefs to `Connection`).

fn version_id(conn: &Connection, version: &str) -> Result<Option<i64>> {
    conn.query_row("SELECT id FROM versions WHERE version = ?1", [version], |row| row.get(0))
        .optional()
        .map_err(Into::into)
}

fn upsert_version(conn: &Connection, version: &NewVersion) -> Result<i64> {
    let synced_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
    let id = conn.query_row(
        r#"
        INSERT INTO versions (version, title, description, base_url, synced_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(version) DO UPDATE SET
            title = excluded.title,
            description = excluded.description,
            base_url = excluded.base_url,
            synced_at = excluded.synced_at
        RETURNING id
        "#,
        params![
            version.version,
            version.title,
            version.description,
            version.base_url,
            synced_at,
        ],
        |row| row.get(0),
    )?;
    Ok(id)
}

fn query_endpoint(conn: &Connection, id: i64) -> Result<Option<Endpoint>> {
    conn.query_row(
        &format!(
            "SELECT {ENDPOINT_COLUMNS} FROM endpoints e JOIN versions v ON e.version_id = v.id WHERE e.id = ?1"
        ),
        [id],
        row_to_endpoint,
    )
    .optional()
    .map_err(Into::into)
}

fn query_parameters(conn: &Connection, endpoint_id: i64) -> Result<Vec<Parameter>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PARAMETER_COLUMNS} FROM parameters WHERE endpoint_id = ?1 ORDER BY id"
    ))?;

    let parameters = stmt
        .query_map([endpoint_id], row_to_parameter)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(parameters)
}

/// Delete parameters, endpoints and schemas of a version (the version row stays)
fn delete_subtree(conn: &Connection, version_id: i64) -> Result<()> {
    conn.execute(
        "DELETE FROM parameters WHERE endpoint_id IN (SELECT id FROM endpoints WHERE version_id = ?1)",
        [version_id],
    )?;
    conn.execute("DELETE FROM endpoints WHERE version_id = ?1", [version_id])?;
    conn.execute("DELETE FROM schemas WHERE version_id = ?1", [version_id])?;
    Ok(())
}

fn insert_schemas(conn: &Connection, version_id: i64, schemas: &[NewSchema]) -> Result<()> {
    let mut stmt = conn.prepare(
        r#"
        INSERT INTO schemas (version_id, name, type, properties, required_fields, description)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(version_id, name) DO UPDATE SET
            type = excluded.type,
            properties = excluded.properties,
            required_fields = excluded.required_fields,
            description = excluded.description
        "#,
    )?;

    for schema in schemas {
        stmt.execute(params![
            version_id,
            schema.name,
            schema.type_name,
            serde_json::to_string(&schema.properties)?,
            serde_json::to_string(&schema.required_fields)?,
            schema.description,
        ])?;
    }
    Ok(())
}

/// Insert endpoints, each followed by its parameters.
///
/// A second endpoint with the same `(path, method)` overwrites the first in
/// place and replaces its parameters.
fn insert_endpoints(conn: &Connection, version_id: i64, endpoints: &[NewEndpoint]) -> Result<()> {
    let mut endpoint_stmt = conn.prepare(
        r#"
        INSERT INTO endpoints (version_id, path, method, summary, description, operation_id, tags, deprecated)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(version_id, path, method) DO UPDATE SET
            summary = excluded.summary,
            description = excluded.description,
            operation_id = excluded.operation_id,
            tags = excluded.tags,
            deprecated = excluded.deprecated
        RETURNING id
        "#,
    )?;
    let mut clear_stmt = conn.prepare("DELETE FROM parameters WHERE endpoint_id = ?1")?;
    let mut param_stmt = conn.prepare(
        r#"
        INSERT INTO parameters (endpoint_id, name, in_type, required, type, description, schema_ref)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )?;

    for endpoint in endpoints {
        let endpoint_id: i64 = endpoint_stmt.query_row(
            params![
                version_id,
                endpoint.path,
                endpoint.method.as_str(),
                endpoint.summary,
                endpoint.description,
                endpoint.operation_id,
                serde_json::to_string(&endpoint.tags)?,
                endpoint.deprecated,
            ],
            |row| row.get(0),
        )?;

        clear_stmt.execute([endpoint_id])?;
        for param in &endpoint.parameters {
            param_stmt.execute(params![
                endpoint_id,
                param.name,
                param.location.as_str(),
                param.required,
                param.type_name,
                param.description,
                param.schema_ref,
            ])?;
        }
    }
    Ok(())
}

// ========== Row mapping ==========

fn conversion_error<E>(column: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(err))
}

fn json_column<T: serde::de::DeserializeOwned>(row: &rusqlite::Row, column: usize) -> rusqlite::Result<T> {
    let text: String = row.get(column)?;
    serde_json::from_str(&text).map_err(|e| conversion_error(column, e))
}

fn row_to_version(row: &rusqlite::Row) -> rusqlite::Result<Version> {
    let synced_at: String = row.get(5)?;
    let synced_at = DateTime::parse_from_rfc3339(&synced_at)
        .map_err(|e| conversion_error(5, e))?
        .with_timezone(&Utc);

    Ok(Version {
        id: row.get(0)?,
        version: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        base_url: row.get(4)?,
        synced_at,
    })
}

fn row_to_endpoint(row: &rusqlite::Row) -> rusqlite::Result<Endpoint> {
    let method: String = row.get(4)?;
    let method: HttpMethod = method.parse().map_err(|e| conversion_error(4, e))?;

    Ok(Endpoint {
        id: row.get(0)?,
        version_id: row.get(1)?,
        version: row.get(2)?,
        path: row.get(3)?,
        method,
        summary: row.get(5)?,
        description: row.get(6)?,
        operation_id: row.get(7)?,
        tags: json_column(row, 8)?,
        deprecated: row.get(9)?,
    })
}

fn row_to_parameter(row: &rusqlite::Row) -> rusqlite::Result<Parameter> {
    let location: String = row.get(3)?;

    Ok(Parameter {
        id: row.get(0)?,
        endpoint_id: row.get(1)?,
        name: row.get(2)?,
        location: ParamLocation::from(location),
        required: row.get(4)?,
        type_name: row.get(5)?,
        description: row.get(6)?,
        schema_ref: row.get(7)?,
    })
}

fn row_to_schema(row: &rusqlite::Row) -> rusqlite::Result<Schema> {
    Ok(Schema {
        id: row.get(0)?,
        version_id: row.get(1)?,
        name: row.get(2)?,
        type_name: row.get(3)?,
        properties: json_column(row, 4)?,
        required_fields: json_column(row, 5)?,
        description: row.get(6)?,
    })
}

/// Database statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub versions: usize,
    pub endpoints: usize,
    pub parameters: usize,
    pub schemas: usize,
}

impl std::fmt::Display for StoreStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Versions: {}", self.versions)?;
        writeln!(f, "  Endpoints: {}", self.endpoints)?;
        writeln!(f, "  Parameters: {}", self.parameters)?;
        writeln!(f, "  Schemas: {}", self.schemas)
    }
}
