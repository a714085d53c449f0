use std::sync::Arc;
use crate::ingest::Ingestor;
use crate::model::EndpointFilter;
use crate::render;
use mcp_sdk_rs::server::{Server, ServerHandler};
use mcp_sdk_rs::types::{
    Tool, ToolResult, ListToolsResult,
    Implementation, ClientCapabilities, ServerCapabilities
};
use mcp_sdk_rs::error::ErrorCode;
use mcp_sdk_rs::transport::stdio::StdioTransport;
use mcp_sdk_rs::error::Error;
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Deserialize)]
struct CallToolRequest {
    name: String,
    arguments: Option<Value>,
}

#[derive(Deserialize)]
struct SyncArgs {
    version: Option<String>,
    url: Option<String>,
}

#[derive(Deserialize)]
struct ListEndpointsArgs {
    version: Option<String>,
    path_pattern: Option<String>,
    method: Option<String>,
    tag: Option<String>,
}

#[derive(Deserialize)]
struct EndpointArgs {
    endpoint_id: i64,
}

#[derive(Deserialize)]
struct SchemaArgs {
    version: String,
    schema_name: String,
}

/// MCP tool server over the index
#[derive(Clone)]
pub struct McpService {
    ingestor: Arc<Ingestor>,
    default_url: String,
}

impl McpService {
    pub fn new(ingestor: Arc<Ingestor>, default_url: impl Into<String>) -> Self {
        Self {
            ingestor,
            default_url: default_url.into(),
        }
    }

    pub async fn run_stdio(&self) -> anyhow::Result<()> {
        let (read_tx, read_rx) = mpsc::channel::<String>(32);
        let (write_tx, mut write_rx) = mpsc::channel::<String>(32);

        // Stdin reader
        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let mut reader = BufReader::new(stdin).lines();
            while let Ok(Some(line)) = reader.next_line().await {
                if read_tx.send(line).await.is_err() {
                    break;
                }
            }
        });

        // Stdout writer
        tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            while let Some(msg) = write_rx.recv().await {
                let _ = stdout.write_all(msg.as_bytes()).await;
                let _ = stdout.write_all(b"\n").await;
                let _ = stdout.flush().await;
            }
        });

        let transport = StdioTransport::new(read_rx, write_tx);
        let server = Server::new(Arc::new(transport), Arc::new(self.clone()));
        server.start().await?;
        Ok(())
    }

    /// Run one tool and return its text output
    pub async fn call_tool(&self, name: &str, arguments: Option<Value>) -> Result<String, Error> {
        match name {
            "sync_swagger" => {
                let args: SyncArgs = parse_args(arguments)?;
                let url = args
                    .url
                    .filter(|u| !u.is_empty())
                    .unwrap_or_else(|| self.default_url.clone());
                let version = args.version.filter(|v| !v.is_empty());
                let summary = self
                    .ingestor
                    .sync(&url, version.as_deref())
                    .await
                    .map_err(tool_error)?;
                Ok(render::sync_summary(&summary))
            }
            "list_endpoints" => {
                let args: ListEndpointsArgs = parse_args(arguments)?;
                let filter = EndpointFilter::from_parts(
                    args.version,
                    args.path_pattern,
                    args.method.as_deref(),
                    args.tag,
                )
                .map_err(tool_error)?;
                let endpoints = self.ingestor.store().list_endpoints(&filter).map_err(tool_error)?;
                Ok(render::endpoint_list(&endpoints))
            }
            "get_endpoint_details" => {
                let args: EndpointArgs = parse_args(arguments)?;
                let details = self
                    .ingestor
                    .store()
                    .get_endpoint_details(args.endpoint_id)
                    .map_err(tool_error)?;
                Ok(match details {
                    Some(details) => render::endpoint_details(&details),
                    None => render::endpoint_not_found(args.endpoint_id),
                })
            }
            "get_schema" => {
                let args: SchemaArgs = parse_args(arguments)?;
                let schema = self
                    .ingestor
                    .store()
                    .get_schema(&args.version, &args.schema_name)
                    .map_err(tool_error)?;
                Ok(match schema {
                    Some(schema) => render::schema(&schema),
                    None => render::schema_not_found(&args.version, &args.schema_name),
                })
            }
            "list_versions" => {
                let versions = self.ingestor.store().list_versions().map_err(tool_error)?;
                Ok(render::version_list(&versions))
            }
            other => Err(Error::protocol(ErrorCode::MethodNotFound, other.to_string())),
        }
    }
}

fn parse_args<T: DeserializeOwned>(arguments: Option<Value>) -> Result<T, Error> {
    serde_json::from_value(arguments.unwrap_or_else(|| json!({})))
        .map_err(|e| Error::protocol(ErrorCode::InvalidParams, e.to_string()))
}

fn tool_error(err: crate::Error) -> Error {
    match err {
        crate::Error::InvalidMethod(_) | crate::Error::InvalidArgument(_) => {
            Error::protocol(ErrorCode::InvalidParams, err.to_string())
        }
        _ => Error::protocol(ErrorCode::InternalError, err.to_string()),
    }
}

fn tool(name: &str, description: &str, input_schema: Value) -> Result<Tool, Error> {
    Ok(Tool {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: serde_json::from_value(input_schema)
            .map_err(|e| Error::protocol(ErrorCode::ParseError, e.to_string()))?,
        annotations: None,
    })
}

fn tool_definitions() -> Result<Vec<Tool>, Error> {
    Ok(vec![
        tool(
            "sync_swagger",
            "Fetch the OpenAPI document, parse it and store it in the index",
            json!({
                "type": "object",
                "properties": {
                    "version": { "type": "string", "description": "Version label overriding info.version" },
                    "url": { "type": "string", "description": "Document URL or path" }
                }
            }),
        )?,
        tool(
            "list_endpoints",
            "List stored API endpoints",
            json!({
                "type": "object",
                "properties": {
                    "version": { "type": "string" },
                    "path_pattern": { "type": "string", "description": "Substring of the path" },
                    "method": { "type": "string", "description": "HTTP method (GET, POST, ...)" },
                    "tag": { "type": "string" }
                }
            }),
        )?,
        tool(
            "get_endpoint_details",
            "Show one endpoint with its parameters",
            json!({
                "type": "object",
                "properties": {
                    "endpoint_id": { "type": "integer" }
                },
                "required": ["endpoint_id"]
            }),
        )?,
        tool(
            "get_schema",
            "Show a schema definition",
            json!({
                "type": "object",
                "properties": {
                    "version": { "type": "string" },
                    "schema_name": { "type": "string" }
                },
                "required": ["version", "schema_name"]
            }),
        )?,
        tool(
            "list_versions",
            "List every stored API version",
            json!({ "type": "object", "properties": {} }),
        )?,
    ])
}

#[async_trait]
impl ServerHandler for McpService {
    async fn initialize(
        &self,
        _implementation: Implementation,
        _capabilities: ClientCapabilities
    ) -> Result<ServerCapabilities, Error> {
        Ok(ServerCapabilities::default())
    }

    async fn shutdown(&self) -> Result<(), Error> {
        Ok(())
    }

    async fn handle_method(&self, method: &str, params: Option<Value>) -> Result<Value, Error> {
        match method {
            "tools/list" => {
                let result = ListToolsResult { tools: tool_definitions()?, next_cursor: None };
                serde_json::to_value(result).map_err(|e| Error::protocol(ErrorCode::InternalError, e.to_string()))
            },
            "tools/call" => {
                let req: CallToolRequest = params.and_then(|v| serde_json::from_value(v).ok())
                    .ok_or(Error::protocol(ErrorCode::InvalidParams, "Missing params"))?;

                let text = self.call_tool(&req.name, req.arguments).await?;

                let result = ToolResult {
                    content: Vec::new(),
                    structured_content: Some(json!([
                        { "type": "text", "text": text }
                    ])),
                };

                serde_json::to_value(result).map_err(|e| Error::protocol(ErrorCode::InternalError, e.to_string()))
            },
            _ => Err(Error::protocol(ErrorCode::MethodNotFound, method.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StaticFetcher;
    use crate::storage::SqliteStore;

    fn service() -> McpService {
        let doc = json!({
            "info": {"title": "Petstore", "version": "2.0"},
            "paths": {
                "/pets": {
                    "get": {
                        "summary": "List pets",
                        "tags": ["pets"],
                        "parameters": [{"name": "limit", "in": "query", "schema": {"type": "integer"}}]
                    }
                }
            },
            "components": {
                "schemas": {
                    "Pet": {
                        "properties": {
                            "name": {"type": "string"},
                            "owner": {"$ref": "#/components/schemas/User"}
                        },
                        "required": ["name"]
                    }
                }
            }
        });
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let ingestor = Arc::new(Ingestor::new(store, Arc::new(StaticFetcher::new(doc))));
        McpService::new(ingestor, "http://localhost:8080/v3/api-docs")
    }

    #[tokio::test]
    async fn test_tools_list() {
        let result = service().handle_method("tools/list", None).await.unwrap();
        let names: Vec<&str> = result["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            ["sync_swagger", "list_endpoints", "get_endpoint_details", "get_schema", "list_versions"]
        );
    }

    #[tokio::test]
    async fn test_sync_then_query() {
        let svc = service();
        let text = svc.call_tool("sync_swagger", None).await.unwrap();
        assert!(text.contains("Version: 2.0"));

        let text = svc
            .call_tool("list_endpoints", Some(json!({"tag": "pet", "method": "get"})))
            .await
            .unwrap();
        assert!(text.contains("GET /pets"));

        let text = svc
            .call_tool("get_schema", Some(json!({"version": "2.0", "schema_name": "Pet"})))
            .await
            .unwrap();
        assert!(text.contains("[✓] name: string"));
        assert!(text.contains("[ ] owner: → User"));

        let text = svc.call_tool("list_versions", None).await.unwrap();
        assert!(text.contains("Version: 2.0"));
    }

    #[tokio::test]
    async fn test_empty_results_are_messages() {
        let svc = service();
        assert_eq!(
            svc.call_tool("list_endpoints", None).await.unwrap(),
            "No endpoints found."
        );
        assert_eq!(
            svc.call_tool("get_endpoint_details", Some(json!({"endpoint_id": 99})))
                .await
                .unwrap(),
            "Endpoint with ID 99 not found."
        );
    }

    #[tokio::test]
    async fn test_invalid_arguments() {
        let svc = service();
        assert!(svc
            .call_tool("list_endpoints", Some(json!({"method": "FETCH"})))
            .await
            .is_err());
        assert!(svc.call_tool("get_schema", Some(json!({"version": "2.0"}))).await.is_err());
        assert!(svc.call_tool("no_such_tool", None).await.is_err());
    }

    #[tokio::test]
    async fn test_tools_call_wraps_text() {
        let svc = service();
        let result = svc
            .handle_method(
                "tools/call",
                Some(json!({"name": "list_versions", "arguments": {}})),
            )
            .await
            .unwrap();
        let content = result
            .get("structuredContent")
            .or_else(|| result.get("structured_content"))
            .unwrap();
        assert_eq!(content[0]["text"], "No API versions stored.");
    }
}
