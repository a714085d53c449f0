//! swagger-index CLI - Relational index over OpenAPI documents

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use swagger_index::config::{self, Overrides, Settings, SwaggerIndexConfig};
use swagger_index::model::EndpointFilter;
use swagger_index::server::{self, mcp::McpService, AppState};
use swagger_index::ui::{self, Icons};
use swagger_index::{render, HttpFetcher, Ingestor, SqliteStore};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "swagger-index")]
#[command(version)]
#[command(about = "Index OpenAPI/Swagger documents into SQLite and query them")]
#[command(long_about = r#"
swagger-index fetches an OpenAPI document, flattens it into versions,
endpoints, parameters and schemas, and answers queries over the result:
  • Filter endpoints by version, path, method and tag
  • Inspect endpoint parameters and schema definitions
  • Serve the index over HTTP or as MCP tools on stdio

Example usage:
  swagger-index init --url http://localhost:8080/v3/api-docs
  swagger-index sync
  swagger-index endpoints --tag pets --method get
  swagger-index schema 2.0 Pet
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the database file
    #[arg(short, long, global = true, env = "SWAGGER_INDEX_DB")]
    database: Option<PathBuf>,

    /// Path to the config file (default: swagger-index.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file and create the database directory
    Init {
        /// Document URL to record in the config
        #[arg(short, long)]
        url: Option<String>,

        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Fetch a document and replace its version in the index
    Sync {
        /// Document URL or local path
        #[arg(short, long, env = "SWAGGER_URL")]
        url: Option<String>,

        /// Store under this version instead of info.version
        #[arg(long)]
        version: Option<String>,

        /// Fetch timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List endpoints matching all given filters
    Endpoints {
        /// Exact version
        #[arg(long)]
        version: Option<String>,

        /// Substring of the path (case-sensitive)
        #[arg(short, long)]
        path: Option<String>,

        /// HTTP method
        #[arg(short, long)]
        method: Option<String>,

        /// Substring of the tag list
        #[arg(short, long)]
        tag: Option<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show one endpoint with its parameters
    Endpoint {
        /// Endpoint ID (see `endpoints`)
        id: i64,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show a schema definition
    Schema {
        /// API version
        version: String,

        /// Schema name
        name: String,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List stored versions, newest sync first
    Versions {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a version with all of its endpoints and schemas
    Delete {
        /// Version to delete
        version: String,
    },

    /// Show row counts
    Stats {
        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Serve the HTTP API
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: IpAddr,

        /// Document URL used by POST /sync when the request names none
        #[arg(short, long, env = "SWAGGER_URL")]
        url: Option<String>,
    },

    /// Run the MCP tool server on stdio
    Mcp {
        /// Document URL used by sync_swagger when the call names none
        #[arg(short, long, env = "SWAGGER_URL")]
        url: Option<String>,
    },
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open_store(database: &Path) -> anyhow::Result<Arc<SqliteStore>> {
    config::ensure_db_dir(database)?;
    tracing::debug!("Opening database {}", database.display());
    Ok(Arc::new(SqliteStore::open(database)?))
}

fn build_ingestor(settings: &Settings) -> anyhow::Result<Arc<Ingestor>> {
    let store = open_store(&settings.database)?;
    let fetcher = HttpFetcher::new(settings.timeout)?;
    Ok(Arc::new(Ingestor::new(store, Arc::new(fetcher))))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli).await {
        ui::error(&format!("{:#}", err));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries command output and the MCP channel
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("swagger_index=debug,tower_http=debug")
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let file_config = config::load_config(cli.config.as_deref())?;
    let resolve = |url: Option<String>, timeout_secs: Option<u64>| {
        Settings::resolve(
            Overrides {
                database: cli.database.clone(),
                url,
                timeout_secs,
            },
            file_config.as_ref(),
        )
    };

    match cli.command {
        Commands::Init { url, force } => {
            let config_path = cli.config.clone().unwrap_or_else(config::default_config_path);
            let settings = resolve(url, None);
            let new_config = SwaggerIndexConfig {
                database: Some(settings.database.display().to_string()),
                url: Some(settings.url.clone()),
                timeout_secs: Some(settings.timeout.as_secs()),
            };

            config::write_config(&config_path, &new_config, force)?;
            open_store(&settings.database)?;
            config::ensure_gitignore(Path::new("."))?;

            ui::success(&format!("Wrote {}", config_path.display()));
            ui::status(Icons::DATABASE, "Database", &settings.database.display().to_string());
            ui::status(Icons::LINK, "Document", &settings.url);
        }

        Commands::Sync { url, version, timeout, format } => {
            let settings = resolve(url, timeout);
            let ingestor = build_ingestor(&settings)?;

            let started = Instant::now();
            let spinner = ui::Spinner::new(&format!("Fetching {}", settings.url));
            let result = ingestor.sync(&settings.url, version.as_deref()).await;
            spinner.finish_and_clear();
            let summary = result?;

            if format == OutputFormat::Json {
                return print_json(&summary);
            }
            ui::success(&format!("Synced {} v{}", summary.title, summary.version));
            ui::summary_row("Endpoints:", &summary.endpoint_count.to_string());
            ui::summary_row("Schemas:  ", &summary.schema_count.to_string());
            ui::timing(&format!("{:.2?}", started.elapsed()));
        }

        Commands::Endpoints { version, path, method, tag, format } => {
            let settings = resolve(None, None);
            let store = open_store(&settings.database)?;
            let filter = EndpointFilter::from_parts(version, path, method.as_deref(), tag)?;
            let endpoints = store.list_endpoints(&filter)?;

            if format == OutputFormat::Json {
                return print_json(&endpoints);
            }
            if endpoints.is_empty() {
                ui::warn("No endpoints found.");
            } else {
                println!("{}", ui::endpoint_table(&endpoints));
                println!("{}", ui::dim(&format!("{} endpoint(s)", endpoints.len())));
            }
        }

        Commands::Endpoint { id, format } => {
            let settings = resolve(None, None);
            let store = open_store(&settings.database)?;
            let Some(details) = store.get_endpoint_details(id)? else {
                anyhow::bail!(render::endpoint_not_found(id));
            };

            if format == OutputFormat::Json {
                return print_json(&details);
            }
            println!(
                "{} {}",
                ui::method_badge(details.endpoint.method),
                details.endpoint.path
            );
            println!();
            println!("{}", render::endpoint_details(&details));
        }

        Commands::Schema { version, name, format } => {
            let settings = resolve(None, None);
            let store = open_store(&settings.database)?;
            let Some(schema) = store.get_schema(&version, &name)? else {
                anyhow::bail!(render::schema_not_found(&version, &name));
            };

            if format == OutputFormat::Json {
                return print_json(&schema);
            }
            ui::status(Icons::SCHEMA, &schema.name, &schema.type_name);
            if !schema.description.is_empty() {
                println!("{}", ui::muted(&schema.description));
            }
            if schema.properties.is_empty() {
                println!("{}", ui::dim("no properties"));
            } else {
                println!("{}", ui::property_table(&schema));
            }
        }

        Commands::Versions { format } => {
            let settings = resolve(None, None);
            let store = open_store(&settings.database)?;
            let versions = store.list_versions()?;

            if format == OutputFormat::Json {
                return print_json(&versions);
            }
            if versions.is_empty() {
                ui::warn("No API versions stored. Run `swagger-index sync` first.");
            } else {
                println!("{}", ui::version_table(&versions));
            }
        }

        Commands::Delete { version } => {
            let settings = resolve(None, None);
            let store = open_store(&settings.database)?;
            if store.delete_version(&version)? {
                ui::status(Icons::DEL, "Deleted version", &version);
            } else {
                ui::warn(&format!("Version {} is not stored", version));
            }
        }

        Commands::Stats { format } => {
            let settings = resolve(None, None);
            let store = open_store(&settings.database)?;
            let stats = store.stats()?;

            if format == OutputFormat::Json {
                return print_json(&stats);
            }
            ui::header(&format!("swagger-index statistics ({})", settings.database.display()));
            println!(
                "{}",
                ui::stats_table(&[
                    ("Versions", stats.versions.to_string().as_str()),
                    ("Endpoints", stats.endpoints.to_string().as_str()),
                    ("Parameters", stats.parameters.to_string().as_str()),
                    ("Schemas", stats.schemas.to_string().as_str()),
                ])
            );
        }

        Commands::Serve { port, host, url } => {
            let settings = resolve(url, None);
            let ingestor = build_ingestor(&settings)?;
            let state = Arc::new(AppState::new(ingestor, settings.url));
            server::start_server(SocketAddr::new(host, port), state).await?;
        }

        Commands::Mcp { url } => {
            let settings = resolve(url, None);
            let ingestor = build_ingestor(&settings)?;
            tracing::info!("Starting MCP server on stdio ({})", settings.database.display());
            McpService::new(ingestor, settings.url).run_stdio().await?;
        }
    }

    Ok(())
}
