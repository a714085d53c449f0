use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_URL: &str = "http://localhost:8080/v3/api-docs";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SwaggerIndexConfig {
    pub database: Option<String>,
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("swagger-index.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".swagger-index").join("swagger.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<SwaggerIndexConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: SwaggerIndexConfig = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &SwaggerIndexConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

/// Append `.swagger-index/` to the project's `.gitignore` unless listed
pub fn ensure_gitignore(project_root: &Path) -> anyhow::Result<()> {
    let gitignore_path = project_root.join(".gitignore");
    let entry = ".swagger-index/";

    let mut content = if gitignore_path.exists() {
        std::fs::read_to_string(&gitignore_path)?
    } else {
        String::new()
    };
    if content.lines().any(|line| line.trim() == entry) {
        return Ok(());
    }

    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }
    content.push_str(entry);
    content.push('\n');
    std::fs::write(&gitignore_path, content)?;
    Ok(())
}

/// Values given on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub database: Option<PathBuf>,
    pub url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Effective settings after layering overrides, config file and defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database: PathBuf,
    pub url: String,
    pub timeout: Duration,
}

impl Settings {
    pub fn resolve(overrides: Overrides, file: Option<&SwaggerIndexConfig>) -> Self {
        let file = file.cloned().unwrap_or_default();

        let database = overrides
            .database
            .or_else(|| file.database.map(PathBuf::from))
            .unwrap_or_else(|| default_database_path_in(Path::new(".")));
        let url = overrides
            .url
            .or(file.url)
            .unwrap_or_else(|| DEFAULT_URL.to_string());
        let timeout_secs = overrides
            .timeout_secs
            .or(file.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Self {
            database,
            url,
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}
