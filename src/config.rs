//! Configuration module, loads the JSON configuration file.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Page size used when the configuration does not set one.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Configuration loading error
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "configuration error: {}", self.message)
    }
}

impl std::error::Error for ConfigError {}

impl ConfigError {
    pub fn new(message: String) -> Self {
        Self { message }
    }
}

/// Catalog configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Maximum number of revisions returned by one search
    pub page_size: usize,
    /// Logical entity name to database table name
    pub tables: HashMap<String, String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let mut tables = HashMap::new();
        tables.insert("WorkflowRevision".to_string(), "workflow_revision".to_string());
        tables.insert("GenericInformation".to_string(), "generic_information".to_string());
        tables.insert("Variable".to_string(), "variable".to_string());

        Self {
            page_size: DEFAULT_PAGE_SIZE,
            tables,
        }
    }
}

impl CatalogConfig {
    /// Loads the configuration from a JSON file. Missing keys keep their
    /// defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_ref = path.as_ref();

        if !path_ref.exists() {
            return Err(ConfigError::new(format!(
                "configuration file does not exist: {}",
                path_ref.display()
            )));
        }

        let content = fs::read_to_string(path_ref).map_err(|e| {
            ConfigError::new(format!(
                "cannot read configuration file {}: {}",
                path_ref.display(),
                e
            ))
        })?;

        let config: CatalogConfig = serde_json::from_str(&content).map_err(|e| {
            ConfigError::new(format!(
                "cannot parse JSON configuration file {}: {}",
                path_ref.display(),
                e
            ))
        })?;

        if config.page_size == 0 {
            return Err(ConfigError::new(format!(
                "page_size must be positive in {}",
                path_ref.display()
            )));
        }

        Ok(config)
    }

    /// Table name for an entity, falling back to its snake_case form.
    pub fn get_table_name(&self, entity: &str) -> String {
        self.tables
            .get(entity)
            .cloned()
            .unwrap_or_else(|| to_snake_case(entity))
    }
}

fn to_snake_case(name: &str) -> String {
    let mut snake = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                snake.push('_');
            }
            snake.extend(c.to_lowercase());
        } else {
            snake.push(c);
        }
    }
    snake
}
