//! Mapper configuration
//!
//! Configuration is loaded from, in increasing precedence:
//! - Default values
//! - A configuration file (JSON, YAML or TOML)
//! - Environment variables (`FIELDMAP_GROUP_POLICY`, `FIELDMAP_DOC_ID`)

use crate::document::tree::DEFAULT_MAX_INDEX;
use crate::{Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Environment variable overriding [`MapperConfig::group_policy`]
pub const ENV_GROUP_POLICY: &str = "FIELDMAP_GROUP_POLICY";

/// Environment variable overriding [`MapperConfig::doc_id`]
pub const ENV_DOC_ID: &str = "FIELDMAP_DOC_ID";

/// What to do when a field group meets a target path with no collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldGroupPolicy {
    /// Write the first member and record a warning
    #[default]
    WarnAndSkip,
    /// Fail the mapping
    Strict,
}

impl fmt::Display for FieldGroupPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldGroupPolicy::WarnAndSkip => write!(f, "warn_and_skip"),
            FieldGroupPolicy::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for FieldGroupPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "warn_and_skip" | "warn" => Ok(FieldGroupPolicy::WarnAndSkip),
            "strict" => Ok(FieldGroupPolicy::Strict),
            other => Err(Error::configuration(format!(
                "unknown field group policy '{}'",
                other
            ))),
        }
    }
}

/// Serialization format of a configuration file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Detect the format from a file extension, defaulting to JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => ConfigFormat::Yaml,
            Some("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Json,
        }
    }
}

/// JSON output settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JsonOptions {
    /// Pretty-print rendered documents
    pub pretty: bool,
}

/// XML output settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct XmlOptions {
    /// Emit an `<?xml ...?>` declaration
    pub declaration: bool,

    /// Indent rendered documents
    pub pretty: bool,
}

/// Target document write settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteOptions {
    /// Largest collection index a write may address
    pub max_index: usize,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            max_index: DEFAULT_MAX_INDEX,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Document id stamped on fields and audits
    pub doc_id: Option<String>,

    /// Field group handling for non-collection targets
    pub group_policy: FieldGroupPolicy,

    /// Namespace prefix -> URI
    pub namespaces: BTreeMap<String, String>,

    pub json: JsonOptions,

    pub xml: XmlOptions,

    pub write: WriteOptions,
}

fn parse_failure(format: ConfigFormat, err: impl std::error::Error + Send + Sync + 'static) -> Error {
    Error::Configuration {
        message: format!("invalid {:?} configuration: {}", format, err),
        source: Some(anyhow::Error::new(err)),
    }
}

impl MapperConfig {
    /// Load configuration from a file, choosing the format by extension
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading mapper configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_str_with_format(&content, ConfigFormat::from_path(path))
    }

    pub fn from_str_with_format(content: &str, format: ConfigFormat) -> Result<Self> {
        match format {
            ConfigFormat::Json => serde_json::from_str(content).map_err(|e| parse_failure(format, e)),
            ConfigFormat::Yaml => serde_yaml::from_str(content).map_err(|e| parse_failure(format, e)),
            ConfigFormat::Toml => toml::from_str(content).map_err(|e| parse_failure(format, e)),
        }
    }

    /// Apply environment variable overrides
    pub fn merge_with_env(self) -> Result<Self> {
        self.merge_with_vars(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable source
    pub fn merge_with_vars(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(policy) = lookup(ENV_GROUP_POLICY) {
            self.group_policy = policy.parse()?;
        }
        if let Some(doc_id) = lookup(ENV_DOC_ID) {
            self.doc_id = Some(doc_id).filter(|id| !id.is_empty());
        }
        Ok(self)
    }

    /// Save configuration to a file, choosing the format by extension
    pub fn save(&self, path: &Path) -> Result<()> {
        let format = ConfigFormat::from_path(path);
        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Yaml => serde_yaml::to_string(self).map_err(|e| parse_failure(format, e))?,
            ConfigFormat::Toml => toml::to_string_pretty(self).map_err(|e| parse_failure(format, e))?,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        debug!("Saved mapper configuration to {}", path.display());
        Ok(())
    }
}

/// Builder for creating configurations programmatically
#[derive(Debug, Default)]
pub struct MapperConfigBuilder {
    config: MapperConfig,
}

impl MapperConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn doc_id(mut self, doc_id: impl Into<String>) -> Self {
        self.config.doc_id = Some(doc_id.into());
        self
    }

    pub fn group_policy(mut self, policy: FieldGroupPolicy) -> Self {
        self.config.group_policy = policy;
        self
    }

    pub fn namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.config.namespaces.insert(prefix.into(), uri.into());
        self
    }

    pub fn pretty_json(mut self, pretty: bool) -> Self {
        self.config.json.pretty = pretty;
        self
    }

    pub fn xml_declaration(mut self, declaration: bool) -> Self {
        self.config.xml.declaration = declaration;
        self
    }

    pub fn max_index(mut self, max_index: usize) -> Self {
        self.config.write.max_index = max_index;
        self
    }

    pub fn build(self) -> MapperConfig {
        self.config
    }
}
