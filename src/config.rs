use crate::constants;
use crate::error::{Result, SalesError};
use crate::pipeline::ingestion::SourceFormat;
use crate::types::CanonicalKey;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Input files, processed and concatenated in this order
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceConfig>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub report: ReportConfig,
    /// Extra header spellings per canonical key, merged into the default alias table
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub path: PathBuf,
    /// Inferred from the file extension when absent
    pub format: Option<SourceFormat>,
    /// Worksheet to read for spreadsheet sources; defaults to the first sheet
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_cleaned_csv")]
    pub cleaned_csv: PathBuf,
    pub report_json: Option<PathBuf>,
    pub rejections: Option<PathBuf>,
    #[serde(default)]
    pub include_extra_fields: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_top_customers")]
    pub top_customers: usize,
    #[serde(default = "default_preview_records")]
    pub preview_records: usize,
}

fn default_sources() -> Vec<SourceConfig> {
    [
        ("q1", constants::DEFAULT_CSV_SOURCE),
        ("q2", constants::DEFAULT_JSON_SOURCE),
        ("q3", constants::DEFAULT_SPREADSHEET_SOURCE),
    ]
    .into_iter()
    .map(|(name, path)| SourceConfig {
        name: name.to_string(),
        path: PathBuf::from(path),
        format: None,
        sheet: None,
    })
    .collect()
}

fn default_cleaned_csv() -> PathBuf {
    PathBuf::from(constants::DEFAULT_CLEANED_OUTPUT)
}

fn default_top_customers() -> usize {
    constants::DEFAULT_TOP_CUSTOMERS
}

fn default_preview_records() -> usize {
    constants::DEFAULT_PREVIEW_RECORDS
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            cleaned_csv: default_cleaned_csv(),
            report_json: None,
            rejections: None,
            include_extra_fields: false,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            top_customers: default_top_customers(),
            preview_records: default_preview_records(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            output: OutputConfig::default(),
            report: ReportConfig::default(),
            aliases: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(path).map_err(|e| {
            SalesError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let config = Self::from_toml_str(&config_content)?;
        info!(path = %path.display(), sources = config.sources.len(), "Loaded config");
        Ok(config)
    }

    /// Load an explicit config path, or fall back to the default file and then to built-in defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load(path);
        }

        let default_path = Path::new(constants::DEFAULT_CONFIG_PATH);
        if default_path.exists() {
            Self::load(default_path)
        } else {
            debug!("No config file found, using built-in defaults");
            Ok(Self::default())
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            return Err(SalesError::Config("at least one source is required".into()));
        }

        let mut seen = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(SalesError::Config("source name must not be empty".into()));
            }
            if !seen.insert(source.name.as_str()) {
                return Err(SalesError::Config(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
        }

        if self.report.top_customers == 0 {
            return Err(SalesError::Config("report.top_customers must be at least 1".into()));
        }

        self.alias_overrides().map(|_| ())
    }

    /// Configured alias additions keyed by canonical field
    pub fn alias_overrides(&self) -> Result<Vec<(CanonicalKey, Vec<String>)>> {
        self.aliases
            .iter()
            .map(|(key, variants)| {
                let key = key
                    .parse::<CanonicalKey>()
                    .map_err(|e| SalesError::Config(format!("[aliases]: {}", e)))?;
                Ok((key, variants.clone()))
            })
            .collect()
    }
}
