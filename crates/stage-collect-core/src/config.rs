use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, StageCollectError};
use crate::stage::{StageStore, StagesConfig, DEFAULT_ARTIFACT_DIR};

pub const CONFIG_FILE: &str = "stage-collect.toml";

/// Placeholder in `[mappings]` values replaced with `general.item_name`
pub const ITEM_NAME_PLACEHOLDER: &str = "[案件名]";

/// Default config template with rich comments
const DEFAULT_CONFIG_TEMPLATE: &str = r#"# stage-collect configuration file

[general]
# Working tree to scan (overridden by --source)
# source_root = "/path/to/teams/サンプル"

# Delivery tree to populate (overridden by --dest)
# destination_root = "/path/to/delivery/サンプル"

# project_name = "プロジェクト"
# item_name = "案件"
# delivery_year = 2025
# delivery_quarter = "Q1"

# Folder holding review/evidence documents, in both trees
# Default: "artifact"
artifact_dir = "成果物"

[mappings]
# Named paths; "[案件名]" is replaced with general.item_name
# delivery = "納品物/[案件名]"

# Stage folders and the filename prefixes collected from them.
# Matching is case-insensitive; the first matching prefix wins.
# When no stages are defined the builtin table is used.
[stages."010.調査"]
top_level = ["調査検討書_"]
artifact = ["010_レビューチェックリスト_", "レビュー記録表_調査_"]

[stages."020.設計"]
top_level = ["機能設計書_"]
artifact = ["020_レビューチェックリスト_", "レビュー記録表_設計_"]

[stages."030.UD作成"]
top_level = ["単体試験仕様書_"]
artifact = ["030_レビューチェックリスト_", "レビュー記録表_UD作成_"]
"#;

/// Whole configuration file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub mappings: BTreeMap<String, String>,

    #[serde(default)]
    pub stages: StagesConfig,
}

/// `[general]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    #[serde(default)]
    pub source_root: Option<PathBuf>,
    #[serde(default)]
    pub destination_root: Option<PathBuf>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub item_name: Option<String>,
    #[serde(default)]
    pub delivery_year: Option<i32>,
    #[serde(default)]
    pub delivery_quarter: Option<String>,

    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,
}

fn default_artifact_dir() -> String {
    DEFAULT_ARTIFACT_DIR.to_string()
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            source_root: None,
            destination_root: None,
            project_name: None,
            item_name: None,
            delivery_year: None,
            delivery_quarter: None,
            artifact_dir: default_artifact_dir(),
        }
    }
}

impl Config {
    /// Load config from an explicit path.
    ///
    /// A missing file or a file that does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(StageCollectError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(|e| StageCollectError::ConfigParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if config.general.artifact_dir.trim().is_empty() {
            return Err(StageCollectError::ConfigParse {
                path: path.to_path_buf(),
                message: "general.artifact_dir must not be empty".to_string(),
            });
        }

        // Surface invalid stage definitions at load time
        config.stage_store()?;
        Ok(config)
    }

    /// Write the commented template unless a file already exists
    pub fn init(path: &Path) -> Result<bool> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, DEFAULT_CONFIG_TEMPLATE)?;
        Ok(true)
    }

    /// Stage rules: the configured stages, or the builtin table when none are configured
    pub fn stage_store(&self) -> Result<StageStore> {
        if self.stages.is_empty() {
            Ok(StageStore::builtin())
        } else {
            StageStore::from_config(&self.stages)
        }
    }

    /// `[mappings]` with the item-name placeholder expanded
    pub fn resolved_mappings(&self) -> BTreeMap<String, PathBuf> {
        self.mappings
            .iter()
            .map(|(key, value)| {
                let resolved = match &self.general.item_name {
                    Some(item) => value.replace(ITEM_NAME_PLACEHOLDER, item),
                    None => value.clone(),
                };
                (key.clone(), PathBuf::from(resolved))
            })
            .collect()
    }

    /// List general settings and resolved mappings as key/value pairs
    pub fn list(&self) -> Vec<(String, String)> {
        let general = &self.general;
        let show_path = |p: &Option<PathBuf>| {
            p.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        };

        let mut items = vec![
            ("general.source_root".to_string(), show_path(&general.source_root)),
            (
                "general.destination_root".to_string(),
                show_path(&general.destination_root),
            ),
            (
                "general.project_name".to_string(),
                general.project_name.clone().unwrap_or_default(),
            ),
            (
                "general.item_name".to_string(),
                general.item_name.clone().unwrap_or_default(),
            ),
            (
                "general.delivery_year".to_string(),
                general
                    .delivery_year
                    .map(|y| y.to_string())
                    .unwrap_or_default(),
            ),
            (
                "general.delivery_quarter".to_string(),
                general.delivery_quarter.clone().unwrap_or_default(),
            ),
            ("general.artifact_dir".to_string(), general.artifact_dir.clone()),
        ];

        for (key, path) in self.resolved_mappings() {
            items.push((format!("mappings.{}", key), path.display().to_string()));
        }

        items
    }
}
