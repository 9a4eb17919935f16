use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the settings file kept at the vault root
pub const SETTINGS_FILE_NAME: &str = ".office-markdown.json";

/// User settings for the conversion glue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConverterSettings {
    /// Convert newly created office files automatically
    pub auto_convert: bool,
    /// Folder for converted notes; empty means next to the source file
    pub output_folder: String,
    pub open_preview: bool,
    pub save_markdown: bool,
    /// Delay between a file appearing and its automatic conversion
    pub auto_convert_delay_ms: u64,
}

impl Default for ConverterSettings {
    fn default() -> Self {
        Self {
            auto_convert: true,
            output_folder: String::new(),
            open_preview: true,
            save_markdown: true,
            auto_convert_delay_ms: 500,
        }
    }
}

impl ConverterSettings {
    /// Load settings, falling back to defaults for a missing file or missing keys
    pub async fn load(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("Invalid settings: {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(raw)?)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write settings: {}", path.display()))
    }
}
