//! Overlay configuration loading.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Overlays served by the API, loaded from YAML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverlayConfig {
    #[serde(default)]
    pub overlays: Vec<OverlayDefinition>,
}

/// One configured overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayDefinition {
    /// URL-safe name used in routes.
    pub name: String,

    /// GeoTIFF location: `http(s)://`, `file://` or a local path.
    pub source: String,

    /// Decode in the background at startup.
    #[serde(default)]
    pub prewarm: bool,

    /// Report a loading indicator while user-initiated loads run.
    #[serde(default = "default_show_spinner")]
    pub show_spinner: bool,
}

fn default_show_spinner() -> bool {
    true
}

impl OverlayConfig {
    /// Load from a YAML file. A missing file yields an empty overlay set.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!(
                path = %path.display(),
                "Overlay config file does not exist, serving no overlays"
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read: {:?}", path))?;
        let config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse overlay config: {:?}", path))?;

        tracing::info!(
            path = %path.display(),
            overlays = config.overlays.len(),
            "Loaded overlay config"
        );
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for overlay in &self.overlays {
            if overlay.name.is_empty()
                || !overlay
                    .name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                anyhow::bail!("invalid overlay name {:?}", overlay.name);
            }
            if !seen.insert(overlay.name.as_str()) {
                anyhow::bail!("duplicate overlay name {:?}", overlay.name);
            }
            if overlay.source.trim().is_empty() {
                anyhow::bail!("overlay {:?} has an empty source", overlay.name);
            }
        }
        Ok(())
    }
}
