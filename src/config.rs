use crate::{
    compare::{DEFAULT_MERGE_TOLERANCE, DEFAULT_SIMILARITY_TOLERANCE},
    enzymes::EnzymeCatalog,
    ladder::LadderCatalog,
};
use anyhow::{Context, Result};
use bandwagon_engine::{CutSiteLocator, DigestSettings, DigestionEngine, Topology};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = ".bandwagon.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Enzyme catalog replacing the built-in one.
    pub enzymes_path: Option<String>,
    /// Extra ladders, as a JSON catalog or a `size,migration` CSV file.
    pub ladders_path: Option<String>,
    /// Topology of sequences that do not declare one.
    pub default_topology: Topology,
    pub digest: DigestSettings,
    pub similarity_tolerance: f64,
    pub merge_tolerance: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enzymes_path: None,
            ladders_path: None,
            default_topology: Topology::Linear,
            digest: DigestSettings::default(),
            similarity_tolerance: DEFAULT_SIMILARITY_TOLERANCE,
            merge_tolerance: DEFAULT_MERGE_TOLERANCE,
        }
    }
}

impl Settings {
    pub fn load_from_path(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read settings file '{path}'"))?;
        serde_json::from_str(&text).with_context(|| format!("Could not parse settings '{path}'"))
    }

    pub fn save_to_path(&self, path: &str) -> Result<()> {
        let text = serde_json::to_string_pretty(self).context("Could not serialize settings")?;
        std::fs::write(path, text).with_context(|| format!("Could not write settings '{path}'"))
    }

    /// Settings from `path`, else from `.bandwagon.json` when present, else
    /// defaults.
    pub fn discover(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::load_from_path(DEFAULT_CONFIG_FILE)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn enzyme_catalog(&self) -> Result<EnzymeCatalog> {
        EnzymeCatalog::with_runtime_override(self.enzymes_path.as_deref())
    }

    pub fn ladder_catalog(&self) -> Result<LadderCatalog> {
        let mut catalog = LadderCatalog::default();
        if let Some(path) = &self.ladders_path {
            catalog.load_path(path)?;
        }
        Ok(catalog)
    }

    pub fn digestion_engine<L: CutSiteLocator>(&self, locator: L) -> DigestionEngine<L> {
        DigestionEngine::with_settings(locator, self.digest.clone())
    }
}
