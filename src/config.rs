// ============================================================================
// Configuration de l'application
// ============================================================================
// Valeurs par défaut des panes et des séries, paramètres de l'heuristique
// de placement. Chargée depuis un fichier JSON optionnel ; chaque champ
// absent prend sa valeur par défaut.
//
// CONCEPT RUST : #[serde(default)] sur la struct
// - Un fichier partiel `{ "containerWidth": 160 }` suffit
// - Les autres champs viennent de `Default::default()`
// ============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chart::ClassifierConfig;
use crate::models::PaneConfig;

/// Couleur par défaut d'une série d'indicateur
pub const DEFAULT_SERIES_COLOR: &str = "#2196F3";

/// Épaisseur par défaut d'une ligne
pub const DEFAULT_LINE_WIDTH: f64 = 2.0;

/// Configuration globale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Pane principal (chandelles)
    pub main_pane: PaneConfig,
    /// Pane auxiliaire sans entrée dans `ui.panes`
    pub indicator_pane: PaneConfig,
    pub default_series_color: String,
    pub default_line_width: f64,
    pub classifier: ClassifierConfig,
    /// Largeur initiale du conteneur principal
    pub container_width: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            main_pane: PaneConfig::new(400, true),
            indicator_pane: PaneConfig::new(200, false),
            default_series_color: DEFAULT_SERIES_COLOR.to_string(),
            default_line_width: DEFAULT_LINE_WIDTH,
            classifier: ClassifierConfig::default(),
            container_width: 120,
        }
    }
}

impl AppConfig {
    /// Charge la configuration depuis un fichier JSON
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Fichier absent : configuration par défaut
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }
}
