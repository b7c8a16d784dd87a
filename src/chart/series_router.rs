// ============================================================================
// SeriesRouter : routage des séries vers leur pane
// ============================================================================
// Associe une clé logique (ex: "EMA9") à une série concrète créée dans la vue
// choisie par le PaneAssigner. Le router est le seul propriétaire de la map
// clé -> série.
// ============================================================================

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::pane_assigner::INDICATOR_PANE;
use super::pane_manager::PaneManager;
use super::renderer::{SeriesId, SeriesOptions};
use crate::models::RenderKind;

/// Configuration d'une série à router
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesConfig {
    /// Pane de destination (None = "indicator")
    pub chart: Option<String>,
    pub kind: RenderKind,
    pub options: SeriesOptions,
}

impl SeriesConfig {
    pub fn pane(&self) -> &str {
        self.chart.as_deref().unwrap_or(INDICATOR_PANE)
    }
}

/// Série créée : pane qui la contient + identifiant dans ce pane
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesHandle {
    pub pane: String,
    pub id: SeriesId,
}

/// Router des séries
#[derive(Debug, Default)]
pub struct SeriesRouter {
    series: BTreeMap<String, SeriesHandle>,
}

impl SeriesRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Crée la série `key` dans le pane demandé
    ///
    /// - pane inconnu : warning, `Ok(None)`, la map n'est pas modifiée
    /// - échec de la primitive de rendu : `Err`
    pub fn route(
        &mut self,
        panes: &mut PaneManager,
        key: &str,
        config: &SeriesConfig,
    ) -> Result<Option<SeriesHandle>> {
        let pane = config.pane();
        let Some(view) = panes.get_view_mut(pane) else {
            warn!(series = %key, pane = %pane, "Pane not found for series");
            return Ok(None);
        };

        let id = view
            .chart
            .add_series(config.kind, &config.options)
            .with_context(|| format!("Failed to add series '{key}' to pane '{pane}'"))?;

        let handle = SeriesHandle {
            pane: pane.to_string(),
            id,
        };
        debug!(series = %key, pane = %pane, kind = ?config.kind, "Routed series");
        self.series.insert(key.to_string(), handle.clone());
        Ok(Some(handle))
    }

    /// Déplace une série déjà routée vers un autre pane
    ///
    /// L'ancienne série est retirée de son pane, `config.chart` est mis à
    /// jour, puis la série est routée à nouveau. `Ok(None)` si la clé
    /// n'a jamais été routée.
    pub fn reroute_series(
        &mut self,
        panes: &mut PaneManager,
        key: &str,
        new_pane: &str,
        config: &mut SeriesConfig,
    ) -> Result<Option<SeriesHandle>> {
        let Some(old) = self.series.get(key).cloned() else {
            return Ok(None);
        };

        if let Some(view) = panes.get_view_mut(&old.pane) {
            view.chart
                .remove_series(old.id)
                .with_context(|| format!("Failed to remove series '{key}' from pane '{}'", old.pane))?;
        }
        self.series.remove(key);

        config.chart = Some(new_pane.to_string());
        self.route(panes, key, config)
    }

    pub fn get(&self, key: &str) -> Option<&SeriesHandle> {
        self.series.get(key)
    }

    /// Vue en lecture seule de la map clé -> série
    pub fn series_map(&self) -> &BTreeMap<String, SeriesHandle> {
        &self.series
    }

    pub fn clear(&mut self) {
        self.series.clear();
    }
}
