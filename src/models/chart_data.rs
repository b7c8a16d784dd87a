// ============================================================================
// Structure : ChartData
// ============================================================================
// Représente le fichier chart-data.json produit par le moteur d'analyse :
// chandelles brutes, indicateurs, métadonnées, trades de la stratégie et
// configuration des panes.
//
// CONCEPT RUST : BTreeMap
// - Map triée par clé : l'ordre d'itération est déterministe
// - Important pour un rendu stable d'un chargement à l'autre
// ============================================================================

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::candle::RawCandle;
use super::indicator::{IndicatorOverride, IndicatorSeries};

/// Contenu complet d'un fichier de données de graphique
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartData {
    #[serde(default)]
    pub candlestick: Vec<RawCandle>,

    #[serde(default)]
    pub indicators: BTreeMap<String, IndicatorSeries>,

    #[serde(default)]
    pub metadata: Metadata,

    #[serde(default)]
    pub strategy: Option<StrategyReport>,

    #[serde(default)]
    pub ui: UiConfig,
}

/// Métadonnées affichées dans le header
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub strategy: Option<String>,

    /// ISO-8601 ou millisecondes depuis epoch
    #[serde(default)]
    pub timestamp: Option<Value>,
}

impl Metadata {
    /// Nom de la stratégie utilisé pour charger `<strategie>.config`
    pub fn strategy_name(&self) -> &str {
        self.strategy.as_deref().unwrap_or("strategy")
    }

    /// Date de dernière mise à jour, si parsable
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        match self.timestamp.as_ref()? {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
            _ => None,
        }
    }
}

/// Résultat de la stratégie (trades clos, trades ouverts, profit net)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyReport {
    #[serde(default)]
    pub trades: Vec<Trade>,
    #[serde(default)]
    pub open_trades: Vec<Trade>,
    #[serde(default)]
    pub net_profit: Option<f64>,
}

/// Direction d'un trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 pour long, -1 pour short
    pub fn multiplier(&self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Direction::Long => "LONG",
            Direction::Short => "SHORT",
        }
    }
}

/// Un trade de la stratégie
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    /// Timestamp d'entrée en millisecondes
    #[serde(default)]
    pub entry_time: Option<i64>,
    /// Index de la barre d'entrée (fallback si pas de entry_time)
    #[serde(default)]
    pub entry_bar: Option<usize>,
    pub direction: Direction,
    pub entry_price: f64,
    #[serde(default)]
    pub exit_price: Option<f64>,
    pub size: f64,
    #[serde(default)]
    pub profit: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Trade {
    pub fn is_open(&self) -> bool {
        self.status.as_deref() == Some("open")
    }
}

/// Configuration d'affichage
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default)]
    pub panes: BTreeMap<String, PaneConfig>,
}

/// Configuration d'un pane (hauteur, taille fixe ou non)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaneConfig {
    pub height: u16,
    #[serde(default)]
    pub fixed: bool,
}

impl PaneConfig {
    pub fn new(height: u16, fixed: bool) -> Self {
        Self { height, fixed }
    }
}

/// Fichier `<strategie>.config` : overrides par indicateur
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(default)]
    pub indicators: Option<BTreeMap<String, IndicatorOverride>>,
}

/// Overrides par clé d'indicateur
pub type Overrides = BTreeMap<String, IndicatorOverride>;
