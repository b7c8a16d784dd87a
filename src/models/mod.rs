// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données de l'application
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module publique (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod candle;      // Chandelles brutes et canoniques
pub mod chart_data;  // Fichier chart-data.json complet
pub mod indicator;   // Séries d'indicateurs et overrides
pub mod render;      // Points de rendu et fenêtre logique

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use lazychart::models::candle::Candle;
// On peut faire : use lazychart::models::Candle;
pub use candle::{Candle, RawCandle};
pub use chart_data::{
    ChartData, Direction, Metadata, Overrides, PaneConfig, StrategyConfig, StrategyReport, Trade,
    UiConfig,
};
pub use indicator::{
    IndicatorOverride, IndicatorPoint, IndicatorSeries, OverrideFields, RenderKind, SeriesStyle,
};
pub use render::{LogicalRange, PlotPoint, RenderPoint, TRANSPARENT};
