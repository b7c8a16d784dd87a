// ============================================================================
// Contrat de la primitive de rendu
// ============================================================================
// Le moteur de graphique lui-même est un collaborateur externe. Ce module
// définit uniquement ce qu'on attend de lui : créer des vues, y ajouter des
// séries, charger des données, et lire/écrire la fenêtre visible.
//
// CONCEPTS RUST :
// 1. Traits : équivalent d'une interface, implémentée par chaque backend
// 2. Box<dyn Trait> : objet trait, permet de stocker des vues de types variés
// 3. Box<dyn FnMut> : callback stocké par la vue (pattern observer)
// ============================================================================

use anyhow::Result;

use crate::models::{Candle, LogicalRange, RenderKind, RenderPoint};

/// Identifiant d'une série à l'intérieur d'une vue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesId(pub u64);

/// Identifiant d'un abonnement aux changements de fenêtre visible
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Callback appelé quand la fenêtre visible d'une vue change
pub type RangeListener = Box<dyn FnMut(Option<LogicalRange>)>;

/// Conteneur d'une vue (équivalent d'un élément DOM)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub id: String,
    /// Largeur disponible, partagée par toutes les vues
    pub width: u16,
}

impl Container {
    pub fn new(id: impl Into<String>, width: u16) -> Self {
        Self { id: id.into(), width }
    }
}

/// Options de création d'une vue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    pub width: u16,
    pub height: u16,
}

/// Options d'une série de ligne ou d'histogramme
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesOptions {
    pub title: String,
    pub color: String,
    pub line_width: f64,
}

/// Couleurs d'une série de chandelles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleStyle {
    pub up_color: String,
    pub down_color: String,
}

impl Default for CandleStyle {
    fn default() -> Self {
        Self {
            up_color: "#26a69a".to_string(),
            down_color: "#ef5350".to_string(),
        }
    }
}

/// Fabrique de vues
pub trait ChartRenderer {
    fn create_view(&mut self, container: &Container, options: &ViewOptions) -> Result<Box<dyn ChartView>>;
}

/// Une vue de graphique (un pane)
pub trait ChartView {
    fn add_line_series(&mut self, options: &SeriesOptions) -> Result<SeriesId>;
    fn add_histogram_series(&mut self, options: &SeriesOptions) -> Result<SeriesId>;
    fn add_candlestick_series(&mut self, style: &CandleStyle) -> Result<SeriesId>;

    fn set_series_data(&mut self, series: SeriesId, points: &[RenderPoint]) -> Result<()>;
    fn set_candle_data(&mut self, series: SeriesId, candles: &[Candle]) -> Result<()>;
    fn remove_series(&mut self, series: SeriesId) -> Result<()>;

    fn visible_logical_range(&self) -> Option<LogicalRange>;
    fn set_visible_logical_range(&mut self, range: LogicalRange) -> Result<()>;

    fn subscribe_visible_range_change(&mut self, listener: RangeListener) -> SubscriptionId;
    fn unsubscribe_visible_range_change(&mut self, subscription: SubscriptionId);

    fn fit_content(&mut self) -> Result<()>;
    /// Équivalent de `applyOptions({ width })`
    fn apply_width(&mut self, width: u16) -> Result<()>;
    /// Détruit la vue ; les appels suivants échouent
    fn remove(&mut self);

    /// Ajoute une série selon son type de rendu
    ///
    /// CONCEPT RUST : méthode par défaut dans un trait
    /// - Les implémentations n'ont pas à la redéfinir
    /// - Le match sur l'enum remplace la comparaison de strings
    fn add_series(&mut self, kind: RenderKind, options: &SeriesOptions) -> Result<SeriesId> {
        match kind {
            RenderKind::Histogram => self.add_histogram_series(options),
            RenderKind::Line => self.add_line_series(options),
        }
    }
}
