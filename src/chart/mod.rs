// ============================================================================
// Module : chart
// ============================================================================
// Cœur du graphique multi-panes :
// - sanitizer : chandelles brutes -> chandelles canoniques
// - pane_assigner : dans quel pane vit chaque indicateur
// - line_adapter : séries avec gaps -> flux de points de rendu
// - pane_manager : vues et synchronisation des fenêtres visibles
// - series_router : clé logique -> série concrète
// - renderer / headless : contrat de rendu et backend en mémoire
// ============================================================================

pub mod headless;
pub mod line_adapter;
pub mod pane_assigner;
pub mod pane_manager;
pub mod renderer;
pub mod sanitizer;
pub mod series_router;

pub use headless::{HeadlessRenderer, HeadlessView};
pub use line_adapter::LineSeriesAdapter;
pub use pane_assigner::{
    ranges_overlap, ClassifierConfig, PaneAssigner, PaneAssignment, Placement, ValueRange, INDICATOR_PANE,
    MAIN_PANE,
};
pub use pane_manager::{PaneManager, View};
pub use renderer::{
    CandleStyle, ChartRenderer, ChartView, Container, SeriesId, SeriesOptions, SubscriptionId,
    ViewOptions,
};
pub use sanitizer::{CandleSanitizer, DEFAULT_VOLUME};
pub use series_router::{SeriesConfig, SeriesHandle, SeriesRouter};
