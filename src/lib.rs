// ============================================================================
// LazyChart - Bibliothèque
// ============================================================================
// Graphique financier multi-panes : placement automatique des indicateurs,
// synchronisation des fenêtres visibles, rendu des séries avec gaps.
// ============================================================================

pub mod api;
pub mod app;
pub mod chart;
pub mod config;
pub mod models;
pub mod trades;
pub mod ui;
