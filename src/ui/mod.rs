// ============================================================================
// Module : ui
// ============================================================================
// Gère toute l'interface utilisateur (Terminal User Interface)
// ============================================================================

pub mod chart;      // Rendu d'un pane (canvas headless -> widget Chart)
pub mod dashboard;  // Rendu de l'écran complet
pub mod events;     // Gestion des événements clavier

// Re-exports pour simplifier les imports
pub use dashboard::render;
pub use events::{action_for, Action, Event, EventHandler};
