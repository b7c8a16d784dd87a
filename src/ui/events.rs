// ============================================================================
// Gestion des événements
// ============================================================================
// Lit les événements du terminal (clavier, redimensionnement) et les traduit
// en actions sur les panes.
//
// CONCEPTS RUST :
// 1. Enums avec variants : représenter différents types d'événements
// 2. Pattern matching : une touche -> une action
// 3. Error handling avec Result
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind};

/// Intervalle entre deux ticks (= deux frames)
const TICK_RATE: Duration = Duration::from_millis(100);

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Terminal redimensionné (largeur, hauteur)
    Resize(u16, u16),

    /// Tick régulier : frontière de frame
    Tick,
}

/// Actions déclenchées au clavier
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Quit,
    Cancel,
    /// Décalage de la fenêtre visible, en barres
    Pan(f64),
    /// Facteur de zoom (< 1 = zoom avant)
    Zoom(f64),
    FocusNext,
    Fit,
    Refresh,
}

/// Gestionnaire d'événements
#[derive(Debug, Default)]
pub struct EventHandler;

impl EventHandler {
    pub fn new() -> Self {
        Self
    }

    /// Lit le prochain événement (bloquant avec timeout)
    ///
    /// CONCEPT : Non-blocking I/O avec timeout
    /// - poll(timeout) attend au plus TICK_RATE
    /// - Si pas d'événement, retourne Ok(Event::Tick)
    pub fn next(&self) -> Result<Event> {
        if !event::poll(TICK_RATE)? {
            return Ok(Event::Tick);
        }

        match event::read()? {
            // Sur certains OS, on reçoit Press ET Release
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(Event::Key(key)),
            CrosstermEvent::Resize(width, height) => Ok(Event::Resize(width, height)),
            _ => Ok(Event::Tick),
        }
    }
}

/// Traduit une touche en action
///
/// - h / ← : pan gauche, l / → : pan droite (H / L : 10 barres)
/// - + / = : zoom avant, - : zoom arrière
/// - Tab : pane suivant, f : fit, r : refresh
/// - q : quitter (avec confirmation), Échap : annuler
pub fn action_for(event: &Event) -> Option<Action> {
    let Event::Key(key) = event else {
        return None;
    };

    let action = match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') => Action::Quit,
        KeyCode::Esc => Action::Cancel,
        KeyCode::Left | KeyCode::Char('h') => Action::Pan(-1.0),
        KeyCode::Right | KeyCode::Char('l') => Action::Pan(1.0),
        KeyCode::Char('H') => Action::Pan(-10.0),
        KeyCode::Char('L') => Action::Pan(10.0),
        KeyCode::Char('+') | KeyCode::Char('=') => Action::Zoom(0.8),
        KeyCode::Char('-') => Action::Zoom(1.25),
        KeyCode::Tab => Action::FocusNext,
        KeyCode::Char('f') => Action::Fit,
        KeyCode::Char('r') => Action::Refresh,
        _ => return None,
    };
    Some(action)
}

// ============================================================================
// Tests
// ============================================================================
