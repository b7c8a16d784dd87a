// ============================================================================
// LazyChart - Visualiseur multi-panes dans le terminal
// ============================================================================
// Charge chart-data.json (répertoire local ou serveur HTTP), construit les
// panes synchronisés et les dessine avec ratatui.
//
// Usage :
//   lazychart [SOURCE] [CONFIG]
//   - SOURCE : répertoire contenant chart-data.json, ou URL http(s) (défaut ".")
//   - CONFIG : fichier JSON de configuration (optionnel)
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : chaque tick est une frontière de frame (synchronisation)
// 3. Async dans sync : tokio::runtime::Runtime pour charger les données
// ============================================================================

use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Runtime;
use tracing::{debug, error, info};

use lazychart::api::{ChartDataSource, FileSource, HttpSource};
use lazychart::app::{App, ChartApplication};
use lazychart::chart::HeadlessRenderer;
use lazychart::config::AppConfig;
use lazychart::ui::{action_for, render, Action, Event, EventHandler};

type Term = Terminal<CrosstermBackend<io::Stdout>>;

// ============================================================================
// Initialisation du logging
// ============================================================================
// Les println! ne fonctionnent pas une fois le TUI lancé : on log vers un
// fichier, avec rotation quotidienne.
// ============================================================================

/// Répertoire des logs : ~/.local/share/lazychart/logs (ou ./logs)
fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("lazychart").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Initialise le système de logging vers fichier
///
/// ```bash
/// tail -f ~/.local/share/lazychart/logs/lazychart.log.*
/// RUST_LOG=lazychart=trace lazychart ./out
/// ```
fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "lazychart.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lazychart=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

/// Fichier de configuration par défaut : ~/.config/lazychart/config.json
fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .map(|dir| dir.join("lazychart").join("config.json"))
        .unwrap_or_else(|| PathBuf::from("lazychart.json"))
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    let mut args = std::env::args().skip(1);
    let source = args.next().unwrap_or_else(|| ".".to_string());
    let config_path = args.next().map(PathBuf::from).unwrap_or_else(default_config_path);

    let config = AppConfig::load_or_default(&config_path)?;
    info!(source = %source, config = %config_path.display(), "LazyChart starting up");

    if source.starts_with("http://") || source.starts_with("https://") {
        run_with(HttpSource::new(source)?, config)
    } else {
        run_with(FileSource::new(source), config)
    }
}

/// Charge les données puis lance l'interface
fn run_with<S: ChartDataSource>(source: S, config: AppConfig) -> Result<()> {
    let runtime = Runtime::new().context("Failed to start tokio runtime")?;
    let renderer = HeadlessRenderer::new();

    let mut chart = ChartApplication::new(source, Box::new(renderer.clone()), config);
    println!("📊 Chargement des données...");
    runtime.block_on(chart.initialize())?;

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let mut app = App::new(chart);
    let result = run(&mut terminal, &mut app, &renderer, &runtime);

    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }
    result
}

// ============================================================================
// Event loop
// ============================================================================

fn run<S: ChartDataSource>(
    terminal: &mut Term,
    app: &mut App<S>,
    renderer: &HeadlessRenderer,
    runtime: &Runtime,
) -> Result<()> {
    let events = EventHandler::new();
    // Le terminal est déjà en raw mode : toute erreur remonte jusqu'à restore_terminal
    app.chart.resize(terminal.size()?.width);

    while app.is_running() {
        terminal.draw(|frame| render(frame, app, renderer))?;

        match events.next()? {
            // Frontière de frame : propagation des fenêtres visibles
            Event::Tick => app.tick(),
            Event::Resize(width, _) => app.chart.resize(width),
            event => {
                if let Some(action) = action_for(&event) {
                    handle_action(app, action, runtime);
                } else if app.confirm_quit {
                    app.cancel_quit();
                }
            }
        }
    }

    Ok(())
}

/// Applique une action clavier
///
/// Two-step quit : 'q' demande confirmation, 'q' à nouveau quitte,
/// toute autre touche annule.
fn handle_action<S: ChartDataSource>(app: &mut App<S>, action: Action, runtime: &Runtime) {
    if app.confirm_quit {
        match action {
            Action::Quit => app.quit(),
            _ => app.cancel_quit(),
        }
        return;
    }

    app.status = None;
    match action {
        Action::Quit => app.request_quit(),
        Action::Cancel => {}
        Action::Pan(bars) => app.pan(bars),
        Action::Zoom(factor) => app.zoom(factor),
        Action::FocusNext => app.focus_next(),
        Action::Fit => app.chart.fit_content(),
        Action::Refresh => {
            if let Err(e) = runtime.block_on(app.chart.refresh()) {
                error!(error = ?e, "Refresh failed");
                app.status = Some(format!("Refresh failed: {e}"));
            }
            app.clamp_focus();
        }
    }
}

// ============================================================================
// Terminal
// ============================================================================

/// Configure le terminal en mode TUI (raw mode + alternate screen)
fn setup_terminal() -> Result<Term> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

/// Restaure le terminal à son état normal
fn restore_terminal(terminal: &mut Term) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}
