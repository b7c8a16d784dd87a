// ============================================================================
// ChartApplication : orchestration du chargement
// ============================================================================
// Enchaîne toute la chaîne de rendu :
//
//   source -> sanitizer -> pane assigner -> pane manager (vues)
//          -> series router -> line adapter -> set_series_data
//          -> synchronisation des fenêtres -> fit content
//
// Et `App` : l'état de l'interface terminal autour de l'application
// (focus, confirmation de sortie, message de statut).
//
// PATTERN : "Application State"
// - L'UI lit l'état via les accesseurs
// - Toutes les modifications passent par les méthodes
// ============================================================================

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use tracing::{debug, error, info, instrument, warn};

use crate::api::ChartDataSource;
use crate::chart::{
    CandleSanitizer, CandleStyle, ChartRenderer, Container, LineSeriesAdapter, PaneAssigner,
    PaneAssignment, PaneManager, SeriesConfig, SeriesOptions, SeriesRouter, MAIN_PANE,
};
use crate::config::AppConfig;
use crate::models::{
    Candle, IndicatorSeries, LogicalRange, Metadata, OverrideFields, PaneConfig, PlotPoint,
    RenderKind, SeriesStyle, UiConfig,
};
use crate::trades::TradeTable;

/// Identifiant du conteneur principal
pub const MAIN_CONTAINER: &str = "main-chart";

/// Disposition des panes à créer
#[derive(Debug, Clone, PartialEq)]
pub struct PaneLayout {
    pub main: PaneConfig,
    /// Panes auxiliaires, dans l'ordre de création
    pub auxiliary: Vec<(String, PaneConfig)>,
}

/// Tout ce qui a été chargé par `initialize()`
#[derive(Debug, Clone)]
pub struct LoadedChart {
    pub metadata: Metadata,
    /// Chandelles canoniques, triées par temps
    pub candles: Vec<Candle>,
    pub assignment: PaneAssignment,
    /// Configuration finale de chaque série d'indicateur
    pub series: BTreeMap<String, SeriesConfig>,
    pub trades: TradeTable,
}

/// Application graphique
///
/// CONCEPT RUST : Générique sur la source
/// - `S: ChartDataSource` : fichier, HTTP ou mock de test
/// - Résolu à la compilation, pas de Box<dyn> nécessaire
pub struct ChartApplication<S> {
    source: S,
    config: AppConfig,
    panes: PaneManager,
    router: SeriesRouter,
    adapter: LineSeriesAdapter,
    chart: Option<LoadedChart>,
    width: u16,
}

impl<S: ChartDataSource> ChartApplication<S> {
    pub fn new(source: S, renderer: Box<dyn ChartRenderer>, config: AppConfig) -> Self {
        let width = config.container_width;
        Self {
            source,
            config,
            panes: PaneManager::new(renderer),
            router: SeriesRouter::new(),
            adapter: LineSeriesAdapter::new(),
            chart: None,
            width,
        }
    }

    /// Charge les données et construit tous les panes
    ///
    /// Les erreurs de la source ou de la primitive de rendu sont propagées.
    /// Les données invalides sont écartées sans erreur.
    #[instrument(skip(self))]
    pub async fn initialize(&mut self) -> Result<()> {
        let data = self
            .source
            .load_chart_data()
            .await
            .context("Failed to load chart data")?;
        let overrides = self
            .source
            .load_strategy_config(data.metadata.strategy_name())
            .await;

        let mut candles = CandleSanitizer::new().sanitize(Some(&data.candlestick));
        candles.sort_by_key(|c| c.time);

        let assigner = PaneAssigner::new(&candles, self.config.classifier);
        let assignment = assigner.assign_all(&data.indicators, overrides.as_ref());

        let layout = build_pane_layout(&assignment, &data.ui, &self.config);
        self.create_views(&layout)?;
        self.load_candles(&candles)?;

        let mut series = BTreeMap::new();
        for (key, indicator) in &data.indicators {
            let pane = assignment.get(key).map(String::as_str).unwrap_or(MAIN_PANE);
            let fields = overrides.as_ref().and_then(|o| o.get(key)).and_then(|o| o.fields());
            let config = series_config(key, indicator, pane, fields, &self.config);

            self.load_indicator(key, indicator, &config)?;
            series.insert(key.clone(), config);
        }

        let trades = TradeTable::build(data.strategy.as_ref(), &candles);

        self.panes.synchronize();
        self.panes.fit_content();

        info!(
            candles = candles.len(),
            indicators = series.len(),
            panes = self.panes.list_views().len(),
            trades = trades.rows.len(),
            "Chart initialized"
        );

        self.chart = Some(LoadedChart {
            metadata: data.metadata,
            candles,
            assignment,
            series,
            trades,
        });
        Ok(())
    }

    /// Détruit toutes les vues puis recharge tout
    pub async fn refresh(&mut self) -> Result<()> {
        info!("Refreshing chart");
        self.panes.teardown();
        self.router.clear();
        self.chart = None;
        self.initialize().await
    }

    fn create_views(&mut self, layout: &PaneLayout) -> Result<()> {
        self.panes
            .create_main_view(Container::new(MAIN_CONTAINER, self.width), &layout.main)?;
        for (name, config) in &layout.auxiliary {
            self.panes.create_auxiliary_view(name, config)?;
        }
        Ok(())
    }

    fn load_candles(&mut self, candles: &[Candle]) -> Result<()> {
        let view = self
            .panes
            .get_view_mut(MAIN_PANE)
            .context("Main view missing")?;

        let id = view
            .chart
            .add_candlestick_series(&CandleStyle::default())
            .context("Failed to add candlestick series")?;
        view.chart
            .set_candle_data(id, candles)
            .context("Failed to load candlestick data")?;

        debug!(candles = candles.len(), "Loaded candlestick series");
        Ok(())
    }

    fn load_indicator(&mut self, key: &str, indicator: &IndicatorSeries, config: &SeriesConfig) -> Result<()> {
        let Some(handle) = self.router.route(&mut self.panes, key, config)? else {
            error!(series = %key, "Failed to create series");
            return Ok(());
        };

        let color = config.options.color.as_str();
        let points: Vec<PlotPoint> = indicator
            .data
            .iter()
            .map(|p| PlotPoint::new(p.time, p.value, p.is_displayed().then_some(color)))
            .collect();

        let rendered = self.adapter.adapt(&points);
        if rendered.is_empty() {
            debug!(series = %key, "No visible points, series left empty");
            return Ok(());
        }

        let view = self
            .panes
            .get_view_mut(&handle.pane)
            .with_context(|| format!("Pane '{}' disappeared", handle.pane))?;
        view.chart
            .set_series_data(handle.id, &rendered)
            .with_context(|| format!("Failed to load data for series '{key}'"))?;
        Ok(())
    }

    /// Frontière de frame : à appeler à chaque tick de la boucle hôte
    pub fn on_frame(&mut self) -> usize {
        self.panes.on_frame()
    }

    /// Nouvelle largeur du conteneur, appliquée à toutes les vues
    pub fn resize(&mut self, width: u16) {
        if width == self.width {
            return;
        }
        self.width = width;
        self.panes.resize(width);
        debug!(width, "Resized panes");
    }

    pub fn fit_content(&mut self) {
        self.panes.fit_content();
    }

    /// Décale la fenêtre visible d'un pane (déclenche la synchronisation)
    pub fn pan(&mut self, pane: &str, bars: f64) -> Result<()> {
        self.update_range(pane, |range| range.shifted(bars))
    }

    /// Zoome la fenêtre visible d'un pane autour de son bord droit
    pub fn zoom(&mut self, pane: &str, factor: f64) -> Result<()> {
        self.update_range(pane, |range| range.zoomed(factor))
    }

    fn update_range(&mut self, pane: &str, f: impl FnOnce(LogicalRange) -> LogicalRange) -> Result<()> {
        let Some(view) = self.panes.get_view_mut(pane) else {
            warn!(pane = %pane, "Unknown pane");
            return Ok(());
        };
        let Some(range) = view.chart.visible_logical_range() else {
            return Ok(());
        };
        view.chart
            .set_visible_logical_range(f(range))
            .with_context(|| format!("Failed to update range of pane '{pane}'"))
    }

    pub fn panes(&self) -> &PaneManager {
        &self.panes
    }

    pub fn router(&self) -> &SeriesRouter {
        &self.router
    }

    pub fn chart(&self) -> Option<&LoadedChart> {
        self.chart.as_ref()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Pane principal + un pane auxiliaire par pane non-main assigné
pub fn build_pane_layout(assignment: &PaneAssignment, ui: &UiConfig, config: &AppConfig) -> PaneLayout {
    let mut auxiliary: Vec<(String, PaneConfig)> = Vec::new();

    for pane in assignment.values() {
        if pane == MAIN_PANE || auxiliary.iter().any(|(name, _)| name == pane) {
            continue;
        }
        let pane_config = ui.panes.get(pane).copied().unwrap_or(config.indicator_pane);
        auxiliary.push((pane.clone(), pane_config));
    }

    PaneLayout {
        main: config.main_pane,
        auxiliary,
    }
}

/// Fusionne le style déclaré et les champs d'override
///
/// Un override portant un `style` remplace les champs correspondants du
/// style déclaré.
pub fn merge_style(declared: &SeriesStyle, fields: Option<&OverrideFields>) -> SeriesStyle {
    let mut style = declared.clone();
    if let Some(fields) = fields.filter(|f| f.style.is_some()) {
        style.kind = fields.style.clone();
        if fields.color.is_some() {
            style.color = fields.color.clone();
        }
        if fields.line_width.is_some() {
            style.line_width = fields.line_width;
        }
    }
    style
}

/// Configuration finale d'une série d'indicateur
///
/// - couleur : style (fusionné) > couleur d'override > défaut
/// - épaisseur : style > défaut
/// - titre : titre de l'indicateur > clé
pub fn series_config(
    key: &str,
    indicator: &IndicatorSeries,
    pane: &str,
    fields: Option<&OverrideFields>,
    config: &AppConfig,
) -> SeriesConfig {
    let style = merge_style(&indicator.style, fields);

    let color = style
        .color
        .clone()
        .or_else(|| fields.and_then(|f| f.color.clone()))
        .unwrap_or_else(|| config.default_series_color.clone());
    let line_width = style
        .line_width
        .filter(|w| w.is_finite() && *w > 0.0)
        .unwrap_or(config.default_line_width);

    SeriesConfig {
        chart: Some(pane.to_string()),
        kind: RenderKind::from_style(style.kind.as_deref()),
        options: SeriesOptions {
            title: indicator.title.clone().unwrap_or_else(|| key.to_string()),
            color,
            line_width,
        },
    }
}

// ============================================================================
// App : état de l'interface terminal
// ============================================================================

/// État de l'interface autour d'une ChartApplication
pub struct App<S> {
    pub chart: ChartApplication<S>,

    /// Indique si l'application doit continuer à tourner
    pub running: bool,

    /// Two-step quit : première pression de 'q' => confirmation
    pub confirm_quit: bool,

    /// Index du pane qui reçoit le pan/zoom clavier
    pub focused: usize,

    /// Dernier message affiché dans la barre de statut
    pub status: Option<String>,
}

impl<S: ChartDataSource> App<S> {
    pub fn new(chart: ChartApplication<S>) -> Self {
        Self {
            chart,
            running: true,
            confirm_quit: false,
            focused: 0,
            status: None,
        }
    }

    /// Nom du pane qui a le focus
    pub fn focused_pane(&self) -> Option<&str> {
        self.chart.panes().list_views().get(self.focused).copied()
    }

    /// Passe le focus au pane suivant (boucle)
    pub fn focus_next(&mut self) {
        let count = self.chart.panes().list_views().len();
        if count > 0 {
            self.focused = (self.focused + 1) % count;
        }
    }

    pub fn pan(&mut self, bars: f64) {
        let Some(pane) = self.focused_pane().map(str::to_string) else {
            return;
        };
        if let Err(e) = self.chart.pan(&pane, bars) {
            warn!(error = %e, "Pan failed");
            self.status = Some(format!("Error: {e}"));
        }
    }

    pub fn zoom(&mut self, factor: f64) {
        let Some(pane) = self.focused_pane().map(str::to_string) else {
            return;
        };
        if let Err(e) = self.chart.zoom(&pane, factor) {
            warn!(error = %e, "Zoom failed");
            self.status = Some(format!("Error: {e}"));
        }
    }

    /// Appelé à chaque tick de la boucle d'événements
    pub fn tick(&mut self) {
        self.chart.on_frame();
    }

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn cancel_quit(&mut self) {
        self.confirm_quit = false;
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Après un refresh, les panes peuvent avoir changé
    pub fn clamp_focus(&mut self) {
        let count = self.chart.panes().list_views().len();
        if self.focused >= count {
            self.focused = 0;
        }
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
