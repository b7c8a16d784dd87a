// ============================================================================
// Backend de rendu en mémoire (headless)
// ============================================================================
// Implémente le contrat ChartRenderer / ChartView sans rien dessiner : chaque
// vue est un `Canvas` partagé qui garde ses séries, sa fenêtre visible et ses
// listeners. L'interface terminal lit ces canvases pour dessiner, et les
// tests s'en servent comme primitive simulée.
//
// CONCEPT RUST : Rc<RefCell<T>>
// - Rc : plusieurs propriétaires dans un seul thread (vue + renderer + UI)
// - RefCell : mutabilité vérifiée à l'exécution (borrow / borrow_mut)
// - Pas de Mutex : tout tourne dans un seul thread
// ============================================================================

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::{bail, Result};
use tracing::trace;

use super::renderer::{
    CandleStyle, ChartRenderer, ChartView, Container, RangeListener, SeriesId, SeriesOptions,
    SubscriptionId, ViewOptions,
};
use crate::models::{Candle, LogicalRange, RenderPoint};

/// Canvas partagé entre la vue, le renderer et l'UI
pub type CanvasHandle = Rc<RefCell<Canvas>>;

/// Type d'une série et ses options
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesKind {
    Line(SeriesOptions),
    Histogram(SeriesOptions),
    Candlestick(CandleStyle),
}

/// Données chargées dans une série
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesData {
    Points(Vec<RenderPoint>),
    Candles(Vec<Candle>),
}

/// Une série stockée dans un canvas
#[derive(Debug, Clone)]
pub struct SeriesEntry {
    pub kind: SeriesKind,
    pub data: SeriesData,
}

/// État d'une vue headless
pub struct Canvas {
    container: Container,
    height: u16,
    series: BTreeMap<SeriesId, SeriesEntry>,
    visible_range: Option<LogicalRange>,
    listeners: Vec<(SubscriptionId, RangeListener)>,
    /// Désabonnements reçus pendant un appel des listeners
    dispatching: bool,
    unsubscribed: Vec<SubscriptionId>,
    removed: bool,
    reject_range_updates: bool,
    range_updates: usize,
    next_id: u64,
}

impl Canvas {
    fn new(container: &Container, options: &ViewOptions) -> Self {
        Self {
            container: Container::new(container.id.clone(), options.width),
            height: options.height,
            series: BTreeMap::new(),
            visible_range: None,
            listeners: Vec::new(),
            dispatching: false,
            unsubscribed: Vec::new(),
            removed: false,
            reject_range_updates: false,
            range_updates: 0,
            next_id: 1,
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn series(&self) -> impl Iterator<Item = (&SeriesId, &SeriesEntry)> {
        self.series.iter()
    }

    pub fn series_entry(&self, id: SeriesId) -> Option<&SeriesEntry> {
        self.series.get(&id)
    }

    pub fn visible_range(&self) -> Option<LogicalRange> {
        self.visible_range
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Nombre de fenêtres appliquées via set_visible_logical_range
    pub fn range_updates(&self) -> usize {
        self.range_updates
    }

    /// Simule une vue qui refuse les mises à jour de fenêtre
    pub fn reject_range_updates(&mut self, reject: bool) {
        self.reject_range_updates = reject;
    }

    /// Échelle de temps : timestamps uniques triés de toutes les séries
    ///
    /// L'index logique d'une barre est sa position dans ce vecteur.
    pub fn time_scale(&self) -> Vec<i64> {
        let mut times: Vec<i64> = self
            .series
            .values()
            .flat_map(|entry| match &entry.data {
                SeriesData::Points(points) => points.iter().map(|p| p.time).collect::<Vec<_>>(),
                SeriesData::Candles(candles) => candles.iter().map(|c| c.time).collect(),
            })
            .collect();
        times.sort_unstable();
        times.dedup();
        times
    }

    fn series_mut(&mut self, id: SeriesId) -> Result<&mut SeriesEntry> {
        match self.series.get_mut(&id) {
            Some(entry) => Ok(entry),
            None => bail!("Series {:?} not found in view '{}'", id, self.container.id),
        }
    }

    fn ensure_alive(&self) -> Result<()> {
        if self.removed {
            bail!("View '{}' has been removed", self.container.id);
        }
        Ok(())
    }
}

/// Appelle les listeners du canvas avec sa fenêtre courante
///
/// Les listeners sont sortis du canvas pendant l'appel : un listener peut
/// donc relire le canvas sans double borrow. Ceux désabonnés entre-temps
/// (ou la vue détruite) ne sont pas réinstallés.
fn notify_listeners(canvas: &CanvasHandle) {
    let (range, mut listeners) = {
        let mut state = canvas.borrow_mut();
        state.dispatching = true;
        (state.visible_range, std::mem::take(&mut state.listeners))
    };

    for (_, listener) in listeners.iter_mut() {
        listener(range);
    }

    let mut state = canvas.borrow_mut();
    state.dispatching = false;
    let unsubscribed = std::mem::take(&mut state.unsubscribed);
    if state.removed {
        state.listeners.clear();
        return;
    }

    listeners.retain(|(id, _)| !unsubscribed.contains(id));
    let added = std::mem::replace(&mut state.listeners, listeners);
    state.listeners.extend(added);
}

/// Interaction utilisateur : fait défiler / zoomer un canvas
///
/// Identique à `set_visible_logical_range`, déclenche les listeners.
pub fn scroll_canvas(canvas: &CanvasHandle, range: LogicalRange) -> Result<()> {
    HeadlessView { canvas: canvas.clone() }.set_visible_logical_range(range)
}

/// Renderer headless : garde la trace de tous les canvases créés
#[derive(Clone, Default)]
pub struct HeadlessRenderer {
    canvases: Rc<RefCell<Vec<CanvasHandle>>>,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canvases encore vivants, dans l'ordre de création
    pub fn canvases(&self) -> Vec<CanvasHandle> {
        self.canvases
            .borrow()
            .iter()
            .filter(|c| !c.borrow().is_removed())
            .cloned()
            .collect()
    }

    /// Canvas vivant par identifiant de conteneur
    pub fn canvas(&self, container_id: &str) -> Option<CanvasHandle> {
        self.canvases()
            .into_iter()
            .find(|c| c.borrow().container().id == container_id)
    }
}

impl ChartRenderer for HeadlessRenderer {
    fn create_view(&mut self, container: &Container, options: &ViewOptions) -> Result<Box<dyn ChartView>> {
        let canvas = Rc::new(RefCell::new(Canvas::new(container, options)));

        let mut canvases = self.canvases.borrow_mut();
        // Les canvases détruits ne sont plus utiles
        canvases.retain(|c| !c.borrow().is_removed());
        canvases.push(canvas.clone());

        trace!(container = %container.id, width = options.width, height = options.height, "Created headless view");
        Ok(Box::new(HeadlessView { canvas }))
    }
}

/// Vue headless : simple poignée sur un canvas
pub struct HeadlessView {
    canvas: CanvasHandle,
}

impl HeadlessView {
    fn add(&mut self, kind: SeriesKind, data: SeriesData) -> Result<SeriesId> {
        let mut state = self.canvas.borrow_mut();
        state.ensure_alive()?;
        let id = SeriesId(state.next_id());
        state.series.insert(id, SeriesEntry { kind, data });
        Ok(id)
    }
}

impl ChartView for HeadlessView {
    fn add_line_series(&mut self, options: &SeriesOptions) -> Result<SeriesId> {
        self.add(SeriesKind::Line(options.clone()), SeriesData::Points(Vec::new()))
    }

    fn add_histogram_series(&mut self, options: &SeriesOptions) -> Result<SeriesId> {
        self.add(SeriesKind::Histogram(options.clone()), SeriesData::Points(Vec::new()))
    }

    fn add_candlestick_series(&mut self, style: &CandleStyle) -> Result<SeriesId> {
        self.add(SeriesKind::Candlestick(style.clone()), SeriesData::Candles(Vec::new()))
    }

    fn set_series_data(&mut self, series: SeriesId, points: &[RenderPoint]) -> Result<()> {
        let mut state = self.canvas.borrow_mut();
        state.ensure_alive()?;
        state.series_mut(series)?.data = SeriesData::Points(points.to_vec());
        Ok(())
    }

    fn set_candle_data(&mut self, series: SeriesId, candles: &[Candle]) -> Result<()> {
        let mut state = self.canvas.borrow_mut();
        state.ensure_alive()?;
        state.series_mut(series)?.data = SeriesData::Candles(candles.to_vec());
        Ok(())
    }

    fn remove_series(&mut self, series: SeriesId) -> Result<()> {
        let mut state = self.canvas.borrow_mut();
        state.ensure_alive()?;
        if state.series.remove(&series).is_none() {
            bail!("Series {:?} not found in view '{}'", series, state.container.id);
        }
        Ok(())
    }

    fn visible_logical_range(&self) -> Option<LogicalRange> {
        self.canvas.borrow().visible_range
    }

    fn set_visible_logical_range(&mut self, range: LogicalRange) -> Result<()> {
        {
            let mut state = self.canvas.borrow_mut();
            state.ensure_alive()?;
            if state.reject_range_updates {
                bail!("View '{}' rejected the visible range update", state.container.id);
            }
            state.visible_range = Some(range);
            state.range_updates += 1;
        }
        notify_listeners(&self.canvas);
        Ok(())
    }

    fn subscribe_visible_range_change(&mut self, listener: RangeListener) -> SubscriptionId {
        let mut state = self.canvas.borrow_mut();
        let id = SubscriptionId(state.next_id());
        state.listeners.push((id, listener));
        id
    }

    fn unsubscribe_visible_range_change(&mut self, subscription: SubscriptionId) {
        let mut state = self.canvas.borrow_mut();
        state.listeners.retain(|(id, _)| *id != subscription);
        if state.dispatching {
            state.unsubscribed.push(subscription);
        }
    }

    fn fit_content(&mut self) -> Result<()> {
        let bars = {
            let state = self.canvas.borrow();
            state.ensure_alive()?;
            state.time_scale().len()
        };
        if bars == 0 {
            return Ok(());
        }
        {
            let mut state = self.canvas.borrow_mut();
            state.visible_range = Some(LogicalRange::new(0.0, (bars - 1) as f64));
        }
        notify_listeners(&self.canvas);
        Ok(())
    }

    fn apply_width(&mut self, width: u16) -> Result<()> {
        let mut state = self.canvas.borrow_mut();
        state.ensure_alive()?;
        state.container.width = width;
        Ok(())
    }

    fn remove(&mut self) {
        let mut state = self.canvas.borrow_mut();
        state.removed = true;
        state.listeners.clear();
        state.series.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn options() -> SeriesOptions {
        SeriesOptions { title: "EMA".to_string(), color: "#fff".to_string(), line_width: 2.0 }
    }

    fn view(renderer: &mut HeadlessRenderer, id: &str) -> Box<dyn ChartView> {
        renderer
            .create_view(&Container::new(id, 80), &ViewOptions { width: 80, height: 20 })
            .unwrap()
    }

    #[test]
    fn test_series_lifecycle() {
        let mut renderer = HeadlessRenderer::new();
        let mut main = view(&mut renderer, "main-chart");

        let line = main.add_line_series(&options()).unwrap();
        main.set_series_data(line, &[RenderPoint::new(1, 1.0), RenderPoint::new(3, 2.0)]).unwrap();
        let candles = main.add_candlestick_series(&CandleStyle::default()).unwrap();
        main.set_candle_data(candles, &[Candle { time: 2, open: 1.0, high: 2.0, low: 1.0, close: 2.0, volume: 1.0 }])
            .unwrap();

        let canvas = renderer.canvas("main-chart").unwrap();
        assert_eq!(canvas.borrow().time_scale(), vec![1, 2, 3]);

        main.remove_series(line).unwrap();
        assert!(main.remove_series(line).is_err());
        assert_eq!(canvas.borrow().series().count(), 1);
    }

    #[test]
    fn test_listeners_fire_on_range_change() {
        let mut renderer = HeadlessRenderer::new();
        let mut main = view(&mut renderer, "main-chart");
        let fired = Rc::new(Cell::new(0));

        let counter = fired.clone();
        let subscription = main.subscribe_visible_range_change(Box::new(move |_| counter.set(counter.get() + 1)));

        main.set_visible_logical_range(LogicalRange::new(0.0, 10.0)).unwrap();
        assert_eq!(fired.get(), 1);
        assert_eq!(main.visible_logical_range(), Some(LogicalRange::new(0.0, 10.0)));

        main.unsubscribe_visible_range_change(subscription);
        main.set_visible_logical_range(LogicalRange::new(5.0, 10.0)).unwrap();
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn test_unsubscribe_during_dispatch_sticks() {
        let mut renderer = HeadlessRenderer::new();
        let mut main = view(&mut renderer, "main-chart");
        let canvas = renderer.canvas("main-chart").unwrap();

        // Le premier listener désabonne le second dès le premier appel
        let target: Rc<Cell<Option<SubscriptionId>>> = Rc::new(Cell::new(None));
        let handle = canvas.clone();
        let to_remove = target.clone();
        main.subscribe_visible_range_change(Box::new(move |_| {
            if let Some(id) = to_remove.take() {
                HeadlessView { canvas: handle.clone() }.unsubscribe_visible_range_change(id);
            }
        }));

        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();
        let second = main.subscribe_visible_range_change(Box::new(move |_| counter.set(counter.get() + 1)));
        target.set(Some(second));

        main.set_visible_logical_range(LogicalRange::new(0.0, 10.0)).unwrap();
        assert_eq!(canvas.borrow().listener_count(), 1);

        let before = fired.get();
        main.set_visible_logical_range(LogicalRange::new(1.0, 10.0)).unwrap();
        assert_eq!(fired.get(), before);
    }

    #[test]
    fn test_remove_during_dispatch_drops_listeners() {
        let mut renderer = HeadlessRenderer::new();
        let mut main = view(&mut renderer, "main-chart");
        let canvas = renderer.canvas("main-chart").unwrap();

        let handle = canvas.clone();
        main.subscribe_visible_range_change(Box::new(move |_| HeadlessView { canvas: handle.clone() }.remove()));

        main.set_visible_logical_range(LogicalRange::new(0.0, 10.0)).unwrap();
        assert!(canvas.borrow().is_removed());
        assert_eq!(canvas.borrow().listener_count(), 0);
    }

    #[test]
    fn test_removed_view_rejects_calls() {
        let mut renderer = HeadlessRenderer::new();
        let mut main = view(&mut renderer, "main-chart");
        main.remove();

        assert!(main.set_visible_logical_range(LogicalRange::new(0.0, 1.0)).is_err());
        assert!(main.add_line_series(&options()).is_err());
        assert!(renderer.canvases().is_empty());
    }

    #[test]
    fn test_fit_content_covers_all_bars() {
        let mut renderer = HeadlessRenderer::new();
        let mut main = view(&mut renderer, "main-chart");
        let line = main.add_line_series(&options()).unwrap();
        let points: Vec<RenderPoint> = (0..10).map(|t| RenderPoint::new(t, t as f64)).collect();
        main.set_series_data(line, &points).unwrap();

        main.fit_content().unwrap();
        assert_eq!(main.visible_logical_range(), Some(LogicalRange::new(0.0, 9.0)));
    }
}
