// ============================================================================
// PaneManager : gestion multi-panes et synchronisation des fenêtres
// ============================================================================
// Possède toutes les vues (un pane "main" + des panes auxiliaires) et garde
// leurs fenêtres visibles alignées.
//
// Synchronisation :
// 1. chaque vue reçoit un listener "fenêtre visible changée"
// 2. le premier changement lève le verrou `updating` et mémorise la source
// 3. au prochain frame (`on_frame`), la fenêtre est appliquée à toutes les
//    autres vues, puis le verrou est relâché
//
// Les changements provoqués par la propagation elle-même arrivent pendant que
// le verrou est levé et sont ignorés : pas de boucle entre N vues.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};

use super::pane_assigner::MAIN_PANE;
use super::renderer::{ChartRenderer, ChartView, Container, SubscriptionId, ViewOptions};
use crate::models::{LogicalRange, PaneConfig};

/// Une vue et son conteneur
pub struct View {
    pub name: String,
    pub container: Container,
    pub chart: Box<dyn ChartView>,
    subscription: Option<SubscriptionId>,
}

/// Propagation en attente du prochain frame
#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingSync {
    source: usize,
    range: LogicalRange,
}

/// État partagé entre les listeners et le manager
///
/// CONCEPT : verrou de ré-entrance
/// - `updating` est levé avant la propagation et relâché après
/// - un seul écrivain : les listeners installés par ce manager
#[derive(Debug, Default)]
struct SyncState {
    updating: bool,
    pending: Option<PendingSync>,
}

impl SyncState {
    /// Enregistre un changement de fenêtre venant de la vue `source`
    fn record(&mut self, source: usize, range: Option<LogicalRange>) {
        let Some(range) = range else {
            return;
        };

        if let Some(pending) = self.pending.as_mut() {
            // Changements rapides sur la même vue : on garde le dernier
            if pending.source == source {
                pending.range = range;
            }
            return;
        }

        if self.updating {
            return;
        }
        self.updating = true;
        self.pending = Some(PendingSync { source, range });
    }
}

/// Gestionnaire des panes
pub struct PaneManager {
    renderer: Box<dyn ChartRenderer>,
    main: Option<View>,
    auxiliary: Vec<View>,
    sync: Rc<RefCell<SyncState>>,
}

impl PaneManager {
    pub fn new(renderer: Box<dyn ChartRenderer>) -> Self {
        Self {
            renderer,
            main: None,
            auxiliary: Vec::new(),
            sync: Rc::new(RefCell::new(SyncState::default())),
        }
    }

    /// Crée la vue principale
    pub fn create_main_view(&mut self, container: Container, config: &PaneConfig) -> Result<&mut View> {
        if self.main.is_some() {
            bail!("Main view already exists");
        }

        let options = ViewOptions {
            width: container.width,
            height: config.height,
        };
        let chart = self
            .renderer
            .create_view(&container, &options)
            .context("Failed to create main view")?;

        info!(container = %container.id, height = config.height, "Created main pane");
        Ok(self.main.insert(View {
            name: MAIN_PANE.to_string(),
            container,
            chart,
            subscription: None,
        }))
    }

    /// Crée une vue auxiliaire, avec son propre conteneur
    ///
    /// La largeur est celle du conteneur principal.
    pub fn create_auxiliary_view(&mut self, name: &str, config: &PaneConfig) -> Result<&mut View> {
        if name == MAIN_PANE || self.auxiliary.iter().any(|v| v.name == name) {
            bail!("Pane '{}' already exists", name);
        }

        let width = self.main.as_ref().map(|v| v.container.width).unwrap_or_default();
        let container = Container::new(format!("{name}-chart"), width);
        let options = ViewOptions {
            width,
            height: config.height,
        };
        let chart = self
            .renderer
            .create_view(&container, &options)
            .with_context(|| format!("Failed to create pane '{name}'"))?;

        info!(pane = %name, height = config.height, "Created auxiliary pane");
        self.auxiliary.push(View {
            name: name.to_string(),
            container,
            chart,
            subscription: None,
        });

        let index = self.auxiliary.len() - 1;
        Ok(&mut self.auxiliary[index])
    }

    pub fn get_view(&self, name: &str) -> Option<&View> {
        if name == MAIN_PANE {
            return self.main.as_ref();
        }
        self.auxiliary.iter().find(|v| v.name == name)
    }

    pub fn get_view_mut(&mut self, name: &str) -> Option<&mut View> {
        if name == MAIN_PANE {
            return self.main.as_mut();
        }
        self.auxiliary.iter_mut().find(|v| v.name == name)
    }

    /// Noms des vues : "main" d'abord, puis ordre de création
    pub fn list_views(&self) -> Vec<&str> {
        self.views().map(|v| v.name.as_str()).collect()
    }

    /// Conteneurs de toutes les vues
    pub fn all_containers(&self) -> Vec<&Container> {
        self.views().map(|v| &v.container).collect()
    }

    fn views(&self) -> impl Iterator<Item = &View> {
        self.main.iter().chain(self.auxiliary.iter())
    }

    fn views_mut(&mut self) -> impl Iterator<Item = &mut View> {
        self.main.iter_mut().chain(self.auxiliary.iter_mut())
    }

    /// Installe un listener de synchronisation sur chaque vue
    ///
    /// Un nouvel appel remplace les listeners précédents.
    pub fn synchronize(&mut self) {
        self.unsubscribe_all();

        let sync = self.sync.clone();
        for (index, view) in self.views_mut().enumerate() {
            let state = sync.clone();
            let subscription = view.chart.subscribe_visible_range_change(Box::new(move |range| {
                state.borrow_mut().record(index, range);
            }));
            view.subscription = Some(subscription);
        }

        debug!(views = self.list_views().len(), "Synchronized pane time scales");
    }

    /// Frontière de frame : propage la fenêtre en attente
    ///
    /// Une vue en échec est loguée et ignorée ; les autres sont quand même
    /// mises à jour. Retourne le nombre de vues mises à jour.
    pub fn on_frame(&mut self) -> usize {
        // Le borrow est relâché avant d'appeler les vues : leurs listeners
        // doivent pouvoir relire l'état partagé.
        let pending = self.sync.borrow_mut().pending.take();
        let Some(PendingSync { source, range }) = pending else {
            return 0;
        };

        let mut updated = 0;
        for (index, view) in self.views_mut().enumerate() {
            if index == source {
                continue;
            }
            match view.chart.set_visible_logical_range(range) {
                Ok(()) => updated += 1,
                Err(e) => warn!(pane = %view.name, error = %e, "Failed to sync logical range"),
            }
        }

        self.sync.borrow_mut().updating = false;
        debug!(source, updated, ?range, "Propagated visible range");
        updated
    }

    /// Une propagation attend-elle le prochain frame ?
    pub fn has_pending_sync(&self) -> bool {
        self.sync.borrow().pending.is_some()
    }

    /// Ajuste toutes les vues à leur contenu
    pub fn fit_content(&mut self) {
        for view in self.views_mut() {
            if let Err(e) = view.chart.fit_content() {
                warn!(pane = %view.name, error = %e, "Failed to fit content");
            }
        }
    }

    /// Redimensionne toutes les vues à la largeur donnée
    pub fn resize(&mut self, width: u16) {
        for view in self.views_mut() {
            view.container.width = width;
            if let Err(e) = view.chart.apply_width(width) {
                warn!(pane = %view.name, error = %e, "Failed to resize pane");
            }
        }
    }

    fn unsubscribe_all(&mut self) {
        for view in self.views_mut() {
            if let Some(subscription) = view.subscription.take() {
                view.chart.unsubscribe_visible_range_change(subscription);
            }
        }
    }

    /// Détruit toutes les vues (avant une ré-initialisation complète)
    pub fn teardown(&mut self) {
        self.unsubscribe_all();
        for view in self.views_mut() {
            view.chart.remove();
        }
        self.main = None;
        self.auxiliary.clear();
        *self.sync.borrow_mut() = SyncState::default();
        info!("Tore down all panes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::headless::{scroll_canvas, CanvasHandle, HeadlessRenderer};

    fn manager_with_panes(aux: &[&str]) -> (PaneManager, HeadlessRenderer) {
        let renderer = HeadlessRenderer::new();
        let mut manager = PaneManager::new(Box::new(renderer.clone()));
        manager
            .create_main_view(Container::new("main-chart", 120), &PaneConfig::new(400, true))
            .unwrap();
        for name in aux {
            manager.create_auxiliary_view(name, &PaneConfig::new(200, false)).unwrap();
        }
        (manager, renderer)
    }

    fn canvas(renderer: &HeadlessRenderer, id: &str) -> CanvasHandle {
        renderer.canvas(id).unwrap()
    }

    #[test]
    fn test_views_and_lookup() {
        let (manager, renderer) = manager_with_panes(&["indicator", "volume"]);

        assert_eq!(manager.list_views(), vec!["main", "indicator", "volume"]);
        assert!(manager.get_view("indicator").is_some());
        assert!(manager.get_view("missing").is_none());

        // Largeur partagée, hauteur propre à chaque pane
        let volume = canvas(&renderer, "volume-chart");
        assert_eq!(volume.borrow().container().width, 120);
        assert_eq!(volume.borrow().height(), 200);
    }

    #[test]
    fn test_duplicate_panes_rejected() {
        let (mut manager, _) = manager_with_panes(&["indicator"]);
        assert!(manager.create_auxiliary_view("indicator", &PaneConfig::new(100, false)).is_err());
        assert!(manager.create_auxiliary_view("main", &PaneConfig::new(100, false)).is_err());
        assert!(manager
            .create_main_view(Container::new("other", 10), &PaneConfig::new(100, true))
            .is_err());
    }

    #[test]
    fn test_sync_converges_once_per_frame() {
        let (mut manager, renderer) = manager_with_panes(&["a", "b", "c", "d"]);
        manager.synchronize();

        let ids = ["main-chart", "a-chart", "b-chart", "c-chart", "d-chart"];
        let target = LogicalRange::new(10.0, 60.0);
        scroll_canvas(&canvas(&renderer, "b-chart"), target).unwrap();

        // Rien n'est propagé avant le frame
        assert!(manager.has_pending_sync());
        assert_eq!(canvas(&renderer, "a-chart").borrow().range_updates(), 0);

        assert_eq!(manager.on_frame(), 4);
        for id in ids {
            assert_eq!(canvas(&renderer, id).borrow().visible_range(), Some(target));
        }
        // Chaque vue non-source reçoit exactement une mise à jour
        for id in ["main-chart", "a-chart", "c-chart", "d-chart"] {
            assert_eq!(canvas(&renderer, id).borrow().range_updates(), 1);
        }

        // Les échos de la propagation n'ont pas relancé de cycle
        assert!(!manager.has_pending_sync());
        assert_eq!(manager.on_frame(), 0);
    }

    #[test]
    fn test_rapid_changes_coalesce() {
        let (mut manager, renderer) = manager_with_panes(&["indicator"]);
        manager.synchronize();

        let main = canvas(&renderer, "main-chart");
        let indicator = canvas(&renderer, "indicator-chart");
        scroll_canvas(&main, LogicalRange::new(0.0, 10.0)).unwrap();
        scroll_canvas(&main, LogicalRange::new(1.0, 11.0)).unwrap();
        scroll_canvas(&main, LogicalRange::new(2.0, 12.0)).unwrap();
        // Une autre vue pendant l'attente : ignorée
        scroll_canvas(&indicator, LogicalRange::new(50.0, 60.0)).unwrap();

        assert_eq!(manager.on_frame(), 1);
        assert_eq!(indicator.borrow().visible_range(), Some(LogicalRange::new(2.0, 12.0)));
        assert_eq!(main.borrow().visible_range(), Some(LogicalRange::new(2.0, 12.0)));
    }

    #[test]
    fn test_failed_view_does_not_abort_propagation() {
        let (mut manager, renderer) = manager_with_panes(&["a", "b"]);
        manager.synchronize();

        canvas(&renderer, "a-chart").borrow_mut().reject_range_updates(true);
        scroll_canvas(&canvas(&renderer, "main-chart"), LogicalRange::new(3.0, 9.0)).unwrap();

        assert_eq!(manager.on_frame(), 1);
        assert_eq!(canvas(&renderer, "b-chart").borrow().visible_range(), Some(LogicalRange::new(3.0, 9.0)));

        // Le verrou est relâché malgré l'échec
        scroll_canvas(&canvas(&renderer, "b-chart"), LogicalRange::new(4.0, 9.0)).unwrap();
        assert!(manager.has_pending_sync());
    }

    #[test]
    fn test_resynchronize_replaces_listeners() {
        let (mut manager, renderer) = manager_with_panes(&["indicator"]);
        manager.synchronize();
        manager.synchronize();

        assert_eq!(canvas(&renderer, "main-chart").borrow().listener_count(), 1);
        assert_eq!(canvas(&renderer, "indicator-chart").borrow().listener_count(), 1);
    }

    #[test]
    fn test_teardown_unregisters_and_removes() {
        let (mut manager, renderer) = manager_with_panes(&["indicator"]);
        manager.synchronize();
        let main = canvas(&renderer, "main-chart");

        manager.teardown();

        assert!(main.borrow().is_removed());
        assert_eq!(main.borrow().listener_count(), 0);
        assert!(manager.list_views().is_empty());
        assert!(renderer.canvases().is_empty());
    }

    #[test]
    fn test_resize_applies_width_everywhere() {
        let (mut manager, renderer) = manager_with_panes(&["indicator"]);
        manager.resize(90);

        assert!(manager.all_containers().iter().all(|c| c.width == 90));
        assert_eq!(canvas(&renderer, "indicator-chart").borrow().container().width, 90);
    }
}
