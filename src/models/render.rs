// ============================================================================
// Structures de rendu
// ============================================================================
// Points prêts à être chargés dans une série, et fenêtre logique visible
// partagée entre les panes.
// ============================================================================

use serde::{Deserialize, Serialize};

use super::candle::deserialize_lenient_number;

/// Couleur marquant un point comme bord transparent (ou ancre)
pub const TRANSPARENT: &str = "transparent";

/// Point d'entrée de l'adaptateur de lignes
///
/// `color` à None = point masqué par son producteur.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotPoint {
    /// Timestamp en millisecondes
    pub time: i64,
    #[serde(default, deserialize_with = "deserialize_lenient_number")]
    pub value: Option<f64>,
    #[serde(default)]
    pub color: Option<String>,
}

impl PlotPoint {
    pub fn new(time: i64, value: Option<f64>, color: Option<&str>) -> Self {
        Self {
            time,
            value,
            color: color.map(str::to_string),
        }
    }

    /// Valeur numérique finie ?
    pub fn is_sample_valid(&self) -> bool {
        self.value.is_some_and(f64::is_finite)
    }

    /// Valeur valide ET couleur d'affichage présente
    pub fn is_visible(&self) -> bool {
        self.is_sample_valid() && self.color.is_some()
    }
}

/// Point consommé directement par la primitive de rendu
///
/// CONCEPT : Ancre
/// - value = NaN + color = "transparent"
/// - casse la continuité de la ligne sans décaler l'axe du temps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderPoint {
    /// Timestamp en secondes
    pub time: i64,
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl RenderPoint {
    pub fn new(time: i64, value: f64) -> Self {
        Self {
            time,
            value,
            color: None,
        }
    }

    /// Point d'ancrage (gap)
    pub fn anchor(time: i64) -> Self {
        Self {
            time,
            value: f64::NAN,
            color: Some(TRANSPARENT.to_string()),
        }
    }

    pub fn transparent(mut self) -> Self {
        self.color = Some(TRANSPARENT.to_string());
        self
    }

    pub fn is_transparent(&self) -> bool {
        self.color.as_deref() == Some(TRANSPARENT)
    }

    pub fn is_anchor(&self) -> bool {
        self.value.is_nan() && self.is_transparent()
    }
}

/// Égalité structurelle où deux NaN sont considérés égaux
///
/// CONCEPT RUST : PartialEq manuel
/// - f64::NAN != f64::NAN avec l'égalité IEEE
/// - Pour comparer des flux de points (tests, déduplication), une ancre
///   doit être égale à une autre ancre au même timestamp
impl PartialEq for RenderPoint {
    fn eq(&self, other: &Self) -> bool {
        let same_value = (self.value.is_nan() && other.value.is_nan()) || self.value == other.value;
        self.time == other.time && same_value && self.color == other.color
    }
}

/// Fenêtre logique visible (en index de barres)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogicalRange {
    pub from: f64,
    pub to: f64,
}

impl LogicalRange {
    pub fn new(from: f64, to: f64) -> Self {
        Self { from, to }
    }

    /// Largeur de la fenêtre en barres
    pub fn span(&self) -> f64 {
        self.to - self.from
    }

    /// Décale la fenêtre de `bars` barres (négatif = vers la gauche)
    pub fn shifted(&self, bars: f64) -> Self {
        Self::new(self.from + bars, self.to + bars)
    }

    /// Zoom autour du bord droit (factor < 1 = zoom avant)
    pub fn zoomed(&self, factor: f64) -> Self {
        let span = (self.span() * factor).max(2.0);
        Self::new(self.to - span, self.to)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anchor_equality_with_nan() {
        assert_eq!(RenderPoint::anchor(3), RenderPoint::anchor(3));
        assert_ne!(RenderPoint::anchor(3), RenderPoint::new(3, 0.0));
        assert!(RenderPoint::anchor(3).is_anchor());
        assert!(!RenderPoint::new(3, 1.0).transparent().is_anchor());
    }

    #[test]
    fn test_plot_point_validity() {
        assert!(PlotPoint::new(0, Some(1.0), Some("#fff")).is_visible());
        assert!(!PlotPoint::new(0, Some(1.0), None).is_visible());
        assert!(PlotPoint::new(0, Some(1.0), None).is_sample_valid());
        assert!(!PlotPoint::new(0, Some(f64::NAN), Some("#fff")).is_sample_valid());
        assert!(!PlotPoint::new(0, None, Some("#fff")).is_sample_valid());
    }

    #[test]
    fn test_logical_range_navigation() {
        let range = LogicalRange::new(10.0, 50.0);
        assert_eq!(range.shifted(-5.0), LogicalRange::new(5.0, 45.0));
        assert_eq!(range.zoomed(0.5), LogicalRange::new(30.0, 50.0));
        assert_eq!(range.zoomed(0.01).span(), 2.0);
    }
}
