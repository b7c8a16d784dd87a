// ============================================================================
// PaneAssigner : placement automatique des indicateurs
// ============================================================================
// Décide si un indicateur partage l'échelle de prix (pane "main") ou s'il
// doit vivre dans un pane séparé ("indicator"), en comparant les plages de
// valeurs.
//
// Ordre de résolution pour une clé :
// 1. override explicite de la configuration
// 2. pane déclaré par l'indicateur lui-même
// 3. heuristique de recouvrement des plages
// ============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::models::{Candle, IndicatorPoint, IndicatorSeries, Overrides};

/// Nom du pane principal (chandelles)
pub const MAIN_PANE: &str = "main";

/// Nom du pane séparé par défaut
pub const INDICATOR_PANE: &str = "indicator";

/// Ratio de recouvrement minimum pour partager l'échelle de prix
pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.3;

/// Paramètres de l'heuristique de placement
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClassifierConfig {
    /// intersection / plus petite étendue >= seuil => même pane
    pub overlap_threshold: f64,

    /// Un 0 est traité comme "pas de signal" et exclu du calcul de plage
    pub ignore_zero_samples: bool,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            overlap_threshold: DEFAULT_OVERLAP_THRESHOLD,
            ignore_zero_samples: true,
        }
    }
}

/// Plage de valeurs [min, max]
///
/// `{0, 0}` représente l'absence d'échantillon valide.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl ValueRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn span(&self) -> f64 {
        self.max - self.min
    }

    /// Plage min/max d'une suite de valeurs, `{0, 0}` si vide
    fn from_values(values: impl Iterator<Item = f64>) -> Self {
        values
            .fold(None, |acc: Option<Self>, v| match acc {
                None => Some(Self::new(v, v)),
                Some(r) => Some(Self::new(r.min.min(v), r.max.max(v))),
            })
            .unwrap_or_default()
    }

    /// Les deux plages se recouvrent-elles suffisamment ?
    ///
    /// Une étendue nulle ne recouvre jamais rien (pas de division par zéro,
    /// et un indicateur plat n'est pas forcé sur l'échelle de prix).
    pub fn overlaps(&self, other: &ValueRange, threshold: f64) -> bool {
        let span = self.span();
        let other_span = other.span();
        if span == 0.0 || other_span == 0.0 {
            return false;
        }

        let overlap_min = self.min.max(other.min);
        let overlap_max = self.max.min(other.max);
        let overlap_span = (overlap_max - overlap_min).max(0.0);

        overlap_span / span.min(other_span) >= threshold
    }
}

/// Résultat de l'heuristique de placement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Main,
    Indicator,
}

impl Placement {
    pub fn pane_name(&self) -> &'static str {
        match self {
            Placement::Main => MAIN_PANE,
            Placement::Indicator => INDICATOR_PANE,
        }
    }
}

/// Assignation finale clé -> nom de pane
pub type PaneAssignment = BTreeMap<String, String>;

/// Assigneur de panes pour un jeu de chandelles donné
#[derive(Debug, Clone)]
pub struct PaneAssigner {
    price_range: ValueRange,
    config: ClassifierConfig,
}

impl PaneAssigner {
    /// Calcule la plage de prix une fois pour toutes
    pub fn new(candles: &[Candle], config: ClassifierConfig) -> Self {
        Self {
            price_range: price_range(candles),
            config,
        }
    }

    pub fn price_range(&self) -> ValueRange {
        self.price_range
    }

    /// Plage d'un indicateur : valeurs finies et (par défaut) non nulles
    pub fn indicator_range(&self, data: &[IndicatorPoint]) -> ValueRange {
        let ignore_zero = self.config.ignore_zero_samples;
        ValueRange::from_values(
            data.iter()
                .filter_map(|p| p.value)
                .filter(|v| v.is_finite())
                .filter(|v| !(ignore_zero && *v == 0.0)),
        )
    }

    /// Heuristique seule : recouvrement => Main, sinon Indicator
    pub fn classify(&self, data: &[IndicatorPoint]) -> Placement {
        classify(self.price_range, &self.indicator_range(data), self.config.overlap_threshold)
    }

    /// Pane d'un indicateur selon l'ordre de résolution complet
    pub fn assign_pane(
        &self,
        key: &str,
        indicator: &IndicatorSeries,
        overrides: Option<&Overrides>,
    ) -> String {
        if let Some(pane) = overrides.and_then(|o| o.get(key)).and_then(|o| o.pane()) {
            return pane.to_string();
        }

        if let Some(pane) = indicator.declared_pane() {
            return pane.to_string();
        }

        self.classify(&indicator.data).pane_name().to_string()
    }

    /// Assigne un pane à chaque indicateur
    ///
    /// Fonction pure : les entrées ne sont pas modifiées.
    pub fn assign_all(
        &self,
        indicators: &BTreeMap<String, IndicatorSeries>,
        overrides: Option<&Overrides>,
    ) -> PaneAssignment {
        let assignment: PaneAssignment = indicators
            .iter()
            .map(|(key, indicator)| (key.clone(), self.assign_pane(key, indicator, overrides)))
            .collect();

        debug!(?assignment, price_range = ?self.price_range, "Assigned indicator panes");
        assignment
    }
}

/// Plage de prix : min des lows, max des highs
pub fn price_range(candles: &[Candle]) -> ValueRange {
    if candles.is_empty() {
        return ValueRange::default();
    }
    ValueRange::new(
        candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min),
        candles.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max),
    )
}

/// Recouvrement de deux plages : intersection / plus petite étendue >= seuil
pub fn ranges_overlap(a: &ValueRange, b: &ValueRange, threshold: f64) -> bool {
    a.overlaps(b, threshold)
}

/// Compare une plage d'indicateur à la plage de prix
pub fn classify(price_range: ValueRange, indicator_range: &ValueRange, threshold: f64) -> Placement {
    if ranges_overlap(&price_range, indicator_range, threshold) {
        Placement::Main
    } else {
        Placement::Indicator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IndicatorOverride;

    fn candle(low: f64, high: f64) -> Candle {
        Candle { time: 0, open: low, high, low, close: high, volume: 1.0 }
    }

    fn series(values: &[Option<f64>]) -> IndicatorSeries {
        IndicatorSeries::new(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| IndicatorPoint::new(i as i64 * 1000, *v))
                .collect(),
        )
    }

    fn assigner() -> PaneAssigner {
        PaneAssigner::new(&[candle(100.0, 110.0), candle(95.0, 105.0)], ClassifierConfig::default())
    }

    #[test]
    fn test_price_range() {
        assert_eq!(assigner().price_range(), ValueRange::new(95.0, 110.0));
        assert_eq!(price_range(&[]), ValueRange::new(0.0, 0.0));
    }

    #[test]
    fn test_zero_span_never_overlaps() {
        let flat = ValueRange::new(5.0, 5.0);
        let wide = ValueRange::new(0.0, 10.0);
        assert!(!flat.overlaps(&wide, 0.0));
        assert!(!wide.overlaps(&flat, 0.0));
        assert!(!ranges_overlap(&ValueRange::default(), &ValueRange::default(), 0.0));
    }

    #[test]
    fn test_overlap_threshold() {
        let price = ValueRange::new(100.0, 200.0);
        // 30% de la plus petite étendue : limite incluse
        assert!(price.overlaps(&ValueRange::new(170.0, 270.0), 0.3));
        assert!(!price.overlaps(&ValueRange::new(171.0, 271.0), 0.3));
    }

    #[test]
    fn test_classify_identical_and_disjoint() {
        let range = ValueRange::new(95.0, 110.0);
        assert_eq!(classify(range, &range, DEFAULT_OVERLAP_THRESHOLD), Placement::Main);
        assert_eq!(
            classify(range, &ValueRange::new(0.0, 50.0), DEFAULT_OVERLAP_THRESHOLD),
            Placement::Indicator
        );
    }

    #[test]
    fn test_indicator_range_excludes_zero_and_gaps() {
        let assigner = assigner();
        let data = series(&[Some(0.0), None, Some(f64::NAN), Some(30.0), Some(70.0), Some(0.0)]).data;
        assert_eq!(assigner.indicator_range(&data), ValueRange::new(30.0, 70.0));
        assert_eq!(assigner.indicator_range(&series(&[None, Some(0.0)]).data), ValueRange::default());

        let keep_zero = PaneAssigner::new(&[], ClassifierConfig { ignore_zero_samples: false, ..Default::default() });
        assert_eq!(keep_zero.indicator_range(&data), ValueRange::new(0.0, 70.0));
    }

    #[test]
    fn test_sparse_signal_goes_to_indicator_pane() {
        // Signal 0/1 : seul le 1 compte, étendue nulle => jamais sur le prix
        let assigner = assigner();
        let signal = series(&[Some(0.0), Some(1.0), Some(0.0), Some(1.0)]);
        assert_eq!(assigner.assign_pane("Bull", &signal, None), INDICATOR_PANE);
    }

    #[test]
    fn test_resolution_order() {
        let assigner = assigner();
        let ema = series(&[Some(98.0), Some(104.0), Some(108.0)]);
        let rsi = series(&[Some(30.0), Some(55.0), Some(70.0)]);
        let mut declared = rsi.clone();
        declared.pane = Some("oscillator".to_string());
        let mut empty_declared = ema.clone();
        empty_declared.pane = Some(String::new());

        assert_eq!(assigner.assign_pane("EMA", &ema, None), MAIN_PANE);
        assert_eq!(assigner.assign_pane("RSI", &rsi, None), INDICATOR_PANE);
        assert_eq!(assigner.assign_pane("RSI", &declared, None), "oscillator");
        assert_eq!(assigner.assign_pane("EMA", &empty_declared, None), MAIN_PANE);

        let mut overrides = Overrides::new();
        overrides.insert("RSI".to_string(), IndicatorOverride::Pane("custom".to_string()));
        assert_eq!(assigner.assign_pane("RSI", &declared, Some(&overrides)), "custom");
    }

    #[test]
    fn test_assign_all_is_pure() {
        let assigner = assigner();
        let mut indicators = BTreeMap::new();
        indicators.insert("EMA".to_string(), series(&[Some(100.0), Some(106.0)]));
        indicators.insert("RSI".to_string(), series(&[Some(30.0), Some(70.0)]));
        let before = indicators.clone();

        let first = assigner.assign_all(&indicators, None);
        let second = assigner.assign_all(&indicators, None);

        assert_eq!(first, second);
        assert_eq!(indicators, before);
        assert_eq!(first["EMA"], MAIN_PANE);
        assert_eq!(first["RSI"], INDICATOR_PANE);
    }
}
