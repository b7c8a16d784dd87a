// ============================================================================
// CandleSanitizer : validation et normalisation des chandelles
// ============================================================================
// Transforme les enregistrements bruts d'un provider en chandelles
// canoniques. Les enregistrements invalides sont simplement écartés :
// le graphique affiche une série plus courte plutôt que d'échouer.
// ============================================================================

use tracing::debug;

use crate::models::{Candle, RawCandle};
use crate::models::candle::parse_number;

/// Volume utilisé quand le provider n'en fournit pas de valide
pub const DEFAULT_VOLUME: f64 = 1000.0;

/// Prix parsés d'un enregistrement brut
struct Prices {
    open: f64,
    high: f64,
    low: f64,
    close: f64,
}

impl Prices {
    fn parse(raw: &RawCandle) -> Option<Self> {
        let field = |v: &Option<serde_json::Value>| v.as_ref().and_then(parse_number);
        Some(Self {
            open: field(&raw.open)?,
            high: field(&raw.high)?,
            low: field(&raw.low)?,
            close: field(&raw.close)?,
        })
    }

    fn max(&self) -> f64 {
        self.open.max(self.high).max(self.low).max(self.close)
    }

    fn min(&self) -> f64 {
        self.open.min(self.high).min(self.low).min(self.close)
    }

    fn all_positive(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }
}

/// Sanitizer de chandelles (sans état)
#[derive(Debug, Default, Clone, Copy)]
pub struct CandleSanitizer;

impl CandleSanitizer {
    pub fn new() -> Self {
        Self
    }

    /// Vérifie qu'un enregistrement brut respecte les invariants OHLC
    ///
    /// - les 4 prix sont des nombres finis > 0
    /// - high est le maximum, low le minimum
    /// - un timestamp est présent
    pub fn is_valid(&self, raw: &RawCandle) -> bool {
        let Some(prices) = Prices::parse(raw) else {
            return false;
        };

        prices.all_positive()
            && prices.max() == prices.high
            && prices.min() == prices.low
            && raw.time_seconds().is_some()
    }

    /// Normalise un enregistrement (supposé valide)
    ///
    /// high/low sont recalculés même pour un enregistrement valide.
    pub fn normalize(&self, raw: &RawCandle) -> Option<Candle> {
        let prices = Prices::parse(raw)?;
        let volume = raw
            .volume
            .as_ref()
            .and_then(parse_number)
            .filter(|v| v.is_finite() && *v > 0.0)
            .unwrap_or(DEFAULT_VOLUME);

        Some(Candle {
            time: raw.time_seconds()?,
            open: prices.open,
            high: prices.max(),
            low: prices.min(),
            close: prices.close,
            volume,
        })
    }

    /// Filtre puis normalise une série complète
    ///
    /// CONCEPT RUST : Option<&[T]>
    /// - None et slice vide donnent tous deux un Vec vide
    /// - Ne panique jamais, ne retourne jamais d'erreur
    pub fn sanitize(&self, raw: Option<&[RawCandle]>) -> Vec<Candle> {
        let Some(raw) = raw else {
            return Vec::new();
        };

        let candles: Vec<Candle> = raw
            .iter()
            .filter(|r| self.is_valid(r))
            .filter_map(|r| self.normalize(r))
            .collect();

        if candles.len() < raw.len() {
            debug!(
                kept = candles.len(),
                dropped = raw.len() - candles.len(),
                "Dropped invalid candles"
            );
        }

        candles
    }
}
