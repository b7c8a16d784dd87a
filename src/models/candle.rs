// ============================================================================
// Structures : RawCandle / Candle
// ============================================================================
// RawCandle : enregistrement tel que fourni par le provider (valeurs parfois
// en string, parfois absentes, timestamp en millisecondes)
// Candle : chandelle canonique, produite uniquement par le sanitizer
//
// CONCEPTS RUST :
// 1. serde_json::Value : accepte n'importe quel JSON (nombre, string, null)
// 2. Option<T> : un champ absent du JSON devient None
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Enregistrement OHLCV brut d'un provider de données
///
/// Les prix peuvent arriver sous forme de nombre (`100.5`) ou de string
/// (`"100.5"`), d'où le type `Value`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCandle {
    /// Timestamp d'ouverture en millisecondes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_time: Option<Value>,

    /// Timestamp déjà exprimé en secondes (données déjà exportées)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<Value>,

    #[serde(default)]
    pub open: Option<Value>,
    #[serde(default)]
    pub high: Option<Value>,
    #[serde(default)]
    pub low: Option<Value>,
    #[serde(default)]
    pub close: Option<Value>,
    #[serde(default)]
    pub volume: Option<Value>,
}

impl RawCandle {
    /// Constructeur pratique pour les tests et les sources en mémoire
    pub fn new(open_time_ms: i64, open: f64, high: f64, low: f64, close: f64, volume: f64) -> Self {
        Self {
            open_time: Some(Value::from(open_time_ms)),
            time: None,
            open: Some(Value::from(open)),
            high: Some(Value::from(high)),
            low: Some(Value::from(low)),
            close: Some(Value::from(close)),
            volume: Some(Value::from(volume)),
        }
    }

    /// Timestamp normalisé en secondes
    ///
    /// - `openTime` (ms) est prioritaire et divisé par 1000 (arrondi vers le bas)
    /// - Sinon `time` est considéré comme déjà en secondes
    pub fn time_seconds(&self) -> Option<i64> {
        let finite = |v: &Value| parse_number(v).filter(|n| n.is_finite());
        if let Some(ms) = self.open_time.as_ref().and_then(finite) {
            return Some((ms / 1000.0).floor() as i64);
        }
        self.time.as_ref().and_then(finite).map(|secs| secs.floor() as i64)
    }
}

/// Une chandelle canonique
///
/// Invariant : `high` est le max et `low` le min de (open, high, low, close),
/// tous les prix sont strictement positifs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Timestamp en secondes
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// Vérifie si la chandelle est haussière (bullish)
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }
}

/// Parse un nombre JSON à la manière d'un `parseFloat`
///
/// CONCEPT RUST : match sur Value
/// - Number : conversion directe en f64
/// - String : trim puis parse
/// - Le reste (null, bool, objet) : None
///
/// Le résultat peut être NaN ou infini : c'est à l'appelant de filtrer.
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Désérialise une valeur numérique tolérante
///
/// Une valeur non numérique (`"n/a"`, objet, booléen) devient None au lieu
/// de faire échouer tout le document : l'échantillon est un gap.
pub fn deserialize_lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(parse_number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_number_accepts_strings() {
        assert_eq!(parse_number(&json!("100.5")), Some(100.5));
        assert_eq!(parse_number(&json!(" 42 ")), Some(42.0));
        assert_eq!(parse_number(&json!(7)), Some(7.0));
        assert_eq!(parse_number(&json!("abc")), None);
        assert_eq!(parse_number(&json!(null)), None);
        assert_eq!(parse_number(&json!(true)), None);
        // Pas de parse partiel : un suffixe parasite rend la valeur invalide
        assert_eq!(parse_number(&json!("100.5abc")), None);
    }

    #[test]
    fn test_time_seconds_prefers_open_time() {
        let raw: RawCandle = serde_json::from_value(json!({
            "openTime": 1609459200999i64,
            "time": 5,
            "open": 1, "high": 1, "low": 1, "close": 1
        }))
        .unwrap();
        assert_eq!(raw.time_seconds(), Some(1609459200));
    }

    #[test]
    fn test_time_seconds_falls_back_to_time() {
        let raw: RawCandle = serde_json::from_value(json!({
            "time": 1609459200,
            "open": "1", "high": "1", "low": "1", "close": "1"
        }))
        .unwrap();
        assert_eq!(raw.time_seconds(), Some(1609459200));
        assert!(raw.volume.is_none());
    }
}
