// ============================================================================
// Structures : séries d'indicateurs
// ============================================================================
// Une série d'indicateur (EMA, RSI, signal...) telle que produite par le
// moteur de scripts, et les overrides de configuration par stratégie.
//
// CONCEPTS RUST :
// 1. #[serde(default)] : valeurs par défaut pour les champs absents du JSON
// 2. #[serde(untagged)] : enum désérialisé selon la forme du JSON
// 3. From<&str> : conversion idiomatique string -> enum
// ============================================================================

use serde::{Deserialize, Serialize};

use super::candle::deserialize_lenient_number;

/// Un point brut d'un indicateur
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    /// Timestamp en millisecondes
    pub time: i64,

    /// Valeur calculée (None = pas de donnée, ou valeur non numérique)
    #[serde(default, deserialize_with = "deserialize_lenient_number")]
    pub value: Option<f64>,

    /// false = valeur calculée mais volontairement masquée
    #[serde(default = "default_visible")]
    pub visible: bool,

    /// Options d'affichage propres au point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<PointOptions>,
}

fn default_visible() -> bool {
    true
}

/// Options d'affichage d'un point
///
/// Une couleur explicitement à `null` signifie "point masqué".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointOptions {
    #[serde(default, deserialize_with = "deserialize_explicit_null")]
    pub color: Option<Option<String>>,
}

/// Distingue `"color": null` (Some(None)) d'un champ absent (None)
fn deserialize_explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl IndicatorPoint {
    /// Crée un point visible
    pub fn new(time: i64, value: Option<f64>) -> Self {
        Self {
            time,
            value,
            visible: true,
            options: None,
        }
    }

    /// Crée un point calculé mais masqué
    pub fn hidden(time: i64, value: Option<f64>) -> Self {
        Self {
            visible: false,
            ..Self::new(time, value)
        }
    }

    /// Le producteur a-t-il demandé l'affichage de ce point ?
    pub fn is_displayed(&self) -> bool {
        let color_hidden = matches!(
            self.options.as_ref().map(|o| &o.color),
            Some(Some(None))
        );
        self.visible && !color_hidden
    }
}

/// Type de rendu d'une série
///
/// CONCEPT RUST : Enum plutôt que comparaison de strings
/// - "histogram" -> Histogram
/// - tout le reste (y compris "line" et les valeurs inconnues) -> Line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderKind {
    #[default]
    Line,
    Histogram,
}

impl From<&str> for RenderKind {
    fn from(style: &str) -> Self {
        match style {
            "histogram" => RenderKind::Histogram,
            _ => RenderKind::Line,
        }
    }
}

impl RenderKind {
    /// Résout un style optionnel (None -> Line)
    pub fn from_style(style: Option<&str>) -> Self {
        style.map(RenderKind::from).unwrap_or_default()
    }
}

/// Style déclaré d'une série
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesStyle {
    /// "line", "histogram", ou n'importe quoi d'autre (traité comme line)
    #[serde(default, alias = "style", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_width: Option<f64>,
}

/// Une série d'indicateur complète
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSeries {
    #[serde(default)]
    pub data: Vec<IndicatorPoint>,

    /// Pane déclaré par l'indicateur lui-même (prioritaire sur l'heuristique)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pane: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default)]
    pub style: SeriesStyle,
}

impl IndicatorSeries {
    pub fn new(data: Vec<IndicatorPoint>) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Pane déclaré, si non vide
    pub fn declared_pane(&self) -> Option<&str> {
        self.pane.as_deref().filter(|p| !p.is_empty())
    }
}

/// Override de configuration pour un indicateur
///
/// CONCEPT RUST : #[serde(untagged)]
/// - `"EMA9": "main"` -> Pane("main")
/// - `"EMA9": { "pane": "main", "style": "histogram" }` -> Detailed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IndicatorOverride {
    Pane(String),
    Detailed(OverrideFields),
}

/// Champs détaillés d'un override
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverrideFields {
    #[serde(default)]
    pub pane: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub line_width: Option<f64>,
}

impl IndicatorOverride {
    /// Pane forcé par l'override (ignoré s'il est vide)
    pub fn pane(&self) -> Option<&str> {
        let pane = match self {
            IndicatorOverride::Pane(pane) => Some(pane.as_str()),
            IndicatorOverride::Detailed(fields) => fields.pane.as_deref(),
        };
        pane.filter(|p| !p.is_empty())
    }

    /// Champs de style (None pour un override de pane seul)
    pub fn fields(&self) -> Option<&OverrideFields> {
        match self {
            IndicatorOverride::Pane(_) => None,
            IndicatorOverride::Detailed(fields) => Some(fields),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_kind_is_permissive() {
        assert_eq!(RenderKind::from("histogram"), RenderKind::Histogram);
        assert_eq!(RenderKind::from("line"), RenderKind::Line);
        assert_eq!(RenderKind::from("area"), RenderKind::Line);
        assert_eq!(RenderKind::from_style(None), RenderKind::Line);
    }

    #[test]
    fn test_point_visibility() {
        let point: IndicatorPoint = serde_json::from_value(json!({ "time": 1000, "value": 1.5 })).unwrap();
        assert!(point.is_displayed());

        let hidden: IndicatorPoint =
            serde_json::from_value(json!({ "time": 1000, "value": 1.5, "options": { "color": null } })).unwrap();
        assert!(!hidden.is_displayed());

        let colored: IndicatorPoint =
            serde_json::from_value(json!({ "time": 1000, "value": 1.5, "options": { "color": "#fff" } })).unwrap();
        assert!(colored.is_displayed());

        assert!(!IndicatorPoint::hidden(1000, Some(1.0)).is_displayed());
    }

    #[test]
    fn test_non_numeric_value_is_a_gap() {
        let point: IndicatorPoint = serde_json::from_value(json!({ "time": 2000, "value": "n/a" })).unwrap();
        assert_eq!(point.value, None);

        let point: IndicatorPoint = serde_json::from_value(json!({ "time": 2000, "value": "12.5" })).unwrap();
        assert_eq!(point.value, Some(12.5));

        let series: IndicatorSeries = serde_json::from_value(json!({
            "data": [{ "time": 1000, "value": 1.0 }, { "time": 2000, "value": { "bad": true } }]
        }))
        .unwrap();
        assert_eq!(series.data.len(), 2);
        assert_eq!(series.data[1].value, None);
    }

    #[test]
    fn test_override_forms() {
        let overrides: std::collections::BTreeMap<String, IndicatorOverride> = serde_json::from_value(json!({
            "EMA9": "main",
            "Volume": { "pane": "volume", "style": "histogram", "color": "#888" },
            "RSI": { "style": "line" }
        }))
        .unwrap();

        assert_eq!(overrides["EMA9"].pane(), Some("main"));
        assert_eq!(overrides["Volume"].pane(), Some("volume"));
        assert_eq!(overrides["RSI"].pane(), None);
        assert_eq!(
            overrides["Volume"].fields().and_then(|f| f.style.as_deref()),
            Some("histogram")
        );
    }
}
