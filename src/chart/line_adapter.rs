// ============================================================================
// LineSeriesAdapter : flux de points avec gaps explicites
// ============================================================================
// La primitive de rendu relie tous les points d'une série de ligne, y compris
// au-dessus des trous. Cet adaptateur produit un flux où chaque gap est
// matérialisé :
//
// - avant le premier point visible : une ancre (NaN + transparent) par point,
//   pour garder l'axe du temps continu sans fausser l'auto-scale
// - dernier point avant un gap : marqué transparent (bord estompé)
// - début de gap : une seule ancre, les points suivants du gap sont omis
//
// Les timestamps passent des millisecondes aux secondes.
// ============================================================================

use serde_json::Value;
use tracing::debug;

use crate::models::candle::parse_number;
use crate::models::{PlotPoint, RenderPoint};

/// Convertit un timestamp ms en secondes (arrondi vers le bas)
fn to_seconds(time_ms: i64) -> i64 {
    time_ms.div_euclid(1000)
}

/// Adaptateur sans état
#[derive(Debug, Default, Clone, Copy)]
pub struct LineSeriesAdapter;

impl LineSeriesAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Adapte une série brute en flux de rendu gap-aware
    ///
    /// CONCEPT : machine à états sur `prev_visible`
    /// - true : le point précédent a été émis comme valeur visible
    /// - une ancre n'est émise que sur la transition visible -> gap
    pub fn adapt(&self, points: &[PlotPoint]) -> Vec<RenderPoint> {
        let Some(first) = points.iter().position(PlotPoint::is_visible) else {
            return Vec::new();
        };

        let mut output = Vec::with_capacity(points.len());

        // Gap initial : une ancre par point
        output.extend(points[..first].iter().map(|p| RenderPoint::anchor(to_seconds(p.time))));

        let mut prev_visible = false;
        for (i, point) in points.iter().enumerate().skip(first) {
            let time = to_seconds(point.time);

            if point.is_visible() {
                let mut rendered = RenderPoint::new(time, point.value.unwrap_or(f64::NAN));
                let next_is_gap = points.get(i + 1).is_some_and(|next| !next.is_visible());
                if next_is_gap {
                    rendered = rendered.transparent();
                }
                output.push(rendered);
                prev_visible = true;
            } else {
                // Valeur masquée ou invalide : même traitement, début de gap
                if prev_visible {
                    output.push(RenderPoint::anchor(time));
                }
                prev_visible = false;
            }
        }

        debug!(input = points.len(), output = output.len(), "Adapted line series");
        output
    }

    /// Variante pour des données JSON non typées
    ///
    /// Tout ce qui n'est pas un tableau donne un flux vide. Seuls les
    /// éléments sans `time` exploitable sont ignorés : une valeur non
    /// numérique reste un point, donc un gap.
    pub fn adapt_json(&self, value: &Value) -> Vec<RenderPoint> {
        let Value::Array(items) = value else {
            return Vec::new();
        };

        let points: Vec<PlotPoint> = items.iter().filter_map(json_point).collect();
        self.adapt(&points)
    }
}

/// Lit un point JSON : `time` obligatoire, `value` et `color` tolérants
fn json_point(item: &Value) -> Option<PlotPoint> {
    let time = item.get("time").and_then(parse_number).filter(|t| t.is_finite())?;
    let value = item.get("value").and_then(parse_number);
    let color = item.get("color").and_then(Value::as_str);
    Some(PlotPoint::new(time.floor() as i64, value, color))
}
