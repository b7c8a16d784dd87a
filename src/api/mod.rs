// ============================================================================
// Module : api
// ============================================================================
// Sources des données du graphique : un répertoire local ou un serveur HTTP.
// Les deux exposent le même trait `ChartDataSource`.
// ============================================================================

pub mod file;   // Répertoire local (tokio::fs)
pub mod http;   // Serveur HTTP (reqwest)

use std::future::Future;

use anyhow::Result;

use crate::models::{ChartData, Overrides};

pub use file::FileSource;
pub use http::HttpSource;

/// Nom du fichier de données principal
pub const CHART_DATA_FILE: &str = "chart-data.json";

/// Source de données du graphique
///
/// CONCEPT RUST : fonctions async dans un trait
/// - `-> impl Future` : chaque implémentation retourne sa propre Future
/// - Utilisé en générique (`S: ChartDataSource`), pas en `dyn`
pub trait ChartDataSource {
    /// Charge chart-data.json ; une erreur ici interrompt l'initialisation
    fn load_chart_data(&self) -> impl Future<Output = Result<ChartData>>;

    /// Charge les overrides `<strategie>.config`
    ///
    /// Ne retourne jamais d'erreur : fichier absent, illisible ou sans
    /// section `indicators` => None.
    fn load_strategy_config(&self, strategy: &str) -> impl Future<Output = Option<Overrides>>;
}

/// Extrait les overrides d'un fichier `.config` déjà lu
fn parse_strategy_config(content: &str) -> Option<Overrides> {
    serde_json::from_str::<crate::models::StrategyConfig>(content)
        .ok()
        .and_then(|config| config.indicators)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_strategy_config() {
        let overrides = parse_strategy_config(r#"{ "indicators": { "RSI": "oscillator" } }"#).unwrap();
        assert_eq!(overrides["RSI"].pane(), Some("oscillator"));

        assert!(parse_strategy_config(r#"{ "other": 1 }"#).is_none());
        assert!(parse_strategy_config("garbage").is_none());
    }
}
