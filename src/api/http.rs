// ============================================================================
// Source : serveur HTTP
// ============================================================================
// Récupère `chart-data.json` et `<strategie>.config` depuis une URL de base.
// Chaque requête porte un paramètre `?<timestamp ms>` pour contourner les
// caches intermédiaires (le fichier est régénéré à chaque exécution de la
// stratégie).
// ============================================================================

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{debug, info, instrument, warn};

use super::{parse_strategy_config, ChartDataSource, CHART_DATA_FILE};
use crate::models::{ChartData, Overrides};

/// Timeout des requêtes HTTP
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Source de données HTTP
#[derive(Debug, Clone)]
pub struct HttpSource {
    base_url: String,
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    /// URL d'un fichier avec paramètre anti-cache
    fn url_for(&self, file: &str) -> String {
        format!("{}/{}?{}", self.base_url, file, chrono::Utc::now().timestamp_millis())
    }
}

impl ChartDataSource for HttpSource {
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    async fn load_chart_data(&self) -> Result<ChartData> {
        let url = self.url_for(CHART_DATA_FILE);
        debug!(url = %url, "Fetching chart data");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("HTTP request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            bail!("Chart data server returned HTTP {}", status);
        }

        let data: ChartData = response
            .json()
            .await
            .context("Failed to parse chart data JSON")?;

        info!(
            candles = data.candlestick.len(),
            indicators = data.indicators.len(),
            "Fetched chart data"
        );
        Ok(data)
    }

    async fn load_strategy_config(&self, strategy: &str) -> Option<Overrides> {
        let url = self.url_for(&format!("{strategy}.config"));

        let response = match self.client.get(&url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                debug!(url = %url, status = %response.status(), "No strategy config");
                return None;
            }
            Err(e) => {
                warn!(url = %url, error = %e, "Failed to fetch strategy config");
                return None;
            }
        };

        let content = response.text().await.ok()?;
        parse_strategy_config(&content)
    }
}
