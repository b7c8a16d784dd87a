// ============================================================================
// Source : répertoire local
// ============================================================================
// Lit `chart-data.json` et `<strategie>.config` dans un répertoire, avec les
// I/O asynchrones de tokio.
// ============================================================================

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info, instrument};

use super::{parse_strategy_config, ChartDataSource, CHART_DATA_FILE};
use crate::models::{ChartData, Overrides};

/// Source de données lisant un répertoire
#[derive(Debug, Clone)]
pub struct FileSource {
    dir: PathBuf,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ChartDataSource for FileSource {
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    async fn load_chart_data(&self) -> Result<ChartData> {
        let path = self.dir.join(CHART_DATA_FILE);
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let data: ChartData = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        info!(
            candles = data.candlestick.len(),
            indicators = data.indicators.len(),
            "Loaded chart data"
        );
        Ok(data)
    }

    async fn load_strategy_config(&self, strategy: &str) -> Option<Overrides> {
        let path = self.dir.join(format!("{strategy}.config"));
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => parse_strategy_config(&content),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No strategy config");
                None
            }
        }
    }
}
