use std::path::Path;

use chart::MemorySurface;
use tracing::{debug, warn};

/// Writes `<dir>/<chart_id>.json` with the chart's current Plotly figure.
pub async fn write_snapshot(dir: &Path, surface: &MemorySurface, chart_id: &str) {
    let json = match surface.figure_json(chart_id) {
        Ok(Some(json)) => json,
        Ok(None) => return,
        Err(e) => {
            warn!("Cannot serialize '{}': {}", chart_id, e);
            return;
        }
    };

    let path = dir.join(format!("{}.json", chart_id));
    match tokio::fs::write(&path, json).await {
        Ok(()) => debug!("Snapshot written to {}", path.display()),
        Err(e) => warn!("Failed to write snapshot {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chart::ChartSurface;
    use chart::figure::Layout;

    #[tokio::test]
    async fn test_writes_figure_json() {
        let dir = std::env::temp_dir().join(format!("dashboard-snapshot-{}", uuid::Uuid::new_v4()));
        tokio::fs::create_dir_all(&dir).await.unwrap();

        let mut surface = MemorySurface::with_containers(["tradingChart", "performanceChart"]);
        surface
            .react("tradingChart", vec![], Layout::default())
            .unwrap();

        write_snapshot(&dir, &surface, "tradingChart").await;
        write_snapshot(&dir, &surface, "performanceChart").await;

        let written = tokio::fs::read_to_string(dir.join("tradingChart.json"))
            .await
            .unwrap();
        assert!(written.contains("\"layout\""));
        assert!(!dir.join("performanceChart.json").exists());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
