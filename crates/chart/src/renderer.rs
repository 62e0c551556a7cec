use common::DashboardError;
#[cfg(test)]
use mockall::automock;
use tracing::{debug, info};

use crate::figure::{Axis, AxisRange, Layout, Legend, Timestamp, Title, Trace};

/// Host-provided chart container, addressed by element id.
#[cfg_attr(test, automock)]
pub trait ChartSurface: Send {
    /// `Ok(None)` when the container exists but holds no figure yet,
    /// `Err(MissingSurface)` when there is no such container.
    fn current_layout(&self, chart_id: &str) -> Result<Option<Layout>, DashboardError>;

    /// Replaces the whole figure.
    fn react(
        &mut self,
        chart_id: &str,
        traces: Vec<Trace>,
        layout: Layout,
    ) -> Result<(), DashboardError>;

    /// Swaps the traces and merges the layout patch in a single redraw.
    fn update(
        &mut self,
        chart_id: &str,
        traces: Vec<Trace>,
        patch: Layout,
    ) -> Result<(), DashboardError>;

    /// Appends points to one trace, keeping at most `max_points` of them.
    fn extend_traces(
        &mut self,
        chart_id: &str,
        trace_index: usize,
        points: Vec<(Timestamp, f64)>,
        max_points: Option<usize>,
    ) -> Result<(), DashboardError>;
}

#[derive(Debug, Clone, Default)]
pub enum ChartState {
    #[default]
    Uninitialized,
    Initialized { traces: Vec<Trace>, layout: Layout },
}

/// Sole writer of one chart surface.
pub struct ChartRenderer<S> {
    chart_id: String,
    title: String,
    surface: S,
    state: ChartState,
}

impl<S: ChartSurface> ChartRenderer<S> {
    pub fn new(chart_id: &str, title: &str, surface: S) -> Self {
        Self {
            chart_id: chart_id.to_string(),
            title: title.to_string(),
            surface,
            state: ChartState::Uninitialized,
        }
    }

    pub fn chart_id(&self) -> &str {
        &self.chart_id
    }

    pub fn state(&self) -> &ChartState {
        &self.state
    }

    pub fn is_initialized(&self) -> bool {
        matches!(self.state, ChartState::Initialized { .. })
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// First draw: axes, RSI side axis and legend, plus the patch's shapes and annotations.
    pub fn initialize(&mut self, traces: Vec<Trace>, patch: Layout) -> Result<(), DashboardError> {
        let mut layout = self.base_layout();
        layout.shapes = patch.shapes;
        layout.annotations = patch.annotations;

        self.surface
            .react(&self.chart_id, traces.clone(), layout.clone())?;

        info!("Chart '{}' initialized with {} traces", self.chart_id, traces.len());
        self.state = ChartState::Initialized { traces, layout };
        Ok(())
    }

    /// Applies a frame. On a live chart the current axis ranges are read back
    /// and pinned so a user's zoom or pan survives the redraw.
    pub fn update(&mut self, traces: Vec<Trace>, mut patch: Layout) -> Result<(), DashboardError> {
        let Some(current) = self.surface.current_layout(&self.chart_id)? else {
            return self.initialize(traces, patch);
        };

        if let Some(range) = current.x_range() {
            patch.xaxis = Some(Axis::pinned(range.clone()));
        }
        if let Some(range) = current.y_range() {
            patch.yaxis = Some(Axis::pinned(range.clone()));
        }

        self.surface
            .update(&self.chart_id, traces.clone(), patch.clone())?;

        let mut layout = match std::mem::take(&mut self.state) {
            ChartState::Initialized { layout, .. } => layout,
            ChartState::Uninitialized => current,
        };
        layout.merge(patch);

        debug!("Chart '{}' updated with {} traces", self.chart_id, traces.len());
        self.state = ChartState::Initialized { traces, layout };
        Ok(())
    }

    fn base_layout(&self) -> Layout {
        Layout {
            title: Some(Title::new(&self.title)),
            xaxis: Some(Axis::titled("Date/Time")),
            yaxis: Some(Axis {
                tickprefix: Some("$".to_string()),
                showline: Some(true),
                zeroline: Some(false),
                ..Axis::titled("Price (USD)")
            }),
            yaxis2: Some(Axis {
                overlaying: Some("y".to_string()),
                side: Some("right".to_string()),
                range: Some(AxisRange::Linear([0.0, 100.0])),
                ..Axis::titled("RSI")
            }),
            shapes: None,
            annotations: None,
            legend: Some(Legend::horizontal_below()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::TraceMode;
    use crate::surface::MemorySurface;
    use chrono::{TimeZone, Utc};
    use mockall::predicate::eq;

    const CHART: &str = "tradingChart";

    fn traces(offset: f64) -> Vec<Trace> {
        let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 6, 1, 1, 0, 0).unwrap();
        vec![Trace::scatter(
            "Real Prices",
            TraceMode::Lines,
            vec![t0, t1],
            vec![100.0 + offset, 110.0 + offset],
        )]
    }

    fn renderer(surface: MemorySurface) -> ChartRenderer<MemorySurface> {
        ChartRenderer::new(CHART, "ETH/USD Trading Chart", surface)
    }

    #[test]
    fn test_first_update_initializes_chart() {
        let surface = MemorySurface::with_containers([CHART]);
        let mut renderer = renderer(surface.clone());
        assert!(!renderer.is_initialized());

        renderer.update(traces(0.0), Layout::default()).unwrap();

        assert!(renderer.is_initialized());
        let figure = surface.figure(CHART).unwrap();
        let layout = figure.layout;
        assert_eq!(layout.title, Some(Title::new("ETH/USD Trading Chart")));
        assert_eq!(
            layout.yaxis2.as_ref().and_then(|a| a.range.clone()),
            Some(AxisRange::Linear([0.0, 100.0]))
        );
        assert_eq!(layout.yaxis2.unwrap().side.as_deref(), Some("right"));
        assert_eq!(layout.legend.unwrap().orientation, "h");
    }

    #[test]
    fn test_update_preserves_user_zoom() {
        let surface = MemorySurface::with_containers([CHART]);
        let mut renderer = renderer(surface.clone());
        renderer.update(traces(0.0), Layout::default()).unwrap();

        let zoom = AxisRange::Linear([102.0, 104.0]);
        surface.relayout(CHART, None, Some(zoom.clone())).unwrap();

        renderer.update(traces(50.0), Layout::default()).unwrap();

        let layout = surface.figure(CHART).unwrap().layout;
        assert_eq!(layout.y_range(), Some(&zoom));
        assert_eq!(layout.yaxis.as_ref().unwrap().autorange, Some(false));
        assert_eq!(
            layout.yaxis.unwrap().title,
            Some(Title::new("Price (USD)")),
            "pinning must not drop the axis title"
        );
    }

    #[test]
    fn test_repeated_update_is_idempotent_for_ranges() {
        let surface = MemorySurface::with_containers([CHART]);
        let mut renderer = renderer(surface.clone());
        renderer.update(traces(0.0), Layout::default()).unwrap();
        renderer.update(traces(0.0), Layout::default()).unwrap();

        let first = surface.figure(CHART).unwrap().layout;
        renderer.update(traces(0.0), Layout::default()).unwrap();
        let second = surface.figure(CHART).unwrap().layout;

        assert!(first.x_range().is_some());
        assert_eq!(first.x_range(), second.x_range());
        assert_eq!(first.y_range(), second.y_range());
    }

    #[test]
    fn test_missing_container_fails_without_state_change() {
        let surface = MemorySurface::default();
        let mut renderer = renderer(surface);

        let err = renderer.update(traces(0.0), Layout::default()).unwrap_err();
        assert!(matches!(err, DashboardError::MissingSurface(ref id) if id == CHART));
        assert!(!renderer.is_initialized());
    }

    #[test]
    fn test_existing_figure_is_treated_as_initialized() {
        let surface = MemorySurface::with_containers([CHART]);
        renderer(surface.clone())
            .update(traces(0.0), Layout::default())
            .unwrap();
        surface
            .relayout(CHART, None, Some(AxisRange::Linear([1.0, 2.0])))
            .unwrap();

        // A fresh renderer, e.g. after a service restart, must not reset the view.
        let mut restarted = renderer(surface.clone());
        restarted.update(traces(5.0), Layout::default()).unwrap();

        let layout = surface.figure(CHART).unwrap().layout;
        assert_eq!(layout.y_range(), Some(&AxisRange::Linear([1.0, 2.0])));
        assert!(restarted.is_initialized());
    }

    #[test]
    fn test_update_sends_single_pinned_patch() {
        let current = Layout {
            xaxis: Some(Axis::pinned(AxisRange::Linear([0.0, 10.0]))),
            yaxis: Some(Axis::pinned(AxisRange::Linear([5.0, 6.0]))),
            ..Default::default()
        };

        let mut surface = MockChartSurface::new();
        surface
            .expect_current_layout()
            .with(eq(CHART))
            .times(1)
            .returning(move |_| Ok(Some(current.clone())));
        surface.expect_react().never();
        surface
            .expect_update()
            .times(1)
            .withf(|id, traces, patch| {
                id == CHART
                    && traces.len() == 1
                    && patch.x_range() == Some(&AxisRange::Linear([0.0, 10.0]))
                    && patch.yaxis.as_ref().is_some_and(|a| a.is_pinned())
            })
            .returning(|_, _, _| Ok(()));

        let mut renderer = ChartRenderer::new(CHART, "ETH/USD Trading Chart", surface);
        renderer.update(traces(0.0), Layout::default()).unwrap();
    }
}
