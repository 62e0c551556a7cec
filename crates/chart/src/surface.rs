use std::collections::HashMap;
use std::sync::Arc;

use common::DashboardError;
use parking_lot::RwLock;
use tracing::debug;

use crate::figure::{Axis, AxisRange, Figure, Layout, Timestamp, Trace};
use crate::renderer::ChartSurface;

/// In-process chart host.
///
/// Containers are mounted up front; each may hold one figure. Clones share the
/// same containers, and every write happens under one lock so readers never see
/// a half-applied frame. Axis ranges are resolved the way Plotly's autorange
/// does it unless the axis is pinned.
#[derive(Clone, Default)]
pub struct MemorySurface {
    containers: Arc<RwLock<HashMap<String, Option<Figure>>>>,
}

impl MemorySurface {
    pub fn with_containers<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let surface = Self::default();
        for id in ids {
            surface.mount(id);
        }
        surface
    }

    pub fn mount(&self, chart_id: impl Into<String>) {
        self.containers.write().entry(chart_id.into()).or_insert(None);
    }

    pub fn figure(&self, chart_id: &str) -> Option<Figure> {
        self.containers.read().get(chart_id).cloned().flatten()
    }

    /// Plotly figure JSON for the chart, `None` while nothing has been drawn.
    pub fn figure_json(&self, chart_id: &str) -> Result<Option<String>, DashboardError> {
        self.figure(chart_id)
            .map(|figure| serde_json::to_string(&figure))
            .transpose()
            .map_err(DashboardError::from)
    }

    /// Fixes axis ranges the way a user zoom or pan does.
    pub fn relayout(
        &self,
        chart_id: &str,
        x: Option<AxisRange>,
        y: Option<AxisRange>,
    ) -> Result<(), DashboardError> {
        self.with_figure(chart_id, |figure| {
            let patch = Layout {
                xaxis: x.map(Axis::pinned),
                yaxis: y.map(Axis::pinned),
                ..Default::default()
            };
            figure.layout.merge(patch);
            Ok(())
        })
    }

    fn with_figure<T>(
        &self,
        chart_id: &str,
        f: impl FnOnce(&mut Figure) -> Result<T, DashboardError>,
    ) -> Result<T, DashboardError> {
        let mut containers = self.containers.write();
        let slot = containers
            .get_mut(chart_id)
            .ok_or_else(|| DashboardError::MissingSurface(chart_id.to_string()))?;
        let figure = slot
            .as_mut()
            .ok_or_else(|| DashboardError::MissingSurface(chart_id.to_string()))?;
        f(figure)
    }

    fn store(&self, chart_id: &str, mut figure: Figure) -> Result<(), DashboardError> {
        let mut containers = self.containers.write();
        let slot = containers
            .get_mut(chart_id)
            .ok_or_else(|| DashboardError::MissingSurface(chart_id.to_string()))?;
        resolve_ranges(&mut figure);
        *slot = Some(figure);
        Ok(())
    }
}

impl ChartSurface for MemorySurface {
    fn current_layout(&self, chart_id: &str) -> Result<Option<Layout>, DashboardError> {
        match self.containers.read().get(chart_id) {
            Some(slot) => Ok(slot.as_ref().map(|figure| figure.layout.clone())),
            None => Err(DashboardError::MissingSurface(chart_id.to_string())),
        }
    }

    fn react(
        &mut self,
        chart_id: &str,
        traces: Vec<Trace>,
        layout: Layout,
    ) -> Result<(), DashboardError> {
        self.store(
            chart_id,
            Figure {
                data: traces,
                layout,
            },
        )
    }

    fn update(
        &mut self,
        chart_id: &str,
        traces: Vec<Trace>,
        patch: Layout,
    ) -> Result<(), DashboardError> {
        let mut containers = self.containers.write();
        let slot = containers
            .get_mut(chart_id)
            .ok_or_else(|| DashboardError::MissingSurface(chart_id.to_string()))?;

        let mut figure = slot.take().unwrap_or_default();
        figure.data = traces;
        figure.layout.merge(patch);
        resolve_ranges(&mut figure);
        *slot = Some(figure);
        Ok(())
    }

    fn extend_traces(
        &mut self,
        chart_id: &str,
        trace_index: usize,
        points: Vec<(Timestamp, f64)>,
        max_points: Option<usize>,
    ) -> Result<(), DashboardError> {
        self.with_figure(chart_id, |figure| {
            let trace = figure.data.get_mut(trace_index).ok_or_else(|| {
                DashboardError::InvalidPayload(format!(
                    "trace {} does not exist on '{}'",
                    trace_index, chart_id
                ))
            })?;

            for (x, y) in points {
                trace.x.push(x);
                trace.y.push(y);
            }
            if let Some(max) = max_points {
                let excess = trace.x.len().saturating_sub(max);
                if excess > 0 {
                    trace.x.drain(..excess);
                    trace.y.drain(..excess);
                    debug!("Dropped {} old points from '{}'", excess, chart_id);
                }
            }

            resolve_ranges(figure);
            Ok(())
        })
    }
}

/// Autoranges every axis that is not pinned, from traces, shapes and annotations.
fn resolve_ranges(figure: &mut Figure) {
    let Figure { data, layout } = figure;

    let x_range = time_extent(
        data.iter()
            .flat_map(|t| t.x.iter().copied())
            .chain(layout.shapes.iter().flatten().flat_map(|s| [s.x0, s.x1]))
            .chain(layout.annotations.iter().flatten().map(|a| a.x)),
    );
    let y_range = value_extent(
        data.iter()
            .filter(|t| t.on_primary_axis())
            .flat_map(|t| t.y.iter().copied())
            .chain(layout.shapes.iter().flatten().flat_map(|s| [s.y0, s.y1]))
            .chain(layout.annotations.iter().flatten().map(|a| a.y)),
    );

    autorange(&mut layout.xaxis, x_range.map(AxisRange::Time));
    autorange(&mut layout.yaxis, y_range.map(AxisRange::Linear));
}

fn autorange(axis: &mut Option<Axis>, computed: Option<AxisRange>) {
    let axis = axis.get_or_insert_with(Axis::default);
    if axis.is_pinned() {
        return;
    }
    axis.range = computed;
}

fn time_extent(values: impl Iterator<Item = Timestamp>) -> Option<[Timestamp; 2]> {
    values.fold(None, |acc, t| match acc {
        None => Some([t, t]),
        Some([lo, hi]) => Some([lo.min(t), hi.max(t)]),
    })
}

fn value_extent(values: impl Iterator<Item = f64>) -> Option<[f64; 2]> {
    values.filter(|v| v.is_finite()).fold(None, |acc, v| match acc {
        None => Some([v, v]),
        Some([lo, hi]) => Some([lo.min(v), hi.max(v)]),
    })
}
