use std::collections::VecDeque;

use common::DashboardError;
use common::models::PerformanceSample;
use tracing::{debug, info};

use crate::figure::{Axis, Layout, Line, Marker, MarkerColor, Title, Trace, TraceMode};
use crate::renderer::ChartSurface;

/// Fixed-capacity accuracy history; the oldest sample goes first.
#[derive(Debug, Clone)]
pub struct PerformanceHistory {
    samples: VecDeque<PerformanceSample>,
    capacity: usize,
}

impl PerformanceHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a sample and returns the one evicted to make room, if any.
    pub fn push(&mut self, sample: PerformanceSample) -> Option<PerformanceSample> {
        let evicted = if self.samples.len() == self.capacity {
            self.samples.pop_front()
        } else {
            None
        };
        self.samples.push_back(sample);
        evicted
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &PerformanceSample> {
        self.samples.iter()
    }

    pub fn latest(&self) -> Option<&PerformanceSample> {
        self.samples.back()
    }
}

/// Model accuracy line chart fed by `update_performance` pushes.
pub struct PerformancePanel<S> {
    chart_id: String,
    surface: S,
    history: PerformanceHistory,
}

impl<S: ChartSurface> PerformancePanel<S> {
    pub fn new(chart_id: &str, surface: S, capacity: usize) -> Self {
        Self {
            chart_id: chart_id.to_string(),
            surface,
            history: PerformanceHistory::new(capacity),
        }
    }

    pub fn history(&self) -> &PerformanceHistory {
        &self.history
    }

    pub fn record(&mut self, sample: PerformanceSample) -> Result<(), DashboardError> {
        if !sample.accuracy.is_finite() || !(0.0..=1.0).contains(&sample.accuracy) {
            return Err(DashboardError::InvalidPayload(format!(
                "accuracy must be within [0, 1], got {}",
                sample.accuracy
            )));
        }

        if let Some(evicted) = self.history.push(sample) {
            debug!("Evicted accuracy sample from {}", evicted.timestamp);
        }

        match self.surface.current_layout(&self.chart_id)? {
            Some(_) => self.surface.extend_traces(
                &self.chart_id,
                0,
                vec![(sample.timestamp, sample.accuracy)],
                Some(self.history.capacity()),
            ),
            None => {
                info!("Creating performance chart '{}'", self.chart_id);
                let trace = self.trace();
                self.surface.react(&self.chart_id, vec![trace], Self::layout())
            }
        }
    }

    fn trace(&self) -> Trace {
        let (x, y): (Vec<_>, Vec<_>) = self
            .history
            .iter()
            .map(|s| (s.timestamp, s.accuracy))
            .unzip();

        Trace::scatter("Accuracy over time", TraceMode::LinesMarkers, x, y)
            .with_line(Line::color("blue"))
            .with_marker(Marker {
                color: MarkerColor::Uniform("blue".to_string()),
                size: None,
                opacity: None,
                symbol: None,
            })
    }

    fn layout() -> Layout {
        Layout {
            title: Some(Title::new("Model Accuracy Over Time")),
            xaxis: Some(Axis::titled("Timestamp")),
            yaxis: Some(Axis::titled("Accuracy (%)")),
            ..Default::default()
        }
    }
}
