//! Plotly-shaped figure model.
//!
//! Field names follow Plotly's JSON schema so a serialized [`Figure`] can be
//! handed to `Plotly.react` as is. Every optional attribute is skipped when
//! unset, which is what lets a [`Layout`] double as a partial patch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type Timestamp = DateTime<Utc>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceMode {
    #[serde(rename = "lines")]
    Lines,
    #[serde(rename = "markers")]
    Markers,
    #[serde(rename = "lines+markers")]
    LinesMarkers,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dash {
    Solid,
    Dot,
    Dash,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Line {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dash: Option<Dash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
}

impl Line {
    pub fn color(color: &str) -> Self {
        Self {
            color: Some(color.to_string()),
            ..Default::default()
        }
    }

    pub fn dotted(color: &str) -> Self {
        Self {
            color: Some(color.to_string()),
            dash: Some(Dash::Dot),
            ..Default::default()
        }
    }

    pub fn hidden() -> Self {
        Self {
            width: Some(0.0),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MarkerColor {
    Uniform(String),
    PerPoint(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub color: MarkerColor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(rename = "type")]
    pub kind: String,
    pub x: Vec<Timestamp>,
    pub y: Vec<f64>,
    pub mode: TraceMode,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<Line>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marker: Option<Marker>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<String>,
}

impl Trace {
    pub fn scatter(name: impl Into<String>, mode: TraceMode, x: Vec<Timestamp>, y: Vec<f64>) -> Self {
        Self {
            kind: "scatter".to_string(),
            x,
            y,
            mode,
            name: name.into(),
            line: None,
            marker: None,
            yaxis: None,
        }
    }

    pub fn with_line(mut self, line: Line) -> Self {
        self.line = Some(line);
        self
    }

    pub fn with_marker(mut self, marker: Marker) -> Self {
        self.marker = Some(marker);
        self
    }

    pub fn on_axis(mut self, axis: &str) -> Self {
        self.yaxis = Some(axis.to_string());
        self
    }

    /// Whether the trace is plotted against the primary y axis.
    pub fn on_primary_axis(&self) -> bool {
        matches!(self.yaxis.as_deref(), None | Some("y"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    #[serde(rename = "type")]
    pub kind: String,
    pub xref: String,
    pub yref: String,
    pub x0: Timestamp,
    pub x1: Timestamp,
    pub y0: f64,
    pub y1: f64,
    pub fillcolor: String,
    pub line: Line,
}

impl Shape {
    pub fn rect(x0: Timestamp, x1: Timestamp, y0: f64, y1: f64, fillcolor: &str) -> Self {
        Self {
            kind: "rect".to_string(),
            xref: "x".to_string(),
            yref: "y".to_string(),
            x0,
            x1,
            y0,
            y1,
            fillcolor: fillcolor.to_string(),
            line: Line::hidden(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub x: Timestamp,
    pub y: f64,
    pub xref: String,
    pub yref: String,
    pub text: String,
    pub showarrow: bool,
    pub arrowhead: u8,
    pub ax: f64,
    pub ay: f64,
    pub font: Font,
}

impl Annotation {
    /// Arrow annotation pointing at `(x, y)`, label offset vertically by `ay` px.
    pub fn arrow(x: Timestamp, y: f64, text: String, ay: f64, color: &str) -> Self {
        Self {
            x,
            y,
            xref: "x".to_string(),
            yref: "y".to_string(),
            text,
            showarrow: true,
            arrowhead: 6,
            ax: 0.0,
            ay,
            font: Font {
                color: color.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisRange {
    Linear([f64; 2]),
    Time([Timestamp; 2]),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Title {
    pub text: String,
}

impl Title {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Axis {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<AxisRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autorange: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickprefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub showline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zeroline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlaying: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<String>,
}

impl Axis {
    pub fn titled(title: &str) -> Self {
        Self {
            title: Some(Title::new(title)),
            ..Default::default()
        }
    }

    /// A fixed range that autorange must not override.
    pub fn pinned(range: AxisRange) -> Self {
        Self {
            range: Some(range),
            autorange: Some(false),
            ..Default::default()
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.autorange == Some(false) && self.range.is_some()
    }

    pub fn merge(&mut self, patch: Axis) {
        if patch.title.is_some() {
            self.title = patch.title;
        }
        if patch.range.is_some() {
            self.range = patch.range;
        }
        if patch.autorange.is_some() {
            self.autorange = patch.autorange;
        }
        if patch.tickprefix.is_some() {
            self.tickprefix = patch.tickprefix;
        }
        if patch.showline.is_some() {
            self.showline = patch.showline;
        }
        if patch.zeroline.is_some() {
            self.zeroline = patch.zeroline;
        }
        if patch.overlaying.is_some() {
            self.overlaying = patch.overlaying;
        }
        if patch.side.is_some() {
            self.side = patch.side;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    pub orientation: String,
    pub x: f64,
    pub y: f64,
    pub xanchor: String,
    pub yanchor: String,
}

impl Legend {
    pub fn horizontal_below() -> Self {
        Self {
            orientation: "h".to_string(),
            x: 0.5,
            y: -0.3,
            xanchor: "center".to_string(),
            yanchor: "bottom".to_string(),
        }
    }
}

/// Full layout or a partial patch; unset fields leave the target untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<Title>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yaxis2: Option<Axis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shapes: Option<Vec<Shape>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotations: Option<Vec<Annotation>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legend: Option<Legend>,
}

impl Layout {
    pub fn merge(&mut self, patch: Layout) {
        if patch.title.is_some() {
            self.title = patch.title;
        }
        merge_axis(&mut self.xaxis, patch.xaxis);
        merge_axis(&mut self.yaxis, patch.yaxis);
        merge_axis(&mut self.yaxis2, patch.yaxis2);
        if patch.shapes.is_some() {
            self.shapes = patch.shapes;
        }
        if patch.annotations.is_some() {
            self.annotations = patch.annotations;
        }
        if patch.legend.is_some() {
            self.legend = patch.legend;
        }
    }

    pub fn x_range(&self) -> Option<&AxisRange> {
        self.xaxis.as_ref().and_then(|a| a.range.as_ref())
    }

    pub fn y_range(&self) -> Option<&AxisRange> {
        self.yaxis.as_ref().and_then(|a| a.range.as_ref())
    }
}

fn merge_axis(target: &mut Option<Axis>, patch: Option<Axis>) {
    match (target.as_mut(), patch) {
        (Some(axis), Some(patch)) => axis.merge(patch),
        (None, Some(patch)) => *target = Some(patch),
        (_, None) => {}
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub data: Vec<Trace>,
    pub layout: Layout,
}
