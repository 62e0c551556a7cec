pub mod fibonacci;
pub mod figure;
pub mod performance;
pub mod renderer;
pub mod surface;
pub mod transform;

pub use fibonacci::FibonacciLevel;
pub use figure::{Figure, Layout, Timestamp, Trace};
pub use performance::{PerformanceHistory, PerformancePanel};
pub use renderer::{ChartRenderer, ChartState, ChartSurface};
pub use surface::MemorySurface;
pub use transform::{ChartDataTransformer, ChartFrame, RsiZone, TrendDecision};

pub const TRADING_CHART: &str = "tradingChart";
pub const PERFORMANCE_CHART: &str = "performanceChart";
