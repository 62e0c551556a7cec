use common::DashboardError;
use common::config::SamplingConfig;
use common::models::{MarketUpdate, sanitized};
use tracing::{debug, warn};

use crate::fibonacci::{self, FibonacciLevel};
use crate::figure::{
    Annotation, Layout, Line, Marker, MarkerColor, Shape, Timestamp, Trace, TraceMode,
};

const TAKE_PROFIT_FILL: &str = "rgba(0, 255, 0, 0.2)";
const STOP_LOSS_FILL: &str = "rgba(255, 0, 0, 0.2)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendDecision {
    pub uptrend: bool,
}

impl TrendDecision {
    pub fn label(&self) -> &'static str {
        if self.uptrend { "Uptrend" } else { "Downtrend" }
    }

    pub fn color(&self) -> &'static str {
        if self.uptrend { "green" } else { "red" }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiZone {
    pub fn classify(rsi: f64) -> Self {
        if rsi > 70.0 {
            Self::Overbought
        } else if rsi < 30.0 {
            Self::Oversold
        } else {
            Self::Neutral
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Overbought => "rgba(0, 255, 0, 0.2)",
            Self::Oversold => "rgba(255, 0, 0, 0.2)",
            Self::Neutral => "rgba(128, 128, 128, 0.2)",
        }
    }
}

/// Everything one `update_chart` push turns into.
#[derive(Debug, Clone)]
pub struct ChartFrame {
    pub traces: Vec<Trace>,
    pub layout: Layout,
    pub trend: TrendDecision,
    pub high: f64,
    pub low: f64,
    pub levels: [FibonacciLevel; 6],
}

pub struct ChartDataTransformer {
    sampling: SamplingConfig,
}

impl ChartDataTransformer {
    pub fn new(sampling: SamplingConfig) -> Self {
        Self { sampling }
    }

    pub fn sampling(&self) -> SamplingConfig {
        self.sampling
    }

    /// Builds traces and the layout patch for one update, stamped relative to `now`.
    pub fn transform(
        &self,
        update: &MarketUpdate,
        now: Timestamp,
    ) -> Result<ChartFrame, DashboardError> {
        let (high, low) = window_range(&update.prices, self.sampling.window_samples())?;

        let current_price = sanitized(update.current_price);
        let signal_price = sanitized(update.entry_price);
        let take_profit = sanitized(update.take_profit);
        let stop_loss = sanitized(update.stop_loss);

        let interval = self.sampling.interval;
        let n = update.prices.len();
        let real_x = (0..n)
            .map(|i| shifted(now, interval, n - i, false))
            .collect::<Result<Vec<_>, _>>()?;
        let predicted_x = (1..=update.predicted_prices.len())
            .map(|i| shifted(now, interval, i, true))
            .collect::<Result<Vec<_>, _>>()?;

        let trend = TrendDecision {
            uptrend: current_price > (high + low) / 2.0,
        };
        let levels = fibonacci::compute(high, low, trend.uptrend);

        debug!(
            "Window high={:.2} low={:.2} current={:.2} trend={}",
            high,
            low,
            current_price,
            trend.label()
        );

        let window_start = shifted(now, self.sampling.window, 1, false)?;
        let mut traces = Vec::with_capacity(9);
        traces.push(
            Trace::scatter(
                "Real Prices",
                TraceMode::LinesMarkers,
                real_x.clone(),
                update.prices.clone(),
            )
            .with_line(Line::color("blue")),
        );
        traces.push(
            Trace::scatter(
                "Predicted Prices",
                TraceMode::Lines,
                predicted_x.clone(),
                update.predicted_prices.clone(),
            )
            .with_line(Line::dotted("red")),
        );
        traces.extend(levels.iter().map(|level| {
            Trace::scatter(
                format!("{} Fibonacci", level.name),
                TraceMode::Lines,
                vec![window_start, now],
                vec![level.value, level.value],
            )
            .with_line(Line::dotted("orange"))
        }));
        traces.push(rsi_trace(&update.rsi, &real_x));

        // Zones start at the last real sample; without predictions they end at `now`.
        let zone_start = *real_x.last().unwrap_or(&now);
        let zone_end = predicted_x.last().copied().unwrap_or(now);

        let mut shapes = Vec::with_capacity(2);
        if signal_price != 0.0 && take_profit != 0.0 {
            shapes.push(Shape::rect(
                zone_start,
                zone_end,
                signal_price,
                take_profit,
                TAKE_PROFIT_FILL,
            ));
        }
        if signal_price != 0.0 && stop_loss != 0.0 {
            shapes.push(Shape::rect(
                zone_start,
                zone_end,
                signal_price,
                stop_loss,
                STOP_LOSS_FILL,
            ));
        }

        let annotations = vec![
            Annotation::arrow(now, high, format!("Highest Price: ${:.2}", high), -40.0, "green"),
            Annotation::arrow(now, low, format!("Lowest Price: ${:.2}", low), 40.0, "red"),
        ];

        Ok(ChartFrame {
            traces,
            layout: Layout {
                shapes: Some(shapes),
                annotations: Some(annotations),
                ..Default::default()
            },
            trend,
            high,
            low,
            levels,
        })
    }
}

/// High and low over the trailing `window` samples, skipping non-finite entries.
pub fn window_range(prices: &[f64], window: usize) -> Result<(f64, f64), DashboardError> {
    let start = prices.len().saturating_sub(window);

    let (high, low) = prices[start..]
        .iter()
        .filter(|p| p.is_finite())
        .fold((f64::NEG_INFINITY, f64::INFINITY), |(high, low), &p| {
            (high.max(p), low.min(p))
        });

    if !high.is_finite() || !low.is_finite() {
        return Err(DashboardError::InvalidRange { high, low });
    }

    Ok((high, low))
}

/// `now` moved `count` steps later or earlier. Historical sample `i` of `n`
/// sits `n - i` intervals before `now`, prediction `i` sits `i` after it.
fn shifted(
    now: Timestamp,
    step: chrono::Duration,
    count: usize,
    later: bool,
) -> Result<Timestamp, DashboardError> {
    i32::try_from(count)
        .ok()
        .and_then(|count| step.checked_mul(count))
        .and_then(|span| {
            if later {
                now.checked_add_signed(span)
            } else {
                now.checked_sub_signed(span)
            }
        })
        .ok_or_else(|| {
            DashboardError::InvalidPayload(format!(
                "{} steps of {} fall outside the time axis",
                count, step
            ))
        })
}

fn rsi_trace(rsi: &[f64], real_x: &[Timestamp]) -> Trace {
    let rsi = if rsi.len() > real_x.len() {
        warn!(
            "RSI series ({}) longer than price series ({}); keeping the most recent values",
            rsi.len(),
            real_x.len()
        );
        &rsi[rsi.len() - real_x.len()..]
    } else {
        rsi
    };

    let x = real_x[real_x.len() - rsi.len()..].to_vec();
    let colors = rsi
        .iter()
        .map(|&v| RsiZone::classify(v).color().to_string())
        .collect();

    Trace::scatter("Relative Strength Index", TraceMode::Markers, x, rsi.to_vec())
        .with_marker(Marker {
            color: MarkerColor::PerPoint(colors),
            size: Some(15.0),
            opacity: Some(0.4),
            symbol: Some("circle".to_string()),
        })
        .on_axis("y2")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn transformer() -> ChartDataTransformer {
        ChartDataTransformer::new(SamplingConfig::default())
    }

    fn update_with_prices(prices: Vec<f64>) -> MarketUpdate {
        MarketUpdate {
            prices,
            ..Default::default()
        }
    }

    #[test]
    fn test_trace_order_and_count() {
        let mut update = update_with_prices(vec![100.0, 101.0, 102.0]);
        update.predicted_prices = vec![103.0, 104.0];
        update.rsi = vec![50.0];

        let frame = transformer().transform(&update, now()).unwrap();
        let names: Vec<&str> = frame.traces.iter().map(|t| t.name.as_str()).collect();

        assert_eq!(
            names,
            vec![
                "Real Prices",
                "Predicted Prices",
                "0% Fibonacci",
                "23.6% Fibonacci",
                "38.2% Fibonacci",
                "50% Fibonacci",
                "61.8% Fibonacci",
                "100% Fibonacci",
                "Relative Strength Index",
            ]
        );
    }

    #[test]
    fn test_synthetic_timestamps() {
        let mut update = update_with_prices(vec![1.0, 2.0, 3.0]);
        update.predicted_prices = vec![4.0, 5.0];

        let frame = transformer().transform(&update, now()).unwrap();
        let real = &frame.traces[0];
        let predicted = &frame.traces[1];

        assert_eq!(real.x[0], now() - Duration::minutes(45));
        assert_eq!(real.x[2], now() - Duration::minutes(15));
        assert_eq!(predicted.x[0], now() + Duration::minutes(15));
        assert_eq!(predicted.x[1], now() + Duration::minutes(30));
    }

    #[test]
    fn test_downtrend_scenario_over_672_sample_window() {
        // 700 samples oscillating inside [95, 105]; the first 28 fall outside
        // the 7-day window and carry an outlier that must be ignored.
        let mut prices: Vec<f64> = (0..700)
            .map(|i| match i % 4 {
                0 => 100.0,
                1 => 102.0,
                2 => 101.0,
                _ => 98.0,
            })
            .collect();
        prices[5] = 250.0;
        prices[100] = 105.0;
        prices[400] = 95.0;

        let mut update = update_with_prices(prices);
        update.current_price = Some(99.0);

        let frame = transformer().transform(&update, now()).unwrap();

        assert_eq!((frame.high, frame.low), (105.0, 95.0));
        assert!(!frame.trend.uptrend);
        assert_eq!(frame.trend.label(), "Downtrend");
        assert_eq!(frame.levels[0].value, 105.0);
        assert_eq!(frame.levels[5].value, 95.0);

        let zero_line = &frame.traces[2];
        assert_eq!(zero_line.y, vec![105.0, 105.0]);
        assert_eq!(zero_line.x, vec![now() - Duration::days(7), now()]);
    }

    #[test]
    fn test_uptrend_when_price_above_midpoint() {
        let mut update = update_with_prices(vec![95.0, 105.0]);
        update.current_price = Some(101.0);

        let frame = transformer().transform(&update, now()).unwrap();
        assert!(frame.trend.uptrend);
        assert_eq!(frame.levels[0].value, 95.0);
        assert_eq!(frame.trend.color(), "green");
    }

    #[test]
    fn test_invalid_current_price_counts_as_zero() {
        let mut update = update_with_prices(vec![95.0, 105.0]);
        update.current_price = Some(f64::NAN);

        let frame = transformer().transform(&update, now()).unwrap();
        assert!(!frame.trend.uptrend);
    }

    #[test]
    fn test_empty_prices_is_invalid_range() {
        let err = transformer()
            .transform(&update_with_prices(vec![]), now())
            .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidRange { .. }));
    }

    #[test]
    fn test_time_axis_overflow_is_an_error_not_a_panic() {
        let sampling = SamplingConfig {
            interval: Duration::days(100_000),
            window: Duration::days(1_000_000),
        };
        let prices = (0..2_000).map(|i| 100.0 + (i % 7) as f64).collect();

        let err = ChartDataTransformer::new(sampling)
            .transform(&update_with_prices(prices), now())
            .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidPayload(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_all_invalid_prices_is_invalid_range() {
        let err = transformer()
            .transform(&update_with_prices(vec![f64::NAN, f64::NAN]), now())
            .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidRange { .. }));
    }

    #[test]
    fn test_empty_rsi_yields_empty_trace() {
        let frame = transformer()
            .transform(&update_with_prices(vec![100.0, 101.0]), now())
            .unwrap();
        let rsi = frame.traces.last().unwrap();

        assert!(rsi.x.is_empty());
        assert!(rsi.y.is_empty());
        assert_eq!(rsi.yaxis.as_deref(), Some("y2"));
    }

    #[test]
    fn test_rsi_tail_alignment_and_zones() {
        let mut update = update_with_prices(vec![100.0, 101.0, 102.0, 103.0, 104.0]);
        update.rsi = vec![75.0, 50.0, 25.0];

        let frame = transformer().transform(&update, now()).unwrap();
        let real = &frame.traces[0];
        let rsi = frame.traces.last().unwrap();

        assert_eq!(rsi.x, real.x[2..].to_vec());
        let expected: Vec<String> = [RsiZone::Overbought, RsiZone::Neutral, RsiZone::Oversold]
            .iter()
            .map(|z| z.color().to_string())
            .collect();
        assert_eq!(
            rsi.marker.as_ref().map(|m| m.color.clone()),
            Some(MarkerColor::PerPoint(expected))
        );
    }

    #[test]
    fn test_rsi_longer_than_prices_keeps_tail() {
        let mut update = update_with_prices(vec![100.0, 101.0]);
        update.rsi = vec![10.0, 20.0, 80.0];

        let frame = transformer().transform(&update, now()).unwrap();
        let rsi = frame.traces.last().unwrap();
        assert_eq!(rsi.y, vec![20.0, 80.0]);
        assert_eq!(rsi.x.len(), 2);
    }

    #[test]
    fn test_take_profit_and_stop_loss_zones() {
        let mut update = update_with_prices(vec![98.0, 99.0, 100.0]);
        update.predicted_prices = vec![101.0, 102.0, 103.0];
        update.entry_price = Some(100.0);
        update.take_profit = Some(110.0);
        update.stop_loss = Some(95.0);
        update.signal = Some("Buy (72%)".to_string());

        let frame = transformer().transform(&update, now()).unwrap();
        let shapes = frame.layout.shapes.unwrap();

        assert_eq!(shapes.len(), 2);
        let (tp, sl) = (&shapes[0], &shapes[1]);
        assert_eq!((tp.y0, tp.y1), (100.0, 110.0));
        assert_eq!(tp.fillcolor, TAKE_PROFIT_FILL);
        assert_eq!((sl.y0, sl.y1), (100.0, 95.0));
        assert_eq!(sl.fillcolor, STOP_LOSS_FILL);
        assert_eq!(tp.x0, now() - Duration::minutes(15));
        assert_eq!(tp.x1, now() + Duration::minutes(45));
    }

    #[test]
    fn test_zones_skipped_without_signal_price() {
        let mut update = update_with_prices(vec![98.0, 99.0]);
        update.take_profit = Some(110.0);
        update.stop_loss = Some(f64::NAN);

        let frame = transformer().transform(&update, now()).unwrap();
        assert_eq!(frame.layout.shapes, Some(vec![]));
    }

    #[test]
    fn test_zone_ends_at_now_without_predictions() {
        let mut update = update_with_prices(vec![98.0, 99.0]);
        update.entry_price = Some(99.0);
        update.stop_loss = Some(97.0);

        let frame = transformer().transform(&update, now()).unwrap();
        let shapes = frame.layout.shapes.unwrap();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].x1, now());
    }

    #[test]
    fn test_high_low_annotations() {
        let frame = transformer()
            .transform(&update_with_prices(vec![95.0, 105.0, 100.0]), now())
            .unwrap();
        let annotations = frame.layout.annotations.unwrap();

        assert_eq!(annotations[0].text, "Highest Price: $105.00");
        assert_eq!(annotations[0].y, 105.0);
        assert_eq!(annotations[0].ay, -40.0);
        assert_eq!(annotations[1].text, "Lowest Price: $95.00");
        assert_eq!(annotations[1].font.color, "red");
        assert_eq!(annotations[1].x, now());
    }
}
