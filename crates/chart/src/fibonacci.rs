use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FibonacciLevel {
    pub name: &'static str,
    pub value: f64,
}

/// Retracement levels for a high/low pair.
///
/// An uptrend anchors 0% at `low` and climbs to `high`; a downtrend anchors
/// 0% at `high` and descends. The six names come back in the same order
/// either way. `high >= low` and both finite are the caller's job.
pub fn compute(high: f64, low: f64, uptrend: bool) -> [FibonacciLevel; 6] {
    let range = high - low;
    let midpoint = (high + low) / 2.0;

    let (anchor, far, direction) = if uptrend {
        (low, high, 1.0)
    } else {
        (high, low, -1.0)
    };
    let at = |ratio: f64| anchor + direction * range * ratio;

    [
        FibonacciLevel { name: "0%", value: anchor },
        FibonacciLevel { name: "23.6%", value: at(0.236) },
        FibonacciLevel { name: "38.2%", value: at(0.382) },
        FibonacciLevel { name: "50%", value: midpoint },
        FibonacciLevel { name: "61.8%", value: at(0.618) },
        FibonacciLevel { name: "100%", value: far },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAMES: [&str; 6] = ["0%", "23.6%", "38.2%", "50%", "61.8%", "100%"];

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_names_fixed_order_both_trends() {
        for uptrend in [true, false] {
            let names: Vec<&str> = compute(105.0, 95.0, uptrend).iter().map(|l| l.name).collect();
            assert_eq!(names, NAMES);
        }
    }

    #[test]
    fn test_uptrend_levels_anchor_at_low() {
        let levels = compute(200.0, 100.0, true);
        assert_close(levels[0].value, 100.0);
        assert_close(levels[1].value, 123.6);
        assert_close(levels[2].value, 138.2);
        assert_close(levels[3].value, 150.0);
        assert_close(levels[4].value, 161.8);
        assert_close(levels[5].value, 200.0);
    }

    #[test]
    fn test_downtrend_levels_anchor_at_high() {
        let levels = compute(105.0, 95.0, false);
        assert_close(levels[0].value, 105.0);
        assert_close(levels[1].value, 102.64);
        assert_close(levels[3].value, 100.0);
        assert_close(levels[5].value, 95.0);
    }

    #[test]
    fn test_trends_mirror_around_midpoint() {
        let pairs = [(105.0, 95.0), (3120.55, 2875.1), (1.0, 1.0), (0.0, -40.0)];

        for (high, low) in pairs {
            let up = compute(high, low, true);
            let down = compute(high, low, false);
            let midpoint = (high + low) / 2.0;

            assert_close(up[3].value, midpoint);
            assert_close(down[3].value, midpoint);
            for (u, d) in up.iter().zip(down.iter()) {
                assert_close(u.value - midpoint, midpoint - d.value);
            }
        }
    }
}
