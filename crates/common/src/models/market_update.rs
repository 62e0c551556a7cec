use serde::{Deserialize, Deserializer, Serialize};

/// One `update_chart` push from the signal server.
///
/// Scalars the server could not compute arrive as `null` (or a bare `NaN`,
/// which the transport maps to `null` before decoding) and land here as
/// `None`. Series entries keep their position and become `NaN`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketUpdate {
    #[serde(default, deserialize_with = "lenient_series")]
    pub prices: Vec<f64>,
    #[serde(default, deserialize_with = "lenient_series")]
    pub predicted_prices: Vec<f64>,
    #[serde(default, deserialize_with = "lenient_series")]
    pub rsi: Vec<f64>,
    #[serde(default)]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub entry_price: Option<f64>,
    #[serde(default)]
    pub take_profit: Option<f64>,
    #[serde(default)]
    pub stop_loss: Option<f64>,
    #[serde(default)]
    pub signal: Option<String>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub volatility: Option<f64>,
    #[serde(default)]
    pub predicted_price: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Buy,
    Sell,
    Hold,
}

impl SignalKind {
    /// `"Hold"` or a missing signal is Hold; anything mentioning `Sell` is a
    /// sell, everything else a buy. Confidence suffixes are ignored.
    pub fn classify(signal: Option<&str>) -> Self {
        match signal {
            None | Some("") | Some("Hold") => Self::Hold,
            Some(s) if s.contains("Sell") => Self::Sell,
            Some(_) => Self::Buy,
        }
    }

    pub fn is_actionable(&self) -> bool {
        !matches!(self, Self::Hold)
    }

    pub fn css_class(&self) -> Option<&'static str> {
        match self {
            Self::Buy => Some("buy"),
            Self::Sell => Some("sell"),
            Self::Hold => None,
        }
    }
}

impl MarketUpdate {
    pub fn signal_kind(&self) -> SignalKind {
        SignalKind::classify(self.signal.as_deref())
    }

    pub fn latest_rsi(&self) -> Option<f64> {
        self.rsi.last().copied()
    }
}

/// Value used for layout geometry: anything missing or non-finite is 0.
pub fn sanitized(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

fn lenient_series<'de, D>(deserializer: D) -> Result<Vec<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Option<f64>>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect())
}
