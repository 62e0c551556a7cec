use std::fmt;

/// Display targets on the dashboard page, named by their element id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldId {
    TrendLabel,
    Signal,
    SignalBox,
    Volatility,
    PredictedPrice,
    CurrentPrice,
    RsiValue,
    EntryPrice,
    StopLoss,
    TakeProfit,
    ProgressContainer,
    TrainingProgress,
    ProgressPercent,
    TrainingStatus,
}

impl FieldId {
    pub const ALL: [FieldId; 14] = [
        FieldId::TrendLabel,
        FieldId::Signal,
        FieldId::SignalBox,
        FieldId::Volatility,
        FieldId::PredictedPrice,
        FieldId::CurrentPrice,
        FieldId::RsiValue,
        FieldId::EntryPrice,
        FieldId::StopLoss,
        FieldId::TakeProfit,
        FieldId::ProgressContainer,
        FieldId::TrainingProgress,
        FieldId::ProgressPercent,
        FieldId::TrainingStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TrendLabel => "trend_label",
            Self::Signal => "signal",
            Self::SignalBox => "signalBox",
            Self::Volatility => "volatility",
            Self::PredictedPrice => "predicted_price",
            Self::CurrentPrice => "current_price",
            Self::RsiValue => "rsi_value",
            Self::EntryPrice => "entry_price",
            Self::StopLoss => "stop_loss",
            Self::TakeProfit => "take_profit",
            Self::ProgressContainer => "progressContainer",
            Self::TrainingProgress => "trainingProgress",
            Self::ProgressPercent => "progressPercent",
            Self::TrainingStatus => "trainingStatus",
        }
    }
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
