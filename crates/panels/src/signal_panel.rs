use common::models::{FieldId, MarketUpdate, SignalKind};
use tracing::debug;

use crate::display::{DisplayPort, Style, skip_on_error};

/// Renders the latest signal and indicator readouts.
pub struct SignalPanelPresenter<D> {
    display: D,
}

impl<D: DisplayPort> SignalPanelPresenter<D> {
    pub fn new(display: D) -> Self {
        Self { display }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn render(&mut self, update: &MarketUpdate) {
        let kind = update.signal_kind();
        self.render_signal(kind, update.signal.as_deref());

        if let Some(confidence) = update.confidence {
            debug!("Signal confidence {:.2}", confidence);
        }

        let entry = update.entry_price.filter(|_| kind.is_actionable());
        let readouts = [
            (FieldId::Volatility, "Volatility", update.volatility),
            (FieldId::PredictedPrice, "Predicted Price", update.predicted_price),
            (FieldId::CurrentPrice, "Current Price", update.current_price),
            (FieldId::RsiValue, "Relative Strength Index", update.latest_rsi()),
            (FieldId::EntryPrice, "Entry Price", entry),
            (FieldId::StopLoss, "Stop Loss", update.stop_loss),
            (FieldId::TakeProfit, "Take Profit", update.take_profit),
        ];

        for (field, label, value) in readouts {
            skip_on_error(self.display.set_text(field, &readout(label, value)));
        }
    }

    fn render_signal(&mut self, kind: SignalKind, text: Option<&str>) {
        let (Some(class), Some(text)) = (kind.css_class(), text) else {
            skip_on_error(self.display.set_visibility(FieldId::SignalBox, false));
            return;
        };

        let color = match kind {
            SignalKind::Sell => "red",
            _ => "green",
        };

        skip_on_error(self.display.set_visibility(FieldId::SignalBox, true));
        skip_on_error(self.display.set_style(FieldId::SignalBox, Style::class(class)));
        skip_on_error(self.display.set_text(FieldId::Signal, text));
        skip_on_error(self.display.set_style(FieldId::Signal, Style::color(color)));
    }
}

/// `"<label>: <value>"` to two decimals; zero, missing and non-finite read `N/A`.
fn readout(label: &str, value: Option<f64>) -> String {
    match value.filter(|v| v.is_finite() && *v != 0.0) {
        Some(v) => format!("{}: {:.2}", label, v),
        None => format!("{}: N/A", label),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{MemoryDisplay, MockDisplayPort};
    use common::DashboardError;
    use mockall::predicate::eq;

    fn update(signal: Option<&str>) -> MarketUpdate {
        MarketUpdate {
            prices: vec![98.0, 99.0, 100.0],
            rsi: vec![55.5, 61.25],
            current_price: Some(100.0),
            entry_price: Some(100.0),
            take_profit: Some(110.0),
            stop_loss: Some(95.0),
            signal: signal.map(str::to_string),
            volatility: Some(0.0213),
            predicted_price: Some(101.456),
            ..Default::default()
        }
    }

    #[test]
    fn test_readout_formatting() {
        assert_eq!(readout("Stop Loss", Some(95.0)), "Stop Loss: 95.00");
        assert_eq!(readout("Stop Loss", Some(0.0)), "Stop Loss: N/A");
        assert_eq!(readout("Stop Loss", Some(f64::NAN)), "Stop Loss: N/A");
        assert_eq!(readout("Stop Loss", None), "Stop Loss: N/A");
    }

    #[test]
    fn test_hold_hides_box_and_entry() {
        let display = MemoryDisplay::page();
        let mut presenter = SignalPanelPresenter::new(display.clone());

        presenter.render(&update(Some("Hold")));

        assert!(!display.is_visible(FieldId::SignalBox));
        assert_eq!(
            display.text(FieldId::EntryPrice).as_deref(),
            Some("Entry Price: N/A")
        );
        assert_eq!(
            display.text(FieldId::CurrentPrice).as_deref(),
            Some("Current Price: 100.00")
        );
    }

    #[test]
    fn test_buy_signal_renders_verbatim() {
        let display = MemoryDisplay::page();
        let mut presenter = SignalPanelPresenter::new(display.clone());

        presenter.render(&update(Some("Buy (72%)")));

        assert!(display.is_visible(FieldId::SignalBox));
        let boxed = display.field(FieldId::SignalBox).unwrap();
        assert_eq!(boxed.style.class.as_deref(), Some("buy"));
        let signal = display.field(FieldId::Signal).unwrap();
        assert_eq!(signal.text.as_deref(), Some("Buy (72%)"));
        assert_eq!(signal.style.color.as_deref(), Some("green"));

        assert_eq!(display.text(FieldId::EntryPrice).as_deref(), Some("Entry Price: 100.00"));
        assert_eq!(display.text(FieldId::TakeProfit).as_deref(), Some("Take Profit: 110.00"));
        assert_eq!(display.text(FieldId::StopLoss).as_deref(), Some("Stop Loss: 95.00"));
        assert_eq!(
            display.text(FieldId::RsiValue).as_deref(),
            Some("Relative Strength Index: 61.25")
        );
        assert_eq!(
            display.text(FieldId::PredictedPrice).as_deref(),
            Some("Predicted Price: 101.46")
        );
    }

    #[test]
    fn test_sell_signal_styling() {
        let display = MemoryDisplay::page();
        let mut presenter = SignalPanelPresenter::new(display.clone());

        presenter.render(&update(Some("Strong Sell")));

        let boxed = display.field(FieldId::SignalBox).unwrap();
        assert_eq!(boxed.style.class.as_deref(), Some("sell"));
        let signal = display.field(FieldId::Signal).unwrap();
        assert_eq!(signal.style.color.as_deref(), Some("red"));
    }

    #[test]
    fn test_missing_field_does_not_stop_other_fields() {
        let display = MemoryDisplay::with_fields([FieldId::SignalBox, FieldId::TakeProfit]);
        let mut presenter = SignalPanelPresenter::new(display.clone());

        presenter.render(&update(None));

        assert!(!display.is_visible(FieldId::SignalBox));
        assert_eq!(display.text(FieldId::TakeProfit).as_deref(), Some("Take Profit: 110.00"));
    }

    #[test]
    fn test_absent_signal_never_writes_signal_text() {
        let mut display = MockDisplayPort::new();
        display
            .expect_set_visibility()
            .with(eq(FieldId::SignalBox), eq(false))
            .times(1)
            .returning(|_, _| Ok(()));
        display.expect_set_style().never();
        display
            .expect_set_text()
            .withf(|field, _| *field == FieldId::Signal)
            .never();
        display
            .expect_set_text()
            .times(7)
            .returning(|field, _| Err(DashboardError::MissingField(field)));

        let mut presenter = SignalPanelPresenter::new(display);
        presenter.render(&update(None));
    }
}
