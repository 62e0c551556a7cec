use chart::TrendDecision;
use common::models::FieldId;

use crate::display::{DisplayPort, Style, skip_on_error};

pub struct TrendLabelPresenter<D> {
    display: D,
}

impl<D: DisplayPort> TrendLabelPresenter<D> {
    pub fn new(display: D) -> Self {
        Self { display }
    }

    pub fn render(&mut self, trend: TrendDecision) {
        let text = format!("Trend: {}", trend.label());
        skip_on_error(self.display.set_text(FieldId::TrendLabel, &text));
        skip_on_error(
            self.display
                .set_style(FieldId::TrendLabel, Style::color(trend.color())),
        );
    }
}
