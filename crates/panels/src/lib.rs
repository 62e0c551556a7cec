pub mod display;
pub mod signal_panel;
pub mod training;
pub mod trend_label;

pub use display::{DisplayPort, MemoryDisplay, Style};
pub use signal_panel::SignalPanelPresenter;
pub use training::TrainingProgressPresenter;
pub use trend_label::TrendLabelPresenter;
