pub mod events;
pub mod fields;
pub mod market_update;
pub mod performance;

pub use events::{InboundEvent, OutboundCommand};
pub use fields::FieldId;
pub use market_update::{MarketUpdate, SignalKind, sanitized};
pub use performance::PerformanceSample;
