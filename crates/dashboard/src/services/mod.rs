pub mod chart_service;
pub mod performance_service;
pub mod snapshot;
pub mod training_service;
