pub mod remote;
pub mod services;

pub use services::gateway::TransportGateway;
pub use services::poller::DataPoller;
