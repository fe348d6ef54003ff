//! Helpers for tests in this crate and in downstream crates. Enabled with the `test_utils` feature.
mod mock_gateway;
pub mod prepare_env;
mod recording_sink;

pub use mock_gateway::MockGateway;
pub use recording_sink::RecordingSink;
