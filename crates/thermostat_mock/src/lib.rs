pub mod api;
pub mod config;
pub mod error;
pub mod state;

pub use config::Config;
pub use config::ConfigError;
pub use config::LogLevel;
pub use error::ApiError;
pub use state::Characteristic;
pub use state::ThermostatState;
pub use state::Update;
