pub mod cli;
pub mod config;
pub mod logging;
pub mod metrics;

pub use cli::Args;
pub use config::Settings;
pub use logging::init_logging;
pub use metrics::Metrics;
