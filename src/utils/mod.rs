pub mod app_config;
pub mod config_loader;
pub mod constants;
pub mod fixed_point;
pub mod token;

pub use app_config::AppConfig;
pub use config_loader::*;
pub use constants::*;
pub use fixed_point::UsdAmount;
pub use token::Token;

/// Current unix time in seconds.
pub fn unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
