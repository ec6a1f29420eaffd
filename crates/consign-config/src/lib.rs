//! consign-config
//!
//! Persistent shop preferences and analytics tuning.
//! Owns the Config data structure plus disk persistence and backup helpers.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::{AnalyticsSettings, Config, PayoutReadiness, WeekStart};
