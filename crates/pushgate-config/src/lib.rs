//! # pushgate-config
//!
//! TOML configuration types, loading, and validation for pushgate.
//!
//! Depends only on `pushgate-paths`.

mod loading;
mod validation;

pub mod errors;
pub mod types;

pub use errors::ConfigError;
pub use loading::{load_config_file, load_hierarchy_from, merge_configs};
pub use types::{PipelineConfig, PipelineSettings, PushgateConfig, RoutingConfig, TokenConfig};
pub use validation::validate_config;

impl PushgateConfig {
    /// Load configuration from the hierarchy of config files.
    ///
    /// See [`loading::load_hierarchy`] for details.
    pub fn load_hierarchy() -> Result<Self, ConfigError> {
        loading::load_hierarchy()
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validation::validate_config(self)
    }
}
