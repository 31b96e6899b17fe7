pub mod app_config;
pub mod config;
pub mod retailers;
pub mod rows;

pub use app_config::{AppConfig, ProxyCredentials};
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use retailers::{
    is_retailer_self_name, normalize_retailer, priority_rank, profile_for, RetailerProfile,
    DEFAULT_PROFILE, PROFILES,
};
pub use rows::{parse_store_links, AisleRecord, ProductRow, FAILED_AISLE};
