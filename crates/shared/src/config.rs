//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Engine behaviour.
    #[serde(default)]
    pub engine: EngineConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// How the authorization facade reports denials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationMode {
    /// Stop at the first failing check.
    #[default]
    FailFast,
    /// Run every check and collect all denial reasons.
    FullReport,
}

/// Envelope resolution and authorization settings.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on hierarchy levels climbed during envelope resolution.
    #[serde(default = "default_max_hierarchy_depth")]
    pub max_hierarchy_depth: usize,
    /// Whether balance checks fall back to ancestor envelopes.
    #[serde(default = "default_true")]
    pub use_hierarchy: bool,
    /// Whether the facade rewrites combinations through segment mappings first.
    #[serde(default = "default_true")]
    pub apply_mappings: bool,
    /// Fail-fast or full-report authorization.
    #[serde(default)]
    pub authorization_mode: AuthorizationMode,
    /// Maximum cached segment master-data answers.
    #[serde(default = "default_hierarchy_cache_capacity")]
    pub hierarchy_cache_capacity: u64,
    /// Time-to-live for cached segment master-data answers.
    #[serde(default = "default_hierarchy_cache_ttl")]
    pub hierarchy_cache_ttl_secs: u64,
}

fn default_max_hierarchy_depth() -> usize {
    32
}

fn default_true() -> bool {
    true
}

fn default_hierarchy_cache_capacity() -> u64 {
    10_000
}

fn default_hierarchy_cache_ttl() -> u64 {
    300 // 5 minutes
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_hierarchy_depth: default_max_hierarchy_depth(),
            use_hierarchy: true,
            apply_mappings: true,
            authorization_mode: AuthorizationMode::default(),
            hierarchy_cache_capacity: default_hierarchy_cache_capacity(),
            hierarchy_cache_ttl_secs: default_hierarchy_cache_ttl(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("BUDGETGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
