use core_config::{AppInfo, FromEnv, app_info, server::ServerConfig};
use domain_pricing::ProvidersConfig;

// Re-export Environment for use in other modules
pub use core_config::Environment;

/// Application configuration, composed from the shared config components
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub server: ServerConfig,
    pub environment: Environment,
    pub providers: ProvidersConfig,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let server = ServerConfig::from_env()?; // HOST=0.0.0.0, PORT=8080 by default
        let providers = ProvidersConfig::from_env()?; // Missing credentials only disable a provider

        Ok(Self {
            app: app_info!(),
            server,
            environment,
            providers,
        })
    }
}
