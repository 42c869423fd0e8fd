use crate::data_sync::{DepthTrackerConfig, SourceConfig};
use crate::errors::{RouteError, RouteResult};
use crate::logic::types::RouterConfig;
use crate::utils::config_loader::{load_from_file, load_from_file_sync};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Root configuration document.
///
/// ```toml
/// [tracker]
/// refresh_interval_secs = 30
///
/// [router]
/// execution_source = "flow-evm"
/// asset_symbol = "FLOW"
///
/// [[sources]]
/// id = "flow-evm"
/// rpc_url = "${FLOW_RPC_URL}"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub tracker: DepthTrackerConfig,
    pub router: RouterConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl AppConfig {
    pub async fn load(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let config: AppConfig = load_from_file(path).await?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_sync(path: impl AsRef<Path>) -> eyre::Result<Self> {
        let config: AppConfig = load_from_file_sync(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> RouteResult<()> {
        self.tracker.validate()?;
        self.router.validate()?;

        if self.sources.is_empty() {
            return Err(RouteError::invalid_config("at least one source must be configured"));
        }
        let mut ids = HashSet::new();
        for source in &self.sources {
            source.validate()?;
            if !ids.insert(&source.id) {
                return Err(RouteError::invalid_config(format!("duplicate source id {}", source.id)));
            }
        }
        if !ids.contains(&self.router.execution_source) {
            return Err(RouteError::invalid_config(format!(
                "execution source {} is not among the configured sources",
                self.router.execution_source
            )));
        }
        Ok(())
    }
}
