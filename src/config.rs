//! Loading engine configuration (extra catalogs + webhook settings) from TOML.
//!
//! See `EngineConfig` for the expected schema. Config is optional: the
//! built-in seed catalogs keep the engine useful with no file at all.

use serde::Deserialize;
use tracing::{info, error};

use crate::catalog::Catalog;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct EngineConfig {
  /// Full catalog definitions, same shape as the seed catalogs.
  /// Validated at load time like everything else; a broken entry aborts startup.
  #[serde(default)]
  pub catalogs: Vec<Catalog>,
  /// Webhook URL for lead records. The LEAD_WEBHOOK_URL env var wins if both are set.
  #[serde(default)]
  pub lead_webhook_url: Option<String>,
}

/// Attempt to load `EngineConfig` from CATALOG_CONFIG_PATH. On any parsing/IO
/// error, returns None.
pub fn load_engine_config_from_env() -> Option<EngineConfig> {
  let path = std::env::var("CATALOG_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<EngineConfig>(&s) {
      Ok(cfg) => {
        info!(target: "levelcheck_backend", %path, catalogs = cfg.catalogs.len(), "Loaded engine config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "levelcheck_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "levelcheck_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
