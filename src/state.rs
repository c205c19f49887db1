//! Application state: the catalog store, the notification collaborator, and
//! the optional speech-to-text client.
//!
//! Catalogs are validated once here and immutable afterwards; sessions hold an
//! `Arc` to theirs, so there is no cross-session locking at all. Each session
//! itself lives inside the WebSocket task that created it.

use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument, warn};

use crate::catalog::Catalog;
use crate::config::load_engine_config_from_env;
use crate::error::EngineError;
use crate::gate::{LogOnlyNotifier, Notifier, WebhookNotifier};
use crate::seeds::seed_catalogs;
use crate::stt::SttClient;

pub struct AppState {
    catalogs: HashMap<String, Arc<Catalog>>,
    pub notifier: Arc<dyn Notifier>,
    pub stt: Option<SttClient>,
}

impl AppState {
    /// Build state from env: load config, merge seed catalogs, validate
    /// everything, wire the notifier and STT client.
    ///
    /// A catalog that fails validation aborts startup; it must never be
    /// served to a session.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Result<Self, EngineError> {
        let cfg = load_engine_config_from_env();

        let mut catalogs = HashMap::<String, Arc<Catalog>>::new();

        // Config-bank catalogs first; built-in seeds fill in without
        // overwriting existing ids.
        if let Some(cfg) = &cfg {
            for c in &cfg.catalogs {
                c.validate()?;
                catalogs.insert(c.id.clone(), Arc::new(c.clone()));
            }
        }
        for c in seed_catalogs() {
            c.validate()?;
            catalogs.entry(c.id.clone()).or_insert_with(|| Arc::new(c));
        }

        for c in catalogs.values() {
            info!(
                target: "assessment",
                catalog = %c.id,
                kind = %c.assessment_kind,
                prompts = c.prompt_count(),
                allow_revision = c.allow_revision,
                "Startup catalog inventory"
            );
        }

        // Env var wins over config for the webhook URL.
        let webhook = WebhookNotifier::from_env().or_else(|| {
            cfg.as_ref()
                .and_then(|c| c.lead_webhook_url.clone())
                .and_then(WebhookNotifier::new)
        });
        let notifier: Arc<dyn Notifier> = match webhook {
            Some(n) => {
                info!(target: "lead", "Lead webhook notifier enabled");
                Arc::new(n)
            }
            None => {
                warn!(target: "lead", "No lead webhook configured; lead records will only be logged");
                Arc::new(LogOnlyNotifier)
            }
        };

        let stt = SttClient::from_env();
        match &stt {
            Some(s) => info!(target: "levelcheck_backend", base_url = %s.base_url(), model = %s.model(), "STT enabled."),
            None => info!(target: "levelcheck_backend", "STT disabled (no STT_API_KEY). Speech prompts accept client transcripts only."),
        }

        Ok(Self { catalogs, notifier, stt })
    }

    /// Read-only access to a validated catalog by id.
    pub fn catalog(&self, id: &str) -> Result<Arc<Catalog>, EngineError> {
        self.catalogs
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::UnknownCatalog(id.to_string()))
    }

    pub fn catalogs(&self) -> impl Iterator<Item = &Arc<Catalog>> {
        self.catalogs.values()
    }
}
