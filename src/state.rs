use std::sync::Arc;

use crate::config::Config;
use crate::registry::ConnectionRegistry;
use crate::translator::{RemoteTranslator, Translator};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub translator: Arc<dyn Translator>,
    pub registry: Arc<ConnectionRegistry>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let base_url = std::env::var("TRANSLATOR_SERVICE_URL")
            .unwrap_or_else(|_| config.translator_config.base_url.clone());
        let translator = RemoteTranslator::connect(base_url).await?;

        Ok(Self {
            config,
            translator: Arc::new(translator),
            registry: Arc::new(ConnectionRegistry::new()),
        })
    }

    #[cfg(test)]
    pub fn with_translator(config: Config, translator: Arc<dyn Translator>) -> Self {
        Self {
            config,
            translator,
            registry: Arc::new(ConnectionRegistry::new()),
        }
    }
}
