//! Price provider implementations and the code → capability registry.

pub mod mfapi;
pub mod util;
pub mod yahoo;

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::commodity::PriceProvider;
use crate::core::config::ProvidersConfig;

/// Capability dispatch over a provider code string. One implementation per
/// provider; lookup by the code named in the commodity configuration.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn PriceProvider>>,
}

impl ProviderRegistry {
    /// Registry with every configured provider. Providers with no
    /// configuration entry are left unregistered; commodities naming them
    /// degrade to a fetch failure at sync time.
    pub fn from_config(config: &ProvidersConfig) -> Self {
        let mut registry = ProviderRegistry::default();
        if let Some(yahoo) = &config.yahoo {
            registry.register("yahoo", Arc::new(yahoo::YahooProvider::new(&yahoo.base_url)));
        }
        if let Some(mfapi) = &config.mfapi {
            registry.register("mfapi", Arc::new(mfapi::MfapiProvider::new(&mfapi.base_url)));
        }
        registry
    }

    pub fn register(&mut self, code: &str, provider: Arc<dyn PriceProvider>) {
        self.providers.insert(code.to_string(), provider);
    }

    pub fn get(&self, code: &str) -> Option<Arc<dyn PriceProvider>> {
        self.providers.get(code).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_resolves_configured_providers() {
        let registry = ProviderRegistry::from_config(&ProvidersConfig::default());
        assert!(registry.get("yahoo").is_some());
        assert!(registry.get("mfapi").is_some());
        assert!(registry.get("nasdaq").is_none());
    }

    #[test]
    fn unconfigured_provider_is_not_registered() {
        let config = ProvidersConfig {
            yahoo: None,
            mfapi: None,
        };
        let registry = ProviderRegistry::from_config(&config);
        assert!(registry.get("yahoo").is_none());
    }
}
