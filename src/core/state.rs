// Application state (AppState)

use crate::core::config::Config;
use crate::dispensing::authorizer::Authorizer;
use crate::eligibility::filter::CooldownPolicy;
use crate::metrics::collector::Metrics;
use crate::stores::store::Store;
use std::sync::Arc;

/// Shared application state
///
/// Handlers hold it behind an `Arc`; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Fingerprint matching and transaction bookkeeping
    pub authorizer: Authorizer,

    /// Backing document store
    pub store: Arc<dyn Store>,

    pub metrics: Arc<Metrics>,

    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
        let cooldowns = CooldownPolicy::from(&config.eligibility);

        Self {
            authorizer: Authorizer::new(Arc::clone(&store), cooldowns),
            store,
            metrics: Arc::new(Metrics::new()),
            config: Arc::new(config),
        }
    }
}
