pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod models;
pub mod routes;

use std::sync::Arc;

use auth::identity::{IdentityResolver, TokenIdentityResolver};
use config::Config;
use db::store::TrafficStore;
use gateway::RealtimeHub;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TrafficStore>,
    pub identity: Arc<dyn IdentityResolver>,
    pub config: Arc<Config>,
    pub hub: Arc<RealtimeHub>,
}

impl AppState {
    /// Wire a fresh hub and a token resolver backed by `store`.
    pub fn new(config: Config, store: Arc<dyn TrafficStore>) -> Self {
        let identity = Arc::new(TokenIdentityResolver::new(
            config.jwt_secret.clone(),
            store.clone(),
        ));
        Self {
            store,
            identity,
            config: Arc::new(config),
            hub: Arc::new(RealtimeHub::new()),
        }
    }
}
