//! The single owned state object behind the gateway.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::commands::CommandGateway;
use super::fanout::Dispatcher;
use super::registry::SessionRegistry;
use super::rooms::RoomRouter;

/// Registry, router, dispatcher, and command gateway sharing one membership
/// table. Held in `AppState` behind an `Arc` for the life of the process.
pub struct RealtimeHub {
    registry: Arc<SessionRegistry>,
    pub router: RoomRouter,
    pub dispatcher: Dispatcher,
    pub commands: CommandGateway,
    started_at: Instant,
}

impl RealtimeHub {
    pub fn new() -> Self {
        let registry = Arc::new(SessionRegistry::new());
        let dispatcher = Dispatcher::new(registry.clone());
        Self {
            router: RoomRouter::new(registry.clone()),
            commands: CommandGateway::new(dispatcher.clone()),
            dispatcher,
            registry,
            started_at: Instant::now(),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new()
    }
}
