//! Periodic snapshot broadcasts.
//!
//! Each broadcast kind runs on its own timer task. A tick awaits its fetch
//! before the timer is polled again, so one timer never overlaps its own
//! fetches; ticks missed while a slow fetch was in flight are skipped, not
//! queued. A failed tick is logged and the timer keeps going.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::config::Config;
use crate::db::store::{IncidentQuery, ReadingQuery, StoreError, TrafficStore};

use super::events::{EventName, ServerEvent};
use super::hub::RealtimeHub;
use super::rooms::Room;

/// How far back the periodic traffic snapshot looks.
const TRAFFIC_WINDOW_MINUTES: i64 = 5;
const TRAFFIC_SNAPSHOT_LIMIT: usize = 100;
const INCIDENT_SNAPSHOT_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledBroadcast {
    /// Recent readings to the operations center.
    Traffic,
    /// Active incidents to the emergency team.
    Incidents,
    /// Server health to every session.
    Health,
}

impl ScheduledBroadcast {
    pub const ALL: [ScheduledBroadcast; 3] = [Self::Traffic, Self::Incidents, Self::Health];

    pub fn name(self) -> &'static str {
        match self {
            Self::Traffic => "traffic",
            Self::Incidents => "incidents",
            Self::Health => "health",
        }
    }

    pub fn period(self, config: &Config) -> Duration {
        match self {
            Self::Traffic => config.traffic_broadcast_interval,
            Self::Incidents => config.incident_broadcast_interval,
            Self::Health => config.health_broadcast_interval,
        }
    }

    /// Fetch one snapshot and emit it. Returns the number of sessions reached.
    pub async fn run_once(
        self,
        hub: &RealtimeHub,
        store: &dyn TrafficStore,
    ) -> Result<usize, StoreError> {
        match self {
            Self::Traffic => {
                let readings = store
                    .query_readings(&ReadingQuery {
                        since: Some(Utc::now() - chrono::Duration::minutes(TRAFFIC_WINDOW_MINUTES)),
                        limit: TRAFFIC_SNAPSHOT_LIMIT,
                        ..Default::default()
                    })
                    .await?;
                let data = json!({ "count": readings.len(), "data": readings });
                Ok(hub.dispatcher.emit(
                    ServerEvent::new(EventName::TRAFFIC_BROADCAST, data),
                    &[Room::OperationsCenter],
                ))
            }
            Self::Incidents => {
                let incidents = store
                    .query_incidents(&IncidentQuery {
                        active_only: true,
                        limit: INCIDENT_SNAPSHOT_LIMIT,
                        ..Default::default()
                    })
                    .await?;
                let data = json!({ "count": incidents.len(), "data": incidents });
                Ok(hub.dispatcher.emit(
                    ServerEvent::new(EventName::INCIDENT_BROADCAST, data),
                    &[Room::EmergencyTeam],
                ))
            }
            Self::Health => {
                let data = json!({
                    "connectedSessions": hub.dispatcher.connected_session_count(),
                    "uptimeSeconds": hub.uptime().as_secs(),
                    "rooms": hub.registry().room_sizes(),
                    "timestamp": Utc::now(),
                });
                Ok(hub
                    .dispatcher
                    .emit_all(ServerEvent::new(EventName::SYSTEM_HEALTH, data)))
            }
        }
    }
}

/// Start one timer task per broadcast kind.
pub fn spawn_all(
    hub: Arc<RealtimeHub>,
    store: Arc<dyn TrafficStore>,
    config: &Config,
) -> Vec<JoinHandle<()>> {
    ScheduledBroadcast::ALL
        .into_iter()
        .map(|kind| spawn(kind, kind.period(config), hub.clone(), store.clone()))
        .collect()
}

/// Start a single timer. The first broadcast happens one full period after start.
pub fn spawn(
    kind: ScheduledBroadcast,
    period: Duration,
    hub: Arc<RealtimeHub>,
    store: Arc<dyn TrafficStore>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        ticker.tick().await; // First tick fires immediately; skip it.

        tracing::info!(broadcast = kind.name(), ?period, "scheduled broadcast started");

        loop {
            ticker.tick().await;
            match kind.run_once(&hub, store.as_ref()).await {
                Ok(reached) => {
                    tracing::debug!(broadcast = kind.name(), reached, "scheduled broadcast sent");
                }
                Err(err) => {
                    tracing::warn!(broadcast = kind.name(), error = %err, "scheduled broadcast skipped");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::db::store::{MemoryStore, UnavailableStore};
    use crate::gateway::lifecycle;
    use crate::gateway::session::OutboundReceiver;
    use crate::models::incident::{Incident, IncidentStatus};
    use crate::models::reading::TrafficReading;
    use crate::models::user::{Department, Identity, Role, User};

    fn identity(role: Role, department: Department) -> Identity {
        Identity {
            id: "usr_t".into(),
            username: "t".into(),
            role,
            department,
        }
    }

    /// Drain queued events, skipping the `connected` welcome.
    fn events(rx: &mut OutboundReceiver) -> Vec<String> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if ev.event != EventName::CONNECTED {
                out.push(ev.event.clone());
            }
        }
        out
    }

    #[tokio::test]
    async fn each_snapshot_goes_to_its_room() {
        let hub = RealtimeHub::new();
        let store = MemoryStore::new();
        let every = Duration::from_secs(25);
        let (_ops, mut ops_rx) =
            lifecycle::establish(&hub, identity(Role::Operator, Department::Operations), every);
        let (_er, mut er_rx) =
            lifecycle::establish(&hub, identity(Role::Viewer, Department::Emergency), every);

        assert_eq!(ScheduledBroadcast::Traffic.run_once(&hub, &store).await.unwrap(), 1);
        assert_eq!(ScheduledBroadcast::Incidents.run_once(&hub, &store).await.unwrap(), 1);
        assert_eq!(ScheduledBroadcast::Health.run_once(&hub, &store).await.unwrap(), 2);

        assert_eq!(events(&mut ops_rx), vec!["traffic_broadcast", "system_health"]);
        assert_eq!(events(&mut er_rx), vec!["incident_broadcast", "system_health"]);
    }

    #[tokio::test]
    async fn failed_fetch_reaches_no_one() {
        let hub = RealtimeHub::new();
        let (_ops, mut rx) = lifecycle::establish(
            &hub,
            identity(Role::Admin, Department::Emergency),
            Duration::from_secs(25),
        );

        assert!(ScheduledBroadcast::Traffic.run_once(&hub, &UnavailableStore).await.is_err());
        assert!(ScheduledBroadcast::Incidents.run_once(&hub, &UnavailableStore).await.is_err());
        assert!(events(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn timer_fires_every_period() {
        let hub = Arc::new(RealtimeHub::new());
        let store: Arc<dyn TrafficStore> = Arc::new(MemoryStore::new());
        let (_s, mut rx) = lifecycle::establish(
            &hub,
            identity(Role::Viewer, Department::Planning),
            Duration::from_secs(25),
        );
        assert_eq!(rx.recv().await.unwrap().event, EventName::CONNECTED);

        let handle = spawn(
            ScheduledBroadcast::Health,
            Duration::from_secs(30),
            hub.clone(),
            store,
        );

        for _ in 0..2 {
            let ev = time::timeout(Duration::from_secs(31), rx.recv())
                .await
                .expect("health broadcast within one period")
                .unwrap();
            assert_eq!(ev.event, EventName::SYSTEM_HEALTH);
            assert_eq!(ev.data["connectedSessions"], 1);
            assert!(ev.data["timestamp"].is_string());
        }
        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn failing_timer_keeps_running() {
        let hub = Arc::new(RealtimeHub::new());
        let handle = spawn(
            ScheduledBroadcast::Traffic,
            Duration::from_secs(30),
            hub,
            Arc::new(UnavailableStore),
        );
        time::sleep(Duration::from_secs(95)).await;
        assert!(!handle.is_finished());
        handle.abort();
    }

    /// Counts concurrent readings fetches; each one takes 75 seconds.
    #[derive(Default)]
    struct SlowStore {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TrafficStore for SlowStore {
        async fn find_user(&self, _id: &str) -> Result<Option<User>, StoreError> {
            Ok(None)
        }

        async fn insert_reading(&self, _reading: TrafficReading) -> Result<(), StoreError> {
            Ok(())
        }

        async fn query_readings(&self, _q: &ReadingQuery) -> Result<Vec<TrafficReading>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            time::sleep(Duration::from_secs(75)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn insert_incident(&self, _incident: Incident) -> Result<(), StoreError> {
            Ok(())
        }

        async fn update_incident_status(
            &self,
            _id: &str,
            _status: IncidentStatus,
        ) -> Result<Option<Incident>, StoreError> {
            Ok(None)
        }

        async fn query_incidents(&self, _q: &IncidentQuery) -> Result<Vec<Incident>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn slow_fetches_never_overlap() {
        let hub = Arc::new(RealtimeHub::new());
        let store = Arc::new(SlowStore::default());
        let handle = spawn(
            ScheduledBroadcast::Traffic,
            Duration::from_secs(30),
            hub,
            store.clone(),
        );

        time::sleep(Duration::from_secs(200)).await;
        handle.abort();

        assert_eq!(store.max_in_flight.load(Ordering::SeqCst), 1);
        let calls = store.calls.load(Ordering::SeqCst);
        assert!((2..=3).contains(&calls), "skipped ticks are not queued, got {calls} fetches");
    }
}
