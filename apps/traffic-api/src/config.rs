use std::time::Duration;

/// Traffic API configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// HS256 secret used to verify dashboard bearer tokens.
    pub jwt_secret: String,
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Period of the `traffic_broadcast` timer.
    pub traffic_broadcast_interval: Duration,
    /// Period of the `incident_broadcast` timer.
    pub incident_broadcast_interval: Duration,
    /// Period of the `system_health` timer.
    pub health_broadcast_interval: Duration,
    /// Interval between server pings on each gateway connection.
    pub heartbeat_interval: Duration,
    /// Optional JSON file used to seed the in-memory store at startup.
    pub seed_data_path: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Panics with a descriptive message if a required variable is missing.
    pub fn from_env() -> Self {
        Self {
            jwt_secret: required_var("JWT_SECRET"),
            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5000),
            traffic_broadcast_interval: secs_var("TRAFFIC_BROADCAST_SECS", 30),
            incident_broadcast_interval: secs_var("INCIDENT_BROADCAST_SECS", 30),
            health_broadcast_interval: secs_var("HEALTH_BROADCAST_SECS", 30),
            heartbeat_interval: secs_var("HEARTBEAT_INTERVAL_SECS", 25),
            seed_data_path: std::env::var("SEED_DATA_PATH")
                .ok()
                .filter(|s| !s.is_empty()),
        }
    }

    /// Configuration with defaults and the given secret. Used by tests and tools.
    pub fn with_secret(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            port: 5000,
            traffic_broadcast_interval: Duration::from_secs(30),
            incident_broadcast_interval: Duration::from_secs(30),
            health_broadcast_interval: Duration::from_secs(30),
            heartbeat_interval: Duration::from_secs(25),
            seed_data_path: None,
        }
    }
}

fn required_var(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| panic!("{name} env var is required"))
}

/// Parse a positive number of seconds, falling back to `default` when unset or invalid.
fn secs_var(name: &str, default: u64) -> Duration {
    let secs = std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|s| *s > 0)
        .unwrap_or(default);
    Duration::from_secs(secs)
}
