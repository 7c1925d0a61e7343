#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use traffic_api::auth::tokens::mint_token;
use traffic_api::config::Config;
use traffic_api::db::store::MemoryStore;
use traffic_api::models::user::{Department, Role, User};
use traffic_api::AppState;

pub const TEST_SECRET: &str = "test-secret-do-not-use-in-production";

pub const ADMIN: &str = "usr_admin";
pub const OPERATOR: &str = "usr_operator";
pub const ANALYST: &str = "usr_analyst";
pub const VIEWER: &str = "usr_viewer";
pub const RESPONDER: &str = "usr_responder";
pub const INACTIVE: &str = "usr_inactive";

fn user(id: &str, role: Role, department: Department, is_active: bool) -> User {
    User {
        id: id.to_string(),
        username: id.trim_start_matches("usr_").to_string(),
        email: None,
        role,
        department,
        is_active,
    }
}

/// Build a test AppState over an in-memory store holding one user per role.
pub fn test_state() -> AppState {
    test_state_with(Config::with_secret(TEST_SECRET))
}

pub fn test_state_with(config: Config) -> AppState {
    let store = MemoryStore::new();
    store.insert_user(user(ADMIN, Role::Admin, Department::TrafficManagement, true));
    store.insert_user(user(OPERATOR, Role::Operator, Department::Operations, true));
    store.insert_user(user(ANALYST, Role::Analyst, Department::Analytics, true));
    store.insert_user(user(VIEWER, Role::Viewer, Department::Planning, true));
    store.insert_user(user(RESPONDER, Role::Viewer, Department::Emergency, true));
    store.insert_user(user(INACTIVE, Role::Operator, Department::Operations, false));

    AppState::new(config, Arc::new(store))
}

/// Router with state applied, ready for `axum_test::TestServer`.
pub fn test_app() -> (Router, AppState) {
    let state = test_state();
    let app = traffic_api::routes::router().with_state(state.clone());
    (app, state)
}

/// Mint a valid bearer token for `user_id`.
pub fn token(user_id: &str) -> String {
    mint_token(TEST_SECRET, user_id, chrono::Duration::hours(1)).expect("mint test token")
}

/// Config with a short heartbeat so timeout tests finish quickly.
pub fn fast_heartbeat_config(interval: Duration) -> Config {
    let mut config = Config::with_secret(TEST_SECRET);
    config.heartbeat_interval = interval;
    config
}
