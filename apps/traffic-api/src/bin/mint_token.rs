//! Mint a dashboard bearer token for local testing.
//!
//! Usage: mint-token <user_id> [ttl_hours]

use std::path::Path;

use traffic_api::auth::tokens::{mint_token, TOKEN_TTL_SECS};

fn main() {
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    let mut args = std::env::args().skip(1);
    let Some(user_id) = args.next() else {
        eprintln!("usage: mint-token <user_id> [ttl_hours]");
        std::process::exit(2);
    };
    let ttl = match args.next() {
        Some(hours) => match hours.parse::<i64>() {
            Ok(h) if h > 0 => chrono::Duration::hours(h),
            _ => {
                eprintln!("ttl_hours must be a positive integer, got {hours:?}");
                std::process::exit(2);
            }
        },
        None => chrono::Duration::seconds(TOKEN_TTL_SECS),
    };

    let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
        eprintln!("JWT_SECRET env var is required");
        std::process::exit(2);
    });

    match mint_token(&secret, &user_id, ttl) {
        Ok(token) => println!("{token}"),
        Err(e) => {
            eprintln!("failed to mint token: {e}");
            std::process::exit(1);
        }
    }
}
