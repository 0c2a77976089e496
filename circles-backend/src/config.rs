use std::env;

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    /// Initial dev-flag default for a fresh settings record
    pub dev: bool,
    /// Optional base URL override for staging/tests
    pub api_base_url: Option<String>,
    /// Bot-API id of the signed-in account; never assigned to a circle
    pub account_peer_id: i64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid number"),
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "./.db/circles.db".to_string()),
            dev: env::var("CIRCLES_DEV")
                .map(|v| v == "1" || v.to_lowercase() == "true")
                .unwrap_or(false),
            api_base_url: env::var("CIRCLES_API_URL").ok(),
            account_peer_id: env::var("ACCOUNT_PEER_ID")
                .unwrap_or_else(|_| "0".to_string())
                .parse()
                .expect("ACCOUNT_PEER_ID must be a valid number"),
        }
    }
}
