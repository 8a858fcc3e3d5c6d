//! Centralized configuration for Shinbun.
//!
//! Built once at startup and passed down explicitly; nothing in the
//! pipeline reads mutable global state.

use std::net::SocketAddr;
use std::time::Duration;

/// Central configuration for all Shinbun components.
///
/// Groups related settings into logical sections.
#[derive(Debug, Clone, Default)]
pub struct ShinbunConfig {
    pub fetch: FetchConfig,
    pub sources: SourcesConfig,
    pub server: ServerConfig,
}

/// Fan-out and outbound HTTP configuration.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Hard budget for one source's fetch and parse
    pub per_source_timeout: Duration,
    /// Budget for the whole fan-out; stragglers are abandoned past it
    pub overall_timeout: Duration,
    /// Upper bound on simultaneous outbound fetches
    pub max_concurrent_fetches: usize,
    /// Timeout applied to each HTTP request on the shared client
    pub request_timeout: Duration,
    /// User agent for HTTP requests
    pub user_agent: &'static str,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            per_source_timeout: Duration::from_secs(12),
            overall_timeout: Duration::from_secs(20),
            max_concurrent_fetches: 4,
            request_timeout: Duration::from_secs(10),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                 AppleWebKit/537.36 (KHTML, like Gecko) \
                 Chrome/123.0.0.0 Safari/537.36",
        }
    }
}

/// Per-site endpoints and the cross-source dedup priority.
#[derive(Debug, Clone)]
pub struct SourcesConfig {
    /// Comicat site root
    pub comicat_base_url: String,
    /// Dmhy site root
    pub dmhy_base_url: String,
    /// AnimeTosho JSON feed endpoint
    pub animetosho_feed_url: String,
    /// Source labels in dedup tie-break order, most trusted first
    pub priority: Vec<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            comicat_base_url: "https://comicat.org".to_string(),
            dmhy_base_url: "https://share.dmhy.org".to_string(),
            animetosho_feed_url: "https://feed.animetosho.org/json".to_string(),
            priority: vec![
                "comicat.org".to_string(),
                "share.dmhy.org".to_string(),
                "animetosho.org".to_string(),
            ],
        }
    }
}

/// API server binding and CORS configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the API server listens on
    pub bind_addr: SocketAddr,
    /// Origins the dashboard dev servers are allowed to call from
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8001)),
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
                "http://localhost:8080".to_string(),
                "http://127.0.0.1:8080".to_string(),
            ],
        }
    }
}
