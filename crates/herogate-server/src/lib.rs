pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;
pub mod service;

pub use auth::{AuthGate, AuthOutcome};
pub use cache::{TtlCache, spawn_expiry_sweeper};
pub use config::{AppConfig, CacheSettings, RetrySettings, ServerConfig, UpstreamConfig};
pub use error::ApiError;
pub use observability::{apply_logging_level, init_tracing};
pub use server::{AppState, HerogateServer, ServerBuilder, build_app};
pub use service::HeroService;
