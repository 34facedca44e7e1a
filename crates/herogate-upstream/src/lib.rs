pub mod client;
pub mod retry;

pub use client::UpstreamClient;
pub use retry::{RetryPolicy, retry_always, with_retry};
