//! `spillway` adds throttled, rate-limit-aware request handling to an
//! API client: a rolling-window throttle, a tracker for server-declared
//! call quotas, a concurrent batch executor with per-request error
//! isolation, and a synchronous bridge for callers without an async
//! runtime of their own.
//!
//! ```no_run
//! use spillway::{ClientBuilder, RateLimit, Result};
//! use std::time::Duration;
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = ClientBuilder::builder()
//!         .rate_limit(RateLimit::new(5, Duration::from_secs(60)))
//!         .build()
//!         .client()?;
//!
//!     let urls = vec![
//!         Url::parse("https://api.example.com/items/1").unwrap(),
//!         Url::parse("https://api.example.com/items/2").unwrap(),
//!     ];
//!     for result in client.process_gets(urls).await? {
//!         if result.is_degraded() {
//!             eprintln!("failed: {:?}", result.message());
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Fully synchronous callers hand one operation to the bridge instead,
//! which brings its own execution context:
//!
//! ```no_run
//! use spillway::ClientBuilder;
//! use url::Url;
//!
//! let client = ClientBuilder::default().client().unwrap();
//! let urls = vec![Url::parse("https://api.example.com/items/1").unwrap()];
//! let results = client.pipeline(|c| c.process_gets(urls));
//! ```

#[cfg(test)]
#[macro_use]
pub mod test_utils;

mod bridge;
mod client;
mod config;
mod quota;
mod ratelimit;
mod types;

pub use client::{Client, ClientBuilder, DEFAULT_USER_AGENT};
pub use config::ClientConfig;
pub use quota::{QuotaKeys, QuotaTracker};
pub use ratelimit::{RateLimit, Throttle};
pub use types::*;
