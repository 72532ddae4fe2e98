//! Runtime utilities shared across OrderBridge crates.
//!
//! - [`auth`]: bearer token cache with proactive refresh
//! - [`time`]: clock abstraction so expiry logic can be tested without
//!   sleeping

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;
pub mod time;

pub use auth::{CachedToken, IssuedToken, TokenKey, TokenLifecycleManager};
pub use time::{Clock, MockClock, SystemClock};
