//! Bearer token caching
//!
//! [`TokenLifecycleManager`] keeps one access token per [`TokenKey`] and
//! refreshes it before it expires. Refresh is delegated to the caller, which
//! knows how to talk to the issuing provider and where to persist any rotated
//! secrets.

pub mod token_manager;
pub mod types;

pub use token_manager::TokenLifecycleManager;
pub use types::{CachedToken, IssuedToken, TokenKey};
