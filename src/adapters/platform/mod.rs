//! Platform adapter
//!
//! The [`PlatformApi`] trait, its HTTP implementation, the session store that
//! keeps OAuth tokens, and the rate-limited decorator every export call goes
//! through.

pub mod api;
pub mod client;
pub mod limited;
pub mod session;

pub use api::{ByteStream, Method, PlatformApi, StreamFault};
pub use client::HttpPlatformClient;
pub use limited::RateLimitedApi;
pub use session::{AuthKind, Credentials, MemorySessionStore, SessionStore};
