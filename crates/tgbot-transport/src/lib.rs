//! # tgbot Transport
//!
//! Implementations of [`HttpTransport`](tgbot_core::HttpTransport).
//!
//! ## Features
//!
//! - `http-client` (default): [`ReqwestTransport`], backed by `reqwest`
//!
//! ```text
//! ┌─────────────────────┐
//! │  tgbot-runtime      │  (polling, webhook)
//! ├─────────────────────┤
//! │  tgbot-core         │  (executor, HttpTransport trait)
//! ├─────────────────────┤
//! │  tgbot-transport    │  <- This crate
//! ├─────────────────────┤
//! │  Network (HTTP)     │
//! └─────────────────────┘
//! ```

#[cfg(feature = "http-client")]
pub mod http_client;

#[cfg(feature = "http-client")]
pub use http_client::{ReqwestTransport, default_transport};
