//! # Bronze Transport
//!
//! Network transport capability implementations for the Bronze bridge.
//!
//! This crate provides concrete implementations of the transport capabilities
//! defined in `bronze-core`. Each transport is behind a feature flag.
//!
//! ## Features
//!
//! - `ws-client`: WebSocket client capability
//! - `http-client`: HTTP client capability
//! - `full`: All capabilities
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  Adapter Layer      │  (Discord, Telegram)
//! │  (uses capabilities)│
//! ├─────────────────────┤
//! │  bronze-core        │  (capability traits)
//! ├─────────────────────┤
//! │  bronze-transport   │  <- This crate (implementations)
//! ├─────────────────────┤
//! │  Network (TCP/HTTP) │
//! └─────────────────────┘
//! ```
//!
//! ## Capability Implementations
//!
//! | Capability | Description | Use Case |
//! |------------|-------------|----------|
//! | `WsClientCapability` | WebSocket client | Real-time gateways |
//! | `HttpClientCapability` | HTTP client | Bot APIs, discovery, downloads |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use bronze_transport::WsClientCapabilityImpl;
//! use bronze_core::{ClientConfig, WsClientCapability};
//!
//! let capability = WsClientCapabilityImpl::new();
//! let endpoint = Arc::new("wss://gateway.example.com".to_string());
//! let handle = capability.connect(endpoint, handler, ClientConfig::default()).await?;
//! ```

// Transport implementations (feature-gated)
#[cfg(feature = "http-client")]
pub mod http;

#[cfg(feature = "ws-client")]
pub mod websocket;

// Capability re-exports
#[cfg(feature = "ws-client")]
pub use websocket::WsClientCapabilityImpl;

#[cfg(feature = "http-client")]
pub use http::HttpClientCapabilityImpl;
