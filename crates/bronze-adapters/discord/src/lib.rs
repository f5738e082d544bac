//! # Bronze Adapter for the Discord Gateway
//!
//! This crate connects Bronze to Discord's real-time gateway.
//!
//! ## Overview
//!
//! The gateway is a long-lived WebSocket. After the server's `HELLO` the
//! client heartbeats at the dictated period and either identifies (new
//! session) or resumes (cached session). This adapter handles:
//!
//! - Gateway discovery and resume-endpoint reuse
//! - The identify / resume handshake and heartbeating
//! - Invalid-session and reconnect requests
//! - Turning dispatches into host events and normalized sessions
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bronze_runtime::BronzeRuntime;
//! use bronze_adapter_discord::DiscordAdapter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = BronzeRuntime::new();
//!     runtime.register_adapter::<DiscordAdapter>().await?;
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Connection Lifecycle
//!
//! ```text
//! Disconnected ─▶ Connecting ─▶ AwaitingHello ─┬─▶ Identifying ─┬─▶ Online
//!       ▲                                      └─▶ Resuming ────┘     │
//!       └─────────────────────────── transport close ◀────────────────┘
//! ```
//!
//! The state machine itself ([`GatewaySession`]) is pure: every inbound
//! frame yields a list of [`Effect`]s which the connection worker applies.

pub mod adapter;
pub mod api;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod heartbeat;
pub mod model;
pub mod session;

pub use adapter::DiscordAdapter;
pub use api::{DiscordApi, GatewayBot};
pub use config::{DiscordConfig, RetryConfig};
pub use dispatcher::EventDispatcher;
pub use error::GatewayError;
pub use heartbeat::HeartbeatScheduler;
pub use model::{EventKind, Frame, Intents, Opcode, SelfUser};
pub use session::{ConnectionState, Effect, Endpoint, GatewaySession};
