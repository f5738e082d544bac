//! # Bronze
//!
//! Bridges chat-platform wire protocols into one normalized message model.
//!
//! ## Architecture
//!
//! ```text
//!  inbound   transport ──▶ gateway session ──▶ dispatcher ──▶ host
//!  outbound  host document ──▶ message encoder ──▶ API calls ──▶ sent sessions ──▶ host
//! ```
//!
//! - **Runtime**: loads configuration, starts adapters, fans host events out
//! - **Adapters**: protocol implementations (Discord gateway, Telegram Bot API)
//! - **Transport**: WebSocket and HTTP clients offered to adapters as capabilities
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bronze::prelude::*;
//! use bronze::discord::DiscordAdapter;
//! use tokio::sync::broadcast::error::RecvError;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let runtime = BronzeRuntime::new();
//!     runtime.register_adapter::<DiscordAdapter>().await?;
//!
//!     let mut events = runtime.subscribe();
//!     tokio::spawn(async move {
//!         loop {
//!             match events.recv().await {
//!                 Ok(HostEvent::Session(session)) => {
//!                     println!("{}: {}", session.event_name(), session.content);
//!                 }
//!                 Ok(_) | Err(RecvError::Lagged(_)) => {}
//!                 Err(RecvError::Closed) => break,
//!             }
//!         }
//!     });
//!
//!     runtime.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `adapter-discord`: Discord gateway adapter
//! - `adapter-telegram`: Telegram Bot API adapter
//! - `toml-config` (default) / `yaml-config`: configuration file formats
//! - `json-log`: JSON log lines
//! - `ws-client` / `http-client`: transport capabilities

pub use bronze_core as core;
pub use bronze_runtime as runtime;
pub use bronze_transport as transport;

#[cfg(feature = "adapter-discord")]
pub use bronze_adapter_discord as discord;
#[cfg(feature = "adapter-telegram")]
pub use bronze_adapter_telegram as telegram;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use bronze_runtime::BronzeRuntime;

    pub use bronze_core::{Element, HostEvent, Media, Session, SessionKind, Style};

    pub use bronze_core::{Adapter, AdapterContext, ConfigurableAdapter, Host};
}
