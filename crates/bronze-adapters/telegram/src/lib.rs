//! # Bronze Adapter for the Telegram Bot API
//!
//! This crate sends Bronze documents through the Telegram Bot API.
//!
//! ## Overview
//!
//! Telegram cannot mix arbitrary text and media in one call: a call is
//! either a text message or a single media upload with an HTML caption.
//! [`MessageEncoder`] walks a document and emits the minimal sequence of
//! calls that renders it:
//!
//! ```text
//! [quote(7), "hi", image, figure(image, "cap")]
//!
//!   sendMessage  { text: "hi", reply_to_message_id: 7 }
//!   sendPhoto    { photo, caption: "" }
//!   sendPhoto    { photo, caption: "cap" }
//! ```
//!
//! Every response is converted into a normalized [`bronze_core::Session`]
//! and reported to the host.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bronze_core::Element;
//!
//! let bot = adapter.bot().expect("adapter started");
//! let sent = bot
//!     .send("12345", None, &[Element::text("hello")], SendOptions::default())
//!     .await?;
//! ```

pub mod adapter;
pub mod api;
pub mod asset;
pub mod bot;
pub mod config;
pub mod encoder;
pub mod endpoint;
pub mod error;
pub mod model;

pub use adapter::TelegramAdapter;
pub use api::{HttpTelegramApi, SendMessage, TelegramApi};
pub use asset::{Asset, AssetResolver, HttpAssetResolver};
pub use bot::{SendOptions, TelegramBot};
pub use config::TelegramConfig;
pub use encoder::{MessageEncoder, RenderMode};
pub use endpoint::{EndpointTable, MediaEndpoint};
pub use error::EncodeError;
pub use model::{ApiResponse, TgChat, TgMessage, TgUser};
