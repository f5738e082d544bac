//! Discord gateway data model.
//!
//! - [`frame`]: the `{op, d, s, t}` envelope, opcodes and outbound payloads
//! - [`intents`]: gateway intent bit flags
//! - [`event`]: dispatch event classification
//! - [`user`]: the bot's own identity from `READY`

pub mod event;
pub mod frame;
pub mod intents;
pub mod user;

pub use event::EventKind;
pub use frame::{Frame, Opcode};
pub use intents::Intents;
pub use user::SelfUser;
