//! Gateway frames.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::GatewayError;
use crate::model::intents::Intents;

/// Gateway opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    /// A named event (`t`) was dispatched.
    Dispatch,
    /// Heartbeat, in either direction.
    Heartbeat,
    /// Start a new session.
    Identify,
    /// Resume a previous session.
    Resume,
    /// The server asks the client to reconnect.
    Reconnect,
    /// The session was invalidated; `d` says whether it is resumable.
    InvalidSession,
    /// First frame on every socket, carries the heartbeat interval.
    Hello,
    /// Heartbeat acknowledgement.
    HeartbeatAck,
    /// Anything else.
    Unknown(u64),
}

impl Opcode {
    /// Returns the wire code.
    pub fn code(self) -> u64 {
        match self {
            Self::Dispatch => 0,
            Self::Heartbeat => 1,
            Self::Identify => 2,
            Self::Resume => 6,
            Self::Reconnect => 7,
            Self::InvalidSession => 9,
            Self::Hello => 10,
            Self::HeartbeatAck => 11,
            Self::Unknown(code) => code,
        }
    }
}

impl From<u64> for Opcode {
    fn from(code: u64) -> Self {
        match code {
            0 => Self::Dispatch,
            1 => Self::Heartbeat,
            2 => Self::Identify,
            6 => Self::Resume,
            7 => Self::Reconnect,
            9 => Self::InvalidSession,
            10 => Self::Hello,
            11 => Self::HeartbeatAck,
            other => Self::Unknown(other),
        }
    }
}

#[derive(Deserialize)]
struct RawFrame {
    op: u64,
    #[serde(default)]
    d: Value,
    #[serde(default)]
    s: Option<u64>,
    #[serde(default)]
    t: Option<String>,
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Opcode.
    pub op: Opcode,
    /// Payload.
    pub d: Value,
    /// Sequence number, only set on dispatches.
    pub s: Option<u64>,
    /// Event type, only set on dispatches.
    pub t: Option<String>,
}

impl Frame {
    /// Decodes a frame from raw socket data.
    pub fn decode(data: &[u8]) -> Result<Self, GatewayError> {
        let raw: RawFrame = serde_json::from_slice(data)
            .map_err(|e| GatewayError::MalformedFrame(e.to_string()))?;
        Ok(Self {
            op: Opcode::from(raw.op),
            d: raw.d,
            s: raw.s,
            t: raw.t,
        })
    }

    /// Re-encodes the frame as JSON.
    pub fn to_value(&self) -> Value {
        json!({
            "op": self.op.code(),
            "d": self.d,
            "s": self.s,
            "t": self.t,
        })
    }
}

/// Builds a heartbeat payload.
pub fn heartbeat(sequence: Option<u64>) -> Value {
    json!({ "op": Opcode::Heartbeat.code(), "d": sequence })
}

/// Builds an identify payload.
pub fn identify(token: &str, intents: Intents) -> Value {
    json!({
        "op": Opcode::Identify.code(),
        "d": {
            "token": token,
            "properties": {},
            "compress": false,
            "intents": intents.bits(),
        },
    })
}

/// Builds a resume payload.
pub fn resume(token: &str, session_id: &str, sequence: Option<u64>) -> Value {
    json!({
        "op": Opcode::Resume.code(),
        "d": {
            "token": token,
            "session_id": session_id,
            "seq": sequence,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_dispatch() {
        let frame =
            Frame::decode(br#"{"op":0,"s":3,"t":"MESSAGE_CREATE","d":{"id":"1"}}"#).unwrap();
        assert_eq!(frame.op, Opcode::Dispatch);
        assert_eq!(frame.s, Some(3));
        assert_eq!(frame.t.as_deref(), Some("MESSAGE_CREATE"));
    }

    #[test]
    fn test_decode_null_fields() {
        let frame = Frame::decode(br#"{"op":11,"d":null,"s":null,"t":null}"#).unwrap();
        assert_eq!(frame.op, Opcode::HeartbeatAck);
        assert_eq!(frame.s, None);
    }

    #[test]
    fn test_decode_malformed() {
        assert!(matches!(
            Frame::decode(b"not json"),
            Err(GatewayError::MalformedFrame(_))
        ));
        assert!(matches!(
            Frame::decode(br#"{"d":{}}"#),
            Err(GatewayError::MalformedFrame(_))
        ));
    }

    #[test]
    fn test_unknown_opcode_round_trips() {
        assert_eq!(Opcode::from(42), Opcode::Unknown(42));
        assert_eq!(Opcode::Unknown(42).code(), 42);
    }

    #[test]
    fn test_decode_wide_opcode_is_unknown() {
        let frame = Frame::decode(br#"{"op":4096,"d":null}"#).unwrap();
        assert_eq!(frame.op, Opcode::Unknown(4096));
        assert_eq!(frame.to_value()["op"], 4096);
    }

    #[test]
    fn test_payload_shapes() {
        assert_eq!(heartbeat(None), json!({"op": 1, "d": null}));
        assert_eq!(heartbeat(Some(9))["d"], 9);

        let id = identify("tok", Intents::from_bits(513));
        assert_eq!(id["op"], 2);
        assert_eq!(id["d"]["intents"], 513);
        assert_eq!(id["d"]["compress"], false);

        let r = resume("tok", "sess", Some(4));
        assert_eq!(r["op"], 6);
        assert_eq!(r["d"]["session_id"], "sess");
        assert_eq!(r["d"]["seq"], 4);
    }
}
