//! Media endpoint selection.
//!
//! Each media upload goes through one of six Bot API methods, chosen by the
//! element's media kind and its encoding subtype (resolved content type or
//! explicit hint). The choice is a table lookup; the first matching row wins.

use bronze_core::MediaKind;

use crate::error::EncodeError;

/// A media upload method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaEndpoint {
    Photo,
    Animation,
    Document,
    Video,
    Audio,
    Voice,
}

impl MediaEndpoint {
    /// Returns the Bot API method name.
    pub fn method(self) -> &'static str {
        match self {
            Self::Photo => "sendPhoto",
            Self::Animation => "sendAnimation",
            Self::Document => "sendDocument",
            Self::Video => "sendVideo",
            Self::Audio => "sendAudio",
            Self::Voice => "sendVoice",
        }
    }

    /// Returns the multipart field carrying the file: the method name
    /// without its `send` prefix, lowercased.
    pub fn field(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Animation => "animation",
            Self::Document => "document",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Voice => "voice",
        }
    }
}

/// How a row matches the encoding subtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subtype {
    /// Any subtype.
    Any,
    /// Exact content type.
    Mime(&'static str),
    /// Explicit hint on the element.
    Hint(&'static str),
}

impl Subtype {
    fn matches(self, mime: &str, hint: Option<&str>) -> bool {
        match self {
            Self::Any => true,
            Self::Mime(expected) => mime.eq_ignore_ascii_case(expected),
            Self::Hint(expected) => hint == Some(expected),
        }
    }
}

const DEFAULT_ROWS: &[(MediaKind, Subtype, MediaEndpoint)] = &[
    (MediaKind::Image, Subtype::Mime("image/gif"), MediaEndpoint::Animation),
    (MediaKind::Image, Subtype::Any, MediaEndpoint::Photo),
    (MediaKind::File, Subtype::Any, MediaEndpoint::Document),
    (MediaKind::Video, Subtype::Any, MediaEndpoint::Video),
    (MediaKind::Audio, Subtype::Hint("voice"), MediaEndpoint::Voice),
    (MediaKind::Audio, Subtype::Any, MediaEndpoint::Audio),
];

/// Ordered `(kind, subtype) -> endpoint` table.
#[derive(Debug, Clone)]
pub struct EndpointTable {
    rows: Vec<(MediaKind, Subtype, MediaEndpoint)>,
}

impl Default for EndpointTable {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS.to_vec())
    }
}

impl EndpointTable {
    /// Creates a table from rows, matched in order.
    pub fn new(rows: Vec<(MediaKind, Subtype, MediaEndpoint)>) -> Self {
        Self { rows }
    }

    /// Selects the endpoint for a media item.
    pub fn select(
        &self,
        kind: MediaKind,
        mime: &str,
        hint: Option<&str>,
    ) -> Result<MediaEndpoint, EncodeError> {
        self.rows
            .iter()
            .find(|(row_kind, subtype, _)| *row_kind == kind && subtype.matches(mime, hint))
            .map(|(_, _, endpoint)| *endpoint)
            .ok_or_else(|| EncodeError::UnsupportedMedia {
                kind,
                mime: mime.to_string(),
            })
    }
}
