//! Outbound document model.
//!
//! The host hands adapters an abstract document: a tree of [`Element`]s
//! mixing text, formatting, media references and structural markers. Each
//! adapter walks the tree and decides how it maps onto platform calls.
//!
//! # Example
//!
//! ```rust
//! use bronze_core::{Element, Media};
//!
//! let doc = vec![
//!     Element::quote("42"),
//!     Element::text("look at "),
//!     Element::bold([Element::text("this")]),
//!     Element::figure([
//!         Element::media(Media::image("https://example.com/cat.png")),
//!         Element::text("a cat"),
//!     ]),
//! ];
//! assert_eq!(Element::plain_text(&doc), "look at thisa cat");
//! ```

use serde::{Deserialize, Serialize};

/// Inline text style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum Style {
    /// Bold text.
    Bold,
    /// Italic text.
    Italic,
    /// Underlined text.
    Underline,
    /// Struck-through text.
    Strikethrough,
    /// Hyperlink.
    Link {
        /// Link target.
        href: String,
    },
}

/// Kind of a media reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// Still or animated image.
    Image,
    /// Audio clip or voice note.
    Audio,
    /// Video clip.
    Video,
    /// Arbitrary file.
    File,
}

impl MediaKind {
    /// Returns the element tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Video => "video",
            Self::File => "file",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference to a piece of media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    /// Media kind.
    pub kind: MediaKind,
    /// Where the content can be fetched from.
    pub url: String,
    /// Encoding hint (e.g. `"voice"` for audio).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Preferred file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl Media {
    /// Creates a media reference.
    pub fn new(kind: MediaKind, url: impl Into<String>) -> Self {
        Self {
            kind,
            url: url.into(),
            hint: None,
            filename: None,
        }
    }

    /// Creates an image reference.
    pub fn image(url: impl Into<String>) -> Self {
        Self::new(MediaKind::Image, url)
    }

    /// Creates an audio reference.
    pub fn audio(url: impl Into<String>) -> Self {
        Self::new(MediaKind::Audio, url)
    }

    /// Creates a video reference.
    pub fn video(url: impl Into<String>) -> Self {
        Self::new(MediaKind::Video, url)
    }

    /// Creates a file reference.
    pub fn file(url: impl Into<String>) -> Self {
        Self::new(MediaKind::File, url)
    }

    /// Sets the encoding hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Sets the file name.
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// A node of an outbound document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    /// Plain text. Adapters escape it for their markup.
    Text {
        /// Raw content.
        content: String,
    },
    /// Line break.
    Br,
    /// Paragraph.
    Paragraph {
        /// Paragraph body.
        children: Vec<Element>,
    },
    /// Styled inline run.
    Styled {
        /// Applied style.
        style: Style,
        /// Styled content.
        children: Vec<Element>,
    },
    /// Spoiler run.
    Spoiler {
        /// Hidden content.
        children: Vec<Element>,
    },
    /// Inline code.
    Code {
        /// Raw code.
        content: String,
        /// Optional language tag.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lang: Option<String>,
    },
    /// User mention.
    At {
        /// Mentioned user id.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Display name.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    /// Media reference.
    Media(Media),
    /// Reply marker: the next call replies to `id`.
    Quote {
        /// Message being replied to.
        id: String,
    },
    /// Groups one media item with its caption.
    Figure {
        /// Figure content.
        children: Vec<Element>,
    },
    /// Nested message, isolated into its own call.
    Message {
        /// Message content.
        children: Vec<Element>,
    },
    /// Transparent grouping.
    Fragment {
        /// Grouped content.
        children: Vec<Element>,
    },
}

impl Element {
    /// Creates a text element.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// Creates a paragraph.
    pub fn paragraph(children: impl IntoIterator<Item = Element>) -> Self {
        Self::Paragraph {
            children: children.into_iter().collect(),
        }
    }

    /// Creates a styled run.
    pub fn styled(style: Style, children: impl IntoIterator<Item = Element>) -> Self {
        Self::Styled {
            style,
            children: children.into_iter().collect(),
        }
    }

    /// Creates a bold run.
    pub fn bold(children: impl IntoIterator<Item = Element>) -> Self {
        Self::styled(Style::Bold, children)
    }

    /// Creates a hyperlink.
    pub fn link(href: impl Into<String>, children: impl IntoIterator<Item = Element>) -> Self {
        Self::styled(Style::Link { href: href.into() }, children)
    }

    /// Creates a spoiler.
    pub fn spoiler(children: impl IntoIterator<Item = Element>) -> Self {
        Self::Spoiler {
            children: children.into_iter().collect(),
        }
    }

    /// Creates an inline code element.
    pub fn code(content: impl Into<String>, lang: Option<String>) -> Self {
        Self::Code {
            content: content.into(),
            lang,
        }
    }

    /// Creates a mention.
    pub fn at(id: impl Into<String>, name: Option<String>) -> Self {
        Self::At {
            id: Some(id.into()),
            name,
        }
    }

    /// Creates a media element.
    pub fn media(media: Media) -> Self {
        Self::Media(media)
    }

    /// Creates a reply marker.
    pub fn quote(id: impl Into<String>) -> Self {
        Self::Quote { id: id.into() }
    }

    /// Creates a figure.
    pub fn figure(children: impl IntoIterator<Item = Element>) -> Self {
        Self::Figure {
            children: children.into_iter().collect(),
        }
    }

    /// Creates a nested message.
    pub fn message(children: impl IntoIterator<Item = Element>) -> Self {
        Self::Message {
            children: children.into_iter().collect(),
        }
    }

    /// Creates a fragment.
    pub fn fragment(children: impl IntoIterator<Item = Element>) -> Self {
        Self::Fragment {
            children: children.into_iter().collect(),
        }
    }

    /// Returns the children of a container element.
    pub fn children(&self) -> &[Element] {
        match self {
            Self::Paragraph { children }
            | Self::Styled { children, .. }
            | Self::Spoiler { children }
            | Self::Figure { children }
            | Self::Message { children }
            | Self::Fragment { children } => children,
            _ => &[],
        }
    }

    /// Concatenates the text content of a document, ignoring markup and media.
    pub fn plain_text(elements: &[Element]) -> String {
        let mut out = String::new();
        for element in elements {
            match element {
                Self::Text { content } | Self::Code { content, .. } => out.push_str(content),
                Self::Br => out.push('\n'),
                other => out.push_str(&Self::plain_text(other.children())),
            }
        }
        out
    }
}

impl From<&str> for Element {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for Element {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

impl From<Media> for Element {
    fn from(value: Media) -> Self {
        Self::Media(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_skips_media() {
        let doc = vec![
            Element::text("a"),
            Element::media(Media::image("https://x/y.png")),
            Element::paragraph([Element::text("b"), Element::Br]),
        ];
        assert_eq!(Element::plain_text(&doc), "ab\n");
    }

    #[test]
    fn test_deserialize_tagged_tree() {
        let json = r#"[
            {"type": "quote", "id": "7"},
            {"type": "figure", "children": [
                {"type": "media", "kind": "audio", "url": "https://x/a.ogg", "hint": "voice"},
                {"type": "text", "content": "hi"}
            ]}
        ]"#;
        let doc: Vec<Element> = serde_json::from_str(json).unwrap();
        assert_eq!(doc[0], Element::quote("7"));
        assert_eq!(
            doc[1].children()[0],
            Element::media(Media::audio("https://x/a.ogg").with_hint("voice"))
        );
    }
}
