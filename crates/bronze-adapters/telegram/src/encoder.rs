//! Message encoder.
//!
//! Walks a document depth-first, accumulating a pending call and flushing it
//! whenever the next node cannot share the call. Two render modes exist:
//!
//! - **Default**: a media node always starts its own call, and text written
//!   after it starts another.
//! - **Figure**: media and the caption around it collect into one call.
//!
//! A flush with neither text nor media sends nothing. After every flush the
//! text, media and reply target are cleared; the target chat and thread stay.

use std::sync::Arc;

use bronze_core::{BoxedHost, Element, FormPart, Media, Session, Style};
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::api::{SendMessage, TelegramApi};
use crate::asset::AssetResolver;
use crate::bot::adapt_sent;
use crate::endpoint::EndpointTable;
use crate::error::EncodeError;
use crate::model::TgMessage;

/// Encoder render mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    Default,
    Figure,
}

/// The call being accumulated.
#[derive(Debug, Clone, Default)]
struct PendingCall {
    chat_id: String,
    thread_id: Option<i64>,
    text: String,
    media: Option<Media>,
    reply_to: Option<i64>,
}

/// Encodes one document into Bot API calls.
///
/// One encoder serves one send; create a new one per document.
pub struct MessageEncoder {
    api: Arc<dyn TelegramApi>,
    assets: Arc<dyn AssetResolver>,
    host: BoxedHost,
    endpoints: EndpointTable,
    self_id: String,
    link_preview: bool,
    mode: RenderMode,
    pending: PendingCall,
    results: Vec<Session>,
}

impl MessageEncoder {
    /// Creates an encoder targeting `channel_id`, optionally inside a group.
    ///
    /// The chat is the group when one is given, else the channel. A channel
    /// that differs from its group is a forum topic and becomes the thread.
    pub fn new(
        api: Arc<dyn TelegramApi>,
        assets: Arc<dyn AssetResolver>,
        host: BoxedHost,
        self_id: impl Into<String>,
        channel_id: &str,
        guild_id: Option<&str>,
    ) -> Self {
        let chat_id = guild_id.unwrap_or(channel_id).to_string();
        let thread_id = match guild_id {
            Some(guild) if guild != channel_id => match channel_id.parse() {
                Ok(id) => Some(id),
                Err(_) => {
                    warn!(channel_id = %channel_id, "Thread id is not numeric, ignoring");
                    None
                }
            },
            _ => None,
        };

        Self {
            api,
            assets,
            host,
            endpoints: EndpointTable::default(),
            self_id: self_id.into(),
            link_preview: false,
            mode: RenderMode::Default,
            pending: PendingCall {
                chat_id,
                thread_id,
                ..Default::default()
            },
            results: Vec::new(),
        }
    }

    /// Enables link previews for text calls.
    pub fn with_link_preview(mut self, enabled: bool) -> Self {
        self.link_preview = enabled;
        self
    }

    /// Replaces the media endpoint table.
    pub fn with_endpoints(mut self, endpoints: EndpointTable) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Returns the sessions of the calls sent so far, in call order.
    pub fn results(&self) -> &[Session] {
        &self.results
    }

    /// Renders a whole document and flushes what is left.
    pub async fn encode(&mut self, elements: &[Element]) -> Result<(), EncodeError> {
        self.render(elements).await?;
        self.flush().await
    }

    /// Renders a document and returns the sent sessions.
    pub async fn send(mut self, elements: &[Element]) -> Result<Vec<Session>, EncodeError> {
        self.encode(elements).await?;
        Ok(self.results)
    }

    // =========================================================================
    // Traversal
    // =========================================================================

    fn render<'a>(&'a mut self, elements: &'a [Element]) -> BoxFuture<'a, Result<(), EncodeError>> {
        async move {
            for element in elements {
                self.visit(element).await?;
            }
            Ok(())
        }
        .boxed()
    }

    async fn visit(&mut self, element: &Element) -> Result<(), EncodeError> {
        match element {
            Element::Text { content } => self.write(&escape(content)).await?,
            Element::Br => self.write("\n").await?,
            Element::Paragraph { children } => {
                if !self.pending.text.is_empty() && !self.pending.text.ends_with('\n') {
                    self.write("\n").await?;
                }
                self.render(children).await?;
            }
            Element::Styled { style, children } => {
                let (open, close) = style_tags(style);
                self.write(&open).await?;
                self.render(children).await?;
                self.write(close).await?;
            }
            Element::Spoiler { children } => {
                self.write("<tg-spoiler>").await?;
                self.render(children).await?;
                self.write("</tg-spoiler>").await?;
            }
            Element::Code { content, lang } => {
                let class = lang
                    .as_deref()
                    .map(|lang| format!(" class=\"language-{}\"", escape(lang)))
                    .unwrap_or_default();
                self.write(&format!("<code{class}>{}</code>", escape(content)))
                    .await?;
            }
            Element::At { id, name } => {
                if let Some(id) = id {
                    let name = name.as_deref().unwrap_or(id.as_str());
                    self.write(&format!(
                        "<a href=\"tg://user?id={}\">@{}</a>",
                        escape(id),
                        escape(name)
                    ))
                    .await?;
                }
            }
            Element::Media(media) => {
                if self.mode == RenderMode::Default {
                    self.flush().await?;
                }
                self.pending.media = Some(media.clone());
            }
            Element::Quote { id } => {
                self.flush().await?;
                match id.parse() {
                    Ok(id) => self.pending.reply_to = Some(id),
                    Err(_) => warn!(id = %id, "Reply target is not a message id, ignoring"),
                }
            }
            Element::Figure { children } => {
                self.flush().await?;
                self.mode = RenderMode::Figure;
                let rendered = self.render(children).await;
                self.mode = RenderMode::Default;
                rendered?;
                self.flush().await?;
            }
            Element::Message { children } => match self.mode {
                RenderMode::Figure => {
                    self.render(children).await?;
                    self.write("\n").await?;
                }
                RenderMode::Default => {
                    self.flush().await?;
                    self.render(children).await?;
                    self.flush().await?;
                }
            },
            Element::Fragment { children } => self.render(children).await?,
        }
        Ok(())
    }

    /// Appends markup. In default mode, pending media is sent on its own
    /// before any text joins the next call.
    async fn write(&mut self, markup: &str) -> Result<(), EncodeError> {
        if markup.is_empty() {
            return Ok(());
        }
        if self.mode == RenderMode::Default && self.pending.media.is_some() {
            self.flush().await?;
        }
        self.pending.text.push_str(markup);
        Ok(())
    }

    // =========================================================================
    // Flushing
    // =========================================================================

    /// Sends the pending call, if there is anything to send.
    pub async fn flush(&mut self) -> Result<(), EncodeError> {
        let message = if let Some(media) = self.pending.media.take() {
            self.send_media(&media).await?
        } else if !self.pending.text.is_empty() {
            self.send_text().await?
        } else {
            return Ok(());
        };

        self.pending.reply_to = None;
        self.pending.text.clear();
        self.add_result(&message);
        Ok(())
    }

    async fn send_text(&self) -> Result<TgMessage, EncodeError> {
        let params = SendMessage {
            chat_id: self.pending.chat_id.clone(),
            text: self.pending.text.clone(),
            parse_mode: "html".to_string(),
            reply_to_message_id: self.pending.reply_to,
            message_thread_id: self.pending.thread_id,
            disable_web_page_preview: !self.link_preview,
        };
        debug!(chat_id = %params.chat_id, len = params.text.len(), "Sending text");
        Ok(self.api.send_message(params).await?)
    }

    async fn send_media(&self, media: &Media) -> Result<TgMessage, EncodeError> {
        let asset = self.assets.resolve(media).await?;
        let endpoint = self
            .endpoints
            .select(media.kind, &asset.mime, media.hint.as_deref())?;

        let mut form = vec![
            FormPart::text("chat_id", self.pending.chat_id.clone()),
            FormPart::text("parse_mode", "html"),
            FormPart::text("caption", self.pending.text.clone()),
        ];
        if let Some(reply_to) = self.pending.reply_to {
            form.push(FormPart::text("reply_to_message_id", reply_to.to_string()));
        }
        if let Some(thread_id) = self.pending.thread_id {
            form.push(FormPart::text("message_thread_id", thread_id.to_string()));
        }
        form.push(FormPart::file(
            endpoint.field(),
            asset.data,
            asset.filename,
            asset.mime,
        ));

        debug!(
            chat_id = %self.pending.chat_id,
            method = endpoint.method(),
            "Uploading media"
        );
        Ok(self.api.send_media(endpoint, form).await?)
    }

    fn add_result(&mut self, message: &TgMessage) {
        let session = adapt_sent(&self.self_id, message);
        self.host.sent(&session);
        self.results.push(session);
    }
}

fn style_tags(style: &Style) -> (String, &'static str) {
    match style {
        Style::Bold => ("<b>".into(), "</b>"),
        Style::Italic => ("<i>".into(), "</i>"),
        Style::Underline => ("<u>".into(), "</u>"),
        Style::Strikethrough => ("<s>".into(), "</s>"),
        Style::Link { href } => (format!("<a href=\"{}\">", escape_attr(href)), "</a>"),
    }
}

/// Escapes text for Telegram HTML.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

fn escape_attr(text: &str) -> String {
    escape(text).replace('"', "&quot;")
}
