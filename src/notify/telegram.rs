// src/notify/telegram.rs

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::time::Duration;

use crate::domain::ActionControl;
use crate::media::{self, MediaKind};
use crate::notify::channel::{
    ActionBatch, ActionEvent, Channel, DeliveredMessage, DeliveryError, MessageRef,
    OutboundMessage,
};

/// Longest long-poll we ask Telegram for; the HTTP timeout sits above it.
pub const MAX_POLL_SECS: u64 = 50;
const HTTP_TIMEOUT: Duration = Duration::from_secs(MAX_POLL_SECS + 20);

pub struct TelegramChannel {
    api_base: String,
    bot_token: String,
    chat_id: i64,
    client: Client,
}

#[derive(Serialize)]
struct InlineButton<'a> {
    text: &'a str,
    callback_data: String,
}

#[derive(Serialize)]
struct InlineKeyboard<'a> {
    inline_keyboard: Vec<Vec<InlineButton<'a>>>,
}

fn keyboard(controls: &[ActionControl]) -> InlineKeyboard<'_> {
    InlineKeyboard {
        inline_keyboard: vec![controls
            .iter()
            .map(|c| InlineButton {
                text: &c.label,
                callback_data: c.payload.encode(),
            })
            .collect()],
    }
}

/// Envelope around every Bot API response.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct Message {
    message_id: i64,
    chat: Chat,
    text: Option<String>,
    caption: Option<String>,
    photo: Option<serde_json::Value>,
    video: Option<serde_json::Value>,
    document: Option<serde_json::Value>,
}

impl Message {
    fn reference(&self) -> MessageRef {
        MessageRef {
            chat_id: self.chat.id,
            message_id: self.message_id,
            has_media: self.photo.is_some() || self.video.is_some() || self.document.is_some(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    id: String,
    data: Option<String>,
    message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    callback_query: Option<CallbackQuery>,
}

impl Update {
    /// Updates other than button presses are skipped but still advance the cursor.
    fn into_action(self) -> Option<ActionEvent> {
        let query = self.callback_query?;
        let message = query.message.map(|m| DeliveredMessage {
            reference: m.reference(),
            body: m.caption.clone().or_else(|| m.text.clone()).unwrap_or_default(),
        });
        Some(ActionEvent {
            update_id: self.update_id,
            interaction_id: query.id,
            payload: query.data,
            message,
        })
    }
}

fn parse_updates(body: &str) -> Result<ActionBatch, DeliveryError> {
    let updates: Vec<Update> = unwrap_envelope(body)?;
    let last_update_id = updates.iter().map(|u| u.update_id).max();
    Ok(ActionBatch {
        events: updates.into_iter().filter_map(Update::into_action).collect(),
        last_update_id,
    })
}

fn unwrap_envelope<T: DeserializeOwned>(body: &str) -> Result<T, DeliveryError> {
    let envelope: ApiResponse<T> = serde_json::from_str(body)
        .map_err(|e| DeliveryError::ApiError(format!("unreadable response: {e}")))?;
    if !envelope.ok {
        return Err(DeliveryError::ApiError(
            envelope.description.unwrap_or_else(|| "(no description)".into()),
        ));
    }
    envelope
        .result
        .ok_or_else(|| DeliveryError::ApiError("response without result".into()))
}

impl TelegramChannel {
    pub fn new(api_base: String, bot_token: String, chat_id: i64) -> Result<Self, DeliveryError> {
        let client = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| DeliveryError::RequestFailed(e.to_string()))?;

        Ok(Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token,
            chat_id,
            client,
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<T, DeliveryError> {
        let response = self
            .client
            .post(self.url(method))
            .json(body)
            .send()
            .map_err(|e| DeliveryError::RequestFailed(format!("{method}: {}", e.without_url())))?;

        let text = response
            .text()
            .map_err(|e| DeliveryError::RequestFailed(format!("{method}: {}", e.without_url())))?;
        unwrap_envelope(&text)
    }

    fn send_media(
        &self,
        message: &OutboundMessage,
        path: &std::path::Path,
        kind: MediaKind,
    ) -> Result<Message, DeliveryError> {
        let (method, field) = match kind {
            MediaKind::Photo => ("sendPhoto", "photo"),
            MediaKind::Video => ("sendVideo", "video"),
            MediaKind::Document => ("sendDocument", "document"),
        };

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("attachment")
            .to_string();
        let bytes = fs::read(path).map_err(|e| DeliveryError::Attachment(e.to_string()))?;
        let part = Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(media::mime_of(&file_name).as_ref())
            .map_err(|e| DeliveryError::Attachment(e.to_string()))?;

        let markup = serde_json::to_string(&keyboard(&message.controls))
            .map_err(|e| DeliveryError::ApiError(e.to_string()))?;

        let form = Form::new()
            .text("chat_id", self.chat_id.to_string())
            .text("caption", message.text.clone())
            .text("parse_mode", "HTML")
            .text("reply_markup", markup)
            .part(field, part);

        let response = self
            .client
            .post(self.url(method))
            .multipart(form)
            .send()
            .map_err(|e| DeliveryError::RequestFailed(format!("{method}: {}", e.without_url())))?;
        let text = response
            .text()
            .map_err(|e| DeliveryError::RequestFailed(format!("{method}: {}", e.without_url())))?;
        unwrap_envelope(&text)
    }
}

impl Channel for TelegramChannel {
    fn send(&self, message: &OutboundMessage) -> Result<MessageRef, DeliveryError> {
        let sent: Message = match &message.attachment {
            Some(att) => self.send_media(message, &att.path, att.kind)?,
            None => self.call(
                "sendMessage",
                &json!({
                    "chat_id": self.chat_id,
                    "text": message.text,
                    "parse_mode": "HTML",
                    "disable_web_page_preview": true,
                    "reply_markup": keyboard(&message.controls),
                }),
            )?,
        };
        Ok(sent.reference())
    }

    fn edit(
        &self,
        target: &MessageRef,
        text: &str,
        controls: &[ActionControl],
    ) -> Result<(), DeliveryError> {
        let (method, field) = if target.has_media {
            ("editMessageCaption", "caption")
        } else {
            ("editMessageText", "text")
        };

        let mut body = json!({
            "chat_id": target.chat_id,
            "message_id": target.message_id,
            "parse_mode": "HTML",
            "reply_markup": keyboard(controls),
        });
        body[field] = json!(text);

        // Edits answer with the edited Message; only success matters here.
        let _: serde_json::Value = self.call(method, &body)?;
        Ok(())
    }

    fn acknowledge(
        &self,
        interaction_id: &str,
        notice: &str,
        alert: bool,
    ) -> Result<(), DeliveryError> {
        let _: bool = self.call(
            "answerCallbackQuery",
            &json!({
                "callback_query_id": interaction_id,
                "text": notice,
                "show_alert": alert,
            }),
        )?;
        Ok(())
    }

    fn poll_actions(
        &self,
        offset: Option<i64>,
        wait: Duration,
    ) -> Result<ActionBatch, DeliveryError> {
        let mut body = json!({
            "timeout": wait.as_secs().min(MAX_POLL_SECS),
            "allowed_updates": ["callback_query"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }

        let response = self
            .client
            .post(self.url("getUpdates"))
            .json(&body)
            .send()
            .map_err(|e| DeliveryError::RequestFailed(format!("getUpdates: {}", e.without_url())))?;
        let text = response
            .text()
            .map_err(|e| DeliveryError::RequestFailed(format!("getUpdates: {}", e.without_url())))?;

        parse_updates(&text)
    }
}
