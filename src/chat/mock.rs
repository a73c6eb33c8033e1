use super::{ChatId, ChatTransport, Keyboard};
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SentMessage {
    Text {
        chat_id: ChatId,
        text: String,
        keyboard: Keyboard,
    },
    Photo {
        chat_id: ChatId,
        photo: Vec<u8>,
        filename: String,
        keyboard: Keyboard,
    },
}

/// Transport that records everything sent through it.
///
/// Clones share the same log, so a test can keep one as a probe.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    fail_sends: Arc<Mutex<bool>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send fail with a chat error.
    pub fn failing(self) -> Self {
        *self.fail_sends.lock().unwrap() = true;
        self
    }

    pub fn get_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn get_texts(&self) -> Vec<String> {
        self.get_messages()
            .into_iter()
            .filter_map(|message| match message {
                SentMessage::Text { text, .. } => Some(text),
                SentMessage::Photo { .. } => None,
            })
            .collect()
    }

    pub fn get_photos(&self) -> Vec<(Vec<u8>, String)> {
        self.get_messages()
            .into_iter()
            .filter_map(|message| match message {
                SentMessage::Photo {
                    photo, filename, ..
                } => Some((photo, filename)),
                SentMessage::Text { .. } => None,
            })
            .collect()
    }

    pub fn last(&self) -> Option<SentMessage> {
        self.sent.lock().unwrap().last().cloned()
    }

    fn record(&self, message: SentMessage) -> Result<()> {
        if *self.fail_sends.lock().unwrap() {
            return Err(Error::Chat("Mock delivery failure".to_string()));
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(&self, chat_id: ChatId, text: &str, keyboard: &Keyboard) -> Result<()> {
        self.record(SentMessage::Text {
            chat_id,
            text: text.to_string(),
            keyboard: keyboard.clone(),
        })
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &[u8],
        filename: &str,
        keyboard: &Keyboard,
    ) -> Result<()> {
        self.record(SentMessage::Photo {
            chat_id,
            photo: photo.to_vec(),
            filename: filename.to_string(),
            keyboard: keyboard.clone(),
        })
    }
}
