//! Conversation plumbing: the chat collaborators the bot talks through.

pub mod console;
pub mod keyboards;
pub mod mock;
pub mod store;
pub mod texts;

pub use console::ConsoleTransport;
pub use keyboards::{Keyboard, ReplyKeyboard};
pub use mock::{RecordingTransport, SentMessage};
pub use store::MemoryStore;

use crate::Result;
use async_trait::async_trait;

pub type ChatId = i64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat_id: ChatId,
    pub text: String,
}

impl IncomingMessage {
    pub fn new(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
        }
    }
}

/// Where a conversation is in the two-step dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogState {
    #[default]
    Idle,
    InputPrompt,
    InputStyle,
}

/// Outgoing side of the chat platform.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str, keyboard: &Keyboard) -> Result<()>;

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &[u8],
        filename: &str,
        keyboard: &Keyboard,
    ) -> Result<()>;
}

/// Per-conversation dialog state plus a small key/value bag.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    async fn state(&self, chat_id: ChatId) -> Result<DialogState>;

    async fn set_state(&self, chat_id: ChatId, state: DialogState) -> Result<()>;

    async fn get(&self, chat_id: ChatId, key: &str) -> Result<Option<String>>;

    async fn set(&self, chat_id: ChatId, key: &str, value: String) -> Result<()>;

    /// Reset state to idle and drop all stored values.
    async fn clear(&self, chat_id: ChatId) -> Result<()>;
}
