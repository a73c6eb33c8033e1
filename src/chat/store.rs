use super::{ChatId, ConversationStore, DialogState};
use crate::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Conversation {
    state: DialogState,
    data: HashMap<String, String>,
}

/// Process-local conversation store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    conversations: Mutex<HashMap<ChatId, Conversation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_conversation<T>(&self, chat_id: ChatId, f: impl FnOnce(&mut Conversation) -> T) -> T {
        let mut conversations = self
            .conversations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(conversations.entry(chat_id).or_default())
    }
}

#[async_trait]
impl ConversationStore for MemoryStore {
    async fn state(&self, chat_id: ChatId) -> Result<DialogState> {
        Ok(self.with_conversation(chat_id, |conversation| conversation.state))
    }

    async fn set_state(&self, chat_id: ChatId, state: DialogState) -> Result<()> {
        self.with_conversation(chat_id, |conversation| conversation.state = state);
        Ok(())
    }

    async fn get(&self, chat_id: ChatId, key: &str) -> Result<Option<String>> {
        Ok(self.with_conversation(chat_id, |conversation| conversation.data.get(key).cloned()))
    }

    async fn set(&self, chat_id: ChatId, key: &str, value: String) -> Result<()> {
        self.with_conversation(chat_id, |conversation| {
            conversation.data.insert(key.to_string(), value);
        });
        Ok(())
    }

    async fn clear(&self, chat_id: ChatId) -> Result<()> {
        self.conversations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&chat_id);
        Ok(())
    }
}
