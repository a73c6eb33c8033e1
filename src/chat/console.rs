use super::{ChatId, ChatTransport, Keyboard};
use crate::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;
use uuid::Uuid;

/// Terminal stand-in for a chat platform: replies go to stdout, photos to
/// files in the output directory.
pub struct ConsoleTransport {
    output_dir: PathBuf,
}

impl ConsoleTransport {
    pub fn new(output_dir: impl AsRef<Path>) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&output_dir)?;
        info!("Created output directory: {}", output_dir.display());
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

fn render_keyboard(keyboard: &Keyboard) -> Option<String> {
    match keyboard {
        Keyboard::Remove => None,
        Keyboard::Reply(reply) => Some(
            reply
                .rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|button| format!("[{}]", button))
                        .collect::<Vec<_>>()
                        .join(" ")
                })
                .collect::<Vec<_>>()
                .join("\n"),
        ),
    }
}

#[async_trait]
impl ChatTransport for ConsoleTransport {
    async fn send_text(&self, chat_id: ChatId, text: &str, keyboard: &Keyboard) -> Result<()> {
        println!("[{}] {}", chat_id, text);
        if let Some(buttons) = render_keyboard(keyboard) {
            println!("{}", buttons);
        }
        Ok(())
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo: &[u8],
        filename: &str,
        keyboard: &Keyboard,
    ) -> Result<()> {
        let path = self
            .output_dir
            .join(format!("{}_{}", Uuid::new_v4(), filename));
        tokio::fs::write(&path, photo).await?;
        info!("Saved {} bytes to {}", photo.len(), path.display());

        println!("[{}] <photo {}>", chat_id, path.display());
        if let Some(buttons) = render_keyboard(keyboard) {
            println!("{}", buttons);
        }
        Ok(())
    }
}
