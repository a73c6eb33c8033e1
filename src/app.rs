//! Application context and the conversation router.

use crate::api::{ProviderFactory, RemoteProviders};
use crate::chat::{
    texts, ChatId, ChatTransport, ConversationStore, DialogState, IncomingMessage, Keyboard,
    MemoryStore,
};
use crate::mime::ImageKind;
use crate::models::Config;
use crate::poller::{poll_until_ready, PollOutcome, PollPolicy, ProgressNotifier};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::time::Duration;
use tokio_retry::{strategy::FixedInterval, RetryIf};
use tracing::{error, info, warn};

const STYLE_TITLE_KEY: &str = "style_title";
const STYLE_KEY: &str = "style";
const DEFAULT_STYLE: &str = "DEFAULT";

/// Tunables for a running bot.
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub poll: PollPolicy,
    /// Extra attempts when the style catalog cannot be reached.
    pub style_fetch_retries: usize,
    pub style_fetch_delay: Duration,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            poll: PollPolicy::default(),
            style_fetch_retries: 3,
            style_fetch_delay: Duration::from_secs(1),
        }
    }
}

impl AppSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            poll: PollPolicy::new(config.poll_attempts, config.poll_delay),
            ..Self::default()
        }
    }
}

/// Everything a message handler needs, built once at startup.
pub struct App {
    transport: Box<dyn ChatTransport>,
    store: Box<dyn ConversationStore>,
    providers: Box<dyn ProviderFactory>,
    settings: AppSettings,
}

/// Injectable collaborator bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub transport: Box<dyn ChatTransport>,
    pub store: Box<dyn ConversationStore>,
    pub providers: Box<dyn ProviderFactory>,
}

/// Forwards poll progress to the conversation as wait messages.
struct ChatProgress<'a> {
    transport: &'a dyn ChatTransport,
    chat_id: ChatId,
}

#[async_trait]
impl<'a> ProgressNotifier for ChatProgress<'a> {
    async fn notify(&self, attempt: u32) -> Result<()> {
        self.transport
            .send_text(self.chat_id, texts::wait_text(attempt), &Keyboard::Remove)
            .await
    }
}

fn is_command(text: &str, command: &str) -> bool {
    text.split_whitespace()
        .next()
        .and_then(|word| word.strip_prefix('/'))
        .map(|word| word.split('@').next() == Some(command))
        .unwrap_or(false)
}

impl App {
    pub fn with_services(services: AppServices, settings: AppSettings) -> Self {
        Self {
            transport: services.transport,
            store: services.store,
            providers: services.providers,
            settings,
        }
    }

    /// Real providers from `config`, in-memory conversation state.
    pub fn from_config(config: Config, transport: Box<dyn ChatTransport>) -> Self {
        let settings = AppSettings::from_config(&config);
        Self::with_services(
            AppServices {
                transport,
                store: Box::new(MemoryStore::new()),
                providers: Box::new(RemoteProviders::new(config)),
            },
            settings,
        )
    }

    /// Route one incoming message. Only chat delivery and storage failures
    /// are returned; generation problems are reported to the user.
    pub async fn handle_message(&self, message: &IncomingMessage) -> Result<()> {
        let chat_id = message.chat_id;
        let text = message.text.trim();

        if is_command(text, "cancel") {
            return self.cancel(chat_id).await;
        }

        match self.store.state(chat_id).await? {
            DialogState::InputPrompt => return self.execute_prompt(chat_id, text).await,
            DialogState::InputStyle => return self.apply_style(chat_id, &message.text).await,
            DialogState::Idle => {}
        }

        if is_command(text, "input") || text.starts_with(texts::BUTTON_PROMPT) {
            self.input_prompt(chat_id).await
        } else if is_command(text, "style") || text.starts_with(texts::BUTTON_STYLE) {
            self.input_style(chat_id).await
        } else if is_command(text, "help") || text.starts_with(texts::BUTTON_HELP) {
            self.transport
                .send_text(chat_id, texts::HELP, &Keyboard::start())
                .await
        } else {
            self.transport
                .send_text(chat_id, texts::GREETING, &Keyboard::start())
                .await
        }
    }

    async fn cancel(&self, chat_id: ChatId) -> Result<()> {
        self.store.clear(chat_id).await?;
        self.transport
            .send_text(chat_id, texts::STOPPED, &Keyboard::Remove)
            .await
    }

    async fn input_prompt(&self, chat_id: ChatId) -> Result<()> {
        self.store
            .set_state(chat_id, DialogState::InputPrompt)
            .await?;
        self.transport
            .send_text(chat_id, texts::WRITE_PROMPT, &Keyboard::Remove)
            .await
    }

    async fn input_style(&self, chat_id: ChatId) -> Result<()> {
        self.store.set_state(chat_id, DialogState::InputStyle).await?;

        match self.style_titles().await {
            Ok(titles) => {
                self.transport
                    .send_text(chat_id, texts::CHOOSE_STYLE, &Keyboard::styles(&titles))
                    .await
            }
            Err(e) => {
                self.store.set_state(chat_id, DialogState::Idle).await?;
                self.report_failure(chat_id, e, texts::STYLES_UNAVAILABLE)
                    .await
            }
        }
    }

    async fn apply_style(&self, chat_id: ChatId, title: &str) -> Result<()> {
        self.store.set_state(chat_id, DialogState::Idle).await?;

        match self.find_style(title).await {
            Ok(style) => {
                self.store
                    .set(chat_id, STYLE_TITLE_KEY, title.to_string())
                    .await?;
                info!("Chat {} selected style {} ({})", chat_id, title, style);
                self.store.set(chat_id, STYLE_KEY, style).await?;
                self.transport
                    .send_text(chat_id, texts::STYLE_SET, &Keyboard::start())
                    .await
            }
            Err(Error::WrongParameters(reason)) => {
                warn!("Chat {}: {}", chat_id, reason);
                self.transport
                    .send_text(chat_id, texts::INVALID_STYLE, &Keyboard::start())
                    .await
            }
            Err(e) => {
                self.report_failure(chat_id, e, texts::STYLES_UNAVAILABLE)
                    .await
            }
        }
    }

    async fn execute_prompt(&self, chat_id: ChatId, prompt: &str) -> Result<()> {
        self.store.set_state(chat_id, DialogState::Idle).await?;

        let style_title = self
            .store
            .get(chat_id, STYLE_TITLE_KEY)
            .await?
            .unwrap_or_else(|| DEFAULT_STYLE.to_string());
        let style = self
            .store
            .get(chat_id, STYLE_KEY)
            .await?
            .unwrap_or_else(|| DEFAULT_STYLE.to_string());

        self.transport
            .send_text(
                chat_id,
                &texts::generating_with_style(&style_title),
                &Keyboard::Remove,
            )
            .await?;

        match self.generate(chat_id, prompt, &style).await {
            Ok(PollOutcome::Ready(images)) => match decode_images(&images) {
                Ok(photos) => {
                    for photo in &photos {
                        let filename = ImageKind::detect(photo).photo_filename();
                        self.transport
                            .send_photo(chat_id, photo, &filename, &Keyboard::start())
                            .await?;
                    }
                    info!("Delivered {} image(s) to chat {}", photos.len(), chat_id);
                    Ok(())
                }
                Err(e) => {
                    self.report_failure(chat_id, e, texts::GENERATION_FAILED)
                        .await
                }
            },
            Ok(PollOutcome::Timeout) => {
                self.transport
                    .send_text(chat_id, texts::TIMEOUT, &Keyboard::start())
                    .await
            }
            Err(e) => {
                self.report_failure(chat_id, e, texts::GENERATION_FAILED)
                    .await
            }
        }
    }

    /// Start a job on a fresh provider and poll it. The provider, and the
    /// HTTP session it owns, is released when this returns or is dropped.
    async fn generate(&self, chat_id: ChatId, prompt: &str, style: &str) -> Result<PollOutcome> {
        let mut provider = self.providers.generation_provider();
        provider.start_generation(prompt, style).await?;

        let progress = ChatProgress {
            transport: self.transport.as_ref(),
            chat_id,
        };
        poll_until_ready(provider.as_mut(), &self.settings.poll, &progress).await
    }

    async fn style_titles(&self) -> Result<Vec<String>> {
        let providers = self.providers.as_ref();
        RetryIf::spawn(
            self.style_retry_strategy(),
            move || async move {
                let mut catalog = providers.style_catalog();
                catalog.list_style_titles().await
            },
            |e: &Error| e.is_retriable(),
        )
        .await
    }

    async fn find_style(&self, title: &str) -> Result<String> {
        let providers = self.providers.as_ref();
        RetryIf::spawn(
            self.style_retry_strategy(),
            move || async move {
                let mut catalog = providers.style_catalog();
                catalog.resolve_style(title).await
            },
            |e: &Error| e.is_retriable(),
        )
        .await
    }

    fn style_retry_strategy(&self) -> impl Iterator<Item = Duration> {
        FixedInterval::new(self.settings.style_fetch_delay).take(self.settings.style_fetch_retries)
    }

    /// Turn a core error into a user-facing reply. Chat and I/O failures are
    /// not recoverable here and propagate.
    async fn report_failure(&self, chat_id: ChatId, error: Error, fallback: &str) -> Result<()> {
        if matches!(error, Error::Chat(_) | Error::Io(_)) {
            return Err(error);
        }
        let reply = match error {
            Error::WrongParameters(_) => texts::WRONG_PARAMETERS,
            Error::IncorrectUse(_) | Error::Config(_) => texts::INTERNAL_FAULT,
            _ => fallback,
        };
        error!("Chat {}: {}", chat_id, error);
        self.transport
            .send_text(chat_id, reply, &Keyboard::start())
            .await
    }
}

fn decode_images(images: &[String]) -> Result<Vec<Vec<u8>>> {
    images
        .iter()
        .map(|image| {
            BASE64.decode(image.as_bytes()).map_err(|e| {
                Error::WrongResponseBody(format!("Image is not valid base64: {}", e))
            })
        })
        .collect()
}
