use super::yandex::FolderCredentials;
use super::{
    GenerationProvider, KandinskyClient, ProviderFactory, StaticStyleCatalog, StyleCatalog,
    YandexArtClient,
};
use crate::models::{Config, Credentials, ProviderKind};

/// Builds real provider clients from configuration.
///
/// Every call returns a client with no HTTP session yet; the session is
/// opened on first request and released when the client is dropped.
pub struct RemoteProviders {
    config: Config,
}

impl RemoteProviders {
    pub fn new(config: Config) -> Self {
        tracing::info!("Image provider: {}", config.provider);
        Self { config }
    }

    fn kandinsky(&self) -> KandinskyClient {
        let credentials = Credentials::new(
            self.config.kandinsky_api_key.clone().unwrap_or_default(),
            self.config.kandinsky_secret_key.clone().unwrap_or_default(),
        );
        KandinskyClient::new(credentials)
            .with_base_url(self.config.kandinsky_api_url.clone())
            .with_styles_url(self.config.kandinsky_styles_url.clone())
    }

    fn yandex_art(&self) -> YandexArtClient {
        let credentials = FolderCredentials::new(
            self.config.yandex_folder_id.clone().unwrap_or_default(),
            self.config.yandex_api_key.clone().unwrap_or_default(),
        );
        YandexArtClient::new(credentials).with_base_url(self.config.yandex_api_url.clone())
    }
}

impl ProviderFactory for RemoteProviders {
    fn generation_provider(&self) -> Box<dyn GenerationProvider> {
        match self.config.provider {
            ProviderKind::Kandinsky => Box::new(self.kandinsky()),
            ProviderKind::YandexArt => Box::new(self.yandex_art()),
        }
    }

    fn style_catalog(&self) -> Box<dyn StyleCatalog> {
        match self.config.provider {
            ProviderKind::Kandinsky => Box::new(self.kandinsky()),
            ProviderKind::YandexArt => Box::new(StaticStyleCatalog::default()),
        }
    }
}
