use super::{GenerationProvider, ProviderFactory, StyleCatalog};
use crate::models::Style;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Scripted provider: images become ready after a fixed number of checks.
#[derive(Clone)]
pub struct MockGenerationProvider {
    images: Arc<Mutex<Vec<String>>>,
    checks_until_ready: Arc<Mutex<Option<usize>>>,
    check_failure: Arc<Mutex<Option<String>>>,
    ready: Arc<Mutex<Vec<String>>>,
    started: Arc<Mutex<Vec<(String, String)>>>,
    check_count: Arc<Mutex<usize>>,
}

impl MockGenerationProvider {
    pub fn new() -> Self {
        Self {
            images: Arc::new(Mutex::new(Vec::new())),
            checks_until_ready: Arc::new(Mutex::new(Some(1))),
            check_failure: Arc::new(Mutex::new(None)),
            ready: Arc::new(Mutex::new(Vec::new())),
            started: Arc::new(Mutex::new(Vec::new())),
            check_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Image (base64) delivered once the job resolves.
    pub fn with_image(self, image: String) -> Self {
        self.images.lock().unwrap().push(image);
        self
    }

    /// Resolve on the `checks`-th call to `check_generation`.
    pub fn with_checks_until_ready(self, checks: usize) -> Self {
        *self.checks_until_ready.lock().unwrap() = Some(checks);
        self
    }

    pub fn never_ready(self) -> Self {
        *self.checks_until_ready.lock().unwrap() = None;
        self
    }

    /// Fail every `check_generation` call with an image generation error.
    pub fn with_check_failure(self, reason: String) -> Self {
        *self.check_failure.lock().unwrap() = Some(reason);
        self
    }

    pub fn get_started(&self) -> Vec<(String, String)> {
        self.started.lock().unwrap().clone()
    }

    pub fn get_check_count(&self) -> usize {
        *self.check_count.lock().unwrap()
    }
}

impl Default for MockGenerationProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationProvider for MockGenerationProvider {
    async fn start_generation(&mut self, prompt: &str, style: &str) -> Result<()> {
        if prompt.trim().is_empty() || style.trim().is_empty() {
            return Err(Error::WrongParameters(
                "Prompt and style must not be empty".to_string(),
            ));
        }
        self.started
            .lock()
            .unwrap()
            .push((prompt.to_string(), style.to_string()));
        Ok(())
    }

    async fn check_generation(&mut self) -> Result<()> {
        let mut count = self.check_count.lock().unwrap();
        *count += 1;

        if let Some(reason) = self.check_failure.lock().unwrap().clone() {
            return Err(Error::ImageGeneration(reason));
        }

        if *self.checks_until_ready.lock().unwrap() == Some(*count) {
            let images = self.images.lock().unwrap().clone();
            self.ready.lock().unwrap().extend(images);
        }
        Ok(())
    }

    fn take_ready_images(&mut self) -> Vec<String> {
        std::mem::take(&mut *self.ready.lock().unwrap())
    }
}

/// In-memory catalog that can fail its first fetches with a transport error.
#[derive(Clone)]
pub struct MockStyleCatalog {
    styles: Arc<Mutex<Vec<Style>>>,
    failures_left: Arc<Mutex<usize>>,
    fetch_count: Arc<Mutex<usize>>,
}

impl MockStyleCatalog {
    pub fn new() -> Self {
        Self {
            styles: Arc::new(Mutex::new(Vec::new())),
            failures_left: Arc::new(Mutex::new(0)),
            fetch_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_style(self, title: &str, identifier: &str) -> Self {
        self.styles
            .lock()
            .unwrap()
            .push(Style::new(title, identifier));
        self
    }

    pub fn with_failures(self, failures: usize) -> Self {
        *self.failures_left.lock().unwrap() = failures;
        self
    }

    pub fn get_fetch_count(&self) -> usize {
        *self.fetch_count.lock().unwrap()
    }
}

impl Default for MockStyleCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StyleCatalog for MockStyleCatalog {
    async fn fetch_styles(&mut self) -> Result<Vec<Style>> {
        *self.fetch_count.lock().unwrap() += 1;

        let mut failures_left = self.failures_left.lock().unwrap();
        if *failures_left > 0 {
            *failures_left -= 1;
            return Err(Error::RequestFailed("Mock failure".to_string()));
        }
        Ok(self.styles.lock().unwrap().clone())
    }
}

/// Factory handing out clones of one mock provider and catalog.
///
/// Clones share state, so tests keep a probe and inspect it afterwards.
#[derive(Clone, Default)]
pub struct MockProviders {
    pub provider: MockGenerationProvider,
    pub catalog: MockStyleCatalog,
}

impl MockProviders {
    pub fn new(provider: MockGenerationProvider, catalog: MockStyleCatalog) -> Self {
        Self { provider, catalog }
    }
}

impl ProviderFactory for MockProviders {
    fn generation_provider(&self) -> Box<dyn GenerationProvider> {
        Box::new(self.provider.clone())
    }

    fn style_catalog(&self) -> Box<dyn StyleCatalog> {
        Box::new(self.catalog.clone())
    }
}
