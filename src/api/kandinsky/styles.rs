use super::client::KandinskyClient;
use super::types::RemoteStyle;
use crate::api::transport::RequestOptions;
use crate::api::{decode_list, StyleCatalog};
use crate::models::Style;
use crate::Result;
use async_trait::async_trait;
use reqwest::StatusCode;

#[async_trait]
impl StyleCatalog for KandinskyClient {
    /// Fetches the public style table; no credentials are needed.
    async fn fetch_styles(&mut self) -> Result<Vec<Style>> {
        let url = self.styles_url.clone();
        let data = self
            .transport
            .get(StatusCode::OK, &url, RequestOptions::new())
            .await?;

        let styles: Vec<RemoteStyle> = decode_list(data, "styles")?;
        tracing::debug!("Fetched {} Kandinsky styles", styles.len());
        Ok(styles
            .into_iter()
            .map(|style| Style::new(style.title, style.name))
            .collect())
    }
}
