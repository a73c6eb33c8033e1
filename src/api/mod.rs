//! Image generation service integration
//!
//! Provider clients that start remote generation jobs, poll them and hand
//! back finished images, plus the style catalogs the user picks from.

pub mod factory;
pub mod kandinsky;
pub mod mock;
pub mod session;
pub mod styles;
pub mod transport;
pub mod yandex;

pub use factory::RemoteProviders;
pub use kandinsky::KandinskyClient;
pub use mock::{MockGenerationProvider, MockProviders, MockStyleCatalog};
pub use session::{GenerationSession, JobSlot};
pub use styles::StaticStyleCatalog;
pub use transport::{HttpSession, TransportClient};
pub use yandex::YandexArtClient;

use crate::models::Style;
use crate::{Error, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Start/poll/collect contract shared by every generation backend.
#[async_trait]
pub trait GenerationProvider: Send {
    /// Submit one job for `prompt` in the style identified by `style`.
    async fn start_generation(&mut self, prompt: &str, style: &str) -> Result<()>;

    /// Query every pending job once, moving finished ones to the ready list.
    async fn check_generation(&mut self) -> Result<()>;

    /// Return and clear the ready images (base64 payloads). Never fails.
    fn take_ready_images(&mut self) -> Vec<String>;
}

/// Title to identifier lookup over a provider's style table.
#[async_trait]
pub trait StyleCatalog: Send {
    async fn fetch_styles(&mut self) -> Result<Vec<Style>>;

    async fn list_style_titles(&mut self) -> Result<Vec<String>> {
        let styles = self.fetch_styles().await?;
        Ok(styles.into_iter().map(|style| style.title).collect())
    }

    /// Exact, case-sensitive match; the first entry with the title wins.
    async fn resolve_style(&mut self, title: &str) -> Result<String> {
        self.fetch_styles()
            .await?
            .into_iter()
            .find(|style| style.title == title)
            .map(|style| style.identifier)
            .ok_or_else(|| Error::WrongParameters(format!("Incorrect style: {}", title)))
    }
}

/// Hands out fresh, independently scoped provider instances per turn.
pub trait ProviderFactory: Send + Sync {
    fn generation_provider(&self) -> Box<dyn GenerationProvider>;
    fn style_catalog(&self) -> Box<dyn StyleCatalog>;
}

/// Decode a JSON object into `T`, rejecting arrays serde would otherwise
/// accept for structs.
pub(crate) fn decode_object<T: DeserializeOwned>(data: Value, what: &str) -> Result<T> {
    if !data.is_object() {
        return Err(Error::WrongResponseBody(format!(
            "{} is not a JSON object",
            what
        )));
    }
    serde_json::from_value(data)
        .map_err(|e| Error::WrongResponseBody(format!("{} is malformed: {}", what, e)))
}

/// Decode a non-empty JSON array of objects into `Vec<T>`.
pub(crate) fn decode_list<T: DeserializeOwned>(data: Value, what: &str) -> Result<Vec<T>> {
    let items = match data {
        Value::Array(items) if !items.is_empty() => items,
        _ => return Err(Error::WrongResponseBody(format!("No {} in the response", what))),
    };
    items
        .into_iter()
        .map(|item| decode_object(item, what))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Entry {
        id: String,
    }

    #[test]
    fn test_decode_object_rejects_arrays() {
        let err = decode_object::<Entry>(serde_json::json!(["x"]), "entry").unwrap_err();
        assert!(matches!(err, Error::WrongResponseBody(_)));
    }

    #[test]
    fn test_decode_object_reports_missing_fields() {
        let err = decode_object::<Entry>(serde_json::json!({ "name": "x" }), "entry").unwrap_err();
        assert!(matches!(err, Error::WrongResponseBody(_)));
    }

    #[test]
    fn test_decode_list_requires_entries() {
        assert!(decode_list::<Entry>(serde_json::json!([]), "entries").is_err());
        assert!(decode_list::<Entry>(serde_json::json!({}), "entries").is_err());

        let entries =
            decode_list::<Entry>(serde_json::json!([{ "id": "a" }, { "id": "b" }]), "entries")
                .unwrap();
        assert_eq!(
            entries,
            vec![
                Entry {
                    id: "a".to_string()
                },
                Entry {
                    id: "b".to_string()
                }
            ]
        );
    }

    #[tokio::test]
    async fn test_resolve_style_first_match_wins() {
        let mut catalog = StaticStyleCatalog::new(vec![
            Style::new("Anime", "ANIME"),
            Style::new("Anime", "ANIME_V2"),
        ]);
        assert_eq!(catalog.resolve_style("Anime").await.unwrap(), "ANIME");
    }

    #[tokio::test]
    async fn test_resolve_style_is_case_sensitive() {
        let mut catalog = StaticStyleCatalog::new(vec![Style::new("Anime", "ANIME")]);
        let err = catalog.resolve_style("anime").await.unwrap_err();
        assert!(matches!(err, Error::WrongParameters(_)));
    }
}
