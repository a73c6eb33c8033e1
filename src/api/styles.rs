use super::StyleCatalog;
use crate::models::Style;
use crate::Result;
use async_trait::async_trait;

/// Fixed style table for providers that expose no remote catalog.
#[derive(Debug, Clone)]
pub struct StaticStyleCatalog {
    styles: Vec<Style>,
}

impl StaticStyleCatalog {
    pub fn new(styles: Vec<Style>) -> Self {
        Self { styles }
    }
}

impl Default for StaticStyleCatalog {
    fn default() -> Self {
        Self::new(vec![Style::new("Basic", "basic")])
    }
}

#[async_trait]
impl StyleCatalog for StaticStyleCatalog {
    async fn fetch_styles(&mut self) -> Result<Vec<Style>> {
        Ok(self.styles.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_catalog_offers_basic() {
        let mut catalog = StaticStyleCatalog::default();
        assert_eq!(catalog.list_style_titles().await.unwrap(), vec!["Basic"]);
        assert_eq!(catalog.resolve_style("Basic").await.unwrap(), "basic");
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let mut catalog = StaticStyleCatalog::new(vec![
            Style::new("Anime", "ANIME"),
            Style::new("Detailed photo", "UHD"),
        ]);
        let first = catalog.resolve_style("Detailed photo").await.unwrap();
        let second = catalog.resolve_style("Detailed photo").await.unwrap();
        assert_eq!(first, "UHD");
        assert_eq!(first, second);
    }
}
