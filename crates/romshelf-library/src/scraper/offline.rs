//! Backends that work without network access

use super::{
    AssetScraper, ImageCandidate, MetadataScraper, ResolvedImage, ScraperError, SearchMatch,
};
use crate::metadata::MetadataFields;
use async_trait::async_trait;
use romshelf_config::AssetKind;

/// Metadata "scraper" that turns the cleaned file name into the title
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanTitleScraper;

#[async_trait]
impl MetadataScraper for CleanTitleScraper {
    fn id(&self) -> &str {
        "clean-title"
    }

    async fn search(&self, term: &str, platform: &str) -> Result<Vec<SearchMatch>, ScraperError> {
        Ok(vec![SearchMatch {
            id: term.to_string(),
            title: term.to_string(),
            platform: Some(platform.to_string()).filter(|p| !p.is_empty()),
        }])
    }

    async fn fetch_metadata(&self, selected: &SearchMatch) -> Result<MetadataFields, ScraperError> {
        Ok(MetadataFields {
            title: Some(selected.title.clone()),
            ..MetadataFields::default()
        })
    }
}

/// Asset scraper that provides nothing; local assets still apply
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAssetScraper;

#[async_trait]
impl AssetScraper for NullAssetScraper {
    fn id(&self) -> &str {
        "null"
    }

    fn supports(&self, _kind: AssetKind) -> bool {
        false
    }

    async fn search(
        &self,
        _term: &str,
        kind: AssetKind,
        _platform: &str,
    ) -> Result<Vec<ImageCandidate>, ScraperError> {
        Err(ScraperError::Unsupported(format!("null scraper has no {} assets", kind)))
    }

    async fn resolve_image_url(&self, image: &ImageCandidate) -> Result<ResolvedImage, ScraperError> {
        Err(ScraperError::Unsupported(format!("cannot resolve {}", image.id)))
    }
}
