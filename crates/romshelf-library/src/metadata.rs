//! Game metadata gathered from sidecars and scrapers

use crate::rom::{RomMetadata, UNKNOWN_RATING};
use crate::xml::extract_tag;
use serde::{Deserialize, Serialize};

/// Metadata fields as reported by one source; `None` means "not provided"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFields {
    pub title: Option<String>,
    pub year: Option<String>,
    pub genre: Option<String>,
    pub developer: Option<String>,
    pub players: Option<String>,
    pub content_rating: Option<String>,
    pub plot: Option<String>,
}

impl MetadataFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if nothing was provided
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check if every field was provided
    pub fn is_complete(&self) -> bool {
        self.title.is_some()
            && self.year.is_some()
            && self.genre.is_some()
            && self.developer.is_some()
            && self.players.is_some()
            && self.content_rating.is_some()
            && self.plot.is_some()
    }

    /// Merge with another source (fields already present take precedence)
    pub fn merge(&mut self, other: &MetadataFields) {
        fill(&mut self.title, &other.title);
        fill(&mut self.year, &other.year);
        fill(&mut self.genre, &other.genre);
        fill(&mut self.developer, &other.developer);
        fill(&mut self.players, &other.players);
        fill(&mut self.content_rating, &other.content_rating);
        fill(&mut self.plot, &other.plot);
    }

    /// Overlay another source (its provided fields replace ours)
    pub fn overlay(&mut self, other: &MetadataFields) {
        replace(&mut self.title, &other.title);
        replace(&mut self.year, &other.year);
        replace(&mut self.genre, &other.genre);
        replace(&mut self.developer, &other.developer);
        replace(&mut self.players, &other.players);
        replace(&mut self.content_rating, &other.content_rating);
        replace(&mut self.plot, &other.plot);
    }

    /// Resolve into ROM metadata, defaulting whatever is still missing
    pub fn to_rom_metadata(&self) -> RomMetadata {
        RomMetadata {
            year: self.year.clone().unwrap_or_default(),
            genre: self.genre.clone().unwrap_or_default(),
            developer: self.developer.clone().unwrap_or_default(),
            players: self.players.clone().unwrap_or_default(),
            content_rating: self
                .content_rating
                .clone()
                .unwrap_or_else(|| UNKNOWN_RATING.to_string()),
            plot: self.plot.clone().unwrap_or_default(),
        }
    }
}

fn fill(target: &mut Option<String>, source: &Option<String>) {
    if target.is_none() {
        target.clone_from(source);
    }
}

fn replace(target: &mut Option<String>, source: &Option<String>) {
    if source.is_some() {
        target.clone_from(source);
    }
}

/// Parse an NFO sidecar (`<game><title>…</title>…</game>`)
pub fn parse_nfo(doc: &str) -> MetadataFields {
    MetadataFields {
        title: extract_tag(doc, "title"),
        year: extract_tag(doc, "year"),
        genre: extract_tag(doc, "genre"),
        developer: extract_tag(doc, "developer"),
        players: extract_tag(doc, "nplayers"),
        content_rating: extract_tag(doc, "esrb"),
        plot: extract_tag(doc, "plot"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_merge() {
        let mut meta1 = MetadataFields::new();
        meta1.title = Some("Game 1".to_string());

        let mut meta2 = MetadataFields::new();
        meta2.title = Some("Game 2".to_string());
        meta2.developer = Some("Dev".to_string());

        meta1.merge(&meta2);

        assert_eq!(meta1.title, Some("Game 1".to_string())); // Original kept
        assert_eq!(meta1.developer, Some("Dev".to_string())); // Merged
    }

    #[test]
    fn test_metadata_overlay() {
        let mut meta1 = MetadataFields::new();
        meta1.title = Some("Local".to_string());
        meta1.genre = Some("Platform".to_string());

        let mut meta2 = MetadataFields::new();
        meta2.title = Some("Scraped".to_string());

        meta1.overlay(&meta2);

        assert_eq!(meta1.title, Some("Scraped".to_string()));
        assert_eq!(meta1.genre, Some("Platform".to_string()));
    }

    #[test]
    fn test_parse_nfo() {
        let nfo = r#"
<?xml version="1.0" encoding="utf-8" standalone="yes"?>
<game>
    <title>Super Mario World</title>
    <year>1990</year>
    <genre>Platform</genre>
    <developer>Nintendo</developer>
    <nplayers>2</nplayers>
    <esrb>E - Everyone</esrb>
    <plot>Mario &amp; Luigi
explore Dinosaur Land.</plot>
</game>
"#;

        let fields = parse_nfo(nfo);
        assert!(fields.is_complete());
        assert_eq!(fields.title.as_deref(), Some("Super Mario World"));
        assert_eq!(fields.players.as_deref(), Some("2"));
        assert_eq!(
            fields.plot.as_deref(),
            Some("Mario & Luigi\nexplore Dinosaur Land.")
        );
    }

    #[test]
    fn test_partial_nfo_defaults() {
        let fields = parse_nfo("<game><title>Only Title</title></game>");
        assert!(!fields.is_complete());
        assert!(!fields.is_empty());

        let metadata = fields.to_rom_metadata();
        assert_eq!(metadata.content_rating, UNKNOWN_RATING);
        assert_eq!(metadata.year, "");
    }
}
