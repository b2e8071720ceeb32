//! Turns a new candidate into a complete ROM record
//!
//! Metadata comes from the NFO sidecar and/or the metadata scraper, artwork
//! from the launcher's asset directories and/or the asset scraper, as the
//! session's [`ScraperSettings`] dictate.

use crate::LibraryError;
use crate::candidate::{Candidate, CandidateKind};
use crate::fs::FileSystem;
use crate::metadata::{MetadataFields, parse_nfo};
use crate::naming::{raw_name, sanitize_file_name, search_term};
use crate::rom::{ATTR_GAMESTREAM_APP_ID, ATTR_STEAM_APP_ID, Rom, RomFile, RomId};
use crate::scraper::{
    AssetFetcher, AssetScraper, FailureReason, ImageCandidate, MetadataScraper, ScrapeFailure,
    SearchMatch, SelectionPrompt, best_match,
};
use romshelf_config::{AssetKind, LauncherConfig, ScanPolicy, ScraperSettings, SelectionMode};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Launcher values the enrichment step depends on
#[derive(Debug, Clone, Default)]
pub struct LauncherContext {
    pub platform: String,
    /// Root remote ROMs get their synthetic paths under
    pub rom_path: PathBuf,
    pub asset_dirs: BTreeMap<AssetKind, PathBuf>,
}

impl LauncherContext {
    pub fn from_config(launcher: &LauncherConfig) -> Self {
        let asset_dirs = AssetKind::ALL
            .into_iter()
            .filter_map(|kind| launcher.asset_dir(kind).map(|dir| (kind, dir.to_path_buf())))
            .collect();

        Self {
            platform: launcher.platform.clone(),
            rom_path: launcher.rom_path.clone(),
            asset_dirs,
        }
    }

    pub fn asset_dir(&self, kind: AssetKind) -> Option<&Path> {
        self.asset_dirs.get(&kind).map(PathBuf::as_path)
    }
}

/// Name local assets, sidecars and synthetic ROM files are stored under
fn rom_stem(candidate: &Candidate) -> String {
    match &candidate.kind {
        CandidateKind::File { .. } => raw_name(candidate),
        CandidateKind::Steam { app_id, name } => {
            let stem = sanitize_file_name(name);
            if stem.is_empty() { app_id.to_string() } else { stem }
        }
        CandidateKind::GameStream { app_id, title } => {
            let stem = sanitize_file_name(title);
            if stem.is_empty() { sanitize_file_name(app_id) } else { stem }
        }
    }
}

/// `{path}.nfo` for set markers, `{path without extension}.nfo` otherwise
fn nfo_path(candidate: &Candidate) -> Option<PathBuf> {
    match &candidate.kind {
        CandidateKind::File { path, discs } if discs.is_empty() => Some(path.with_extension("nfo")),
        CandidateKind::File { path, .. } => {
            let mut nfo = OsString::from(path.as_os_str());
            nfo.push(".nfo");
            Some(PathBuf::from(nfo))
        }
        _ => None,
    }
}

/// Runs metadata and asset lookup for new candidates
pub struct ScrapeOrchestrator {
    settings: ScraperSettings,
    context: LauncherContext,
    metadata: Arc<dyn MetadataScraper>,
    assets: Arc<dyn AssetScraper>,
    fetcher: Arc<dyn AssetFetcher>,
    fs: Arc<dyn FileSystem>,
    selector: Option<Arc<dyn SelectionPrompt>>,
}

impl ScrapeOrchestrator {
    /// Manual selection modes need a `selector`
    pub fn new(
        settings: ScraperSettings,
        context: LauncherContext,
        metadata: Arc<dyn MetadataScraper>,
        assets: Arc<dyn AssetScraper>,
        fetcher: Arc<dyn AssetFetcher>,
        fs: Arc<dyn FileSystem>,
        selector: Option<Arc<dyn SelectionPrompt>>,
    ) -> Result<Self, LibraryError> {
        let manual = settings.game_selection == SelectionMode::Manual
            || settings.asset_selection == SelectionMode::Manual;
        if manual && selector.is_none() {
            return Err(LibraryError::Invariant(
                "manual selection requires a selection prompt".into(),
            ));
        }

        Ok(Self {
            settings,
            context,
            metadata,
            assets,
            fetcher,
            fs,
            selector,
        })
    }

    pub fn settings(&self) -> &ScraperSettings {
        &self.settings
    }

    /// Build the ROM record for one candidate
    pub async fn enrich(&self, candidate: &Candidate) -> Result<Rom, ScrapeFailure> {
        let name = candidate.source_name();
        let fail = |reason: FailureReason| ScrapeFailure {
            candidate: name.clone(),
            reason,
        };

        let term = search_term(candidate).ok_or_else(|| fail(FailureReason::MalformedCandidate))?;
        let stem = rom_stem(candidate);

        let fields = self.resolve_metadata(candidate, &term).await.map_err(&fail)?;
        let assets = self.resolve_assets(&term, &stem).await.map_err(&fail)?;

        let mut attributes = BTreeMap::new();
        let file = match &candidate.kind {
            CandidateKind::File { path, discs } => RomFile {
                path: path.clone(),
                discs: discs.clone(),
            },
            CandidateKind::Steam { app_id, .. } => {
                attributes.insert(ATTR_STEAM_APP_ID.to_string(), app_id.to_string());
                self.synthetic_file(&stem)
            }
            CandidateKind::GameStream { app_id, .. } => {
                attributes.insert(ATTR_GAMESTREAM_APP_ID.to_string(), app_id.clone());
                self.synthetic_file(&stem)
            }
        };

        let rom = Rom {
            id: RomId::for_backing(&candidate.backing_ref()),
            title: fields.title.clone().unwrap_or(term),
            metadata: fields.to_rom_metadata(),
            file,
            assets,
            extra: candidate.extra,
            attributes,
        };

        tracing::debug!("Enriched {} as '{}' ({})", name, rom.title, rom.id);
        Ok(rom)
    }

    fn synthetic_file(&self, stem: &str) -> RomFile {
        RomFile {
            path: self.context.rom_path.join(format!("{}.rom", stem)),
            discs: Vec::new(),
        }
    }

    async fn resolve_metadata(
        &self,
        candidate: &Candidate,
        term: &str,
    ) -> Result<MetadataFields, FailureReason> {
        let policy = self.settings.metadata_policy;
        let mut fields = MetadataFields::new();

        if policy.uses_local()
            && let Some(nfo) = nfo_path(candidate)
        {
            fields = self.read_nfo(&nfo);
        }

        if policy.uses_remote()
            && (!fields.is_complete() || self.settings.overwrite_existing)
            && let Some(scraped) = self.scrape_metadata(term).await?
        {
            let scraped = if policy == ScanPolicy::TitleOnly {
                MetadataFields {
                    title: scraped.title,
                    ..MetadataFields::default()
                }
            } else {
                scraped
            };

            if self.settings.overwrite_existing {
                fields.overlay(&scraped);
            } else {
                fields.merge(&scraped);
            }
        }

        Ok(fields)
    }

    fn read_nfo(&self, path: &Path) -> MetadataFields {
        if !self.fs.exists(path) {
            return MetadataFields::new();
        }

        match self.fs.read_to_string(path) {
            Ok(doc) => {
                tracing::debug!("Read sidecar {}", path.display());
                parse_nfo(&doc)
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable sidecar {}: {}", path.display(), e);
                MetadataFields::new()
            }
        }
    }

    /// `Ok(None)` when the user cancelled the selection
    async fn scrape_metadata(&self, term: &str) -> Result<Option<MetadataFields>, FailureReason> {
        let matches = self.metadata.search(term, &self.context.platform).await?;
        if matches.is_empty() {
            return Err(FailureReason::NoResults(format!("'{}'", term)));
        }

        let Some(index) = self.select_game(term, &matches) else {
            tracing::info!("Game selection for '{}' cancelled, keeping local data", term);
            return Ok(None);
        };
        let selected = matches.get(index).ok_or_else(|| {
            FailureReason::Parse(format!("selection {} out of {} matches", index, matches.len()))
        })?;

        Ok(Some(self.metadata.fetch_metadata(selected).await?))
    }

    fn select_game(&self, term: &str, matches: &[SearchMatch]) -> Option<usize> {
        match (self.settings.game_selection, &self.selector) {
            (SelectionMode::Manual, Some(selector)) => selector.select_game(term, matches),
            _ => best_match(term, matches),
        }
    }

    fn select_asset(&self, term: &str, kind: AssetKind, images: &[ImageCandidate]) -> Option<usize> {
        match (self.settings.asset_selection, &self.selector) {
            (SelectionMode::Manual, Some(selector)) => selector.select_asset(term, kind, images),
            _ => Some(0),
        }
    }

    async fn resolve_assets(
        &self,
        term: &str,
        stem: &str,
    ) -> Result<BTreeMap<AssetKind, PathBuf>, FailureReason> {
        let policy = self.settings.asset_policy;
        let mut assets = BTreeMap::new();

        for &kind in &self.settings.asset_kinds {
            let Some(dir) = self.context.asset_dir(kind) else {
                continue;
            };

            let local = if policy.uses_local() {
                self.find_local_asset(dir, stem, kind)
            } else {
                None
            };
            let scrape = policy.uses_remote()
                && self.assets.supports(kind)
                && (local.is_none() || self.settings.overwrite_existing);

            if let Some(path) = local {
                assets.insert(kind, path);
            }
            if scrape && let Some(path) = self.scrape_asset(term, kind, dir, stem).await? {
                assets.insert(kind, path);
            }
        }

        Ok(assets)
    }

    fn find_local_asset(&self, dir: &Path, stem: &str, kind: AssetKind) -> Option<PathBuf> {
        kind.extensions()
            .iter()
            .map(|ext| dir.join(format!("{}.{}", stem, ext)))
            .find(|path| self.fs.exists(path))
    }

    async fn scrape_asset(
        &self,
        term: &str,
        kind: AssetKind,
        dir: &Path,
        stem: &str,
    ) -> Result<Option<PathBuf>, FailureReason> {
        let images = self.assets.search(term, kind, &self.context.platform).await?;
        if images.is_empty() {
            return Err(FailureReason::NoResults(format!("{} of '{}'", kind, term)));
        }

        let Some(index) = self.select_asset(term, kind, &images) else {
            tracing::info!("{} selection for '{}' cancelled", kind, term);
            return Ok(None);
        };
        let image = images.get(index).ok_or_else(|| {
            FailureReason::Parse(format!("selection {} out of {} images", index, images.len()))
        })?;

        let resolved = self.assets.resolve_image_url(image).await?;
        let dest = dir.join(format!("{}.{}", stem, resolved.extension));
        self.fetcher
            .fetch(&resolved.url, &dest)
            .await
            .map_err(|e| FailureReason::Download(e.to_string()))?;

        tracing::debug!("Stored {} for '{}' at {}", kind, term, dest.display());
        Ok(Some(dest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::LocalFileSystem;
    use crate::scraper::{CleanTitleScraper, NullAssetScraper, ResolvedImage, ScraperError};
    use async_trait::async_trait;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FixedMetadata {
        matches: Vec<SearchMatch>,
        fields: MetadataFields,
    }

    #[async_trait]
    impl MetadataScraper for FixedMetadata {
        fn id(&self) -> &str {
            "fixed"
        }

        async fn search(&self, _term: &str, _platform: &str) -> Result<Vec<SearchMatch>, ScraperError> {
            Ok(self.matches.clone())
        }

        async fn fetch_metadata(&self, selected: &SearchMatch) -> Result<MetadataFields, ScraperError> {
            Ok(MetadataFields {
                title: Some(selected.title.clone()),
                ..self.fields.clone()
            })
        }
    }

    struct OneImage;

    #[async_trait]
    impl AssetScraper for OneImage {
        fn id(&self) -> &str {
            "one-image"
        }

        async fn search(
            &self,
            term: &str,
            kind: AssetKind,
            _platform: &str,
        ) -> Result<Vec<ImageCandidate>, ScraperError> {
            Ok(vec![ImageCandidate {
                id: format!("{}-{}", term, kind),
                name: term.to_string(),
                locator: format!("/img/{}/{}", kind, term),
            }])
        }

        async fn resolve_image_url(&self, image: &ImageCandidate) -> Result<ResolvedImage, ScraperError> {
            Ok(ResolvedImage {
                url: format!("https://images.test{}", image.locator),
                extension: "png".into(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingFetcher {
        fetched: Mutex<Vec<(String, PathBuf)>>,
    }

    #[async_trait]
    impl AssetFetcher for RecordingFetcher {
        async fn fetch(&self, url: &str, dest: &Path) -> Result<(), ScraperError> {
            self.fetched.lock().unwrap().push((url.to_string(), dest.to_path_buf()));
            Ok(())
        }
    }

    struct CancellingPrompt;

    impl SelectionPrompt for CancellingPrompt {
        fn select_game(&self, _term: &str, _matches: &[SearchMatch]) -> Option<usize> {
            None
        }

        fn select_asset(&self, _term: &str, _kind: AssetKind, _images: &[ImageCandidate]) -> Option<usize> {
            None
        }
    }

    fn matched(title: &str) -> SearchMatch {
        SearchMatch {
            id: title.to_lowercase(),
            title: title.to_string(),
            platform: None,
        }
    }

    fn full_fields() -> MetadataFields {
        MetadataFields {
            title: None,
            year: Some("1990".into()),
            genre: Some("Platform".into()),
            developer: Some("Nintendo".into()),
            players: Some("2".into()),
            content_rating: Some("E".into()),
            plot: Some("Save the princess".into()),
        }
    }

    fn orchestrator(
        settings: ScraperSettings,
        context: LauncherContext,
        metadata: Arc<dyn MetadataScraper>,
        assets: Arc<dyn AssetScraper>,
        fetcher: Arc<dyn AssetFetcher>,
    ) -> ScrapeOrchestrator {
        ScrapeOrchestrator::new(
            settings,
            context,
            metadata,
            assets,
            fetcher,
            Arc::new(LocalFileSystem::new()),
            None,
        )
        .unwrap()
    }

    fn offline(settings: ScraperSettings, context: LauncherContext) -> ScrapeOrchestrator {
        orchestrator(
            settings,
            context,
            Arc::new(CleanTitleScraper),
            Arc::new(NullAssetScraper),
            Arc::new(RecordingFetcher::default()),
        )
    }

    #[tokio::test]
    async fn test_nfo_sidecar_is_used_locally() {
        let dir = TempDir::new().unwrap();
        let rom = dir.path().join("Super Mario World (USA).sfc");
        fs::write(&rom, b"rom").unwrap();
        fs::write(
            dir.path().join("Super Mario World (USA).nfo"),
            "<game><title>Super Mario World</title><year>1990</year><nplayers>2</nplayers></game>",
        )
        .unwrap();

        let settings = ScraperSettings {
            metadata_policy: ScanPolicy::LocalOnly,
            ..ScraperSettings::default()
        };
        let rom = offline(settings, LauncherContext::default())
            .enrich(&Candidate::file(&rom))
            .await
            .unwrap();

        assert_eq!(rom.title, "Super Mario World");
        assert_eq!(rom.metadata.year, "1990");
        assert_eq!(rom.metadata.players, "2");
        assert_eq!(rom.metadata.genre, "");
        assert_eq!(rom.metadata.content_rating, "unknown");
    }

    #[tokio::test]
    async fn test_local_fields_win_over_scraped() {
        let dir = TempDir::new().unwrap();
        let rom = dir.path().join("mario.zip");
        fs::write(dir.path().join("mario.nfo"), "<title>Local Mario</title><year>1985</year>").unwrap();

        let metadata = Arc::new(FixedMetadata {
            matches: vec![matched("mario")],
            fields: full_fields(),
        });
        let rom = orchestrator(
            ScraperSettings::default(),
            LauncherContext::default(),
            metadata,
            Arc::new(NullAssetScraper),
            Arc::new(RecordingFetcher::default()),
        )
        .enrich(&Candidate::file(&rom))
        .await
        .unwrap();

        assert_eq!(rom.title, "Local Mario");
        assert_eq!(rom.metadata.year, "1985");
        assert_eq!(rom.metadata.developer, "Nintendo");
    }

    #[tokio::test]
    async fn test_title_only_keeps_only_the_title() {
        let metadata = Arc::new(FixedMetadata {
            matches: vec![matched("Sonic 2"), matched("Sonic The Hedgehog")],
            fields: full_fields(),
        });
        let settings = ScraperSettings {
            metadata_policy: ScanPolicy::TitleOnly,
            ..ScraperSettings::default()
        };
        let rom = orchestrator(
            settings,
            LauncherContext::default(),
            metadata,
            Arc::new(NullAssetScraper),
            Arc::new(RecordingFetcher::default()),
        )
        .enrich(&Candidate::file("/roms/Sonic The Hedgehog (W).md"))
        .await
        .unwrap();

        assert_eq!(rom.title, "Sonic The Hedgehog");
        assert_eq!(rom.metadata, crate::rom::RomMetadata::default());
    }

    #[tokio::test]
    async fn test_zero_results_is_failure() {
        let metadata = Arc::new(FixedMetadata {
            matches: Vec::new(),
            fields: MetadataFields::new(),
        });
        let failure = orchestrator(
            ScraperSettings::default(),
            LauncherContext::default(),
            metadata,
            Arc::new(NullAssetScraper),
            Arc::new(RecordingFetcher::default()),
        )
        .enrich(&Candidate::file("/roms/obscure.zip"))
        .await
        .unwrap_err();

        assert_eq!(failure.candidate, "obscure.zip");
        assert_eq!(failure.reason.code(), "no-results");
    }

    #[tokio::test]
    async fn test_malformed_candidate() {
        let failure = offline(ScraperSettings::default(), LauncherContext::default())
            .enrich(&Candidate::file("/roms/(USA) [!].zip"))
            .await
            .unwrap_err();
        assert_eq!(failure.reason, FailureReason::MalformedCandidate);
    }

    #[tokio::test]
    async fn test_steam_candidate_gets_synthetic_path() {
        let context = LauncherContext {
            rom_path: PathBuf::from("/roms/steam"),
            ..LauncherContext::default()
        };
        let rom = offline(ScraperSettings::default(), context)
            .enrich(&Candidate::steam(220, "Half-Life 2: Episode One"))
            .await
            .unwrap();

        assert_eq!(rom.file.path, PathBuf::from("/roms/steam/Half-Life 2 Episode One.rom"));
        assert_eq!(rom.attributes.get(ATTR_STEAM_APP_ID).map(String::as_str), Some("220"));
        assert_eq!(rom.backing_ref().unwrap(), crate::rom::BackingRef::SteamApp(220));
    }

    #[tokio::test]
    async fn test_local_asset_found_and_remote_skipped() {
        let dir = TempDir::new().unwrap();
        let snaps = dir.path().join("snaps");
        fs::create_dir_all(&snaps).unwrap();
        fs::write(snaps.join("mario.jpg"), b"jpg").unwrap();

        let context = LauncherContext {
            asset_dirs: BTreeMap::from([
                (AssetKind::Snap, snaps.clone()),
                (AssetKind::Title, dir.path().join("titles")),
            ]),
            ..LauncherContext::default()
        };
        let settings = ScraperSettings {
            asset_kinds: [AssetKind::Snap, AssetKind::Title].into_iter().collect(),
            ..ScraperSettings::default()
        };
        let fetcher = Arc::new(RecordingFetcher::default());
        let rom = orchestrator(
            settings,
            context,
            Arc::new(CleanTitleScraper),
            Arc::new(OneImage),
            fetcher.clone(),
        )
        .enrich(&Candidate::file("/roms/mario.zip"))
        .await
        .unwrap();

        assert_eq!(rom.assets.get(&AssetKind::Snap), Some(&snaps.join("mario.jpg")));
        assert_eq!(
            rom.assets.get(&AssetKind::Title),
            Some(&dir.path().join("titles").join("mario.png"))
        );

        let fetched = fetcher.fetched.lock().unwrap();
        assert_eq!(fetched.len(), 1);
        assert_eq!(fetched[0].0, "https://images.test/img/title/mario");
    }

    #[tokio::test]
    async fn test_cancelled_manual_selection_keeps_defaults() {
        let metadata = Arc::new(FixedMetadata {
            matches: vec![matched("Zelda")],
            fields: full_fields(),
        });
        let settings = ScraperSettings {
            game_selection: SelectionMode::Manual,
            ..ScraperSettings::default()
        };
        let orchestrator = ScrapeOrchestrator::new(
            settings,
            LauncherContext::default(),
            metadata,
            Arc::new(NullAssetScraper),
            Arc::new(RecordingFetcher::default()),
            Arc::new(LocalFileSystem::new()),
            Some(Arc::new(CancellingPrompt)),
        )
        .unwrap();

        let rom = orchestrator
            .enrich(&Candidate::file("/roms/Zelda (Europe).zip"))
            .await
            .unwrap();
        assert_eq!(rom.title, "Zelda");
        assert_eq!(rom.metadata.developer, "");
    }

    #[test]
    fn test_manual_selection_requires_prompt() {
        let settings = ScraperSettings {
            asset_selection: SelectionMode::Manual,
            ..ScraperSettings::default()
        };
        let result = ScrapeOrchestrator::new(
            settings,
            LauncherContext::default(),
            Arc::new(CleanTitleScraper),
            Arc::new(NullAssetScraper),
            Arc::new(RecordingFetcher::default()),
            Arc::new(LocalFileSystem::new()),
            None,
        );
        assert!(matches!(result, Err(LibraryError::Invariant(_))));
    }

    #[test]
    fn test_context_from_config() {
        let launcher = LauncherConfig::folder("snes", "/roms/snes")
            .with_asset_dir(AssetKind::BoxFront, "/media/snes/boxes");
        let context = LauncherContext::from_config(&launcher);
        assert_eq!(context.asset_dir(AssetKind::BoxFront), Some(Path::new("/media/snes/boxes")));
        assert_eq!(context.asset_dir(AssetKind::Snap), None);
    }

    #[test]
    fn test_nfo_path_for_sets() {
        let mut set = Candidate::file("/roms/psx/Dr. Mario (USA)");
        if let CandidateKind::File { discs, .. } = &mut set.kind {
            discs.push("Dr. Mario (USA) (Disc 1).cue".into());
        }
        assert_eq!(nfo_path(&set), Some(PathBuf::from("/roms/psx/Dr. Mario (USA).nfo")));
        assert_eq!(
            nfo_path(&Candidate::file("/roms/a.zip")),
            Some(PathBuf::from("/roms/a.nfo"))
        );
        assert_eq!(nfo_path(&Candidate::steam(1, "x")), None);
    }
}
