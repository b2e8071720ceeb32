//! Scan sessions
//!
//! One session brings one launcher's collection up to date:
//!
//! 1. discover candidates from the launcher's source
//! 2. drop sidecars, asset files and files outside the extension whitelist
//! 3. fold multi-disc sets (when enabled)
//! 4. reconcile against the stored collection
//! 5. enrich every new candidate into a ROM
//!
//! The session never touches the caller's collection. It returns a new one
//! in [`ScanOutcome`]; persisting it is the caller's decision.

use crate::LibraryError;
use crate::candidate::{retain_extensions, retain_roms};
use crate::enrich::{LauncherContext, ScrapeOrchestrator};
use crate::fs::FileSystem;
use crate::multidisc::group;
use crate::progress::{
    CancelHandle, ProgressController, ProgressReporter, ScanPhase, ScanState, TracingProgress,
};
use crate::reconcile::reconcile;
use crate::rom::{Collection, RomId};
use crate::scraper::{
    AssetFetcher, AssetScraper, MetadataScraper, ScrapeFailure, ScraperRegistry, SelectionPrompt,
};
use crate::source::{self, CandidateSource};
use romshelf_config::{LauncherConfig, ScanSettings, ScraperSettings};
use std::path::PathBuf;
use std::sync::Arc;

/// Collaborators a scan session talks to
#[derive(Clone)]
pub struct ScanServices {
    pub fs: Arc<dyn FileSystem>,
    pub metadata: Arc<dyn MetadataScraper>,
    pub assets: Arc<dyn AssetScraper>,
    pub fetcher: Arc<dyn AssetFetcher>,
    pub selector: Option<Arc<dyn SelectionPrompt>>,
    pub reporter: Arc<dyn ProgressReporter>,
}

impl ScanServices {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        metadata: Arc<dyn MetadataScraper>,
        assets: Arc<dyn AssetScraper>,
        fetcher: Arc<dyn AssetFetcher>,
    ) -> Self {
        Self {
            fs,
            metadata,
            assets,
            fetcher,
            selector: None,
            reporter: Arc::new(TracingProgress),
        }
    }

    /// Look up the scrapers named in `settings`
    pub fn from_registry(
        registry: &ScraperRegistry,
        settings: &ScraperSettings,
        fs: Arc<dyn FileSystem>,
        fetcher: Arc<dyn AssetFetcher>,
    ) -> Result<Self, LibraryError> {
        Ok(Self::new(
            fs,
            registry.metadata(&settings.metadata_scraper)?,
            registry.assets(&settings.asset_scraper)?,
            fetcher,
        ))
    }

    pub fn with_selector(mut self, selector: Arc<dyn SelectionPrompt>) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }
}

/// Counters and details of one scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanReport {
    /// Records dropped because their backing file or app vanished
    pub removed: usize,
    /// Candidates left after filtering and grouping
    pub checked: usize,
    /// ROMs created
    pub added: usize,
    pub dead_ids: Vec<RomId>,
    pub added_ids: Vec<RomId>,
    /// Candidates skipped because enrichment failed
    pub failures: Vec<ScrapeFailure>,
    pub started_with: usize,
    pub finished_with: usize,
}

impl ScanReport {
    /// The launcher had nothing before and still has nothing: the ROM path
    /// or source settings are probably wrong
    pub fn needs_attention(&self) -> bool {
        self.started_with == 0 && self.finished_with == 0
    }
}

/// Result of a scan that did not fail
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Updated collection to persist
    pub collection: Collection,
    pub report: ScanReport,
    /// `Completed` or `Cancelled`
    pub state: ScanState,
}

impl ScanOutcome {
    pub fn is_cancelled(&self) -> bool {
        self.state == ScanState::Cancelled
    }
}

/// One scan of one launcher
pub struct ScanSession {
    launcher: LauncherConfig,
    skip_on_failure: bool,
    source: Box<dyn CandidateSource>,
    fs: Arc<dyn FileSystem>,
    orchestrator: ScrapeOrchestrator,
    progress: ProgressController,
}

impl ScanSession {
    pub fn new(
        launcher: LauncherConfig,
        settings: ScraperSettings,
        scan: &ScanSettings,
        source: Box<dyn CandidateSource>,
        services: ScanServices,
    ) -> Result<Self, LibraryError> {
        let orchestrator = ScrapeOrchestrator::new(
            settings,
            LauncherContext::from_config(&launcher),
            services.metadata,
            services.assets,
            services.fetcher,
            services.fs.clone(),
            services.selector,
        )?;

        Ok(Self {
            launcher,
            skip_on_failure: scan.skip_on_failure,
            source,
            fs: services.fs,
            orchestrator,
            progress: ProgressController::new(services.reporter),
        })
    }

    /// Session reading from the source the launcher is configured with
    pub fn for_launcher(
        launcher: LauncherConfig,
        settings: ScraperSettings,
        scan: &ScanSettings,
        services: ScanServices,
    ) -> Result<Self, LibraryError> {
        let source = source::for_launcher(&launcher, services.fs.clone())?;
        Self::new(launcher, settings, scan, source, services)
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.progress.cancel_handle()
    }

    pub fn state(&self) -> ScanState {
        self.progress.state()
    }

    /// Scan the launcher against `existing`.
    ///
    /// Errors leave the session `Failed` and discard all work; `existing` is
    /// never modified either way. A session can run again once finished.
    pub async fn run(&self, existing: &Collection) -> Result<ScanOutcome, LibraryError> {
        self.progress.begin();
        tracing::info!(
            "Scanning launcher {} ({} source, {} ROMs)",
            self.launcher.id,
            self.source.kind().as_str(),
            existing.len()
        );

        match self.run_pipeline(existing).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::error!("Scan of launcher {} failed: {}", self.launcher.id, e);
                self.progress.finish(ScanState::Failed);
                Err(e)
            }
        }
    }

    async fn run_pipeline(&self, existing: &Collection) -> Result<ScanOutcome, LibraryError> {
        self.progress.start_phase(ScanPhase::Discovering, 0);
        let discovered = self.source.discover().await?;
        self.progress.end_phase();

        let discovered = retain_roms(
            discovered,
            self.launcher.asset_dirs.values().map(PathBuf::as_path),
        );
        let candidates = match self.launcher.source.extension_filter() {
            Some(extensions) => retain_extensions(discovered, &extensions),
            None => discovered,
        };

        self.progress.start_phase(ScanPhase::Grouping, candidates.len());
        let candidates = group(candidates, self.launcher.source.multidisc());
        self.progress.end_phase();

        self.progress.start_phase(ScanPhase::RemovingDead, existing.len());
        let reconciliation = reconcile(existing, &candidates, self.fs.as_ref())?;
        let mut working = existing.clone();
        for id in &reconciliation.dead_ids {
            working.remove(id);
        }
        self.progress.end_phase();

        let mut report = ScanReport {
            removed: reconciliation.dead_ids.len(),
            checked: candidates.len(),
            dead_ids: reconciliation.dead_ids.into_iter().collect(),
            started_with: existing.len(),
            ..ScanReport::default()
        };

        let new_candidates = reconciliation.new_candidates;
        self.progress.start_phase(ScanPhase::Scraping, new_candidates.len());

        let mut cancelled = false;
        for (index, candidate) in new_candidates.iter().enumerate() {
            if self.progress.is_cancelled() {
                tracing::info!(
                    "Scan of launcher {} cancelled after {} of {} new ROMs",
                    self.launcher.id,
                    index,
                    new_candidates.len()
                );
                cancelled = true;
                break;
            }

            self.progress.advance(index, &candidate.source_name());

            match self.orchestrator.enrich(candidate).await {
                Ok(rom) => {
                    report.added_ids.push(rom.id.clone());
                    if let Some(replaced) = working.insert(rom) {
                        tracing::warn!("New ROM replaced existing record {}", replaced.id);
                    }
                }
                Err(failure) if self.skip_on_failure => {
                    tracing::warn!("Skipping {}", failure);
                    report.failures.push(failure);
                }
                Err(failure) => {
                    self.progress.end_phase();
                    return Err(LibraryError::Scrape(failure));
                }
            }
        }
        self.progress.end_phase();

        report.added = report.added_ids.len();
        report.finished_with = working.len();

        let state = if cancelled {
            ScanState::Cancelled
        } else {
            ScanState::Completed
        };
        self.progress.finish(state);

        tracing::info!(
            "Scan of launcher {} finished: {} removed, {} checked, {} added, {} failed",
            self.launcher.id,
            report.removed,
            report.checked,
            report.added,
            report.failures.len()
        );

        Ok(ScanOutcome {
            collection: working,
            report,
            state,
        })
    }
}
