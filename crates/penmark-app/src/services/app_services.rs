// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — opens the stores under the data directory and
// exposes the registry and export operations the CLI commands call.
//
// Layout of the data directory:
//   config.json     persisted AppConfig
//   profiles.db     handwriting_fonts table
//   journal.db      registry operation journal
//   blobs/<bucket>/ sample images

use std::path::{Path, PathBuf};

use penmark_core::AppConfig;
use penmark_core::error::{PenmarkError, Result};
use penmark_core::transform::{TextTransform, TransformMode};
use penmark_core::types::{HandwritingProfile, OwnerId, ProfileId, StyleCategory, image_content_type};
use penmark_document::{PageGeometry, PdfWriter, build_simple_document, build_solution_document};
use penmark_document::export::SOLUTION_TITLE;
use penmark_profiles::{ProfileRegistry, RegistryConfig};
use penmark_store::{FsBlobStore, JournalEntry, OperationJournal, SqliteRecordStore};
use tracing::{info, warn};

use super::data_dir;
use super::transform::LocalTransform;

const CONFIG_FILE: &str = "config.json";
const PROFILES_DB: &str = "profiles.db";
const JOURNAL_DB: &str = "journal.db";
const BLOBS_DIR: &str = "blobs";

/// Title for text exports when none is given.
const DEFAULT_TEXT_TITLE: &str = "Handwritten Document";

pub type Registry = ProfileRegistry<FsBlobStore, SqliteRecordStore>;

/// Everything a CLI command needs, opened once per invocation.
pub struct AppServices {
    data_dir: PathBuf,
    config: AppConfig,
    registry: Registry,
    transform: Box<dyn TextTransform>,
}

impl AppServices {
    /// Open (or create) all stores under `dir`.
    pub fn init(dir: &Path) -> Result<Self> {
        info!(path = %dir.display(), "initialising app services");

        let config = load_config(dir).unwrap_or_default();

        let blob_root = data_dir::data_subdir(dir, BLOBS_DIR)?;
        let mut blobs = FsBlobStore::open(&blob_root, &config.storage_bucket)?;
        if let Some(ref base) = config.public_base_url {
            blobs = blobs.with_public_base_url(base.clone());
        }
        let records = SqliteRecordStore::open(dir.join(PROFILES_DB))?;
        let journal = OperationJournal::open(dir.join(JOURNAL_DB))?;

        let registry = ProfileRegistry::new(blobs, records, RegistryConfig::from_app_config(&config))
            .with_journal(journal);

        info!("app services initialised");
        Ok(Self {
            data_dir: dir.to_path_buf(),
            config,
            registry,
            transform: Box::new(LocalTransform),
        })
    }

    /// Swap the text transform service.
    pub fn with_transform(mut self, transform: impl TextTransform + 'static) -> Self {
        self.transform = Box::new(transform);
        self
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    /// Write the active configuration to `config.json`.
    pub fn save_config(&self) -> Result<PathBuf> {
        persist_config(&self.data_dir, &self.config)?;
        Ok(self.config_path())
    }

    // -- Profiles -------------------------------------------------------------

    pub fn list_profiles(&self, owner: &OwnerId) -> Result<Vec<HandwritingProfile>> {
        self.registry.list_profiles(owner)
    }

    /// Upload a sample image read from disk. The content type comes from the
    /// file extension unless given explicitly.
    pub fn upload_profile_file(
        &self,
        owner: &OwnerId,
        name: &str,
        style: StyleCategory,
        image_path: &Path,
        content_type: Option<&str>,
    ) -> Result<HandwritingProfile> {
        let content_type = match content_type {
            Some(ct) => ct.to_string(),
            None => content_type_for_path(image_path)?.to_string(),
        };
        let bytes = std::fs::read(image_path)?;
        self.registry
            .upload_profile(owner, name, style, &bytes, &content_type)
    }

    pub fn activate(&self, owner: &OwnerId, profile_id: &ProfileId) -> Result<()> {
        self.registry.activate(owner, profile_id)
    }

    pub fn delete_profile(&self, owner: &OwnerId, profile_id: &ProfileId) -> Result<()> {
        self.registry.delete_profile(owner, profile_id)
    }

    /// Most recent journal entries, newest first.
    pub fn recent_journal(&self, limit: u32) -> Result<Vec<JournalEntry>> {
        match self.registry.journal() {
            Some(journal) => journal.recent_entries(limit),
            None => Ok(Vec::new()),
        }
    }

    // -- Export ---------------------------------------------------------------

    pub fn geometry(&self) -> Result<PageGeometry> {
        PageGeometry::from_config(&self.config)
    }

    /// Convert `text` and export it as a PDF at `out`. Returns the page count.
    pub fn export_text(&self, text: &str, title: Option<&str>, out: &Path) -> Result<usize> {
        let body = self.transform.transform(text, TransformMode::Handwriting)?;
        let geometry = self.geometry()?;
        let plan = build_simple_document(title, &body, &geometry);

        PdfWriter::new(geometry)
            .with_title(title.unwrap_or(DEFAULT_TEXT_TITLE))
            .write_to_file(&plan, out)?;
        Ok(plan.page_count())
    }

    /// Solve `problem` and export the problem and solution as a PDF at `out`.
    /// Returns the page count.
    pub fn export_solution(&self, problem: &str, out: &Path) -> Result<usize> {
        let solution = self.transform.transform(problem, TransformMode::Solve)?;
        let geometry = self.geometry()?;
        let plan = build_solution_document(problem, &solution, &geometry);

        PdfWriter::new(geometry)
            .with_title(SOLUTION_TITLE)
            .write_to_file(&plan, out)?;
        Ok(plan.page_count())
    }
}

/// Image content type for a file, judged by its extension.
pub fn content_type_for_path(path: &Path) -> Result<&'static str> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(image_content_type)
        .ok_or_else(|| {
            PenmarkError::Validation(format!(
                "cannot tell the image type of {}; pass --content-type",
                path.display()
            ))
        })
}

fn load_config(data_dir: &Path) -> Option<AppConfig> {
    let path = data_dir.join(CONFIG_FILE);
    let data = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&data) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(error = %e, path = %path.display(), "ignoring unreadable config");
            None
        }
    }
}

fn persist_config(data_dir: &Path, config: &AppConfig) -> Result<()> {
    let path = data_dir.join(CONFIG_FILE);
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}
