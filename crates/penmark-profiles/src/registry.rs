// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Profile registry — upload, list, activate, and delete handwriting profiles.
//
// Every operation takes the owner explicitly. Remote calls happen in a fixed
// order (blob before record on upload, deactivate-all before activate, blob
// delete before record delete) and are never rolled back; an operation that
// stops half way reports `PartialFailure` naming what did complete.
//
// Concurrent `activate` calls for one owner are not serialised here. The last
// writer wins and the race is not detected.

use chrono::Utc;
use penmark_core::config::{AppConfig, BlobNaming, DEFAULT_BUCKET, DEFAULT_MAX_SAMPLE_BYTES};
use penmark_core::error::{Operation, PartialFailure, PenmarkError, Result, Step};
use penmark_core::types::{HandwritingProfile, OwnerId, ProfileId, StyleCategory};
use penmark_store::blob::BlobStore;
use penmark_store::journal::OperationJournal;
use penmark_store::record::{
    NewProfileRow, OrderBy, PROFILE_TABLE, ProfileRow, RecordStore, RowFilter, RowPatch,
};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::storage_path::{sample_object_path, storage_path_from_ref};

/// Registry settings.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Blob bucket holding samples; also the marker segment in references.
    pub bucket: String,
    /// Largest accepted sample image, in bytes.
    pub max_sample_bytes: usize,
    pub naming: BlobNaming,
}

impl RegistryConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            bucket: config.storage_bucket.clone(),
            max_sample_bytes: config.max_sample_bytes,
            naming: config.blob_naming,
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            bucket: DEFAULT_BUCKET.to_string(),
            max_sample_bytes: DEFAULT_MAX_SAMPLE_BYTES,
            naming: BlobNaming::Timestamp,
        }
    }
}

/// Per-owner collection of handwriting profiles over a blob store and a
/// record store.
pub struct ProfileRegistry<B: BlobStore, R: RecordStore> {
    blobs: B,
    records: R,
    config: RegistryConfig,
    journal: Option<OperationJournal>,
}

impl<B: BlobStore, R: RecordStore> ProfileRegistry<B, R> {
    pub fn new(blobs: B, records: R, config: RegistryConfig) -> Self {
        Self {
            blobs,
            records,
            config,
            journal: None,
        }
    }

    /// Record every operation outcome in `journal`.
    pub fn with_journal(mut self, journal: OperationJournal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    pub fn records(&self) -> &R {
        &self.records
    }

    pub fn journal(&self) -> Option<&OperationJournal> {
        self.journal.as_ref()
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    // -- Queries --------------------------------------------------------------

    /// All of `owner`'s profiles, newest first.
    #[instrument(skip(self), fields(owner = %owner))]
    pub fn list_profiles(&self, owner: &OwnerId) -> Result<Vec<HandwritingProfile>> {
        let rows = self
            .records
            .query(PROFILE_TABLE, &RowFilter::owner(owner), OrderBy::NewestFirst)?;
        rows.into_iter().map(ProfileRow::into_profile).collect()
    }

    /// The owner's active profile, if any.
    pub fn active_profile(&self, owner: &OwnerId) -> Result<Option<HandwritingProfile>> {
        Ok(self
            .list_profiles(owner)?
            .into_iter()
            .find(|profile| profile.is_active))
    }

    /// A single profile, if `owner` has one with this id.
    pub fn find_profile(
        &self,
        owner: &OwnerId,
        profile_id: &ProfileId,
    ) -> Result<Option<HandwritingProfile>> {
        self.find_row(owner, profile_id)?
            .map(ProfileRow::into_profile)
            .transpose()
    }

    fn find_row(&self, owner: &OwnerId, profile_id: &ProfileId) -> Result<Option<ProfileRow>> {
        let filter = RowFilter::owner(owner).with_id(profile_id);
        let mut rows = self
            .records
            .query(PROFILE_TABLE, &filter, OrderBy::NewestFirst)?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    fn require_row(&self, owner: &OwnerId, profile_id: &ProfileId) -> Result<ProfileRow> {
        self.find_row(owner, profile_id)?.ok_or_else(|| {
            PenmarkError::NotFound(format!("profile {profile_id} for owner {owner}"))
        })
    }

    // -- Upload ---------------------------------------------------------------

    /// Store a sample image and register a new, inactive profile for it.
    ///
    /// Input is validated before any store is contacted. A failed blob write
    /// leaves nothing behind. A failed record insert leaves the blob in place
    /// and reports it as orphaned.
    #[instrument(skip(self, image_bytes), fields(owner = %owner, bytes_len = image_bytes.len()))]
    pub fn upload_profile(
        &self,
        owner: &OwnerId,
        name: &str,
        style: StyleCategory,
        image_bytes: &[u8],
        content_type: &str,
    ) -> Result<HandwritingProfile> {
        let name = self.validate_upload(owner, name, image_bytes, content_type)?;

        let path = sample_object_path(owner, &self.blob_token(), content_type);
        let public_ref = match self.blobs.put(&path, image_bytes, content_type) {
            Ok(url) => url,
            Err(e) => {
                error!(error = %e, %path, "sample upload failed");
                self.record_journal("upload", owner, &path, false, Some(&e.to_string()));
                return Err(e);
            }
        };
        debug!(%path, %public_ref, "sample stored");

        let row = NewProfileRow {
            user_id: owner.0.clone(),
            name: name.to_string(),
            sample_image_url: public_ref.clone(),
            font_style: style.as_str().to_string(),
            is_active: false,
        };
        let id = match self.records.insert(PROFILE_TABLE, &row) {
            Ok(id) => ProfileId(id),
            Err(e) => {
                let report = PartialFailure::new(Operation::Upload, Step::RecordInsert, e.to_string())
                    .completed(Step::BlobWrite)
                    .orphaned_blob(path.clone());
                error!(%report, "profile record insert failed after sample upload");
                self.record_journal("upload", owner, &path, false, Some(&report.to_string()));
                return Err(report.into());
            }
        };

        info!(profile_id = %id, "profile uploaded");
        self.record_journal("upload", owner, id.as_str(), true, Some(&path));

        // The store owns created_at; read it back rather than guessing.
        match self.find_profile(owner, &id) {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) | Err(_) => {
                warn!(profile_id = %id, "could not read back new profile");
                Ok(HandwritingProfile {
                    id,
                    owner_id: owner.clone(),
                    name: row.name,
                    style_category: style,
                    sample_image_ref: public_ref,
                    is_active: false,
                    created_at: Utc::now(),
                })
            }
        }
    }

    /// Check upload input. Returns the trimmed name.
    fn validate_upload<'a>(
        &self,
        owner: &OwnerId,
        name: &'a str,
        image_bytes: &[u8],
        content_type: &str,
    ) -> Result<&'a str> {
        if owner.0.is_empty() || owner.0.contains('/') {
            return Err(PenmarkError::Validation(format!("invalid owner id '{owner}'")));
        }
        // The owner segment must not read as the bucket marker.
        if owner.0 == self.config.bucket {
            return Err(PenmarkError::Validation(format!(
                "owner id '{owner}' collides with the storage bucket name"
            )));
        }
        let name = name.trim();
        if name.is_empty() {
            return Err(PenmarkError::Validation("profile name must not be empty".into()));
        }
        if !content_type.trim().to_ascii_lowercase().starts_with("image/") {
            return Err(PenmarkError::Validation(format!(
                "sample must be an image, got '{content_type}'"
            )));
        }
        if image_bytes.is_empty() {
            return Err(PenmarkError::Validation("sample image is empty".into()));
        }
        if image_bytes.len() > self.config.max_sample_bytes {
            return Err(PenmarkError::Validation(format!(
                "sample image is {} bytes; the limit is {} bytes",
                image_bytes.len(),
                self.config.max_sample_bytes
            )));
        }
        Ok(name)
    }

    fn blob_token(&self) -> String {
        match self.config.naming {
            BlobNaming::Timestamp => Utc::now().timestamp_millis().to_string(),
            BlobNaming::Random => Uuid::new_v4().simple().to_string(),
        }
    }

    // -- Activation -----------------------------------------------------------

    /// Make `profile_id` the owner's only active profile.
    ///
    /// Deactivates every profile of the owner first, then activates the
    /// target. If the second step fails the owner is left with no active
    /// profile, which is a valid state; the failure is reported for retry.
    #[instrument(skip(self), fields(owner = %owner, profile_id = %profile_id))]
    pub fn activate(&self, owner: &OwnerId, profile_id: &ProfileId) -> Result<()> {
        self.require_row(owner, profile_id)?;

        if let Err(e) = self.records.update(
            PROFILE_TABLE,
            &RowFilter::owner(owner),
            &RowPatch::active(false),
        ) {
            error!(error = %e, "deactivation failed");
            self.record_journal("activate", owner, profile_id.as_str(), false, Some(&e.to_string()));
            return Err(e);
        }

        let target = RowFilter::owner(owner).with_id(profile_id);
        let outcome = match self.records.update(PROFILE_TABLE, &target, &RowPatch::active(true)) {
            Ok(0) => Err("profile no longer exists".to_string()),
            Ok(_) => Ok(()),
            Err(e) => Err(e.to_string()),
        };

        match outcome {
            Ok(()) => {
                info!("profile activated");
                self.record_journal("activate", owner, profile_id.as_str(), true, None);
                Ok(())
            }
            Err(cause) => {
                let report = PartialFailure::new(Operation::Activate, Step::ActivateTarget, cause)
                    .completed(Step::DeactivateAll);
                warn!(%report, "owner left with no active profile");
                self.record_journal("activate", owner, profile_id.as_str(), false, Some(&report.to_string()));
                Err(report.into())
            }
        }
    }

    // -- Deletion -------------------------------------------------------------

    /// Remove a profile's sample image and its record.
    ///
    /// The record removal is attempted even when the blob removal fails, so
    /// the profile disappears from listings; the leftover blob is reported.
    #[instrument(skip(self), fields(owner = %owner, profile_id = %profile_id))]
    pub fn delete_profile(&self, owner: &OwnerId, profile_id: &ProfileId) -> Result<()> {
        let row = self.require_row(owner, profile_id)?;

        let blob_path = storage_path_from_ref(&row.sample_image_url, &self.config.bucket)
            .and_then(|path| owned_object_path(owner, path));
        let blob_outcome = match blob_path {
            Ok(ref path) => self.blobs.delete(path).map_err(|e| e.to_string()),
            Err(ref e) => Err(e.to_string()),
        };

        let filter = RowFilter::owner(owner).with_id(profile_id);
        let record_outcome = match self.records.delete(PROFILE_TABLE, &filter) {
            // Already gone counts as deleted.
            Ok(_) => Ok(()),
            Err(e) => Err(e.to_string()),
        };

        let result = match (blob_outcome, record_outcome) {
            (Ok(()), Ok(())) => Ok(()),
            (Ok(()), Err(cause)) => Err(PartialFailure::new(
                Operation::Delete,
                Step::RecordDelete,
                cause,
            )
            .completed(Step::BlobDelete)
            .into()),
            (Err(cause), Ok(())) => {
                let mut report = PartialFailure::new(Operation::Delete, Step::BlobDelete, cause)
                    .completed(Step::RecordDelete);
                if let Ok(path) = blob_path {
                    report = report.orphaned_blob(path);
                }
                Err(report.into())
            }
            // A reference that cannot be resolved will not fix itself on retry.
            (Err(blob_cause), Err(record_cause)) if blob_path.is_err() => {
                Err(PenmarkError::InvalidReference(format!(
                    "{blob_cause}; record delete also failed: {record_cause}"
                )))
            }
            (Err(blob_cause), Err(record_cause)) => Err(PenmarkError::Store(format!(
                "record delete failed: {record_cause}; blob delete failed: {blob_cause}"
            ))),
        };

        match result {
            Ok(()) => {
                info!("profile deleted");
                self.record_journal("delete", owner, profile_id.as_str(), true, None);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "profile delete incomplete");
                self.record_journal("delete", owner, profile_id.as_str(), false, Some(&e.to_string()));
                Err(e)
            }
        }
    }

    // -- Journal --------------------------------------------------------------

    fn record_journal(&self, action: &str, owner: &OwnerId, subject: &str, success: bool, details: Option<&str>) {
        let Some(ref journal) = self.journal else {
            return;
        };
        if let Err(e) = journal.record(action, owner.as_str(), subject, success, details) {
            error!(error = %e, "failed to record journal entry");
        }
    }
}

/// Keep only object paths inside the owner's own directory.
fn owned_object_path(owner: &OwnerId, path: String) -> Result<String> {
    let prefix = format!("{owner}/");
    if path.len() > prefix.len() && path.starts_with(&prefix) {
        Ok(path)
    } else {
        Err(PenmarkError::InvalidReference(format!(
            "object path '{path}' is outside the storage area of owner {owner}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::collections::BTreeMap;

    use chrono::Utc;

    use super::*;

    // -- Test doubles ---------------------------------------------------------

    /// In-memory blob store that records calls and fails on demand.
    #[derive(Default)]
    struct FakeBlobs {
        objects: RefCell<BTreeMap<String, Vec<u8>>>,
        calls: RefCell<Vec<String>>,
        fail_put: Cell<bool>,
        fail_delete: Cell<bool>,
    }

    impl BlobStore for FakeBlobs {
        fn put(&self, path: &str, bytes: &[u8], _content_type: &str) -> Result<String> {
            self.calls.borrow_mut().push(format!("put {path}"));
            if self.fail_put.get() {
                return Err(PenmarkError::Store("bucket unavailable".into()));
            }
            let mut objects = self.objects.borrow_mut();
            if objects.contains_key(path) {
                return Err(PenmarkError::Store(format!("object already exists: {path}")));
            }
            objects.insert(path.to_string(), bytes.to_vec());
            Ok(self.public_url(path))
        }

        fn delete(&self, path: &str) -> Result<()> {
            self.calls.borrow_mut().push(format!("delete {path}"));
            if self.fail_delete.get() {
                return Err(PenmarkError::Store("permission denied".into()));
            }
            self.objects.borrow_mut().remove(path);
            Ok(())
        }

        fn public_url(&self, path: &str) -> String {
            format!("https://cdn.test/storage/v1/object/public/handwriting-samples/{path}")
        }
    }

    /// In-memory record store that records calls and fails on demand.
    #[derive(Default)]
    struct FakeRecords {
        rows: RefCell<Vec<ProfileRow>>,
        calls: RefCell<Vec<&'static str>>,
        next_id: Cell<u32>,
        fail_insert: Cell<bool>,
        fail_delete: Cell<bool>,
        /// Fail the update whose 0-based index (counted from now) matches.
        fail_update_at: Cell<Option<usize>>,
        updates_seen: Cell<usize>,
    }

    impl FakeRecords {
        fn matches(filter: &RowFilter, row: &ProfileRow) -> bool {
            filter.id.as_ref().is_none_or(|id| *id == row.id)
                && filter.user_id.as_ref().is_none_or(|u| *u == row.user_id)
        }

        fn fail_next_update(&self, offset: usize) {
            self.fail_update_at.set(Some(self.updates_seen.get() + offset));
        }

        fn active_count(&self, owner: &str) -> usize {
            self.rows
                .borrow()
                .iter()
                .filter(|r| r.user_id == owner && r.is_active)
                .count()
        }

        fn mutation_calls(&self) -> usize {
            self.calls
                .borrow()
                .iter()
                .filter(|c| **c != "query")
                .count()
        }
    }

    impl RecordStore for FakeRecords {
        fn insert(&self, _table: &str, row: &NewProfileRow) -> Result<String> {
            self.calls.borrow_mut().push("insert");
            if self.fail_insert.get() {
                return Err(PenmarkError::Store("insert rejected".into()));
            }
            let n = self.next_id.get() + 1;
            self.next_id.set(n);
            let id = format!("p{n}");
            self.rows.borrow_mut().push(ProfileRow {
                id: id.clone(),
                user_id: row.user_id.clone(),
                name: row.name.clone(),
                sample_image_url: row.sample_image_url.clone(),
                font_style: row.font_style.clone(),
                is_active: row.is_active,
                created_at: Utc::now(),
            });
            Ok(id)
        }

        fn update(&self, _table: &str, filter: &RowFilter, patch: &RowPatch) -> Result<usize> {
            self.calls.borrow_mut().push("update");
            let index = self.updates_seen.get();
            self.updates_seen.set(index + 1);
            if self.fail_update_at.get() == Some(index) {
                return Err(PenmarkError::Store("update timed out".into()));
            }
            let mut n = 0;
            for row in self.rows.borrow_mut().iter_mut() {
                if Self::matches(filter, row) {
                    if let Some(active) = patch.is_active {
                        row.is_active = active;
                    }
                    n += 1;
                }
            }
            Ok(n)
        }

        fn delete(&self, _table: &str, filter: &RowFilter) -> Result<usize> {
            self.calls.borrow_mut().push("delete");
            if self.fail_delete.get() {
                return Err(PenmarkError::Store("delete rejected".into()));
            }
            let mut rows = self.rows.borrow_mut();
            let before = rows.len();
            rows.retain(|row| !Self::matches(filter, row));
            Ok(before - rows.len())
        }

        fn query(&self, _table: &str, filter: &RowFilter, _order: OrderBy) -> Result<Vec<ProfileRow>> {
            self.calls.borrow_mut().push("query");
            // Insertion order reversed stands in for newest-first.
            Ok(self
                .rows
                .borrow()
                .iter()
                .rev()
                .filter(|row| Self::matches(filter, row))
                .cloned()
                .collect())
        }
    }

    type TestRegistry = ProfileRegistry<FakeBlobs, FakeRecords>;

    fn make_registry() -> TestRegistry {
        let config = RegistryConfig {
            naming: BlobNaming::Random,
            ..RegistryConfig::default()
        };
        ProfileRegistry::new(FakeBlobs::default(), FakeRecords::default(), config)
            .with_journal(OperationJournal::open_in_memory().expect("journal"))
    }

    fn owner() -> OwnerId {
        OwnerId::new("user-1")
    }

    fn upload(registry: &TestRegistry, name: &str) -> HandwritingProfile {
        registry
            .upload_profile(&owner(), name, StyleCategory::Cursive, b"fake-png", "image/png")
            .expect("upload")
    }

    // -- Listing --------------------------------------------------------------

    #[test]
    fn list_is_empty_for_new_owner() {
        let registry = make_registry();
        assert!(registry.list_profiles(&owner()).unwrap().is_empty());
        assert!(registry.active_profile(&owner()).unwrap().is_none());
    }

    #[test]
    fn list_is_scoped_to_owner_and_newest_first() {
        let registry = make_registry();
        upload(&registry, "first");
        upload(&registry, "second");
        registry
            .upload_profile(&OwnerId::new("user-2"), "theirs", StyleCategory::Print, b"x", "image/png")
            .unwrap();

        let names: Vec<String> = registry
            .list_profiles(&owner())
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["second", "first"]);
    }

    // -- Upload ---------------------------------------------------------------

    #[test]
    fn upload_writes_blob_then_inactive_record() {
        let registry = make_registry();
        let profile = registry
            .upload_profile(&owner(), "  My Hand  ", StyleCategory::Mixed, b"img", "image/jpeg")
            .unwrap();

        assert_eq!(profile.name, "My Hand");
        assert_eq!(profile.style_category, StyleCategory::Mixed);
        assert!(!profile.is_active);
        assert!(profile.sample_image_ref.contains("/handwriting-samples/user-1/"));
        assert!(profile.sample_image_ref.ends_with(".jpg"));

        let calls = registry.blobs().calls.borrow();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("put user-1/"));
        assert_eq!(registry.records().calls.borrow().first(), Some(&"insert"));

        let path = storage_path_from_ref(&profile.sample_image_ref, "handwriting-samples").unwrap();
        assert!(registry.blobs().objects.borrow().contains_key(&path));
    }

    #[test]
    fn upload_rejects_oversized_image_without_store_calls() {
        let registry = make_registry();
        let six_mib = vec![0u8; 6 * 1024 * 1024];
        let err = registry
            .upload_profile(&owner(), "Big", StyleCategory::Print, &six_mib, "image/png")
            .unwrap_err();

        assert!(matches!(err, PenmarkError::Validation(_)));
        assert!(registry.blobs().calls.borrow().is_empty());
        assert!(registry.records().calls.borrow().is_empty());
    }

    #[test]
    fn upload_rejects_owner_named_like_the_bucket() {
        let registry = make_registry();
        let err = registry
            .upload_profile(
                &OwnerId::new("handwriting-samples"),
                "Mine",
                StyleCategory::Print,
                b"img",
                "image/png",
            )
            .unwrap_err();
        assert!(matches!(err, PenmarkError::Validation(_)));
        assert!(registry.blobs().calls.borrow().is_empty());
    }

    #[test]
    fn upload_accepts_exactly_five_mib() {
        let registry = make_registry();
        let five_mib = vec![0u8; 5 * 1024 * 1024];
        registry
            .upload_profile(&owner(), "Edge", StyleCategory::Print, &five_mib, "image/png")
            .unwrap();
    }

    #[test]
    fn upload_rejects_non_image_and_blank_name() {
        let registry = make_registry();
        let err = registry
            .upload_profile(&owner(), "Doc", StyleCategory::Print, b"%PDF", "application/pdf")
            .unwrap_err();
        assert!(matches!(err, PenmarkError::Validation(_)));

        let err = registry
            .upload_profile(&owner(), "   ", StyleCategory::Print, b"img", "image/png")
            .unwrap_err();
        assert!(matches!(err, PenmarkError::Validation(_)));

        assert!(registry.blobs().calls.borrow().is_empty());
        assert!(registry.records().calls.borrow().is_empty());
    }

    #[test]
    fn failed_blob_write_persists_nothing() {
        let registry = make_registry();
        registry.blobs().fail_put.set(true);

        let err = registry
            .upload_profile(&owner(), "A", StyleCategory::Cursive, b"img", "image/png")
            .unwrap_err();
        assert!(matches!(err, PenmarkError::Store(_)));
        assert!(registry.records().calls.borrow().is_empty());
    }

    #[test]
    fn failed_record_insert_reports_orphaned_blob() {
        let registry = make_registry();
        registry.records().fail_insert.set(true);

        let err = registry
            .upload_profile(&owner(), "A", StyleCategory::Cursive, b"img", "image/png")
            .unwrap_err();
        let report = err.partial().expect("partial failure");
        assert_eq!(report.operation, Operation::Upload);
        assert_eq!(report.failed_step, Step::RecordInsert);
        assert_eq!(report.completed, vec![Step::BlobWrite]);

        let orphan = report.orphaned_blob.clone().expect("orphan path");
        assert!(registry.blobs().objects.borrow().contains_key(&orphan));

        let entries = registry.journal().unwrap().entries_for_owner("user-1").unwrap();
        assert_eq!(entries.len(), 1);
        assert!(!entries[0].success);
        assert!(entries[0].details.as_deref().unwrap().contains(&orphan));
    }

    // -- Activation -----------------------------------------------------------

    #[test]
    fn activate_makes_exactly_one_profile_active() {
        let registry = make_registry();
        let a = upload(&registry, "a");
        let b = upload(&registry, "b");

        registry.activate(&owner(), &a.id).unwrap();
        registry.activate(&owner(), &b.id).unwrap();

        let active = registry.active_profile(&owner()).unwrap().unwrap();
        assert_eq!(active.id, b.id);
        assert_eq!(registry.records().active_count("user-1"), 1);
    }

    #[test]
    fn activate_twice_is_idempotent() {
        let registry = make_registry();
        let a = upload(&registry, "a");
        upload(&registry, "b");

        registry.activate(&owner(), &a.id).unwrap();
        registry.activate(&owner(), &a.id).unwrap();

        let active: Vec<_> = registry
            .list_profiles(&owner())
            .unwrap()
            .into_iter()
            .filter(|p| p.is_active)
            .collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, a.id);
    }

    #[test]
    fn activate_does_not_touch_other_owners() {
        let registry = make_registry();
        let other = OwnerId::new("user-2");
        let theirs = registry
            .upload_profile(&other, "theirs", StyleCategory::Print, b"x", "image/png")
            .unwrap();
        registry.activate(&other, &theirs.id).unwrap();

        let mine = upload(&registry, "mine");
        registry.activate(&owner(), &mine.id).unwrap();

        assert_eq!(registry.records().active_count("user-2"), 1);
        assert_eq!(registry.records().active_count("user-1"), 1);
    }

    #[test]
    fn activate_foreign_or_missing_profile_is_not_found() {
        let registry = make_registry();
        let theirs = registry
            .upload_profile(&OwnerId::new("user-2"), "theirs", StyleCategory::Print, b"x", "image/png")
            .unwrap();

        let before = registry.records().mutation_calls();
        for id in [theirs.id.clone(), ProfileId::new("missing")] {
            let err = registry.activate(&owner(), &id).unwrap_err();
            assert!(matches!(err, PenmarkError::NotFound(_)));
        }
        assert_eq!(registry.records().mutation_calls(), before);
    }

    #[test]
    fn failed_second_step_leaves_zero_active() {
        let registry = make_registry();
        let a = upload(&registry, "a");
        let b = upload(&registry, "b");
        registry.activate(&owner(), &a.id).unwrap();

        registry.records().fail_next_update(1);
        let err = registry.activate(&owner(), &b.id).unwrap_err();

        let report = err.partial().expect("partial failure");
        assert_eq!(report.failed_step, Step::ActivateTarget);
        assert_eq!(report.completed, vec![Step::DeactivateAll]);
        assert_eq!(registry.records().active_count("user-1"), 0);

        // Retrying completes the switch.
        registry.activate(&owner(), &b.id).unwrap();
        assert_eq!(registry.active_profile(&owner()).unwrap().unwrap().id, b.id);
    }

    #[test]
    fn failed_first_step_is_a_store_error_and_keeps_previous_active() {
        let registry = make_registry();
        let a = upload(&registry, "a");
        let b = upload(&registry, "b");
        registry.activate(&owner(), &a.id).unwrap();

        registry.records().fail_next_update(0);
        let err = registry.activate(&owner(), &b.id).unwrap_err();
        assert!(matches!(err, PenmarkError::Store(_)));
        assert_eq!(registry.active_profile(&owner()).unwrap().unwrap().id, a.id);
    }

    #[test]
    fn active_count_never_exceeds_one_under_failures() {
        let registry = make_registry();
        let ids: Vec<ProfileId> = (0..4).map(|i| upload(&registry, &format!("p{i}")).id).collect();

        for round in 0..40usize {
            let target = &ids[(round * 7 + 3) % ids.len()];
            if round % 5 == 0 {
                registry.records().fail_next_update(round % 2);
            }
            let _ = registry.activate(&owner(), target);
            registry.records().fail_update_at.set(None);
            assert!(registry.records().active_count("user-1") <= 1);
        }
    }

    // -- Deletion -------------------------------------------------------------

    #[test]
    fn delete_removes_blob_and_record() {
        let registry = make_registry();
        let profile = upload(&registry, "a");

        registry.delete_profile(&owner(), &profile.id).unwrap();

        assert!(registry.blobs().objects.borrow().is_empty());
        assert!(registry.list_profiles(&owner()).unwrap().is_empty());
    }

    #[test]
    fn delete_missing_profile_makes_no_mutations() {
        let registry = make_registry();
        upload(&registry, "a");
        let blob_calls = registry.blobs().calls.borrow().len();
        let record_mutations = registry.records().mutation_calls();

        let err = registry
            .delete_profile(&owner(), &ProfileId::new("nope"))
            .unwrap_err();
        assert!(matches!(err, PenmarkError::NotFound(_)));
        assert_eq!(registry.blobs().calls.borrow().len(), blob_calls);
        assert_eq!(registry.records().mutation_calls(), record_mutations);
    }

    #[test]
    fn blob_delete_failure_still_removes_record_and_reports() {
        let registry = make_registry();
        let profile = upload(&registry, "a");
        registry.blobs().fail_delete.set(true);

        let err = registry.delete_profile(&owner(), &profile.id).unwrap_err();
        let report = err.partial().expect("partial failure");
        assert_eq!(report.failed_step, Step::BlobDelete);
        assert_eq!(report.completed, vec![Step::RecordDelete]);
        assert!(report.orphaned_blob.as_deref().unwrap().starts_with("user-1/"));
        assert!(registry.list_profiles(&owner()).unwrap().is_empty());
    }

    #[test]
    fn record_delete_failure_after_blob_delete_is_partial_and_retriable() {
        let registry = make_registry();
        let profile = upload(&registry, "a");
        registry.records().fail_delete.set(true);

        let err = registry.delete_profile(&owner(), &profile.id).unwrap_err();
        let report = err.partial().expect("partial failure");
        assert_eq!(report.failed_step, Step::RecordDelete);
        assert_eq!(report.completed, vec![Step::BlobDelete]);

        // Retry: the blob is already gone, which the store treats as success.
        registry.records().fail_delete.set(false);
        registry.delete_profile(&owner(), &profile.id).unwrap();
        assert!(registry.list_profiles(&owner()).unwrap().is_empty());
    }

    #[test]
    fn unresolvable_reference_with_record_failure_is_invalid_reference() {
        let registry = make_registry();
        let profile = upload(&registry, "a");
        registry.records().rows.borrow_mut()[0].sample_image_url =
            "https://elsewhere.test/u/a.png".into();
        registry.records().fail_delete.set(true);

        let err = registry.delete_profile(&owner(), &profile.id).unwrap_err();
        assert!(matches!(err, PenmarkError::InvalidReference(ref m)
            if m.contains("elsewhere.test") && m.contains("delete rejected")));
        assert!(!penmark_core::human_errors::humanize_error(&err).retriable);
        assert_eq!(registry.list_profiles(&owner()).unwrap().len(), 1);
    }

    #[test]
    fn reference_into_another_owners_area_is_not_followed() {
        let registry = make_registry();
        let theirs = registry
            .upload_profile(&OwnerId::new("user-2"), "theirs", StyleCategory::Print, b"x", "image/png")
            .unwrap();
        let mine = upload(&registry, "a");
        registry
            .records()
            .rows
            .borrow_mut()
            .iter_mut()
            .find(|r| r.id == mine.id.0)
            .unwrap()
            .sample_image_url = theirs.sample_image_ref.clone();

        let err = registry.delete_profile(&owner(), &mine.id).unwrap_err();
        let report = err.partial().expect("partial failure");
        assert_eq!(report.failed_step, Step::BlobDelete);
        assert!(report.cause.contains("user-2/"));
        assert!(!registry.blobs().calls.borrow().iter().any(|c| c.starts_with("delete")));
        assert_eq!(registry.blobs().objects.borrow().len(), 2);
    }

    #[test]
    fn both_delete_steps_failing_is_a_store_error() {
        let registry = make_registry();
        let profile = upload(&registry, "a");
        registry.blobs().fail_delete.set(true);
        registry.records().fail_delete.set(true);

        let err = registry.delete_profile(&owner(), &profile.id).unwrap_err();
        assert!(matches!(err, PenmarkError::Store(_)));
        assert_eq!(registry.list_profiles(&owner()).unwrap().len(), 1);
    }

    #[test]
    fn unresolvable_reference_deletes_record_and_reports() {
        let registry = make_registry();
        let profile = upload(&registry, "a");
        registry.records().rows.borrow_mut()[0].sample_image_url =
            "https://elsewhere.test/u/a.png".into();

        let err = registry.delete_profile(&owner(), &profile.id).unwrap_err();
        let report = err.partial().expect("partial failure");
        assert_eq!(report.failed_step, Step::BlobDelete);
        assert!(report.orphaned_blob.is_none());
        assert!(report.cause.contains("elsewhere.test"));
        assert!(registry.list_profiles(&owner()).unwrap().is_empty());
    }

    #[test]
    fn journal_records_each_outcome() {
        let registry = make_registry();
        let profile = upload(&registry, "a");
        registry.activate(&owner(), &profile.id).unwrap();
        registry.delete_profile(&owner(), &profile.id).unwrap();

        let actions: Vec<String> = registry
            .journal()
            .unwrap()
            .entries_for_owner("user-1")
            .unwrap()
            .into_iter()
            .map(|e| e.action)
            .collect();
        assert_eq!(actions, vec!["upload", "activate", "delete"]);
    }

    #[test]
    fn timestamp_naming_uses_millis() {
        let registry = ProfileRegistry::new(
            FakeBlobs::default(),
            FakeRecords::default(),
            RegistryConfig::default(),
        );
        let token = registry.blob_token();
        assert!(token.parse::<i64>().is_ok());
    }
}
