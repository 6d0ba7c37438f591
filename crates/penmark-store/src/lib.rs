// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// penmark-store — Storage collaborators for the profile registry.
//
// Defines the blob store and record store contracts the registry is written
// against, a filesystem blob store and a SQLite record store that satisfy
// them, and the append-only operation journal used to surface partial
// failures to operators.

pub mod blob;
pub mod journal;
pub mod record;

pub use blob::{BlobStore, FsBlobStore};
pub use journal::{JournalEntry, OperationJournal};
pub use record::{
    NewProfileRow, OrderBy, PROFILE_TABLE, ProfileRow, RecordStore, RowFilter, RowPatch,
    SqliteRecordStore,
};
