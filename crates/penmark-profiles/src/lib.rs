// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// penmark-profiles — Handwriting profile registry.
//
// Keeps each owner's profiles consistent across the blob store (sample
// images) and the record store (profile rows): at most one active profile
// per owner, no record without its blob, and every incomplete multi-step
// operation reported as a partial failure.

pub mod registry;
pub mod storage_path;

pub use registry::{ProfileRegistry, RegistryConfig};
pub use storage_path::{sample_object_path, storage_path_from_ref};
