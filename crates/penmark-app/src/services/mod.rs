// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer — bridges the CLI to the penmark backend crates.
//
// Each service wraps one or more backend crate APIs in a way that is convenient
// for the command handlers to call (plain arguments in, printable data out).

pub mod app_services;
pub mod data_dir;
pub mod transform;
