// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfpress-server: the HTTP boundary.
//
// Accepts PDF uploads, runs the compression chain on a blocking thread,
// stages outputs for a single download, and sweeps outputs nobody fetched.

pub mod error;
pub mod routes;
pub mod staging;
pub mod state;
pub mod sweeper;

pub use routes::app;
pub use state::AppState;
