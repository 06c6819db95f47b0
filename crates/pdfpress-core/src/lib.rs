// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pdfpress-core: types, tier presets and error definitions shared across all crates.

pub mod cancel;
pub mod config;
pub mod error;
pub mod human_errors;
pub mod presets;
pub mod types;

pub use cancel::CancelFlag;
pub use config::ServerConfig;
pub use error::PdfpressError;
pub use types::*;
