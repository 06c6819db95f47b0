// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF module: parsing and page geometry, page copying, content compaction
// and serialisation.

pub mod clone;
pub mod content;
pub mod document;
pub mod writer;

pub use clone::PageCloner;
pub use document::{PageInfo, PdfDocument};
pub use writer::{PdfWriter, XrefLayout, serialize};
