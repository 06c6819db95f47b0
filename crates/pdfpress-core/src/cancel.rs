// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Request-scoped cancellation for compression runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{PdfpressError, Result};

/// Cheaply cloneable flag shared between a request handler and the blocking
/// compression task it spawned.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// `Err(Cancelled)` once the flag has been tripped.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(PdfpressError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Guard that trips this flag when dropped unless disarmed first.
    pub fn guard(&self) -> CancelOnDrop {
        CancelOnDrop {
            flag: self.clone(),
            armed: true,
        }
    }
}

/// Trips its flag on drop. Held by the async handler so that an abandoned
/// request (future dropped mid-flight) stops the blocking work it started.
#[derive(Debug)]
pub struct CancelOnDrop {
    flag: CancelFlag,
    armed: bool,
}

impl CancelOnDrop {
    /// Call once the work finished normally.
    pub fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.flag.cancel();
        }
    }
}
