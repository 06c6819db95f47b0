// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Compression orchestrator: try strategies in priority order and keep the
// first output that clears the gain threshold, or the best one seen.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use lopdf::Document;
use pdfpress_core::error::{PdfpressError, Result};
use pdfpress_core::{
    AttemptOutcome, CancelFlag, CompressionAttempt, CompressionResult, CompressionTier,
    MIN_GAIN_PERCENT, ServerConfig, StrategyKind,
};
use tracing::{debug, error, info, instrument, warn};

use crate::capabilities::Capabilities;
use crate::compress::Compressor;
use crate::pdf::PdfDocument;

/// What a successful run hands back to the caller.
#[derive(Debug)]
pub struct CompressionOutcome {
    pub result: CompressionResult,
    /// The serialised output document.
    pub output: Vec<u8>,
    /// One entry per strategy tried, in order.
    pub attempts: Vec<CompressionAttempt>,
}

/// Runs the fallback chain for one request.
pub struct Orchestrator {
    strategies: Vec<Box<dyn Compressor>>,
    min_gain_percent: f64,
}

impl Orchestrator {
    /// Build the chain from the probed capabilities, minus any strategies
    /// the configuration disables.
    pub fn new(capabilities: &Capabilities, config: &ServerConfig) -> Self {
        let strategies = capabilities
            .available()
            .into_iter()
            .filter(|kind| config.is_enabled(*kind))
            .filter_map(|kind| capabilities.compressor(kind))
            .collect();
        Self::with_strategies(strategies).with_min_gain(config.min_gain_percent)
    }

    /// Use exactly `strategies`, in the given order.
    pub fn with_strategies(strategies: Vec<Box<dyn Compressor>>) -> Self {
        Self {
            strategies,
            min_gain_percent: MIN_GAIN_PERCENT,
        }
    }

    pub fn with_min_gain(mut self, percent: f64) -> Self {
        self.min_gain_percent = percent;
        self
    }

    /// Strategy kinds in the order they will be tried.
    pub fn strategies(&self) -> Vec<StrategyKind> {
        self.strategies.iter().map(|strategy| strategy.kind()).collect()
    }

    /// Compress `input` at `tier`.
    ///
    /// Parse failures and cancellation are terminal. Strategy failures are
    /// logged and the next strategy is tried; if none produced output the
    /// run fails with `Compression`.
    #[instrument(skip_all, fields(tier = %tier, input_bytes = input.len()))]
    pub fn run(&self, input: Vec<u8>, tier: CompressionTier, cancel: &CancelFlag) -> Result<CompressionOutcome> {
        let original_size = input.len() as u64;
        let doc = PdfDocument::parse(input)?;
        info!(pages = doc.page_count(), "document parsed");

        let mut attempts = Vec::with_capacity(self.strategies.len());
        let mut best: Option<(CompressionResult, Vec<u8>)> = None;

        for (index, strategy) in self.strategies.iter().enumerate() {
            let kind = strategy.kind();
            if cancel.is_cancelled() {
                record_skipped(&mut attempts, &self.strategies[index..]);
                info!(strategy = %kind, "cancelled before strategy");
                return Err(PdfpressError::Cancelled);
            }

            debug!(strategy = %kind, "trying strategy");
            let output = match attempt(strategy.as_ref(), &doc, tier, cancel) {
                Ok(output) => output,
                Err(PdfpressError::Cancelled) => {
                    record_skipped(&mut attempts, &self.strategies[index..]);
                    info!(strategy = %kind, "cancelled during strategy");
                    return Err(PdfpressError::Cancelled);
                }
                Err(err) => {
                    if err.is_strategy_local() {
                        warn!(strategy = %kind, error = %err, "strategy failed");
                    } else {
                        error!(strategy = %kind, error = %err, "strategy failed unexpectedly");
                    }
                    attempts.push(CompressionAttempt {
                        strategy: kind,
                        outcome: AttemptOutcome::Failed {
                            error: err.to_string(),
                        },
                    });
                    continue;
                }
            };

            let result = CompressionResult::new(kind, original_size, output.len() as u64);
            attempts.push(CompressionAttempt {
                strategy: kind,
                outcome: AttemptOutcome::Succeeded { result },
            });

            if result.meets(self.min_gain_percent) {
                info!(
                    strategy = %kind,
                    ratio = result.ratio_percent,
                    compressed_bytes = result.compressed_size_bytes,
                    "output accepted"
                );
                return Ok(CompressionOutcome {
                    result,
                    output,
                    attempts,
                });
            }

            debug!(strategy = %kind, ratio = result.ratio_percent, "below threshold, kept as candidate");
            // Strictly greater: the earliest strategy wins ties.
            if best
                .as_ref()
                .is_none_or(|(candidate, _)| result.ratio_percent > candidate.ratio_percent)
            {
                best = Some((result, output));
            }
        }

        match best {
            Some((result, output)) => {
                info!(
                    strategy = %result.strategy_used,
                    ratio = result.ratio_percent,
                    "no strategy cleared the threshold, returning best candidate"
                );
                Ok(CompressionOutcome {
                    result,
                    output,
                    attempts,
                })
            }
            None => {
                let summary = failure_summary(&attempts);
                error!(%summary, "every strategy failed");
                Err(PdfpressError::Compression(format!(
                    "no strategy could compress this PDF ({summary})"
                )))
            }
        }
    }
}

/// Run one strategy, turning panics into errors and rejecting output that
/// is empty or does not parse back as a PDF with pages.
fn attempt(
    strategy: &dyn Compressor,
    doc: &PdfDocument,
    tier: CompressionTier,
    cancel: &CancelFlag,
) -> Result<Vec<u8>> {
    let output = panic::catch_unwind(AssertUnwindSafe(|| strategy.compress(doc, tier, cancel)))
        .map_err(|payload| {
            PdfpressError::Compression(format!("strategy panicked: {}", panic_message(&*payload)))
        })??;

    if output.is_empty() {
        return Err(PdfpressError::Compression("strategy produced no output".into()));
    }
    let reparsed = Document::load_mem(&output)
        .map_err(|err| PdfpressError::Compression(format!("output does not parse: {err}")))?;
    if reparsed.get_pages().is_empty() {
        return Err(PdfpressError::Compression("output has no pages".into()));
    }
    Ok(output)
}

fn record_skipped(attempts: &mut Vec<CompressionAttempt>, remaining: &[Box<dyn Compressor>]) {
    attempts.extend(remaining.iter().map(|strategy| CompressionAttempt {
        strategy: strategy.kind(),
        outcome: AttemptOutcome::Skipped,
    }));
}

fn failure_summary(attempts: &[CompressionAttempt]) -> String {
    if attempts.is_empty() {
        return "no strategies enabled".into();
    }
    attempts
        .iter()
        .filter_map(|attempt| match &attempt.outcome {
            AttemptOutcome::Failed { error } => Some(format!("{}: {error}", attempt.strategy)),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".into()
    }
}
