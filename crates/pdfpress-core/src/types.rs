// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the pdfpress compression pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PdfpressError;

/// Minimum size reduction (percent) for a strategy's output to be accepted
/// without trying the remaining strategies.
pub const MIN_GAIN_PERCENT: f64 = 5.0;

/// Unique identifier for one upload/download round trip. Also the prefix of
/// every staged file belonging to the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DownloadId(pub Uuid);

impl DownloadId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a client-supplied id. Anything that is not a UUID is rejected,
    /// which also keeps path separators out of staging file names.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(Self)
    }
}

impl Default for DownloadId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DownloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Named aggressiveness preset. Ordered from most faithful to most lossy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionTier {
    Low,
    Medium,
    High,
    Extreme,
}

impl CompressionTier {
    /// All tiers, least to most aggressive.
    pub const ALL: [CompressionTier; 4] = [Self::Low, Self::Medium, Self::High, Self::Extreme];

    /// Row index into the preset tables.
    pub(crate) fn index(self) -> usize {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
            Self::Extreme => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Extreme => "extreme",
        }
    }
}

impl Default for CompressionTier {
    fn default() -> Self {
        Self::Medium
    }
}

impl fmt::Display for CompressionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionTier {
    type Err = PdfpressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "extreme" => Ok(Self::Extreme),
            other => Err(PdfpressError::Validation(format!(
                "Unknown compression level '{other}'. Use low, medium, high or extreme."
            ))),
        }
    }
}

/// The interchangeable compression techniques, in fallback priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Render every page to a JPEG and rebuild the document from images.
    Rasterization,
    /// Rewrite the object graph with deflate and object streams.
    StreamRecompressor,
    /// Copy pages into a fresh document and re-serialise with deflate.
    BasicStructural,
}

impl StrategyKind {
    /// Fixed fallback order used by the orchestrator.
    pub const PRIORITY: [StrategyKind; 3] = [
        Self::Rasterization,
        Self::StreamRecompressor,
        Self::BasicStructural,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rasterization => "rasterization",
            Self::StreamRecompressor => "stream_recompressor",
            Self::BasicStructural => "basic_structural",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = PdfpressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rasterization" | "raster" => Ok(Self::Rasterization),
            "stream_recompressor" | "stream" => Ok(Self::StreamRecompressor),
            "basic_structural" | "basic" => Ok(Self::BasicStructural),
            other => Err(PdfpressError::Config(format!("unknown strategy '{other}'"))),
        }
    }
}

/// Before/after sizes of the strategy whose output was kept.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompressionResult {
    pub strategy_used: StrategyKind,
    pub original_size_bytes: u64,
    pub compressed_size_bytes: u64,
    /// `(original - compressed) / original * 100`. Negative when the output
    /// grew; never clamped.
    pub ratio_percent: f64,
}

impl CompressionResult {
    pub fn new(strategy_used: StrategyKind, original: u64, compressed: u64) -> Self {
        Self {
            strategy_used,
            original_size_bytes: original,
            compressed_size_bytes: compressed,
            ratio_percent: ratio_percent(original, compressed),
        }
    }

    /// Whether the reduction clears `threshold` percent.
    pub fn meets(&self, threshold: f64) -> bool {
        self.ratio_percent >= threshold
    }
}

/// Size reduction in percent. Zero for an empty original.
pub fn ratio_percent(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - compressed as f64) * 100.0 / original as f64
}

/// What happened when one strategy was tried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Succeeded { result: CompressionResult },
    Failed { error: String },
    /// Not run because the request was cancelled first.
    Skipped,
}

/// Ephemeral record of one strategy's outcome within a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompressionAttempt {
    pub strategy: StrategyKind,
    #[serde(flatten)]
    pub outcome: AttemptOutcome,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_is_negative_when_output_grows() {
        let result = CompressionResult::new(StrategyKind::BasicStructural, 1000, 1100);
        assert!((result.ratio_percent + 10.0).abs() < 1e-9);
        assert!(!result.meets(MIN_GAIN_PERCENT));
    }

    #[test]
    fn ratio_of_empty_original_is_zero() {
        assert_eq!(ratio_percent(0, 10), 0.0);
    }

    #[test]
    fn threshold_is_inclusive() {
        let result = CompressionResult::new(StrategyKind::StreamRecompressor, 100, 95);
        assert!(result.meets(MIN_GAIN_PERCENT));
    }

    #[test]
    fn tier_parses_case_insensitively() {
        assert_eq!("EXTREME".parse::<CompressionTier>().expect("tier"), CompressionTier::Extreme);
        assert_eq!(" low ".parse::<CompressionTier>().expect("tier"), CompressionTier::Low);
        assert!("ultra".parse::<CompressionTier>().is_err());
    }

    #[test]
    fn tier_default_is_medium() {
        assert_eq!(CompressionTier::default(), CompressionTier::Medium);
    }

    #[test]
    fn tiers_are_ordered_by_aggressiveness() {
        let mut sorted = CompressionTier::ALL;
        sorted.sort();
        assert_eq!(sorted, CompressionTier::ALL);
    }

    #[test]
    fn strategy_serializes_snake_case() {
        let json = serde_json::to_string(&StrategyKind::StreamRecompressor).expect("json");
        assert_eq!(json, "\"stream_recompressor\"");
    }

    #[test]
    fn download_id_rejects_path_fragments() {
        assert!(DownloadId::parse("../../etc").is_none());
        let id = DownloadId::new();
        assert_eq!(DownloadId::parse(&id.to_string()), Some(id));
    }
}
