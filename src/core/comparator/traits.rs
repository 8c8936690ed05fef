//! Trait definitions for comparison strategies.

use super::MatchType;
use crate::config::DEFAULT_THRESHOLD;

/// Strategy trait for deciding whether a distance counts as a match
pub trait ComparisonStrategy: Send + Sync {
    /// Whether two fingerprints at this distance should be reported
    fn is_match(&self, distance: u32) -> bool;

    /// Classify the distance into an informative band
    fn classify(&self, distance: u32) -> MatchType;

    /// Get the threshold used
    fn threshold(&self) -> u32;

    /// Human-readable description of the strategy
    fn description(&self) -> String;
}

/// Simple threshold-based comparison strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdStrategy {
    /// Maximum distance reported as a match, inclusive
    threshold: u32,
}

impl ThresholdStrategy {
    /// Create a new threshold strategy
    ///
    /// Useful thresholds for 256-bit fingerprints:
    /// - 0: same visual content only
    /// - 5: re-saves and metadata edits (default)
    /// - 15: also catches light crops and edits
    pub fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    /// Only identical fingerprints (threshold = 0)
    pub fn strict() -> Self {
        Self::new(0)
    }

    /// Same photo re-saved (threshold = 5)
    pub fn very_similar() -> Self {
        Self::new(5)
    }

    /// Possible crops and edits (threshold = 15)
    pub fn similar() -> Self {
        Self::new(15)
    }
}

impl Default for ThresholdStrategy {
    fn default() -> Self {
        Self::new(DEFAULT_THRESHOLD)
    }
}

impl ComparisonStrategy for ThresholdStrategy {
    fn is_match(&self, distance: u32) -> bool {
        distance <= self.threshold
    }

    fn classify(&self, distance: u32) -> MatchType {
        MatchType::from_distance(distance)
    }

    fn threshold(&self) -> u32 {
        self.threshold
    }

    fn description(&self) -> String {
        format!(
            "Threshold strategy: fingerprints with distance <= {} are reported as similar",
            self.threshold
        )
    }
}
