use serde::{Deserialize, Serialize};

/// Colour class of an annotation point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoreTier {
    High,
    Medium,
    Low,
}

/// Score thresholds separating the tiers (both exclusive).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub high: f64,
    pub medium: f64,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            high: 0.7,
            medium: 0.4,
        }
    }
}

impl TierThresholds {
    pub fn new(high: f64, medium: f64) -> Self {
        Self { high, medium }
    }

    pub fn classify(&self, score: f64) -> ScoreTier {
        if score > self.high {
            ScoreTier::High
        } else if score > self.medium {
            ScoreTier::Medium
        } else {
            ScoreTier::Low
        }
    }
}
