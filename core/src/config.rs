//! Ranking constants and the runtime scoring configuration.
//!
//! The constants are the defaults; binaries override individual values via
//! command-line flags and hand the result to the engine as a [`ScoringConfig`].

use serde::{Deserialize, Serialize};

/// BM25 term frequency saturation.
pub const BM25_K1: f32 = 1.5;

/// BM25 document length normalization.
pub const BM25_B: f32 = 0.75;

/// Weight of the min-max normalized TF-IDF cosine in the hybrid blend.
pub const HYBRID_TEXT_WEIGHT: f32 = 0.7;
/// Weight of the normalized average rating.
pub const HYBRID_RATING_WEIGHT: f32 = 0.15;
/// Weight of the normalized discount.
pub const HYBRID_DISCOUNT_WEIGHT: f32 = 0.1;
/// Weight of the inverted normalized selling price (cheaper is better).
pub const HYBRID_PRICE_WEIGHT: f32 = 0.05;

/// Subtracted from the hybrid score of out-of-stock products.
///
/// Policy value; calibrate against reference rankings when available.
pub const DEFAULT_STOCK_PENALTY: f32 = 0.1;

/// Value assigned to every candidate when a normalized quantity has zero range.
pub const NEUTRAL_NORM: f32 = 0.5;

/// Result count used when a caller does not pass one.
pub const DEFAULT_LIMIT: usize = 10;

/// Upper bound on results per request.
pub const MAX_LIMIT: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridWeights {
    pub text: f32,
    pub rating: f32,
    pub discount: f32,
    pub price: f32,
}

impl Default for HybridWeights {
    fn default() -> Self {
        Self {
            text: HYBRID_TEXT_WEIGHT,
            rating: HYBRID_RATING_WEIGHT,
            discount: HYBRID_DISCOUNT_WEIGHT,
            price: HYBRID_PRICE_WEIGHT,
        }
    }
}

/// Tunables shared by the scoring models.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub k1: f32,
    pub b: f32,
    pub hybrid: HybridWeights,
    pub stock_penalty: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            k1: BM25_K1,
            b: BM25_B,
            hybrid: HybridWeights::default(),
            stock_penalty: DEFAULT_STOCK_PENALTY,
        }
    }
}
