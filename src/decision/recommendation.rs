//! Four-tier go/no-go recommendation.

use std::fmt;

use serde::Serialize;

use crate::economics::ConfidenceTier;
use crate::reason::Code;

pub const DOWNGRADE_CONFIDENCE: Code = "recommendation.downgraded_confidence_none";
pub const DOWNGRADE_CAPEX_SENSITIVITY: Code = "recommendation.downgraded_capex_sensitivity";

/// Ordered from strongest to weakest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecommendationTier {
    Strong,
    Moderate,
    Weak,
    DoNotProceed,
}

impl RecommendationTier {
    /// Payback bands: <=6 strong, <=10 moderate, <=15 weak.
    pub fn from_payback(payback_years: Option<f64>) -> Self {
        match payback_years {
            Some(p) if p <= 6.0 => Self::Strong,
            Some(p) if p <= 10.0 => Self::Moderate,
            Some(p) if p <= 15.0 => Self::Weak,
            _ => Self::DoNotProceed,
        }
    }

    /// One step weaker; `DoNotProceed` stays put.
    pub fn downgrade(self) -> Self {
        match self {
            Self::Strong => Self::Moderate,
            Self::Moderate => Self::Weak,
            Self::Weak | Self::DoNotProceed => Self::DoNotProceed,
        }
    }
}

impl fmt::Display for RecommendationTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Strong => "STRONG",
            Self::Moderate => "MODERATE",
            Self::Weak => "WEAK",
            Self::DoNotProceed => "DO_NOT_PROCEED",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub tier: RecommendationTier,
    /// Tier from the base payback before downgrades.
    pub payback_tier: RecommendationTier,
    pub payback_years: Option<f64>,
    pub downgrades: Vec<Code>,
    pub summary: String,
}

/// Derives the recommendation for the selected candidate.
///
/// # Arguments
///
/// * `base_payback` - Simple payback of the base scenario
/// * `capex_plus_payback` - Simple payback with capex +15%
/// * `confidence` - Confidence tier of the selected economics
pub fn recommend(
    base_payback: Option<f64>,
    capex_plus_payback: Option<f64>,
    confidence: ConfidenceTier,
) -> Recommendation {
    let payback_tier = RecommendationTier::from_payback(base_payback);
    let mut tier = payback_tier;
    let mut downgrades = Vec::new();
    if confidence == ConfidenceTier::None {
        tier = tier.downgrade();
        downgrades.push(DOWNGRADE_CONFIDENCE);
    }
    if RecommendationTier::from_payback(capex_plus_payback) != payback_tier {
        tier = tier.downgrade();
        downgrades.push(DOWNGRADE_CAPEX_SENSITIVITY);
    }
    let summary = match base_payback {
        Some(p) => format!("{tier}: simple payback {p:.1} years ({confidence} confidence)"),
        None => format!("{tier}: payback not reached ({confidence} confidence)"),
    };
    Recommendation {
        tier,
        payback_tier,
        payback_years: base_payback,
        downgrades,
        summary,
    }
}
