//! Confidence tier of an economics result.

use std::fmt;

use serde::Serialize;

/// Ordered from least to most confident.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfidenceTier {
    None,
    Low,
    Medium,
    High,
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "NONE",
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        };
        f.write_str(s)
    }
}

/// Facts that cap the tier.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfidenceSignals {
    pub sizing_known: bool,
    pub capex_known: bool,
    pub savings_known: bool,
    pub energy_proxy_used: bool,
    pub demand_rate_missing: bool,
    pub synthetic_load: bool,
    pub dispatch_degraded: bool,
}

impl ConfidenceSignals {
    /// Highest tier the signals allow.
    pub fn tier(&self) -> ConfidenceTier {
        if !self.sizing_known || !self.capex_known {
            ConfidenceTier::None
        } else if !self.savings_known {
            ConfidenceTier::Low
        } else if self.energy_proxy_used
            || self.demand_rate_missing
            || self.synthetic_load
            || self.dispatch_degraded
        {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::High
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_good() -> ConfidenceSignals {
        ConfidenceSignals {
            sizing_known: true,
            capex_known: true,
            savings_known: true,
            ..ConfidenceSignals::default()
        }
    }

    #[test]
    fn tiers_are_capped_monotonically() {
        assert_eq!(all_good().tier(), ConfidenceTier::High);
        let proxy = ConfidenceSignals {
            energy_proxy_used: true,
            ..all_good()
        };
        assert_eq!(proxy.tier(), ConfidenceTier::Medium);
        let no_savings = ConfidenceSignals {
            savings_known: false,
            ..proxy
        };
        assert_eq!(no_savings.tier(), ConfidenceTier::Low);
        let no_capex = ConfidenceSignals {
            capex_known: false,
            ..no_savings
        };
        assert_eq!(no_capex.tier(), ConfidenceTier::None);
        assert!(ConfidenceTier::None < ConfidenceTier::High);
    }
}
