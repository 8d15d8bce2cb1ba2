//! Stable diagnostic codes and the collectors that carry them between stages.
//!
//! Every missing input or conservative fallback surfaces as a dot-namespaced
//! string code rather than an error. Two severities exist:
//!
//! - `missing_info`: an input was absent (diagnostic only)
//! - `warnings`: a fallback, relaxation or substitute was used; the result is
//!   caveated but usable

use std::collections::BTreeSet;

use serde::Serialize;

/// A stable, dot-namespaced diagnostic code.
pub type Code = &'static str;

/// A quantity that is either known or explained by one or more codes.
pub type Outcome<T> = Result<T, Vec<Code>>;

/// Missing-info codes.
pub mod missing {
    use super::Code;

    pub const INTERVALS: Code = "missing_intervals";
    pub const TARIFF_PRICE_SIGNALS: Code = "missing_tariff_price_signals";
    pub const DEMAND_CHARGE: Code = "missing_demand_charge";
    pub const CAPEX_ASSUMPTIONS: Code = "missing_capex_assumptions";
    pub const BILLING_DETERMINANTS: Code = "missing_billing_determinants";
    pub const RATCHET_HISTORY: Code = "missing_ratchet_history";
    pub const SGIP_SNAPSHOT: Code = "missing_sgip_snapshot";
    pub const TAX_RATE: Code = "missing_tax_rate";
}

/// Warning codes.
pub mod warn {
    use super::Code;

    pub const PEAK_FROM_AVERAGE: Code = "candidates.peak_from_average";
    pub const FILTER_RELAXED: Code = "candidates.filter_relaxed";
    pub const ALL_REJECTED: Code = "candidates.all_rejected_by_constraints";

    pub const INVALID_BATTERY_PARAMS: Code = "dispatch.invalid_battery_params";
    pub const INSUFFICIENT_DATA: Code = "dispatch.insufficient_interval_data";
    pub const TOU_UNMATCHED: Code = "dispatch.tou.unmatched_interval";
    pub const TOU_AMBIGUOUS: Code = "dispatch.tou.ambiguous_interval";
    pub const TOU_FLAT_PRICING: Code = "dispatch.tou.flat_pricing";
    pub const GENERATION_RATES_MISSING: Code = "dispatch.tou.generation_rates_missing";
    pub const SYNTHETIC_LOAD_SHAPE: Code = "dispatch.synthetic_load_shape";
    pub const SYNTHETIC_CYCLE: Code = "dispatch.synthetic_cycle_window";
    pub const DEMAND_ONLY_MODE: Code = "dispatch.demand_only_mode";

    pub const ENERGY_PROXY: Code = "savings.energy_proxy_used";
    pub const DEMAND_ZEROED_RATCHET: Code = "savings.demand_zeroed_ratchet_history_missing";
    pub const DEMAND_CAPPED_AT_BILLED: Code = "savings.demand_reduction_capped_at_billed";
    pub const RATCHET_HEURISTIC: Code = "savings.ratchet_binding_heuristic";

    pub const SGIP_LATEST_FALLBACK: Code = "incentive.sgip.latest_snapshot_fallback";
    pub const SGIP_USABLE_FALLBACK: Code = "incentive.sgip.usable_kwh_fallback";
    pub const SGIP_CAPPED: Code = "incentive.sgip.capped";
    pub const MACRS_MISSING_TAX_RATE: Code = "tax.macrs_missing_tax_rate";
    pub const REPLACEMENT_SCHEDULED: Code = "degradation.replacement_scheduled";

    pub const CANDIDATE_OMITTED: Code = "decision.candidate_omitted";
    pub const NO_ACCEPTED_CANDIDATE: Code = "decision.no_accepted_candidate";
}

/// Per-component explanation codes (why a figure is zero or null).
pub mod why {
    use super::Code;

    pub const NO_DISPATCH: Code = "why.energy.no_dispatch_result";
    pub const PRICE_UNKNOWN_FOR_PERIOD: Code = "why.energy.price_unknown_for_period";
    pub const NO_PEAK_DATA: Code = "why.demand.no_peak_data";
    pub const RATCHET_NOT_ELIGIBLE: Code = "why.ratchet.not_eligible";
    pub const RATCHET_NOT_BINDING: Code = "why.ratchet.not_binding";
    pub const DR_NOT_ELIGIBLE: Code = "why.dr.not_eligible";
    pub const DR_NO_PAYMENT: Code = "why.dr.no_program_payment";
    pub const SGIP_DISABLED: Code = "why.sgip.disabled";
    pub const ITC_DISABLED: Code = "why.itc.disabled";
    pub const MACRS_DISABLED: Code = "why.macrs.disabled";
    pub const CAPEX_UNKNOWN: Code = "why.capex_unknown";
    pub const SAVINGS_UNKNOWN: Code = "why.savings_unknown";
}

/// Gate rejection codes.
pub mod reject {
    use super::Code;

    pub const DURATION_BELOW_MIN: Code = "reject.duration_below_min";
    pub const COVERAGE_OUT_OF_BAND: Code = "reject.coverage_out_of_band";
    pub const PAYBACK_TOO_LONG: Code = "reject.payback_too_long";
    pub const NPV_BELOW_FLOOR: Code = "reject.npv_below_floor";
    pub const NET_ANNUAL_BELOW_FLOOR: Code = "reject.net_annual_below_floor";
    pub const ECONOMICS_UNAVAILABLE: Code = "reject.economics_unavailable";
}

/// Sorted, deduplicated warning and missing-info sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub warnings: BTreeSet<Code>,
    pub missing_info: BTreeSet<Code>,
}

impl Diagnostics {
    pub fn warn(&mut self, code: Code) {
        self.warnings.insert(code);
    }

    pub fn missing(&mut self, code: Code) {
        self.missing_info.insert(code);
    }

    /// Folds another collector into this one.
    pub fn absorb(&mut self, other: &Diagnostics) {
        self.warnings.extend(other.warnings.iter().copied());
        self.missing_info.extend(other.missing_info.iter().copied());
    }

    /// Number of distinct warning codes.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }
}
