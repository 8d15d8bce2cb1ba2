//! Caller-supplied economic assumptions.
//!
//! Every section uses `#[serde(default, deny_unknown_fields)]` so a scenario
//! file only has to state what differs from the defaults. Optional stages
//! (SGIP, ITC, MACRS, degradation) are `None` when disabled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Installed-cost assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CapexAssumptions {
    /// Power-linked hardware cost ($/kW).
    pub per_kw: Option<f64>,
    /// Energy-linked hardware cost ($/kWh).
    pub per_kwh: Option<f64>,
    /// Installation as a share of hardware.
    pub install_pct: f64,
    /// Flat interconnection cost ($).
    pub interconnect_usd: f64,
    /// Flat soft costs: design, permitting, overhead ($).
    pub soft_costs_usd: f64,
    /// Contingency as a share of the subtotal.
    pub contingency_pct: f64,
}

impl Default for CapexAssumptions {
    fn default() -> Self {
        Self {
            per_kw: None,
            per_kwh: None,
            install_pct: 0.15,
            interconnect_usd: 0.0,
            soft_costs_usd: 0.0,
            contingency_pct: 0.05,
        }
    }
}

/// Recurring cost assumptions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpexAssumptions {
    /// Fixed O&M ($/kW-yr).
    pub per_kw_year: f64,
    /// Annual warranty reserve as a share of capex.
    pub warranty_reserve_pct: f64,
}

impl Default for OpexAssumptions {
    fn default() -> Self {
        Self {
            per_kw_year: 10.0,
            warranty_reserve_pct: 0.0,
        }
    }
}

/// Discounting horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FinanceAssumptions {
    pub discount_rate: f64,
    pub analysis_years: u32,
}

impl Default for FinanceAssumptions {
    fn default() -> Self {
        Self {
            discount_rate: 0.08,
            analysis_years: 10,
        }
    }
}

/// Savings inputs not derived from dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SavingsAssumptions {
    /// Flat annual "other" savings ($/yr).
    pub other_annual_usd: f64,
    /// Cycles per year assumed by the energy-arbitrage proxy.
    pub proxy_cycles_per_year: f64,
}

impl Default for SavingsAssumptions {
    fn default() -> Self {
        Self {
            other_annual_usd: 0.0,
            proxy_cycles_per_year: 250.0,
        }
    }
}

/// One published SGIP incentive step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SgipSnapshot {
    pub id: String,
    pub effective_from: DateTime<Utc>,
    /// Incentive rate ($/Wh of usable capacity).
    pub usd_per_wh: f64,
    /// Per-project award cap ($).
    #[serde(default)]
    pub cap_usd: Option<f64>,
}

/// SGIP award inputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SgipAssumptions {
    pub snapshots: Vec<SgipSnapshot>,
    /// Usable share of nameplate kWh; 0.9 is assumed when absent.
    pub usable_fraction: Option<f64>,
}

/// Investment tax credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ItcAssumptions {
    pub itc_pct: f64,
    /// Share of the credit that reduces the depreciable basis.
    pub basis_reduction_pct: f64,
}

impl Default for ItcAssumptions {
    fn default() -> Self {
        Self {
            itc_pct: 0.30,
            basis_reduction_pct: 0.50,
        }
    }
}

/// MACRS recovery period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MacrsClass {
    #[default]
    FiveYear,
    SevenYear,
}

/// Accelerated depreciation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MacrsAssumptions {
    pub class: MacrsClass,
    /// Combined federal and state marginal rate.
    pub tax_rate: Option<f64>,
}

/// How capacity fade is handled over the horizon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradationMode {
    /// Augment every year to hold usable kWh.
    Hold,
    /// Let capacity fade, replace once below the end-of-life threshold.
    #[default]
    ReplaceAtEol,
    /// Let capacity fade with no capital response.
    FadeOnly,
}

/// Capacity fade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DegradationAssumptions {
    pub mode: DegradationMode,
    /// Compounding annual fade.
    pub annual_fade_pct: f64,
    /// Capacity fraction that triggers replacement.
    pub eol_pct: f64,
    /// Replacement cost as a share of capex.
    pub replacement_cost_pct: f64,
    /// Augmentation cost ($/kWh); falls back to the capex $/kWh.
    pub augmentation_per_kwh: Option<f64>,
}

impl Default for DegradationAssumptions {
    fn default() -> Self {
        Self {
            mode: DegradationMode::default(),
            annual_fade_pct: 0.02,
            eol_pct: 0.70,
            replacement_cost_pct: 0.60,
            augmentation_per_kwh: None,
        }
    }
}

/// Complete assumption set for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EconomicsAssumptions {
    pub capex: CapexAssumptions,
    pub opex: OpexAssumptions,
    pub finance: FinanceAssumptions,
    pub savings: SavingsAssumptions,
    pub sgip: Option<SgipAssumptions>,
    pub itc: Option<ItcAssumptions>,
    pub macrs: Option<MacrsAssumptions>,
    pub degradation: Option<DegradationAssumptions>,
}
