//! TOML-based scenario configuration and preset definitions.
//!
//! A scenario describes a site (timezone, synthetic load, tariff, billing),
//! the battery technology, sizing and acceptance policy, and the economics
//! assumptions. [`ScenarioConfig::to_request`] turns it into a
//! [`DecisionRequest`] for the orchestrator.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use thiserror::Error;

use crate::battery::{BatteryTechnology, HardConstraints};
use crate::decision::{DEFAULT_AUDIT_CAP, DecisionRequest, EngineVersions, GatePolicy};
use crate::economics::EconomicsAssumptions;
use crate::economics::assumptions::{CapexAssumptions, ItcAssumptions};
use crate::site::{
    BillingCycle, BillingDeterminants, CycleDeterminants, DrReadiness, PriceSource, SupplyType,
    TariffSignals, TouPriceTable, TouPriceWindow,
};
use crate::synth::{LoadShape, SyntheticLoad};

/// Length of the closed billing cycle built from the synthetic data.
const CYCLE_DAYS: i64 = 30;

/// Top-level scenario configuration parsed from TOML.
///
/// Every section has defaults. A file without a `[tariff]` section describes
/// a site with no tariff signals at all.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioConfig {
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub load: LoadShape,
    #[serde(default)]
    pub tariff: Option<TariffSignals>,
    #[serde(default)]
    pub billing: Option<BillingConfig>,
    #[serde(default)]
    pub dr: Option<DrReadiness>,
    #[serde(default)]
    pub constraints: HardConstraints,
    #[serde(default)]
    pub battery: BatteryTechnology,
    /// Acceptance gate; its band also bounds candidate generation.
    #[serde(default)]
    pub gate: GatePolicy,
    #[serde(default)]
    pub economics: EconomicsAssumptions,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Site location and synthetic metering window.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    pub timezone: Tz,
    /// First interval (UTC).
    pub start: DateTime<Utc>,
    /// Days of synthetic interval data (must be > 0).
    pub days: u32,
    /// Interval length; must divide an hour.
    pub interval_minutes: u32,
    /// Master random seed.
    pub seed: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::America::Los_Angeles,
            // 2024-06-01T07:00:00Z, local midnight in Pacific daylight time.
            start: DateTime::from_timestamp(1_717_225_200, 0).unwrap_or_default(),
            days: 60,
            interval_minutes: 15,
            seed: 42,
        }
    }
}

/// Billing determinants for the synthetic site.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BillingConfig {
    /// Close the final 30 days as a complete billed cycle.
    pub close_last_cycle: bool,
    pub billed_demand_kw: Option<f64>,
    pub ratchet_method_indicated: bool,
    pub ratchet_demand_kw: Option<f64>,
    pub ratchet_history_kw: Vec<f64>,
    pub ratchet_percent: Option<f64>,
    pub ratchet_savings_eligible: bool,
}

/// Output tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Maximum audit line items in the pack.
    pub audit_cap: usize,
    pub tariff_snapshot: Option<String>,
    pub sgip_snapshot: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            audit_cap: DEFAULT_AUDIT_CAP,
            tariff_snapshot: None,
            sgip_snapshot: None,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"site.days"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

fn tou_tariff(source: PriceSource, windows: Vec<TouPriceWindow>, demand: f64) -> TariffSignals {
    TariffSignals {
        supply_type: SupplyType::Bundled,
        tables: vec![TouPriceTable { source, windows }],
        demand_charge_per_kw_month: Some(demand),
    }
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self::baseline()
    }
}

impl ScenarioConfig {
    /// Bundled TOU site with a $20/kW-month demand charge.
    pub fn baseline() -> Self {
        Self {
            site: SiteConfig::default(),
            load: LoadShape::default(),
            tariff: Some(tou_tariff(
                PriceSource::Delivery,
                vec![
                    TouPriceWindow::new("OFF", 0, 16, 0.10),
                    TouPriceWindow::new("ON", 16, 21, 0.30),
                    TouPriceWindow::new("OFF2", 21, 24, 0.12),
                ],
                20.0,
            )),
            billing: Some(BillingConfig {
                close_last_cycle: true,
                ..BillingConfig::default()
            }),
            dr: None,
            constraints: HardConstraints::default(),
            battery: BatteryTechnology::default(),
            gate: GatePolicy::default(),
            economics: EconomicsAssumptions {
                capex: CapexAssumptions {
                    per_kw: Some(250.0),
                    per_kwh: Some(300.0),
                    ..CapexAssumptions::default()
                },
                itc: Some(ItcAssumptions::default()),
                ..EconomicsAssumptions::default()
            },
            output: OutputConfig::default(),
        }
    }

    /// Demand charge only: no TOU price table, battery shaves peaks.
    pub fn demand_only() -> Self {
        Self {
            tariff: Some(TariffSignals {
                supply_type: SupplyType::Bundled,
                tables: Vec::new(),
                demand_charge_per_kw_month: Some(25.0),
            }),
            ..Self::baseline()
        }
    }

    /// A single all-day energy price; arbitrage is disabled.
    pub fn flat_rate() -> Self {
        Self {
            tariff: Some(tou_tariff(
                PriceSource::Delivery,
                vec![TouPriceWindow::new("ALL", 0, 0, 0.15)],
                18.0,
            )),
            ..Self::baseline()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "demand_only", "flat_rate"];

    /// Loads a scenario from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "demand_only" => Ok(Self::demand_only()),
            "flat_rate" => Ok(Self::flat_rate()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a scenario from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("scenario", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a scenario from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let s = &self.site;
        if s.days == 0 {
            errors.push(ConfigError::new("site.days", "must be > 0"));
        }
        if s.interval_minutes == 0 || 60 % s.interval_minutes != 0 {
            errors.push(ConfigError::new(
                "site.interval_minutes",
                format!("must divide 60, got {}", s.interval_minutes),
            ));
        }

        let l = &self.load;
        if l.base_kw <= 0.0 {
            errors.push(ConfigError::new("load.base_kw", "must be > 0"));
        }
        if l.amp_kw < 0.0 || l.noise_std < 0.0 {
            errors.push(ConfigError::new("load.amp_kw", "amplitude and noise must be >= 0"));
        }
        if !(0.0..24.0).contains(&l.peak_hour) {
            errors.push(ConfigError::new("load.peak_hour", "must be in [0, 24)"));
        }

        if let Some(t) = &self.tariff {
            for (i, table) in t.tables.iter().enumerate() {
                for (j, w) in table.windows.iter().enumerate() {
                    let field = format!("tariff.tables[{i}].windows[{j}]");
                    if w.start_hour > 24 || w.end_hour > 24 {
                        errors.push(ConfigError::new(&field, "hours must be <= 24"));
                    }
                    if w.price_per_kwh.is_nan() || w.price_per_kwh < 0.0 {
                        errors.push(ConfigError::new(&field, "price_per_kwh must be >= 0"));
                    }
                }
                for id in table.conflicting_periods() {
                    errors.push(ConfigError::new(
                        format!("tariff.tables[{i}].windows"),
                        format!("period {id} has more than one price"),
                    ));
                }
            }
            if t.demand_charge_per_kw_month.is_some_and(|d| d < 0.0) {
                errors.push(ConfigError::new(
                    "tariff.demand_charge_per_kw_month",
                    "must be >= 0",
                ));
            }
        }

        let b = &self.battery;
        if !(b.rte > 0.0 && b.rte <= 1.0) {
            errors.push(ConfigError::new("battery.rte", "must be in (0.0, 1.0]"));
        }
        if !(0.0 <= b.min_soc && b.min_soc < b.max_soc && b.max_soc <= 1.0) {
            errors.push(ConfigError::new(
                "battery.min_soc",
                "must satisfy 0 <= min_soc < max_soc <= 1",
            ));
        }

        let band = &self.gate.band;
        if !(0.0 < band.min_coverage_pct && band.min_coverage_pct <= band.max_coverage_pct) {
            errors.push(ConfigError::new(
                "gate.band.min_coverage_pct",
                "must be > 0 and <= gate.band.max_coverage_pct",
            ));
        }

        let f = &self.economics.finance;
        if f.analysis_years == 0 {
            errors.push(ConfigError::new("economics.finance.analysis_years", "must be > 0"));
        }
        if f.discount_rate <= -1.0 {
            errors.push(ConfigError::new("economics.finance.discount_rate", "must be > -1"));
        }

        if self.output.audit_cap == 0 {
            errors.push(ConfigError::new("output.audit_cap", "must be > 0"));
        }

        errors
    }

    fn determinants(&self, end: DateTime<Utc>) -> Option<BillingDeterminants> {
        let b = self.billing.as_ref()?;
        let cycles = if b.close_last_cycle {
            let start = end - Duration::days(CYCLE_DAYS);
            vec![CycleDeterminants {
                cycle: BillingCycle {
                    label: format!("cycle-{}", start.format("%Y-%m")),
                    start,
                    end,
                    timezone: self.site.timezone,
                },
                complete: true,
                billed_demand_kw: b.billed_demand_kw,
            }]
        } else {
            Vec::new()
        };
        Some(BillingDeterminants {
            cycles,
            billed_demand_kw: b.billed_demand_kw,
            ratchet_method_indicated: b.ratchet_method_indicated,
            ratchet_demand_kw: b.ratchet_demand_kw,
            ratchet_history_kw: b.ratchet_history_kw.clone(),
            ratchet_percent: b.ratchet_percent,
            ratchet_savings_eligible: b.ratchet_savings_eligible,
        })
    }

    /// Synthesises the interval data and builds the orchestrator request.
    pub fn to_request(&self) -> DecisionRequest {
        let s = &self.site;
        let intervals =
            SyntheticLoad::new(self.load.clone(), s.interval_minutes, s.timezone, s.seed)
                .generate(s.start, s.days);
        let end = s.start + Duration::days(i64::from(s.days));

        DecisionRequest {
            intervals: Some(intervals),
            tariff: self.tariff.clone(),
            determinants: self.determinants(end),
            dr: self.dr.clone(),
            constraints: self.constraints.clone(),
            battery: self.battery.clone(),
            band: self.gate.band,
            gate: self.gate.clone(),
            economics: self.economics.clone(),
            audit_cap: self.output.audit_cap,
            versions: EngineVersions {
                tariff_snapshot: self.output.tariff_snapshot.clone(),
                sgip_snapshot: self.output.sgip_snapshot.clone(),
                ..EngineVersions::default()
            },
            ..DecisionRequest::new(end, s.timezone)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = ScenarioConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let e = ScenarioConfig::from_preset("nonexistent").unwrap_err();
        assert_eq!(e.field, "preset");
        assert!(e.message.contains("unknown preset"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in ScenarioConfig::PRESETS {
            let cfg = ScenarioConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn demand_only_has_no_price_table() {
        let cfg = ScenarioConfig::demand_only();
        let tariff = cfg.tariff.as_ref().unwrap();
        assert!(tariff.preferred_table().is_none());
        assert_eq!(tariff.demand_charge_per_kw_month, Some(25.0));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[site]
timezone = "America/New_York"
start = "2024-03-01T05:00:00Z"
days = 35
interval_minutes = 60
seed = 7

[load]
base_kw = 800.0
amp_kw = 300.0

[tariff]
supply_type = "cca"
demand_charge_per_kw_month = 22.5

[[tariff.tables]]
source = "generation_all_in"

[[tariff.tables.windows]]
period_id = "OFF"
start_hour = 21
end_hour = 16
days = "all"
price_per_kwh = 0.11

[[tariff.tables.windows]]
period_id = "ON"
start_hour = 16
end_hour = 21
days = "all"
price_per_kwh = 0.34

[gate]
max_payback_years = 10.0

[economics.capex]
per_kwh = 410.0
"#;
        let cfg = ScenarioConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.unwrap();
        assert_eq!(cfg.site.timezone, chrono_tz::America::New_York);
        assert_eq!(cfg.site.days, 35);
        assert_eq!(cfg.load.peak_hour, 17.0);
        let tariff = cfg.tariff.as_ref().unwrap();
        assert_eq!(tariff.supply_type, SupplyType::Cca);
        assert_eq!(tariff.tables[0].windows.len(), 2);
        assert_eq!(cfg.gate.max_payback_years, 10.0);
        assert_eq!(cfg.gate.npv_floor_usd, 0.0);
        assert_eq!(cfg.economics.capex.per_kwh, Some(410.0));
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn missing_tariff_section_means_no_tariff() {
        let cfg = ScenarioConfig::from_toml_str("[site]\nseed = 99\n").unwrap();
        assert!(cfg.tariff.is_none());
        assert_eq!(cfg.site.seed, 99);
        assert_eq!(cfg.site.interval_minutes, 15);
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[site]
days = 30
bogus_field = true
"#;
        let e = ScenarioConfig::from_toml_str(toml).unwrap_err();
        assert_eq!(e.field, "toml");
    }

    #[test]
    fn validation_collects_every_error() {
        let mut cfg = ScenarioConfig::baseline();
        cfg.site.days = 0;
        cfg.site.interval_minutes = 7;
        cfg.battery.rte = 1.5;
        cfg.output.audit_cap = 0;
        let fields: Vec<String> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                "site.days",
                "site.interval_minutes",
                "battery.rte",
                "output.audit_cap"
            ]
        );
    }

    #[test]
    fn validation_catches_negative_price() {
        let mut cfg = ScenarioConfig::flat_rate();
        if let Some(t) = cfg.tariff.as_mut() {
            t.tables[0].windows[0].price_per_kwh = -0.01;
        }
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "tariff.tables[0].windows[0]"));
    }

    #[test]
    fn validation_catches_period_with_two_prices() {
        let mut cfg = ScenarioConfig::baseline();
        if let Some(t) = cfg.tariff.as_mut() {
            t.tables[0].windows[2].period_id = "OFF".into();
        }
        let errors = cfg.validate();
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert_eq!(errors[0].field, "tariff.tables[0].windows");
        assert!(errors[0].message.contains("OFF"));
    }

    #[test]
    fn request_covers_configured_window() {
        let cfg = ScenarioConfig::baseline();
        let req = cfg.to_request();
        let points = req.intervals.as_ref().unwrap();
        assert_eq!(points.len(), 60 * 96);
        assert_eq!(req.as_of, cfg.site.start + Duration::days(60));
        let det = req.determinants.as_ref().unwrap();
        let cycle = det.latest_complete_cycle().unwrap();
        assert_eq!(cycle.cycle.end, req.as_of);
        assert_eq!(cycle.cycle.days(), 30.0);
        assert_eq!(req.band, cfg.gate.band);
    }

    #[test]
    fn same_seed_same_request() {
        let cfg = ScenarioConfig::baseline();
        assert_eq!(cfg.to_request(), cfg.to_request());
        let mut other = cfg.clone();
        other.site.seed = 43;
        assert_ne!(cfg.to_request().intervals, other.to_request().intervals);
    }
}
