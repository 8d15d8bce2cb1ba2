//! Shared test fixtures for integration tests.
#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use storage_sizer::config::ScenarioConfig;
use storage_sizer::decision::DecisionRequest;
use storage_sizer::site::{
    BillingCycle, BillingDeterminants, CycleDeterminants, IntervalPoint, PriceSource,
    SupplyType, TariffSignals, TouPriceTable, TouPriceWindow,
};

/// Length of the reference billing cycle (days).
pub const CYCLE_DAYS: i64 = 30;

/// Start of the reference cycle (UTC midnight).
pub fn cycle_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap()
}

/// OFF 0-16 at $0.10, ON 16-21 at $0.30, OFF2 21-24 at $0.12.
pub fn tou_table() -> TouPriceTable {
    TouPriceTable {
        source: PriceSource::Delivery,
        windows: vec![
            TouPriceWindow::new("OFF", 0, 16, 0.10),
            TouPriceWindow::new("ON", 16, 21, 0.30),
            TouPriceWindow::new("OFF2", 21, 24, 0.12),
        ],
    }
}

/// Bundled tariff with the reference TOU table.
pub fn tou_tariff(demand_charge: Option<f64>) -> TariffSignals {
    TariffSignals {
        supply_type: SupplyType::Bundled,
        tables: vec![tou_table()],
        demand_charge_per_kw_month: demand_charge,
    }
}

/// Hourly load: 300 kW flat with a 500 kW spike at 17:00 every day.
pub fn reference_load(days: i64) -> Vec<IntervalPoint> {
    (0..days * 24)
        .map(|h| {
            let kw = if h % 24 == 17 { 500.0 } else { 300.0 };
            IntervalPoint::from_kw(cycle_start() + Duration::hours(h), 60, kw)
        })
        .collect()
}

/// The reference cycle as a complete billed cycle.
pub fn reference_cycle() -> BillingCycle {
    BillingCycle {
        label: "2024-07".to_string(),
        start: cycle_start(),
        end: cycle_start() + Duration::days(CYCLE_DAYS),
        timezone: chrono_tz::UTC,
    }
}

pub fn reference_determinants() -> BillingDeterminants {
    BillingDeterminants {
        cycles: vec![CycleDeterminants {
            cycle: reference_cycle(),
            complete: true,
            billed_demand_kw: None,
        }],
        ..BillingDeterminants::default()
    }
}

/// A 500 kW peak site on the reference TOU tariff with a $20/kW-month
/// demand charge and baseline cost assumptions.
pub fn reference_request() -> DecisionRequest {
    let baseline = ScenarioConfig::baseline();
    DecisionRequest {
        intervals: Some(reference_load(CYCLE_DAYS)),
        tariff: Some(tou_tariff(Some(20.0))),
        determinants: Some(reference_determinants()),
        economics: baseline.economics,
        ..DecisionRequest::new(
            cycle_start() + Duration::days(CYCLE_DAYS),
            chrono_tz::UTC,
        )
    }
}
