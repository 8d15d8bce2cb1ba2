//! Time-of-use price windows, tables and tariff-level price signals.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, Timelike, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Day-of-week applicability of a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayFilter {
    All,
    Weekday,
    Weekend,
}

impl DayFilter {
    fn matches(self, weekday: Weekday) -> bool {
        let weekend = matches!(weekday, Weekday::Sat | Weekday::Sun);
        match self {
            Self::All => true,
            Self::Weekday => !weekend,
            Self::Weekend => weekend,
        }
    }
}

/// One priced TOU window in local time.
///
/// `start_hour > end_hour` wraps past midnight; `start_hour == end_hour`
/// covers the whole day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouPriceWindow {
    pub period_id: String,
    pub start_hour: u8,
    pub end_hour: u8,
    pub days: DayFilter,
    pub price_per_kwh: f64,
}

impl TouPriceWindow {
    pub fn new(period_id: &str, start_hour: u8, end_hour: u8, price_per_kwh: f64) -> Self {
        Self {
            period_id: period_id.to_string(),
            start_hour,
            end_hour,
            days: DayFilter::All,
            price_per_kwh,
        }
    }

    fn covers_hour(&self, hour: u8) -> bool {
        use std::cmp::Ordering;
        match self.start_hour.cmp(&self.end_hour) {
            Ordering::Less => hour >= self.start_hour && hour < self.end_hour,
            Ordering::Greater => hour >= self.start_hour || hour < self.end_hour,
            Ordering::Equal => true,
        }
    }

    /// Whether the window applies at a local hour on a given weekday.
    pub fn matches(&self, hour: u8, weekday: Weekday) -> bool {
        self.days.matches(weekday) && self.covers_hour(hour)
    }
}

/// Provenance of a price table, in descending order of preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    GenerationWithExitFees,
    GenerationAllIn,
    GenerationEnergyOnly,
    Delivery,
}

impl PriceSource {
    pub fn is_generation(self) -> bool {
        !matches!(self, Self::Delivery)
    }
}

/// Why a timestamp could not be classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouMatchError {
    Unmatched,
    Ambiguous,
}

impl fmt::Display for TouMatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unmatched => write!(f, "no TOU window matches"),
            Self::Ambiguous => write!(f, "more than one TOU window matches"),
        }
    }
}

/// A complete TOU price table from one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TouPriceTable {
    pub source: PriceSource,
    pub windows: Vec<TouPriceWindow>,
}

impl TouPriceTable {
    /// Classifies a timestamp; exactly one window must match.
    pub fn classify<T: chrono::TimeZone>(
        &self,
        at: &DateTime<T>,
        tz: Tz,
    ) -> Result<&TouPriceWindow, TouMatchError> {
        let local = at.with_timezone(&tz);
        let hour = local.hour() as u8;
        let weekday = local.weekday();
        let mut found = None;
        for w in &self.windows {
            if w.matches(hour, weekday) {
                if found.is_some() {
                    return Err(TouMatchError::Ambiguous);
                }
                found = Some(w);
            }
        }
        found.ok_or(TouMatchError::Unmatched)
    }

    /// Price per period id. A period id whose windows disagree on price is
    /// left out, so energy booked against it stays unpriced.
    pub fn period_prices(&self) -> BTreeMap<String, f64> {
        let conflicting = self.conflicting_periods();
        let mut out = BTreeMap::new();
        for w in &self.windows {
            if !conflicting.contains(&w.period_id.as_str()) {
                out.entry(w.period_id.clone()).or_insert(w.price_per_kwh);
            }
        }
        out
    }

    /// Period ids carried by windows with different prices, in id order.
    pub fn conflicting_periods(&self) -> Vec<&str> {
        let mut seen: BTreeMap<&str, f64> = BTreeMap::new();
        let mut out = Vec::new();
        for w in &self.windows {
            let id = w.period_id.as_str();
            match seen.get(id) {
                Some(p) if *p != w.price_per_kwh && !out.contains(&id) => out.push(id),
                Some(_) => {}
                None => {
                    seen.insert(id, w.price_per_kwh);
                }
            }
        }
        out.sort_unstable();
        out
    }

    /// `(min, max)` price across all windows, if any.
    pub fn price_bounds(&self) -> Option<(f64, f64)> {
        self.windows.iter().fold(None, |acc, w| {
            let p = w.price_per_kwh;
            Some(match acc {
                None => (p, p),
                Some((lo, hi)) => (f64::min(lo, p), f64::max(hi, p)),
            })
        })
    }
}

/// Generation supply arrangement at the site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplyType {
    #[default]
    Bundled,
    Cca,
    DirectAccess,
}

/// Composed tariff price signals for one site.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TariffSignals {
    pub supply_type: SupplyType,
    pub tables: Vec<TouPriceTable>,
    /// Demand charge ($/kW-month).
    pub demand_charge_per_kw_month: Option<f64>,
}

impl TariffSignals {
    /// Picks the most preferred non-empty table.
    pub fn preferred_table(&self) -> Option<&TouPriceTable> {
        self.tables
            .iter()
            .filter(|t| !t.windows.is_empty())
            .min_by_key(|t| t.source)
    }

    /// True when a CCA/DA site is priced on delivery rates alone.
    pub fn lacks_generation_rates(&self) -> bool {
        self.supply_type != SupplyType::Bundled
            && self
                .preferred_table()
                .is_some_and(|t| !t.source.is_generation())
    }
}
