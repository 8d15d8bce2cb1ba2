use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Physical parameters of a battery under evaluation.
///
/// # Energy Convention
/// - Charging draws grid kWh; the store gains `grid_kwh * rte`
/// - Discharging delivers kWh to the site one-for-one from the store
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryParams {
    /// Maximum charge/discharge power in kilowatts.
    pub power_kw: f64,
    /// Nameplate energy in kilowatt-hours.
    pub energy_kwh: f64,
    /// Round-trip efficiency (0..=1.0).
    pub rte: f64,
    /// Lower state-of-charge bound as a fraction.
    pub min_soc: f64,
    /// Upper state-of-charge bound as a fraction.
    pub max_soc: f64,
}

/// Reasons a parameter set cannot be simulated.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InvalidBattery {
    #[error("power must be finite and > 0, got {0}")]
    Power(f64),
    #[error("energy must be finite and > 0, got {0}")]
    Energy(f64),
    #[error("round-trip efficiency must be in (0, 1], got {0}")]
    Rte(f64),
    #[error("SOC window must satisfy 0 <= min < max <= 1, got [{0}, {1}]")]
    SocWindow(f64, f64),
}

impl BatteryParams {
    /// Checks the parameters without panicking.
    ///
    /// # Errors
    ///
    /// Returns the first violated bound.
    pub fn validate(&self) -> Result<(), InvalidBattery> {
        if !(self.power_kw.is_finite() && self.power_kw > 0.0) {
            return Err(InvalidBattery::Power(self.power_kw));
        }
        if !(self.energy_kwh.is_finite() && self.energy_kwh > 0.0) {
            return Err(InvalidBattery::Energy(self.energy_kwh));
        }
        if !(self.rte > 0.0 && self.rte <= 1.0) {
            return Err(InvalidBattery::Rte(self.rte));
        }
        if !(self.min_soc >= 0.0 && self.min_soc < self.max_soc && self.max_soc <= 1.0) {
            return Err(InvalidBattery::SocWindow(self.min_soc, self.max_soc));
        }
        Ok(())
    }

    pub fn min_stored_kwh(&self) -> f64 {
        self.energy_kwh * self.min_soc
    }

    pub fn max_stored_kwh(&self) -> f64 {
        self.energy_kwh * self.max_soc
    }

    /// Energy usable between the SOC bounds.
    pub fn usable_kwh(&self) -> f64 {
        self.max_stored_kwh() - self.min_stored_kwh()
    }
}

/// Technology assumptions shared by every candidate in a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryTechnology {
    pub chemistry: String,
    pub rte: f64,
    pub min_soc: f64,
    pub max_soc: f64,
}

impl Default for BatteryTechnology {
    fn default() -> Self {
        Self {
            chemistry: "LFP".to_string(),
            rte: 0.90,
            min_soc: 0.0,
            max_soc: 1.0,
        }
    }
}

impl BatteryTechnology {
    /// Physical parameters for a candidate size.
    pub fn params_for(&self, kw: f64, kwh: f64) -> BatteryParams {
        BatteryParams {
            power_kw: kw,
            energy_kwh: kwh,
            rte: self.rte,
            min_soc: self.min_soc,
            max_soc: self.max_soc,
        }
    }
}

/// Stored energy bounded to the SOC window of a [`BatteryParams`].
#[derive(Debug, Clone)]
pub struct StorageState {
    params: BatteryParams,
    stored_kwh: f64,
}

impl StorageState {
    /// Starts the store empty (at `min_soc`).
    pub fn at_min(params: BatteryParams) -> Self {
        Self {
            stored_kwh: params.min_stored_kwh(),
            params,
        }
    }

    /// Starts the store full (at `max_soc`).
    pub fn at_max(params: BatteryParams) -> Self {
        Self {
            stored_kwh: params.max_stored_kwh(),
            params,
        }
    }

    pub fn stored_kwh(&self) -> f64 {
        self.stored_kwh
    }

    /// Discharges for one interval and returns kWh delivered.
    ///
    /// # Arguments
    ///
    /// * `hours` - Interval duration
    /// * `limit_kwh` - Additional cap (e.g. the site load over the interval)
    pub fn discharge(&mut self, hours: f64, limit_kwh: f64) -> f64 {
        let available = (self.stored_kwh - self.params.min_stored_kwh()).max(0.0);
        let kwh = (self.params.power_kw * hours).min(available).min(limit_kwh.max(0.0));
        self.stored_kwh = (self.stored_kwh - kwh).max(self.params.min_stored_kwh());
        kwh
    }

    /// Charges for one interval and returns grid kWh consumed.
    pub fn charge(&mut self, hours: f64) -> f64 {
        let headroom = (self.params.max_stored_kwh() - self.stored_kwh).max(0.0);
        let grid_kwh = (self.params.power_kw * hours).min(headroom / self.params.rte);
        self.stored_kwh = (self.stored_kwh + grid_kwh * self.params.rte)
            .min(self.params.max_stored_kwh());
        grid_kwh
    }
}
