//! Technology cost projections and levelised cost estimates.
//!
//! Capital costs decline geometrically with each technology's learning rate; all other
//! cost fields are constants from the technology's parameter bundle. The LCOE estimate
//! is for reporting only and plays no part in allocation decisions.
use crate::technology::{Technology, TechnologyID};
use serde::Serialize;

/// Hours in a (non-leap) year, for converting capacity factors to annual energy
pub const HOURS_PER_YEAR: f64 = 8760.0;

/// A technology's costs evaluated for a particular year.
///
/// Derived on demand and never mutated.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CostSnapshot {
    /// The technology the snapshot belongs to
    pub technology_id: TechnologyID,
    /// The year the snapshot was evaluated for
    pub year: u32,
    /// Learning-curve-adjusted capital cost per MW
    pub capital_cost: f64,
    /// Annual fixed operating cost per MW (no time dependence)
    pub fixed_operating_cost: f64,
    /// Variable operating cost per MWh (no time dependence)
    pub variable_operating_cost: f64,
    /// Fuel cost per MWh (no time dependence)
    pub fuel_cost: f64,
    /// Levelised cost of energy in $/MWh; infinite if the technology produces no energy
    pub lcoe: f64,
}

/// Calculates the capital recovery factor (CRF) for a given lifetime and discount rate.
///
/// The CRF is used to annualize capital costs over the lifetime of an asset.
pub fn capital_recovery_factor(lifetime: u32, discount_rate: f64) -> f64 {
    if lifetime == 0 {
        return 0.0;
    }
    if discount_rate == 0.0 {
        return 1.0 / lifetime as f64;
    }
    let factor = (1.0 + discount_rate).powi(lifetime as i32);
    discount_rate * factor / (factor - 1.0)
}

/// The capital cost per MW for `year`, after learning-curve decline from the start year.
///
/// `capex(year) = capex_base * (1 - learning_rate)^(year - start_year)`
pub fn learning_adjusted_capital_cost(technology: &Technology, year: u32, start_year: u32) -> f64 {
    technology.capital_cost * (1.0 - technology.learning_rate).powi((year - start_year) as i32)
}

/// A simplified levelised cost of energy in $/MWh.
///
/// Annualised capital cost per MWh of annual output, plus variable O&M and fuel costs.
/// A technology with zero annual energy output has an infinite LCOE (it is economically
/// non-viable at zero output); this is a sentinel the caller can detect with
/// [`f64::is_infinite`], never a division fault.
pub fn levelised_cost(technology: &Technology, capital_cost: f64, discount_rate: f64) -> f64 {
    let crf = capital_recovery_factor(technology.lifetime, discount_rate);
    let annual_capital_cost = capital_cost * crf;
    let annual_energy = technology.capacity_factor * HOURS_PER_YEAR;
    if annual_energy == 0.0 {
        return f64::INFINITY;
    }

    annual_capital_cost / annual_energy
        + technology.variable_operating_cost
        + technology.fuel_cost
}

/// Evaluate a technology's cost snapshot for the given year.
pub fn cost_snapshot(
    technology_id: &TechnologyID,
    technology: &Technology,
    year: u32,
    start_year: u32,
    discount_rate: f64,
) -> CostSnapshot {
    let capital_cost = learning_adjusted_capital_cost(technology, year, start_year);
    CostSnapshot {
        technology_id: technology_id.clone(),
        year,
        capital_cost,
        fixed_operating_cost: technology.fixed_operating_cost,
        variable_operating_cost: technology.variable_operating_cost,
        fuel_cost: technology.fuel_cost,
        lcoe: levelised_cost(technology, capital_cost, discount_rate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::technology_map;
    use crate::technology::TechnologyMap;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0.05, 0.0)] // Edge case: lifetime==0
    #[case(10, 0.0, 0.1)] // Other edge case: discount_rate==0
    #[case(10, 0.05, 0.1295045749654567)]
    #[case(5, 0.03, 0.2183545714005762)]
    fn test_capital_recovery_factor(
        #[case] lifetime: u32,
        #[case] discount_rate: f64,
        #[case] expected: f64,
    ) {
        let result = capital_recovery_factor(lifetime, discount_rate);
        assert_approx_eq!(f64, result, expected, epsilon = 1e-10);
    }

    #[rstest]
    fn test_learning_curve_exact(technology_map: TechnologyMap) {
        // capex(y) = capex_base * (1 - learning_rate)^(y - start_year), exactly
        let start_year = 2025;
        for technology in technology_map.values() {
            for year in [2025, 2030, 2040, 2050] {
                let expected = technology.capital_cost
                    * (1.0 - technology.learning_rate).powi((year - start_year) as i32);
                let result = learning_adjusted_capital_cost(technology, year, start_year);
                assert_approx_eq!(f64, result, expected, epsilon = 1e-9);
            }
        }
    }

    #[rstest]
    fn test_learning_curve_start_year_identity(technology_map: TechnologyMap) {
        for technology in technology_map.values() {
            assert_eq!(
                learning_adjusted_capital_cost(technology, 2025, 2025),
                technology.capital_cost
            );
        }
    }

    #[rstest]
    fn test_levelised_cost(technology_map: TechnologyMap) {
        // Hand-computed for the fixture gas plant: capex 800000, lifetime 25, r = 0.07
        let gas = &technology_map["natural_gas_plant"];
        let crf = 0.07 * 1.07f64.powi(25) / (1.07f64.powi(25) - 1.0);
        let expected = 800000.0 * crf / (0.85 * HOURS_PER_YEAR) + 45.0 + 35.0;
        let result = levelised_cost(gas, gas.capital_cost, 0.07);
        assert_approx_eq!(f64, result, expected, epsilon = 1e-9);
    }

    #[rstest]
    fn test_levelised_cost_zero_output(technology_map: TechnologyMap) {
        // Zero capacity factor must yield the infinite sentinel, not a fault
        let mut gas = technology_map["natural_gas_plant"].clone();
        gas.capacity_factor = 0.0;
        assert!(levelised_cost(&gas, gas.capital_cost, 0.07).is_infinite());
    }

    #[rstest]
    fn test_cost_snapshot_passthrough(technology_map: TechnologyMap) {
        let (id, wind) = technology_map.get_key_value("wind_turbine").unwrap();
        let snapshot = cost_snapshot(id, wind, 2030, 2025, 0.07);
        assert_eq!(snapshot.year, 2030);
        assert_eq!(snapshot.fixed_operating_cost, wind.fixed_operating_cost);
        assert_eq!(snapshot.variable_operating_cost, wind.variable_operating_cost);
        assert_eq!(snapshot.fuel_cost, wind.fuel_cost);
        assert!(snapshot.capital_cost < wind.capital_cost); // learning has bitten
    }
}
