//! Useful fixtures for tests.
//!
//! Tests import these with `use crate::fixture::*` or specific imports. Fixtures are
//! intended to be used with the `rstest` crate.
use crate::model::{CarbonTarget, Model, RenewableTarget, ScenarioVariant};
use crate::region::{DemandShape, Region, RegionMap};
use crate::technology::{Technology, TechnologyKind, TechnologyMap};
use rstest::fixture;

/// Assert that the result of an operation is an error with the given message
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

#[fixture]
pub fn region_map() -> RegionMap {
    RegionMap::from([
        (
            "Industrial".into(),
            Region {
                id: "Industrial".into(),
                description: "Industrial demand region".into(),
                base_demand: 100.0,
                shape: DemandShape::Flat,
                demand_floor: 0.8,
                efficiency_decline: 0.0,
            },
        ),
        (
            "Residential".into(),
            Region {
                id: "Residential".into(),
                description: "Residential demand region".into(),
                base_demand: 80.0,
                shape: DemandShape::Peaked,
                demand_floor: 0.4,
                efficiency_decline: 0.005,
            },
        ),
    ])
}

#[fixture]
pub fn technology_map() -> TechnologyMap {
    TechnologyMap::from([
        (
            "natural_gas_plant".into(),
            Technology {
                id: "natural_gas_plant".into(),
                description: "Natural gas plant".into(),
                kind: TechnologyKind::Gas,
                capacity_factor: 0.85,
                efficiency: 0.45,
                capital_cost: 800000.0,
                fixed_operating_cost: 12000.0,
                variable_operating_cost: 45.0,
                fuel_cost: 35.0,
                co2_intensity: 354.0,
                lifetime: 25,
                learning_rate: 0.0,
            },
        ),
        (
            "wind_turbine".into(),
            Technology {
                id: "wind_turbine".into(),
                description: "Onshore wind".into(),
                kind: TechnologyKind::Wind,
                capacity_factor: 0.35,
                efficiency: 1.0,
                capital_cost: 1500000.0,
                fixed_operating_cost: 25000.0,
                variable_operating_cost: 25.0,
                fuel_cost: 0.0,
                co2_intensity: 11.0,
                lifetime: 20,
                learning_rate: 0.08,
            },
        ),
        (
            "solar_pv".into(),
            Technology {
                id: "solar_pv".into(),
                description: "Solar PV".into(),
                kind: TechnologyKind::Solar,
                capacity_factor: 0.22,
                efficiency: 1.0,
                capital_cost: 1200000.0,
                fixed_operating_cost: 15000.0,
                variable_operating_cost: 15.0,
                fuel_cost: 0.0,
                co2_intensity: 41.0,
                lifetime: 25,
                learning_rate: 0.15,
            },
        ),
    ])
}

#[fixture]
pub fn storage_technology_map(mut technology_map: TechnologyMap) -> TechnologyMap {
    technology_map.insert(
        "battery_storage".into(),
        Technology {
            id: "battery_storage".into(),
            description: "Grid-scale battery".into(),
            kind: TechnologyKind::Storage,
            capacity_factor: 0.85,
            efficiency: 0.9,
            capital_cost: 600000.0,
            fixed_operating_cost: 10000.0,
            variable_operating_cost: 5.0,
            fuel_cost: 0.0,
            co2_intensity: 0.0,
            lifetime: 15,
            learning_rate: 0.1,
        },
    );
    technology_map
}

#[fixture]
pub fn model(region_map: RegionMap, technology_map: TechnologyMap) -> Model {
    Model {
        scenario_name: "test_scenario".into(),
        variant: ScenarioVariant::Baseline,
        milestone_years: vec![2025],
        growth_rate: 0.023,
        seed: 42,
        discount_rate: 0.07,
        regions: region_map,
        technologies: technology_map,
        renewable_targets: [(2030, 0.40), (2040, 0.70), (2050, 0.85)]
            .into_iter()
            .map(|(year, share)| RenewableTarget { year, share })
            .collect(),
        carbon_targets: [(2030, 0.50), (2040, 0.75), (2050, 0.90)]
            .into_iter()
            .map(|(year, reduction)| CarbonTarget { year, reduction })
            .collect(),
    }
}
