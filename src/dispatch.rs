//! The heuristic generation mix allocator.
//!
//! This is an explicit rule-based split of demand across technology kinds, not an
//! optimiser. The allocated quantities are deliberately not normalised to sum to total
//! demand (the storage variant over-allocates); downstream emissions and renewable-share
//! metrics are defined relative to the mix as allocated, so rebalancing here would
//! silently change them.
use crate::model::{RenewableTarget, ScenarioVariant};
use crate::technology::{TechnologyID, TechnologyKind, TechnologyMap, technology_of_kind};
use anyhow::{Context, Result};
use indexmap::IndexMap;

/// Generation per technology in MWh for one (scenario, year)
pub type GenerationMix = IndexMap<TechnologyID, f64>;

/// The renewable-share target applying to `year`.
///
/// Targets are keyed by the year they must be met; a query year is governed by the first
/// target at or after it. Years beyond the last target keep the last target's share.
pub fn renewable_target_share(targets: &[RenewableTarget], year: u32) -> f64 {
    targets
        .iter()
        .find(|target| year <= target.year)
        .or_else(|| targets.last())
        .map(|target| target.share)
        .unwrap_or_default()
}

/// Split total demand into a generation mix using the variant's fixed proportions.
///
/// # Arguments
///
/// * `technologies` - The available technologies (one per kind)
/// * `variant` - Which allocation rules to apply
/// * `demand` - Total system demand in MWh for the year
/// * `target_share` - The renewable-share target for the year
pub fn allocate_generation(
    technologies: &TechnologyMap,
    variant: ScenarioVariant,
    demand: f64,
    target_share: f64,
) -> Result<GenerationMix> {
    let id_of = |kind| {
        technology_of_kind(technologies, kind)
            .map(|(id, _)| id.clone())
            .with_context(|| format!("No technology of kind {kind:?}"))
    };

    let mut mix = GenerationMix::new();
    match variant {
        ScenarioVariant::Baseline => {
            mix.insert(id_of(TechnologyKind::Wind)?, demand * 0.3 * target_share);
            mix.insert(id_of(TechnologyKind::Solar)?, demand * 0.2 * target_share);
            mix.insert(id_of(TechnologyKind::Gas)?, demand * (1.0 - target_share * 0.5));
        }
        ScenarioVariant::BatteryStorage => {
            mix.insert(id_of(TechnologyKind::Wind)?, demand * 0.4 * target_share);
            mix.insert(id_of(TechnologyKind::Solar)?, demand * 0.3 * target_share);
            mix.insert(id_of(TechnologyKind::Storage)?, demand * 0.1);
            mix.insert(id_of(TechnologyKind::Gas)?, demand * (1.0 - target_share * 0.7));
        }
    }

    Ok(mix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{storage_technology_map, technology_map};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn targets() -> Vec<RenewableTarget> {
        [(2030, 0.40), (2040, 0.70), (2050, 0.85)]
            .into_iter()
            .map(|(year, share)| RenewableTarget { year, share })
            .collect()
    }

    #[rstest]
    #[case(2025, 0.40)]
    #[case(2030, 0.40)]
    #[case(2031, 0.70)]
    #[case(2040, 0.70)]
    #[case(2050, 0.85)]
    #[case(2060, 0.85)] // beyond the last target
    fn test_renewable_target_share(#[case] year: u32, #[case] expected: f64) {
        assert_eq!(renewable_target_share(&targets(), year), expected);
    }

    #[test]
    fn test_renewable_target_share_empty() {
        assert_eq!(renewable_target_share(&[], 2030), 0.0);
    }

    #[rstest]
    fn test_allocate_baseline(technology_map: TechnologyMap) {
        let demand = 4000.0;
        let mix =
            allocate_generation(&technology_map, ScenarioVariant::Baseline, demand, 0.4).unwrap();

        assert_eq!(mix.len(), 3);
        assert_approx_eq!(f64, mix["wind_turbine"], demand * 0.3 * 0.4);
        assert_approx_eq!(f64, mix["solar_pv"], demand * 0.2 * 0.4);
        assert_approx_eq!(f64, mix["natural_gas_plant"], demand * 0.8);
    }

    #[rstest]
    fn test_allocate_storage(storage_technology_map: TechnologyMap) {
        let demand = 4000.0;
        let mix = allocate_generation(
            &storage_technology_map,
            ScenarioVariant::BatteryStorage,
            demand,
            0.7,
        )
        .unwrap();

        assert_eq!(mix.len(), 4);
        assert_approx_eq!(f64, mix["wind_turbine"], demand * 0.4 * 0.7);
        assert_approx_eq!(f64, mix["solar_pv"], demand * 0.3 * 0.7);
        assert_approx_eq!(f64, mix["battery_storage"], demand * 0.1);
        assert_approx_eq!(f64, mix["natural_gas_plant"], demand * (1.0 - 0.7 * 0.7));
    }

    #[rstest]
    fn test_allocate_storage_variant_requires_storage(technology_map: TechnologyMap) {
        // The fixture map has no storage technology
        assert!(
            allocate_generation(&technology_map, ScenarioVariant::BatteryStorage, 100.0, 0.4)
                .is_err()
        );
    }

    #[rstest]
    fn test_baseline_mix_conserves_demand(technology_map: TechnologyMap) {
        // The baseline proportions happen to sum to one for any target share
        let demand = 1000.0;
        let mix =
            allocate_generation(&technology_map, ScenarioVariant::Baseline, demand, 0.4).unwrap();
        let total: f64 = mix.values().sum();
        assert_approx_eq!(f64, total, demand, epsilon = 1e-9);
    }

    #[rstest]
    fn test_storage_mix_not_normalised(storage_technology_map: TechnologyMap) {
        // The storage variant intentionally over-allocates relative to demand
        let demand = 1000.0;
        let mix = allocate_generation(
            &storage_technology_map,
            ScenarioVariant::BatteryStorage,
            demand,
            0.4,
        )
        .unwrap();
        let total: f64 = mix.values().sum();
        assert!(total > demand);
    }
}
