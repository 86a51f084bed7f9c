//! Emissions accounting and progress tracking against carbon-reduction targets.
use crate::dispatch::GenerationMix;
use crate::model::CarbonTarget;
use crate::technology::{TechnologyID, TechnologyMap};
use anyhow::{Context, Result};
use indexmap::IndexMap;

/// Fraction of the target a scenario may fall short by and still count as on track
const ON_TRACK_TOLERANCE: f64 = 0.9;

/// Emissions metrics derived from a generation mix. Immutable once computed.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionsResult {
    /// Total emissions in tonnes of CO2
    pub total: f64,
    /// Emissions per unit generation in kg CO2 per MWh; zero when there is no generation
    pub carbon_intensity: f64,
    /// Emissions in tonnes per technology
    pub by_technology: IndexMap<TechnologyID, f64>,
    /// Fraction of generation from renewable technologies; zero when there is no generation
    pub renewable_share: f64,
}

/// Compute emissions and renewable share for a generation mix.
///
/// Emissions per technology are `generation * intensity / 1000` (kg to tonnes). The
/// intensity and share metrics are defined as zero for an all-zero mix rather than
/// faulting on division by zero.
pub fn calculate_emissions(
    mix: &GenerationMix,
    technologies: &TechnologyMap,
) -> Result<EmissionsResult> {
    let mut by_technology = IndexMap::new();
    let mut total = 0.0;
    let mut total_generation = 0.0;
    let mut renewable_generation = 0.0;

    for (technology_id, generation) in mix {
        let technology = technologies
            .get(technology_id)
            .with_context(|| format!("Unknown technology {technology_id} in generation mix"))?;

        let emissions = generation * technology.co2_intensity / 1000.0;
        by_technology.insert(technology_id.clone(), emissions);
        total += emissions;
        total_generation += generation;
        if technology.kind.is_renewable() {
            renewable_generation += generation;
        }
    }

    let (carbon_intensity, renewable_share) = if total_generation > 0.0 {
        (
            total / total_generation * 1000.0,
            renewable_generation / total_generation,
        )
    } else {
        (0.0, 0.0)
    };

    Ok(EmissionsResult {
        total,
        carbon_intensity,
        by_technology,
        renewable_share,
    })
}

/// Progress against one carbon-reduction target.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEntry {
    /// The year the target applies to
    pub target_year: u32,
    /// The modelled year the target was evaluated at (the latest year at or before the
    /// target year)
    pub evaluated_year: u32,
    /// The targeted fractional reduction from baseline emissions
    pub target_reduction: f64,
    /// The achieved fractional reduction from baseline emissions
    pub achieved_reduction: f64,
    /// Whether the achieved reduction is within tolerance of the target
    pub on_track: bool,
}

/// The fractional emissions reduction achieved relative to a baseline.
///
/// Defined as zero when the baseline itself is zero.
pub fn achieved_reduction(baseline: f64, current: f64) -> f64 {
    if baseline == 0.0 {
        return 0.0;
    }
    1.0 - current / baseline
}

/// Whether an achieved reduction satisfies a target, within the 10% tolerance band
pub fn is_on_track(achieved: f64, target: f64) -> bool {
    achieved >= target * ON_TRACK_TOLERANCE
}

/// Evaluate every carbon target against the yearly emissions series.
///
/// `yearly_totals` must be ascending by year. Each target is evaluated at the latest
/// modelled year at or before the target year; targets preceding the whole series are
/// skipped.
pub fn track_progress(
    baseline: f64,
    targets: &[CarbonTarget],
    yearly_totals: &[(u32, f64)],
) -> Vec<ProgressEntry> {
    let mut progress = Vec::new();
    for target in targets {
        let Some(&(evaluated_year, current)) = yearly_totals
            .iter()
            .rev()
            .find(|(year, _)| *year <= target.year)
        else {
            continue;
        };

        let achieved = achieved_reduction(baseline, current);
        progress.push(ProgressEntry {
            target_year: target.year,
            evaluated_year,
            target_reduction: target.reduction,
            achieved_reduction: achieved,
            on_track: is_on_track(achieved, target.reduction),
        });
    }

    progress
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::technology_map;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_calculate_emissions(technology_map: TechnologyMap) {
        // The worked 2025 baseline example: demand 4000 MWh, target share 0.40
        let demand = 4000.0;
        let mix = GenerationMix::from([
            ("wind_turbine".into(), demand * 0.3 * 0.4),
            ("solar_pv".into(), demand * 0.2 * 0.4),
            ("natural_gas_plant".into(), demand * 0.8),
        ]);

        let result = calculate_emissions(&mix, &technology_map).unwrap();

        // Hand-computed: wind 480 MWh * 11, solar 320 MWh * 41, gas 3200 MWh * 354 (kg)
        let expected_total = (480.0 * 11.0 + 320.0 * 41.0 + 3200.0 * 354.0) / 1000.0;
        let total_generation = 480.0 + 320.0 + 3200.0;
        assert_approx_eq!(f64, result.total, expected_total, epsilon = 1e-6);
        assert_approx_eq!(
            f64,
            result.carbon_intensity,
            expected_total / total_generation * 1000.0,
            epsilon = 1e-6
        );
        assert_approx_eq!(
            f64,
            result.renewable_share,
            (480.0 + 320.0) / total_generation,
            epsilon = 1e-6
        );
        assert_approx_eq!(
            f64,
            result.by_technology["natural_gas_plant"],
            3200.0 * 354.0 / 1000.0,
            epsilon = 1e-6
        );
    }

    #[rstest]
    fn test_renewable_share_in_unit_range(technology_map: TechnologyMap) {
        for (wind, solar, gas) in [(1.0, 1.0, 1.0), (500.0, 0.0, 0.0), (0.0, 0.0, 1000.0)] {
            let mix = GenerationMix::from([
                ("wind_turbine".into(), wind),
                ("solar_pv".into(), solar),
                ("natural_gas_plant".into(), gas),
            ]);
            let result = calculate_emissions(&mix, &technology_map).unwrap();
            assert!((0.0..=1.0).contains(&result.renewable_share));
        }
    }

    #[rstest]
    fn test_zero_generation_degenerate_case(technology_map: TechnologyMap) {
        let mix = GenerationMix::from([
            ("wind_turbine".into(), 0.0),
            ("solar_pv".into(), 0.0),
            ("natural_gas_plant".into(), 0.0),
        ]);

        let result = calculate_emissions(&mix, &technology_map).unwrap();
        assert_eq!(result.total, 0.0);
        assert_eq!(result.carbon_intensity, 0.0);
        assert_eq!(result.renewable_share, 0.0);
    }

    #[rstest]
    fn test_unknown_technology(technology_map: TechnologyMap) {
        let mix = GenerationMix::from([("fusion_reactor".into(), 100.0)]);
        assert!(calculate_emissions(&mix, &technology_map).is_err());
    }

    #[test]
    fn test_achieved_reduction() {
        // The worked progress example: 1000 t baseline, 600 t current
        let achieved = achieved_reduction(1000.0, 600.0);
        assert_approx_eq!(f64, achieved, 0.40);
        // Target 0.50: 0.40 < 0.45, so not on track
        assert!(!is_on_track(achieved, 0.50));
        // Within the 10% tolerance band
        assert!(is_on_track(0.46, 0.50));
    }

    #[test]
    fn test_achieved_reduction_zero_baseline() {
        assert_eq!(achieved_reduction(0.0, 100.0), 0.0);
    }

    #[test]
    fn test_track_progress() {
        let targets = [
            CarbonTarget {
                year: 2030,
                reduction: 0.50,
            },
            CarbonTarget {
                year: 2040,
                reduction: 0.75,
            },
        ];
        let yearly_totals = [(2025, 1000.0), (2030, 600.0), (2035, 300.0)];

        let progress = track_progress(1000.0, &targets, &yearly_totals);
        assert_eq!(progress.len(), 2);

        assert_eq!(progress[0].evaluated_year, 2030);
        assert_approx_eq!(f64, progress[0].achieved_reduction, 0.40);
        assert!(!progress[0].on_track);

        // The 2040 target is evaluated at the latest modelled year, 2035
        assert_eq!(progress[1].evaluated_year, 2035);
        assert_approx_eq!(f64, progress[1].achieved_reduction, 0.70);
        assert!(progress[1].on_track); // 0.70 >= 0.75 * 0.9
    }

    #[test]
    fn test_track_progress_target_before_series() {
        let targets = [CarbonTarget {
            year: 2020,
            reduction: 0.10,
        }];
        assert!(track_progress(1000.0, &targets, &[(2025, 900.0)]).is_empty());
    }
}
