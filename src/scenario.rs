//! Scenario execution: per-year analysis plus cross-year aggregation.
//!
//! A scenario run walks the milestone years in order, computing demand statistics, the
//! generation mix, cost snapshots and emissions for each. A failure in one year is
//! logged and the year skipped; the run only fails outright if no year succeeds.
use crate::costs::{CostSnapshot, cost_snapshot};
use crate::dispatch::{GenerationMix, allocate_generation, renewable_target_share};
use crate::emissions::{EmissionsResult, ProgressEntry, calculate_emissions, track_progress};
use crate::model::Model;
use crate::profiles::{
    DemandProfile, HOURS_PER_DAY, RenewableProfile, generate_demand_profile,
    generate_renewable_profile,
};
use crate::region::RegionID;
use crate::solver::{SolveInputs, SolvedTables, fallback_tables, solve};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use log::{error, info, warn};

/// Summary statistics for one region's daily demand profile
#[derive(Debug, Clone, PartialEq)]
pub struct DemandAnalysis {
    /// Total energy over the day in MWh
    pub total_daily_mwh: f64,
    /// The highest hourly demand in MW
    pub peak_mw: f64,
    /// The lowest hourly demand in MW
    pub min_mw: f64,
    /// Mean demand as a fraction of peak demand; zero when the peak is zero
    pub load_factor: f64,
    /// This region's fraction of total system demand for the year
    pub demand_share: f64,
}

impl DemandAnalysis {
    /// Statistics for one region's daily profile; the share is filled in once the
    /// system total for the year is known
    fn from_hours(hours: &[f64; HOURS_PER_DAY]) -> Self {
        let total_daily_mwh: f64 = hours.iter().sum();
        let peak_mw = hours.iter().copied().fold(f64::MIN, f64::max);
        let min_mw = hours.iter().copied().fold(f64::MAX, f64::min);
        let mean = total_daily_mwh / HOURS_PER_DAY as f64;
        let load_factor = if peak_mw > 0.0 { mean / peak_mw } else { 0.0 };

        Self {
            total_daily_mwh,
            peak_mw,
            min_mw,
            load_factor,
            demand_share: 0.0,
        }
    }
}

/// Everything computed for a single milestone year
#[derive(Debug, Clone, PartialEq)]
pub struct YearResult {
    /// The milestone year
    pub year: u32,
    /// Demand statistics per region
    pub demand: IndexMap<RegionID, DemandAnalysis>,
    /// Peak of the combined hourly demand across regions in MW
    pub system_peak_mw: f64,
    /// Total daily demand across regions in MWh
    pub total_demand_mwh: f64,
    /// The allocated generation mix
    pub mix: GenerationMix,
    /// Cost snapshots for every technology
    pub cost_snapshots: Vec<CostSnapshot>,
    /// Emissions metrics for the mix
    pub emissions: EmissionsResult,
}

/// Realised capacity factors from the renewable availability profile
#[derive(Debug, Clone, PartialEq)]
pub struct RenewableAnalysis {
    /// Mean wind availability over the day
    pub wind_capacity_factor: f64,
    /// Mean solar availability over the day
    pub solar_capacity_factor: f64,
    /// Mean of the wind and solar capacity factors
    pub combined_capacity_factor: f64,
    /// How well wind and solar complement each other: `1 - corr(wind, solar)`, so 0 for
    /// perfectly aligned resources and 2 for perfectly opposed ones
    pub resource_complementarity: f64,
}

impl RenewableAnalysis {
    fn from_profile(profile: &RenewableProfile) -> Self {
        let wind_capacity_factor = profile.wind_capacity_factor();
        let solar_capacity_factor = profile.solar_capacity_factor();
        Self {
            wind_capacity_factor,
            solar_capacity_factor,
            combined_capacity_factor: (wind_capacity_factor + solar_capacity_factor) / 2.0,
            resource_complementarity: 1.0 - pearson_correlation(&profile.wind, &profile.solar),
        }
    }
}

/// Pearson correlation coefficient of two equal-length series.
///
/// Defined as zero when either series has no variance.
fn pearson_correlation(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut variance_x = 0.0;
    let mut variance_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        covariance += dx * dy;
        variance_x += dx * dx;
        variance_y += dy * dy;
    }

    let denominator = (variance_x * variance_y).sqrt();
    if denominator == 0.0 {
        return 0.0;
    }
    covariance / denominator
}

/// Scenario-level metrics aggregated across the completed years
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryMetrics {
    /// Total emissions over all completed years in tonnes
    pub cumulative_emissions: f64,
    /// Mean renewable share over the completed years
    pub average_renewable_share: f64,
    /// System peak demand in the final completed year in MW
    pub final_year_peak_demand: f64,
    /// Final-year system peak as a multiple of final-year mean demand; zero when there
    /// is no demand
    pub peak_to_average_ratio: f64,
    /// Configured total demand growth over the horizon, `(1+g)^(end - start)`
    pub demand_growth_factor: f64,
}

/// The complete output of a scenario run
pub struct ScenarioResult {
    /// The scenario name, copied from the model
    pub scenario_name: String,
    /// Per-year results, ascending by year; failed years are absent
    pub years: Vec<YearResult>,
    /// Realised renewable capacity factors
    pub renewables: RenewableAnalysis,
    /// Progress against the model's carbon targets
    pub progress: Vec<ProgressEntry>,
    /// Least-cost capacity and activity tables (or the heuristic fallback)
    pub tables: SolvedTables,
    /// Cross-year summary metrics
    pub summary: SummaryMetrics,
}

/// Run the scenario described by `model`.
///
/// The first completed year's emissions serve as the baseline for progress tracking. If
/// the LP solve fails, the capacity and activity tables are rebuilt from the heuristic
/// allocation instead.
pub fn run_scenario(model: &Model) -> Result<ScenarioResult> {
    info!("Running scenario: {}", model.scenario_name);

    let demand_profile = generate_demand_profile(
        &model.regions,
        &model.milestone_years,
        model.growth_rate,
        model.seed,
    );
    let renewable_profile = generate_renewable_profile(model.seed);

    run_with_profiles(model, &demand_profile, &renewable_profile)
}

/// Run the scenario against pre-generated profiles.
///
/// A year whose computation fails is logged and skipped; the run only fails if no year
/// completes.
fn run_with_profiles(
    model: &Model,
    demand_profile: &DemandProfile,
    renewable_profile: &RenewableProfile,
) -> Result<ScenarioResult> {
    let mut years = Vec::new();
    for &year in &model.milestone_years {
        info!("Milestone year: {year}");
        match compute_year(model, demand_profile, year) {
            Ok(result) => years.push(result),
            Err(err) => error!("Year {year} failed and will be skipped: {err:?}"),
        }
    }
    ensure!(!years.is_empty(), "No milestone year completed successfully");

    let baseline = years[0].emissions.total;
    let yearly_totals: Vec<_> = years
        .iter()
        .map(|result| (result.year, result.emissions.total))
        .collect();
    let progress = track_progress(baseline, &model.carbon_targets, &yearly_totals);

    let demand: IndexMap<_, _> = demand_profile
        .iter()
        .map(|(key, hours)| (key.clone(), hours.iter().sum::<f64>()))
        .collect();
    let tables = match solve(&SolveInputs { model, demand: demand.clone() }) {
        Ok(tables) => tables,
        Err(err) => {
            warn!("LP solve failed ({err}); falling back to heuristic tables");
            fallback_tables(model, &demand)?
        }
    };

    let summary = summarise(model, &years);

    Ok(ScenarioResult {
        scenario_name: model.scenario_name.clone(),
        years,
        renewables: RenewableAnalysis::from_profile(renewable_profile),
        progress,
        tables,
        summary,
    })
}

/// Compute the demand statistics, mix, costs and emissions for one milestone year
fn compute_year(model: &Model, demand_profile: &DemandProfile, year: u32) -> Result<YearResult> {
    let mut demand = IndexMap::new();
    let mut combined = [0.0; HOURS_PER_DAY];
    for region_id in model.regions.keys() {
        let hours = demand_profile
            .get(region_id, year)
            .with_context(|| format!("No demand profile for ({region_id}, {year})"))?;
        for (total, value) in combined.iter_mut().zip(hours) {
            *total += value;
        }
        demand.insert(region_id.clone(), DemandAnalysis::from_hours(hours));
    }

    let total_demand_mwh: f64 = demand.values().map(|analysis| analysis.total_daily_mwh).sum();
    let system_peak_mw = combined.iter().copied().fold(f64::MIN, f64::max);
    if total_demand_mwh > 0.0 {
        for analysis in demand.values_mut() {
            analysis.demand_share = analysis.total_daily_mwh / total_demand_mwh;
        }
    }

    let target_share = renewable_target_share(&model.renewable_targets, year);
    let mix = allocate_generation(&model.technologies, model.variant, total_demand_mwh, target_share)?;
    let emissions = calculate_emissions(&mix, &model.technologies)?;

    let cost_snapshots = model
        .technologies
        .iter()
        .map(|(technology_id, technology)| {
            cost_snapshot(
                technology_id,
                technology,
                year,
                model.start_year(),
                model.discount_rate,
            )
        })
        .collect();

    Ok(YearResult {
        year,
        demand,
        system_peak_mw,
        total_demand_mwh,
        mix,
        cost_snapshots,
        emissions,
    })
}

/// Aggregate the per-year results into scenario-level metrics.
///
/// `years` must be non-empty.
fn summarise(model: &Model, years: &[YearResult]) -> SummaryMetrics {
    let cumulative_emissions = years.iter().map(|year| year.emissions.total).sum();
    let average_renewable_share = years
        .iter()
        .map(|year| year.emissions.renewable_share)
        .sum::<f64>()
        / years.len() as f64;

    let last = &years[years.len() - 1];
    let horizon = model.end_year() - model.start_year();
    let demand_growth_factor = (1.0 + model.growth_rate).powi(horizon as i32);
    let mean_demand = last.total_demand_mwh / HOURS_PER_DAY as f64;
    let peak_to_average_ratio = if mean_demand > 0.0 {
        last.system_peak_mw / mean_demand
    } else {
        0.0
    };

    SummaryMetrics {
        cumulative_emissions,
        average_renewable_share,
        final_year_peak_demand: last.system_peak_mw,
        peak_to_average_ratio,
        demand_growth_factor,
    }
}
