//! Synthetic hourly demand and renewable-availability profiles.
//!
//! Profiles are generated from an explicitly seeded random number generator so that runs
//! are reproducible: generating twice with the same seed and configuration yields
//! bit-identical output. Demand profiles cover every (region, year) pair in the planning
//! horizon; renewable profiles are generated once and reused for all years.
use crate::region::{DemandShape, Region, RegionID, RegionMap};
use indexmap::IndexMap;
use rand::Rng;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// The number of hourly values in each daily profile
pub const HOURS_PER_DAY: usize = 24;

/// Hourly demand values in MW, keyed by (region, year).
///
/// Invariant: every (region, year) pair passed to the generator has exactly
/// [`HOURS_PER_DAY`] entries.
#[derive(Debug, Clone, PartialEq)]
pub struct DemandProfile(IndexMap<(RegionID, u32), [f64; HOURS_PER_DAY]>);

impl DemandProfile {
    /// Get the hourly demand values for the given region and year, if present
    pub fn get(&self, region_id: &RegionID, year: u32) -> Option<&[f64; HOURS_PER_DAY]> {
        self.0.get(&(region_id.clone(), year))
    }

    /// Iterate over all (region, year) entries in generation order
    pub fn iter(&self) -> impl Iterator<Item = (&(RegionID, u32), &[f64; HOURS_PER_DAY])> {
        self.0.iter()
    }
}

/// Hourly availability factors for the variable renewable technologies.
///
/// Values are fractions of nameplate capacity: wind is clamped to [0.05, 0.8] and solar
/// to [0, 0.9], with solar fixed at zero outside daylight hours.
#[derive(Debug, Clone, PartialEq)]
pub struct RenewableProfile {
    /// Hourly wind availability factors
    pub wind: [f64; HOURS_PER_DAY],
    /// Hourly solar availability factors
    pub solar: [f64; HOURS_PER_DAY],
}

impl RenewableProfile {
    /// Mean wind availability over the day (the realised capacity factor)
    pub fn wind_capacity_factor(&self) -> f64 {
        self.wind.iter().sum::<f64>() / HOURS_PER_DAY as f64
    }

    /// Mean solar availability over the day (the realised capacity factor)
    pub fn solar_capacity_factor(&self) -> f64 {
        self.solar.iter().sum::<f64>() / HOURS_PER_DAY as f64
    }
}

/// Draw a sample from a normal distribution via the Box-Muller transform
fn sample_normal(rng: &mut StdRng, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.gen_range(f64::MIN_POSITIVE..1.0);
    let u2: f64 = rng.gen_range(0.0..1.0);
    let standard = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + std_dev * standard
}

/// The hourly demand multiplier for a region, floored at the region's demand floor
fn demand_multiplier(rng: &mut StdRng, region: &Region, hour: usize) -> f64 {
    let multiplier = match region.shape {
        DemandShape::Flat => sample_normal(rng, 1.0, 0.05),
        DemandShape::Peaked => match hour {
            6..=9 => sample_normal(rng, 1.4, 0.1),   // morning peak
            17..=21 => sample_normal(rng, 1.6, 0.1), // evening peak
            22..=23 | 0..=5 => sample_normal(rng, 0.6, 0.05), // night
            _ => sample_normal(rng, 1.0, 0.1),
        },
    };

    multiplier.max(region.demand_floor)
}

/// Generate the demand profile for every (region, year) pair.
///
/// The base demand level grows geometrically with `growth_rate` from the first year of
/// `years`, less each region's annual efficiency decline; the hourly value is the base
/// times a random shape multiplier (see [`demand_multiplier`]).
///
/// # Arguments
///
/// * `regions` - The demand regions
/// * `years` - The planning years, ascending; the first is the base year
/// * `growth_rate` - Annual demand growth rate
/// * `seed` - Seed for the generation pass
pub fn generate_demand_profile(
    regions: &RegionMap,
    years: &[u32],
    growth_rate: f64,
    seed: u64,
) -> DemandProfile {
    let mut rng = StdRng::seed_from_u64(seed);
    let start_year = years.first().copied().unwrap_or_default();

    let mut profile = IndexMap::new();
    for (region_id, region) in regions {
        for &year in years {
            let elapsed = (year - start_year) as f64;
            let growth = (1.0 + growth_rate).powf(elapsed);
            let efficiency = 1.0 - region.efficiency_decline * elapsed;
            let base = region.base_demand * growth * efficiency;

            let mut hours = [0.0; HOURS_PER_DAY];
            for (hour, value) in hours.iter_mut().enumerate() {
                *value = base * demand_multiplier(&mut rng, region, hour);
            }
            profile.insert((region_id.clone(), year), hours);
        }
    }

    DemandProfile(profile)
}

/// Generate the hourly wind and solar availability profile.
///
/// Wind is higher at night; solar follows a parabolic daylight curve peaking at noon.
/// The profile is time-invariant across years.
pub fn generate_renewable_profile(seed: u64) -> RenewableProfile {
    let mut rng = StdRng::seed_from_u64(seed);

    let mut wind = [0.0; HOURS_PER_DAY];
    for (hour, value) in wind.iter_mut().enumerate() {
        let base = if hour <= 6 || hour >= 20 { 0.4 } else { 0.25 };
        let factor = base * (1.0 + sample_normal(&mut rng, 0.0, 0.3));
        *value = factor.clamp(0.05, 0.8);
    }

    let mut solar = [0.0; HOURS_PER_DAY];
    for (hour, value) in solar.iter_mut().enumerate() {
        *value = if (6..=18).contains(&hour) {
            let sun_angle = 1.0 - (hour as f64 - 12.0).abs() / 6.0;
            let factor = 0.8 * sun_angle.powi(2) * (1.0 + sample_normal(&mut rng, 0.0, 0.2));
            factor.clamp(0.0, 0.9)
        } else {
            0.0
        };
    }

    RenewableProfile { wind, solar }
}
