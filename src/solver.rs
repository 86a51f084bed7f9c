//! Least-cost capacity and activity tables from an LP solve.
//!
//! The problem is small: one capacity and one activity variable per (region,
//! technology, year), a demand-balance equality per (region, year) and an availability
//! limit tying activity to installed capacity. If the solver does not return an optimal
//! solution the caller falls back to the heuristic allocation in [`crate::dispatch`].
use crate::costs::{HOURS_PER_YEAR, capital_recovery_factor, learning_adjusted_capital_cost};
use crate::dispatch::{allocate_generation, renewable_target_share};
use crate::model::Model;
use crate::region::RegionID;
use crate::technology::TechnologyID;
use anyhow::{Context, Result, ensure};
use highs::{HighsModelStatus, RowProblem as Problem, Sense};
use indexmap::IndexMap;

/// The inputs to a solve: the model plus the energy to serve per (region, year)
pub struct SolveInputs<'a> {
    /// The loaded model
    pub model: &'a Model,
    /// Energy demand in MWh, keyed by (region, year)
    pub demand: IndexMap<(RegionID, u32), f64>,
}

/// Installed capacity for one (region, technology, year)
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityEntry {
    /// The region the capacity serves
    pub region_id: RegionID,
    /// The technology installed
    pub technology_id: TechnologyID,
    /// The year of the entry
    pub year: u32,
    /// Installed capacity in MW
    pub capacity: f64,
}

/// Generation for one (region, technology, year)
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityEntry {
    /// The region the generation serves
    pub region_id: RegionID,
    /// The generating technology
    pub technology_id: TechnologyID,
    /// The year of the entry
    pub year: u32,
    /// Generation in MWh
    pub activity: f64,
}

/// The capacity and activity tables produced by a solve or by the fallback
pub struct SolvedTables {
    /// Total annualised system cost
    pub objective: f64,
    /// Installed capacity per (region, technology, year)
    pub capacity: Vec<CapacityEntry>,
    /// Generation per (region, technology, year)
    pub activity: Vec<ActivityEntry>,
    /// Whether the tables came from the heuristic fallback rather than the solver
    pub is_fallback: bool,
}

/// One (capacity, activity) column pair and its position in the solution array
struct SolveVariable {
    region_id: RegionID,
    technology_id: TechnologyID,
    year: u32,
    capacity_index: usize,
    activity_index: usize,
    capacity_cost: f64,
    activity_cost: f64,
}

/// Solve for the least-cost capacity and activity tables.
///
/// Returns an error if the solver terminates with any status other than optimal;
/// callers should fall back to [`fallback_tables`] in that case.
pub fn solve(inputs: &SolveInputs) -> Result<SolvedTables> {
    let model = inputs.model;
    let start_year = model.start_year();
    let mut problem = Problem::default();

    // One (capacity, activity) column pair per (region, technology, year). Columns come
    // back from the solver in insertion order, so record each pair's index along with
    // its cost coefficients to recover the tables and the objective.
    let mut variables = Vec::new();
    let mut next_index = 0;
    for ((region_id, year), &demand) in &inputs.demand {
        ensure!(
            demand.is_finite() && demand >= 0.0,
            "Demand for ({region_id}, {year}) must be finite and non-negative"
        );

        let mut balance = Vec::new();
        for (technology_id, technology) in &model.technologies {
            let capital_cost = learning_adjusted_capital_cost(technology, *year, start_year);
            let crf = capital_recovery_factor(technology.lifetime, model.discount_rate);
            let capacity_cost = capital_cost * crf + technology.fixed_operating_cost;
            let activity_cost = technology.variable_operating_cost + technology.fuel_cost;

            let capacity = problem.add_column(capacity_cost, 0.0..);
            let activity = problem.add_column(activity_cost, 0.0..);
            variables.push(SolveVariable {
                region_id: region_id.clone(),
                technology_id: technology_id.clone(),
                year: *year,
                capacity_index: next_index,
                activity_index: next_index + 1,
                capacity_cost,
                activity_cost,
            });
            next_index += 2;

            // Activity cannot exceed what the capacity can produce over the year
            problem.add_row(
                ..=0.0,
                [
                    (activity, 1.0),
                    (capacity, -technology.capacity_factor * HOURS_PER_YEAR),
                ],
            );
            balance.push((activity, 1.0));
        }

        problem.add_row(demand..=demand, balance);
    }

    let solution = problem.optimise(Sense::Minimise).solve();
    match solution.status() {
        HighsModelStatus::Optimal => (),
        status => anyhow::bail!("Could not find optimal result for problem. Status: {status:?}"),
    }

    let solution = solution.get_solution();
    let columns = solution.columns();
    let mut objective = 0.0;
    let mut capacity_table = Vec::with_capacity(variables.len());
    let mut activity_table = Vec::with_capacity(variables.len());
    for variable in variables {
        let capacity_value = columns[variable.capacity_index];
        let activity_value = columns[variable.activity_index];
        objective +=
            variable.capacity_cost * capacity_value + variable.activity_cost * activity_value;

        capacity_table.push(CapacityEntry {
            region_id: variable.region_id.clone(),
            technology_id: variable.technology_id.clone(),
            year: variable.year,
            capacity: capacity_value,
        });
        activity_table.push(ActivityEntry {
            region_id: variable.region_id,
            technology_id: variable.technology_id,
            year: variable.year,
            activity: activity_value,
        });
    }

    Ok(SolvedTables {
        objective,
        capacity: capacity_table,
        activity: activity_table,
        is_fallback: false,
    })
}

/// Build capacity and activity tables from the heuristic allocation rules.
///
/// Each region's demand is split with [`allocate_generation`] and the capacity sized to
/// produce that energy at the technology's capacity factor. A technology with zero
/// capacity factor gets zero capacity rather than a division fault.
pub fn fallback_tables(
    model: &Model,
    demand: &IndexMap<(RegionID, u32), f64>,
) -> Result<SolvedTables> {
    let start_year = model.start_year();
    let mut objective = 0.0;
    let mut capacity_table = Vec::new();
    let mut activity_table = Vec::new();

    for ((region_id, year), &region_demand) in demand {
        let target_share = renewable_target_share(&model.renewable_targets, *year);
        let mix = allocate_generation(&model.technologies, model.variant, region_demand, target_share)
            .with_context(|| format!("Fallback allocation failed for ({region_id}, {year})"))?;

        for (technology_id, generation) in mix {
            let technology = &model.technologies[&technology_id];
            let annual_energy = technology.capacity_factor * HOURS_PER_YEAR;
            let capacity = if annual_energy > 0.0 {
                generation / annual_energy
            } else {
                0.0
            };

            let capital_cost = learning_adjusted_capital_cost(technology, *year, start_year);
            let crf = capital_recovery_factor(technology.lifetime, model.discount_rate);
            objective += capacity * (capital_cost * crf + technology.fixed_operating_cost)
                + generation * (technology.variable_operating_cost + technology.fuel_cost);

            capacity_table.push(CapacityEntry {
                region_id: region_id.clone(),
                technology_id: technology_id.clone(),
                year: *year,
                capacity,
            });
            activity_table.push(ActivityEntry {
                region_id: region_id.clone(),
                technology_id,
                year: *year,
                activity: generation,
            });
        }
    }

    Ok(SolvedTables {
        objective,
        capacity: capacity_table,
        activity: activity_table,
        is_fallback: true,
    })
}
