//! Code for loading and validating scenario models.
//!
//! A model lives in a directory containing `model.toml` plus CSV files for regions,
//! technologies and (optionally) policy targets. Invalid static configuration fails
//! fast here; everything downstream of a successfully loaded model recovers locally.
use crate::input::{deserialise_proportion, is_sorted_and_unique, read_toml, read_vec_from_csv};
use crate::region::{RegionMap, read_regions};
use crate::technology::{TechnologyKind, TechnologyMap, read_technologies, technology_of_kind};
use anyhow::{Context, Result, ensure};
use itertools::Itertools;
use log::warn;
use serde::Deserialize;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::path::Path;

const MODEL_FILE_NAME: &str = "model.toml";
const RENEWABLE_TARGETS_FILE_NAME: &str = "renewable_targets.csv";
const CARBON_TARGETS_FILE_NAME: &str = "carbon_targets.csv";

/// Renewable-share targets used when the model provides no target file
const DEFAULT_RENEWABLE_TARGETS: [(u32, f64); 3] = [(2030, 0.40), (2040, 0.70), (2050, 0.85)];

/// Carbon-reduction targets used when the model provides no target file
const DEFAULT_CARBON_TARGETS: [(u32, f64); 3] = [(2030, 0.50), (2040, 0.75), (2050, 0.90)];

/// The scenario variant, which selects the generation mix allocation rules
#[derive(Debug, Clone, Copy, PartialEq, SerializeLabeledStringEnum, DeserializeLabeledStringEnum)]
pub enum ScenarioVariant {
    /// Gas/wind/solar only
    #[string = "baseline"]
    Baseline,
    /// Adds battery storage and a more aggressive renewable build-out
    #[string = "battery_storage"]
    BatteryStorage,
}

/// A year-keyed renewable-share target
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RenewableTarget {
    /// The year by which the target should be met
    pub year: u32,
    /// The targeted renewable share of generation
    #[serde(deserialize_with = "deserialise_proportion")]
    pub share: f64,
}

/// A year-keyed carbon-reduction target, relative to the baseline year's emissions
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CarbonTarget {
    /// The year by which the target should be met
    pub year: u32,
    /// The targeted fractional reduction in emissions
    #[serde(deserialize_with = "deserialise_proportion")]
    pub reduction: f64,
}

/// Model definition
#[derive(Debug)]
pub struct Model {
    /// The scenario name, used to key all output rows
    pub scenario_name: String,
    /// Which allocation rules to apply
    pub variant: ScenarioVariant,
    /// The years of the planning horizon, in ascending order
    pub milestone_years: Vec<u32>,
    /// Annual demand growth rate
    pub growth_rate: f64,
    /// Seed for all synthetic profile generation
    pub seed: u64,
    /// Discount rate used for capital recovery
    pub discount_rate: f64,
    /// The demand regions
    pub regions: RegionMap,
    /// The available technologies
    pub technologies: TechnologyMap,
    /// Year-keyed renewable-share targets, ascending by year
    pub renewable_targets: Vec<RenewableTarget>,
    /// Year-keyed carbon-reduction targets, ascending by year
    pub carbon_targets: Vec<CarbonTarget>,
}

/// Represents the contents of the entire model file.
#[derive(Debug, Deserialize, PartialEq)]
struct ModelFile {
    scenario: ScenarioSection,
    years: YearsSection,
    demand: DemandSection,
    #[serde(default)]
    finance: FinanceSection,
}

/// The "scenario" section of the model file
#[derive(Debug, Deserialize, PartialEq)]
struct ScenarioSection {
    name: String,
    variant: ScenarioVariant,
}

/// The "years" section of the model file
#[derive(Debug, Deserialize, PartialEq)]
struct YearsSection {
    milestones: Vec<u32>,
}

/// The "demand" section of the model file
#[derive(Debug, Deserialize, PartialEq)]
struct DemandSection {
    growth_rate: f64,
    seed: u64,
}

/// The "finance" section of the model file
#[derive(Debug, Deserialize, PartialEq)]
struct FinanceSection {
    discount_rate: f64,
}

impl Default for FinanceSection {
    fn default() -> Self {
        Self {
            discount_rate: 0.07,
        }
    }
}

impl Model {
    /// Read a model from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
        let model_dir = model_dir.as_ref();
        let file_path = model_dir.join(MODEL_FILE_NAME);
        let model_file: ModelFile = read_toml(&file_path)?;

        check_milestone_years(&model_file.years.milestones)
            .with_context(|| format!("Invalid milestone years in {}", file_path.display()))?;
        ensure!(
            model_file.demand.growth_rate.is_finite() && model_file.demand.growth_rate > -1.0,
            "growth_rate must be finite and greater than -1"
        );
        ensure!(
            model_file.finance.discount_rate.is_finite() && model_file.finance.discount_rate >= 0.0,
            "discount_rate must be finite and non-negative"
        );

        let regions = read_regions(model_dir)?;
        let technologies = read_technologies(model_dir)?;
        check_required_kinds(&technologies, model_file.scenario.variant)?;

        let renewable_targets: Vec<RenewableTarget> = read_targets(
            &model_dir.join(RENEWABLE_TARGETS_FILE_NAME),
            &DEFAULT_RENEWABLE_TARGETS,
            |(year, share)| RenewableTarget { year, share },
        )?;
        let carbon_targets: Vec<CarbonTarget> = read_targets(
            &model_dir.join(CARBON_TARGETS_FILE_NAME),
            &DEFAULT_CARBON_TARGETS,
            |(year, reduction)| CarbonTarget { year, reduction },
        )?;
        ensure!(
            is_sorted_and_unique(&renewable_targets.iter().map(|t| t.year).collect_vec()),
            "Renewable targets must have unique years in ascending order"
        );
        ensure!(
            is_sorted_and_unique(&carbon_targets.iter().map(|t| t.year).collect_vec()),
            "Carbon targets must have unique years in ascending order"
        );

        Ok(Model {
            scenario_name: model_file.scenario.name,
            variant: model_file.scenario.variant,
            milestone_years: model_file.years.milestones,
            growth_rate: model_file.demand.growth_rate,
            seed: model_file.demand.seed,
            discount_rate: model_file.finance.discount_rate,
            regions,
            technologies,
            renewable_targets,
            carbon_targets,
        })
    }

    /// The first year of the planning horizon
    pub fn start_year(&self) -> u32 {
        *self
            .milestone_years
            .first()
            .expect("Milestone years cannot be empty")
    }

    /// The final year of the planning horizon
    pub fn end_year(&self) -> u32 {
        *self
            .milestone_years
            .last()
            .expect("Milestone years cannot be empty")
    }
}

/// Check that the milestone years parameter is valid
fn check_milestone_years(years: &[u32]) -> Result<()> {
    ensure!(!years.is_empty(), "milestones is empty");
    ensure!(
        is_sorted_and_unique(years),
        "milestones must be composed of unique values in order"
    );

    Ok(())
}

/// Check that the technologies required by the scenario variant are present
fn check_required_kinds(technologies: &TechnologyMap, variant: ScenarioVariant) -> Result<()> {
    let mut required = vec![
        TechnologyKind::Gas,
        TechnologyKind::Wind,
        TechnologyKind::Solar,
    ];
    if variant == ScenarioVariant::BatteryStorage {
        required.push(TechnologyKind::Storage);
    }

    for kind in required {
        ensure!(
            technology_of_kind(technologies, kind).is_some(),
            "Model must include a technology of kind {kind:?}"
        );
    }

    Ok(())
}

/// Read a year-keyed target file, falling back to built-in defaults if it is missing.
///
/// A missing file is not an error (missing-input policy); a malformed file is.
fn read_targets<T, F>(file_path: &Path, defaults: &[(u32, f64)], make: F) -> Result<Vec<T>>
where
    T: serde::de::DeserializeOwned,
    F: Fn((u32, f64)) -> T,
{
    if !file_path.is_file() {
        warn!(
            "No targets file at {}; using built-in defaults",
            file_path.display()
        );
        return Ok(defaults.iter().copied().map(make).collect());
    }

    read_vec_from_csv(file_path)
}
