//! The module responsible for writing output data to disk.
use crate::region::RegionID;
use crate::scenario::ScenarioResult;
use crate::technology::TechnologyID;
use anyhow::{Context, Result, ensure};
use chrono::prelude::*;
use csv;
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "tworegion_results";

/// The output file name for per-region demand statistics
const DEMAND_ANALYSIS_FILE_NAME: &str = "demand_analysis.csv";

/// The output file name for the generation mix
const GENERATION_MIX_FILE_NAME: &str = "generation_mix.csv";

/// The output file name for technology cost snapshots
const TECHNOLOGY_COSTS_FILE_NAME: &str = "technology_costs.csv";

/// The output file name for yearly emissions metrics
const EMISSIONS_FILE_NAME: &str = "emissions.csv";

/// The output file name for per-technology emissions
const EMISSIONS_BY_TECHNOLOGY_FILE_NAME: &str = "emissions_by_technology.csv";

/// The output file name for carbon-target progress
const PROGRESS_FILE_NAME: &str = "progress.csv";

/// The output file name for scenario summary metrics
const SUMMARY_FILE_NAME: &str = "summary.csv";

/// The output file name for solved capacity tables
const CAPACITY_FILE_NAME: &str = "capacity.csv";

/// The output file name for solved generation tables
const GENERATION_FILE_NAME: &str = "generation.csv";

/// The output file name for metadata
const METADATA_FILE_NAME: &str = "metadata.toml";

/// Get the default output folder for the model at the specified directory path
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Canonicalise in case the user has specified "."
    let model_dir = model_dir
        .canonicalize()
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory for the model.
///
/// Returns whether an existing directory was removed first. An existing directory is an
/// error unless `overwrite` is set.
pub fn create_output_directory(output_dir: &Path, overwrite: bool) -> Result<bool> {
    let existed = output_dir.is_dir();
    if existed {
        ensure!(
            overwrite,
            "Output directory {} already exists (pass --overwrite to replace it)",
            output_dir.display()
        );
        fs::remove_dir_all(output_dir)?;
    }

    fs::create_dir_all(output_dir)?;

    Ok(existed)
}

/// Represents a row in the demand analysis CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct DemandAnalysisRow {
    scenario: String,
    milestone_year: u32,
    region_id: RegionID,
    total_daily_mwh: f64,
    peak_mw: f64,
    min_mw: f64,
    load_factor: f64,
    demand_share: f64,
}

/// Represents a row in the generation mix CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct GenerationMixRow {
    scenario: String,
    milestone_year: u32,
    technology_id: TechnologyID,
    generation_mwh: f64,
}

/// Represents a row in the technology costs CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct TechnologyCostRow {
    scenario: String,
    milestone_year: u32,
    technology_id: TechnologyID,
    capital_cost: f64,
    fixed_operating_cost: f64,
    variable_operating_cost: f64,
    fuel_cost: f64,
    lcoe: f64,
}

/// Represents a row in the emissions CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct EmissionsRow {
    scenario: String,
    milestone_year: u32,
    total_tonnes: f64,
    carbon_intensity: f64,
    renewable_share: f64,
}

/// Represents a row in the per-technology emissions CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct EmissionsByTechnologyRow {
    scenario: String,
    milestone_year: u32,
    technology_id: TechnologyID,
    emissions_tonnes: f64,
}

/// Represents a row in the carbon-target progress CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct ProgressRow {
    scenario: String,
    target_year: u32,
    evaluated_year: u32,
    target_reduction: f64,
    achieved_reduction: f64,
    on_track: bool,
}

/// Represents the single row of the scenario summary CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct SummaryRow {
    scenario: String,
    cumulative_emissions_tonnes: f64,
    average_renewable_share: f64,
    final_year_peak_demand_mw: f64,
    peak_to_average_ratio: f64,
    demand_growth_factor: f64,
    wind_capacity_factor: f64,
    solar_capacity_factor: f64,
    combined_capacity_factor: f64,
    resource_complementarity: f64,
}

/// Represents a row in the capacity CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct CapacityRow {
    scenario: String,
    milestone_year: u32,
    region_id: RegionID,
    technology_id: TechnologyID,
    capacity_mw: f64,
    source: String,
}

/// Represents a row in the generation CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct GenerationRow {
    scenario: String,
    milestone_year: u32,
    region_id: RegionID,
    technology_id: TechnologyID,
    generation_mwh: f64,
    source: String,
}

/// An object for writing scenario results to CSV files
pub struct DataWriter {
    demand_writer: csv::Writer<File>,
    mix_writer: csv::Writer<File>,
    costs_writer: csv::Writer<File>,
    emissions_writer: csv::Writer<File>,
    emissions_by_technology_writer: csv::Writer<File>,
    progress_writer: csv::Writer<File>,
    summary_writer: csv::Writer<File>,
    capacity_writer: csv::Writer<File>,
    generation_writer: csv::Writer<File>,
}

impl DataWriter {
    /// Open CSV files to write output data to
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    pub fn create(output_path: &Path) -> Result<Self> {
        let new_writer = |file_name| {
            let file_path = output_path.join(file_name);
            csv::Writer::from_path(file_path)
        };

        Ok(Self {
            demand_writer: new_writer(DEMAND_ANALYSIS_FILE_NAME)?,
            mix_writer: new_writer(GENERATION_MIX_FILE_NAME)?,
            costs_writer: new_writer(TECHNOLOGY_COSTS_FILE_NAME)?,
            emissions_writer: new_writer(EMISSIONS_FILE_NAME)?,
            emissions_by_technology_writer: new_writer(EMISSIONS_BY_TECHNOLOGY_FILE_NAME)?,
            progress_writer: new_writer(PROGRESS_FILE_NAME)?,
            summary_writer: new_writer(SUMMARY_FILE_NAME)?,
            capacity_writer: new_writer(CAPACITY_FILE_NAME)?,
            generation_writer: new_writer(GENERATION_FILE_NAME)?,
        })
    }

    /// Write a complete scenario result to the output files
    pub fn write_scenario(&mut self, result: &ScenarioResult) -> Result<()> {
        let scenario = &result.scenario_name;
        for year in &result.years {
            for (region_id, analysis) in &year.demand {
                self.demand_writer.serialize(DemandAnalysisRow {
                    scenario: scenario.clone(),
                    milestone_year: year.year,
                    region_id: region_id.clone(),
                    total_daily_mwh: analysis.total_daily_mwh,
                    peak_mw: analysis.peak_mw,
                    min_mw: analysis.min_mw,
                    load_factor: analysis.load_factor,
                    demand_share: analysis.demand_share,
                })?;
            }

            for (technology_id, generation) in &year.mix {
                self.mix_writer.serialize(GenerationMixRow {
                    scenario: scenario.clone(),
                    milestone_year: year.year,
                    technology_id: technology_id.clone(),
                    generation_mwh: *generation,
                })?;
            }

            for snapshot in &year.cost_snapshots {
                self.costs_writer.serialize(TechnologyCostRow {
                    scenario: scenario.clone(),
                    milestone_year: year.year,
                    technology_id: snapshot.technology_id.clone(),
                    capital_cost: snapshot.capital_cost,
                    fixed_operating_cost: snapshot.fixed_operating_cost,
                    variable_operating_cost: snapshot.variable_operating_cost,
                    fuel_cost: snapshot.fuel_cost,
                    lcoe: snapshot.lcoe,
                })?;
            }

            self.emissions_writer.serialize(EmissionsRow {
                scenario: scenario.clone(),
                milestone_year: year.year,
                total_tonnes: year.emissions.total,
                carbon_intensity: year.emissions.carbon_intensity,
                renewable_share: year.emissions.renewable_share,
            })?;

            for (technology_id, emissions) in &year.emissions.by_technology {
                self.emissions_by_technology_writer
                    .serialize(EmissionsByTechnologyRow {
                        scenario: scenario.clone(),
                        milestone_year: year.year,
                        technology_id: technology_id.clone(),
                        emissions_tonnes: *emissions,
                    })?;
            }
        }

        for entry in &result.progress {
            self.progress_writer.serialize(ProgressRow {
                scenario: scenario.clone(),
                target_year: entry.target_year,
                evaluated_year: entry.evaluated_year,
                target_reduction: entry.target_reduction,
                achieved_reduction: entry.achieved_reduction,
                on_track: entry.on_track,
            })?;
        }

        self.summary_writer.serialize(SummaryRow {
            scenario: scenario.clone(),
            cumulative_emissions_tonnes: result.summary.cumulative_emissions,
            average_renewable_share: result.summary.average_renewable_share,
            final_year_peak_demand_mw: result.summary.final_year_peak_demand,
            peak_to_average_ratio: result.summary.peak_to_average_ratio,
            demand_growth_factor: result.summary.demand_growth_factor,
            wind_capacity_factor: result.renewables.wind_capacity_factor,
            solar_capacity_factor: result.renewables.solar_capacity_factor,
            combined_capacity_factor: result.renewables.combined_capacity_factor,
            resource_complementarity: result.renewables.resource_complementarity,
        })?;

        let source = if result.tables.is_fallback {
            "fallback"
        } else {
            "solver"
        };
        for entry in &result.tables.capacity {
            self.capacity_writer.serialize(CapacityRow {
                scenario: scenario.clone(),
                milestone_year: entry.year,
                region_id: entry.region_id.clone(),
                technology_id: entry.technology_id.clone(),
                capacity_mw: entry.capacity,
                source: source.into(),
            })?;
        }
        for entry in &result.tables.activity {
            self.generation_writer.serialize(GenerationRow {
                scenario: scenario.clone(),
                milestone_year: entry.year,
                region_id: entry.region_id.clone(),
                technology_id: entry.technology_id.clone(),
                generation_mwh: entry.activity,
                source: source.into(),
            })?;
        }

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.demand_writer.flush()?;
        self.mix_writer.flush()?;
        self.costs_writer.flush()?;
        self.emissions_writer.flush()?;
        self.emissions_by_technology_writer.flush()?;
        self.progress_writer.flush()?;
        self.summary_writer.flush()?;
        self.capacity_writer.flush()?;
        self.generation_writer.flush()?;

        Ok(())
    }
}

#[derive(Serialize)]
struct Metadata<'a> {
    run: RunMetadata<'a>,
    program: ProgramMetadata<'a>,
}

/// Information about the model run
#[derive(Serialize)]
struct RunMetadata<'a> {
    /// Path to the model which was run
    model_path: &'a Path,
    /// The date and time on which the run started
    datetime: String,
}

/// Information about the program build
#[derive(Serialize)]
struct ProgramMetadata<'a> {
    /// The program name
    name: &'a str,
    /// The program version as specified in Cargo.toml
    version: &'a str,
}

/// Write metadata to the specified output path in TOML format
pub fn write_metadata(output_path: &Path, model_path: &Path) -> Result<()> {
    let metadata = Metadata {
        run: RunMetadata {
            model_path,
            datetime: Local::now().to_rfc2822(),
        },
        program: ProgramMetadata {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
        },
    };
    let file_path = output_path.join(METADATA_FILE_NAME);
    fs::write(&file_path, toml::to_string(&metadata)?)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::model;
    use crate::model::Model;
    use crate::scenario::run_scenario;
    use itertools::Itertools;
    use rstest::rstest;
    use tempfile::tempdir;

    #[test]
    fn test_create_output_directory() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("out");

        assert!(!create_output_directory(&output_dir, false).unwrap());
        assert!(output_dir.is_dir());

        // A second creation without overwrite is an error
        assert!(create_output_directory(&output_dir, false).is_err());

        // With overwrite the old contents are removed
        fs::write(output_dir.join("stale.csv"), "stale").unwrap();
        assert!(create_output_directory(&output_dir, true).unwrap());
        assert!(!output_dir.join("stale.csv").exists());
    }

    #[rstest]
    fn test_write_scenario(model: Model) {
        let result = run_scenario(&model).unwrap();
        let dir = tempdir().unwrap();

        {
            let mut writer = DataWriter::create(dir.path()).unwrap();
            writer.write_scenario(&result).unwrap();
            writer.flush().unwrap();
        }

        // Read back the emissions rows and compare
        let records: Vec<EmissionsRow> =
            csv::Reader::from_path(dir.path().join(EMISSIONS_FILE_NAME))
                .unwrap()
                .into_deserialize()
                .try_collect()
                .unwrap();
        assert_eq!(records.len(), result.years.len());
        assert_eq!(records[0].scenario, result.scenario_name);
        assert_eq!(records[0].total_tonnes, result.years[0].emissions.total);

        // Mix rows cover every technology in every year
        let records: Vec<GenerationMixRow> =
            csv::Reader::from_path(dir.path().join(GENERATION_MIX_FILE_NAME))
                .unwrap()
                .into_deserialize()
                .try_collect()
                .unwrap();
        assert_eq!(records.len(), result.years.len() * result.years[0].mix.len());

        // The summary is a single row
        let records: Vec<SummaryRow> = csv::Reader::from_path(dir.path().join(SUMMARY_FILE_NAME))
            .unwrap()
            .into_deserialize()
            .try_collect()
            .unwrap();
        assert_eq!(records.len(), 1);

        // Capacity and generation tables carry the source column
        let records: Vec<CapacityRow> = csv::Reader::from_path(dir.path().join(CAPACITY_FILE_NAME))
            .unwrap()
            .into_deserialize()
            .try_collect()
            .unwrap();
        assert!(!records.is_empty());
        assert!(records.iter().all(|row| row.source == "solver" || row.source == "fallback"));
    }

    #[test]
    fn test_write_metadata() {
        let dir = tempdir().unwrap();
        write_metadata(dir.path(), Path::new("some_model")).unwrap();

        let contents = fs::read_to_string(dir.path().join(METADATA_FILE_NAME)).unwrap();
        assert!(contents.contains(env!("CARGO_PKG_VERSION")));
        assert!(contents.contains("some_model"));
    }
}
