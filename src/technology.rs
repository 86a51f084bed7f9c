//! Technologies are the generation (and storage) options available to the system.
//!
//! Each technology carries a static parameter bundle: costs, capacity factor, emissions
//! intensity, lifetime and learning rate. Parameters never change after loading; all
//! time-dependent values are derived from them (see the [`crate::costs`] module).
use crate::id::{define_id_getter, define_id_type};
use crate::input::{deserialise_proportion, read_csv_id_file};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::path::Path;

const TECHNOLOGIES_FILE_NAME: &str = "technologies.csv";

define_id_type! {TechnologyID}

/// A map of [`Technology`]s, keyed by technology ID
pub type TechnologyMap = IndexMap<TechnologyID, Technology>;

/// The broad class a technology belongs to.
///
/// The generation mix allocator assigns demand shares by kind rather than by ID, so each
/// kind should appear at most once in a model.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, SerializeLabeledStringEnum, DeserializeLabeledStringEnum,
)]
pub enum TechnologyKind {
    /// Dispatchable gas-fired generation
    #[string = "gas"]
    Gas,
    /// Wind generation
    #[string = "wind"]
    Wind,
    /// Solar PV generation
    #[string = "solar"]
    Solar,
    /// Battery storage
    #[string = "storage"]
    Storage,
}

impl TechnologyKind {
    /// Whether generation of this kind counts towards the renewable share
    pub fn is_renewable(self) -> bool {
        matches!(self, Self::Wind | Self::Solar)
    }
}

/// Represents a generation or storage technology with its static parameter bundle.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Technology {
    /// A unique identifier for the technology (e.g. "wind_turbine")
    pub id: TechnologyID,
    /// A human-readable description
    pub description: String,
    /// The class of technology
    pub kind: TechnologyKind,
    /// Average fraction of nameplate capacity realised as output
    #[serde(deserialize_with = "deserialise_proportion")]
    pub capacity_factor: f64,
    /// Conversion efficiency (1.0 for renewables)
    #[serde(deserialize_with = "deserialise_proportion")]
    pub efficiency: f64,
    /// Overnight capital cost per MW in the start year
    pub capital_cost: f64,
    /// Annual fixed operating cost per MW
    pub fixed_operating_cost: f64,
    /// Variable operating cost per MWh
    pub variable_operating_cost: f64,
    /// Fuel cost per MWh (zero for renewables)
    pub fuel_cost: f64,
    /// Emissions intensity in kg CO2 per MWh
    pub co2_intensity: f64,
    /// Lifetime in years
    pub lifetime: u32,
    /// Fractional capital cost decline applied per modelled year
    #[serde(deserialize_with = "deserialise_proportion")]
    pub learning_rate: f64,
}
define_id_getter! {Technology, TechnologyID}

/// Find the first technology of the given kind, if any
pub fn technology_of_kind(
    technologies: &TechnologyMap,
    kind: TechnologyKind,
) -> Option<(&TechnologyID, &Technology)> {
    technologies.iter().find(|(_, tech)| tech.kind == kind)
}

/// Reads technologies from a CSV file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// A [`TechnologyMap`] with the parsed technology data or an error
pub fn read_technologies(model_dir: &Path) -> Result<TechnologyMap> {
    let file_path = model_dir.join(TECHNOLOGIES_FILE_NAME);
    let technologies: TechnologyMap = read_csv_id_file(&file_path)?;

    for technology in technologies.values() {
        validate_technology(technology)
            .with_context(|| format!("Invalid parameters for technology {}", technology.id))?;
    }

    Ok(technologies)
}

/// Check a technology's numeric parameters are usable
fn validate_technology(technology: &Technology) -> Result<()> {
    for (name, value) in [
        ("capital_cost", technology.capital_cost),
        ("fixed_operating_cost", technology.fixed_operating_cost),
        ("variable_operating_cost", technology.variable_operating_cost),
        ("fuel_cost", technology.fuel_cost),
        ("co2_intensity", technology.co2_intensity),
    ] {
        ensure!(
            value.is_finite() && value >= 0.0,
            "{name} must be finite and non-negative"
        );
    }

    Ok(())
}
