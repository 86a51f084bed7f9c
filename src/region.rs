//! Regions represent the demand areas of the system (e.g. "Industrial", "Residential").
//!
//! Each region carries the parameters which drive its synthetic demand profile.
use crate::id::{define_id_getter, define_id_type};
use crate::input::{deserialise_proportion, read_csv_id_file};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::Deserialize;
use serde_string_enum::{DeserializeLabeledStringEnum, SerializeLabeledStringEnum};
use std::path::Path;

const REGIONS_FILE_NAME: &str = "regions.csv";

define_id_type! {RegionID}

/// A map of [`Region`]s, keyed by region ID
pub type RegionMap = IndexMap<RegionID, Region>;

/// The shape of a region's hourly demand pattern
#[derive(Debug, Clone, Copy, PartialEq, SerializeLabeledStringEnum, DeserializeLabeledStringEnum)]
pub enum DemandShape {
    /// Near-constant demand with small random variation (e.g. industrial load)
    #[string = "flat"]
    Flat,
    /// Morning/evening peaks with a night-time trough (e.g. residential load)
    #[string = "peaked"]
    Peaked,
}

/// Represents a demand region with its profile parameters.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Region {
    /// A unique identifier for a region (e.g. "Industrial").
    pub id: RegionID,
    /// A text description of the region.
    pub description: String,
    /// Baseline demand level in MW for the start year
    pub base_demand: f64,
    /// The shape of the region's hourly demand pattern
    pub shape: DemandShape,
    /// Minimum hourly demand as a fraction of the (possibly efficiency-adjusted) base
    #[serde(deserialize_with = "deserialise_proportion")]
    pub demand_floor: f64,
    /// Fractional demand reduction applied per modelled year (efficiency improvements)
    #[serde(deserialize_with = "deserialise_proportion")]
    pub efficiency_decline: f64,
}
define_id_getter! {Region, RegionID}

/// Reads regions from a CSV file.
///
/// # Arguments
///
/// * `model_dir` - Folder containing model configuration files
///
/// # Returns
///
/// A [`RegionMap`] with the parsed regions data or an error
pub fn read_regions(model_dir: &Path) -> Result<RegionMap> {
    let file_path = model_dir.join(REGIONS_FILE_NAME);
    let regions: RegionMap = read_csv_id_file(&file_path)?;

    for region in regions.values() {
        validate_region(region)
            .with_context(|| format!("Invalid parameters for region {}", region.id))?;
    }

    Ok(regions)
}

/// Check a region's numeric parameters are usable
fn validate_region(region: &Region) -> Result<()> {
    ensure!(
        region.base_demand.is_finite() && region.base_demand >= 0.0,
        "base_demand must be finite and non-negative"
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    /// Create an example regions file in dir_path
    fn create_regions_file(dir_path: &Path) {
        let file_path = dir_path.join(REGIONS_FILE_NAME);
        let mut file = File::create(file_path).unwrap();
        writeln!(
            file,
            "id,description,base_demand,shape,demand_floor,efficiency_decline
Industrial,Industrial demand region,100,flat,0.8,0.0
Residential,Residential demand region,80,peaked,0.4,0.005"
        )
        .unwrap();
    }

    #[test]
    fn test_read_regions() {
        let dir = tempdir().unwrap();
        create_regions_file(dir.path());
        let regions = read_regions(dir.path()).unwrap();
        assert_eq!(
            regions,
            RegionMap::from([
                (
                    "Industrial".into(),
                    Region {
                        id: "Industrial".into(),
                        description: "Industrial demand region".to_string(),
                        base_demand: 100.0,
                        shape: DemandShape::Flat,
                        demand_floor: 0.8,
                        efficiency_decline: 0.0,
                    }
                ),
                (
                    "Residential".into(),
                    Region {
                        id: "Residential".into(),
                        description: "Residential demand region".to_string(),
                        base_demand: 80.0,
                        shape: DemandShape::Peaked,
                        demand_floor: 0.4,
                        efficiency_decline: 0.005,
                    }
                ),
            ])
        );
    }

    #[test]
    fn test_read_regions_bad_floor() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join(REGIONS_FILE_NAME);
        {
            let mut file = File::create(file_path).unwrap();
            writeln!(
                file,
                "id,description,base_demand,shape,demand_floor,efficiency_decline
Industrial,Industrial demand region,100,flat,1.8,0.0"
            )
            .unwrap();
        }

        assert!(read_regions(dir.path()).is_err());
    }
}
