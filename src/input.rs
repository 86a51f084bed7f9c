//! Common routines for handling input data.
use crate::id::{HasID, IDLike};
use anyhow::{Context, Result, ensure};
use indexmap::IndexMap;
use serde::de::{Deserialize, DeserializeOwned, Deserializer};
use std::fs;
use std::path::Path;

/// Read a TOML file at the specified path.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path)
        .with_context(|| format!("Could not read file {}", file_path.display()))?;
    toml::from_str(&toml_str)
        .with_context(|| format!("Could not parse TOML file {}", file_path.display()))
}

/// Read a series of type `T`s from a CSV file into a [`Vec`].
///
/// # Arguments
///
/// * `file_path` - Path to the CSV file
pub fn read_vec_from_csv<T: DeserializeOwned>(file_path: &Path) -> Result<Vec<T>> {
    let mut reader = csv::Reader::from_path(file_path)
        .with_context(|| format!("Could not read file {}", file_path.display()))?;

    let mut vec = Vec::new();
    for result in reader.deserialize() {
        let d: T =
            result.with_context(|| format!("Error deserialising {}", file_path.display()))?;
        vec.push(d);
    }

    ensure!(
        !vec.is_empty(),
        "CSV file {} cannot be empty",
        file_path.display()
    );

    Ok(vec)
}

/// Read a CSV file of items with IDs into a map keyed by ID.
///
/// Each record must have a unique ID; duplicates are an error.
pub fn read_csv_id_file<ID, T>(file_path: &Path) -> Result<IndexMap<ID, T>>
where
    ID: IDLike,
    T: HasID<ID> + DeserializeOwned,
{
    let mut map = IndexMap::new();
    for item in read_vec_from_csv::<T>(file_path)? {
        let id = item.get_id().clone();
        ensure!(
            map.insert(id.clone(), item).is_none(),
            "Duplicate ID {} in {}",
            id,
            file_path.display()
        );
    }

    Ok(map)
}

/// Read an f64, checking that it is between 0 and 1
pub fn deserialise_proportion<'de, D>(deserialiser: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Deserialize::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) {
        Err(serde::de::Error::custom("Value is not between 0 and 1"))?;
    }

    Ok(value)
}

/// Check that the supplied years are in strictly increasing order
pub fn is_sorted_and_unique(values: &[u32]) -> bool {
    values.windows(2).all(|w| w[0] < w[1])
}
