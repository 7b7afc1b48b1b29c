//! Reads NetCDF files into a [`GridDataset`] using the native netcdf library.
//!
//! Values are unpacked the CF way: `_FillValue` / `missing_value` become NaN, then
//! `scale_factor` and `add_offset` are applied. One-dimensional variables named after their
//! dimension are coordinates; when their `units` attribute is a CF time unit they are decoded
//! to timestamps.

use crate::grid::error::GridError;
use crate::grid::time_units::TimeUnits;
use crate::grid::{CoordinateValues, Dimension, GridDataset, GridField};
use log::{debug, info};
use std::path::Path;

/// Loads every numeric variable of the file at `path` into memory.
pub fn open_grid(path: &Path) -> Result<GridDataset, GridError> {
    let file = netcdf::open(path).map_err(|e| GridError::Open(path.to_path_buf(), e))?;

    let dimensions: Vec<Dimension> = file
        .dimensions()
        .map(|d| Dimension::new(d.name(), d.len()))
        .collect();
    let mut dataset = GridDataset::new(dimensions);

    for variable in file.variables() {
        let name = variable.name();
        let dims: Vec<String> = variable.dimensions().iter().map(|d| d.name()).collect();

        let raw: Vec<f64> = match variable.get_values::<f64, _>(..) {
            Ok(values) => values,
            Err(e) => {
                // String labels such as `expver` cannot be read as numbers.
                debug!("Skipping non-numeric variable '{}': {}", name, e);
                continue;
            }
        };
        let values = unpack(&variable, raw);
        let units = get_string_attr(&variable, "units");

        if dims.len() == 1 && dims[0] == name {
            let coordinate = match units.as_deref().and_then(TimeUnits::parse) {
                Some(time_units) => CoordinateValues::Time(decode_times(
                    &name,
                    units.as_deref().unwrap_or_default(),
                    time_units,
                    &values,
                )?),
                None => CoordinateValues::Numeric(values),
            };
            dataset = dataset.with_coordinate(name, coordinate)?;
        } else {
            dataset = dataset.with_field(GridField {
                name,
                dims,
                values,
                units,
            })?;
        }
    }

    info!(
        "Loaded {} from {} ({} rows once flattened)",
        dataset.variable_names().collect::<Vec<_>>().join(", "),
        path.display(),
        dataset.row_count()
    );
    Ok(dataset)
}

fn decode_times(
    variable: &str,
    units: &str,
    time_units: TimeUnits,
    values: &[f64],
) -> Result<Vec<chrono::NaiveDateTime>, GridError> {
    values
        .iter()
        .map(|&value| {
            time_units.decode(value).ok_or_else(|| GridError::TimeDecode {
                variable: variable.to_string(),
                units: units.to_string(),
                value,
            })
        })
        .collect()
}

fn unpack(variable: &netcdf::Variable, raw: Vec<f64>) -> Vec<f64> {
    let fill_value = get_f64_attr(variable, "_FillValue");
    let missing_value = get_f64_attr(variable, "missing_value");
    let scale_factor = get_f64_attr(variable, "scale_factor").unwrap_or(1.0);
    let add_offset = get_f64_attr(variable, "add_offset").unwrap_or(0.0);

    raw.into_iter()
        .map(|value| {
            if Some(value) == fill_value || Some(value) == missing_value {
                f64::NAN
            } else {
                value * scale_factor + add_offset
            }
        })
        .collect()
}

/// Check if a variable has an attribute with the given name.
/// This avoids HDF5 error spam when checking for optional attributes.
fn has_attr(variable: &netcdf::Variable, name: &str) -> bool {
    variable.attributes().any(|attr| attr.name() == name)
}

fn get_f64_attr(variable: &netcdf::Variable, name: &str) -> Option<f64> {
    if !has_attr(variable, name) {
        return None;
    }
    let attr_value = variable.attribute_value(name)?.ok()?;
    f64::try_from(attr_value).ok()
}

fn get_string_attr(variable: &netcdf::Variable, name: &str) -> Option<String> {
    if !has_attr(variable, name) {
        return None;
    }
    match variable.attribute_value(name)?.ok()? {
        netcdf::AttributeValue::Str(value) => Some(value),
        _ => None,
    }
}
