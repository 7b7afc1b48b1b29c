//! In-memory representation of a gridded dataset and its flattening into a table.
//!
//! A [`GridDataset`] holds named dimensions, one coordinate variable per dimension (numeric or
//! decoded timestamps) and any number of data fields laid out row-major over a subset of the
//! dimensions. [`GridDataset::to_dataframe`] materialises every combination of dimension
//! indices as one row, the first dimension varying slowest.

pub mod error;
pub mod netcdf_reader;
pub mod time_units;

use crate::grid::error::GridError;
use chrono::NaiveDateTime;
use polars::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub len: usize,
}

impl Dimension {
    pub fn new(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            len,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CoordinateValues {
    Numeric(Vec<f64>),
    Time(Vec<NaiveDateTime>),
}

impl CoordinateValues {
    pub fn len(&self) -> usize {
        match self {
            CoordinateValues::Numeric(values) => values.len(),
            CoordinateValues::Time(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Values along one dimension, named after that dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    pub name: String,
    pub values: CoordinateValues,
}

/// A named data variable. Missing values are stored as NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct GridField {
    pub name: String,
    pub dims: Vec<String>,
    pub values: Vec<f64>,
    pub units: Option<String>,
}

impl GridField {
    pub fn new(name: impl Into<String>, dims: &[&str], values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            dims: dims.iter().map(|d| d.to_string()).collect(),
            values,
            units: None,
        }
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    /// Applies `op` to every value in place.
    pub fn apply(&mut self, op: impl Fn(f64) -> f64) {
        self.values.iter_mut().for_each(|v| *v = op(*v));
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridDataset {
    dimensions: Vec<Dimension>,
    coordinates: Vec<Coordinate>,
    fields: Vec<GridField>,
}

impl GridDataset {
    pub fn new(dimensions: Vec<Dimension>) -> Self {
        Self {
            dimensions,
            coordinates: Vec::new(),
            fields: Vec::new(),
        }
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn dimension(&self, name: &str) -> Option<&Dimension> {
        self.dimensions.iter().find(|d| d.name == name)
    }

    pub fn coordinate(&self, name: &str) -> Option<&Coordinate> {
        self.coordinates.iter().find(|c| c.name == name)
    }

    pub fn fields(&self) -> &[GridField] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&GridField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut GridField> {
        self.fields.iter_mut().find(|f| f.name == name)
    }

    /// Names of all coordinates followed by all fields, in insertion order.
    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.coordinates
            .iter()
            .map(|c| c.name.as_str())
            .chain(self.fields.iter().map(|f| f.name.as_str()))
    }

    pub fn contains_variable(&self, name: &str) -> bool {
        self.variable_names().any(|n| n == name)
    }

    /// Adds the coordinate variable of dimension `name`.
    pub fn with_coordinate(
        mut self,
        name: impl Into<String>,
        values: CoordinateValues,
    ) -> Result<Self, GridError> {
        let name = name.into();
        let dimension = self
            .dimension(&name)
            .ok_or_else(|| GridError::UnknownDimension {
                variable: name.clone(),
                dimension: name.clone(),
            })?;
        if dimension.len != values.len() {
            return Err(GridError::ShapeMismatch {
                variable: name,
                expected: dimension.len,
                found: values.len(),
            });
        }
        self.coordinates.push(Coordinate { name, values });
        Ok(self)
    }

    pub fn with_field(mut self, field: GridField) -> Result<Self, GridError> {
        let mut expected = 1;
        for dim in &field.dims {
            let dimension = self
                .dimension(dim)
                .ok_or_else(|| GridError::UnknownDimension {
                    variable: field.name.clone(),
                    dimension: dim.clone(),
                })?;
            expected *= dimension.len;
        }
        if expected != field.values.len() {
            return Err(GridError::ShapeMismatch {
                variable: field.name,
                expected,
                found: field.values.len(),
            });
        }
        self.fields.push(field);
        Ok(self)
    }

    /// Number of rows produced by [`GridDataset::to_dataframe`].
    pub fn row_count(&self) -> usize {
        self.dimensions.iter().map(|d| d.len).product()
    }

    /// Flattens the grid into one row per combination of dimension indices.
    ///
    /// Columns are the dimensions (coordinate values, or the integer index when a dimension
    /// has no coordinate variable) followed by the fields. Fields spanning fewer dimensions
    /// are repeated across the missing ones. NaN becomes null.
    pub fn to_dataframe(&self) -> Result<DataFrame, GridError> {
        let shape: Vec<usize> = self.dimensions.iter().map(|d| d.len).collect();
        let strides = row_major_strides(&shape);
        let rows = self.row_count();
        let index_on = |row: usize, axis: usize| (row / strides[axis]) % shape[axis];

        let mut columns = Vec::with_capacity(self.dimensions.len() + self.fields.len());

        for (axis, dimension) in self.dimensions.iter().enumerate() {
            let name = PlSmallStr::from_str(&dimension.name);
            let column = match self.coordinate(&dimension.name).map(|c| &c.values) {
                Some(CoordinateValues::Numeric(values)) => Column::new(
                    name,
                    (0..rows)
                        .map(|row| values[index_on(row, axis)])
                        .collect::<Vec<f64>>(),
                ),
                Some(CoordinateValues::Time(values)) => Column::new(
                    name,
                    (0..rows)
                        .map(|row| values[index_on(row, axis)])
                        .collect::<Vec<NaiveDateTime>>(),
                ),
                None => Column::new(
                    name,
                    (0..rows)
                        .map(|row| index_on(row, axis) as i64)
                        .collect::<Vec<i64>>(),
                ),
            };
            columns.push(column);
        }

        for field in &self.fields {
            let axes = field
                .dims
                .iter()
                .map(|dim| {
                    self.dimensions
                        .iter()
                        .position(|d| &d.name == dim)
                        .ok_or_else(|| GridError::UnknownDimension {
                            variable: field.name.clone(),
                            dimension: dim.clone(),
                        })
                })
                .collect::<Result<Vec<usize>, GridError>>()?;
            let field_shape: Vec<usize> = axes.iter().map(|&axis| shape[axis]).collect();
            let field_strides = row_major_strides(&field_shape);

            let values: Vec<Option<f64>> = (0..rows)
                .map(|row| {
                    let offset: usize = axes
                        .iter()
                        .zip(&field_strides)
                        .map(|(&axis, stride)| index_on(row, axis) * stride)
                        .sum();
                    let value = field.values[offset];
                    (!value.is_nan()).then_some(value)
                })
                .collect();
            columns.push(Column::new(PlSmallStr::from_str(&field.name), values));
        }

        Ok(DataFrame::new(columns)?)
    }
}

fn row_major_strides(shape: &[usize]) -> Vec<usize> {
    let mut strides = vec![1; shape.len()];
    for axis in (0..shape.len().saturating_sub(1)).rev() {
        strides[axis] = strides[axis + 1] * shape[axis + 1];
    }
    strides
}
