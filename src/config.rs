//! Configuration objects for the three pipeline stages.
//!
//! Every stage entry point takes one of these structs instead of reading constants or global
//! state. The builders (generated by `bon`) default every member to the values of the Savoie
//! July 2023 run, so `RetrieveConfig::builder().access_key("...").build()` is a complete setup.

use crate::error::ConfigError;
use bon::Builder;
use serde::ser::SerializeSeq;
use serde::{Serialize, Serializer};
use std::fmt;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_SERVICE_URL: &str = "https://ads.atmosphere.copernicus.eu/api";
pub const DEFAULT_DATASET: &str = "cams-global-reanalysis-eac4-monthly";
pub const DEFAULT_GRID_FILE: &str = "temperature.nc";
pub const DEFAULT_TABLE_FILE: &str = "final_data_simple.csv";
pub const DEFAULT_TIME_SERIES_FILE: &str = "result_temperature_graph.png";
pub const DEFAULT_HEATMAP_FILE: &str = "result_temperature_map.png";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Region of interest around Chambéry (Savoie).
pub const SAVOIE: BoundingBox = BoundingBox {
    north: 46.0,
    west: 5.5,
    south: 45.0,
    east: 6.5,
};

pub const JULY_2023: ReanalysisMonth = ReanalysisMonth {
    year: 2023,
    month: 7,
};

/// A rectangular region given by its four boundaries, in degrees.
///
/// The remote service expects the boundaries in the order North, West, South, East, which is
/// also the order used by [`FromStr`] (`"46,5.5,45,6.5"`) and by the serialized form
/// (`[46.0, 5.5, 45.0, 6.5]`).
///
/// # Examples
///
/// ```
/// use reanalysis_pipeline::BoundingBox;
///
/// let area: BoundingBox = "46,5.5,45,6.5".parse().unwrap();
/// assert_eq!(area.to_array(), [46.0, 5.5, 45.0, 6.5]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub north: f64,
    pub west: f64,
    pub south: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn new(north: f64, west: f64, south: f64, east: f64) -> Self {
        Self {
            north,
            west,
            south,
            east,
        }
    }

    /// Boundaries as `[north, west, south, east]`.
    pub fn to_array(self) -> [f64; 4] {
        [self.north, self.west, self.south, self.east]
    }
}

impl FromStr for BoundingBox {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| {
                let part = part.trim();
                part.parse::<f64>()
                    .map_err(|_| ConfigError::BoundingBoxValue(part.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        match values.as_slice() {
            [north, west, south, east] => Ok(Self::new(*north, *west, *south, *east)),
            _ => Err(ConfigError::BoundingBoxArity(values.len())),
        }
    }
}

impl Display for BoundingBox {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.north, self.west, self.south, self.east)
    }
}

impl Serialize for BoundingBox {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(4))?;
        for value in self.to_array() {
            seq.serialize_element(&value)?;
        }
        seq.end()
    }
}

/// The calendar month a monthly-mean product is requested for.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct ReanalysisMonth {
    year: i32,
    month: u32,
}

impl ReanalysisMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, ConfigError> {
        if !(1000..=9999).contains(&year) {
            return Err(ConfigError::InvalidYear(year));
        }
        if !(1..=12).contains(&month) {
            return Err(ConfigError::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    /// Builds a month from the textual year and month given on a command line.
    pub fn parse(year: &str, month: &str) -> Result<Self, ConfigError> {
        let year = year
            .trim()
            .parse::<i32>()
            .map_err(|_| ConfigError::NotANumber {
                option: "Year",
                value: year.to_string(),
            })?;
        let month = month
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::NotANumber {
                option: "Month",
                value: month.to_string(),
            })?;
        Self::new(year, month)
    }

    pub fn year(self) -> i32 {
        self.year
    }

    pub fn month(self) -> u32 {
        self.month
    }

    /// Four digit year as sent to the service, e.g. `"2023"`.
    pub fn year_string(self) -> String {
        format!("{:04}", self.year)
    }

    /// Zero padded month as sent to the service, e.g. `"07"`.
    pub fn month_string(self) -> String {
        format!("{:02}", self.month)
    }
}

impl Display for ReanalysisMonth {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Settings for the retrieval stage.
#[derive(Debug, Clone, Builder)]
pub struct RetrieveConfig {
    #[builder(default = DEFAULT_SERVICE_URL.to_string(), into)]
    pub service_url: String,
    /// Personal access token for the data service. Retrieval fails (and is logged) without one.
    #[builder(into)]
    pub access_key: Option<String>,
    #[builder(default = DEFAULT_DATASET.to_string(), into)]
    pub dataset: String,
    #[builder(default = JULY_2023)]
    pub period: ReanalysisMonth,
    #[builder(default = SAVOIE)]
    pub bounding_box: BoundingBox,
    #[builder(default = PathBuf::from(DEFAULT_GRID_FILE), into)]
    pub output_path: PathBuf,
    /// Delay between two job status requests while the service processes the request.
    #[builder(default = DEFAULT_POLL_INTERVAL)]
    pub poll_interval: Duration,
}

/// Settings for the tabulation stage.
#[derive(Debug, Clone, Builder)]
pub struct TabulateConfig {
    #[builder(default = PathBuf::from(DEFAULT_GRID_FILE), into)]
    pub input_path: PathBuf,
    #[builder(default = PathBuf::from(DEFAULT_TABLE_FILE), into)]
    pub output_path: PathBuf,
}

/// Settings for the rendering stage.
#[derive(Debug, Clone, Builder)]
pub struct RenderConfig {
    #[builder(default = PathBuf::from(DEFAULT_TABLE_FILE), into)]
    pub input_path: PathBuf,
    #[builder(default = PathBuf::from(DEFAULT_TIME_SERIES_FILE), into)]
    pub time_series_path: PathBuf,
    #[builder(default = PathBuf::from(DEFAULT_HEATMAP_FILE), into)]
    pub heatmap_path: PathBuf,
}

impl Default for TabulateConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_parse_order() -> Result<(), ConfigError> {
        let area: BoundingBox = " 46, 5.5 ,45,6.5".parse()?;
        assert_eq!(area.north, 46.0);
        assert_eq!(area.west, 5.5);
        assert_eq!(area.south, 45.0);
        assert_eq!(area.east, 6.5);
        assert_eq!(area.to_string(), "46,5.5,45,6.5");
        Ok(())
    }

    #[test]
    fn test_bounding_box_parse_errors() {
        assert_eq!(
            "46,5.5,45".parse::<BoundingBox>(),
            Err(ConfigError::BoundingBoxArity(3))
        );
        assert_eq!(
            "46,west,45,6.5".parse::<BoundingBox>(),
            Err(ConfigError::BoundingBoxValue("west".to_string()))
        );
    }

    #[test]
    fn test_bounding_box_serializes_as_array() -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(&SAVOIE)?;
        assert_eq!(json, "[46.0,5.5,45.0,6.5]");
        Ok(())
    }

    #[test]
    fn test_reanalysis_month_strings() -> Result<(), ConfigError> {
        let period = ReanalysisMonth::new(2023, 7)?;
        assert_eq!(period.year_string(), "2023");
        assert_eq!(period.month_string(), "07");
        assert_eq!(period.to_string(), "2023-07");
        assert_eq!(ReanalysisMonth::new(2023, 13), Err(ConfigError::InvalidMonth(13)));
        assert_eq!(ReanalysisMonth::new(23, 1), Err(ConfigError::InvalidYear(23)));
        Ok(())
    }

    #[test]
    fn test_reanalysis_month_parse() {
        assert_eq!(ReanalysisMonth::parse("2023", "07"), Ok(JULY_2023));
        assert_eq!(
            ReanalysisMonth::parse("twenty", "7"),
            Err(ConfigError::NotANumber {
                option: "Year",
                value: "twenty".to_string(),
            })
        );
        assert_eq!(
            ReanalysisMonth::parse("2023", "July"),
            Err(ConfigError::NotANumber {
                option: "Month",
                value: "July".to_string(),
            })
        );
        assert_eq!(
            ReanalysisMonth::parse("2023", "0"),
            Err(ConfigError::InvalidMonth(0))
        );
    }

    #[test]
    fn test_builder_defaults() {
        let config = RetrieveConfig::builder().access_key("secret").build();
        assert_eq!(config.service_url, DEFAULT_SERVICE_URL);
        assert_eq!(config.dataset, DEFAULT_DATASET);
        assert_eq!(config.period, JULY_2023);
        assert_eq!(config.bounding_box, SAVOIE);
        assert_eq!(config.output_path, PathBuf::from("temperature.nc"));
        assert_eq!(config.access_key.as_deref(), Some("secret"));

        let tabulate = TabulateConfig::default();
        assert_eq!(tabulate.input_path, PathBuf::from("temperature.nc"));
        assert_eq!(tabulate.output_path, PathBuf::from("final_data_simple.csv"));

        let render = RenderConfig::builder().input_path("other.csv").build();
        assert_eq!(render.input_path, PathBuf::from("other.csv"));
        assert_eq!(
            render.heatmap_path,
            PathBuf::from("result_temperature_map.png")
        );
    }
}
