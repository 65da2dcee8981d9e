/*
Copyright 2026 the clmforc developers

This file is part of the CLM Single-Point Forcing Builder (clmforc).

clmforc is a free software: you can redistribute it and/or modify
it under the terms of the GNU General Public License as published by
the Free Software Foundation; either version 3 of the License, or
(at your option) any later version.

clmforc is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with clmforc. If not, see https://www.gnu.org/licenses/.
*/

//! Module responsible for parsing and checking the configuration file.
//!
//! To provide meaningful error messages. The configuration file uses
//! [YAML](https://en.wikipedia.org/wiki/YAML) and `serde` to enforce
//! strong typing and automatic type checking.
//!
//! The structures and their fields in this module directly correspond to
//! the fields inside `config.yaml` so you can check this documentation
//! for more details how to set the config file.

use crate::constants::DEFAULT_MISSING_SENTINELS;
use crate::errors::ConfigError;
use crate::Float;
use serde::Deserialize;
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Fields describing the source observation table.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Input {
    /// Path to the CSV observation table, one row per timestamp.
    pub path: PathBuf,

    /// Name of the column holding the timestamps.
    pub time_column: String,

    /// `strftime`-style format of the timestamp column,
    /// e.g. `%Y-%m-%d %H:%M:%S`.
    ///
    /// Timestamps are assumed to already represent UTC. This is
    /// site metadata, not something the builder can detect.
    pub time_format: String,

    /// _(Optional)_ Raw codes converted to missing values on load.
    ///
    /// Defaults to the FLUXNET/ICOS codes `-9999` and `-9999.0`.
    #[serde(default = "Input::default_missing_value_sentinels")]
    pub missing_value_sentinels: Vec<String>,
}

impl Input {
    fn default_missing_value_sentinels() -> Vec<String> {
        DEFAULT_MISSING_SENTINELS
            .iter()
            .map(|s| (*s).to_string())
            .collect()
    }
}

/// One output forcing variable and how to derive it from the table.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct VariableSpec {
    /// Column of the observation table this variable reads from.
    pub source_column: String,

    /// Physical unit of the source column, e.g. `mm/30min` or `degC`.
    pub source_unit: String,

    /// Physical unit written to the forcing file, e.g. `mm/s` or `K`.
    pub destination_unit: String,

    /// _(Optional)_ Dimensionless multiplier applied after the unit
    /// conversion, e.g. to turn an accumulation rate into an
    /// instantaneous rate consistent with the output cadence.
    ///
    /// Defaults to `1.0`.
    #[serde(default = "VariableSpec::default_scaling_factor")]
    pub scaling_factor: Float,

    /// _(Optional)_ `long_name` attribute written to the forcing file.
    ///
    /// Defaults to the output variable name.
    #[serde(default)]
    pub long_name: Option<String>,
}

impl VariableSpec {
    fn default_scaling_factor() -> Float {
        1.0
    }
}

/// Fields with the requested coverage window and output cadence.
#[derive(Copy, Clone, PartialEq, Debug, Deserialize)]
pub struct TimeRange {
    /// First year to produce forcing files for.
    pub start_year: i32,

    /// Last year to produce forcing files for (inclusive).
    pub end_year: i32,

    /// _(Optional)_ First month of the first year. Defaults to `1`.
    #[serde(default = "TimeRange::default_start_month")]
    pub start_month: u32,

    /// _(Optional)_ Last month of the last year (inclusive).
    /// Defaults to `12`.
    #[serde(default = "TimeRange::default_end_month")]
    pub end_month: u32,

    /// Output timestep in seconds.
    ///
    /// Must divide a whole day so that output intervals stay aligned
    /// with calendar month boundaries. Cannot be shorter than `60`.
    pub output_cadence: u32,
}

impl TimeRange {
    fn default_start_month() -> u32 {
        1
    }

    fn default_end_month() -> u32 {
        12
    }

    /// Checks if the coverage window and cadence follow
    /// conventions and limits.
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if !(1..=12).contains(&self.start_month) || !(1..=12).contains(&self.end_month) {
            return Err(ConfigError::OutOfBounds(
                "Months must be in the 1..=12 range",
            ));
        }

        if self.start_year > self.end_year {
            return Err(ConfigError::OutOfBounds(
                "Start year cannot be after end year",
            ));
        }

        if self.start_year == self.end_year && self.start_month > self.end_month {
            return Err(ConfigError::OutOfBounds(
                "Start month cannot be after end month within one year",
            ));
        }

        if self.output_cadence < 60 {
            return Err(ConfigError::OutOfBounds(
                "Output cadence cannot be shorter than 60 seconds",
            ));
        }

        if 86_400 % self.output_cadence != 0 {
            return Err(ConfigError::OutOfBounds(
                "Output cadence must divide a whole day",
            ));
        }

        Ok(())
    }
}

/// Fields with the site geometry written to every forcing file.
#[derive(Copy, Clone, PartialEq, Debug, Deserialize)]
pub struct Site {
    /// Site longitude in degrees E.
    ///
    /// Must meet the condition: `-180 < longitude < 180`
    pub longitude: Float,

    /// Site latitude in degrees N.
    ///
    /// Must meet the condition: `-90 < latitude < 90`
    pub latitude: Float,

    /// _(Optional)_ Half-width in degrees of the single grid cell
    /// around the site, used for the cell edge variables.
    ///
    /// Defaults to `0.01`. Must be positive.
    #[serde(default = "Site::default_coordinate_buffer")]
    pub coordinate_buffer: Float,
}

impl Site {
    fn default_coordinate_buffer() -> Float {
        0.01
    }

    /// Checks if the site coordinate follows conventions and limits.
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if !(-90.0..90.0).contains(&self.latitude) {
            return Err(ConfigError::OutOfBounds(
                "Site latitude is too low or too high",
            ));
        }

        if !(-180.0..180.0).contains(&self.longitude) {
            return Err(ConfigError::OutOfBounds(
                "Site longitude is too low or too high",
            ));
        }

        if !(self.coordinate_buffer > 0.0) {
            return Err(ConfigError::OutOfBounds(
                "Coordinate buffer must be positive",
            ));
        }

        Ok(())
    }
}

/// Fields describing the output location and provenance attributes.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Output {
    /// Directory the monthly forcing files are written to.
    /// Created if absent; existing files are overwritten.
    pub directory: PathBuf,

    /// _(Optional)_ Value of the `Forcings_generated_by` global
    /// attribute. Defaults to the crate name and version.
    #[serde(default)]
    pub generated_by: Option<String>,

    /// _(Optional)_ Value of the `based_on` global attribute.
    /// Defaults to the input table path.
    #[serde(default)]
    pub data_source: Option<String>,
}

/// _(Optional)_ Fields with information about
/// resources available for the builder.
#[derive(Clone, PartialEq, PartialOrd, Debug, Deserialize)]
pub struct Resources {
    /// _(Optional)_ Thread count used by the builder. Monthly files
    /// are independent, so the thread pool builds up to this many
    /// of them concurrently.
    ///
    /// Cannot be less than `1`. Defaults to `1`.
    #[serde(default = "Resources::default_threads")]
    pub threads: u16,

    /// _(Optional)_ Heap memory limit for the builder in MB.
    /// Useful for enabling meaningful Out-of-memory error messages.
    ///
    /// Cannot be less than `128`. Defaults to whole addressable-space
    /// (`2^32` or `2^64` bytes).
    #[serde(default = "Resources::default_memory")]
    pub memory: usize,
}

impl Resources {
    fn default_threads() -> u16 {
        1
    }

    fn default_memory() -> usize {
        usize::MAX / (1024 * 1024)
    }

    /// Checks if thread count and memory limit are
    /// above limits.
    pub fn check_bounds(&self) -> Result<(), ConfigError> {
        if self.threads < 1 {
            return Err(ConfigError::OutOfBounds(
                "Available threads cannot be less than 1",
            ));
        }

        if self.memory < 128 {
            return Err(ConfigError::OutOfBounds(
                "Available memory cannot be less than 128 MB",
            ));
        }

        Ok(())
    }
}

impl Default for Resources {
    fn default() -> Self {
        Resources {
            threads: Resources::default_threads(),
            memory: Resources::default_memory(),
        }
    }
}

/// Main config structure representing the fields in
/// configuration file.
#[derive(Clone, PartialEq, Debug, Deserialize)]
pub struct Config {
    pub input: Input,

    /// Output variable name → recipe. A `BTreeMap` keeps the variable
    /// order in the produced files stable across runs.
    pub variables: BTreeMap<String, VariableSpec>,

    pub time_range: TimeRange,

    pub site: Site,

    pub output: Output,

    #[serde(default)]
    pub resources: Resources,
}

impl Config {
    /// Config structure constructor, responsible for
    /// deserializing configuration and checking it.
    pub fn new_from_file(file_path: &Path) -> Result<Config, ConfigError> {
        let data = fs::read(file_path)?;
        let config: Config = serde_yaml::from_slice(data.as_slice())?;

        if config.variables.is_empty() {
            return Err(ConfigError::OutOfBounds(
                "At least one output variable must be configured",
            ));
        }

        config.time_range.check_bounds()?;
        config.site.check_bounds()?;
        config.resources.check_bounds()?;

        Ok(config)
    }
}
