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

//! Error types of the forcing builder, split into fatal errors
//! ([`BuilderError`] and its sources) that end the whole run and
//! [`PartitionError`]s that only skip one monthly output file.

use thiserror::Error;

/// Top-level error ending the whole run. Configuration and
/// observation-load failures are fatal because the record and the
/// variable table are shared by all monthly partitions.
#[derive(Error, Debug)]
pub enum BuilderError {
    #[error("Error while reading the configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Error while loading the observation record: {0}")]
    Load(#[from] LoadError),

    #[error("Cannot create the output directory: {0}")]
    FaultyOutput(#[from] std::io::Error),

    #[error("Error while creating ThreadPool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot open the configuration file: {0}")]
    CantOpenFile(#[from] std::io::Error),

    #[error("Cannot deserialize the configuration file: {0}")]
    CantDeserialize(#[from] serde_yaml::Error),

    #[error("Configuration component is out of bounds: {0}")]
    OutOfBounds(&'static str),
}

/// Errors raised while parsing the observation table.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Cannot read the observation table: {0}")]
    Csv(#[from] csv::Error),

    #[error("Observation table has no time column named '{0}'")]
    MissingTimeColumn(String),

    #[error("Cannot parse timestamp '{value}' in data row {row} with format '{format}'")]
    Timestamp {
        value: String,
        row: usize,
        format: String,
    },

    #[error("Cannot parse value '{value}' in column '{column}', data row {row}")]
    Value {
        value: String,
        column: String,
        row: usize,
    },

    #[error("Timestamps are not monotonically non-decreasing at data row {0}")]
    Unordered(usize),
}

/// Errors confined to a single (year, month) partition. Any of these
/// skips the affected monthly file and lets the run continue.
#[derive(Error, Debug)]
pub enum PartitionError {
    #[error("{0}")]
    UnsupportedUnit(#[from] UnitError),

    #[error("Variable '{variable}' reads from column '{column}' which is not in the observation record")]
    MissingColumn { variable: String, column: String },

    #[error("Variable '{variable}' has {actual} aggregated samples but the time axis declares {expected}")]
    SchemaViolation {
        variable: String,
        expected: usize,
        actual: usize,
    },

    #[error("Cannot write the forcing file: {0}")]
    FileWrite(#[from] netcdf::Error),
}

/// Errors of the closed unit-conversion table. Unknown labels and
/// dimensionally undefined pairs fail instead of passing through.
#[derive(Error, Debug)]
pub enum UnitError {
    #[error("Unit '{0}' is not in the table of supported units")]
    UnknownUnit(String),

    #[error("No conversion is defined from '{from}' to '{to}'")]
    IncompatibleDimensions { from: String, to: String },
}
