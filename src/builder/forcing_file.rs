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

//! Module responsible for serializing one partition's aggregated
//! series into a CLM 5.0 single-point forcing file.
//!
//! The dimension, variable and attribute layout is the fixed contract
//! the model reads; nothing in it is configurable beyond the variable
//! set, the destination units and the site geometry. An existing file
//! of the same name is overwritten, callers needing append-safety
//! must pre-check.

use crate::builder::aggregation::TimePartition;
use crate::builder::configuration::{Config, Site, VariableSpec};
use crate::constants::{GEOMETRY_FILL, SECONDS_PER_HOUR, TIME_DEPENDENT_FILL, USED_FOR};
use crate::errors::PartitionError;
use crate::Float;
use chrono::Utc;
use ndarray::Array1;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Writes one monthly forcing file and returns its path.
///
/// Every series must hold exactly the number of samples the
/// partition's time axis declares; a mismatch fails the partition
/// rather than silently truncating or padding.
pub fn write_forcing_file(
    config: &Config,
    partition: TimePartition,
    series: &BTreeMap<String, Vec<Float>>,
) -> Result<PathBuf, PartitionError> {
    let cadence = config.time_range.output_cadence;
    let intervals = partition.interval_count(cadence);

    for (name, values) in series {
        if values.len() != intervals {
            return Err(PartitionError::SchemaViolation {
                variable: name.clone(),
                expected: intervals,
                actual: values.len(),
            });
        }
    }

    let path = config
        .output
        .directory
        .join(format!("{}.nc", partition));

    let mut file = netcdf::create(&path)?;

    file.add_dimension("scalar", 1)?;
    file.add_dimension("lon", 1)?;
    file.add_dimension("lat", 1)?;
    file.add_unlimited_dimension("time")?;

    write_global_attributes(&mut file, config)?;
    write_time_axis(&mut file, partition, cadence, intervals)?;
    write_site_geometry(&mut file, &config.site)?;

    for (name, spec) in &config.variables {
        if let Some(values) = series.get(name) {
            write_time_dependent(&mut file, name, spec, values)?;
        }
    }

    Ok(path)
}

fn write_global_attributes(
    file: &mut netcdf::FileMut,
    config: &Config,
) -> Result<(), netcdf::Error> {
    let generated_by = config
        .output
        .generated_by
        .clone()
        .unwrap_or_else(|| format!("clmforc {}", env!("CARGO_PKG_VERSION")));
    let based_on = config
        .output
        .data_source
        .clone()
        .unwrap_or_else(|| config.input.path.display().to_string());

    file.add_attribute("Forcings_generated_by", generated_by.as_str())?;
    file.add_attribute(
        "on_date",
        Utc::now().format("%Y%m%d%H%M").to_string().as_str(),
    )?;
    file.add_attribute("based_on", based_on.as_str())?;
    file.add_attribute("used_for", USED_FOR)?;

    Ok(())
}

fn write_time_axis(
    file: &mut netcdf::FileMut,
    partition: TimePartition,
    cadence: u32,
    intervals: usize,
) -> Result<(), netcdf::Error> {
    let step_hours = Float::from(cadence) / SECONDS_PER_HOUR;
    let hours = Array1::linspace(0.0, step_hours * (intervals - 1) as Float, intervals);
    let hours: Vec<f32> = hours.iter().map(|h| *h as f32).collect();

    let mut time = file.add_variable::<f32>("time", &["time"])?;
    time.put_attribute("long_name", "observation time")?;
    time.put_attribute(
        "units",
        format!(
            "hours since {:04}-{:02}-01 00:00:00",
            partition.year, partition.month
        )
        .as_str(),
    )?;
    time.put_attribute("calendar", "gregorian")?;
    time.put_attribute("axis", "T")?;
    time.put_values(&hours, [0..intervals])?;

    Ok(())
}

fn write_site_geometry(file: &mut netcdf::FileMut, site: &Site) -> Result<(), netcdf::Error> {
    let buffer = site.coordinate_buffer;

    let cells: [(&str, &str, &str, Float); 6] = [
        ("LONGXY", "longitude", "degrees E", site.longitude),
        ("LATIXY", "latitude", "degrees N", site.latitude),
        ("LONE", "longitude of east edge", "degrees E", site.longitude + buffer),
        ("LATN", "latitude of north edge", "degrees N", site.latitude + buffer),
        ("LONW", "longitude of west edge", "degrees E", site.longitude - buffer),
        ("LATS", "latitude of south edge", "degrees N", site.latitude - buffer),
    ];

    for (name, long_name, units, value) in cells {
        let mut var = file.add_variable::<f32>(name, &["lat", "lon"])?;
        var.put_attribute("_FillValue", GEOMETRY_FILL)?;
        var.put_attribute("long_name", long_name)?;
        var.put_attribute("units", units)?;
        var.put_attribute("mode", "time-invariant")?;
        var.put_values(&[value as f32], (0..1, 0..1))?;
    }

    // the scalar edges carry the site coordinate itself,
    // not the buffered cell edges
    let edges: [(&str, &str, &str, Float); 4] = [
        ("EDGEN", "northern edge in atmospheric data", "degrees N", site.latitude),
        ("EDGEE", "eastern edge in atmospheric data", "degrees E", site.longitude),
        ("EDGES", "southern edge in atmospheric data", "degrees N", site.latitude),
        ("EDGEW", "western edge in atmospheric data", "degrees E", site.longitude),
    ];

    for (name, long_name, units, value) in edges {
        let mut var = file.add_variable::<f32>(name, &["scalar"])?;
        var.put_attribute("long_name", long_name)?;
        var.put_attribute("units", units)?;
        var.put_attribute("mode", "time-invariant")?;
        var.put_values(&[value as f32], [0..1])?;
    }

    Ok(())
}

fn write_time_dependent(
    file: &mut netcdf::FileMut,
    name: &str,
    spec: &VariableSpec,
    values: &[Float],
) -> Result<(), netcdf::Error> {
    let long_name = spec.long_name.as_deref().unwrap_or(name);
    let data: Vec<Float> = values
        .iter()
        .map(|v| if v.is_nan() { TIME_DEPENDENT_FILL } else { *v })
        .collect();

    let mut var = file.add_variable::<Float>(name, &["time", "lat", "lon"])?;
    var.put_attribute("_FillValue", TIME_DEPENDENT_FILL)?;
    var.put_attribute("long_name", long_name)?;
    var.put_attribute("units", spec.destination_unit.as_str())?;
    var.put_attribute("missing_value", TIME_DEPENDENT_FILL)?;
    var.put_attribute("mode", "time-dependent")?;
    var.put_values(&data, (0..data.len(), 0..1, 0..1))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::test_support::test_config;

    fn written_file(series_value: Float) -> (tempfile::TempDir, PathBuf, usize) {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let partition = TimePartition { year: 2014, month: 1 };
        let intervals = partition.interval_count(config.time_range.output_cadence);

        let mut series = BTreeMap::new();
        for name in config.variables.keys() {
            series.insert(name.clone(), vec![series_value; intervals]);
        }

        let path = write_forcing_file(&config, partition, &series).unwrap();
        (dir, path, intervals)
    }

    #[test]
    fn file_matches_the_declared_schema() {
        let (_dir, path, intervals) = written_file(1.5);
        let file = netcdf::open(&path).unwrap();

        for dimension in ["scalar", "lon", "lat", "time"] {
            assert!(file.dimension(dimension).is_some(), "missing {}", dimension);
        }
        assert_eq!(file.dimension("lat").unwrap().len(), 1);
        assert_eq!(file.dimension("time").unwrap().len(), intervals);

        for geometry in ["LONGXY", "LATIXY", "LONE", "LATN", "LONW", "LATS"] {
            assert!(file.variable(geometry).is_some(), "missing {}", geometry);
        }
        for edge in ["EDGEN", "EDGEE", "EDGES", "EDGEW"] {
            assert!(file.variable(edge).is_some(), "missing {}", edge);
        }

        let time = file.variable("time").unwrap();
        let hours: Vec<f32> = time.get_values([0..2]).unwrap();
        assert_eq!(hours, vec![0.0, 6.0]);

        let prect = file.variable("PRECTmms").unwrap();
        let values: Vec<Float> = prect.get_values((0..2, 0..1, 0..1)).unwrap();
        assert_eq!(values, vec![1.5, 1.5]);
    }

    #[test]
    fn units_come_from_the_destination_unit() {
        let (_dir, path, _) = written_file(0.0);
        let file = netcdf::open(&path).unwrap();

        let prect = file.variable("PRECTmms").unwrap();
        let units = prect.attribute_value("units").unwrap().unwrap();
        assert_eq!(units, netcdf::AttributeValue::Str("mm/s".to_string()));

        let tbot = file.variable("TBOT").unwrap();
        let units = tbot.attribute_value("units").unwrap().unwrap();
        assert_eq!(units, netcdf::AttributeValue::Str("K".to_string()));
    }

    #[test]
    fn nan_is_written_as_the_fill_value() {
        let (_dir, path, intervals) = written_file(Float::NAN);
        let file = netcdf::open(&path).unwrap();

        let tbot = file.variable("TBOT").unwrap();
        let values: Vec<Float> = tbot
            .get_values((0..intervals, 0..1, 0..1))
            .unwrap();
        assert!(values.iter().all(|v| *v == TIME_DEPENDENT_FILL));
    }

    #[test]
    fn short_series_is_a_schema_violation() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let partition = TimePartition { year: 2014, month: 1 };

        let mut series = BTreeMap::new();
        for name in config.variables.keys() {
            series.insert(name.clone(), vec![0.0; 3]);
        }

        let result = write_forcing_file(&config, partition, &series);
        assert!(matches!(
            result,
            Err(PartitionError::SchemaViolation { expected, actual: 3, .. })
                if expected == 31 * 4
        ));
    }
}
