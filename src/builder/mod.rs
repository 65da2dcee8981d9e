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

//! Module containing the actual forcing builder code.
//!
//! The builder is a single pass over the requested coverage window:
//! load the observation record once, then build one independent
//! monthly file per (year, month) partition. Partitions share nothing
//! mutable, so they are deployed onto a thread pool and any partition
//! failure only skips that month.

mod aggregation;
mod configuration;
mod forcing_file;
mod observations;
mod units;

use crate::builder::aggregation::TimePartition;
use crate::builder::configuration::Config;
use crate::builder::observations::ObservationRecord;
use crate::builder::units::Conversion;
use crate::errors::{BuilderError, PartitionError};
use crate::{Float, ALLOCATOR};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::{
    collections::BTreeMap,
    env, fs,
    path::{Path, PathBuf},
    sync::{mpsc, Arc},
};

/// Per-run outcome of the best-effort batch. Produced and failed
/// partitions together cover the whole requested window.
#[derive(Debug, Default)]
pub struct RunReport {
    pub produced: Vec<TimePartition>,
    pub failed: Vec<(TimePartition, PartitionError)>,
}

/// Main builder function, responsible for all conversion steps.
///
/// It reads the provided configuration and the observation table,
/// deploys the monthly partitions onto the threadpool and collects
/// the per-partition results into a [`RunReport`].
pub fn main() -> Result<RunReport, BuilderError> {
    info!("Preparing the forcing builder core");

    let config_path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.yaml"));

    let core = Core::new(&config_path)?;
    run(core)
}

/// Runs the partition fan-out for an already prepared [`Core`].
fn run(core: Core) -> Result<RunReport, BuilderError> {
    prepare_output_dir(&core.config.output.directory)?;

    let partitions = aggregation::partitions(&core.config.time_range);
    let partitions_count = partitions.len();

    let config = Arc::new(core.config);
    let record = Arc::new(core.record);

    info!("Building {} monthly forcing files", partitions_count);

    // set progress bar for built months
    let months_bar = ProgressBar::new(partitions_count as u64);
    months_bar.set_style(
        ProgressStyle::default_bar()
            .template("{prefix} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .progress_chars("#>-"),
    );
    months_bar.set_prefix("Built months");

    // deploy partitions on to the threadpool
    let (tx, rx) = mpsc::channel();

    for partition in partitions {
        let tx = tx.clone();
        let config = Arc::clone(&config);
        let record = Arc::clone(&record);

        core.threadpool.spawn(move || {
            tx.send((partition, build_partition(partition, &config, &record)))
                .unwrap();
        });
    }

    // receive partition results and build the run report
    let mut report = RunReport::default();

    for _ in 0..partitions_count {
        let (partition, result) = rx.recv().expect("Receiving partition result failed");

        match result {
            Ok(path) => {
                debug!("Wrote {}", path.display());
                report.produced.push(partition);
            }
            Err(err) => {
                error!("Skipped month {} due to an error: {}", partition, err);
                // this is neccessary to make sure that all error messages
                // are fully written to stdout before the progress bar updates
                println!();
                report.failed.push((partition, err));
            }
        }
        months_bar.inc(1);
    }

    months_bar.finish_with_message("All months finished");

    report.produced.sort();
    report.failed.sort_by_key(|(partition, _)| *partition);

    Ok(report)
}

/// Structure containing the builder's shared, read-only state.
#[derive(Debug)]
pub struct Core {
    pub config: Config,
    pub threadpool: ThreadPool,
    pub record: ObservationRecord,
}

impl Core {
    /// Builder [`Core`] constructor.
    ///
    /// Before any partition can be built the configuration and the
    /// observation table provided by the user must be loaded and
    /// checked; failures here are fatal, the record is shared by
    /// every partition.
    pub fn new(config_path: &Path) -> Result<Self, BuilderError> {
        debug!("Reading configuration from {}", config_path.display());
        let config = Config::new_from_file(config_path)?;

        debug!("Setting memory limit");
        ALLOCATOR
            .set_limit(config.resources.memory * 1024 * 1024)
            .unwrap();

        debug!("Setting up ThreadPool");
        let threadpool = ThreadPoolBuilder::new()
            .num_threads(config.resources.threads as usize)
            .build()?;

        debug!("Reading the observation table");
        let record = ObservationRecord::new_from_csv(&config.input)?;
        info!(
            "Loaded {} observation rows with {} configured variables",
            record.len(),
            config.variables.len()
        );

        if record.is_empty() {
            warn!("Observation table has no rows; every month will be fill-valued");
        }

        // missing columns still fail per partition, but naming them
        // up front saves the user a log hunt
        for (name, spec) in &config.variables {
            if !record.has_column(&spec.source_column) {
                warn!(
                    "Variable '{}' reads from column '{}' which is not in the observation record",
                    name, spec.source_column
                );
            }
        }

        Ok(Core {
            config,
            threadpool,
            record,
        })
    }
}

/// Creates the output root directory if absent. An uncreatable root
/// is fatal, nothing could be written at all.
fn prepare_output_dir(out_path: &Path) -> Result<(), BuilderError> {
    debug!("Checking and setting output directory");

    if !out_path.is_dir() {
        fs::create_dir_all(out_path)?;
    }

    Ok(())
}

/// Builds one monthly forcing file: per configured variable, resolve
/// the source column, convert units, apply the scaling factor,
/// resample onto the output cadence, then serialize.
///
/// A pure function of the shared read-only state and the partition,
/// which is what makes the thread-pool fan-out coordination-free.
fn build_partition(
    partition: TimePartition,
    config: &Config,
    record: &ObservationRecord,
) -> Result<PathBuf, PartitionError> {
    let cadence = config.time_range.output_cadence;

    // only the partition's window of rows matters, the index
    // is monotonically non-decreasing
    let timestamps = record.timestamps();
    let first = timestamps.partition_point(|t| *t < partition.start());
    let last = timestamps.partition_point(|t| *t < partition.end());

    let mut series: BTreeMap<String, Vec<Float>> = BTreeMap::new();

    for (name, spec) in &config.variables {
        let column =
            record
                .column(&spec.source_column)
                .ok_or_else(|| PartitionError::MissingColumn {
                    variable: name.clone(),
                    column: spec.source_column.clone(),
                })?;

        let conversion = Conversion::between(&spec.source_unit, &spec.destination_unit)?;
        let converted = conversion.apply_series(&column[first..last], spec.scaling_factor);

        let resampled = aggregation::resample_mean(
            &timestamps[first..last],
            &converted,
            partition,
            cadence,
        );

        series.insert(name.clone(), resampled);
    }

    forcing_file::write_forcing_file(config, partition, &series)
}
