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

//! clmforc converts a station observation record (a time-indexed CSV
//! table, e.g. merged ICOS data) into monthly single-point atmospheric
//! forcing files for CLM 5.0, handling physical unit conversion,
//! temporal resampling onto a regular output cadence and the fixed
//! NetCDF schema expected by the model.
//!
//! Each calendar month becomes one independent output file, so a
//! faulty month (e.g. a unit mismatch only present in winter data)
//! is skipped and reported without blocking the remaining months.

mod builder;
mod constants;
mod errors;

use cap::Cap;
use env_logger::Env;
use log::{error, info, warn};
use std::alloc;
use std::process::ExitCode;

type Float = f64;

/// Global allocator used by the builder.
///
/// Use of static global allocator allows for capping the memory to the limit set by user
/// in configuration file and in effect provide better [OOM error](https://en.wikipedia.org/wiki/Out_of_memory) handling.
#[global_allocator]
static ALLOCATOR: Cap<alloc::System> = Cap::new(alloc::System, usize::MAX);

/// The main program function.
/// Prepares the runtime environment and calls the [`builder::main`].
///
/// To provide meaningful and high-quality error messages the `env_logger`
/// needs to be initiated before any log messages are possible to occur.
///
/// The exit status reflects the best-effort batch contract: a single
/// month can be skipped without aborting the run, but a run that
/// skipped any month (or failed outright) exits non-zero.
fn main() -> ExitCode {
    #[cfg(not(feature = "debug"))]
    let logger_env = Env::new().filter_or("CLMFORC_LOG_LEVEL", "info");

    #[cfg(feature = "debug")]
    let logger_env = Env::new().filter_or("CLMFORC_LOG_LEVEL", "debug");

    env_logger::Builder::from_env(logger_env)
        .format_timestamp_millis()
        .init();

    match builder::main() {
        Ok(report) => {
            if report.failed.is_empty() {
                info!(
                    "Forcing generation finished, {} files written. Check the output directory and log.",
                    report.produced.len()
                );
                ExitCode::SUCCESS
            } else {
                warn!(
                    "Forcing generation finished, but {} of {} months were skipped. Check the log for details.",
                    report.failed.len(),
                    report.produced.len() + report.failed.len()
                );
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            error!("Forcing generation failed with error: {}", err);
            ExitCode::FAILURE
        }
    }
}
