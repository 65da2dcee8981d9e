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

//! Module containing constants used by the forcing builder.

use crate::Float;

/// Fill value written in place of missing samples in time-dependent
/// forcing variables, declared as both `_FillValue` and `missing_value`.
pub const TIME_DEPENDENT_FILL: Float = 1.0e36;

/// Fill value declared on the time-invariant geometry variables
/// (CF default fill for `f32`).
pub const GEOMETRY_FILL: f32 = 9.969_21e36;

/// Raw codes treated as missing values when none are configured.
/// These are the codes used by FLUXNET/ICOS data products.
pub const DEFAULT_MISSING_SENTINELS: [&str; 2] = ["-9999", "-9999.0"];

/// Seconds per hour, for the "hours since" time axis of each file.
pub const SECONDS_PER_HOUR: Float = 3600.0;

/// Downstream consumer recorded in the global attributes.
pub const USED_FOR: &str = "Singlepoint CLM 5.0";
