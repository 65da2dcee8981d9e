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

//! Closed table of physical units the builder can convert between.
//!
//! Every supported unit is an affine map onto the canonical unit of
//! its dimension (K, Pa, mm/s, W/m^2, %, m/s). Converting between two
//! units of the same dimension composes the two maps; anything else
//! is refused with a [`UnitError`] instead of passing through, so a
//! mislabeled column fails its month loudly rather than producing
//! silently wrong forcing.

use crate::errors::UnitError;
use crate::Float;

/// Physical dimension a unit belongs to. Conversion is only defined
/// within one dimension.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Dimension {
    Temperature,
    Pressure,
    PrecipitationRate,
    Irradiance,
    RelativeHumidity,
    WindSpeed,
}

/// A unit expressed as `canonical = value * scale + offset`.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Unit {
    pub dimension: Dimension,
    scale: Float,
    offset: Float,
}

impl Unit {
    /// Looks a unit label up in the table.
    pub fn parse(label: &str) -> Result<Unit, UnitError> {
        use Dimension::*;

        let unit = match label.trim() {
            "K" => Unit::linear(Temperature, 1.0),
            "degC" | "°C" | "C" => Unit::affine(Temperature, 1.0, 273.15),

            "Pa" => Unit::linear(Pressure, 1.0),
            "hPa" => Unit::linear(Pressure, 100.0),
            "kPa" => Unit::linear(Pressure, 1000.0),
            "MPa" => Unit::linear(Pressure, 1.0e6),

            "mm/s" => Unit::linear(PrecipitationRate, 1.0),
            "mm/min" => Unit::linear(PrecipitationRate, 1.0 / 60.0),
            "mm/30min" => Unit::linear(PrecipitationRate, 1.0 / 1800.0),
            "mm/h" | "mm/hour" => Unit::linear(PrecipitationRate, 1.0 / 3600.0),
            "mm/d" | "mm/day" => Unit::linear(PrecipitationRate, 1.0 / 86400.0),

            "W/m^2" | "W/m2" => Unit::linear(Irradiance, 1.0),

            "%" => Unit::linear(RelativeHumidity, 1.0),
            "portion" | "fraction" => Unit::linear(RelativeHumidity, 100.0),

            "m/s" => Unit::linear(WindSpeed, 1.0),

            unknown => return Err(UnitError::UnknownUnit(unknown.to_string())),
        };

        Ok(unit)
    }

    fn linear(dimension: Dimension, scale: Float) -> Unit {
        Unit::affine(dimension, scale, 0.0)
    }

    fn affine(dimension: Dimension, scale: Float, offset: Float) -> Unit {
        Unit {
            dimension,
            scale,
            offset,
        }
    }
}

/// Affine conversion between two units of the same dimension,
/// composed with the per-variable scaling factor.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct Conversion {
    scale: Float,
    offset: Float,
}

impl Conversion {
    /// Builds the conversion between two unit labels. Fails if either
    /// label is unknown or the dimensions differ.
    pub fn between(source: &str, destination: &str) -> Result<Conversion, UnitError> {
        let src = Unit::parse(source)?;
        let dst = Unit::parse(destination)?;

        if src.dimension != dst.dimension {
            return Err(UnitError::IncompatibleDimensions {
                from: source.trim().to_string(),
                to: destination.trim().to_string(),
            });
        }

        Ok(Conversion {
            scale: src.scale / dst.scale,
            offset: (src.offset - dst.offset) / dst.scale,
        })
    }

    /// Converts a single value. NaN in, NaN out.
    pub fn apply(&self, value: Float) -> Float {
        value * self.scale + self.offset
    }

    /// Converts a whole series and applies the variable's scaling
    /// factor afterwards, per the conversion contract.
    pub fn apply_series(&self, values: &[Float], scaling_factor: Float) -> Vec<Float> {
        values
            .iter()
            .map(|v| self.apply(*v) * scaling_factor)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    const ROUND_TRIP_PAIRS: [(&str, &str); 8] = [
        ("degC", "K"),
        ("kPa", "Pa"),
        ("MPa", "Pa"),
        ("hPa", "kPa"),
        ("mm/30min", "mm/s"),
        ("mm/h", "mm/d"),
        ("portion", "%"),
        ("m/s", "m/s"),
    ];

    #[test]
    fn round_trips_recover_the_original_value() {
        for (a, b) in ROUND_TRIP_PAIRS {
            let forward = Conversion::between(a, b).unwrap();
            let backward = Conversion::between(b, a).unwrap();

            let value = 17.35;
            let restored = backward.apply(forward.apply(value));

            assert!(
                approx_eq!(Float, restored, value, epsilon = 1.0e-9),
                "{} -> {} -> {} gave {}",
                a,
                b,
                a,
                restored
            );
        }
    }

    #[test]
    fn celsius_to_kelvin_is_affine() {
        let conversion = Conversion::between("degC", "K").unwrap();

        assert!(approx_eq!(Float, conversion.apply(0.0), 273.15));
        assert!(approx_eq!(Float, conversion.apply(-40.0), 233.15));
    }

    #[test]
    fn kilopascal_to_pascal() {
        let conversion = Conversion::between("kPa", "Pa").unwrap();

        assert!(approx_eq!(Float, conversion.apply(101.325), 101_325.0));
    }

    #[test]
    fn precipitation_chain_with_scaling_factor() {
        // 3.6 mm/h is 0.001 mm/s, halved by the scaling factor.
        let conversion = Conversion::between("mm/h", "mm/s").unwrap();

        assert!(approx_eq!(Float, conversion.apply(3.6), 0.001));

        let scaled = conversion.apply_series(&[3.6], 0.5);
        assert!(approx_eq!(Float, scaled[0], 0.0005));
    }

    #[test]
    fn identical_units_pass_through() {
        let conversion = Conversion::between("W/m^2", "W/m^2").unwrap();

        assert_eq!(conversion.apply(421.7), 421.7);
    }

    #[test]
    fn nan_propagates_and_finite_stays_finite() {
        let conversion = Conversion::between("degC", "K").unwrap();
        let series = conversion.apply_series(&[1.0, Float::NAN, -5.0], 1.0);

        assert!(series[0].is_finite());
        assert!(series[1].is_nan());
        assert!(series[2].is_finite());
    }

    #[test]
    fn unknown_unit_is_refused() {
        assert!(matches!(
            Conversion::between("furlong/fortnight", "mm/s"),
            Err(UnitError::UnknownUnit(_))
        ));
    }

    #[test]
    fn cross_dimension_conversion_is_refused() {
        assert!(matches!(
            Conversion::between("mm/s", "K"),
            Err(UnitError::IncompatibleDimensions { .. })
        ));

        // a rate to a non-rate without an implied time base
        assert!(matches!(
            Conversion::between("mm/h", "m/s"),
            Err(UnitError::IncompatibleDimensions { .. })
        ));
    }
}
