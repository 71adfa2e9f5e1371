// Unit table and linear conversion between units of the same dimension.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Length,
    Count,
    Frequency,
    Pressure,
}

/// Measurement unit; serializes to its symbol (e.g. "km", "count/min").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "m")]
    Meter,
    #[serde(rename = "km")]
    Kilometer,
    #[serde(rename = "cm")]
    Centimeter,
    #[serde(rename = "mi")]
    Mile,
    #[serde(rename = "yd")]
    Yard,
    #[serde(rename = "ft")]
    Foot,
    #[serde(rename = "count")]
    Count,
    #[serde(rename = "count/min")]
    CountPerMinute,
    #[serde(rename = "count/s")]
    CountPerSecond,
    #[serde(rename = "mmHg")]
    MillimeterOfMercury,
    #[serde(rename = "kPa")]
    Kilopascal,
}

impl Unit {
    pub const ALL: [Unit; 11] = [
        Unit::Meter,
        Unit::Kilometer,
        Unit::Centimeter,
        Unit::Mile,
        Unit::Yard,
        Unit::Foot,
        Unit::Count,
        Unit::CountPerMinute,
        Unit::CountPerSecond,
        Unit::MillimeterOfMercury,
        Unit::Kilopascal,
    ];

    pub fn dimension(self) -> Dimension {
        match self {
            Unit::Meter
            | Unit::Kilometer
            | Unit::Centimeter
            | Unit::Mile
            | Unit::Yard
            | Unit::Foot => Dimension::Length,
            Unit::Count => Dimension::Count,
            Unit::CountPerMinute | Unit::CountPerSecond => Dimension::Frequency,
            Unit::MillimeterOfMercury | Unit::Kilopascal => Dimension::Pressure,
        }
    }

    /// Multiplier taking a value in this unit to the dimension's base unit
    /// (meter, count, count/min, mmHg).
    fn factor_to_base(self) -> f64 {
        match self {
            Unit::Meter => 1.0,
            Unit::Kilometer => 1000.0,
            Unit::Centimeter => 0.01,
            Unit::Mile => 1609.344,
            Unit::Yard => 0.9144,
            Unit::Foot => 0.3048,
            Unit::Count => 1.0,
            Unit::CountPerMinute => 1.0,
            Unit::CountPerSecond => 60.0,
            Unit::MillimeterOfMercury => 1.0,
            Unit::Kilopascal => 7.500_615_758,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Unit::Meter => "m",
            Unit::Kilometer => "km",
            Unit::Centimeter => "cm",
            Unit::Mile => "mi",
            Unit::Yard => "yd",
            Unit::Foot => "ft",
            Unit::Count => "count",
            Unit::CountPerMinute => "count/min",
            Unit::CountPerSecond => "count/s",
            Unit::MillimeterOfMercury => "mmHg",
            Unit::Kilopascal => "kPa",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UnitError {
    #[error("cannot convert {from} to {to}: incompatible dimensions")]
    Incompatible { from: Unit, to: Unit },
}

/// Converts `value` from one unit to another of the same dimension.
pub fn convert(value: f64, from: Unit, to: Unit) -> Result<f64, UnitError> {
    if from == to {
        return Ok(value);
    }
    if from.dimension() != to.dimension() {
        return Err(UnitError::Incompatible { from, to });
    }
    Ok(value * from.factor_to_base() / to.factor_to_base())
}

/// Rounds half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}
