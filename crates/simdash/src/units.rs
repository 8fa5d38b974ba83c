//! Physical unit catalog and conversion table.
//!
//! Conversion factors are seeded pairwise within a family, symmetrized
//! (`factor(b, a) = 1 / factor(a, b)`) and then closed with one derivation
//! sweep over every pivot unit. Each family in the shipped catalog has a hub
//! unit with a direct or symmetric factor to every member, so the single
//! sweep closes all families. New units must keep that shape: give every
//! added unit a direct factor to its family's hub.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::types::{DashError, DashResult};

/// An enumerated physical unit tag. `None` is the dimensionless unit.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    #[default]
    None,
    Meters,
    Miles,
    Feet,
    Ms,
    Kmh,
    Mph,
    Fts,
    Knots,
    Pounds,
    Radians,
    Degrees,
    Seconds,
    Kilograms,
    #[serde(rename = "delta_t_s")]
    DeltaTS,
}

impl Unit {
    pub const ALL: [Unit; 15] = [
        Unit::None,
        Unit::Meters,
        Unit::Miles,
        Unit::Feet,
        Unit::Ms,
        Unit::Kmh,
        Unit::Mph,
        Unit::Fts,
        Unit::Knots,
        Unit::Pounds,
        Unit::Radians,
        Unit::Degrees,
        Unit::Seconds,
        Unit::Kilograms,
        Unit::DeltaTS,
    ];

    /// Stable identifier used on the wire and in user documents.
    pub fn id(self) -> &'static str {
        match self {
            Unit::None => "none",
            Unit::Meters => "meters",
            Unit::Miles => "miles",
            Unit::Feet => "feet",
            Unit::Ms => "ms",
            Unit::Kmh => "kmh",
            Unit::Mph => "mph",
            Unit::Fts => "fts",
            Unit::Knots => "knots",
            Unit::Pounds => "pounds",
            Unit::Radians => "radians",
            Unit::Degrees => "degrees",
            Unit::Seconds => "seconds",
            Unit::Kilograms => "kilograms",
            Unit::DeltaTS => "delta_t_s",
        }
    }

    pub fn from_id(id: &str) -> Option<Unit> {
        Unit::ALL.into_iter().find(|u| u.id() == id)
    }

    /// Short symbol shown next to a value.
    pub fn label(self) -> &'static str {
        match self {
            Unit::None => "",
            Unit::Meters => "m",
            Unit::Miles => "mi",
            Unit::Feet => "ft",
            Unit::Ms => "m/s",
            Unit::Kmh => "km/h",
            Unit::Mph => "mph",
            Unit::Fts => "ft/s",
            Unit::Knots => "kts",
            Unit::Pounds => "lbs",
            Unit::Radians => "rad",
            Unit::Degrees => "°",
            Unit::Seconds => "s",
            Unit::Kilograms => "kg",
            Unit::DeltaTS => "s",
        }
    }

    /// Human-readable name for unit pickers.
    pub fn display_name(self) -> &'static str {
        match self {
            Unit::None => "None",
            Unit::Meters => "Meters",
            Unit::Miles => "Miles",
            Unit::Feet => "Feet",
            Unit::Ms => "Meters per second",
            Unit::Kmh => "Kilometers per hour",
            Unit::Mph => "Miles per hour",
            Unit::Fts => "Feet per second",
            Unit::Knots => "Knots",
            Unit::Pounds => "Pounds",
            Unit::Radians => "Radians",
            Unit::Degrees => "Degrees",
            Unit::Seconds => "Seconds",
            Unit::Kilograms => "Kilograms",
            Unit::DeltaTS => "Elapsed time",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Lua formatter function for units with semantic formatting instead of the
/// default numeric conversion. The function must exist in the main script
/// template.
pub fn lua_formatter(unit: Unit) -> Option<&'static str> {
    match unit {
        Unit::DeltaTS => Some("formatTimeHms"),
        _ => None,
    }
}

/// Pairwise unit conversion table, closed per family at construction.
#[derive(Debug, Clone)]
pub struct UnitConverter {
    factors: HashMap<(Unit, Unit), f64>,
}

impl UnitConverter {
    /// Direct factors: `value_dst = value_src * factor`. Hub units: miles
    /// (lengths), mph (speeds).
    const SEED: [(Unit, Unit, f64); 12] = [
        (Unit::Meters, Unit::Miles, 0.000621371),
        (Unit::Meters, Unit::Feet, 3.28084),
        (Unit::Feet, Unit::Miles, 0.000189394),
        (Unit::Ms, Unit::Mph, 2.23694),
        (Unit::Ms, Unit::Kmh, 3.6),
        (Unit::Ms, Unit::Knots, 1.94384),
        (Unit::Kmh, Unit::Mph, 0.621371),
        (Unit::Fts, Unit::Mph, 0.681818),
        (Unit::Fts, Unit::Knots, 0.592484),
        (Unit::Knots, Unit::Mph, 1.15078),
        (Unit::Kilograms, Unit::Pounds, 2.20462),
        (Unit::Radians, Unit::Degrees, 180.0 / std::f64::consts::PI),
    ];

    pub fn new() -> Self {
        let mut factors: HashMap<(Unit, Unit), f64> = HashMap::new();

        for (src, dst, factor) in Self::SEED {
            factors.insert((src, dst), factor);
        }
        for (src, dst, factor) in Self::SEED {
            factors.entry((dst, src)).or_insert(1.0 / factor);
        }

        // Close each family: for every pivot with known factors to b and c,
        // derive factor(b, c) = factor(b, pivot) * factor(pivot, c).
        for pivot in Unit::ALL {
            let neighbors: Vec<(Unit, f64)> = Unit::ALL
                .into_iter()
                .filter(|u| *u != pivot)
                .filter_map(|u| factors.get(&(pivot, u)).map(|f| (u, *f)))
                .collect();
            for &(b, f_pivot_b) in &neighbors {
                for &(c, f_pivot_c) in &neighbors {
                    if b != c {
                        factors.entry((b, c)).or_insert(f_pivot_c / f_pivot_b);
                    }
                }
            }
        }

        Self { factors }
    }

    /// All units reachable from `unit` by a chain of known factors,
    /// including `unit` itself.
    pub fn convertible_units(&self, unit: Unit) -> BTreeSet<Unit> {
        let mut family: BTreeSet<Unit> = Unit::ALL
            .into_iter()
            .filter(|u| self.factors.contains_key(&(unit, *u)))
            .collect();
        family.insert(unit);
        family
    }

    /// Factor from `src` to `dst`, or `None` if no conversion is known.
    /// `src == dst` always yields 1, including for the dimensionless unit.
    pub fn conversion_factor(&self, src: Unit, dst: Unit) -> Option<f64> {
        if src == dst {
            return Some(1.0);
        }
        self.factors.get(&(src, dst)).copied()
    }

    /// Convert a value. A `None` value propagates; a missing conversion path
    /// is an error.
    pub fn convert(&self, src: Unit, value: Option<f64>, dst: Unit) -> DashResult<Option<f64>> {
        let Some(value) = value else {
            return Ok(None);
        };
        let factor = self
            .conversion_factor(src, dst)
            .ok_or(DashError::MissingConverter { src, dst })?;
        Ok(Some(value * factor))
    }
}

impl Default for UnitConverter {
    fn default() -> Self {
        Self::new()
    }
}
